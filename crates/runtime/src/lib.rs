use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::info;
use tubehub_auth::Authenticator;
use tubehub_backend_api::{services::MediaStore, AppState};
use tubehub_config::AppConfig;
use tubehub_database::{initialize_database, ChannelRepository};

pub mod telemetry {
    use anyhow::Result;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub authenticator: Authenticator,
    pub channels: ChannelRepository,
    pub media: MediaStore,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        config.validate().context("invalid backend configuration")?;

        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to initialise database")?;

        let authenticator = Authenticator::new(db_pool.clone(), &config.auth)
            .context("failed to build authenticator")?;
        let channels = ChannelRepository::new(db_pool.clone());

        let media = MediaStore::new(&config.media);
        media
            .ensure_root()
            .await
            .with_context(|| format!("failed to create media root {}", media.root().display()))?;

        info!(
            media_root = %media.root().display(),
            public_path = %media.public_path(),
            "backend services ready"
        );

        Ok(Self {
            db_pool,
            authenticator,
            channels,
            media,
        })
    }

    pub fn app_state(&self, config: &AppConfig) -> AppState {
        AppState::new(
            self.authenticator.clone(),
            self.channels.clone(),
            self.media.clone(),
            config.http.clone(),
            config.auth.secure_cookies,
        )
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
