use std::path::Path;

use anyhow::{Context, Result};
use tempfile::TempDir;
use tubehub_backend_runtime::BackendServices;
use tubehub_config::AppConfig;

fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}", path.to_string_lossy())
}

fn build_config(temp_dir: &TempDir, max_connections: u32) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = sqlite_url(&temp_dir.path().join("runtime/init.db"));
    config.database.max_connections = max_connections;
    config.auth.access_token_secret = "runtime-access-secret".into();
    config.auth.refresh_token_secret = "runtime-refresh-secret".into();
    config.media.root = temp_dir.path().join("uploads/media");
    config
}

async fn initialise(config: &AppConfig) -> Result<BackendServices> {
    BackendServices::initialise(config)
        .await
        .context("failed to initialise backend services")
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_runs_migrations_and_creates_media_root() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = build_config(&temp_dir, 4);

    let services = initialise(&config).await?;
    let table: String = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'users'",
    )
    .fetch_one(&services.db_pool)
    .await?;

    assert_eq!("users", table);
    assert!(config.media.root.is_dir(), "media root should be created");
    assert_eq!(services.media.public_path(), "/static");

    drop(services);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_rejects_missing_token_secrets() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut config = build_config(&temp_dir, 1);
    config.auth.refresh_token_secret.clear();

    let error = match BackendServices::initialise(&config).await {
        Ok(_) => panic!("expected initialisation to fail without a refresh secret"),
        Err(error) => error,
    };
    let message = format!("{error:?}");
    assert!(
        message.contains("invalid backend configuration"),
        "expected configuration context, got {message}"
    );
    assert!(
        !temp_dir.path().join("runtime/init.db").exists(),
        "no database should be opened for an invalid configuration"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_applies_max_connections_setting() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let max_connections = 3;
    let config = build_config(&temp_dir, max_connections);

    let services = initialise(&config).await?;
    assert_eq!(
        max_connections,
        services.db_pool.options().get_max_connections()
    );

    drop(services);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn app_state_carries_cookie_and_http_settings() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut config = build_config(&temp_dir, 1);
    config.auth.secure_cookies = false;
    config.http.json_body_limit_bytes = 4096;

    let services = initialise(&config).await?;
    let state = services.app_state(&config);

    assert!(!state.secure_cookies());
    assert_eq!(state.http().json_body_limit_bytes, 4096);
    assert_eq!(state.media().root(), config.media.root.as_path());
    Ok(())
}
