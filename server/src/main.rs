use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tubehub_backend_api::build_router;
use tubehub_backend_runtime::{shutdown_signal, telemetry, BackendServices};
use tubehub_config::{load_from, AppConfig};

/// TubeHub user and authentication API server.
#[derive(Debug, Parser)]
#[command(name = "tubehub-backend", version, about)]
struct Args {
    /// Configuration file, overriding TUBEHUB_CONFIG and the default search paths.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Address to bind, overriding http.address.
    #[arg(long)]
    address: Option<String>,

    /// Port to bind, overriding http.port.
    #[arg(long)]
    port: Option<u16>,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(address) = &self.address {
            config.http.address = address.clone();
        }
        if let Some(port) = self.port {
            config.http.port = port;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    telemetry::init_tracing()?;

    info!("starting TubeHub backend");

    let mut config = load_from(args.config.clone()).context("failed to load configuration")?;
    args.apply(&mut config);

    let services = BackendServices::initialise(&config).await?;
    let app = build_router(services.app_state(&config));

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}
