//! The `roster` server binary.

use anyhow::Context;
use roster::bootstrap::{build_app, load_config};
use roster_server::{Server, ServerConfig};
use roster_telemetry::{init_logging, LogConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    init_logging(&LogConfig::from(&config.logging)).context("failed to initialize logging")?;

    tracing::info!(
        service = "roster",
        version = env!("CARGO_PKG_VERSION"),
        http_addr = %config.server.http_addr,
        upload_dir = %config.storage.upload_dir.display(),
        "starting"
    );

    let app = build_app(&config).await?;
    Server::new(ServerConfig::from_roster(&config), app)
        .run()
        .await?;

    Ok(())
}
