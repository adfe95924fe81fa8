//! Server binary: boots a lixi server from environment config.
//!
//! `LIXI_BIND` sets the full bind address; otherwise `PORT` (default
//! 5000) is combined with 0.0.0.0 for container platforms.

use lixi_server::LixiServerBuilder;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind = std::env::var("LIXI_BIND").unwrap_or_else(|_| {
        let port = std::env::var("PORT").unwrap_or_else(|_| "5000".to_string());
        format!("0.0.0.0:{port}")
    });

    let server = LixiServerBuilder::new().bind(&bind).build().await?;
    tracing::info!(addr = %server.local_addr()?, "lixi server listening");
    server.run().await?;
    Ok(())
}
