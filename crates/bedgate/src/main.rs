//! The `bedgate` binary: reads `BEDGATE_*` settings and runs the gateway
//! until Ctrl-C.

use bedgate::{GatewayBuilder, GatewayConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = GatewayConfig::from_env()?;
    tracing::info!(
        bind = %config.bind,
        handoff = %format_args!("{}:{}", config.target_address, config.target_port),
        trust = %config.trust.mode,
        "starting bedgate"
    );

    let gateway = GatewayBuilder::new(config).build().await?;
    tracing::info!(addr = %gateway.local_addr()?, "listening");

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    gateway.run_until(ctrl_c).await?;
    tracing::info!("bedgate stopped");
    Ok(())
}
