//! PrintSync relay binary.
//!
//! Serves the cron trigger endpoint until SIGTERM or Ctrl+C.

use relay::RelayConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the platform usually injects the secrets.
    dotenvy::dotenv().ok();

    let config = RelayConfig::load()?;
    relay::server::init_tracing(&config);

    relay::start_server(config).await?;

    Ok(())
}
