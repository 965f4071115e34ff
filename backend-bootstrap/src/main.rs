use anyhow::Result;
use clap::Parser;
use tracing::info;

use backend_infrastructure::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "volunteer-ledger")]
#[command(about = "Volunteer attendance and points ledger server", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var("VOLUNTEER_CONFIG", config);
    }

    let config = AppConfig::load().await?;
    let _log_guard = backend_bootstrap::init_logging(&config)?;
    info!(
        bind_addr = %config.bind_addr,
        store_backend = ?config.store_backend,
        "starting volunteer-ledger"
    );

    backend_bootstrap::run_standalone(config).await
}
