use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use astrotrader::config::Config;
use astrotrader::daemon::AstroDaemon;

#[derive(Parser, Debug)]
#[command(name = "astrotrader-daemon", about = "AstroTrader headless game client")]
struct Args {
    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Wallet address override for the ownership snapshot
    #[arg(long)]
    wallet: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "astrotrader=debug,info".into()),
        )
        .init();

    let args = Args::parse();

    info!("🚀 AstroTrader daemon starting...");

    // ========================================
    // Phase 1: Configuration
    // ========================================
    info!("📝 Phase 1: Configuration");

    let config_path = args.config.unwrap_or_else(Config::config_path);
    let config = match Config::load_or_create(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!("❌ Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let wallet_address = match args.wallet.or_else(|| config.wallet_address.clone()) {
        Some(w) => w,
        None => {
            error!("❌ No wallet address configured.");
            error!("   Set `wallet_address` in {:?} or pass --wallet.", config_path);
            std::process::exit(1);
        }
    };

    info!("✓ Configuration loaded");
    info!("  Game API: {}", config.api.base_url);
    info!("  Indexer:  {}", config.api.indexer_url);
    info!("  Wallet:   {}", wallet_address);

    // ========================================
    // Phase 2: Session bootstrap
    // ========================================
    info!("🌌 Phase 2: Session bootstrap (catalog + player record)");

    let daemon = match AstroDaemon::new(config, wallet_address).await {
        Ok(d) => d,
        Err(e) => {
            error!("❌ Failed to start session: {:#}", e);
            std::process::exit(1);
        }
    };
    info!("✓ Session initialized");

    // ========================================
    // Phase 3: Game loops
    // ========================================
    info!("🎮 Phase 3: Starting game loops...\n");

    daemon.run().await?;

    Ok(())
}
