use anyhow::Result;
use prediction_arbitrage_bot::{bot::ScannerBot, config::Config};
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {:#}", e);
        e
    })?;

    let log_level = if config.scan.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting cross-platform arbitrage scanner");

    let mut bot = ScannerBot::new(config).map_err(|e| {
        error!("Failed to initialize scanner: {}", e);
        e
    })?;

    // Cancellation is coarse: ctrl-c drops the in-flight cycle
    let shutdown_signal = tokio::signal::ctrl_c();

    tokio::select! {
        result = bot.start() => {
            match result {
                Ok(_) => info!("Scanner completed"),
                Err(e) => error!("Scanner error: {}", e),
            }
        }
        _ = shutdown_signal => {
            info!("Shutdown signal received");
        }
    }

    info!("Arbitrage scanner shutdown complete");
    Ok(())
}
