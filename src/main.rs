use dotenvy::dotenv;
use find_id::config::Settings;
use find_id::host::runner;
use find_id::logging::{init_logging, RedactionPatterns};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenv().ok();

    // Initialize redaction patterns early (before logging)
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);

    // Setup logging with redaction
    init_logging(patterns);

    info!("Starting find-id userbot...");

    let settings = init_settings();

    if let Err(e) = runner::run(settings).await {
        error!("Userbot stopped: {:#}", e);
        return Err(e);
    }

    info!("Userbot stopped.");
    Ok(())
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!(
                prefix = %s.command_prefix,
                locale = ?s.locale,
                "Configuration loaded successfully."
            );
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}
