use twisspark::config::AppConfig;
use twisspark::server::{AppState, DiaryServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load();

    // Initialize logging
    let _log_guard = twisspark::core::logging::init(&config);
    log::info!("TwisSpark v{} starting", twisspark::VERSION);
    log::info!("Responses from {}", config.responses.dir.display());

    let state = AppState::from_config(&config)?;
    let server = DiaryServer::new(config.bind_address(), state);

    if let Err(e) = server.serve(shutdown_signal()).await {
        log::error!("Server failed: {e}");
        std::process::exit(1);
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
    }
    log::info!("Shutdown signal received");
}
