//! Read-aloud recorder
//!
//! Upload a script with one sentence per line, record each sentence in the
//! browser, then download every take as a zip with a sentence manifest.

mod archive;
mod audio;
mod config;
mod fingerprint;
mod mapping;
mod recordings;
mod routes;
mod sentences;
mod server;

use config::Config;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,read_aloud_recorder=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Read-aloud recorder starting...");

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("Check BIND_ADDR and MAX_UPLOAD_MB in the environment or .env file");
            std::process::exit(1);
        }
    };

    info!("Configuration loaded successfully");

    // Create audio directory
    if let Err(e) = std::fs::create_dir_all(&config.audio_dir) {
        error!("Failed to create audio directory: {}", e);
        std::process::exit(1);
    }

    // Run the server
    if let Err(e) = server::run(config).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
