//! HTTP server setup

use crate::config::Config;
use crate::recordings::Recordings;
use crate::routes;
use std::sync::Arc;
use tracing::info;

/// State shared across request handlers
pub struct AppState {
    pub config: Arc<Config>,
    pub recordings: Arc<Recordings>,
}

impl AppState {
    pub fn new(config: Config, recordings: Recordings) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            recordings: Arc::new(recordings),
        })
    }
}

/// Open the stores and serve until the process is stopped
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let recordings = Recordings::open(&config)?;
    let bind_addr = config.bind_addr;
    let state = AppState::new(config, recordings);

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Recorder listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
