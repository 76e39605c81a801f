pub mod handlers;
pub mod types;

use crate::{Result, config::Config, inference::Scorer};
use axum::{
    Router,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn router(scorer: Arc<Scorer>) -> Router {
    let app_state = handlers::AppState { scorer };

    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

pub async fn run(config: Config) -> Result<()> {
    let mut model_config = config.model.clone();
    if let Ok(path) = std::env::var("MODEL_PATH") {
        model_config.model_path = path;
    }
    if let Ok(path) = std::env::var("TOKENIZER_PATH") {
        model_config.tokenizer_path = path;
    }

    // Load artifacts before binding so a broken model never serves traffic.
    let scorer = tokio::task::spawn_blocking(move || Scorer::load(&model_config))
        .await
        .map_err(|e| crate::Error::internal(format!("artifact loading task failed: {}", e)))??;

    let app = router(Arc::new(scorer));

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting scoring service on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
