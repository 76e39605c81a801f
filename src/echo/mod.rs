//! Dummy upstream that reflects each request back to the caller.

pub mod handlers;
pub mod types;

use crate::{Result, config::Config};
use axum::{Router, routing::get};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::info;

pub const ECHO_PATH: &str = "/api/v1/user";

pub fn router() -> Router {
    Router::new()
        .route(ECHO_PATH, get(handlers::echo).post(handlers::echo))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(config: Config) -> Result<()> {
    let addr = SocketAddr::new(config.echo.host.parse()?, config.echo.port);

    info!("Starting echo upstream on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router()).await?;

    Ok(())
}
