//! Reverse proxy that scores every request for SQL injection before letting
//! it through to the upstream.

pub mod breaker;
pub mod cache;
pub mod client;
pub mod decision;
pub mod filter;
pub mod telemetry;
pub mod throttle;

pub use breaker::CircuitBreaker;
pub use cache::DecisionCache;
pub use client::{HttpModelClient, ModelClient};
pub use decision::{Action, Decision, Thresholds};
pub use filter::{compose_payload, payload_key};
pub use throttle::IpThrottle;

use crate::{Result, config::{Config, GatewayConfig}};
use axum::{Router, http::StatusCode, routing::get};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing::info;

pub const HEALTH_PATH: &str = "/gateway/health";

/// Shared gateway state
pub struct GatewayState {
    pub enabled: bool,
    pub fail_open: bool,
    pub thresholds: Thresholds,
    pub model: Arc<dyn ModelClient>,
    pub breaker: CircuitBreaker,
    pub cache: DecisionCache,
    pub throttle: IpThrottle,
    /// HTTP client for forwarding
    pub http: reqwest::Client,
    pub upstream_url: String,
}

impl GatewayState {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let model = HttpModelClient::new(
            &config.model_service_url,
            Duration::from_millis(config.model_service_timeout_ms),
        )?;
        Self::with_model_client(config, Arc::new(model))
    }

    pub fn with_model_client(config: &GatewayConfig, model: Arc<dyn ModelClient>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_millis(config.upstream_timeout_ms))
            .build()?;

        Ok(Self {
            enabled: config.enabled,
            fail_open: config.fail_open,
            thresholds: Thresholds::from(&config.thresholds),
            model,
            breaker: CircuitBreaker::new(&config.circuit_breaker),
            cache: DecisionCache::new(
                Duration::from_secs(config.cache.ttl_seconds),
                config.cache.max_size,
            ),
            throttle: IpThrottle::new(&config.throttling),
            http,
            upstream_url: config.upstream_url.trim_end_matches('/').to_string(),
        })
    }
}

pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(|| async { (StatusCode::OK, "OK") }))
        .fallback(filter::filter)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    let gateway = &config.gateway;
    let state = Arc::new(GatewayState::new(gateway)?);

    let addr = SocketAddr::new(gateway.host.parse()?, gateway.port);

    info!("Starting SQLi gateway on {}", addr);
    info!(
        "Scoring via {} (block >= {}, monitor >= {}, fail-open: {}); upstream {}",
        gateway.model_service_url,
        gateway.thresholds.block,
        gateway.thresholds.monitor,
        gateway.fail_open,
        gateway.upstream_url
    );
    if !gateway.enabled {
        info!("SQLi detection disabled, forwarding all traffic");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
