use super::{
    GatewayState,
    decision::{Action, Decision},
    telemetry,
};
use crate::{Error, Result};
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, Request, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};
use std::{net::SocketAddr, sync::Arc};
use tracing::{debug, error, info, warn};

/// Largest request body the gateway buffers for inspection.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// The text scored for a request. A missing query renders as `null`.
pub fn compose_payload(path: &str, query: Option<&str>, body: &str) -> String {
    format!(
        "PATH: {}, QUERY: {}, BODY: {}",
        path,
        query.unwrap_or("null"),
        body
    )
}

/// Lowercase hex SHA-256 of `payload`, used as the decision cache key.
pub fn payload_key(payload: &str) -> String {
    hex::encode(Sha256::digest(payload.as_bytes()))
}

pub async fn filter(
    State(state): State<Arc<GatewayState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
) -> Response {
    let (parts, body) = request.into_parts();

    if !state.enabled {
        let body = reqwest::Body::wrap_stream(body.into_data_stream());
        return forward(&state, parts, body).await;
    }

    let client_ip = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if state.throttle.is_blocked(&client_ip) {
        warn!("Request from blocked IP {} rejected.", client_ip);
        return (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").into_response();
    }

    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Rejecting request body: {}", e);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large").into_response();
        }
    };

    let path = decode_component(parts.uri.path());
    let query = parts.uri.query().map(decode_component);
    let payload = compose_payload(&path, query.as_deref(), &String::from_utf8_lossy(&body));

    let decision = match decide(&state, &payload).await {
        Some(decision) => decision,
        None => return (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable").into_response(),
    };

    telemetry::log_decision(&parts.method, &parts.uri, &payload, &decision);

    match decision.action {
        Action::Block => {
            state.throttle.record_failed_attempt(&client_ip);
            warn!("BLOCKING request due to high SQLi score: {}", decision.score);
            (StatusCode::FORBIDDEN, "Forbidden").into_response()
        }
        Action::Monitor => {
            info!("MONITORING request with medium SQLi score: {}", decision.score);
            forward(&state, parts, body.into()).await
        }
        Action::Allow => forward(&state, parts, body.into()).await,
    }
}

/// Percent-decode a path or query the way `java.net.URI` does: `%XX`
/// sequences only, `+` stays literal, invalid UTF-8 becomes U+FFFD.
pub fn decode_component(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Cached decision, else a fresh one from the scoring service. `None` means
/// the scoring service failed and the gateway fails closed.
async fn decide(state: &GatewayState, payload: &str) -> Option<Decision> {
    let key = payload_key(payload);
    if let Some(decision) = state.cache.get(&key) {
        debug!("Decision cache hit for {}", key);
        return Some(decision);
    }

    match score(state, payload).await {
        Ok(score) => {
            let decision = state.thresholds.evaluate(score);
            state.cache.insert(key, decision);
            Some(decision)
        }
        Err(e) => {
            error!("SQLi model service call failed: {}", e);
            telemetry::log_failure(&e);
            if state.fail_open {
                warn!("Failing open. Allowing request to pass by returning a safe score.");
                Some(state.thresholds.evaluate(0.0))
            } else {
                error!("Failing closed. Rejecting request.");
                None
            }
        }
    }
}

async fn score(state: &GatewayState, payload: &str) -> Result<f64> {
    if !state.breaker.try_acquire() {
        return Err(Error::model_service("circuit breaker is open"));
    }

    let result = state.model.score(payload).await;
    match &result {
        Ok(_) => state.breaker.record_success(),
        Err(_) => state.breaker.record_failure(),
    }
    result
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

async fn forward(state: &GatewayState, parts: Parts, body: reqwest::Body) -> Response {
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{}{}", state.upstream_url, path_and_query);
    debug!("Forwarding to: {}", url);

    let mut builder = state.http.request(parts.method.clone(), &url);
    for (name, value) in parts.headers.iter() {
        if name != header::HOST && name != header::CONTENT_LENGTH && !is_hop_by_hop(name) {
            builder = builder.header(name, value);
        }
    }

    let upstream = match builder.body(body).send().await {
        Ok(response) => response,
        Err(e) => {
            error!("Upstream error: {}", e);
            return (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response();
        }
    };

    let status = upstream.status();
    let mut headers = HeaderMap::new();
    for (name, value) in upstream.headers().iter() {
        if name != header::CONTENT_LENGTH && !is_hop_by_hop(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    match upstream.bytes().await {
        Ok(bytes) => (status, headers, bytes).into_response(),
        Err(e) => {
            error!("Failed to read upstream response: {}", e);
            (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
        }
    }
}
