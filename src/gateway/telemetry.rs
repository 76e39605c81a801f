//! Structured `TELEMETRY_EVENT` log lines for gateway decisions and
//! scoring-service failures.

use super::decision::Decision;
use crate::Error;
use axum::http::{Method, Uri};
use regex_lite::Regex;
use serde_json::{Value, json};
use std::sync::LazyLock;
use tracing::{error, info};

static PASSWORD_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)password=\S+").unwrap());

pub fn redact_pii(payload: &str) -> String {
    PASSWORD_PARAM
        .replace_all(payload, "password=[REDACTED]")
        .into_owned()
}

pub fn decision_event(method: &Method, uri: &Uri, payload: &str, decision: &Decision) -> Value {
    json!({
        "decision": decision.action.as_str(),
        "score": format!("{:.4}", decision.score),
        "method": method.as_str(),
        "uri": uri.to_string(),
        "payload": redact_pii(payload),
    })
}

pub fn failure_event(err: &Error) -> Value {
    json!({
        "event": "MODEL_SERVICE_FAILURE",
        "error": err.to_string(),
    })
}

pub fn log_decision(method: &Method, uri: &Uri, payload: &str, decision: &Decision) {
    info!(
        "TELEMETRY_EVENT: {}",
        decision_event(method, uri, payload, decision)
    );
}

pub fn log_failure(err: &Error) {
    error!("TELEMETRY_EVENT: {}", failure_event(err));
}
