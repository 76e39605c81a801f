use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const ECHO_MESSAGE: &str = "Request successfully received by upstream service!";
pub const NO_BODY: &str = "No JSON/Form body";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EchoResponse {
    pub message: String,
    pub method: String,
    pub path: String,
    pub query_params: BTreeMap<String, String>,
    /// JSON body, form fields, or the `NO_BODY` sentinel.
    pub body: Value,
}
