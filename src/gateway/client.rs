use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Scores a composed request payload for SQL-injection likelihood.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn score(&self, payload: &str) -> Result<f64>;
}

#[derive(Debug, Serialize)]
struct ModelRequest<'a> {
    payload: &'a str,
}

#[derive(Debug, Deserialize)]
struct ModelResponse {
    sql_injection_score: f64,
}

/// Calls the scoring service's `POST /predict` over HTTP.
pub struct HttpModelClient {
    client: reqwest::Client,
    predict_url: String,
}

impl HttpModelClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            predict_url: format!("{}/predict", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn score(&self, payload: &str) -> Result<f64> {
        debug!("Requesting score from {}", self.predict_url);

        let response = self
            .client
            .post(&self.predict_url)
            .json(&ModelRequest { payload })
            .send()
            .await
            .map_err(|e| Error::model_service(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::model_service(format!(
                "scoring service returned {}",
                status
            )));
        }

        let body: ModelResponse = response
            .json()
            .await
            .map_err(|e| Error::model_service(format!("invalid response body: {}", e)))?;

        Ok(body.sql_injection_score)
    }
}
