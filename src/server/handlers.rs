use super::types::{ErrorResponse, HealthResponse, PredictRequest, PredictResponse};
use crate::inference::Scorer;
use axum::{extract::State, http::StatusCode, response::Json};
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Clone)]
pub struct AppState {
    pub scorer: Arc<Scorer>,
}

pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, (StatusCode, Json<ErrorResponse>)> {
    let payload_len = request.payload.len();
    debug!("Received predict request ({} bytes)", payload_len);

    // Inference is CPU-bound; keep it off the async workers.
    let scorer = Arc::clone(&state.scorer);
    let result = tokio::task::spawn_blocking(move || scorer.score(&request.payload)).await;

    match result {
        Ok(Ok(score)) => {
            debug!(score, payload_len, "Scored payload");
            Ok(Json(PredictResponse {
                sql_injection_score: score,
            }))
        }
        Ok(Err(e)) => {
            error!("Inference failed: {}", e);
            Err(internal_error(format!("Inference error: {}", e)))
        }
        Err(e) => {
            error!("Inference task panicked: {}", e);
            Err(internal_error("Inference task failed".to_string()))
        }
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

fn internal_error(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error: message }),
    )
}
