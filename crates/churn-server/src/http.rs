//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use churn_core::{ChurnError, RawRecord, SchemaConfig, ScoreOutput};

use crate::AppState;

/// Map a pipeline error to a status and plain-text body
fn error_response(err: ChurnError) -> (StatusCode, String) {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    tracing::warn!(status = %status, "Request failed: {}", err);
    (status, format!("Error: {}", err))
}

/// Parse a request body into a raw record for the configured schema
fn parse_record(body: &[u8], state: &AppState) -> Result<RawRecord, ChurnError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ChurnError::MalformedRequest(format!("invalid JSON body: {}", e)))?;
    RawRecord::from_json(&value, state.predictor.schema())
}

/// Predict churn for one customer.
///
/// The scorer's output is returned as-is. Scoring runs on the blocking pool.
pub async fn churn_predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ScoreOutput>, (StatusCode, String)> {
    let output = tokio::task::spawn_blocking(move || {
        let raw = parse_record(&body, &state)?;
        state.predictor.predict(&raw)
    })
    .await
    .map_err(|e| error_response(ChurnError::ScorerFailure(format!("scoring task failed: {}", e))))?
    .map_err(error_response)?;

    Ok(Json(output))
}

/// Encode a record without scoring it
pub async fn encode_features(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, (StatusCode, String)> {
    let raw = parse_record(&body, &state).map_err(error_response)?;
    let vector = state.predictor.encode(&raw).map_err(error_response)?;

    // Serialized straight from the vector so keys keep schema order
    Ok(Json(vector.to_record(state.predictor.schema())).into_response())
}

/// Get the configured feature schema
pub async fn get_schema(State(state): State<Arc<AppState>>) -> Json<SchemaConfig> {
    Json(state.predictor.schema().to_config())
}

/// Get service status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let schema = state.predictor.schema();

    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model_path": state.config.model.path.display().to_string(),
        "features": {
            "numeric": schema.numeric_columns().len(),
            "one_hot": schema.one_hot_columns().len(),
            "width": schema.width()
        }
    }))
}
