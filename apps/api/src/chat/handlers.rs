//! Axum route handlers for the chat endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::chat::models::{AskRequest, AskResponse, MISSING_QUERY_MESSAGE};
use crate::errors::AppError;
use crate::gateway::{ModelGateway, CLASSIFY_HISTORY_WINDOW};
use crate::state::AppState;

/// POST /ask
///
/// Classify-then-generate: picks context chunks for the query, then asks the
/// model for an answer grounded in them. Malformed bodies are rejected with 400
/// before any model call.
pub async fn handle_ask(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AskResponse>, AppError> {
    let Json(body) = payload.map_err(|rejection| {
        warn!("Rejected /ask body: {rejection}");
        AppError::Validation(MISSING_QUERY_MESSAGE.to_string())
    })?;

    let request = AskRequest::from_body(&body)?;
    let response = answer_query(state.gateway.as_ref(), &request).await;

    Ok(Json(AskResponse { response }))
}

/// OPTIONS /ask
///
/// CORS headers are attached by the router's CORS layer, and only for allow-listed origins.
pub async fn handle_preflight() -> StatusCode {
    StatusCode::OK
}

/// Runs both gateway steps in sequence. Classification sees only the most
/// recent turns; generation gets the full history.
pub async fn answer_query(gateway: &dyn ModelGateway, request: &AskRequest) -> String {
    let window_start = request.history.len().saturating_sub(CLASSIFY_HISTORY_WINDOW);
    let recent = &request.history[window_start..];

    let selected = gateway.classify(&request.query, recent).await;
    debug!("Query: '{}' -> Selected Context: {:?}", request.query, selected);

    let answer = gateway
        .generate(&request.query, &request.history, &selected)
        .await;
    info!(
        "Answered query with {} history turns and {} context chunks",
        request.history.len(),
        selected.len()
    );
    answer
}
