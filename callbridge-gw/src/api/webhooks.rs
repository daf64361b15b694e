//! Webhook ingress handlers
//!
//! `call-ended` acknowledges immediately and processes in the background:
//! the sender only needs a fast ack, not the outcome, and background
//! failures surface via logs and the health endpoint's `last_error`.
//! `call-insights` runs synchronously and reports the real outcome.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::models::{EventKind, ExternalCallEvent};
use crate::services::DispatchOutcome;
use crate::AppState;

/// POST /webhook/call-ended
///
/// Validates the payload, spawns the dispatch and returns the ack without
/// waiting for completion.
pub async fn call_ended(
    State(state): State<AppState>,
    Json(event): Json<ExternalCallEvent>,
) -> ApiResult<Json<Value>> {
    if !event.has_call_id() {
        return Err(ApiError::BadRequest("Missing call id in payload".to_string()));
    }

    tracing::info!(
        call_id = %event.id,
        cause = event.cause.as_deref().unwrap_or("?"),
        "{} received",
        EventKind::CallEnded.as_str()
    );

    let dispatcher = state.dispatcher.clone();
    let last_error = state.last_error.clone();
    let call_id = event.id.clone();
    tokio::spawn(async move {
        match dispatcher.handle_call_ended(&event).await {
            Ok(outcome) => {
                tracing::info!(call_id = %call_id, outcome = ?outcome, "call-ended processed");
            }
            Err(e) => {
                tracing::error!(call_id = %call_id, error = %e, "call-ended dispatch failed");
                *last_error.write().await = Some(e.to_string());
            }
        }
    });

    Ok(Json(json!({ "status": "accepted" })))
}

/// POST /webhook/call-insights
///
/// Synchronous: the response reflects the actual outcome.
pub async fn call_insights(
    State(state): State<AppState>,
    Json(event): Json<ExternalCallEvent>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if !event.has_call_id() {
        return Err(ApiError::BadRequest("Missing call id in payload".to_string()));
    }

    tracing::info!(call_id = %event.id, "{} received", EventKind::CallInsights.as_str());

    let outcome = state.dispatcher.handle_call_insights(&event).await?;

    let response = match outcome {
        DispatchOutcome::Created { activity_ids } => (
            StatusCode::CREATED,
            Json(json!({ "status": "created", "activity_ids": activity_ids })),
        ),
        DispatchOutcome::Updated { activity_ids } => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "activity_ids": activity_ids })),
        ),
        DispatchOutcome::AlreadyLogged => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "note": "insights already logged" })),
        ),
        DispatchOutcome::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "status": "not_found" })),
        ),
        DispatchOutcome::Skipped(reason) => (
            StatusCode::OK,
            Json(json!({ "status": "skipped", "reason": reason.as_str() })),
        ),
    };

    Ok(response)
}

/// Build webhook routes
pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/webhook/call-ended", post(call_ended))
        .route("/webhook/call-insights", post(call_insights))
}
