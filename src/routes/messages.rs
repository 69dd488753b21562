// ============================================================================
// Messages Routes
// ============================================================================
//
// Endpoints:
// - GET /send?payload=<text> - Enqueue one text message (payload required)
// - GET /read - Everything the consumer worker has received so far
//
// ============================================================================

use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::context::AppContext;
use crate::error::RelayError;

#[derive(Debug, Deserialize)]
pub struct SendParams {
    /// Required; a request without it is rejected with 400
    pub payload: String,
}

/// GET /send
pub async fn send(
    State(app_context): State<Arc<AppContext>>,
    Query(params): Query<SendParams>,
) -> Result<impl IntoResponse, RelayError> {
    app_context.producer.send(&params.payload).await?;
    Ok(Json(json!({ "status": "sent" })))
}

/// GET /read
pub async fn read(State(app_context): State<Arc<AppContext>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        app_context.result_log.snapshot().await,
    )
}
