use super::parse_id;
use crate::types::{SendMessageRequest, SendMessageResponse};
use crate::{ApiError, AppState};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use std::time::Duration;
use tracing::instrument;

/// Accept a message for later dispatch; 202 since delivery has not happened yet
#[instrument(skip_all)]
pub async fn send_message(
    State(state): State<AppState>,
    Path(queue_id): Path<String>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SendMessageResponse>), ApiError> {
    let queue_id = parse_id(&queue_id, "queue")?;
    let Json(request) = payload?;
    let delay = Duration::from_millis(request.delay_ms.unwrap_or(0));

    let message_id = state
        .service
        .send_message(queue_id, Bytes::from(request.content), delay)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(SendMessageResponse { message_id })))
}
