use super::parse_id;
use crate::types::AddSubscriberRequest;
use crate::{ApiError, AppState};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use hookq_core::domain::Subscriber;
use tracing::instrument;

#[instrument(skip_all)]
pub async fn add_subscriber(
    State(state): State<AppState>,
    Path(queue_id): Path<String>,
    payload: Result<Json<AddSubscriberRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Subscriber>), ApiError> {
    let queue_id = parse_id(&queue_id, "queue")?;
    let Json(request) = payload?;
    let subscriber = state.service.add_subscriber(queue_id, request).await?;
    Ok((StatusCode::CREATED, Json(subscriber)))
}

#[instrument(skip_all)]
pub async fn list_subscribers(
    State(state): State<AppState>,
    Path(queue_id): Path<String>,
) -> Result<Json<Vec<Subscriber>>, ApiError> {
    let queue_id = parse_id(&queue_id, "queue")?;
    let subscribers = state.service.list_subscribers(queue_id).await?;
    Ok(Json(subscribers))
}

#[instrument(skip_all)]
pub async fn remove_subscriber(
    State(state): State<AppState>,
    Path((queue_id, subscriber_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let queue_id = parse_id(&queue_id, "queue")?;
    let subscriber_id = parse_id(&subscriber_id, "subscriber")?;
    state
        .service
        .remove_subscriber(queue_id, subscriber_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
