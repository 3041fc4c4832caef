//! Queue lifecycle handlers

use super::parse_id;
use crate::types::{CreateQueueRequest, ListQueuesQuery};
use crate::{ApiError, AppState};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use hookq_core::domain::{DomainError, Queue};
use tracing::instrument;

#[instrument(skip_all)]
pub async fn create_queue(
    State(state): State<AppState>,
    payload: Result<Json<CreateQueueRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Queue>), ApiError> {
    let Json(request) = payload?;
    let queue = state.service.create_queue(request).await?;
    Ok((StatusCode::CREATED, Json(queue)))
}

#[instrument(skip_all)]
pub async fn list_queues(
    State(state): State<AppState>,
    query: Result<Query<ListQueuesQuery>, QueryRejection>,
) -> Result<Json<Vec<Queue>>, ApiError> {
    let Query(query) = query?;
    if query.workspace_id <= 0 {
        return Err(ApiError(DomainError::InvalidWorkspace(query.workspace_id).into()));
    }
    let queues = state.service.list_queues(query.workspace_id).await?;
    Ok(Json(queues))
}

#[instrument(skip_all)]
pub async fn delete_queue(
    State(state): State<AppState>,
    Path(queue_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let queue_id = parse_id(&queue_id, "queue")?;
    state.service.delete_queue(queue_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all)]
pub async fn empty_queue(
    State(state): State<AppState>,
    Path(queue_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let queue_id = parse_id(&queue_id, "queue")?;
    state.service.empty_queue(queue_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
