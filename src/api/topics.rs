//! Topic API endpoints.

use axum::{extract::State, Json};

use super::ApiResult;
use crate::errors::AppError;
use crate::headers::InboundHeaders;
use crate::mapper;
use crate::models::TopicTitle;
use crate::AppState;

/// GET /datasets/{dataset_id}/create - List topic titles for a new dataset.
pub async fn list_topics(
    State(state): State<AppState>,
    headers: InboundHeaders,
) -> ApiResult<Vec<TopicTitle>> {
    let ctx = headers.require()?;

    tracing::info!(request_id = %ctx.request_id, "calling get topics");

    let topics = state.topics.get_topics(&ctx).await.map_err(|e| {
        tracing::error!(request_id = %ctx.request_id, "error getting topics: {}", e);
        AppError::from_upstream(&e, "error getting topics")
    })?;

    Ok(Json(mapper::topics(topics)))
}
