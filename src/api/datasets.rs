//! Dataset, edition and version list endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{ApiResult, DatasetPath, EditionPath};
use crate::errors::AppError;
use crate::headers::InboundHeaders;
use crate::mapper;
use crate::models::{DatasetSummary, EditionsPage, VersionsPage};
use crate::AppState;

/// GET /datasets - List every editable dataset.
pub async fn list_datasets(
    State(state): State<AppState>,
    headers: InboundHeaders,
) -> ApiResult<Vec<DatasetSummary>> {
    let ctx = headers.require()?;

    let datasets = state
        .dataset
        .get_datasets_in_batches(&ctx, state.config.batch_size, state.config.batch_max_workers)
        .await
        .map_err(|e| {
            tracing::error!(request_id = %ctx.request_id, "error getting all datasets: {}", e);
            AppError::from_upstream(&e, "error getting all datasets")
        })?;

    Ok(Json(mapper::all_datasets(datasets)))
}

/// GET /datasets/{dataset_id}/editions - List editions with their latest release dates.
pub async fn list_editions(
    State(state): State<AppState>,
    Path(path): Path<DatasetPath>,
    headers: InboundHeaders,
) -> ApiResult<EditionsPage> {
    let ctx = headers.require()?;
    let dataset_id = path.dataset_id.as_str();

    tracing::info!(request_id = %ctx.request_id, dataset_id, "calling get editions");

    let dataset = state
        .dataset
        .get_dataset_current_and_next(&ctx, dataset_id)
        .await
        .map_err(|e| {
            tracing::error!(
                request_id = %ctx.request_id,
                dataset_id,
                "error getting dataset from dataset API: {}",
                e
            );
            AppError::from_upstream(&e, "error getting dataset from dataset API")
        })?;

    let editions = state
        .dataset
        .get_editions(&ctx, dataset_id)
        .await
        .map_err(|e| {
            tracing::error!(
                request_id = %ctx.request_id,
                dataset_id,
                "error getting editions from dataset API: {}",
                e
            );
            AppError::from_upstream(&e, "error getting editions from dataset API")
        })?;

    let release_dates = state
        .metadata
        .latest_release_dates(&ctx, dataset_id, &editions)
        .await;

    Ok(Json(mapper::all_editions(&dataset, &editions, &release_dates)))
}

/// GET /datasets/{dataset_id}/editions/{edition}/versions - List versions, newest first.
pub async fn list_versions(
    State(state): State<AppState>,
    Path(path): Path<EditionPath>,
    headers: InboundHeaders,
) -> ApiResult<VersionsPage> {
    let ctx = headers.require()?;
    let dataset_id = path.dataset_id.as_str();
    let edition = path.edition.as_str();

    tracing::info!(request_id = %ctx.request_id, dataset_id, edition, "calling get versions");

    let dataset = state
        .dataset
        .get_dataset_current_and_next(&ctx, dataset_id)
        .await
        .map_err(|e| {
            tracing::error!(
                request_id = %ctx.request_id,
                dataset_id,
                edition,
                "error getting dataset from dataset API: {}",
                e
            );
            AppError::from_upstream(&e, "error getting dataset from dataset API")
        })?;

    let edition_details = state
        .dataset
        .get_edition(&ctx, dataset_id, edition)
        .await
        .map_err(|e| {
            tracing::error!(
                request_id = %ctx.request_id,
                dataset_id,
                edition,
                "error getting edition from dataset API: {}",
                e
            );
            AppError::from_upstream(&e, "error getting edition from dataset API")
        })?;

    let versions = state
        .dataset
        .get_versions_in_batches(
            &ctx,
            dataset_id,
            edition,
            state.config.batch_size,
            state.config.batch_max_workers,
        )
        .await
        .map_err(|e| {
            tracing::error!(
                request_id = %ctx.request_id,
                dataset_id,
                edition,
                "error getting all versions from dataset API: {}",
                e
            );
            AppError::from_upstream(&e, "error getting all versions from dataset API")
        })?;

    Ok(Json(mapper::all_versions(&dataset, &edition_details, versions)))
}
