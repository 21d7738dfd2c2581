//! Edit-metadata endpoints for a single version.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};

use super::{ApiResult, VersionPath};
use crate::errors::AppError;
use crate::headers::InboundHeaders;
use crate::mapper;
use crate::metadata::partition_patches;
use crate::models::{EditMetadata, EditVersionMetadata, Patch, UpdateMetadata};
use crate::AppState;

/// GET /datasets/{dataset_id}/editions/{edition}/versions/{version} - The edit document.
///
/// The version's ETag is returned both as a header and in `version_etag`.
pub async fn get_edit_metadata(
    State(state): State<AppState>,
    Path(path): Path<VersionPath>,
    headers: InboundHeaders,
) -> Result<Response, AppError> {
    let ctx = headers.require()?;

    let metadata = state
        .metadata
        .fetch_edit_metadata(&ctx, &path.dataset_id, &path.edition, &path.version)
        .await
        .map_err(|e| {
            tracing::error!(
                request_id = %ctx.request_id,
                dataset_id = %path.dataset_id,
                edition = %path.edition,
                version = %path.version,
                "{}",
                e
            );
            AppError::from(e)
        })?;

    let etag = HeaderValue::from_str(&metadata.version_etag).ok();
    let mut response = Json(metadata).into_response();
    if let Some(etag) = etag.filter(|v| !v.is_empty()) {
        response.headers_mut().insert(header::ETAG, etag);
    }

    Ok(response)
}

/// PUT /datasets/{dataset_id}/editions/{edition}/versions/{version} - Save an edit document.
///
/// Echoes the request body on success.
pub async fn put_edit_metadata(
    State(state): State<AppState>,
    Path(path): Path<VersionPath>,
    headers: InboundHeaders,
    body: Bytes,
) -> Result<Response, AppError> {
    let ctx = headers.require()?;
    let metadata: EditMetadata = serde_json::from_slice(&body)?;

    let if_match = headers
        .if_match
        .as_deref()
        .unwrap_or(metadata.version_etag.as_str());

    state
        .metadata
        .apply_editable_metadata(
            &ctx,
            &path.dataset_id,
            &path.edition,
            &path.version,
            &metadata,
            if_match,
        )
        .await
        .map_err(|e| {
            tracing::error!(
                request_id = %ctx.request_id,
                dataset_id = %path.dataset_id,
                edition = %path.edition,
                version = %path.version,
                "{}",
                e
            );
            AppError::from(e)
        })?;

    tracing::info!(
        request_id = %ctx.request_id,
        dataset_id = %path.dataset_id,
        edition = %path.edition,
        version = %path.version,
        "put metadata: request successful"
    );

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// PATCH /datasets/{dataset_id}/editions/{edition}/versions/{version} - Apply field patches.
///
/// Echoes the patches on success.
pub async fn patch_edit_metadata(
    State(state): State<AppState>,
    Path(path): Path<VersionPath>,
    headers: InboundHeaders,
    body: Bytes,
) -> ApiResult<Vec<Patch>> {
    let ctx = headers.require()?;
    let update: UpdateMetadata = serde_json::from_slice(&body)?;
    let (dataset_patches, version_patches) = partition_patches(&update.patches)?;

    state
        .metadata
        .apply_patches(
            &ctx,
            &path.dataset_id,
            &path.edition,
            &path.version,
            &dataset_patches,
            &version_patches,
            &update,
            headers.if_match.as_deref().unwrap_or_default(),
        )
        .await
        .map_err(|e| {
            tracing::error!(
                request_id = %ctx.request_id,
                dataset_id = %path.dataset_id,
                edition = %path.edition,
                version = %path.version,
                "{}",
                e
            );
            AppError::from(e)
        })?;

    tracing::info!(
        request_id = %ctx.request_id,
        dataset_id = %path.dataset_id,
        edition = %path.edition,
        version = %path.version,
        dataset_patches = dataset_patches.len(),
        version_patches = version_patches.len(),
        "patch metadata: request successful"
    );

    Ok(Json(update.patches))
}

/// GET /datasets/{dataset_id}/editions/{edition}/versions/{version}/metadata - Flattened view.
pub async fn get_version_metadata(
    State(state): State<AppState>,
    Path(path): Path<VersionPath>,
    headers: InboundHeaders,
) -> ApiResult<EditVersionMetadata> {
    let ctx = headers.require()?;

    let dataset = state
        .dataset
        .get_dataset_current_and_next(&ctx, &path.dataset_id)
        .await
        .map_err(|e| {
            tracing::error!(
                request_id = %ctx.request_id,
                dataset_id = %path.dataset_id,
                "failed to get dataset details: {}",
                e
            );
            AppError::from_upstream(&e, "failed to get dataset details")
        })?;

    let (version, _) = state
        .dataset
        .get_version(&ctx, &path.dataset_id, &path.edition, &path.version)
        .await
        .map_err(|e| {
            tracing::error!(
                request_id = %ctx.request_id,
                dataset_id = %path.dataset_id,
                edition = %path.edition,
                version = %path.version,
                "failed to get version details: {}",
                e
            );
            AppError::from_upstream(&e, "failed to get version details")
        })?;

    let next = dataset.next.unwrap_or_default();
    Ok(Json(mapper::edit_version_metadata(&next, &version)?))
}
