//! REST API module.
//!
//! One thin handler per route: validate headers, call the upstreams or the metadata service,
//! map the result, respond with JSON.

mod datasets;
mod metadata;
mod topics;

pub use datasets::*;
pub use metadata::*;
pub use topics::*;

use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;

/// Handler result: a JSON body or a plain-text error.
pub type ApiResult<T> = Result<Json<T>, AppError>;

#[derive(Debug, Deserialize)]
pub struct DatasetPath {
    pub dataset_id: String,
}

#[derive(Debug, Deserialize)]
pub struct EditionPath {
    pub dataset_id: String,
    pub edition: String,
}

#[derive(Debug, Deserialize)]
pub struct VersionPath {
    pub dataset_id: String,
    pub edition: String,
    pub version: String,
}
