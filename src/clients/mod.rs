//! Upstream client adapters.
//!
//! One capability trait per upstream service, each with a `reqwest` implementation. Handlers
//! and the metadata service only ever see the traits, so tests swap in fakes.

mod babbage;
mod batch;
mod dataset;
mod http;
mod zebedee;

pub use babbage::BabbageClient;
pub use dataset::DatasetClient;
pub use zebedee::ZebedeeClient;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::models::{
    Collection, Dataset, Edition, EditableMetadata, Patch, TopicsResult, Version,
};

pub const FLORENCE_TOKEN_HEADER: &str = "X-Florence-Token";
pub const COLLECTION_ID_HEADER: &str = "Collection-Id";
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Identity and correlation values forwarded on every upstream call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub access_token: String,
    pub collection_id: String,
    pub request_id: String,
}

/// Failure talking to an upstream service.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("{service} returned status {status} for {url}")]
    Status {
        service: &'static str,
        status: StatusCode,
        url: String,
    },
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        source: reqwest::Error,
    },
    #[error("{service} returned an undecodable body: {source}")]
    Decode {
        service: &'static str,
        source: serde_json::Error,
    },
    #[error("invalid {service} url: {message}")]
    InvalidUrl {
        service: &'static str,
        message: String,
    },
    #[error("{service} batch fetch failed: {message}")]
    Batch {
        service: &'static str,
        message: String,
    },
}

impl UpstreamError {
    /// HTTP status reported by the upstream, when the failure was a non-2xx response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// Dataset catalog API.
#[async_trait]
pub trait DatasetApi: Send + Sync {
    /// Every dataset, fetched in pages of `batch_size` with at most `max_workers` in flight.
    async fn get_datasets_in_batches(
        &self,
        ctx: &RequestContext,
        batch_size: usize,
        max_workers: usize,
    ) -> Result<Vec<Dataset>, UpstreamError>;

    async fn get_dataset_current_and_next(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
    ) -> Result<Dataset, UpstreamError>;

    async fn get_editions(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
    ) -> Result<Vec<Edition>, UpstreamError>;

    async fn get_edition(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        edition: &str,
    ) -> Result<Edition, UpstreamError>;

    async fn get_versions_in_batches(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        edition: &str,
        batch_size: usize,
        max_workers: usize,
    ) -> Result<Vec<Version>, UpstreamError>;

    /// A version together with its `ETag` (empty when the upstream sent none).
    async fn get_version(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        edition: &str,
        version: &str,
    ) -> Result<(Version, String), UpstreamError>;

    /// Replace the editable fields of a dataset and version, guarded by `if_match`.
    async fn put_metadata(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        edition: &str,
        version: &str,
        metadata: &EditableMetadata,
        if_match: &str,
    ) -> Result<(), UpstreamError>;

    async fn patch_dataset(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        patches: &[Patch],
    ) -> Result<(), UpstreamError>;

    async fn patch_version(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        edition: &str,
        version: &str,
        patches: &[Patch],
        if_match: &str,
    ) -> Result<(), UpstreamError>;
}

/// Collection service. Writes target the collection in `ctx.collection_id`.
#[async_trait]
pub trait CollectionApi: Send + Sync {
    async fn get_collection(
        &self,
        ctx: &RequestContext,
        collection_id: &str,
    ) -> Result<Collection, UpstreamError>;

    async fn put_dataset_in_collection(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        state: &str,
    ) -> Result<(), UpstreamError>;

    async fn put_version_in_collection(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        edition: &str,
        version: &str,
        state: &str,
    ) -> Result<(), UpstreamError>;
}

/// Topic taxonomy service.
#[async_trait]
pub trait TopicsApi: Send + Sync {
    async fn get_topics(&self, ctx: &RequestContext) -> Result<TopicsResult, UpstreamError>;
}
