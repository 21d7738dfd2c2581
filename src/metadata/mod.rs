//! Metadata aggregation and write fan-out.
//!
//! Reads combine a version, its dataset, the previous published version's dimensions and the
//! owning collection into one edit document. Writes push the edited document back as a
//! metadata mutation followed by collection state updates. Every step is sequential and
//! fail-fast; nothing is rolled back.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Url;

use crate::clients::{CollectionApi, DatasetApi, RequestContext, UpstreamError};
use crate::mapper;
use crate::models::{Collection, EditMetadata, Edition, Patch, UpdateMetadata, VersionDimension};

pub const EDITION_CONFIRMED_STATE: &str = "edition-confirmed";

const REPLACE_OP: &str = "replace";

const DATASET_PATCH_FIELDS: &[&str] = &[
    "title",
    "description",
    "keywords",
    "contacts",
    "license",
    "methodologies",
    "national_statistic",
    "next_release",
    "publications",
    "qmi",
    "related_datasets",
    "related_content",
    "release_frequency",
    "unit_of_measure",
    "canonical_topic",
    "subtopics",
    "survey",
];

const VERSION_PATCH_FIELDS: &[&str] = &[
    "release_date",
    "alerts",
    "latest_changes",
    "dimensions",
    "usage_notes",
];

/// A PATCH body that cannot be forwarded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("no patches supplied")]
    Empty,
    #[error("unsupported patch operation {op:?} for path {path:?}")]
    UnsupportedOp { op: String, path: String },
    #[error("unsupported patch path {0:?}")]
    UnknownPath(String),
}

/// The write step that failed. Earlier steps have already been applied upstream.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("error updating metadata: {0}")]
    Metadata(#[source] UpstreamError),
    #[error("error updating dataset metadata via patch endpoint: {0}")]
    DatasetPatch(#[source] UpstreamError),
    #[error("error updating dataset version metadata via patch endpoint: {0}")]
    VersionPatch(#[source] UpstreamError),
    #[error("error adding dataset to collection: {0}")]
    DatasetCollection(#[source] UpstreamError),
    #[error("error adding version to collection: {0}")]
    VersionCollection(#[source] UpstreamError),
}

impl WriteError {
    /// Phrase returned to the caller for this step.
    pub fn phrase(&self) -> &'static str {
        match self {
            WriteError::Metadata(_) => "error updating metadata",
            WriteError::DatasetPatch(_) => "error updating dataset metadata via patch endpoint",
            WriteError::VersionPatch(_) => {
                "error updating dataset version metadata via patch endpoint"
            }
            WriteError::DatasetCollection(_) => "error adding dataset to collection",
            WriteError::VersionCollection(_) => "error adding version to collection",
        }
    }

    pub fn upstream(&self) -> &UpstreamError {
        match self {
            WriteError::Metadata(e)
            | WriteError::DatasetPatch(e)
            | WriteError::VersionPatch(e)
            | WriteError::DatasetCollection(e)
            | WriteError::VersionCollection(e) => e,
        }
    }
}

/// The read step that failed while building the edit document.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("failed to get version details: {0}")]
    Version(#[source] UpstreamError),
    #[error("failed to get dataset details: {0}")]
    Dataset(#[source] UpstreamError),
    #[error("failed to get collection details: {0}")]
    Collection(#[source] UpstreamError),
}

impl ReadError {
    pub fn phrase(&self) -> &'static str {
        match self {
            ReadError::Version(_) => "failed to get version details",
            ReadError::Dataset(_) => "failed to get dataset details",
            ReadError::Collection(_) => "failed to get collection details",
        }
    }

    pub fn upstream(&self) -> &UpstreamError {
        match self {
            ReadError::Version(e) | ReadError::Dataset(e) | ReadError::Collection(e) => e,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not enough arguements in path {0:?}")]
pub struct VersionUrlError(String);

/// Dataset, edition and version IDs of a version URL such as
/// `http://localhost:22000/v1/datasets/cpih01/editions/time-series/versions/3`.
///
/// The IDs are read from fixed positions of the `/`-split path, which needs eight parts.
/// Relative references are resolved against a placeholder host.
pub fn ids_from_url(raw: &str) -> Result<(String, String, String), VersionUrlError> {
    let path = match Url::parse(raw) {
        Ok(url) => url.path().to_string(),
        Err(_) => Url::parse("http://localhost/")
            .and_then(|base| base.join(raw))
            .map(|url| url.path().to_string())
            .map_err(|_| VersionUrlError(raw.to_string()))?,
    };

    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() < 8 {
        return Err(VersionUrlError(raw.to_string()));
    }

    Ok((
        parts[3].to_string(),
        parts[5].to_string(),
        parts[7].to_string(),
    ))
}

/// Split patches into dataset-level and version-level sets by their first path segment.
pub fn partition_patches(patches: &[Patch]) -> Result<(Vec<Patch>, Vec<Patch>), PatchError> {
    if patches.is_empty() {
        return Err(PatchError::Empty);
    }

    let mut dataset = Vec::new();
    let mut version = Vec::new();

    for patch in patches {
        if patch.op != REPLACE_OP {
            return Err(PatchError::UnsupportedOp {
                op: patch.op.clone(),
                path: patch.path.clone(),
            });
        }

        let field = patch
            .path
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default();

        if DATASET_PATCH_FIELDS.contains(&field) {
            dataset.push(patch.clone());
        } else if VERSION_PATCH_FIELDS.contains(&field) {
            version.push(patch.clone());
        } else {
            return Err(PatchError::UnknownPath(patch.path.clone()));
        }
    }

    Ok((dataset, version))
}

/// Reads and writes the edit-metadata document against the dataset API and collections.
pub struct MetadataService {
    dataset: Arc<dyn DatasetApi>,
    collections: Arc<dyn CollectionApi>,
}

impl MetadataService {
    pub fn new(dataset: Arc<dyn DatasetApi>, collections: Arc<dyn CollectionApi>) -> Self {
        Self {
            dataset,
            collections,
        }
    }

    /// Build the edit document for one version.
    pub async fn fetch_edit_metadata(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        edition: &str,
        version: &str,
    ) -> Result<EditMetadata, ReadError> {
        let (v, etag) = self
            .dataset
            .get_version(ctx, dataset_id, edition, version)
            .await
            .map_err(ReadError::Version)?;

        let d = self
            .dataset
            .get_dataset_current_and_next(ctx, dataset_id)
            .await
            .map_err(ReadError::Dataset)?;

        // An edition-confirmed version has not been edited yet; pre-fill it with the
        // dimensions of the latest published version.
        let dimensions = if v.state == EDITION_CONFIRMED_STATE && v.version > 1 {
            let latest = d
                .current
                .as_ref()
                .map(|c| c.links.latest_version_href())
                .unwrap_or_default();
            self.latest_published_dimensions(ctx, latest).await
        } else {
            Vec::new()
        };

        let collection_id = d
            .next
            .as_ref()
            .map(|n| n.collection_id.as_str())
            .unwrap_or_default();
        let collection = if collection_id.is_empty() {
            Collection::default()
        } else {
            self.collections
                .get_collection(ctx, collection_id)
                .await
                .map_err(ReadError::Collection)?
        };

        Ok(mapper::edit_metadata(
            dataset_id,
            d.next,
            v,
            dimensions,
            &collection,
            &etag,
        ))
    }

    async fn latest_published_dimensions(
        &self,
        ctx: &RequestContext,
        latest_version_href: &str,
    ) -> Vec<VersionDimension> {
        let (dataset_id, edition, version) = match ids_from_url(latest_version_href) {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    "failed to parse latest version url: {}",
                    e
                );
                return Vec::new();
            }
        };

        match self
            .dataset
            .get_version(ctx, &dataset_id, &edition, &version)
            .await
        {
            Ok((latest, _)) => latest.dimensions,
            Err(e) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    dataset_id = %dataset_id,
                    edition = %edition,
                    version = %version,
                    "failed to get latest published version: {}",
                    e
                );
                Vec::new()
            }
        }
    }

    /// Raw release date of each edition's latest version, keyed by edition name.
    ///
    /// Editions whose latest version cannot be resolved map to an empty date.
    pub async fn latest_release_dates(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        editions: &[Edition],
    ) -> HashMap<String, String> {
        let mut dates = HashMap::with_capacity(editions.len());

        for edition in editions {
            let release_date = match ids_from_url(edition.links.latest_version_href()) {
                Ok((_, _, version)) => self
                    .dataset
                    .get_version(ctx, dataset_id, &edition.edition, &version)
                    .await
                    .map(|(v, _)| v.release_date)
                    .unwrap_or_else(|e| {
                        tracing::warn!(
                            dataset_id = %dataset_id,
                            edition = %edition.edition,
                            "failed to get latest version of edition: {}",
                            e
                        );
                        String::new()
                    }),
                Err(_) => String::new(),
            };
            dates.insert(edition.edition.clone(), release_date);
        }

        dates
    }

    /// Write an edited document back: metadata first, then the dataset and version
    /// collection entries.
    pub async fn apply_editable_metadata(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        edition: &str,
        version: &str,
        metadata: &EditMetadata,
        if_match: &str,
    ) -> Result<(), WriteError> {
        let editable = mapper::editable_metadata(metadata);

        self.dataset
            .put_metadata(ctx, dataset_id, edition, version, &editable, if_match)
            .await
            .map_err(WriteError::Metadata)?;

        self.collections
            .put_dataset_in_collection(ctx, dataset_id, &metadata.collection_state)
            .await
            .map_err(WriteError::DatasetCollection)?;

        self.collections
            .put_version_in_collection(ctx, dataset_id, edition, version, &metadata.collection_state)
            .await
            .map_err(WriteError::VersionCollection)?;

        Ok(())
    }

    /// Forward already-partitioned patches, then record the collection state for each level
    /// that changed.
    #[allow(clippy::too_many_arguments)]
    pub async fn apply_patches(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        edition: &str,
        version: &str,
        dataset_patches: &[Patch],
        version_patches: &[Patch],
        update: &UpdateMetadata,
        if_match: &str,
    ) -> Result<(), WriteError> {
        if !dataset_patches.is_empty() {
            self.dataset
                .patch_dataset(ctx, dataset_id, dataset_patches)
                .await
                .map_err(WriteError::DatasetPatch)?;
        }

        if !version_patches.is_empty() {
            self.dataset
                .patch_version(ctx, dataset_id, edition, version, version_patches, if_match)
                .await
                .map_err(WriteError::VersionPatch)?;
        }

        if !dataset_patches.is_empty() {
            self.collections
                .put_dataset_in_collection(ctx, dataset_id, &update.collection_state)
                .await
                .map_err(WriteError::DatasetCollection)?;
        }

        if !version_patches.is_empty() {
            self.collections
                .put_version_in_collection(
                    ctx,
                    dataset_id,
                    edition,
                    version,
                    &update.collection_state,
                )
                .await
                .map_err(WriteError::VersionCollection)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CollectionItem, Dataset, DatasetDetails, EditableMetadata, Link, Links, Version,
    };
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::sync::Mutex;

    fn status_error(status: StatusCode) -> UpstreamError {
        UpstreamError::Status {
            service: "fake",
            status,
            url: "http://fake".to_string(),
        }
    }

    /// In-memory upstreams that record every call in order.
    #[derive(Default)]
    struct Fake {
        calls: Mutex<Vec<String>>,
        versions: HashMap<(String, String, String), Version>,
        dataset: Dataset,
        collection: Collection,
        fail: Option<&'static str>,
    }

    impl Fake {
        fn record(&self, call: &str) -> Result<(), UpstreamError> {
            self.calls.lock().unwrap().push(call.to_string());
            if self.fail.is_some_and(|f| call.starts_with(f)) {
                return Err(status_error(StatusCode::INTERNAL_SERVER_ERROR));
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DatasetApi for Fake {
        async fn get_datasets_in_batches(
            &self,
            _ctx: &RequestContext,
            _batch_size: usize,
            _max_workers: usize,
        ) -> Result<Vec<Dataset>, UpstreamError> {
            self.record("get_datasets")?;
            Ok(vec![self.dataset.clone()])
        }

        async fn get_dataset_current_and_next(
            &self,
            _ctx: &RequestContext,
            dataset_id: &str,
        ) -> Result<Dataset, UpstreamError> {
            self.record(&format!("get_dataset {}", dataset_id))?;
            Ok(self.dataset.clone())
        }

        async fn get_editions(
            &self,
            _ctx: &RequestContext,
            _dataset_id: &str,
        ) -> Result<Vec<Edition>, UpstreamError> {
            self.record("get_editions")?;
            Ok(Vec::new())
        }

        async fn get_edition(
            &self,
            _ctx: &RequestContext,
            _dataset_id: &str,
            edition: &str,
        ) -> Result<Edition, UpstreamError> {
            self.record("get_edition")?;
            Ok(Edition {
                edition: edition.to_string(),
                ..Default::default()
            })
        }

        async fn get_versions_in_batches(
            &self,
            _ctx: &RequestContext,
            _dataset_id: &str,
            _edition: &str,
            _batch_size: usize,
            _max_workers: usize,
        ) -> Result<Vec<Version>, UpstreamError> {
            self.record("get_versions")?;
            Ok(self.versions.values().cloned().collect())
        }

        async fn get_version(
            &self,
            _ctx: &RequestContext,
            dataset_id: &str,
            edition: &str,
            version: &str,
        ) -> Result<(Version, String), UpstreamError> {
            self.record(&format!("get_version {}/{}/{}", dataset_id, edition, version))?;
            let key = (
                dataset_id.to_string(),
                edition.to_string(),
                version.to_string(),
            );
            self.versions
                .get(&key)
                .cloned()
                .map(|v| (v, format!("etag-{}", version)))
                .ok_or_else(|| status_error(StatusCode::NOT_FOUND))
        }

        async fn put_metadata(
            &self,
            _ctx: &RequestContext,
            _dataset_id: &str,
            _edition: &str,
            _version: &str,
            _metadata: &EditableMetadata,
            if_match: &str,
        ) -> Result<(), UpstreamError> {
            self.record(&format!("put_metadata {}", if_match))
        }

        async fn patch_dataset(
            &self,
            _ctx: &RequestContext,
            _dataset_id: &str,
            patches: &[Patch],
        ) -> Result<(), UpstreamError> {
            self.record(&format!("patch_dataset {}", patches.len()))
        }

        async fn patch_version(
            &self,
            _ctx: &RequestContext,
            _dataset_id: &str,
            _edition: &str,
            _version: &str,
            patches: &[Patch],
            if_match: &str,
        ) -> Result<(), UpstreamError> {
            self.record(&format!("patch_version {} {}", patches.len(), if_match))
        }
    }

    #[async_trait]
    impl CollectionApi for Fake {
        async fn get_collection(
            &self,
            _ctx: &RequestContext,
            collection_id: &str,
        ) -> Result<Collection, UpstreamError> {
            self.record(&format!("get_collection {}", collection_id))?;
            Ok(self.collection.clone())
        }

        async fn put_dataset_in_collection(
            &self,
            _ctx: &RequestContext,
            dataset_id: &str,
            state: &str,
        ) -> Result<(), UpstreamError> {
            self.record(&format!("put_dataset_in_collection {} {}", dataset_id, state))
        }

        async fn put_version_in_collection(
            &self,
            _ctx: &RequestContext,
            _dataset_id: &str,
            _edition: &str,
            version: &str,
            state: &str,
        ) -> Result<(), UpstreamError> {
            self.record(&format!("put_version_in_collection {} {}", version, state))
        }
    }

    fn service(fake: Fake) -> (MetadataService, Arc<Fake>) {
        let fake = Arc::new(fake);
        let svc = MetadataService::new(fake.clone(), fake.clone());
        (svc, fake)
    }

    fn ctx() -> RequestContext {
        RequestContext {
            access_token: "token".to_string(),
            collection_id: "collection-1".to_string(),
            request_id: "req-1".to_string(),
        }
    }

    fn key(d: &str, e: &str, v: &str) -> (String, String, String) {
        (d.to_string(), e.to_string(), v.to_string())
    }

    fn dimension(name: &str) -> VersionDimension {
        VersionDimension {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// cpih01/time-series with version 2 in `state`, version 1 published with a geography
    /// dimension, and a `next` document owned by collection-1.
    fn fixture(state: &str) -> Fake {
        let mut versions = HashMap::new();
        versions.insert(
            key("cpih01", "time-series", "2"),
            Version {
                id: "v2".to_string(),
                version: 2,
                state: state.to_string(),
                ..Default::default()
            },
        );
        versions.insert(
            key("cpih01", "time-series", "1"),
            Version {
                id: "v1".to_string(),
                version: 1,
                state: "published".to_string(),
                release_date: "2020-11-07T00:00:00.000Z".to_string(),
                dimensions: vec![dimension("geography")],
                ..Default::default()
            },
        );

        let current = DatasetDetails {
            links: Links {
                latest_version: Some(Link {
                    href: "http://localhost:22000/v1/datasets/cpih01/editions/time-series/versions/1"
                        .to_string(),
                    id: Some("1".to_string()),
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        let next = DatasetDetails {
            id: "cpih01".to_string(),
            title: "CPIH".to_string(),
            collection_id: "collection-1".to_string(),
            ..Default::default()
        };

        Fake {
            versions,
            dataset: Dataset {
                id: "cpih01".to_string(),
                current: Some(current),
                next: Some(next),
            },
            collection: Collection {
                id: "collection-1".to_string(),
                datasets: vec![CollectionItem {
                    id: "cpih01".to_string(),
                    state: "inProgress".to_string(),
                    last_edited_by: "editor@example.com".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn patch(path: &str) -> Patch {
        Patch {
            op: "replace".to_string(),
            path: path.to_string(),
            value: json!("x"),
        }
    }

    #[test]
    fn test_ids_from_url() {
        let ids =
            ids_from_url("http://localhost:22000/v1/datasets/cpih01/editions/time-series/versions/3")
                .unwrap();
        assert_eq!(
            ids,
            (
                "cpih01".to_string(),
                "time-series".to_string(),
                "3".to_string()
            )
        );
    }

    #[test]
    fn test_ids_from_relative_url() {
        let ids = ids_from_url("/v1/datasets/cpih01/editions/2021/versions/7").unwrap();
        assert_eq!(ids.0, "cpih01");
        assert_eq!(ids.1, "2021");
        assert_eq!(ids.2, "7");
    }

    #[test]
    fn test_ids_from_url_too_short() {
        let err = ids_from_url("http://localhost:22000/datasets/cpih01").unwrap_err();
        assert!(err.to_string().contains("not enough arguements in path"));
        assert!(ids_from_url("").is_err());
    }

    #[test]
    fn test_partition_patches() {
        let (dataset, version) = partition_patches(&[
            patch("/title"),
            patch("/release_date"),
            patch("/keywords/0"),
            patch("/usage_notes"),
        ])
        .unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset[0].path, "/title");
        assert_eq!(dataset[1].path, "/keywords/0");
        assert_eq!(version.len(), 2);
        assert_eq!(version[0].path, "/release_date");
    }

    #[test]
    fn test_partition_patches_rejects_unknown_path() {
        let err = partition_patches(&[patch("/title"), patch("/unknown_field")]).unwrap_err();
        assert_eq!(err, PatchError::UnknownPath("/unknown_field".to_string()));
    }

    #[test]
    fn test_partition_patches_rejects_other_ops() {
        let mut add = patch("/title");
        add.op = "add".to_string();
        assert!(matches!(
            partition_patches(&[add]),
            Err(PatchError::UnsupportedOp { .. })
        ));
    }

    #[test]
    fn test_partition_patches_rejects_empty() {
        assert_eq!(partition_patches(&[]), Err(PatchError::Empty));
    }

    #[tokio::test]
    async fn test_fetch_edit_metadata_carries_dimensions_forward() {
        let (svc, fake) = service(fixture(EDITION_CONFIRMED_STATE));

        let metadata = svc
            .fetch_edit_metadata(&ctx(), "cpih01", "time-series", "2")
            .await
            .unwrap();

        assert_eq!(metadata.dimensions, vec![dimension("geography")]);
        assert_eq!(metadata.version.id, "v2");
        assert_eq!(metadata.dataset.title, "CPIH");
        assert_eq!(metadata.collection_id, "collection-1");
        assert_eq!(metadata.collection_state, "inProgress");
        assert_eq!(metadata.collection_last_edited_by, "editor@example.com");
        assert_eq!(metadata.version_etag, "etag-2");
        assert_eq!(
            fake.calls(),
            vec![
                "get_version cpih01/time-series/2",
                "get_dataset cpih01",
                "get_version cpih01/time-series/1",
                "get_collection collection-1",
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_edit_metadata_other_states_have_no_dimensions() {
        let (svc, fake) = service(fixture("associated"));

        let metadata = svc
            .fetch_edit_metadata(&ctx(), "cpih01", "time-series", "2")
            .await
            .unwrap();

        assert!(metadata.dimensions.is_empty());
        assert!(!fake
            .calls()
            .contains(&"get_version cpih01/time-series/1".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_edit_metadata_first_version_has_no_dimensions() {
        let mut fake = fixture(EDITION_CONFIRMED_STATE);
        fake.versions.insert(
            key("cpih01", "time-series", "1"),
            Version {
                version: 1,
                state: EDITION_CONFIRMED_STATE.to_string(),
                dimensions: vec![dimension("time")],
                ..Default::default()
            },
        );
        let (svc, _) = service(fake);

        let metadata = svc
            .fetch_edit_metadata(&ctx(), "cpih01", "time-series", "1")
            .await
            .unwrap();

        assert!(metadata.dimensions.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_edit_metadata_degrades_on_bad_latest_link() {
        let mut fake = fixture(EDITION_CONFIRMED_STATE);
        if let Some(current) = fake.dataset.current.as_mut() {
            current.links.latest_version = Some(Link {
                href: "http://localhost:22000/datasets".to_string(),
                id: None,
            });
        }
        let (svc, _) = service(fake);

        let metadata = svc
            .fetch_edit_metadata(&ctx(), "cpih01", "time-series", "2")
            .await
            .unwrap();

        assert!(metadata.dimensions.is_empty());
        assert_eq!(metadata.collection_state, "inProgress");
    }

    #[tokio::test]
    async fn test_fetch_edit_metadata_degrades_without_current() {
        let mut fake = fixture(EDITION_CONFIRMED_STATE);
        fake.dataset.current = None;
        let (svc, _) = service(fake);

        let metadata = svc
            .fetch_edit_metadata(&ctx(), "cpih01", "time-series", "2")
            .await
            .unwrap();

        assert!(metadata.dimensions.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_edit_metadata_skips_collection_without_id() {
        let mut fake = fixture("associated");
        if let Some(next) = fake.dataset.next.as_mut() {
            next.collection_id.clear();
        }
        let (svc, fake) = service(fake);

        let metadata = svc
            .fetch_edit_metadata(&ctx(), "cpih01", "time-series", "2")
            .await
            .unwrap();

        assert!(metadata.collection_id.is_empty());
        assert!(metadata.collection_state.is_empty());
        assert!(!fake.calls().iter().any(|c| c.starts_with("get_collection")));
    }

    #[tokio::test]
    async fn test_fetch_edit_metadata_version_not_found() {
        let (svc, fake) = service(fixture("associated"));

        let err = svc
            .fetch_edit_metadata(&ctx(), "cpih01", "time-series", "9")
            .await
            .unwrap_err();

        assert!(matches!(err, ReadError::Version(_)));
        assert!(err.upstream().is_not_found());
        assert_eq!(fake.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_edit_metadata_dataset_failure_aborts() {
        let mut fake = fixture("associated");
        fake.fail = Some("get_dataset");
        let (svc, fake) = service(fake);

        let err = svc
            .fetch_edit_metadata(&ctx(), "cpih01", "time-series", "2")
            .await
            .unwrap_err();

        assert_eq!(err.phrase(), "failed to get dataset details");
        assert_eq!(
            err.upstream().status(),
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
        assert_eq!(fake.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_latest_release_dates() {
        let (svc, _) = service(fixture("associated"));
        let editions = vec![
            Edition {
                edition: "time-series".to_string(),
                links: Links {
                    latest_version: Some(Link {
                        href: "http://localhost:22000/v1/datasets/cpih01/editions/time-series/versions/1"
                            .to_string(),
                        id: None,
                    }),
                    ..Default::default()
                },
                ..Default::default()
            },
            Edition {
                edition: "2021".to_string(),
                ..Default::default()
            },
        ];

        let dates = svc.latest_release_dates(&ctx(), "cpih01", &editions).await;

        assert_eq!(dates["time-series"], "2020-11-07T00:00:00.000Z");
        assert_eq!(dates["2021"], "");
    }

    #[tokio::test]
    async fn test_apply_editable_metadata_order() {
        let (svc, fake) = service(Fake::default());
        let metadata = EditMetadata {
            collection_state: "complete".to_string(),
            ..Default::default()
        };

        svc.apply_editable_metadata(&ctx(), "cpih01", "time-series", "2", &metadata, "etag-2")
            .await
            .unwrap();

        assert_eq!(
            fake.calls(),
            vec![
                "put_metadata etag-2",
                "put_dataset_in_collection cpih01 complete",
                "put_version_in_collection 2 complete",
            ]
        );
    }

    #[tokio::test]
    async fn test_apply_editable_metadata_fails_fast() {
        let (svc, fake) = service(Fake {
            fail: Some("put_metadata"),
            ..Default::default()
        });

        let err = svc
            .apply_editable_metadata(
                &ctx(),
                "cpih01",
                "time-series",
                "2",
                &EditMetadata::default(),
                "stale",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, WriteError::Metadata(_)));
        assert_eq!(err.phrase(), "error updating metadata");
        assert_eq!(fake.calls(), vec!["put_metadata stale"]);
    }

    #[tokio::test]
    async fn test_apply_editable_metadata_partial_write() {
        let (svc, fake) = service(Fake {
            fail: Some("put_version_in_collection"),
            ..Default::default()
        });

        let err = svc
            .apply_editable_metadata(
                &ctx(),
                "cpih01",
                "time-series",
                "2",
                &EditMetadata::default(),
                "etag-2",
            )
            .await
            .unwrap_err();

        assert_eq!(err.phrase(), "error adding version to collection");
        assert_eq!(fake.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_apply_patches_touches_only_patched_levels() {
        let (svc, fake) = service(Fake::default());
        let update = UpdateMetadata {
            patches: vec![patch("/title")],
            collection_state: "inProgress".to_string(),
        };
        let (dataset, version) = partition_patches(&update.patches).unwrap();

        svc.apply_patches(
            &ctx(),
            "cpih01",
            "time-series",
            "2",
            &dataset,
            &version,
            &update,
            "etag-2",
        )
        .await
        .unwrap();

        assert_eq!(
            fake.calls(),
            vec![
                "patch_dataset 1",
                "put_dataset_in_collection cpih01 inProgress",
            ]
        );
    }

    #[tokio::test]
    async fn test_apply_patches_both_levels() {
        let (svc, fake) = service(Fake::default());
        let update = UpdateMetadata {
            patches: vec![patch("/release_date"), patch("/title"), patch("/alerts")],
            collection_state: "complete".to_string(),
        };
        let (dataset, version) = partition_patches(&update.patches).unwrap();

        svc.apply_patches(
            &ctx(),
            "cpih01",
            "time-series",
            "2",
            &dataset,
            &version,
            &update,
            "etag-2",
        )
        .await
        .unwrap();

        assert_eq!(
            fake.calls(),
            vec![
                "patch_dataset 1",
                "patch_version 2 etag-2",
                "put_dataset_in_collection cpih01 complete",
                "put_version_in_collection 2 complete",
            ]
        );
    }

    #[tokio::test]
    async fn test_apply_patches_version_failure_skips_collection() {
        let (svc, fake) = service(Fake {
            fail: Some("patch_version"),
            ..Default::default()
        });
        let update = UpdateMetadata {
            patches: vec![patch("/release_date")],
            collection_state: "complete".to_string(),
        };
        let (dataset, version) = partition_patches(&update.patches).unwrap();

        let err = svc
            .apply_patches(
                &ctx(),
                "cpih01",
                "time-series",
                "2",
                &dataset,
                &version,
                &update,
                "",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, WriteError::VersionPatch(_)));
        assert_eq!(fake.calls(), vec!["patch_version 1 "]);
    }
}
