//! View models served to the publishing front end.

use serde::{Deserialize, Serialize};

use super::{DatasetDetails, Patch, Version, VersionDimension};

/// Entry in the dataset picker list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditionSummary {
    pub id: String,
    pub title: String,
    pub release_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditionsPage {
    pub dataset_name: String,
    pub editions: Vec<EditionSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub id: String,
    pub title: String,
    pub version: i64,
    pub release_date: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionsPage {
    pub dataset_name: String,
    pub edition_name: String,
    pub versions: Vec<VersionSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicTitle {
    pub title: String,
}

/// The edit-metadata document: dataset, version and collection linkage in one payload.
///
/// Served by GET and accepted back by PUT on the version route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditMetadata {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub dataset: DatasetDetails,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub version: Version,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub dimensions: Vec<VersionDimension>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub collection_id: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub collection_state: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub collection_last_edited_by: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub version_etag: String,
}

/// PATCH body: field-path operations plus the collection state to record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateMetadata {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub patches: Vec<Patch>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub collection_state: String,
}

// ==================== FLATTENED VERSION VIEW ====================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDate {
    pub release_date: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: usize,
    #[serde(rename = "type")]
    pub notice_type: String,
    pub date: String,
    pub description: String,
    pub simple_list_heading: String,
    pub simple_list_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageNoteItem {
    pub id: usize,
    pub title: String,
    pub note: String,
    pub simple_list_heading: String,
    pub simple_list_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestChange {
    pub id: usize,
    pub title: String,
    pub description: String,
    pub simple_list_heading: String,
    pub simple_list_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedContent {
    pub id: usize,
    pub title: String,
    pub description: String,
    pub href: String,
    pub simple_list_heading: String,
    pub simple_list_description: String,
}

/// Flattened metadata used by the simple-list editing screens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatMetadata {
    pub edition: String,
    pub version: i64,
    #[serde(rename = "release-date")]
    pub release_date: ReleaseDate,
    pub notices: Vec<Notice>,
    pub dimensions: Vec<VersionDimension>,
    pub usage_notes: Vec<UsageNoteItem>,
    pub latest_changes: Vec<LatestChange>,

    pub title: String,
    pub summary: String,
    pub keywords: String,
    pub national_statistic: bool,
    pub license: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_telephone: String,
    pub related_datasets: Vec<RelatedContent>,
    pub related_publications: Vec<RelatedContent>,
    pub related_methodologies: Vec<RelatedContent>,
    pub release_frequency: String,
    pub next_release_date: String,
    pub unit_of_meassure: String,
    pub qmi: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditVersionMetadata {
    pub meta_data: FlatMetadata,
    pub collection: String,
    pub instance_id: String,
    pub published: bool,
}
