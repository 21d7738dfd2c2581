//! Dataset API wire models.
//!
//! Field names follow the dataset API JSON exactly. Anything the upstream may omit is either
//! `Option` or `#[serde(default)]` so a sparse document never fails to decode.

use serde::{Deserialize, Serialize};

/// A single hyperlink in an upstream `links` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Links carried by datasets, editions, versions and dimensions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Links {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edition: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editions: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_list: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Link>,
    #[serde(default, rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_link: Option<Link>,
}

impl Links {
    /// The latest version href, or an empty string when the link is absent.
    pub fn latest_version_href(&self) -> &str {
        self.latest_version
            .as_ref()
            .map(|l| l.href.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub telephone: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Methodology {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "super::null_as_default", rename = "href")]
    pub url: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "super::null_as_default", rename = "href")]
    pub url: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatedDataset {
    #[serde(default, deserialize_with = "super::null_as_default", rename = "href")]
    pub url: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub title: String,
}

/// Generic related-content entry (`related_content` on a dataset).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralDetails {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub href: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageNote {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publisher {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "super::null_as_default", rename = "type")]
    pub publisher_type: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub href: String,
}

/// One representation (`current` or `next`) of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetDetails {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub collection_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contacts: Option<Vec<Contact>>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub license: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub links: Links,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methodologies: Option<Vec<Methodology>>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub national_statistic: bool,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub next_release: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publications: Option<Vec<Publication>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Publisher>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub qmi: Publication,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_datasets: Option<Vec<RelatedDataset>>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub release_frequency: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub theme: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "super::null_as_default", rename = "type")]
    pub dataset_type: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub unit_of_measure: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_notes: Option<Vec<UsageNote>>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub canonical_topic: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub subtopics: Vec<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub survey: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_content: Option<Vec<GeneralDetails>>,
}

/// A dataset with both its published (`current`) and in-flight (`next`) documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub id: String,
    #[serde(default)]
    pub current: Option<DatasetDetails>,
    #[serde(default)]
    pub next: Option<DatasetDetails>,
}

impl Dataset {
    /// Title of the in-flight document, empty when there is none.
    pub fn next_title(&self) -> &str {
        self.next
            .as_ref()
            .map(|n| n.title.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Edition {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub edition: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub links: Links,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionDimension {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub links: Links,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "super::null_as_default", rename = "type")]
    pub alert_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Change {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "super::null_as_default", rename = "type")]
    pub change_type: String,
}

/// A single numbered version of an edition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Version {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alerts: Option<Vec<Alert>>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub collection_id: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub edition: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub dimensions: Vec<VersionDimension>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub instance_id: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub latest_changes: Vec<Change>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub links: Links,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub release_date: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_notes: Option<Vec<UsageNote>>,
}

/// Paged list envelope used by every dataset API collection endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub items: Vec<T>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub count: usize,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub offset: usize,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub limit: usize,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub total_count: usize,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
            offset: 0,
            limit: 0,
            total_count: 0,
        }
    }
}

/// Body of the dataset API "replace editable metadata" endpoint.
///
/// Every list is concrete: the upstream rejects `null` where it expects an array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditableMetadata {
    pub title: String,
    pub description: String,
    pub license: String,
    pub keywords: Vec<String>,
    pub contacts: Vec<Contact>,
    pub methodologies: Vec<Methodology>,
    pub publications: Vec<Publication>,
    pub related_datasets: Vec<RelatedDataset>,
    pub related_content: Vec<GeneralDetails>,
    pub qmi: Publication,
    pub unit_of_measure: String,
    pub canonical_topic: String,
    pub subtopics: Vec<String>,
    pub survey: String,
    pub release_frequency: String,
    pub next_release: String,
    pub national_statistic: bool,
    pub release_date: String,
    pub dimensions: Vec<VersionDimension>,
    pub alerts: Vec<Alert>,
    pub latest_changes: Vec<Change>,
    pub usage_notes: Vec<UsageNote>,
}

/// A JSON-patch style operation forwarded to the dataset API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub op: String,
    pub path: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub value: serde_json::Value,
}
