//! Collection (Zebedee) wire models.

use serde::{Deserialize, Serialize};

/// Where one dataset or version sits in a collection's review workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub uri: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub last_edited_by: String,
}

/// A named batch of pending edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub datasets: Vec<CollectionItem>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub dataset_versions: Vec<CollectionItem>,
}

impl Collection {
    /// The collection entry for `dataset_id`, if the dataset is in this collection.
    pub fn dataset_item(&self, dataset_id: &str) -> Option<&CollectionItem> {
        self.datasets.iter().find(|item| item.id == dataset_id)
    }
}

/// Body sent when moving a dataset or version to a new collection state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionStateUpdate {
    pub state: String,
}
