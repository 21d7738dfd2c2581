//! Topics (Babbage) wire models.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicDescription {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicEntry {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub description: TopicDescription,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub uri: String,
    #[serde(default, deserialize_with = "super::null_as_default", rename = "type")]
    pub entry_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicResults {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub results: Vec<TopicEntry>,
}

/// Response of the topics taxonomy endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicsResult {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub topics: TopicResults,
}
