//! Mapping between upstream wire models and the view models served to the front end.
//!
//! Everything here is pure. A missing optional upstream field degrades to an empty value for
//! that field only; the one fallible mapping is the flattened version view, whose alert dates
//! must parse.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime};

use crate::models::{
    Collection, Dataset, DatasetDetails, DatasetSummary, EditMetadata, EditVersionMetadata,
    EditableMetadata, Edition, EditionSummary, EditionsPage, FlatMetadata, LatestChange, Notice,
    ReleaseDate, RelatedContent, TopicTitle, TopicsResult, UsageNote, UsageNoteItem, Version,
    VersionDimension, VersionSummary, VersionsPage,
};

/// Datasets of this type are imported from another system and cannot be edited here.
pub const EXCLUDED_DATASET_TYPE: &str = "nomis";

pub const PUBLISHED_STATE: &str = "published";

const RELEASE_DATE_INPUT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";
const RELEASE_DATE_OUTPUT: &str = "%d %B %Y";
const NOTICE_DATE_OUTPUT: &str = "%d %b %Y";

#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("error whilst parsing time from alert date {date:?}: {source}")]
    AlertDate {
        date: String,
        source: chrono::ParseError,
    },
}

/// Reformat an upstream release date (`2020-11-07T00:00:00.000Z`) as `07 November 2020`.
///
/// Unparsable input gives an empty string.
pub fn format_release_date(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    match NaiveDateTime::parse_from_str(raw, RELEASE_DATE_INPUT) {
        Ok(date) => date.format(RELEASE_DATE_OUTPUT).to_string(),
        Err(e) => {
            tracing::warn!(release_date = %raw, "failed to parse release date: {}", e);
            String::new()
        }
    }
}

/// Datasets picker list.
///
/// Datasets without a `next` document, or of the excluded type, are dropped. Titled entries
/// come first ordered by title, then untitled entries ordered by ID; all comparisons ignore case.
pub fn all_datasets(datasets: Vec<Dataset>) -> Vec<DatasetSummary> {
    let mut mapped: Vec<DatasetSummary> = datasets
        .into_iter()
        .filter_map(|ds| {
            let next = ds.next?;
            if next.dataset_type == EXCLUDED_DATASET_TYPE {
                return None;
            }
            Some(DatasetSummary {
                id: ds.id,
                title: next.title,
            })
        })
        .collect();

    mapped.sort_by(compare_summaries);
    mapped
}

fn compare_summaries(a: &DatasetSummary, b: &DatasetSummary) -> Ordering {
    match (a.title.is_empty(), b.title.is_empty()) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        _ => a
            .title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.id.to_lowercase().cmp(&b.id.to_lowercase())),
    }
}

/// Versions of one edition, newest first.
pub fn all_versions(dataset: &Dataset, edition: &Edition, versions: Vec<Version>) -> VersionsPage {
    let mut mapped: Vec<VersionSummary> = versions
        .into_iter()
        .map(|v| {
            let mut title = format!("Version: {}", v.version);
            if v.state == PUBLISHED_STATE {
                title.push_str(" (published)");
            }
            VersionSummary {
                release_date: format_release_date(&v.release_date),
                id: v.id,
                title,
                version: v.version,
                state: v.state,
            }
        })
        .collect();

    mapped.sort_by(|a, b| b.version.cmp(&a.version));

    VersionsPage {
        dataset_name: dataset.next_title().to_string(),
        edition_name: edition.edition.clone(),
        versions: mapped,
    }
}

/// Editions of a dataset, each labelled with its latest version's release date.
///
/// `latest_release_dates` is keyed by edition name and holds raw upstream dates.
pub fn all_editions(
    dataset: &Dataset,
    editions: &[Edition],
    latest_release_dates: &HashMap<String, String>,
) -> EditionsPage {
    let editions = editions
        .iter()
        .map(|e| EditionSummary {
            id: e.edition.clone(),
            title: e.edition.clone(),
            release_date: latest_release_dates
                .get(&e.edition)
                .map(|raw| format_release_date(raw))
                .unwrap_or_default(),
        })
        .collect();

    EditionsPage {
        dataset_name: dataset.next_title().to_string(),
        editions,
    }
}

/// Merge the dataset's next document, a version and the owning collection into one document.
pub fn edit_metadata(
    dataset_id: &str,
    next: Option<DatasetDetails>,
    version: Version,
    dimensions: Vec<VersionDimension>,
    collection: &Collection,
    version_etag: &str,
) -> EditMetadata {
    let (collection_state, collection_last_edited_by) = collection
        .dataset_item(dataset_id)
        .map(|item| (item.state.clone(), item.last_edited_by.clone()))
        .unwrap_or_default();

    EditMetadata {
        dataset: next.unwrap_or_default(),
        version,
        dimensions,
        collection_id: collection.id.clone(),
        collection_state,
        collection_last_edited_by,
        version_etag: version_etag.to_string(),
    }
}

/// The fields the dataset API accepts on its editable-metadata endpoint.
pub fn editable_metadata(metadata: &EditMetadata) -> EditableMetadata {
    let dataset = &metadata.dataset;
    let version = &metadata.version;

    EditableMetadata {
        title: dataset.title.clone(),
        description: dataset.description.clone(),
        license: dataset.license.clone(),
        keywords: dataset.keywords.clone().unwrap_or_default(),
        contacts: dataset.contacts.clone().unwrap_or_default(),
        methodologies: dataset.methodologies.clone().unwrap_or_default(),
        publications: dataset.publications.clone().unwrap_or_default(),
        related_datasets: dataset.related_datasets.clone().unwrap_or_default(),
        related_content: dataset.related_content.clone().unwrap_or_default(),
        qmi: dataset.qmi.clone(),
        unit_of_measure: dataset.unit_of_measure.clone(),
        canonical_topic: dataset.canonical_topic.clone(),
        subtopics: dataset.subtopics.clone(),
        survey: dataset.survey.clone(),
        release_frequency: dataset.release_frequency.clone(),
        next_release: dataset.next_release.clone(),
        national_statistic: dataset.national_statistic,
        release_date: version.release_date.clone(),
        dimensions: version.dimensions.clone(),
        alerts: version.alerts.clone().unwrap_or_default(),
        latest_changes: version.latest_changes.clone(),
        usage_notes: version.usage_notes.clone().unwrap_or_default(),
    }
}

pub fn topics(result: TopicsResult) -> Vec<TopicTitle> {
    result
        .topics
        .results
        .into_iter()
        .map(|entry| TopicTitle {
            title: entry.description.title,
        })
        .collect()
}

/// Flattened view of a dataset and version for the simple-list editing screens.
pub fn edit_version_metadata(
    dataset: &DatasetDetails,
    version: &Version,
) -> Result<EditVersionMetadata, MappingError> {
    let notices = notices(version)?;
    let contact = dataset
        .contacts
        .as_ref()
        .and_then(|contacts| contacts.first())
        .cloned()
        .unwrap_or_default();

    let meta_data = FlatMetadata {
        edition: version.edition.clone(),
        version: version.version,
        release_date: ReleaseDate {
            release_date: version.release_date.clone(),
            error: String::new(),
        },
        notices,
        dimensions: version.dimensions.clone(),
        usage_notes: usage_notes(dataset.usage_notes.as_deref().unwrap_or_default()),
        latest_changes: version
            .latest_changes
            .iter()
            .enumerate()
            .map(|(id, change)| LatestChange {
                id,
                title: change.name.clone(),
                description: change.description.clone(),
                simple_list_heading: change.name.clone(),
                simple_list_description: change.description.clone(),
            })
            .collect(),

        title: dataset.title.clone(),
        summary: dataset.description.clone(),
        keywords: dataset
            .keywords
            .as_ref()
            .map(|k| k.join(", "))
            .unwrap_or_default(),
        national_statistic: dataset.national_statistic,
        license: dataset.license.clone(),
        contact_name: contact.name,
        contact_email: contact.email,
        contact_telephone: contact.telephone,
        related_datasets: dataset
            .related_datasets
            .iter()
            .flatten()
            .enumerate()
            .map(|(id, rd)| related(id, &rd.title, "", &rd.url))
            .collect(),
        related_publications: dataset
            .publications
            .iter()
            .flatten()
            .enumerate()
            .map(|(id, p)| related(id, &p.title, &p.description, &p.url))
            .collect(),
        related_methodologies: dataset
            .methodologies
            .iter()
            .flatten()
            .enumerate()
            .map(|(id, m)| related(id, &m.title, &m.description, &m.url))
            .collect(),
        release_frequency: dataset.release_frequency.clone(),
        next_release_date: dataset.next_release.clone(),
        unit_of_meassure: dataset.unit_of_measure.clone(),
        qmi: dataset.qmi.url.clone(),
    };

    let collection = if version.collection_id.is_empty() {
        "false".to_string()
    } else {
        version.collection_id.clone()
    };

    Ok(EditVersionMetadata {
        meta_data,
        collection,
        instance_id: version.id.clone(),
        published: version.state == PUBLISHED_STATE,
    })
}

fn notices(version: &Version) -> Result<Vec<Notice>, MappingError> {
    version
        .alerts
        .iter()
        .flatten()
        .enumerate()
        .map(|(id, alert)| {
            let date = DateTime::parse_from_rfc3339(&alert.date)
                .map_err(|source| MappingError::AlertDate {
                    date: alert.date.clone(),
                    source,
                })?
                .format(NOTICE_DATE_OUTPUT)
                .to_string();
            Ok(Notice {
                id,
                notice_type: alert.alert_type.clone(),
                simple_list_heading: format!("{} ({})", alert.alert_type, date),
                simple_list_description: alert.description.clone(),
                description: alert.description.clone(),
                date,
            })
        })
        .collect()
}

fn usage_notes(notes: &[UsageNote]) -> Vec<UsageNoteItem> {
    notes
        .iter()
        .enumerate()
        .map(|(id, note)| UsageNoteItem {
            id,
            title: note.title.clone(),
            note: note.note.clone(),
            simple_list_heading: note.title.clone(),
            simple_list_description: note.note.clone(),
        })
        .collect()
}

fn related(id: usize, title: &str, description: &str, href: &str) -> RelatedContent {
    RelatedContent {
        id,
        title: title.to_string(),
        description: description.to_string(),
        href: href.to_string(),
        simple_list_heading: title.to_string(),
        simple_list_description: description.to_string(),
    }
}
