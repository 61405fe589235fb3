//! Projection of a work's graph and REST metadata into a [`MetadataRecord`].

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{Language, LanguageMap, MetadataError, MetadataRecord};
use crate::config::RepositoryConfig;
use crate::graph::{GraphStore, vocab};
use crate::identity::WorkIdentity;

/// Endpoint keys bucketed into Subjects.
const SUBJECT_KEYS: [&str; 2] = ["dc.subject", "dc.subject.other"];

/// Endpoint key bucketed into Description.
const DESCRIPTION_KEY: &str = "dc.description";

/// One `{key, language, value}` entry from the item metadata endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetadataEntry {
    /// Qualified Dublin Core key, e.g. `dc.subject`.
    pub key: String,
    /// Language code; DSpace sends `null` for untagged values.
    #[serde(default)]
    pub language: Option<String>,
    /// Field value.
    pub value: String,
}

/// Builds metadata records from a graph plus the item metadata endpoint.
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    client: Client,
    repository: RepositoryConfig,
}

impl MetadataExtractor {
    /// Creates an extractor using `client` for the endpoint call.
    #[must_use]
    pub fn new(client: Client, repository: RepositoryConfig) -> Self {
        Self { client, repository }
    }

    /// Extracts the full record for a work.
    ///
    /// Endpoint categories fall back to empty per-language lists when the
    /// identity is unresolved or the endpoint fails; the failure is logged.
    #[instrument(skip(self, graph), fields(handle = %identity.handle))]
    pub async fn extract(&self, graph: &GraphStore, identity: &WorkIdentity) -> MetadataRecord {
        let mut record = graph_record(graph);

        let Some(internal_id) = identity.internal_id.as_deref() else {
            debug!("identity unresolved; skipping endpoint metadata");
            return record;
        };

        match self.fetch_entries(internal_id).await {
            Ok(entries) => {
                let (subjects, descriptions) = bucket_entries(&entries);
                record.subjects = subjects;
                record.descriptions = descriptions;
            }
            Err(error) => {
                warn!(
                    internal_id,
                    error = %error,
                    "endpoint metadata unavailable; subjects and descriptions left empty"
                );
            }
        }

        record
    }

    /// Fetches raw metadata entries for `internal_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError`] on network failure, non-success status, or
    /// an unexpected body.
    pub async fn fetch_entries(&self, internal_id: &str) -> Result<Vec<MetadataEntry>, MetadataError> {
        let url = self.repository.item_metadata_uri(internal_id);
        debug!(metadata_url = %url, "calling item metadata endpoint");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MetadataError::network(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::http_status(&url, status.as_u16()));
        }

        response
            .json::<Vec<MetadataEntry>>()
            .await
            .map_err(|e| MetadataError::decode(&url, e))
    }
}

/// Graph-sourced categories; endpoint categories are empty.
#[must_use]
pub fn graph_record(graph: &GraphStore) -> MetadataRecord {
    MetadataRecord {
        subjects: LanguageMap::empty(),
        descriptions: LanguageMap::empty(),
        alternative_titles: graph.objects(vocab::dcterms::ALTERNATIVE),
        contributors: graph.objects(vocab::dc::CONTRIBUTOR),
        created_dates: graph.objects(vocab::dcterms::CREATED),
        languages: graph.objects(vocab::dc::LANGUAGE),
        publishers: graph.objects(vocab::dc::PUBLISHER),
    }
}

/// Titles of the work (`dcterms:title`).
#[must_use]
pub fn labels(graph: &GraphStore) -> Vec<String> {
    graph.objects(vocab::dcterms::TITLE)
}

/// Homepage candidates of the work (`bibo:uri`).
#[must_use]
pub fn homepage_values(graph: &GraphStore) -> Vec<String> {
    graph.objects(vocab::bibo::URI)
}

/// Splits endpoint entries into (subjects, descriptions).
///
/// Unrecognized keys are ignored; entries whose language is not one of
/// [`Language::ALL`] are dropped.
fn bucket_entries(entries: &[MetadataEntry]) -> (LanguageMap, LanguageMap) {
    let mut subjects = LanguageMap::empty();
    let mut descriptions = LanguageMap::empty();

    for entry in entries {
        let target = if SUBJECT_KEYS.contains(&entry.key.as_str()) {
            &mut subjects
        } else if entry.key == DESCRIPTION_KEY {
            &mut descriptions
        } else {
            continue;
        };

        match entry.language.as_deref().and_then(Language::from_code) {
            Some(language) => target.push(language, entry.value.clone()),
            None => debug!(
                key = %entry.key,
                language = ?entry.language,
                "dropping metadata entry in unrecognized language"
            ),
        }
    }

    (subjects, descriptions)
}
