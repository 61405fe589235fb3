//! End-to-end resolution of one work.
//!
//! Resolution runs in two concurrent rounds on the calling task:
//!
//! 1. the RDF document download and the handle lookup;
//! 2. metadata extraction and the page-image batch.
//!
//! Every resolution builds its own HTTP client and drops it when it returns.

use std::sync::Arc;

use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::{PageCoverage, ResolvedWork, WorkAssembler, WorkError};
use crate::config::HarvestConfig;
use crate::fetch::ResourceFetcher;
use crate::graph::{GraphStore, RdfFormat};
use crate::http_client::build_http_client;
use crate::identity::{IdentityResolver, handle_from_uri};
use crate::metadata::{self, MetadataExtractor};
use crate::resources::{ContentKind, image_service_id, resource_uris};

/// Accept header sent with RDF document requests.
pub const DOCUMENT_ACCEPT: &str = "text/turtle, application/turtle, application/x-turtle, \
     application/json, text/json, text/n3, text/dspace+n3, application/dspace+n3, \
     application/dspace+xml, application/n-triples";

/// Resolves works against one repository. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct WorkResolver {
    config: Arc<HarvestConfig>,
}

impl WorkResolver {
    /// Creates a resolver for `config`.
    #[must_use]
    pub fn new(config: HarvestConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Resolves the work with `handle` under the configured prefix.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError`] if the document cannot be downloaded or parsed,
    /// has no title, or the HTTP client cannot be built.
    pub async fn resolve_handle(&self, handle: &str) -> Result<ResolvedWork, WorkError> {
        let document_uri = self.config.repository.document_uri(handle);
        self.resolve(handle, &document_uri).await
    }

    /// Resolves the work whose RDF document is at `document_uri`.
    ///
    /// The handle is the last path segment of the URI.
    ///
    /// # Errors
    ///
    /// Same as [`Self::resolve_handle`].
    pub async fn resolve_uri(&self, document_uri: &str) -> Result<ResolvedWork, WorkError> {
        let handle = handle_from_uri(document_uri);
        self.resolve(&handle, document_uri.trim()).await
    }

    /// Runs [`Self::resolve_handle`] on a spawned task.
    pub fn spawn_resolve(&self, handle: String) -> JoinHandle<Result<ResolvedWork, WorkError>> {
        let resolver = self.clone();
        tokio::spawn(async move { resolver.resolve_handle(&handle).await })
    }

    #[instrument(skip(self), fields(handle = %handle))]
    async fn resolve(&self, handle: &str, document_uri: &str) -> Result<ResolvedWork, WorkError> {
        let config = &*self.config;
        let client = build_http_client(&config.http)?;

        let identities = IdentityResolver::new(client.clone(), config.repository.clone());
        let (document, identity) = tokio::join!(
            fetch_document(&client, document_uri),
            identities.resolve(handle)
        );
        let (body, format) = document?;

        let graph = GraphStore::parse_with_base(&body, format, document_uri)
            .map_err(|source| WorkError::graph(handle, source))?;

        let labels = metadata::labels(&graph);
        if labels.is_empty() {
            return Err(WorkError::missing_labels(handle));
        }

        let image_uris = resource_uris(&graph, ContentKind::Image, &config.repository);
        let rendering_ids = resource_uris(&graph, ContentKind::Rendering, &config.repository);

        let extractor = MetadataExtractor::new(client, config.repository.clone());
        let fetcher = ResourceFetcher::new(config.fetch.clone(), config.http.clone());
        let (record, batch) = tokio::join!(
            extractor.extract(&graph, &identity),
            fetcher.fetch_all(&image_uris)
        );

        let mut image_service_ids = Vec::with_capacity(batch.present_count());
        for (index, payload) in batch
            .results()
            .iter()
            .filter_map(|slot| slot.payload.as_ref().map(|payload| (slot.index, payload)))
        {
            match image_service_id(payload) {
                Some(id) => image_service_ids.push(id),
                None => warn!(url = %image_uris[index], "canvas descriptor has no image id"),
            }
        }

        let page_coverage = PageCoverage {
            requested: image_uris.len(),
            resolved: image_service_ids.len(),
        };
        if !page_coverage.is_complete() {
            warn!(
                requested = page_coverage.requested,
                resolved = page_coverage.resolved,
                "some pages could not be resolved"
            );
        }

        let work = WorkAssembler::new(config.default_language).assemble(
            identity,
            record,
            image_service_ids,
            rendering_ids,
            labels,
            metadata::homepage_values(&graph),
            page_coverage,
        )?;
        info!(pages = page_coverage.resolved, "resolved work");
        Ok(work)
    }
}

/// Downloads the RDF document, returning its body and serialization.
///
/// Unknown or missing content types are parsed as Turtle.
async fn fetch_document(client: &Client, url: &str) -> Result<(String, RdfFormat), WorkError> {
    debug!(url, "downloading document");
    let response = client
        .get(url)
        .header(ACCEPT, DOCUMENT_ACCEPT)
        .send()
        .await
        .map_err(|e| WorkError::document_request(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(WorkError::document_status(url, status.as_u16()));
    }

    let format = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(RdfFormat::from_content_type)
        .unwrap_or(RdfFormat::Turtle);

    let body = response
        .text()
        .await
        .map_err(|e| WorkError::document_request(url, e))?;
    Ok((body, format))
}
