//! Assembly of resolved works.
//!
//! [`WorkAssembler`] is a pure step: it combines what the other stages
//! produced into one immutable [`ResolvedWork`]. The async orchestration
//! lives in [`WorkResolver`].

mod error;
mod resolver;

pub use error::WorkError;
pub use resolver::{DOCUMENT_ACCEPT, WorkResolver};

use serde::Serialize;
use tracing::debug;

use crate::identity::WorkIdentity;
use crate::metadata::{Language, LanguageMap, MetadataRecord};

/// How many page images were requested and how many resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageCoverage {
    /// Image references found in the graph.
    pub requested: usize,
    /// Image-service ids obtained.
    pub resolved: usize,
}

impl PageCoverage {
    /// Whether every requested page resolved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.resolved >= self.requested
    }

    /// Number of pages that did not resolve.
    #[must_use]
    pub fn missing(&self) -> usize {
        self.requested.saturating_sub(self.resolved)
    }
}

/// Everything downstream manifest building needs for one work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedWork {
    identity: WorkIdentity,
    metadata: MetadataRecord,
    image_service_ids: Vec<String>,
    rendering_ids: Vec<String>,
    labels: LanguageMap,
    homepage: Option<String>,
    page_coverage: PageCoverage,
}

impl ResolvedWork {
    /// Handle and internal id.
    #[must_use]
    pub fn identity(&self) -> &WorkIdentity {
        &self.identity
    }

    /// Normalized metadata record.
    #[must_use]
    pub fn metadata(&self) -> &MetadataRecord {
        &self.metadata
    }

    /// Image-service ids, in sorted page order.
    #[must_use]
    pub fn image_service_ids(&self) -> &[String] {
        &self.image_service_ids
    }

    /// Rendering (PDF) URIs, sorted.
    #[must_use]
    pub fn rendering_ids(&self) -> &[String] {
        &self.rendering_ids
    }

    /// Titles keyed by language.
    #[must_use]
    pub fn labels(&self) -> &LanguageMap {
        &self.labels
    }

    /// First homepage value, if any.
    #[must_use]
    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }

    /// Requested versus resolved pages.
    #[must_use]
    pub fn page_coverage(&self) -> PageCoverage {
        self.page_coverage
    }
}

/// Pure composition of resolution results.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkAssembler {
    default_language: Language,
}

impl WorkAssembler {
    /// Creates an assembler recording labels under `default_language`.
    #[must_use]
    pub fn new(default_language: Language) -> Self {
        Self { default_language }
    }

    /// Combines the parts of a work.
    ///
    /// Only the first homepage value is kept.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError::MissingLabels`] when `labels` is empty.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        &self,
        identity: WorkIdentity,
        metadata: MetadataRecord,
        image_service_ids: Vec<String>,
        rendering_ids: Vec<String>,
        labels: Vec<String>,
        homepage_values: Vec<String>,
        page_coverage: PageCoverage,
    ) -> Result<ResolvedWork, WorkError> {
        if labels.is_empty() {
            return Err(WorkError::missing_labels(identity.handle));
        }

        let homepage = homepage_values.into_iter().next();
        debug!(
            handle = %identity.handle,
            images = image_service_ids.len(),
            renderings = rendering_ids.len(),
            "assembled work"
        );

        Ok(ResolvedWork {
            identity,
            metadata,
            image_service_ids,
            rendering_ids,
            labels: LanguageMap::single(self.default_language, labels),
            homepage,
            page_coverage,
        })
    }
}
