//! Errors that abort resolution of a work.

use thiserror::Error;

use crate::graph::GraphError;
use crate::http_client::HttpClientError;

/// Fatal failures while resolving one work.
///
/// Identity, metadata endpoint and per-page failures degrade the result
/// instead and never show up here.
#[derive(Debug, Error)]
pub enum WorkError {
    /// The RDF document request could not be completed.
    #[error("failed to download document {url}: {source}")]
    DocumentRequest {
        /// Document URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The RDF document endpoint answered with a non-success status.
    #[error("HTTP {status} downloading document {url}")]
    DocumentStatus {
        /// Document URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The document could not be parsed.
    #[error("failed to parse document for handle {handle}: {source}")]
    Graph {
        /// Work handle.
        handle: String,
        /// Parser error.
        #[source]
        source: GraphError,
    },

    /// The graph holds no title for the work.
    #[error("work {handle} has no title")]
    MissingLabels {
        /// Work handle.
        handle: String,
    },

    /// The per-resolution HTTP client could not be built.
    #[error(transparent)]
    HttpClient(#[from] HttpClientError),
}

impl WorkError {
    /// Creates a document request error.
    pub fn document_request(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::DocumentRequest {
            url: url.into(),
            source,
        }
    }

    /// Creates a document status error.
    pub fn document_status(url: impl Into<String>, status: u16) -> Self {
        Self::DocumentStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a graph error for `handle`.
    pub fn graph(handle: impl Into<String>, source: GraphError) -> Self {
        Self::Graph {
            handle: handle.into(),
            source,
        }
    }

    /// Creates a missing-labels error.
    pub fn missing_labels(handle: impl Into<String>) -> Self {
        Self::MissingLabels {
            handle: handle.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_error_display() {
        let error = WorkError::document_status("https://repo.example.org/rdf/handle/1969.1/5", 503);
        assert_eq!(
            error.to_string(),
            "HTTP 503 downloading document https://repo.example.org/rdf/handle/1969.1/5"
        );
        assert_eq!(WorkError::missing_labels("5").to_string(), "work 5 has no title");
    }

    #[test]
    fn test_graph_error_is_source() {
        use std::error::Error as _;
        let error = WorkError::graph("5", GraphError::syntax("Turtle", "unexpected end"));
        assert!(error.to_string().contains("handle 5"));
        assert!(error.source().is_some());
    }
}
