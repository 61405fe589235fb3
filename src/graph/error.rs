//! Error types for RDF document parsing.

use thiserror::Error;

/// Errors raised while loading a serialized RDF document into a [`GraphStore`](super::GraphStore).
#[derive(Debug, Error)]
pub enum GraphError {
    /// The document is not valid under the declared serialization.
    #[error("invalid {format} document: {message}")]
    Syntax {
        /// Serialization the document was parsed as.
        format: &'static str,
        /// Parser diagnostic, including position when available.
        message: String,
    },

    /// The base IRI supplied for relative IRI resolution is malformed.
    #[error("invalid base IRI {iri}: {message}")]
    InvalidBaseIri {
        /// The rejected IRI.
        iri: String,
        /// Parser diagnostic.
        message: String,
    },
}

impl GraphError {
    /// Creates a syntax error for the given format.
    pub fn syntax(format: &'static str, message: impl Into<String>) -> Self {
        Self::Syntax {
            format,
            message: message.into(),
        }
    }

    /// Creates an invalid base IRI error.
    pub fn invalid_base_iri(iri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidBaseIri {
            iri: iri.into(),
            message: message.into(),
        }
    }
}
