//! Error types for endpoint-sourced metadata.

use thiserror::Error;

/// Errors from the item metadata endpoint.
///
/// These never abort extraction; the extractor logs them and falls back to
/// empty per-language categories.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The request could not be completed.
    #[error("network error fetching metadata from {url}: {source}")]
    Network {
        /// Endpoint URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("HTTP {status} fetching metadata from {url}")]
    HttpStatus {
        /// Endpoint URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The body was not a list of metadata entries.
    #[error("unexpected metadata response format from {url}: {source}")]
    Decode {
        /// Endpoint URL.
        url: String,
        /// Underlying decode error.
        #[source]
        source: reqwest::Error,
    },
}

impl MetadataError {
    /// Creates a network error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_error_http_status_display() {
        let error = MetadataError::http_status("https://repo.example.org/rest/items/x/metadata", 500);
        let msg = error.to_string();
        assert!(msg.contains("500"), "Expected status in: {msg}");
        assert!(msg.contains("/items/x/metadata"), "Expected URL in: {msg}");
    }
}
