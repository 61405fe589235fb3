//! Handle to internal-id resolution.
//!
//! Works are addressed publicly by a handle suffix (`92214` under the
//! `1969.1` naming authority). REST metadata is keyed by the repository's
//! internal UUID, which one lookup call maps from the handle. A failed lookup
//! is not an error for the caller: it yields a [`WorkIdentity`] without an
//! internal id, and id-keyed lookups downstream are skipped.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::RepositoryConfig;

/// Public handle plus the internal id it resolved to, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkIdentity {
    /// Handle suffix under the repository prefix.
    pub handle: String,
    /// Internal UUID; `None` when resolution failed.
    pub internal_id: Option<String>,
}

impl WorkIdentity {
    /// Identity whose internal id is known.
    #[must_use]
    pub fn resolved(handle: impl Into<String>, internal_id: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            internal_id: Some(internal_id.into()),
        }
    }

    /// Identity whose internal id could not be resolved.
    #[must_use]
    pub fn unresolved(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            internal_id: None,
        }
    }

    /// Whether the internal id is known.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.internal_id.is_some()
    }
}

/// Errors from the handle lookup endpoint.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The request could not be completed.
    #[error("network error resolving handle {handle}: {source}")]
    Network {
        /// Handle being resolved.
        handle: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("HTTP {status} resolving handle {handle}")]
    HttpStatus {
        /// Handle being resolved.
        handle: String,
        /// HTTP status code.
        status: u16,
    },

    /// The body did not contain a usable `uuid`.
    #[error("unexpected handle lookup response for {handle}: {reason}")]
    Decode {
        /// Handle being resolved.
        handle: String,
        /// What was wrong with the body.
        reason: String,
    },
}

#[derive(Debug, Deserialize)]
struct HandleLookupResponse {
    uuid: Option<String>,
}

/// Resolves handles through the repository REST API.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    client: Client,
    repository: RepositoryConfig,
}

impl IdentityResolver {
    /// Creates a resolver using `client` for its single lookup call.
    #[must_use]
    pub fn new(client: Client, repository: RepositoryConfig) -> Self {
        Self { client, repository }
    }

    /// Resolves `handle`, degrading to an unresolved identity on any failure.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn resolve(&self, handle: &str) -> WorkIdentity {
        match self.lookup(handle).await {
            Ok(internal_id) => {
                debug!(%internal_id, "resolved handle");
                WorkIdentity::resolved(handle, internal_id)
            }
            Err(error) => {
                warn!(
                    handle,
                    error = %error,
                    "handle unresolved; id-keyed metadata will be skipped"
                );
                WorkIdentity::unresolved(handle)
            }
        }
    }

    /// Looks up the internal id for `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] on network failure, a non-success status, or
    /// a body without a non-empty `uuid`.
    pub async fn lookup(&self, handle: &str) -> Result<String, IdentityError> {
        let url = self.repository.handle_lookup_uri(handle);
        debug!(lookup_url = %url, "calling handle lookup");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| IdentityError::Network {
                handle: handle.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::HttpStatus {
                handle: handle.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .json::<HandleLookupResponse>()
            .await
            .map_err(|e| IdentityError::Decode {
                handle: handle.to_string(),
                reason: e.to_string(),
            })?;

        match body.uuid.map(|uuid| uuid.trim().to_string()) {
            Some(uuid) if !uuid.is_empty() => Ok(uuid),
            _ => Err(IdentityError::Decode {
                handle: handle.to_string(),
                reason: "missing uuid".to_string(),
            }),
        }
    }
}

/// Extracts the handle suffix from a document URI (its last path segment).
///
/// Falls back to plain string splitting when `uri` is not an absolute URL,
/// so bare handles pass through unchanged.
#[must_use]
pub fn handle_from_uri(uri: &str) -> String {
    let trimmed = uri.trim().trim_end_matches('/');
    if let Ok(parsed) = Url::parse(trimmed)
        && let Some(last) = parsed.path_segments().and_then(|mut segments| segments.next_back())
    {
        return urlencoding::decode(last)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| last.to_string());
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
}
