//! Shared User-Agent string for repository and image-service HTTP clients.
//!
//! Single source for the UA format so document, REST and canvas traffic all
//! identify the harvester the same way.

/// Default User-Agent for every harvester request.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("libros/{version} (repository-harvester)")
}
