//! Libros Core Library
//!
//! Resolves works held in a DSpace repository into everything a IIIF
//! manifest builder needs: identity, normalized metadata, ordered page
//! image-service ids, rendering links, labels and homepage.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`graph`] - RDF document parsing into a queryable statement set
//! - [`identity`] - Handle to internal-id resolution
//! - [`metadata`] - Language-partitioned metadata records
//! - [`resources`] - Bitstream selection and canvas descriptors
//! - [`fetch`] - Ordered concurrent fetching with retry and a deadline
//! - [`work`] - Assembly and end-to-end resolution of works
//! - [`config`] - Repository endpoints and harvest settings
//! - [`http_client`] - Client construction shared by all network calls

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod fetch;
pub mod graph;
pub mod http_client;
pub mod identity;
pub mod metadata;
pub mod resources;
pub mod work;

mod user_agent;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{HarvestConfig, RepositoryConfig};
pub use fetch::{
    Backoff, FailureType, FetchBatch, FetchError, FetchResult, FetchSettings, FetchStats,
    ResourceFetcher, RetryDecision, RetryPolicy, classify_error,
};
pub use graph::{GraphError, GraphStore, RdfFormat, Statement};
pub use http_client::{HttpClientError, HttpSettings, build_http_client};
pub use identity::{IdentityError, IdentityResolver, WorkIdentity};
pub use metadata::{
    Category, Language, LanguageMap, MetadataError, MetadataExtractor, MetadataRecord,
};
pub use resources::{ContentKind, ResourceRef};
pub use work::{PageCoverage, ResolvedWork, WorkAssembler, WorkError, WorkResolver};
