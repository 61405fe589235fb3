//! Typed harvester configuration.
//!
//! Everything a work resolution needs to know about the repository and the
//! network is carried explicitly in [`HarvestConfig`]; nothing is read from
//! process-wide state.

use crate::fetch::FetchSettings;
use crate::http_client::HttpSettings;
use crate::metadata::Language;

/// Default RDF endpoint for handle documents.
pub const DEFAULT_RDF_BASE: &str = "https://oaktrust.library.tamu.edu/rdf/handle";

/// Default DSpace REST API root.
pub const DEFAULT_REST_BASE: &str = "https://oaktrust.library.tamu.edu/rest";

/// Default handle prefix of the repository.
pub const DEFAULT_HANDLE_PREFIX: &str = "1969.1";

/// Default public bitstream path prefix found in RDF documents.
pub const DEFAULT_BITSTREAM_PREFIX: &str = "https://oaktrust.library.tamu.edu/bitstream/";

/// Default canvas/image-service prefix that replaces the bitstream prefix.
pub const DEFAULT_IMAGE_SERVICE_PREFIX: &str =
    "https://api.library.tamu.edu/iiif-service/dspace/canvas/";

/// Endpoints and path conventions of one DSpace repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Base URL of RDF handle documents, without trailing slash.
    pub rdf_base: String,
    /// Base URL of the REST API, without trailing slash.
    pub rest_base: String,
    /// Handle prefix (naming authority), e.g. `1969.1`.
    pub handle_prefix: String,
    /// Bitstream URL prefix as it appears in `hasBitstream` objects.
    pub bitstream_prefix: String,
    /// Image-service URL prefix substituted for [`Self::bitstream_prefix`].
    pub image_service_prefix: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            rdf_base: DEFAULT_RDF_BASE.to_string(),
            rest_base: DEFAULT_REST_BASE.to_string(),
            handle_prefix: DEFAULT_HANDLE_PREFIX.to_string(),
            bitstream_prefix: DEFAULT_BITSTREAM_PREFIX.to_string(),
            image_service_prefix: DEFAULT_IMAGE_SERVICE_PREFIX.to_string(),
        }
    }
}

impl RepositoryConfig {
    /// Builds a config whose RDF and REST endpoints live under `server_root`.
    ///
    /// Bitstream and image-service prefixes also move under the root, which
    /// keeps mock servers self-contained.
    #[must_use]
    pub fn with_server_root(server_root: &str) -> Self {
        let root = server_root.trim_end_matches('/');
        Self {
            rdf_base: format!("{root}/rdf/handle"),
            rest_base: format!("{root}/rest"),
            handle_prefix: DEFAULT_HANDLE_PREFIX.to_string(),
            bitstream_prefix: format!("{root}/bitstream/"),
            image_service_prefix: format!("{root}/iiif-service/dspace/canvas/"),
        }
    }

    /// URL of the RDF document for `handle`.
    #[must_use]
    pub fn document_uri(&self, handle: &str) -> String {
        format!(
            "{}/{}/{}",
            self.rdf_base.trim_end_matches('/'),
            self.handle_prefix,
            urlencoding::encode(handle)
        )
    }

    /// URL of the REST handle lookup for `handle`.
    #[must_use]
    pub fn handle_lookup_uri(&self, handle: &str) -> String {
        format!(
            "{}/handle/{}/{}",
            self.rest_base.trim_end_matches('/'),
            self.handle_prefix,
            urlencoding::encode(handle)
        )
    }

    /// URL of the REST item metadata listing for `internal_id`.
    #[must_use]
    pub fn item_metadata_uri(&self, internal_id: &str) -> String {
        format!(
            "{}/items/{}/metadata",
            self.rest_base.trim_end_matches('/'),
            urlencoding::encode(internal_id)
        )
    }
}

/// Complete configuration for resolving works.
#[derive(Debug, Clone, Default)]
pub struct HarvestConfig {
    /// Repository endpoints.
    pub repository: RepositoryConfig,
    /// Canvas batch fetch behavior.
    pub fetch: FetchSettings,
    /// Client timeouts and identity.
    pub http: HttpSettings,
    /// Language that labels are recorded under.
    pub default_language: Language,
}
