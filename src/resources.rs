//! Page-level resource references and canvas descriptors.
//!
//! A work's graph lists every stored bitstream through `dspace:hasBitstream`.
//! Image pages (`.jpf`) and PDF renderings (`.pdf`) are told apart by a
//! suffix match on the object IRI, and their public bitstream path is
//! rewritten to the image service. Reference lists are deduplicated and
//! sorted so fetch order never depends on triple iteration order.

use serde::Deserialize;
use serde_json::Value;

use crate::config::RepositoryConfig;
use crate::graph::{GraphStore, vocab};

/// Kind of page-level resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContentKind {
    /// JPEG 2000 page image.
    Image,
    /// Render-only document (PDF).
    Rendering,
}

impl ContentKind {
    /// Substring an object IRI must contain to be of this kind.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Image => ".jpf",
            Self::Rendering => ".pdf",
        }
    }
}

/// Image-service URI of one bitstream.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceRef {
    /// Rewritten URI.
    pub uri: String,
    /// What the bitstream holds.
    pub kind: ContentKind,
}

/// Bitstream references of `kind`, rewritten, deduplicated and sorted by URI.
#[must_use]
pub fn resource_refs(
    graph: &GraphStore,
    kind: ContentKind,
    repository: &RepositoryConfig,
) -> Vec<ResourceRef> {
    let mut uris: Vec<String> = graph
        .select(vocab::dspace::HAS_BITSTREAM)
        .filter(|(_, object)| object.contains(kind.suffix()))
        .map(|(_, object)| rewrite_bitstream(object, repository))
        .collect();
    uris.sort();
    uris.dedup();
    uris.into_iter().map(|uri| ResourceRef { uri, kind }).collect()
}

/// URIs only, in the same order as [`resource_refs`].
#[must_use]
pub fn resource_uris(
    graph: &GraphStore,
    kind: ContentKind,
    repository: &RepositoryConfig,
) -> Vec<String> {
    resource_refs(graph, kind, repository)
        .into_iter()
        .map(|r| r.uri)
        .collect()
}

fn rewrite_bitstream(object: &str, repository: &RepositoryConfig) -> String {
    match object.strip_prefix(repository.bitstream_prefix.as_str()) {
        Some(rest) => format!("{}{rest}", repository.image_service_prefix),
        None => object.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct CanvasDescriptor {
    #[serde(default)]
    images: Vec<CanvasImage>,
}

#[derive(Debug, Deserialize)]
struct CanvasImage {
    #[serde(rename = "@id")]
    id: Option<String>,
}

/// Image-service id of a canvas descriptor: `images[0]["@id"]`.
///
/// Returns `None` when the payload has no images or the first image has no
/// string id.
#[must_use]
pub fn image_service_id(descriptor: &Value) -> Option<String> {
    let canvas = CanvasDescriptor::deserialize(descriptor).ok()?;
    canvas.images.into_iter().next()?.id
}
