//! Predicate IRIs queried from repository RDF documents.

/// Dublin Core elements 1.1.
pub mod dc {
    /// `dc:contributor`
    pub const CONTRIBUTOR: &str = "http://purl.org/dc/elements/1.1/contributor";
    /// `dc:language`
    pub const LANGUAGE: &str = "http://purl.org/dc/elements/1.1/language";
    /// `dc:publisher`
    pub const PUBLISHER: &str = "http://purl.org/dc/elements/1.1/publisher";
}

/// DCMI metadata terms.
pub mod dcterms {
    /// `dcterms:alternative`
    pub const ALTERNATIVE: &str = "http://purl.org/dc/terms/alternative";
    /// `dcterms:created`
    pub const CREATED: &str = "http://purl.org/dc/terms/created";
    /// `dcterms:title`
    pub const TITLE: &str = "http://purl.org/dc/terms/title";
}

/// Bibliographic Ontology.
pub mod bibo {
    /// `bibo:uri`
    pub const URI: &str = "http://purl.org/ontology/bibo/uri";
}

/// DSpace repository ontology.
pub mod dspace {
    /// `dspace:hasBitstream`
    pub const HAS_BITSTREAM: &str = "http://digital-repositories.org/ontologies/dspace/0.1.0#hasBitstream";
}
