//! In-memory triple store for repository RDF documents.
//!
//! A [`GraphStore`] is built once from a serialized document and then only
//! queried. Statements are kept in a set, so duplicate triples collapse and
//! iteration is deterministic for a given document. That determinism is what
//! lets metadata extraction be repeated with byte-identical output; callers
//! must still not read meaning into the order.
//!
//! # Example
//!
//! ```
//! use libros_core::graph::{GraphStore, RdfFormat, vocab};
//!
//! let doc = r#"<http://example.org/w> <http://purl.org/dc/terms/title> "A Title" ."#;
//! let graph = GraphStore::parse(doc, RdfFormat::Turtle).unwrap();
//! assert_eq!(graph.objects(vocab::dcterms::TITLE), vec!["A Title".to_string()]);
//! ```

mod error;
pub mod vocab;

pub use error::GraphError;

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use oxrdf::{Subject, Term, Triple};
use oxttl::{NTriplesParser, TurtleParser};
use regex::Regex;
use tracing::{debug, instrument};

/// Datatype annotations using an `xsd:` prefix directly after a literal's
/// closing quote. The repository emits these without declaring the prefix.
#[allow(clippy::expect_used)]
static XSD_DATATYPE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""\^\^xsd:[A-Za-z][A-Za-z0-9]*"#).expect("xsd token regex is valid") // Static pattern, safe to panic
});

/// Serialization of an RDF document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    /// Turtle (`text/turtle`).
    Turtle,
    /// N-Triples (`application/n-triples`).
    NTriples,
}

impl RdfFormat {
    /// Maps a response `Content-Type` to a parseable format.
    ///
    /// Media type parameters are ignored. Returns `None` for serializations
    /// this store cannot parse.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type.split(';').next().unwrap_or_default().trim();
        match mime.to_ascii_lowercase().as_str() {
            "text/turtle" | "application/turtle" | "application/x-turtle" => Some(Self::Turtle),
            "application/n-triples" => Some(Self::NTriples),
            _ => None,
        }
    }

    /// Human-readable format name used in diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Turtle => "Turtle",
            Self::NTriples => "N-Triples",
        }
    }
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of node in object position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectKind {
    /// Named node; the object string is the IRI.
    Iri,
    /// Blank node; the object string is `_:label`.
    BlankNode,
    /// Literal; the object string is the lexical value.
    Literal,
}

/// One parsed subject-predicate-object statement.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Statement {
    /// Subject IRI (or `_:label` for blank nodes).
    pub subject: String,
    /// Predicate IRI.
    pub predicate: String,
    /// Object IRI, blank node label, or literal lexical value.
    pub object: String,
    /// What the object string denotes.
    pub object_kind: ObjectKind,
}

impl From<Triple> for Statement {
    fn from(triple: Triple) -> Self {
        let subject = match triple.subject {
            Subject::NamedNode(node) => node.into_string(),
            other => other.to_string(),
        };
        let (object, object_kind) = match triple.object {
            Term::NamedNode(node) => (node.into_string(), ObjectKind::Iri),
            Term::Literal(literal) => (literal.value().to_string(), ObjectKind::Literal),
            other => (other.to_string(), ObjectKind::BlankNode),
        };
        Self {
            subject,
            predicate: triple.predicate.into_string(),
            object,
            object_kind,
        }
    }
}

/// Queryable set of statements parsed from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStore {
    statements: BTreeSet<Statement>,
}

impl GraphStore {
    /// Parses a serialized document.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Syntax`] if the document is not valid `format`.
    pub fn parse(document: &str, format: RdfFormat) -> Result<Self, GraphError> {
        Self::parse_inner(document, format, None)
    }

    /// Parses a serialized document, resolving relative IRIs against `base_iri`.
    ///
    /// The base only applies to Turtle; N-Triples has no relative IRIs.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidBaseIri`] for a malformed base and
    /// [`GraphError::Syntax`] for an invalid document.
    pub fn parse_with_base(
        document: &str,
        format: RdfFormat,
        base_iri: &str,
    ) -> Result<Self, GraphError> {
        Self::parse_inner(document, format, Some(base_iri))
    }

    #[instrument(level = "debug", skip(document), fields(bytes = document.len()))]
    fn parse_inner(
        document: &str,
        format: RdfFormat,
        base_iri: Option<&str>,
    ) -> Result<Self, GraphError> {
        let document = neutralize_datatype_tokens(document);
        let mut statements = BTreeSet::new();

        match format {
            RdfFormat::Turtle => {
                let mut parser = TurtleParser::new();
                if let Some(base) = base_iri {
                    parser = parser
                        .with_base_iri(base)
                        .map_err(|e| GraphError::invalid_base_iri(base, e.to_string()))?;
                }
                for triple in parser.for_slice(document.as_bytes()) {
                    let triple = triple.map_err(|e| GraphError::syntax(format.name(), e.to_string()))?;
                    statements.insert(Statement::from(triple));
                }
            }
            RdfFormat::NTriples => {
                for triple in NTriplesParser::new().for_slice(document.as_bytes()) {
                    let triple = triple.map_err(|e| GraphError::syntax(format.name(), e.to_string()))?;
                    statements.insert(Statement::from(triple));
                }
            }
        }

        debug!(statements = statements.len(), %format, "parsed RDF document");
        Ok(Self { statements })
    }

    /// Returns `(subject, object)` for every statement with `predicate`.
    pub fn select<'a>(&'a self, predicate: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.statements
            .iter()
            .filter(move |statement| statement.predicate == predicate)
            .map(|statement| (statement.subject.as_str(), statement.object.as_str()))
    }

    /// Returns the stringified objects of every statement with `predicate`.
    #[must_use]
    pub fn objects(&self, predicate: &str) -> Vec<String> {
        self.select(predicate)
            .map(|(_, object)| object.to_string())
            .collect()
    }

    /// Iterates over all statements.
    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter()
    }

    /// Number of distinct statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether the document contained no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Strips `^^xsd:<name>` annotations the Turtle parser cannot resolve.
fn neutralize_datatype_tokens(document: &str) -> Cow<'_, str> {
    XSD_DATATYPE_TOKEN.replace_all(document, "\"")
}
