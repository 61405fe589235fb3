//! Normalized, language-partitioned metadata records.
//!
//! A [`MetadataRecord`] always carries every [`Category`]: graph-sourced
//! categories are plain lists, endpoint-sourced ones are split by
//! [`Language`]. Missing data shows up as empty lists, never as a missing key,
//! so downstream consumers can rely on the record's shape.

mod error;
mod extractor;

pub use error::MetadataError;
pub use extractor::{MetadataEntry, MetadataExtractor, graph_record, homepage_values, labels};

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Languages retained from endpoint metadata.
///
/// Entries in any other language are dropped during extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English (`en`).
    #[default]
    En,
    /// Spanish (`es`).
    Es,
}

impl Language {
    /// Every recognized language, in output order.
    pub const ALL: [Self; 2] = [Self::En, Self::Es];

    /// Parses an exact language code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }

    /// The language code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Values keyed by language, with every recognized language present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LanguageMap(BTreeMap<Language, Vec<String>>);

impl Default for LanguageMap {
    fn default() -> Self {
        Self::empty()
    }
}

impl LanguageMap {
    /// A map with an empty list for each recognized language.
    #[must_use]
    pub fn empty() -> Self {
        Self(Language::ALL.iter().map(|lang| (*lang, Vec::new())).collect())
    }

    /// A map holding `values` under `language` and empty lists elsewhere.
    #[must_use]
    pub fn single(language: Language, values: Vec<String>) -> Self {
        let mut map = Self::empty();
        map.0.insert(language, values);
        map
    }

    /// Appends a value under `language`.
    pub fn push(&mut self, language: Language, value: impl Into<String>) {
        self.0.entry(language).or_default().push(value.into());
    }

    /// Values recorded for `language`.
    #[must_use]
    pub fn get(&self, language: Language) -> &[String] {
        self.0.get(&language).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether no language holds any value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// Iterates `(language, values)` in language order.
    pub fn iter(&self) -> impl Iterator<Item = (Language, &[String])> {
        self.0.iter().map(|(lang, values)| (*lang, values.as_slice()))
    }
}

/// Fixed metadata categories, in record order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Subject headings (endpoint, by language).
    Subjects,
    /// Descriptions (endpoint, by language).
    Description,
    /// `dcterms:alternative`
    AlternativeTitles,
    /// `dc:contributor`
    Contributors,
    /// `dcterms:created`
    CreatedDate,
    /// `dc:language`
    Language,
    /// `dc:publisher`
    Publisher,
}

impl Category {
    /// Every category in record order.
    pub const ALL: [Self; 7] = [
        Self::Subjects,
        Self::Description,
        Self::AlternativeTitles,
        Self::Contributors,
        Self::CreatedDate,
        Self::Language,
        Self::Publisher,
    ];

    /// Display label used as the record key.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Subjects => "Subjects",
            Self::Description => "Description",
            Self::AlternativeTitles => "Alternative Titles",
            Self::Contributors => "Contributors",
            Self::CreatedDate => "Created date",
            Self::Language => "Language",
            Self::Publisher => "Publisher",
        }
    }
}

/// Borrowed value of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue<'a> {
    /// Language-independent values.
    List(&'a [String]),
    /// Values partitioned by language.
    ByLanguage(&'a LanguageMap),
}

/// Flat metadata record for one work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    /// Subject headings by language.
    pub subjects: LanguageMap,
    /// Descriptions by language.
    pub descriptions: LanguageMap,
    /// Alternative titles.
    pub alternative_titles: Vec<String>,
    /// Contributors.
    pub contributors: Vec<String>,
    /// Creation dates.
    pub created_dates: Vec<String>,
    /// Languages of the work itself.
    pub languages: Vec<String>,
    /// Publishers.
    pub publishers: Vec<String>,
}

impl MetadataRecord {
    /// Value of `category`.
    #[must_use]
    pub fn get(&self, category: Category) -> MetadataValue<'_> {
        match category {
            Category::Subjects => MetadataValue::ByLanguage(&self.subjects),
            Category::Description => MetadataValue::ByLanguage(&self.descriptions),
            Category::AlternativeTitles => MetadataValue::List(&self.alternative_titles),
            Category::Contributors => MetadataValue::List(&self.contributors),
            Category::CreatedDate => MetadataValue::List(&self.created_dates),
            Category::Language => MetadataValue::List(&self.languages),
            Category::Publisher => MetadataValue::List(&self.publishers),
        }
    }

    /// All categories with their values, in record order.
    pub fn entries(&self) -> impl Iterator<Item = (Category, MetadataValue<'_>)> {
        Category::ALL
            .into_iter()
            .map(move |category| (category, self.get(category)))
    }
}

impl Serialize for MetadataRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Category::ALL.len()))?;
        for (category, value) in self.entries() {
            map.serialize_entry(category.label(), &value)?;
        }
        map.end()
    }
}
