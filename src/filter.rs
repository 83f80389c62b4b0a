use crate::models::Edge;
use once_cell::sync::Lazy;
use regex::RegexSet;
use rustc_hash::FxHashSet;

/// Title patterns for citation, authority-control and archive pages that link to
/// almost everything and would otherwise short-circuit every search.
pub const WIKIPEDIA_BORING_PATTERNS: &[&str] = &[
    r"^Category:Articles with unsourced.*$",
    r"^Category:Redirects.*$",
    r"^International Standard.*$",
    r"^National Library of.*$",
    r"^PubMed.*$",
    r"^DMOZ$",
    r"Integrated Authority File",
    r"CNN",
    r"JSTOR",
    r"BIBSYS",
    r"LIBRIS",
    r"^OCLC$",
    r"[Aa]bout.com",
    r"[Ii][Mm][Dd][Bb]",
    r"Wayback Machine",
    r"National Diet Library",
    r"Library of Congress Control Number",
    r"Biblioteca Nacional de España",
    r"Bibliothèque nationale de France",
];

/// Identifier articles linked from nearly every reference list.
pub const WIKIPEDIA_BORING_TITLES: &[&str] = &[
    "Digital object identifier",
    "Doi (identifier)",
    "ISBN (identifier)",
    "ISSN (identifier)",
    "OCLC (identifier)",
    "PMID (identifier)",
    "S2CID (identifier)",
    "Bibcode (identifier)",
    "Wikidata",
    "Virtual International Authority File",
];

static WIKIPEDIA_PATTERN_SET: Lazy<RegexSet> =
    Lazy::new(|| RegexSet::new(WIKIPEDIA_BORING_PATTERNS).unwrap());

/// Rejects edges touching administrative or meta pages.
#[derive(Debug, Clone)]
pub struct BoringFilter {
    titles: FxHashSet<String>,
    patterns: RegexSet,
}

impl Default for BoringFilter {
    /// A filter that lets everything through.
    fn default() -> Self {
        Self {
            titles: FxHashSet::default(),
            patterns: RegexSet::empty(),
        }
    }
}

impl BoringFilter {
    pub fn new<T, P>(titles: T, patterns: P) -> Result<Self, regex::Error>
    where
        T: IntoIterator,
        T::Item: Into<String>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Ok(Self {
            titles: titles.into_iter().map(Into::into).collect(),
            patterns: RegexSet::new(patterns)?,
        })
    }

    /// The stock configuration for English Wikipedia.
    pub fn wikipedia() -> Self {
        Self {
            titles: WIKIPEDIA_BORING_TITLES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            patterns: WIKIPEDIA_PATTERN_SET.clone(),
        }
    }

    pub fn is_boring(&self, title: &str) -> bool {
        self.titles.contains(title) || self.patterns.is_match(title)
    }

    /// True when neither endpoint is boring.
    pub fn allows(&self, edge: &Edge) -> bool {
        !self.is_boring(&edge.from) && !self.is_boring(&edge.to)
    }

    pub fn title_count(&self) -> usize {
        self.titles.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}
