use serde::Serialize;
use std::fmt;

/// A page title. Compared byte for byte, never normalized.
pub type Title = String;

/// Which way links are followed from a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Links on the page itself.
    Outbound,
    /// Pages that link to the page.
    Inbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outbound => f.write_str("forward"),
            Direction::Inbound => f.write_str("backward"),
        }
    }
}

/// A directed link: `from` links to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: Title,
    pub to: Title,
}

impl Edge {
    pub fn new(from: impl Into<Title>, to: impl Into<Title>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// One provider response for a batch of titles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPage {
    pub edges: Vec<Edge>,
    /// Present when the provider has more results for the same batch.
    pub continuation: Option<String>,
}

/// A successful search.
#[derive(Debug, Clone, Serialize)]
pub struct Race {
    pub from: Title,
    pub to: Title,
    pub path: Vec<Title>,
    /// Where the two frontiers met; `None` when `from == to`.
    pub midpoint: Option<Title>,
    pub elapsed_secs: f64,
    pub stats: crate::stats::StatsSummary,
}

impl Race {
    /// Number of links followed.
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}
