use crate::config::DEFAULT_FIXTURE_PAGE_SIZE;
use crate::error::{RaceError, Result};
use crate::models::{Direction, Edge, LinkPage, Title};
use crate::provider::LinkProvider;
use anyhow::Context;
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// An in-memory link graph served through [`LinkProvider`].
///
/// Results for a batch are cut into pages of `page_size` links; the continuation
/// token is the offset of the next page, so pagination behaves like the live API.
#[derive(Debug)]
pub struct FixtureGraph {
    outbound: FxHashMap<Title, Vec<Title>>,
    inbound: FxHashMap<Title, Vec<Title>>,
    page_size: usize,
    requests: AtomicU64,
}

impl Default for FixtureGraph {
    fn default() -> Self {
        Self {
            outbound: FxHashMap::default(),
            inbound: FxHashMap::default(),
            page_size: DEFAULT_FIXTURE_PAGE_SIZE,
            requests: AtomicU64::new(0),
        }
    }
}

impl FixtureGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges<I, A, B>(edges: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<Title>,
        B: Into<Title>,
    {
        let mut graph = Self::new();
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    /// Loads a JSON adjacency object: `{"Title": ["Linked title", ...], ...}`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture: {}", path.display()))?;
        let adjacency: BTreeMap<Title, Vec<Title>> = serde_json::from_str(&raw)
            .with_context(|| {
                format!("Fixture is not a JSON adjacency object: {}", path.display())
            })?;

        let mut graph = Self::new();
        for (from, links) in adjacency {
            for to in links {
                graph.add_edge(from.clone(), to);
            }
        }
        Ok(graph)
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn add_edge(&mut self, from: impl Into<Title>, to: impl Into<Title>) {
        let (from, to) = (from.into(), to.into());
        self.inbound
            .entry(to.clone())
            .or_default()
            .push(from.clone());
        self.outbound.entry(from).or_default().push(to);
    }

    pub fn edge_count(&self) -> usize {
        self.outbound.values().map(Vec::len).sum()
    }

    /// Number of queries answered so far.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    fn edges_for(&self, direction: Direction, titles: &[Title]) -> Vec<Edge> {
        let mut edges = Vec::new();
        for title in titles {
            match direction {
                Direction::Outbound => {
                    if let Some(links) = self.outbound.get(title) {
                        edges.extend(links.iter().map(|to| Edge::new(title.as_str(), to.as_str())));
                    }
                }
                Direction::Inbound => {
                    if let Some(links) = self.inbound.get(title) {
                        edges.extend(
                            links
                                .iter()
                                .map(|from| Edge::new(from.as_str(), title.as_str())),
                        );
                    }
                }
            }
        }
        edges
    }
}

#[async_trait]
impl LinkProvider for FixtureGraph {
    async fn query(
        &self,
        direction: Direction,
        titles: &[Title],
        continuation: Option<&str>,
    ) -> Result<LinkPage> {
        self.requests.fetch_add(1, Ordering::Relaxed);

        let offset = match continuation {
            Some(token) => token.parse::<usize>().map_err(|_| {
                RaceError::MalformedResponse(format!("bad continuation token: {token:?}"))
            })?,
            None => 0,
        };

        let all = self.edges_for(direction, titles);
        let start = offset.min(all.len());
        let end = (start + self.page_size).min(all.len());

        Ok(LinkPage {
            edges: all[start..end].to_vec(),
            continuation: (end < all.len()).then(|| end.to_string()),
        })
    }
}
