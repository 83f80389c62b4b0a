//! Integration tests for batched, paginated link retrieval.
//!
//! Stub providers record every query they receive so the tests can check what the
//! link source asked for as well as what it yielded.

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use wikirace::filter::BoringFilter;
use wikirace::links::LinkSource;
use wikirace::models::LinkPage;
use wikirace::provider::LinkProvider;
use wikirace::stats::SearchStats;
use wikirace::{Direction, Edge, Result, Title};

/// Needs `pages_per_batch` requests to enumerate any batch. Page `n` links every
/// requested title to `"<title>/<n>"`.
struct PagedStub {
    pages_per_batch: usize,
    calls: Mutex<Vec<(Vec<Title>, Option<String>)>>,
}

impl PagedStub {
    fn new(pages_per_batch: usize) -> Self {
        Self {
            pages_per_batch,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(Vec<Title>, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LinkProvider for PagedStub {
    async fn query(
        &self,
        _direction: Direction,
        titles: &[Title],
        continuation: Option<&str>,
    ) -> Result<LinkPage> {
        self.calls
            .lock()
            .unwrap()
            .push((titles.to_vec(), continuation.map(String::from)));

        let page: usize = continuation.map(|c| c.parse().unwrap()).unwrap_or(0);
        let edges = titles
            .iter()
            .map(|t| Edge::new(t.as_str(), format!("{t}/{page}")))
            .collect();
        let next = page + 1;
        Ok(LinkPage {
            edges,
            continuation: (next < self.pages_per_batch).then(|| next.to_string()),
        })
    }
}

/// Answers every query with a fixed edge list.
struct FixedStub(Vec<Edge>);

#[async_trait]
impl LinkProvider for FixedStub {
    async fn query(
        &self,
        _direction: Direction,
        _titles: &[Title],
        _continuation: Option<&str>,
    ) -> Result<LinkPage> {
        Ok(LinkPage {
            edges: self.0.clone(),
            continuation: None,
        })
    }
}

fn numbered_titles(count: usize) -> Vec<Title> {
    (0..count).map(|i| format!("T{i}")).collect()
}

// ---------------------------------------------------------------------------
// Batching and pagination
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batches_and_follows_every_continuation() {
    let stub = Arc::new(PagedStub::new(3));
    let source = LinkSource::new(stub.clone(), BoringFilter::default());
    let titles = numbered_titles(120);

    let edges = source
        .collect_links(Direction::Outbound, titles.clone(), Arc::new(SearchStats::new()))
        .await
        .unwrap();

    let calls = stub.calls();
    assert_eq!(calls.len(), 9);
    assert!(calls.iter().all(|(batch, _)| batch.len() <= 50));

    let sizes: Vec<usize> = calls.iter().map(|(batch, _)| batch.len()).collect();
    assert_eq!(sizes, vec![50, 50, 50, 50, 50, 50, 20, 20, 20]);

    // Each batch starts fresh and resumes with the token it was just given.
    let tokens: Vec<Option<&str>> = calls.iter().map(|(_, c)| c.as_deref()).collect();
    assert_eq!(
        tokens,
        vec![
            None,
            Some("1"),
            Some("2"),
            None,
            Some("1"),
            Some("2"),
            None,
            Some("1"),
            Some("2"),
        ]
    );

    // Every title was requested exactly once per page.
    let requested: HashSet<&Title> = calls
        .iter()
        .filter(|(_, c)| c.is_none())
        .flat_map(|(batch, _)| batch.iter())
        .collect();
    assert_eq!(requested.len(), 120);

    let expected: HashSet<Edge> = titles
        .iter()
        .flat_map(|t| (0..3).map(move |p| Edge::new(t.as_str(), format!("{t}/{p}"))))
        .collect();
    let got: HashSet<Edge> = edges.into_iter().collect();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn yields_one_item_per_response() {
    let stub = Arc::new(PagedStub::new(3));
    let source = LinkSource::new(stub.clone(), BoringFilter::default()).with_batch_size(10);
    let mut links = source.fetch_links(
        Direction::Outbound,
        numbered_titles(15),
        CancellationToken::new(),
        Arc::new(SearchStats::new()),
    );

    let mut sizes = Vec::new();
    while let Some(page) = links.next().await {
        sizes.push(page.unwrap().len());
    }
    assert_eq!(sizes, vec![10, 10, 10, 5, 5, 5]);
}

#[tokio::test]
async fn consumer_can_stop_mid_stream() {
    let stub = Arc::new(PagedStub::new(3));
    let source = LinkSource::new(stub.clone(), BoringFilter::default());
    let mut links = source.fetch_links(
        Direction::Outbound,
        numbered_titles(120),
        CancellationToken::new(),
        Arc::new(SearchStats::new()),
    );

    links.next().await.unwrap().unwrap();
    links.next().await.unwrap().unwrap();
    drop(links);

    assert_eq!(stub.calls().len(), 2);
}

#[tokio::test]
async fn empty_title_set_issues_no_requests() {
    let stub = Arc::new(PagedStub::new(3));
    let source = LinkSource::new(stub.clone(), BoringFilter::default());

    let edges = source
        .collect_links(Direction::Inbound, Vec::new(), Arc::new(SearchStats::new()))
        .await
        .unwrap();

    assert!(edges.is_empty());
    assert!(stub.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn boring_pattern_target_is_never_yielded() {
    let stub = Arc::new(FixedStub(vec![
        Edge::new("Ada Lovelace", "Charles Babbage"),
        Edge::new("Ada Lovelace", "Integrated Authority File"),
        Edge::new("National Library of Israel", "Ada Lovelace"),
        Edge::new("Ada Lovelace", "Doi (identifier)"),
    ]));
    let source = LinkSource::new(stub, BoringFilter::wikipedia());

    let edges = source
        .collect_links(
            Direction::Outbound,
            vec!["Ada Lovelace".to_string()],
            Arc::new(SearchStats::new()),
        )
        .await
        .unwrap();

    assert_eq!(edges, vec![Edge::new("Ada Lovelace", "Charles Babbage")]);
}

#[tokio::test]
async fn self_loops_are_dropped_even_without_a_filter() {
    let stub = Arc::new(FixedStub(vec![Edge::new("X", "X"), Edge::new("X", "Y")]));
    let source = LinkSource::new(stub, BoringFilter::default());
    let stats = Arc::new(SearchStats::new());

    let edges = source
        .collect_links(Direction::Outbound, vec!["X".to_string()], stats.clone())
        .await
        .unwrap();

    assert_eq!(edges, vec![Edge::new("X", "Y")]);
    assert_eq!(stats.filtered(), 1);
}

#[tokio::test]
async fn custom_filter_is_honored() {
    let stub = Arc::new(FixedStub(vec![
        Edge::new("A", "List of things"),
        Edge::new("A", "JSTOR"),
    ]));
    let filter = BoringFilter::new(Vec::<String>::new(), [r"^List of "]).unwrap();
    let source = LinkSource::new(stub, filter);

    let edges = source
        .collect_links(Direction::Outbound, vec!["A".to_string()], Arc::new(SearchStats::new()))
        .await
        .unwrap();

    // JSTOR is only boring under the Wikipedia defaults.
    assert_eq!(edges, vec![Edge::new("A", "JSTOR")]);
}
