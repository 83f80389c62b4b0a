//! Batched, paginated link retrieval.
//!
//! [`LinkSource::fetch_links`] turns "all links of these titles" into a lazy stream of
//! edge sets. Nothing is requested until the stream is polled, each provider page is
//! yielded as soon as it arrives, and a cancelled token ends the stream without
//! finishing the continuation chain.

use crate::config::FailurePolicy;
use crate::error::Result;
use crate::filter::BoringFilter;
use crate::models::{Direction, Edge, LinkPage, Title};
use crate::provider::LinkProvider;
use crate::stats::SearchStats;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub type LinkStream = BoxStream<'static, Result<Vec<Edge>>>;

#[derive(Clone)]
pub struct LinkSource {
    provider: Arc<dyn LinkProvider>,
    filter: Arc<BoringFilter>,
    batch_size: usize,
    policy: FailurePolicy,
}

impl LinkSource {
    pub fn new(provider: Arc<dyn LinkProvider>, filter: BoringFilter) -> Self {
        let batch_size = provider.max_batch_size().max(1);
        Self {
            provider,
            filter: Arc::new(filter),
            batch_size,
            policy: FailurePolicy::default(),
        }
    }

    /// Caps titles per request; never above what the provider accepts.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, self.provider.max_batch_size().max(1));
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Lazily fetches every link of `titles` in `direction`.
    ///
    /// Each item is the filtered edge set of one provider response. After an error
    /// (under `Fatal`, or `Retry` once attempts run out) the stream ends.
    pub fn fetch_links(
        &self,
        direction: Direction,
        titles: Vec<Title>,
        cancel: CancellationToken,
        stats: Arc<SearchStats>,
    ) -> LinkStream {
        let cursor = Cursor {
            source: self.clone(),
            direction,
            batches: batch(titles, self.batch_size).into_iter(),
            current: None,
            cancel,
            stats,
            failed: false,
        };

        stream::unfold(cursor, |mut cursor| async move {
            let item = cursor.next_page().await?;
            Some((item, cursor))
        })
        .boxed()
    }

    /// Drains [`fetch_links`](Self::fetch_links) into one edge list.
    pub async fn collect_links(
        &self,
        direction: Direction,
        titles: Vec<Title>,
        stats: Arc<SearchStats>,
    ) -> Result<Vec<Edge>> {
        let mut links = self.fetch_links(direction, titles, CancellationToken::new(), stats);
        let mut edges = Vec::new();
        while let Some(page) = links.next().await {
            edges.extend(page?);
        }
        Ok(edges)
    }

    async fn request(
        &self,
        direction: Direction,
        titles: &[Title],
        continuation: Option<&str>,
        stats: &SearchStats,
    ) -> Result<LinkPage> {
        let mut attempt = 0;
        loop {
            stats.inc_requests();
            match self.provider.query(direction, titles, continuation).await {
                Ok(page) => return Ok(page),
                Err(e) => match self.policy {
                    FailurePolicy::Retry { attempts, delay } if attempt < attempts => {
                        attempt += 1;
                        stats.inc_retries();
                        warn!(
                            %direction,
                            attempt,
                            error = %e,
                            "Provider request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    _ => return Err(e),
                },
            }
        }
    }

    fn keep_interesting(&self, edges: Vec<Edge>, stats: &SearchStats) -> Vec<Edge> {
        let received = edges.len();
        let kept: Vec<Edge> = edges
            .into_iter()
            .filter(|edge| !edge.is_self_loop() && self.filter.allows(edge))
            .collect();
        stats.add_edges(received as u64);
        stats.add_filtered((received - kept.len()) as u64);
        kept
    }
}

/// Position within one `fetch_links` call.
struct Cursor {
    source: LinkSource,
    direction: Direction,
    batches: std::vec::IntoIter<Vec<Title>>,
    /// Batch being paginated and the token to resume it with.
    current: Option<(Vec<Title>, Option<String>)>,
    cancel: CancellationToken,
    stats: Arc<SearchStats>,
    failed: bool,
}

impl Cursor {
    async fn next_page(&mut self) -> Option<Result<Vec<Edge>>> {
        loop {
            if self.failed || self.cancel.is_cancelled() {
                return None;
            }

            let (titles, continuation) = match self.current.take() {
                Some(resume) => resume,
                None => (self.batches.next()?, None),
            };

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(direction = %self.direction, "Link fetch cancelled");
                    return None;
                }
                result = self.source.request(
                    self.direction,
                    &titles,
                    continuation.as_deref(),
                    &self.stats,
                ) => result,
            };

            match result {
                Ok(page) => {
                    if let Some(next) = page.continuation {
                        self.current = Some((titles, Some(next)));
                    }
                    return Some(Ok(self.source.keep_interesting(page.edges, &self.stats)));
                }
                Err(e) if self.source.policy == FailurePolicy::Skip => {
                    warn!(
                        direction = %self.direction,
                        titles = titles.len(),
                        error = %e,
                        "Skipping batch after provider failure"
                    );
                    self.stats.inc_skipped();
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Splits `titles` into consecutive chunks of at most `size`.
pub fn batch(titles: Vec<Title>, size: usize) -> Vec<Vec<Title>> {
    titles.chunks(size.max(1)).map(<[Title]>::to_vec).collect()
}
