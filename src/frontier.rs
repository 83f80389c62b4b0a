use crate::error::Result;
use crate::links::LinkSource;
use crate::models::{Direction, Edge, Title};
use crate::stats::SearchStats;
use crate::visited::VisitedMap;
use futures::StreamExt;
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// How a frontier's expansion loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontierOutcome {
    /// This side found the meeting title and recorded it.
    Midpoint(Title),
    /// The queue ran dry without touching the other side.
    Exhausted,
    /// Stopped early: cancelled, or the other side recorded a midpoint first.
    Cancelled,
}

/// One side of the bidirectional search.
///
/// Expands strictly layer by layer. The pending queue is owned here and never shared;
/// the opposite side's visited map is only read.
pub struct Frontier {
    direction: Direction,
    visited: Arc<VisitedMap>,
    opposite: Arc<VisitedMap>,
    meeting: Arc<OnceLock<Title>>,
    queue: Vec<Title>,
    source: LinkSource,
    cancel: CancellationToken,
    stats: Arc<SearchStats>,
}

impl Frontier {
    /// `root` must already be in `visited`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        direction: Direction,
        root: Title,
        visited: Arc<VisitedMap>,
        opposite: Arc<VisitedMap>,
        meeting: Arc<OnceLock<Title>>,
        source: LinkSource,
        cancel: CancellationToken,
        stats: Arc<SearchStats>,
    ) -> Self {
        Self {
            direction,
            visited,
            opposite,
            meeting,
            queue: vec![root],
            source,
            cancel,
            stats,
        }
    }

    pub async fn run(mut self) -> Result<FrontierOutcome> {
        let mut depth = 0u32;

        while !self.queue.is_empty() {
            if self.cancel.is_cancelled() {
                return Ok(FrontierOutcome::Cancelled);
            }

            let layer = std::mem::take(&mut self.queue);
            depth += 1;
            self.stats.inc_layers(self.direction);
            debug!(
                direction = %self.direction,
                depth,
                titles = layer.len(),
                "Expanding layer"
            );

            let mut links = self.source.fetch_links(
                self.direction,
                layer,
                self.cancel.clone(),
                Arc::clone(&self.stats),
            );
            while let Some(edges) = links.next().await {
                for edge in edges? {
                    if let Some(outcome) = self.visit(edge) {
                        return Ok(outcome);
                    }
                }
            }

            // The stream also ends when cancelled, mid-layer.
            if self.cancel.is_cancelled() {
                return Ok(FrontierOutcome::Cancelled);
            }
        }

        info!(direction = %self.direction, depth, "Queue exhausted");
        Ok(FrontierOutcome::Exhausted)
    }

    /// Records the far endpoint of `edge` and probes the other side for it.
    fn visit(&mut self, edge: Edge) -> Option<FrontierOutcome> {
        let (near, far) = match self.direction {
            Direction::Outbound => (edge.from, edge.to),
            Direction::Inbound => (edge.to, edge.from),
        };

        if !self.visited.insert_if_absent(&far, &near) {
            return None;
        }
        trace!(direction = %self.direction, from = %near, to = %far, "Visited");
        self.stats.inc_visited(self.direction);

        if !self.opposite.contains(&far) {
            self.queue.push(far);
            return None;
        }

        match self.meeting.set(far.clone()) {
            Ok(()) => {
                info!(direction = %self.direction, midpoint = %far, "Frontiers met");
                Some(FrontierOutcome::Midpoint(far))
            }
            Err(_) => Some(FrontierOutcome::Cancelled),
        }
    }
}
