//! Bidirectional search coordination.
//!
//! A search seeds a forward visited map with the source and a backward one with the
//! target, then races two [`Frontier`] tasks toward each other. The first task to
//! insert a title the other side has already visited records it as the midpoint; the
//! path is stitched together from the two predecessor trees.
//!
//! The sides are not synchronized layer by layer, so when both could touch an
//! overlapping title at nearly the same moment the first detection wins even if a
//! shorter overall chain exists. Each side on its own is still a strict BFS.

use crate::error::{RaceError, Result};
use crate::frontier::{Frontier, FrontierOutcome};
use crate::links::LinkSource;
use crate::models::{Direction, Race, Title};
use crate::stats::SearchStats;
use crate::visited::VisitedMap;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    /// Deadline for the whole search. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// Per-search state shared between the two frontiers.
#[derive(Debug)]
pub struct SearchState {
    pub forward: Arc<VisitedMap>,
    pub backward: Arc<VisitedMap>,
    meeting: Arc<OnceLock<Title>>,
}

impl SearchState {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            forward: Arc::new(VisitedMap::with_root(from)),
            backward: Arc::new(VisitedMap::with_root(to)),
            meeting: Arc::new(OnceLock::new()),
        }
    }

    pub fn midpoint(&self) -> Option<&Title> {
        self.meeting.get()
    }

    /// Records `title` as the midpoint unless one is already set.
    pub fn record_midpoint(&self, title: impl Into<Title>) -> bool {
        self.meeting.set(title.into()).is_ok()
    }

    /// The full chain through the recorded midpoint.
    pub fn path(&self) -> Option<Vec<Title>> {
        self.midpoint()
            .map(|midpoint| reconstruct_path(&self.forward, &self.backward, midpoint))
    }
}

/// Joins `root … midpoint` from the forward tree with `midpoint … target` from the
/// backward tree.
pub fn reconstruct_path(
    forward: &VisitedMap,
    backward: &VisitedMap,
    midpoint: &str,
) -> Vec<Title> {
    let mut path = forward.chain(midpoint);
    path.reverse();
    path.pop();
    path.extend(backward.chain(midpoint));
    path
}

/// Runs bidirectional searches against one [`LinkSource`].
#[derive(Clone)]
pub struct SearchCoordinator {
    source: LinkSource,
    options: SearchOptions,
}

impl SearchCoordinator {
    pub fn new(source: LinkSource) -> Self {
        Self {
            source,
            options: SearchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    /// Finds a chain of links from `from` to `to`, both inclusive.
    pub async fn search(&self, from: &str, to: &str) -> Result<Race> {
        if from.trim().is_empty() || to.trim().is_empty() {
            return Err(RaceError::InvalidInput(
                "source and target titles must not be empty".to_string(),
            ));
        }

        let started = Instant::now();
        let stats = Arc::new(SearchStats::new());

        if from == to {
            return Ok(Race {
                from: from.to_string(),
                to: to.to_string(),
                path: vec![from.to_string()],
                midpoint: None,
                elapsed_secs: started.elapsed().as_secs_f64(),
                stats: stats.summary(),
            });
        }

        info!(from, to, "Starting search");
        let state = SearchState::new(from, to);
        let cancel = CancellationToken::new();
        // Dropping the search future cancels both tasks.
        let _guard = cancel.clone().drop_guard();
        let mut tasks = self.spawn_frontiers(from, to, &state, &cancel, &stats);

        let outcome = match self.options.timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, await_meeting(&mut tasks, &state)).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        cancel.cancel();
                        tasks.settle().await;
                        warn!(from, to, ?limit, "Search timed out");
                        return Err(RaceError::Timeout(limit));
                    }
                }
            }
            None => await_meeting(&mut tasks, &state).await,
        };
        cancel.cancel();
        tasks.settle().await;
        outcome?;

        let path = state.path().ok_or_else(|| RaceError::NoPathFound {
            from: from.to_string(),
            to: to.to_string(),
        })?;

        let race = Race {
            from: from.to_string(),
            to: to.to_string(),
            path,
            midpoint: state.midpoint().cloned(),
            elapsed_secs: started.elapsed().as_secs_f64(),
            stats: stats.summary(),
        };
        info!(
            hops = race.hops(),
            requests = race.stats.requests,
            elapsed_secs = race.elapsed_secs,
            "Search complete"
        );
        Ok(race)
    }

    fn spawn_frontiers(
        &self,
        from: &str,
        to: &str,
        state: &SearchState,
        cancel: &CancellationToken,
        stats: &Arc<SearchStats>,
    ) -> FrontierTasks {
        let forward = tokio::spawn(
            Frontier::new(
                Direction::Outbound,
                from.to_string(),
                Arc::clone(&state.forward),
                Arc::clone(&state.backward),
                Arc::clone(&state.meeting),
                self.source.clone(),
                cancel.clone(),
                Arc::clone(stats),
            )
            .run(),
        );
        let backward = tokio::spawn(
            Frontier::new(
                Direction::Inbound,
                to.to_string(),
                Arc::clone(&state.backward),
                Arc::clone(&state.forward),
                Arc::clone(&state.meeting),
                self.source.clone(),
                cancel.clone(),
                Arc::clone(stats),
            )
            .run(),
        );

        FrontierTasks {
            forward,
            forward_done: false,
            backward,
            backward_done: false,
        }
    }
}

/// Waits until one frontier records a midpoint, both run dry, or one fails.
///
/// Cancel-safe: a task handle is only marked done once its result has been taken.
async fn await_meeting(tasks: &mut FrontierTasks, state: &SearchState) -> Result<()> {
    while let Some((direction, joined)) = tasks.next_finished().await {
        match joined {
            Ok(Ok(outcome)) => {
                debug!(%direction, ?outcome, "Frontier finished");
                if state.midpoint().is_some() {
                    break;
                }
            }
            Ok(Err(e)) => {
                warn!(%direction, error = %e, "Frontier failed");
                return Err(e);
            }
            Err(e) => return Err(RaceError::TaskFailed(e)),
        }
    }
    Ok(())
}

/// The two spawned frontier tasks and which of them have been joined.
struct FrontierTasks {
    forward: JoinHandle<Result<FrontierOutcome>>,
    forward_done: bool,
    backward: JoinHandle<Result<FrontierOutcome>>,
    backward_done: bool,
}

type Joined = std::result::Result<Result<FrontierOutcome>, JoinError>;

impl FrontierTasks {
    /// The next task to finish, or `None` once both have been joined.
    async fn next_finished(&mut self) -> Option<(Direction, Joined)> {
        if self.forward_done && self.backward_done {
            return None;
        }
        let finished = tokio::select! {
            joined = &mut self.forward, if !self.forward_done => {
                self.forward_done = true;
                (Direction::Outbound, joined)
            }
            joined = &mut self.backward, if !self.backward_done => {
                self.backward_done = true;
                (Direction::Inbound, joined)
            }
        };
        Some(finished)
    }

    /// Waits for whichever tasks are still running; they exit promptly once cancelled.
    async fn settle(&mut self) {
        while self.next_finished().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::BoringFilter;
    use crate::fixture::FixtureGraph;

    fn map(root: &str, entries: &[(&str, &str)]) -> VisitedMap {
        let map = VisitedMap::with_root(root);
        for (title, pred) in entries {
            map.insert_if_absent(title, pred);
        }
        map
    }

    fn coordinator(graph: Arc<FixtureGraph>) -> SearchCoordinator {
        SearchCoordinator::new(LinkSource::new(graph, BoringFilter::default()))
    }

    #[test]
    fn reconstructs_path_through_midpoint() {
        let forward = map("A", &[("B", "A"), ("M", "B")]);
        let backward = map("D", &[("C", "D"), ("M", "C")]);
        assert_eq!(
            reconstruct_path(&forward, &backward, "M"),
            vec!["A", "B", "M", "C", "D"]
        );
    }

    #[test]
    fn reconstructs_when_midpoint_is_a_root() {
        let forward = map("A", &[("B", "A")]);
        let backward = map("B", &[]);
        assert_eq!(reconstruct_path(&forward, &backward, "B"), vec!["A", "B"]);

        let forward = map("A", &[]);
        let backward = map("C", &[("A", "C")]);
        assert_eq!(reconstruct_path(&forward, &backward, "A"), vec!["A", "C"]);
    }

    #[test]
    fn state_path_uses_recorded_midpoint() {
        let state = SearchState::new("A", "D");
        state.forward.insert_if_absent("B", "A");
        state.backward.insert_if_absent("B", "D");
        assert!(state.path().is_none());

        assert!(state.record_midpoint("B"));
        assert!(!state.record_midpoint("A"));
        assert_eq!(state.path(), Some(vec!["A".into(), "B".into(), "D".into()]));
    }

    #[tokio::test]
    async fn same_title_needs_no_requests() {
        let graph = Arc::new(FixtureGraph::from_edges([("A", "B")]));
        let race = coordinator(graph.clone()).search("A", "A").await.unwrap();
        assert_eq!(race.path, vec!["A"]);
        assert_eq!(race.midpoint, None);
        assert_eq!(race.hops(), 0);
        assert_eq!(graph.requests(), 0);
    }

    #[tokio::test]
    async fn blank_titles_are_rejected_before_any_request() {
        let graph = Arc::new(FixtureGraph::from_edges([("A", "B")]));
        let search = coordinator(graph.clone());

        assert!(matches!(search.search("", "B").await, Err(RaceError::InvalidInput(_))));
        assert!(matches!(search.search("A", "  ").await, Err(RaceError::InvalidInput(_))));
        assert_eq!(graph.requests(), 0);
    }

    #[tokio::test]
    async fn finds_direct_link() {
        let graph = Arc::new(FixtureGraph::from_edges([("A", "B")]));
        let race = coordinator(graph).search("A", "B").await.unwrap();
        assert_eq!(race.path, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn disconnected_titles_have_no_path() {
        let graph = Arc::new(FixtureGraph::from_edges([("A", "B"), ("C", "D")]));
        let err = coordinator(graph).search("A", "D").await.unwrap_err();
        assert!(matches!(err, RaceError::NoPathFound { .. }));
    }
}
