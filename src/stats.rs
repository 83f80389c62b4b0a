use crate::models::Direction;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the two frontiers and their link sources for one search
#[derive(Default, Debug)]
pub struct SearchStats {
    pub requests_issued: AtomicU64,
    pub edges_received: AtomicU64,
    pub edges_filtered: AtomicU64,
    pub retries: AtomicU64,
    pub batches_skipped: AtomicU64,
    pub forward_visited: AtomicU64,
    pub backward_visited: AtomicU64,
    pub forward_layers: AtomicU64,
    pub backward_layers: AtomicU64,
}

/// Point-in-time copy of [`SearchStats`], attached to results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub requests: u64,
    pub edges_received: u64,
    pub edges_filtered: u64,
    pub retries: u64,
    pub batches_skipped: u64,
    pub forward_visited: u64,
    pub backward_visited: u64,
    pub forward_layers: u64,
    pub backward_layers: u64,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_requests(&self) {
        self.requests_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_edges(&self, count: u64) {
        self.edges_received.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_filtered(&self, count: u64) {
        self.edges_filtered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_retries(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_skipped(&self) {
        self.batches_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_visited(&self, direction: Direction) {
        match direction {
            Direction::Outbound => self.forward_visited.fetch_add(1, Ordering::Relaxed),
            Direction::Inbound => self.backward_visited.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn inc_layers(&self, direction: Direction) {
        match direction {
            Direction::Outbound => self.forward_layers.fetch_add(1, Ordering::Relaxed),
            Direction::Inbound => self.backward_layers.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn requests(&self) -> u64 {
        self.requests_issued.load(Ordering::Relaxed)
    }

    pub fn edges(&self) -> u64 {
        self.edges_received.load(Ordering::Relaxed)
    }

    pub fn filtered(&self) -> u64 {
        self.edges_filtered.load(Ordering::Relaxed)
    }

    pub fn visited(&self, direction: Direction) -> u64 {
        match direction {
            Direction::Outbound => self.forward_visited.load(Ordering::Relaxed),
            Direction::Inbound => self.backward_visited.load(Ordering::Relaxed),
        }
    }

    pub fn layers(&self, direction: Direction) -> u64 {
        match direction {
            Direction::Outbound => self.forward_layers.load(Ordering::Relaxed),
            Direction::Inbound => self.backward_layers.load(Ordering::Relaxed),
        }
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            requests: self.requests(),
            edges_received: self.edges(),
            edges_filtered: self.filtered(),
            retries: self.retries.load(Ordering::Relaxed),
            batches_skipped: self.batches_skipped.load(Ordering::Relaxed),
            forward_visited: self.visited(Direction::Outbound),
            backward_visited: self.visited(Direction::Inbound),
            forward_layers: self.layers(Direction::Outbound),
            backward_layers: self.layers(Direction::Inbound),
        }
    }
}
