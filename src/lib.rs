//! Wikirace: shortest-ish link chains between Wikipedia articles
//!
//! This crate searches the live Wikipedia link graph for a chain of links from one
//! article to another. It never downloads the graph; it asks the MediaWiki API for the
//! links of the pages it is currently looking at and grows two search trees toward each
//! other:
//!
//! 1. **Forward frontier** -- Breadth-first from the source over outbound links
//!    (`prop=links`)
//! 2. **Backward frontier** -- Breadth-first from the target over inbound links
//!    (`prop=linkshere`)
//! 3. **Meeting** -- Each side checks the other's visited map after every insert; the
//!    first shared title is the midpoint
//! 4. **Reconstruction** -- Predecessor chains from both trees are joined at the midpoint
//!
//! # Architecture
//!
//! - **Two tokio tasks per search** -- One per frontier, racing each other
//! - **Concurrent visited maps** -- DashMap with atomic insert-if-absent; the only state
//!   the tasks share
//! - **Single-owner queues** -- Each frontier keeps its pending layer to itself
//! - **Lazy link streams** -- Batches of at most 50 titles, continuation tokens followed
//!   page by page, consumed as they arrive
//! - **Cooperative cancellation** -- A shared token stops the losing side between and
//!   during requests
//! - **Injected filtering** -- Citation and authority-control pages are dropped by a
//!   [`filter::BoringFilter`] handed to the link source, not by global state
//!
//! # Key Modules
//!
//! - [`search`] -- Coordinator: runs the race, builds the path
//! - [`frontier`] -- One side's level-synchronous BFS
//! - [`visited`] -- Title → predecessor map
//! - [`links`] -- Batching, pagination, filtering and failure policy
//! - [`provider`] -- Provider trait and the MediaWiki client
//! - [`fixture`] -- In-memory provider for tests and offline runs
//! - [`filter`] -- Boring title/pattern configuration
//! - [`models`] -- Titles, edges, pages and results
//! - [`stats`] -- Atomic per-search counters
//! - [`error`] -- Typed errors
//! - [`config`] -- Constants and the failure policy
//!
//! # Example Usage
//!
//! ```bash
//! wikirace race "Ada Lovelace" "Susan B. Anthony"
//!
//! # Offline, against a JSON adjacency file
//! wikirace race A D --fixture graph.json --json
//!
//! # Inspect what the search would see for a page
//! wikirace links "Ada Lovelace" --inbound
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod fixture;
pub mod frontier;
pub mod links;
pub mod models;
pub mod provider;
pub mod search;
pub mod stats;
pub mod visited;

pub use error::{RaceError, Result};
pub use models::{Direction, Edge, Race, Title};
pub use search::{SearchCoordinator, SearchOptions};
