use std::time::Duration;

/// MediaWiki query endpoint used when none is given
pub const DEFAULT_API_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";

/// Identification sent with every provider request
pub const DEFAULT_USER_AGENT: &str = concat!(
    "wikirace/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/real-limoges/wikirace)"
);

/// Namespaces searched: main | category | portal
pub const ARTICLE_NAMESPACES: &str = "0|14|100";

/// Most titles the provider accepts in a single query
pub const MAX_BATCH_SIZE: usize = 50;

/// Per-request timeout for the HTTP client
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Idle connections kept open to the provider
pub const POOL_MAX_IDLE_PER_HOST: usize = 10;

pub const POOL_IDLE_TIMEOUT_SECS: u64 = 30;

/// Extra attempts made by `FailurePolicy::Retry` unless overridden
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Links per page served by the fixture provider
pub const DEFAULT_FIXTURE_PAGE_SIZE: usize = 500;

/// What a link source does when a provider request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// End the link sequence with the error.
    #[default]
    Fatal,
    /// Log the failure and move on to the next batch.
    Skip,
    /// Re-issue the request up to `attempts` more times, then fail.
    Retry { attempts: u32, delay: Duration },
}

impl FailurePolicy {
    pub fn retry() -> Self {
        FailurePolicy::Retry {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}
