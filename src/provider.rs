//! Link-graph providers.
//!
//! A provider answers one question: for a batch of titles, which links leave (or
//! enter) them, and is there more? Anything satisfying [`LinkProvider`] can drive a
//! search: the live MediaWiki API, the in-memory [`crate::fixture::FixtureGraph`], or a
//! test stub.

use crate::config::{
    ARTICLE_NAMESPACES, MAX_BATCH_SIZE, POOL_IDLE_TIMEOUT_SECS, POOL_MAX_IDLE_PER_HOST,
    REQUEST_TIMEOUT_SECS,
};
use crate::error::{RaceError, Result};
use crate::models::{Direction, Edge, LinkPage, Title};
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait LinkProvider: Send + Sync {
    /// Fetches one page of links for `titles`, resuming from `continuation` if given.
    async fn query(
        &self,
        direction: Direction,
        titles: &[Title],
        continuation: Option<&str>,
    ) -> Result<LinkPage>;

    /// Upper bound on titles per query.
    fn max_batch_size(&self) -> usize {
        MAX_BATCH_SIZE
    }
}

/// MediaWiki `action=query` client.
#[derive(Debug, Clone)]
pub struct WikipediaProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl WikipediaProvider {
    pub fn new(endpoint: impl Into<String>, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl LinkProvider for WikipediaProvider {
    async fn query(
        &self,
        direction: Direction,
        titles: &[Title],
        continuation: Option<&str>,
    ) -> Result<LinkPage> {
        let params = query_params(direction, titles, continuation);
        debug!(
            endpoint = %self.endpoint,
            %direction,
            titles = titles.len(),
            ?continuation,
            "Querying provider"
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RaceError::ProviderUnavailable(format!(
                "got status code: {status}"
            )));
        }

        let body = response.bytes().await?;
        decode_response(direction, &body)
    }
}

/// Parameter prefix and `prop` value for each direction.
fn link_prop(direction: Direction) -> (&'static str, &'static str) {
    match direction {
        Direction::Outbound => ("pl", "links"),
        Direction::Inbound => ("lh", "linkshere"),
    }
}

/// Query-string pairs for one provider request.
pub fn query_params(
    direction: Direction,
    titles: &[Title],
    continuation: Option<&str>,
) -> Vec<(String, String)> {
    let (prefix, prop) = link_prop(direction);
    let mut params = vec![
        ("action".to_string(), "query".to_string()),
        ("format".to_string(), "json".to_string()),
        ("prop".to_string(), prop.to_string()),
        ("titles".to_string(), titles.join("|")),
        (format!("{prefix}namespace"), ARTICLE_NAMESPACES.to_string()),
        (format!("{prefix}limit"), "max".to_string()),
    ];
    if let Some(token) = continuation {
        params.push((format!("{prefix}continue"), token.to_string()));
    }
    params
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(rename = "continue", default)]
    continuation: Option<FxHashMap<String, serde_json::Value>>,
    query: Option<ApiQuery>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Deserialize)]
struct ApiQuery {
    #[serde(default)]
    normalized: Vec<ApiNormalization>,
    #[serde(default)]
    pages: FxHashMap<String, ApiPage>,
}

#[derive(Deserialize)]
struct ApiNormalization {
    from: String,
    to: String,
}

#[derive(Deserialize)]
struct ApiPage {
    title: String,
    #[serde(default)]
    links: Vec<ApiLink>,
    #[serde(default)]
    linkshere: Vec<ApiLink>,
}

#[derive(Deserialize)]
struct ApiLink {
    title: String,
}

/// Decodes a MediaWiki `links`/`linkshere` response body.
///
/// Page titles the provider normalized are mapped back to the spelling that was
/// requested, so predecessor chains keep pointing at titles the search has seen.
pub fn decode_response(direction: Direction, body: &[u8]) -> Result<LinkPage> {
    let response: ApiResponse = serde_json::from_slice(body)?;

    if let Some(err) = response.error {
        return Err(RaceError::ProviderUnavailable(format!(
            "{}: {}",
            err.code, err.info
        )));
    }

    let query = response
        .query
        .ok_or_else(|| RaceError::MalformedResponse("response has no query object".into()))?;

    let (prefix, _) = link_prop(direction);
    let continuation = match response.continuation {
        Some(cont) => match cont.get(&format!("{prefix}continue")) {
            Some(serde_json::Value::String(token)) => Some(token.clone()),
            Some(other) => {
                return Err(RaceError::MalformedResponse(format!(
                    "{prefix}continue is not a string: {other}"
                )))
            }
            None => None,
        },
        None => None,
    };

    let requested: FxHashMap<&str, &str> = query
        .normalized
        .iter()
        .map(|n| (n.to.as_str(), n.from.as_str()))
        .collect();

    let mut pages: Vec<&ApiPage> = query.pages.values().collect();
    pages.sort_by(|a, b| a.title.cmp(&b.title));

    let mut edges = Vec::new();
    for page in pages {
        let title = requested
            .get(page.title.as_str())
            .copied()
            .unwrap_or(page.title.as_str());
        match direction {
            Direction::Outbound => {
                edges.extend(page.links.iter().map(|l| Edge::new(title, l.title.as_str())));
            }
            Direction::Inbound => {
                edges.extend(
                    page.linkshere
                        .iter()
                        .map(|l| Edge::new(l.title.as_str(), title)),
                );
            }
        }
    }

    Ok(LinkPage {
        edges,
        continuation,
    })
}
