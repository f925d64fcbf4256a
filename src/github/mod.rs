//! The GitHub GraphQL client and the statistics built on top of it.

use std::error::Error as _;
use std::sync::atomic::{AtomicU32, Ordering};

use reqwest::header;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::env::{Credentials, MAX_RETRIES};
use crate::framework::{State, backoff_delay, retry_if_possible};

pub mod loc;
pub mod queries;
pub mod stats;

/// The endpoint every query is posted to.
pub const GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";

/// Why the content-generation step failed. Fatal to the run; the next
/// scheduled invocation is the retry policy.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The API rejected the request for a non-transient reason (bad
    /// credentials, rate limit, malformed query). Details are in the log.
    #[error("the GitHub API rejected the request; see the log for details")]
    Rejected,
    /// Transient failures kept recurring until the retry budget ran out.
    #[error("gave up after {0} retries against the GitHub API")]
    RetriesExhausted(u8),
    /// The response parsed but lacked a field the statistics need.
    #[error("missing data in GitHub response: {0}")]
    MissingData(&'static str),
    /// Reading or writing a local artifact (cache file, SVG template) failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The query families the client issues, for call accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Account,
    Followers,
    Repositories,
    LocOverview,
    RepositoryHistory,
}

impl QueryKind {
    const ALL: [Self; 5] = [
        Self::Account,
        Self::Followers,
        Self::Repositories,
        Self::LocOverview,
        Self::RepositoryHistory,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Followers => "followers",
            Self::Repositories => "repositories",
            Self::LocOverview => "loc overview",
            Self::RepositoryHistory => "repository history",
        }
    }
}

#[derive(Debug, Default)]
struct QueryCounts([AtomicU32; QueryKind::ALL.len()]);

impl QueryCounts {
    fn bump(&self, kind: QueryKind) {
        let index = QueryKind::ALL.iter().position(|k| *k == kind).unwrap_or(0);
        self.0[index].fetch_add(1, Ordering::Relaxed);
    }

    fn total(&self) -> u32 {
        self.0.iter().map(|count| count.load(Ordering::Relaxed)).sum()
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// A client for GitHub's GraphQL v4 API.
///
/// Credentials are passed per request rather than held by the client, so one
/// client can serve an entire run without owning any secret state.
#[derive(Debug)]
pub struct GitHubClient {
    http: reqwest::Client,
    endpoint: String,
    counts: QueryCounts,
}

impl Default for GitHubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHubClient {
    /// Creates a client against [`GRAPHQL_ENDPOINT`].
    pub fn new() -> Self {
        Self::with_endpoint(GRAPHQL_ENDPOINT)
    }

    /// Creates a client against an arbitrary endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            counts: QueryCounts::default(),
        }
    }

    /// Logs how many API calls the run issued, per query family.
    pub fn log_query_counts(&self) {
        info!("total GitHub GraphQL API calls: {}", self.counts.total());
        for (kind, count) in QueryKind::ALL.iter().zip(&self.counts.0) {
            debug!("  {}: {}", kind.as_str(), count.load(Ordering::Relaxed));
        }
    }

    fn request_builder(&self, credentials: &Credentials) -> reqwest::RequestBuilder {
        self.http
            .post(&self.endpoint)
            .header(header::ACCEPT, "application/vnd.github+json")
            .bearer_auth(&credentials.access_token)
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("User-Agent", "profile-refresh/0.2")
    }

    /// Posts one query and classifies the outcome.
    ///
    /// Connection failures, timeouts and 5xx responses instruct a retry;
    /// authentication and rate-limit responses stop the run, with a
    /// human-readable reason in the log for CI output.
    pub async fn post<T>(
        &self,
        kind: QueryKind,
        credentials: &Credentials,
        query: &str,
        variables: Value,
    ) -> State<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.counts.bump(kind);
        debug!("posting {} query…", kind.as_str());

        let body = serde_json::json!({ "query": query, "variables": variables });
        let response = match self.request_builder(credentials).json(&body).send().await {
            Ok(response) => response,
            Err(err) => {
                error!("failed to post {} query: {err}", kind.as_str());
                return match err {
                    _ if err.is_connect() || err.is_timeout() => State::Retry,
                    _ => State::Stop,
                };
            }
        };

        let status = response.status();
        match status.as_u16() {
            200 => {}
            401 => {
                error!(
                    "{} query failed: 401 Unauthorized. Check the ACCESS_TOKEN secret and its permissions",
                    kind.as_str()
                );
                return State::Stop;
            }
            403 => {
                error!(
                    "{} query failed: 403 Forbidden. You may have hit an API rate limit or lack permissions",
                    kind.as_str()
                );
                return State::Stop;
            }
            code if (500..600).contains(&code) => {
                error!(
                    "{} query failed: server error {code}. This may be transient",
                    kind.as_str()
                );
                return State::Retry;
            }
            code => {
                error!("{} query failed with status {code}", kind.as_str());
                return State::Stop;
            }
        }

        match response.json::<Envelope<T>>().await {
            Ok(envelope) => {
                if !envelope.errors.is_empty() {
                    for graphql_error in &envelope.errors {
                        error!("{} query error: {}", kind.as_str(), graphql_error.message);
                    }
                    return State::Stop;
                }
                match envelope.data {
                    Some(data) => State::Success(data),
                    None => {
                        error!("{} response carried no data", kind.as_str());
                        State::Stop
                    }
                }
            }
            Err(err) => {
                error!("failed to parse {} response: {err}", kind.as_str());

                if let Some(source) = err.source() {
                    error!("{source}")
                }

                State::Retry
            }
        }
    }

    /// Posts one query, retrying transient failures with exponential backoff
    /// up to [`MAX_RETRIES`] times.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Rejected`] on non-transient failures and
    /// [`GenerationError::RetriesExhausted`] once the retry budget is spent.
    pub async fn post_with_retry<T>(
        &self,
        kind: QueryKind,
        credentials: &Credentials,
        query: &str,
        variables: Value,
    ) -> Result<T, GenerationError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut retry: u8 = 0;
        loop {
            match self.post(kind, credentials, query, variables.clone()).await {
                State::Success(data) => return Ok(data),
                State::Retry => match retry_if_possible(&mut retry) {
                    Ok(()) => tokio::time::sleep(backoff_delay(retry)).await,
                    Err(()) => return Err(GenerationError::RetriesExhausted(*MAX_RETRIES)),
                },
                State::Stop => return Err(GenerationError::Rejected),
            }
        }
    }
}
