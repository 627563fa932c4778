//! HTTP client for the voting backend
//!
//! Three endpoints are used:
//! - `POST /vote` with `{"vote": "<choice>"}`
//! - `GET /results` returning `{"dogs": N, "cats": N}`
//! - `GET /health` returning `{"status": "ok", "mode": "..."}`

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::ApiBaseUrl;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The request never got an HTTP response (refused, DNS, timeout)
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {0}")]
    Status(StatusCode),

    #[error("unexpected response body: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            ApiError::Status(status)
        } else if error.is_decode() {
            ApiError::Malformed(error.to_string())
        } else {
            ApiError::Network(error.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Dogs,
    Cats,
}

impl VoteChoice {
    pub const ALL: [VoteChoice; 2] = [VoteChoice::Dogs, VoteChoice::Cats];

    pub fn as_str(self) -> &'static str {
        match self {
            VoteChoice::Dogs => "dogs",
            VoteChoice::Cats => "cats",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VoteChoice::Dogs => "Dogs",
            VoteChoice::Cats => "Cats",
        }
    }

    pub fn other(self) -> Self {
        match self {
            VoteChoice::Dogs => VoteChoice::Cats,
            VoteChoice::Cats => VoteChoice::Dogs,
        }
    }

    fn index(self) -> usize {
        match self {
            VoteChoice::Dogs => 0,
            VoteChoice::Cats => 1,
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown choice '{0}' (expected 'dogs' or 'cats')")]
pub struct UnknownChoice(String);

impl FromStr for VoteChoice {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dogs" | "dog" => Ok(VoteChoice::Dogs),
            "cats" | "cat" => Ok(VoteChoice::Cats),
            _ => Err(UnknownChoice(s.to_string())),
        }
    }
}

/// Aggregate counts as reported by the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultsSnapshot {
    counts: [u64; 2],
}

impl ResultsSnapshot {
    pub fn new(dogs: u64, cats: u64) -> Self {
        Self { counts: [dogs, cats] }
    }

    pub fn count(&self, choice: VoteChoice) -> u64 {
        self.counts[choice.index()]
    }

    /// Saturates instead of wrapping; `parse_results` already rejects
    /// bodies whose counts overflow
    pub fn total(&self) -> u64 {
        self.counts.iter().fold(0u64, |acc, c| acc.saturating_add(*c))
    }
}

/// Wire shape of `/results`. The backend also sends `total`, which is
/// recomputed locally instead of trusted.
#[derive(Debug, Deserialize)]
struct ResultsBody {
    #[serde(default)]
    dogs: Option<u64>,
    #[serde(default)]
    cats: Option<u64>,
}

impl TryFrom<ResultsBody> for ResultsSnapshot {
    type Error = ApiError;

    fn try_from(body: ResultsBody) -> ApiResult<Self> {
        let dogs = body.dogs.unwrap_or(0);
        let cats = body.cats.unwrap_or(0);

        if dogs.checked_add(cats).is_none() {
            return Err(ApiError::Malformed(format!(
                "vote counts overflow (dogs={}, cats={})",
                dogs, cats
            )));
        }

        Ok(ResultsSnapshot::new(dogs, cats))
    }
}

pub fn parse_results(body: &str) -> ApiResult<ResultsSnapshot> {
    let body: ResultsBody =
        serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))?;
    ResultsSnapshot::try_from(body)
}

#[derive(Debug, Serialize)]
struct VoteBody {
    vote: VoteChoice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VoteClient {
    http: reqwest::Client,
    base: ApiBaseUrl,
}

impl VoteClient {
    pub fn new(base: ApiBaseUrl, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &ApiBaseUrl {
        &self.base
    }

    pub async fn submit_vote(&self, choice: VoteChoice) -> ApiResult<()> {
        tracing::info!("Casting vote for {}", choice);

        let response = self
            .http
            .post(self.base.join("vote"))
            .json(&VoteBody { vote: choice })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Vote for {} rejected: {}", choice, status);
            return Err(ApiError::Status(status));
        }

        Ok(())
    }

    pub async fn fetch_results(&self) -> ApiResult<ResultsSnapshot> {
        let response = self.http.get(self.base.join("results")).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        let body = response.text().await?;
        let snapshot = parse_results(&body)?;
        tracing::debug!(
            "Results: dogs={} cats={}",
            snapshot.count(VoteChoice::Dogs),
            snapshot.count(VoteChoice::Cats)
        );
        Ok(snapshot)
    }

    pub async fn health(&self) -> ApiResult<HealthReport> {
        let response = self.http.get(self.base.join("health")).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Malformed(e.to_string()))
    }
}
