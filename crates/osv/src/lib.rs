use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::time::Duration;

use guardian_core::{Ecosystem, LookupError, RawVulnerability, SeverityScore, VulnerabilityLookup};

pub const OSV_API_URL: &str = "https://api.osv.dev/v1/query";

/// Client for the OSV.dev single-package query endpoint.
#[derive(Debug, Clone)]
pub struct OsvClient {
    client: Client,
    api_url: String,
}

impl OsvClient {
    /// Builds a client that posts to `api_url`, bounding each request by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, LookupError> {
        let api_url = api_url.into();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| transport_error("unable to build OSV HTTP client", &api_url, e))?;
        Ok(Self { client, api_url })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl VulnerabilityLookup for OsvClient {
    async fn query(
        &self,
        package: &str,
        version: &str,
        ecosystem: Ecosystem,
    ) -> Result<Vec<RawVulnerability>, LookupError> {
        let body = OsvQueryRequest {
            package: OsvPackage {
                name: package.to_string(),
                ecosystem: ecosystem.osv_name().to_string(),
            },
            version: version.to_string(),
        };

        tracing::debug!(
            package,
            version,
            ecosystem = ecosystem.osv_name(),
            "querying OSV"
        );

        let response = self
            .client
            .post(&self.api_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("unable to query OSV API", &self.api_url, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        if response.status().is_server_error() {
            return Err(LookupError::Transport {
                message: format!("OSV API server error {}", response.status()),
            });
        }

        if !response.status().is_success() {
            return Err(LookupError::Transport {
                message: format!("OSV API returned status {}", response.status()),
            });
        }

        let body: OsvQueryResponse =
            response
                .json()
                .await
                .map_err(|e| LookupError::InvalidResponse {
                    message: format!("failed to parse OSV response JSON: {e}"),
                })?;

        Ok(body.vulns.into_iter().map(OsvVulnerability::into_raw).collect())
    }
}

fn transport_error(context: &str, request_url: &str, error: reqwest::Error) -> LookupError {
    let mut details = Vec::new();

    let effective_url = error
        .url()
        .map(|url| url.as_str().to_string())
        .unwrap_or_else(|| request_url.to_string());
    details.push(format!("request_url={effective_url}"));

    let mut kinds = Vec::new();
    if error.is_timeout() {
        kinds.push("timeout");
    }
    if error.is_connect() {
        kinds.push("connect");
    }
    if error.is_request() {
        kinds.push("request");
    }
    if error.is_builder() {
        kinds.push("builder");
    }
    if kinds.is_empty() {
        kinds.push("unknown");
    }
    details.push(format!("kinds={}", kinds.join(",")));

    let mut sources = Vec::new();
    let mut current = error.source();
    while let Some(source) = current {
        sources.push(source.to_string());
        if sources.len() >= 4 {
            break;
        }
        current = source.source();
    }
    if !sources.is_empty() {
        details.push(format!("source_chain={}", sources.join(" | ")));
    }

    LookupError::Transport {
        message: format!("{context}: {error}; {}", details.join("; ")),
    }
}

#[derive(Debug, Serialize)]
struct OsvQueryRequest {
    package: OsvPackage,
    version: String,
}

#[derive(Debug, Serialize)]
struct OsvPackage {
    name: String,
    ecosystem: String,
}

#[derive(Debug, Deserialize)]
struct OsvQueryResponse {
    #[serde(default)]
    vulns: Vec<OsvVulnerability>,
}

#[derive(Debug, Deserialize)]
struct OsvVulnerability {
    id: String,
    summary: Option<String>,
    // Shape varies per source database; only `severity` is read.
    database_specific: Option<serde_json::Value>,
    #[serde(default)]
    severity: Vec<OsvSeverity>,
    #[serde(default)]
    references: Vec<OsvReference>,
}

impl OsvVulnerability {
    fn into_raw(self) -> RawVulnerability {
        let database_severity = self
            .database_specific
            .as_ref()
            .and_then(|specific| specific.get("severity"))
            .and_then(serde_json::Value::as_str)
            .map(ToOwned::to_owned);

        RawVulnerability {
            id: self.id,
            summary: self.summary,
            database_severity,
            scores: self
                .severity
                .into_iter()
                .map(|entry| SeverityScore {
                    scheme: entry.kind,
                    score: entry.score,
                })
                .collect(),
            references: self
                .references
                .into_iter()
                .filter_map(|reference| reference.url)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OsvSeverity {
    #[serde(rename = "type")]
    kind: String,
    score: String,
}

#[derive(Debug, Deserialize)]
struct OsvReference {
    url: Option<String>,
}
