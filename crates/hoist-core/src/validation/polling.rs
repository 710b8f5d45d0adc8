//! Polling validator over a telemetry query backend.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;
use url::Url;

use super::{RecipeValidator, ValidationError};
use crate::cancel::{CancellationToken, is_cancelled, with_cancel};
use crate::http::join_url;
use crate::recipe::Recipe;
use crate::types::{DiscoveryManifest, RecipeVars};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// One result row of a telemetry query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRow {
    #[serde(default)]
    pub count: u64,
    #[serde(default, rename = "entityGuid", alias = "entity_guid")]
    pub entity_guid: Option<String>,
}

#[async_trait]
pub trait TelemetryQuery: Send + Sync {
    async fn query(
        &self,
        cancel: &CancellationToken,
        query: &str,
    ) -> anyhow::Result<Vec<QueryRow>>;
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<QueryRow>,
}

/// [`TelemetryQuery`] that POSTs the query to `{base}/query`.
#[derive(Debug, Clone)]
pub struct HttpTelemetryQuery {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTelemetryQuery {
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl TelemetryQuery for HttpTelemetryQuery {
    async fn query(
        &self,
        cancel: &CancellationToken,
        query: &str,
    ) -> anyhow::Result<Vec<QueryRow>> {
        let url = join_url(&self.base_url, "query")?;

        with_cancel(cancel, async {
            let response = self
                .client
                .post(url.clone())
                .json(&QueryRequest { query })
                .send()
                .await
                .with_context(|| format!("Failed to reach query service at {}", url))?;

            if !response.status().is_success() {
                anyhow::bail!("Query service returned HTTP {}", response.status());
            }

            let body: QueryResponse = response
                .json()
                .await
                .context("Failed to parse query response")?;
            Ok(body.results)
        })
        .await
    }
}

/// Re-runs a recipe's validation query until a row with a positive count
/// shows up, the timeout elapses, or the backend errors.
///
/// The timeout also bounds an in-flight query.
pub struct PollingRecipeValidator {
    query: Arc<dyn TelemetryQuery>,
    interval: Duration,
    timeout: Duration,
}

impl PollingRecipeValidator {
    pub fn new(query: Arc<dyn TelemetryQuery>) -> Self {
        Self {
            query,
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl RecipeValidator for PollingRecipeValidator {
    async fn validate(
        &self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
        recipe: &Recipe,
    ) -> Result<Option<String>, ValidationError> {
        let mut vars = RecipeVars::new();
        vars.insert("HOSTNAME", manifest.hostname.as_str());
        let query = vars.render(&recipe.validation_nrql);

        let deadline = Instant::now() + self.timeout;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(name = %recipe.name, attempt, "polling for data");

            // a query that is ready at the deadline still counts
            let rows = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ValidationError::Cancelled),
                result = self.query.query(cancel, &query) => match result {
                    Ok(rows) => rows,
                    Err(e) if is_cancelled(&e) => return Err(ValidationError::Cancelled),
                    Err(e) => return Err(ValidationError::Backend(format!("{:#}", e))),
                },
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(ValidationError::Timeout(self.timeout));
                }
            };

            if let Some(row) = rows.into_iter().find(|row| row.count > 0) {
                debug!(name = %recipe.name, attempt, "data received");
                return Ok(row.entity_guid.filter(|guid| !guid.trim().is_empty()));
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ValidationError::Timeout(self.timeout));
            }

            let pause = self.interval.min(deadline - now);
            tokio::select! {
                _ = cancel.cancelled() => return Err(ValidationError::Cancelled),
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }
}
