//! Durable run status stored in the remote document service.

use anyhow::Context;
use async_trait::async_trait;
use url::Url;

use super::{RunStatus, StatusEvent, StatusReporter};
use crate::http::join_url;

/// Writes the whole [`RunStatus`] document after every event with
/// `PUT {base}/documents/{document_id}`.
#[derive(Debug, Clone)]
pub struct RemoteStatusReporter {
    client: reqwest::Client,
    base_url: Url,
}

impl RemoteStatusReporter {
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn document_url(&self, status: &RunStatus) -> anyhow::Result<Url> {
        join_url(
            &self.base_url,
            &format!("documents/{}", status.document_id),
        )
    }
}

#[async_trait]
impl StatusReporter for RemoteStatusReporter {
    fn name(&self) -> &str {
        "remote"
    }

    async fn report(&self, _event: &StatusEvent<'_>, status: &RunStatus) -> anyhow::Result<()> {
        let url = self.document_url(status)?;

        let response = self
            .client
            .put(url.clone())
            .json(status)
            .send()
            .await
            .with_context(|| format!("Failed to store run status at {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Status service returned HTTP {}", response.status());
        }
        Ok(())
    }
}
