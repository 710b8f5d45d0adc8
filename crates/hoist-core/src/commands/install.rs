//! Install command implementation.
//!
//! Wires the HTTP, host and shell backends from settings into a
//! [`RecipeInstaller`] and runs it once.

use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::config::Settings;
use crate::context::InstallerContext;
use crate::discovery::{GlobFileFilterer, RegexProcessFilterer, SysinfoDiscoverer};
use crate::execution::ShellRecipeExecutor;
use crate::http::build_client;
use crate::install::{Collaborators, RecipeInstaller};
use crate::recipe::{HttpRecipeFileFetcher, RecipeFetcher, ServiceRecipeFetcher};
use crate::status::{RecipeState, RemoteStatusReporter, RunStatus, StatusReporter, StatusRollup};
use crate::ux::{ProgressIndicator, Prompter};
use crate::validation::{HttpTelemetryQuery, PollingRecipeValidator};

/// Report from a finished install run
#[derive(Debug, Clone)]
pub struct InstallReport {
    /// Final snapshot of every recipe the run touched
    pub status: RunStatus,
}

impl InstallReport {
    pub fn installed(&self) -> usize {
        self.status.count(RecipeState::Installed)
    }

    pub fn failed(&self) -> usize {
        self.status.count(RecipeState::Failed)
    }

    pub fn skipped(&self) -> usize {
        self.status.count(RecipeState::Skipped)
    }
}

/// Install command orchestrator
pub struct InstallCommand {
    settings: Settings,
    prompter: Arc<dyn Prompter>,
    progress: Arc<dyn ProgressIndicator>,
    reporters: Vec<Box<dyn StatusReporter>>,
}

impl InstallCommand {
    pub fn new(
        settings: Settings,
        prompter: Arc<dyn Prompter>,
        progress: Arc<dyn ProgressIndicator>,
    ) -> Self {
        Self {
            settings,
            prompter,
            progress,
            reporters: Vec::new(),
        }
    }

    /// Add a status reporter. Reporters receive events in the order added,
    /// after the remote reporter when one is configured.
    pub fn with_reporter(mut self, reporter: Box<dyn StatusReporter>) -> Self {
        self.reporters.push(reporter);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run a full install for `context`.
    ///
    /// The returned error is the run's fatal error, if any. Integration
    /// failures are recorded in the report instead.
    pub async fn execute(
        self,
        context: InstallerContext,
        cancel: CancellationToken,
    ) -> anyhow::Result<InstallReport> {
        self.settings.validate().context("Invalid settings")?;

        let client = build_client(self.settings.service.api_key.as_deref())?;
        let collaborators = self.collaborators(&client)?;
        let docs_search_url = self.settings.docs_search_url()?;
        let status = status_rollup(&self.settings, &client, self.reporters)?;

        info!(
            reporters = ?status.reporter_names(),
            "starting install"
        );

        let mut installer =
            RecipeInstaller::new(context, collaborators, status, cancel, docs_search_url);
        installer.install().await?;

        Ok(InstallReport {
            status: installer.status().clone(),
        })
    }

    fn collaborators(&self, client: &reqwest::Client) -> anyhow::Result<Collaborators> {
        let recipe_fetcher: Arc<dyn RecipeFetcher> = Arc::new(ServiceRecipeFetcher::new(
            client.clone(),
            self.settings.recipe_url()?,
        ));
        let process_filterer = Arc::new(RegexProcessFilterer::new(Arc::clone(&recipe_fetcher)));
        let query = Arc::new(HttpTelemetryQuery::new(
            client.clone(),
            self.settings.query_url()?,
        ));
        let validator = PollingRecipeValidator::new(query)
            .with_interval(self.settings.validation.interval())
            .with_timeout(self.settings.validation.timeout());

        Ok(Collaborators {
            discoverer: Arc::new(SysinfoDiscoverer::new(process_filterer)),
            file_filterer: Arc::new(GlobFileFilterer::new()),
            recipe_fetcher,
            recipe_file_fetcher: Arc::new(HttpRecipeFileFetcher::new(client.clone())),
            recipe_executor: Arc::new(
                ShellRecipeExecutor::new().with_extra_vars(self.settings.vars.clone()),
            ),
            recipe_validator: Arc::new(validator),
            prompter: Arc::clone(&self.prompter),
            progress: Arc::clone(&self.progress),
        })
    }
}

/// Build the rollup: the remote reporter first when configured, then `extra`.
fn status_rollup(
    settings: &Settings,
    client: &reqwest::Client,
    extra: Vec<Box<dyn StatusReporter>>,
) -> anyhow::Result<StatusRollup> {
    let mut reporters: Vec<Box<dyn StatusReporter>> = Vec::with_capacity(extra.len() + 1);
    match settings.status_url()? {
        Some(url) => {
            debug!(url = %url, "remote status reporting enabled");
            reporters.push(Box::new(RemoteStatusReporter::new(client.clone(), url)));
        }
        None => debug!("remote status reporting disabled"),
    }
    reporters.extend(extra);

    Ok(StatusRollup::new(reporters).with_sink_timeout(settings.status.sink_timeout()))
}
