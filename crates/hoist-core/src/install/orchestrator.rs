//! Core install orchestration: discovery, resolution, prerequisites,
//! integrations, validation and status reporting for one run.

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, error, warn};
use url::Url;

use crate::cancel::{Cancelled, CancellationToken, is_cancelled};
use crate::context::InstallerContext;
use crate::discovery::{Discoverer, FileFilterer};
use crate::execution::RecipeExecutor;
use crate::install::resolution::{RecipeSource, Resolver};
use crate::recipe::{
    DISCOVERED_LOG_FILES_VAR, INFRA_AGENT_RECIPE_NAME, LOGGING_RECIPE_NAME, Recipe, RecipeFetcher,
    RecipeFileFetcher, is_prerequisite,
};
use crate::status::{RecipeStatusEvent, RunStatus, StatusRollup};
use crate::types::{DiscoveryManifest, LogMatch, RecipeVars};
use crate::ux::{ProgressGuard, ProgressIndicator, Prompter};
use crate::validation::{RecipeValidator, ValidationError};

/// Everything the installer talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub discoverer: Arc<dyn Discoverer>,
    pub file_filterer: Arc<dyn FileFilterer>,
    pub recipe_fetcher: Arc<dyn RecipeFetcher>,
    pub recipe_file_fetcher: Arc<dyn RecipeFileFetcher>,
    pub recipe_executor: Arc<dyn RecipeExecutor>,
    pub recipe_validator: Arc<dyn RecipeValidator>,
    pub prompter: Arc<dyn Prompter>,
    pub progress: Arc<dyn ProgressIndicator>,
}

/// Shape of the logging configuration handed to the logging recipe.
#[derive(Debug, Serialize)]
struct LoggingConfig<'a> {
    logs: &'a [LogMatch],
}

pub struct RecipeInstaller {
    context: InstallerContext,
    collaborators: Collaborators,
    status: StatusRollup,
    cancel: CancellationToken,
    docs_search_url: Url,
}

impl RecipeInstaller {
    pub fn new(
        context: InstallerContext,
        collaborators: Collaborators,
        status: StatusRollup,
        cancel: CancellationToken,
        docs_search_url: Url,
    ) -> Self {
        Self {
            context,
            collaborators,
            status,
            cancel,
            docs_search_url,
        }
    }

    pub fn context(&self) -> &InstallerContext {
        &self.context
    }

    pub fn status(&self) -> &RunStatus {
        self.status.status()
    }

    /// Run the whole install.
    ///
    /// Completion is reported exactly once, whether the run succeeds or aborts.
    pub async fn install(&mut self) -> anyhow::Result<()> {
        self.log_context_summary();

        let result = self.run().await;
        self.status.report_complete().await;
        result
    }

    fn log_context_summary(&self) {
        let ctx = &self.context;
        debug!(context = ?ctx, "installer context");
        debug!(
            should_run_discovery = ctx.should_run_discovery(),
            should_install_infra_agent = ctx.should_install_infra_agent(),
            should_install_logging = ctx.should_install_logging(),
            should_install_integrations = ctx.should_install_integrations(),
            should_prompt = ctx.should_prompt(),
            recipes_provided = ctx.recipes_provided(),
            recipe_paths_provided = ctx.recipe_paths_provided(),
            recipe_names_provided = ctx.recipe_names_provided(),
            "context summary"
        );
    }

    async fn run(&mut self) -> anyhow::Result<()> {
        let manifest = self.discover().await?;

        let resolver = Resolver {
            cancel: &self.cancel,
            fetcher: self.collaborators.recipe_fetcher.as_ref(),
            file_fetcher: self.collaborators.recipe_file_fetcher.as_ref(),
        };
        let recipes = resolver
            .resolve(RecipeSource::for_context(&self.context), &manifest)
            .await?;

        debug!(name = INFRA_AGENT_RECIPE_NAME, "fetching recipe for install");
        let infra_agent = resolver
            .fetch_required(&manifest, INFRA_AGENT_RECIPE_NAME)
            .await?;
        debug!(name = LOGGING_RECIPE_NAME, "fetching recipe for install");
        let logging = resolver.fetch_required(&manifest, LOGGING_RECIPE_NAME).await?;

        self.status.report_recipe_available(&infra_agent).await;
        self.status.report_recipe_available(&logging).await;

        let mut for_report = Vec::with_capacity(recipes.len() + 2);
        if self.context.should_install_infra_agent() {
            for_report.push(infra_agent.clone());
        }
        if self.context.should_install_logging() {
            for_report.push(logging.clone());
        }
        for_report.extend(recipes.iter().cloned());
        self.status.report_recipes_available(&for_report).await;

        let mut infra_entity_guid = None;
        if !self.context.recipes_provided() {
            infra_entity_guid = self.install_infra_agent(&manifest, &infra_agent).await?;
            self.install_logging(&manifest, &logging, &recipes).await?;
        }

        if self.context.should_install_integrations() {
            debug!("installing integrations");
            self.install_recipes(&manifest, &recipes, infra_entity_guid.as_deref())
                .await?;
            debug!("done installing integrations");
        } else {
            debug!("skipping integrations");
            for recipe in &recipes {
                self.report_skipped(recipe).await;
            }
        }

        Ok(())
    }

    async fn discover(&self) -> anyhow::Result<DiscoveryManifest> {
        debug!("discovering system information");
        self.collaborators
            .discoverer
            .discover(&self.cancel)
            .await
            .context("there was an error discovering system info")
    }

    /// Returns the entity GUID of the installed agent, if validation produced one.
    async fn install_infra_agent(
        &mut self,
        manifest: &DiscoveryManifest,
        recipe: &Recipe,
    ) -> anyhow::Result<Option<String>> {
        if !self.context.should_install_infra_agent() {
            self.report_skipped(recipe).await;
            return Ok(None);
        }

        debug!("installing infrastructure agent");
        match self.execute_and_validate_with_progress(manifest, recipe).await {
            Ok(guid) => {
                debug!(entity_guid = ?guid, "done installing infrastructure agent");
                Ok(guid)
            }
            Err(e) => {
                error!("{}", self.fail_message(INFRA_AGENT_RECIPE_NAME));
                Err(e)
            }
        }
    }

    async fn install_logging(
        &mut self,
        manifest: &DiscoveryManifest,
        recipe: &Recipe,
        recipes: &[Recipe],
    ) -> anyhow::Result<()> {
        if !self.context.should_install_logging() {
            self.report_skipped(recipe).await;
            return Ok(());
        }

        if !self.user_accepts_install(recipe)? {
            self.report_skipped(recipe).await;
            return Ok(());
        }

        debug!("installing logging");
        if let Err(e) = self.install_logging_with_matches(manifest, recipe, recipes).await {
            error!("{}", self.fail_message(LOGGING_RECIPE_NAME));
            return Err(e);
        }
        debug!("done installing logging");
        Ok(())
    }

    async fn install_logging_with_matches(
        &mut self,
        manifest: &DiscoveryManifest,
        recipe: &Recipe,
        recipes: &[Recipe],
    ) -> anyhow::Result<()> {
        debug!(recipe_count = recipes.len(), "filtering log matches");
        let matches = self
            .collaborators
            .file_filterer
            .filter(&self.cancel, recipes)
            .await
            .context("could not discover log files")?;
        debug!(possible_matches = matches.len(), "filtered log matches");

        let mut accepted = Vec::with_capacity(matches.len());
        for log_match in matches {
            if self.user_accepts(&log_match.confirmation_message())? {
                accepted.push(log_match);
            }
        }
        debug!(accepted = accepted.len(), "log matches accepted");

        let config = serde_yaml::to_string(&LoggingConfig { logs: &accepted })
            .context("could not serialize discovered log files")?;
        let recipe = recipe.clone().with_var(DISCOVERED_LOG_FILES_VAR, config);

        self.execute_and_validate_with_progress(manifest, &recipe)
            .await
            .map(|_| ())
    }

    /// Install resolved integrations, continuing past individual failures.
    async fn install_recipes(
        &mut self,
        manifest: &DiscoveryManifest,
        recipes: &[Recipe],
        infra_entity_guid: Option<&str>,
    ) -> anyhow::Result<()> {
        debug!(
            recipe_count = recipes.len(),
            infra_entity_guid = ?infra_entity_guid,
            "installing recipes"
        );

        for recipe in recipes {
            if self.cancel.is_cancelled() {
                return Err(Cancelled).context("install interrupted");
            }

            // Prerequisites have their own install stage unless the user asked for them.
            if !self.context.recipes_provided() && is_prerequisite(&recipe.name) {
                debug!(name = %recipe.name, "skipping special recipe");
                continue;
            }

            let accepted = self.user_accepts_install(recipe)?;
            debug!(name = %recipe.name, accepted, "done prompting for install");

            if !accepted {
                self.report_skipped(recipe).await;
                continue;
            }

            debug!(name = %recipe.name, "installing recipe");
            if let Err(e) = self.execute_and_validate_with_progress(manifest, recipe).await {
                if is_cancelled(&e) {
                    return Err(e);
                }
                warn!("{:#}", e);
                warn!("{}", self.fail_message(&recipe.name));
            }
        }

        debug!("done installing recipes");
        Ok(())
    }

    async fn execute_and_validate_with_progress(
        &mut self,
        manifest: &DiscoveryManifest,
        recipe: &Recipe,
    ) -> anyhow::Result<Option<String>> {
        let vars = match self
            .collaborators
            .recipe_executor
            .prepare(&self.cancel, manifest, recipe, self.context.assume_yes)
            .await
        {
            Ok(vars) => vars,
            Err(e) => {
                let msg = format!("could not prepare recipe {}: {:#}", recipe.name, e);
                self.report_failed(recipe, msg).await;
                return Err(e.context(format!("could not prepare recipe {}", recipe.name)));
            }
        };

        let progress = Arc::clone(&self.collaborators.progress);
        let guard = ProgressGuard::start(progress.as_ref(), &format!("Installing {}", recipe.name));
        self.status
            .report_recipe_installing(&RecipeStatusEvent::new(recipe.clone()))
            .await;

        match self.execute_and_validate(manifest, recipe, &vars).await {
            Ok(guid) => {
                guard.success();
                Ok(guid)
            }
            Err(e) => {
                guard.fail();
                Err(e.context(format!("could not install recipe {}", recipe.name)))
            }
        }
    }

    async fn execute_and_validate(
        &mut self,
        manifest: &DiscoveryManifest,
        recipe: &Recipe,
        vars: &RecipeVars,
    ) -> anyhow::Result<Option<String>> {
        let executed = self
            .collaborators
            .recipe_executor
            .execute(&self.cancel, manifest, recipe, vars)
            .await;
        if let Err(e) = executed {
            let msg = format!(
                "encountered an error while executing {}: {:#}",
                recipe.name, e
            );
            self.report_failed(recipe, msg).await;
            return Err(e.context(format!(
                "encountered an error while executing {}",
                recipe.name
            )));
        }

        if !recipe.has_validation() {
            debug!(name = %recipe.name, "validation skipped, recipe has no validation query");
            return Ok(None);
        }

        let validated = self
            .collaborators
            .recipe_validator
            .validate(&self.cancel, manifest, recipe)
            .await;
        match validated {
            Ok(guid) => {
                let mut event = RecipeStatusEvent::new(recipe.clone());
                if let Some(guid) = &guid {
                    event = event.with_entity_guid(guid.as_str());
                }
                self.status.report_recipe_installed(&event).await;
                Ok(guid)
            }
            Err(err) => {
                let msg = format!(
                    "encountered an error while validating receipt of data for {}: {}",
                    recipe.name, err
                );
                self.report_failed(recipe, msg).await;

                let cause = match err {
                    ValidationError::Cancelled => anyhow::Error::from(Cancelled),
                    other => anyhow::Error::from(other),
                };
                Err(cause.context(format!(
                    "encountered an error while validating receipt of data for {}",
                    recipe.name
                )))
            }
        }
    }

    fn user_accepts(&self, msg: &str) -> anyhow::Result<bool> {
        if !self.context.should_prompt() {
            return Ok(true);
        }

        self.collaborators
            .prompter
            .prompt_yes_no(msg)
            .context("error prompting user")
    }

    fn user_accepts_install(&self, recipe: &Recipe) -> anyhow::Result<bool> {
        if !self.context.should_prompt() {
            return Ok(true);
        }

        debug!(
            name = %recipe.name,
            display_name = %recipe.display_name,
            "prompting user for install confirmation"
        );
        self.user_accepts(&format!("Would you like to enable {}?", recipe.label()))
    }

    async fn report_skipped(&mut self, recipe: &Recipe) {
        self.status
            .report_recipe_skipped(&RecipeStatusEvent::new(recipe.clone()))
            .await;
    }

    async fn report_failed(&mut self, recipe: &Recipe, msg: String) {
        self.status
            .report_recipe_failed(&RecipeStatusEvent::new(recipe.clone()).with_msg(msg))
            .await;
    }

    /// Remediation hint pointing at a docs search for `component`.
    pub fn fail_message(&self, component: &str) -> String {
        let mut search = self.docs_search_url.clone();
        search.query_pairs_mut().append_pair("query", component);

        format!(
            "execution of {} failed, please see the following link for clues on how to resolve the issue: {}",
            component, search
        )
    }
}
