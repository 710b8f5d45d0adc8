//! Fan-out of status events to every registered reporter.

use std::time::Duration;

use tracing::{debug, warn};

use super::{RecipeState, RecipeStatusEvent, RunStatus, StatusEvent, StatusReporter};
use crate::recipe::Recipe;

pub const DEFAULT_SINK_TIMEOUT: Duration = Duration::from_secs(10);

/// Keeps the run snapshot and forwards each event to all reporters in
/// registration order.
///
/// Reporter failures and timeouts are logged and never surface to the caller.
pub struct StatusRollup {
    reporters: Vec<Box<dyn StatusReporter>>,
    sink_timeout: Duration,
    status: RunStatus,
}

impl StatusRollup {
    pub fn new(reporters: Vec<Box<dyn StatusReporter>>) -> Self {
        Self {
            reporters,
            sink_timeout: DEFAULT_SINK_TIMEOUT,
            status: RunStatus::new(),
        }
    }

    pub fn with_sink_timeout(mut self, timeout: Duration) -> Self {
        self.sink_timeout = timeout;
        self
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn reporter_names(&self) -> Vec<&str> {
        self.reporters.iter().map(|r| r.name()).collect()
    }

    /// Track and announce recipes not seen before in this run.
    pub async fn report_recipes_available(&mut self, recipes: &[Recipe]) {
        let fresh: Vec<Recipe> = recipes
            .iter()
            .filter(|r| self.status.track_available(r))
            .cloned()
            .collect();

        if fresh.is_empty() {
            return;
        }
        self.broadcast(StatusEvent::RecipesAvailable(&fresh)).await;
    }

    pub async fn report_recipe_available(&mut self, recipe: &Recipe) {
        if !self.status.track_available(recipe) {
            debug!(name = %recipe.name, "recipe already tracked");
            return;
        }
        self.broadcast(StatusEvent::RecipeAvailable(recipe)).await;
    }

    pub async fn report_recipe_installing(&mut self, event: &RecipeStatusEvent) {
        self.status.transition(event, RecipeState::Installing);
        self.broadcast(StatusEvent::RecipeInstalling(event)).await;
    }

    pub async fn report_recipe_installed(&mut self, event: &RecipeStatusEvent) {
        self.status.transition(event, RecipeState::Installed);
        self.broadcast(StatusEvent::RecipeInstalled(event)).await;
    }

    pub async fn report_recipe_failed(&mut self, event: &RecipeStatusEvent) {
        self.status.transition(event, RecipeState::Failed);
        self.broadcast(StatusEvent::RecipeFailed(event)).await;
    }

    pub async fn report_recipe_skipped(&mut self, event: &RecipeStatusEvent) {
        self.status.transition(event, RecipeState::Skipped);
        self.broadcast(StatusEvent::RecipeSkipped(event)).await;
    }

    /// Mark the run complete. Only the first call is broadcast.
    pub async fn report_complete(&mut self) {
        if self.status.complete {
            debug!("run already reported complete");
            return;
        }
        self.status.complete = true;
        self.broadcast(StatusEvent::Complete).await;
    }

    async fn broadcast(&self, event: StatusEvent<'_>) {
        for reporter in &self.reporters {
            let result =
                tokio::time::timeout(self.sink_timeout, reporter.report(&event, &self.status))
                    .await;

            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(
                    reporter = reporter.name(),
                    event = event.kind(),
                    error = %format!("{:#}", e),
                    "status reporter failed"
                ),
                Err(_) => warn!(
                    reporter = reporter.name(),
                    event = event.kind(),
                    timeout_secs = self.sink_timeout.as_secs(),
                    "status reporter timed out"
                ),
            }
        }
    }
}
