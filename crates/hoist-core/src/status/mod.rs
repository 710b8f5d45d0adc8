//! Install run status: recipe lifecycle events, the run snapshot, and the
//! reporters events are fanned out to.

pub mod remote;
pub mod rollup;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recipe::Recipe;

pub use remote::RemoteStatusReporter;
pub use rollup::StatusRollup;

// =============================================================================
// Events
// =============================================================================

/// Lifecycle state of a single recipe within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipeState {
    Available,
    Installing,
    Installed,
    Failed,
    Skipped,
}

impl RecipeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeState::Available => "AVAILABLE",
            RecipeState::Installing => "INSTALLING",
            RecipeState::Installed => "INSTALLED",
            RecipeState::Failed => "FAILED",
            RecipeState::Skipped => "SKIPPED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeStatusEvent {
    pub recipe: Recipe,
    pub msg: Option<String>,
    pub entity_guid: Option<String>,
}

impl RecipeStatusEvent {
    pub fn new(recipe: Recipe) -> Self {
        Self {
            recipe,
            msg: None,
            entity_guid: None,
        }
    }

    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    pub fn with_entity_guid(mut self, guid: impl Into<String>) -> Self {
        self.entity_guid = Some(guid.into());
        self
    }
}

/// Event broadcast to every [`StatusReporter`].
#[derive(Debug, Clone, Copy)]
pub enum StatusEvent<'a> {
    RecipesAvailable(&'a [Recipe]),
    RecipeAvailable(&'a Recipe),
    RecipeInstalling(&'a RecipeStatusEvent),
    RecipeInstalled(&'a RecipeStatusEvent),
    RecipeFailed(&'a RecipeStatusEvent),
    RecipeSkipped(&'a RecipeStatusEvent),
    Complete,
}

impl StatusEvent<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            StatusEvent::RecipesAvailable(_) => "recipes_available",
            StatusEvent::RecipeAvailable(_) => "recipe_available",
            StatusEvent::RecipeInstalling(_) => "recipe_installing",
            StatusEvent::RecipeInstalled(_) => "recipe_installed",
            StatusEvent::RecipeFailed(_) => "recipe_failed",
            StatusEvent::RecipeSkipped(_) => "recipe_skipped",
            StatusEvent::Complete => "complete",
        }
    }
}

// =============================================================================
// Run snapshot
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeStatus {
    pub name: String,
    pub display_name: String,
    pub state: RecipeState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_guid: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregated state of one install run, one entry per recipe in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub document_id: String,
    pub started_at: DateTime<Utc>,
    pub complete: bool,
    pub statuses: Vec<RecipeStatus>,
}

impl RunStatus {
    pub fn new() -> Self {
        let started_at = Utc::now();
        Self {
            document_id: format!(
                "{}-{}",
                started_at.format("%Y%m%dT%H%M%S%3f"),
                std::process::id()
            ),
            started_at,
            complete: false,
            statuses: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RecipeStatus> {
        self.statuses.iter().find(|s| s.name == name)
    }

    pub fn is_tracked(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn count(&self, state: RecipeState) -> usize {
        self.statuses.iter().filter(|s| s.state == state).count()
    }

    /// Start tracking `recipe` as available. No-op for tracked recipes.
    ///
    /// Returns whether the recipe was newly tracked.
    pub fn track_available(&mut self, recipe: &Recipe) -> bool {
        if self.is_tracked(&recipe.name) {
            return false;
        }
        self.statuses.push(RecipeStatus {
            name: recipe.name.clone(),
            display_name: recipe.display_name.clone(),
            state: RecipeState::Available,
            error: None,
            entity_guid: None,
            updated_at: Utc::now(),
        });
        true
    }

    /// Move the event's recipe into `state`, tracking it if needed.
    pub fn transition(&mut self, event: &RecipeStatusEvent, state: RecipeState) {
        let now = Utc::now();
        let error = match state {
            RecipeState::Failed => event.msg.clone(),
            _ => None,
        };

        match self
            .statuses
            .iter_mut()
            .find(|s| s.name == event.recipe.name)
        {
            Some(status) => {
                status.state = state;
                status.error = error;
                if event.entity_guid.is_some() {
                    status.entity_guid = event.entity_guid.clone();
                }
                status.updated_at = now;
            }
            None => self.statuses.push(RecipeStatus {
                name: event.recipe.name.clone(),
                display_name: event.recipe.display_name.clone(),
                state,
                error,
                entity_guid: event.entity_guid.clone(),
                updated_at: now,
            }),
        }
    }
}

impl Default for RunStatus {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Reporters
// =============================================================================

/// A sink for run status events.
///
/// `status` is the run snapshot with `event` already applied.
#[async_trait]
pub trait StatusReporter: Send + Sync {
    fn name(&self) -> &str;

    async fn report(&self, event: &StatusEvent<'_>, status: &RunStatus) -> anyhow::Result<()>;
}
