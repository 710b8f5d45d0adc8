//! Recipe model and recipe resolution collaborators.
//!
//! A recipe describes how to install one piece of instrumentation and how to
//! confirm it is producing telemetry. Recipes come from the recipe service
//! (by name or recommendation) or from recipe files on disk or over HTTP.

pub mod fetcher;
pub mod file;
pub mod file_fetcher;

use std::collections::BTreeMap;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::types::LogMatch;

pub use fetcher::{RecipeFetcher, ServiceRecipeFetcher};
pub use file::{RecipeFile, RecipeFileError};
pub use file_fetcher::{HttpRecipeFileFetcher, RecipeFileFetcher, RecipeLocation};

/// Name of the infrastructure agent prerequisite recipe.
pub const INFRA_AGENT_RECIPE_NAME: &str = "infrastructure-agent-installer";

/// Name of the logging prerequisite recipe.
pub const LOGGING_RECIPE_NAME: &str = "logs-integration";

/// Variable the accepted log matches are injected under.
pub const DISCOVERED_LOG_FILES_VAR: &str = "DISCOVERED_LOG_FILES";

/// Returns true for the recipes installed ahead of generic integrations.
pub fn is_prerequisite(name: &str) -> bool {
    name == INFRA_AGENT_RECIPE_NAME || name == LOGGING_RECIPE_NAME
}

/// A single install step, run through the platform shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallStep {
    #[serde(default)]
    pub name: Option<String>,
    pub run: String,
}

/// A variable the recipe expects to be supplied at prepare time.
///
/// Resolved from the environment, then the prepared vars, then `default`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputVar {
    pub name: String,
    #[serde(default)]
    pub default: Option<String>,
}

/// Installable instrumentation definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: Option<Version>,
    /// Telemetry presence query. Empty means the recipe is not validated.
    #[serde(default)]
    pub validation_nrql: String,
    #[serde(default)]
    pub install_steps: Vec<InstallStep>,
    #[serde(default)]
    pub process_match: Vec<String>,
    #[serde(default)]
    pub log_match: Vec<LogMatch>,
    #[serde(default)]
    pub input_vars: Vec<InputVar>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    vars: BTreeMap<String, String>,
}

impl Recipe {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: String::new(),
            version: None,
            validation_nrql: String::new(),
            install_steps: Vec::new(),
            process_match: Vec::new(),
            log_match: Vec::new(),
            input_vars: Vec::new(),
            vars: BTreeMap::new(),
        }
    }

    pub fn with_validation_nrql(mut self, nrql: impl Into<String>) -> Self {
        self.validation_nrql = nrql.into();
        self
    }

    pub fn with_step(mut self, run: impl Into<String>) -> Self {
        self.install_steps.push(InstallStep {
            name: None,
            run: run.into(),
        });
        self
    }

    pub fn with_log_match(mut self, log_match: LogMatch) -> Self {
        self.log_match.push(log_match);
        self
    }

    pub fn with_process_match(mut self, pattern: impl Into<String>) -> Self {
        self.process_match.push(pattern.into());
        self
    }

    /// Return a copy of this recipe with `key` set to `value`.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    pub fn has_validation(&self) -> bool {
        !self.validation_nrql.trim().is_empty()
    }

    /// Label used in prompts and terminal output.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}
