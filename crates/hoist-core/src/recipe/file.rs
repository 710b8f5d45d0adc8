//! Recipe file parsing.
//!
//! Recipe files are YAML documents. They are parsed into [`RecipeFile`] and
//! then finalized into a [`Recipe`] once the contents are validated.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{InputVar, InstallStep, Recipe};
use crate::types::LogMatch;

#[derive(Debug, Error)]
pub enum RecipeFileError {
    #[error("failed to read recipe file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse recipe file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid recipe '{name}': {reason}")]
    Invalid { name: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSection {
    #[serde(default)]
    pub steps: Vec<InstallStep>,
}

/// On-disk representation of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeFile {
    pub name: String,
    #[serde(default, alias = "displayName")]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub install: InstallSection,
    #[serde(default, alias = "validationNrql")]
    pub validation_nrql: String,
    #[serde(default, alias = "processMatch")]
    pub process_match: Vec<String>,
    #[serde(default, alias = "logMatch")]
    pub log_match: Vec<LogMatch>,
    #[serde(default, alias = "inputVars")]
    pub input_vars: Vec<InputVar>,
}

impl RecipeFile {
    pub fn parse(content: &str) -> Result<Self, RecipeFileError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Validate and convert into a [`Recipe`].
    pub fn to_recipe(&self) -> Result<Recipe, RecipeFileError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(self.invalid("recipe name must not be empty"));
        }

        if self.install.steps.is_empty() {
            return Err(self.invalid("recipe has no install steps"));
        }

        if let Some(step) = self.install.steps.iter().find(|s| s.run.trim().is_empty()) {
            let label = step.name.as_deref().unwrap_or("<unnamed>");
            return Err(self.invalid(&format!("install step {label} has an empty command")));
        }

        let version = match self.version.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Some(
                semver::Version::parse(v)
                    .map_err(|e| self.invalid(&format!("invalid version '{v}': {e}")))?,
            ),
            _ => None,
        };

        let mut recipe = Recipe::new(name, self.display_name.trim());
        recipe.description = self.description.clone();
        recipe.version = version;
        recipe.validation_nrql = self.validation_nrql.clone();
        recipe.install_steps = self.install.steps.clone();
        recipe.process_match = self.process_match.clone();
        recipe.log_match = self.log_match.clone();
        recipe.input_vars = self.input_vars.clone();

        Ok(recipe)
    }

    fn invalid(&self, reason: &str) -> RecipeFileError {
        RecipeFileError::Invalid {
            name: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}
