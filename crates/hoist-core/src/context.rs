//! Run configuration for an install.

/// Immutable configuration of a single install run.
///
/// Built once by the frontend from user input and handed to the installer.
/// Every decision about which stages run is derived from these fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallerContext {
    pub skip_discovery: bool,
    pub skip_infra_install: bool,
    pub skip_logging_install: bool,
    pub skip_integrations: bool,
    pub assume_yes: bool,
    pub advanced_mode: bool,
    pub recipe_names: Vec<String>,
    pub recipe_paths: Vec<String>,
}

impl InstallerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recipe_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recipe_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_recipe_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recipe_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn should_run_discovery(&self) -> bool {
        !self.skip_discovery && !self.recipe_paths_provided()
    }

    pub fn should_install_infra_agent(&self) -> bool {
        !self.skip_infra_install && !self.recipe_paths_provided()
    }

    pub fn should_install_logging(&self) -> bool {
        !self.skip_logging_install && !self.recipe_paths_provided()
    }

    /// Explicit recipe paths always install, even with integrations skipped.
    pub fn should_install_integrations(&self) -> bool {
        !self.skip_integrations || self.recipe_paths_provided()
    }

    /// Only advanced mode asks questions, and never when answers are implied.
    pub fn should_prompt(&self) -> bool {
        self.advanced_mode && !self.assume_yes && !self.recipe_names_provided()
    }

    pub fn recipe_names_provided(&self) -> bool {
        !self.recipe_names.is_empty()
    }

    pub fn recipe_paths_provided(&self) -> bool {
        !self.recipe_paths.is_empty()
    }

    pub fn recipes_provided(&self) -> bool {
        self.recipe_names_provided() || self.recipe_paths_provided()
    }
}
