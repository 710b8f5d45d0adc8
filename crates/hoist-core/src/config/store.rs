//! Settings store for locating and loading hoist.toml.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Settings, parser, paths};

#[derive(Debug, Clone)]
pub struct SettingsStore {
    config_path: PathBuf,
}

impl SettingsStore {
    /// Store for `explicit` if given, otherwise the user's global hoist.toml.
    pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = match explicit {
            Some(path) => path.to_path_buf(),
            None => paths::config_path(None, &paths::global_config_dir()?),
        };
        Ok(Self { config_path })
    }

    pub fn from_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load settings without environment overrides. A missing file yields defaults.
    pub fn load_file(&self) -> anyhow::Result<Settings> {
        if !self.config_path.exists() {
            debug!(path = %self.config_path.display(), "no config file, using defaults");
            return Ok(Settings::new());
        }
        parser::parse_settings(&self.config_path)
    }

    /// Load settings and apply process environment overrides.
    pub fn load(&self) -> anyhow::Result<Settings> {
        let mut settings = self.load_file()?;
        settings.apply_env(|name| std::env::var(name).ok());
        Ok(settings)
    }
}
