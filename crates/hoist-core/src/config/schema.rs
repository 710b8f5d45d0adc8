//! Configuration schema for hoist.toml

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable that overrides `service.api_key`.
pub const API_KEY_ENV: &str = "HOIST_API_KEY";

/// Root configuration structure for hoist.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Remote service endpoints and credentials
    #[serde(default)]
    pub service: ServiceSettings,

    /// Validation polling
    #[serde(default)]
    pub validation: ValidationSettings,

    /// Status reporting
    #[serde(default)]
    pub status: StatusSettings,

    /// Extra variables passed to every recipe
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSettings {
    #[serde(default = "default_recipe_url")]
    pub recipe_url: String,

    #[serde(default = "default_query_url")]
    pub query_url: String,

    /// Remote status documents are only written when this is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_docs_search_url")]
    pub docs_search_url: String,
}

fn default_recipe_url() -> String {
    "https://api.hoist.sh/v1".to_string()
}

fn default_query_url() -> String {
    "https://api.hoist.sh/v1".to_string()
}

fn default_docs_search_url() -> String {
    "https://docs.hoist.sh/search".to_string()
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            recipe_url: default_recipe_url(),
            query_url: default_query_url(),
            status_url: None,
            api_key: None,
            docs_search_url: default_docs_search_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_interval_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ValidationSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSettings {
    #[serde(default = "default_sink_timeout_secs")]
    pub sink_timeout_secs: u64,
}

fn default_sink_timeout_secs() -> u64 {
    10
}

impl Default for StatusSettings {
    fn default() -> Self {
        Self {
            sink_timeout_secs: default_sink_timeout_secs(),
        }
    }
}

impl StatusSettings {
    pub fn sink_timeout(&self) -> Duration {
        Duration::from_secs(self.sink_timeout_secs)
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.recipe_url()?;
        self.query_url()?;
        self.status_url()?;
        self.docs_search_url()?;

        if self.validation.interval_secs == 0 {
            anyhow::bail!("validation.interval_secs must be greater than zero");
        }
        if self.validation.timeout_secs == 0 {
            anyhow::bail!("validation.timeout_secs must be greater than zero");
        }
        if self.validation.interval_secs > self.validation.timeout_secs {
            anyhow::bail!("validation.interval_secs must not exceed validation.timeout_secs");
        }
        if self.status.sink_timeout_secs == 0 {
            anyhow::bail!("status.sink_timeout_secs must be greater than zero");
        }

        for key in self.vars.keys() {
            if key.is_empty() || key.contains(['=', '\0']) {
                anyhow::bail!("Invalid variable name in [vars]: '{}'", key);
            }
        }

        Ok(())
    }

    /// Apply environment overrides, looking variables up with `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.service.api_key = Some(key);
        }
    }

    pub fn recipe_url(&self) -> anyhow::Result<Url> {
        parse_url("service.recipe_url", &self.service.recipe_url)
    }

    pub fn query_url(&self) -> anyhow::Result<Url> {
        parse_url("service.query_url", &self.service.query_url)
    }

    pub fn status_url(&self) -> anyhow::Result<Option<Url>> {
        self.service
            .status_url
            .as_deref()
            .map(|raw| parse_url("service.status_url", raw))
            .transpose()
    }

    pub fn docs_search_url(&self) -> anyhow::Result<Url> {
        parse_url("service.docs_search_url", &self.service.docs_search_url)
    }
}

fn parse_url(field: &str, raw: &str) -> anyhow::Result<Url> {
    Url::parse(raw).with_context(|| format!("Invalid URL for {}: '{}'", field, raw))
}
