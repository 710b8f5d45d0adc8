//! Shared core types used across discovery, resolution and execution.

mod platform;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use platform::{Platform, PlatformFamily};

/// A process observed on the host during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    /// Full command line, arguments joined by spaces.
    pub cmdline: String,
}

/// Snapshot of host facts and running processes.
///
/// Built once by a [`Discoverer`](crate::discovery::Discoverer) and shared
/// read-only by every later stage of an install run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryManifest {
    pub hostname: String,
    pub kernel_arch: String,
    pub kernel_version: String,
    pub os: String,
    pub platform: Option<Platform>,
    pub platform_family: Option<PlatformFamily>,
    pub platform_version: String,
    #[serde(default)]
    pub(crate) processes: Vec<ProcessInfo>,
}

impl DiscoveryManifest {
    /// Set platform fields from raw discovery strings.
    ///
    /// Values outside the known vocabularies are discarded.
    pub fn with_platform(mut self, platform: &str, family: &str) -> Self {
        self.platform = Platform::parse(platform);
        self.platform_family = PlatformFamily::parse(family);
        self
    }

    pub fn add_process(&mut self, process: ProcessInfo) {
        self.processes.push(process);
    }

    pub fn processes(&self) -> &[ProcessInfo] {
        &self.processes
    }
}

/// Candidate log file pattern for the logging recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMatch {
    pub name: String,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systemd: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl LogMatch {
    /// Message shown when asking whether to tail files matching this pattern.
    pub fn confirmation_message(&self) -> String {
        format!(
            "Files have been found at the following pattern: {} Do you want to watch them?",
            self.file
        )
    }
}

/// Variables prepared for a recipe execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeVars(BTreeMap<String, String>);

impl RecipeVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace `{{NAME}}` placeholders with variable values.
    ///
    /// Placeholders without a matching variable are left as-is.
    pub fn render(&self, template: &str) -> String {
        let mut out = template.to_string();
        for (key, value) in &self.0 {
            let placeholder = format!("{{{{{key}}}}}");
            if out.contains(&placeholder) {
                out = out.replace(&placeholder, value);
            }
        }
        out
    }
}

impl FromIterator<(String, String)> for RecipeVars {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_platform_discards_unknown_values() {
        let manifest = DiscoveryManifest::default().with_platform("darwin", "bsd");
        assert_eq!(manifest.platform, None);
        assert_eq!(manifest.platform_family, None);

        let manifest = DiscoveryManifest::default().with_platform("ubuntu", "debian");
        assert_eq!(manifest.platform, Some(Platform::Ubuntu));
        assert_eq!(manifest.platform_family, Some(PlatformFamily::Debian));
    }

    #[test]
    fn test_add_process_accumulates() {
        let mut manifest = DiscoveryManifest::default();
        manifest.add_process(ProcessInfo {
            pid: 1,
            name: "nginx".to_string(),
            cmdline: "nginx -g daemon off;".to_string(),
        });
        manifest.add_process(ProcessInfo {
            pid: 2,
            name: "mysqld".to_string(),
            cmdline: "/usr/sbin/mysqld".to_string(),
        });
        assert_eq!(manifest.processes().len(), 2);
        assert_eq!(manifest.processes()[1].name, "mysqld");
    }

    #[test]
    fn test_render_substitutes_known_vars() {
        let mut vars = RecipeVars::new();
        vars.insert("HOSTNAME", "web-1");
        let rendered = vars.render("SELECT count(*) FROM Log WHERE hostname = '{{HOSTNAME}}' AND x = '{{OTHER}}'");
        assert_eq!(
            rendered,
            "SELECT count(*) FROM Log WHERE hostname = 'web-1' AND x = '{{OTHER}}'"
        );
    }

    #[test]
    fn test_log_match_confirmation_message() {
        let m = LogMatch {
            name: "nginx".to_string(),
            file: "/var/log/nginx/*.log".to_string(),
            pattern: None,
            systemd: None,
            attributes: BTreeMap::new(),
        };
        assert!(m.confirmation_message().contains("/var/log/nginx/*.log"));
    }
}
