//! Fixed platform vocabularies understood by the recipe service.
//!
//! Host discovery reports free-form strings; only values from these
//! vocabularies make it into a manifest. Anything else is dropped so recipe
//! matching never sees a platform it cannot reason about.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating system platform a recipe can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Amazon,
    Centos,
    Debian,
    Redhat,
    Suse,
    Ubuntu,
    Windows,
}

impl Platform {
    pub const ALL: [Platform; 7] = [
        Platform::Amazon,
        Platform::Centos,
        Platform::Debian,
        Platform::Redhat,
        Platform::Suse,
        Platform::Ubuntu,
        Platform::Windows,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Amazon => "amazon",
            Platform::Centos => "centos",
            Platform::Debian => "debian",
            Platform::Redhat => "redhat",
            Platform::Suse => "suse",
            Platform::Ubuntu => "ubuntu",
            Platform::Windows => "windows",
        }
    }

    /// Membership check against the vocabulary. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform family (package ecosystem) a recipe can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    Debian,
    Rhel,
    Suse,
}

impl PlatformFamily {
    pub const ALL: [PlatformFamily; 3] = [
        PlatformFamily::Debian,
        PlatformFamily::Rhel,
        PlatformFamily::Suse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformFamily::Debian => "debian",
            PlatformFamily::Rhel => "rhel",
            PlatformFamily::Suse => "suse",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
