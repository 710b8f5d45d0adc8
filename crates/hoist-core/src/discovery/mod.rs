//! Host discovery and discovery-driven filtering.
//!
//! A [`Discoverer`] produces the [`DiscoveryManifest`] every later stage reads.
//! Process and log file filterers narrow raw host state down to what the
//! known recipes care about.

pub mod file_filter;
pub mod process_filter;
pub mod host;

use async_trait::async_trait;

use crate::cancel::CancellationToken;
use crate::recipe::Recipe;
use crate::types::{DiscoveryManifest, LogMatch, ProcessInfo};

pub use file_filter::GlobFileFilterer;
pub use process_filter::RegexProcessFilterer;
pub use host::SysinfoDiscoverer;

#[async_trait]
pub trait Discoverer: Send + Sync {
    async fn discover(&self, cancel: &CancellationToken) -> anyhow::Result<DiscoveryManifest>;
}

#[async_trait]
pub trait ProcessFilterer: Send + Sync {
    /// Keep only the processes some recipe could instrument.
    async fn filter(
        &self,
        cancel: &CancellationToken,
        processes: Vec<ProcessInfo>,
    ) -> anyhow::Result<Vec<ProcessInfo>>;
}

#[async_trait]
pub trait FileFilterer: Send + Sync {
    /// Log match candidates from `recipes` that point at files present on this host.
    async fn filter(
        &self,
        cancel: &CancellationToken,
        recipes: &[Recipe],
    ) -> anyhow::Result<Vec<LogMatch>>;
}
