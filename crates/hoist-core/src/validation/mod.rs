//! Post-install validation: wait until the installed component reports data.

pub mod polling;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::cancel::CancellationToken;
use crate::recipe::Recipe;
use crate::types::DiscoveryManifest;

pub use polling::{HttpTelemetryQuery, PollingRecipeValidator, QueryRow, TelemetryQuery};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no data received within {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("validation cancelled")]
    Cancelled,
    #[error("telemetry query failed: {0}")]
    Backend(String),
}

#[async_trait]
pub trait RecipeValidator: Send + Sync {
    /// Returns the entity GUID reporting data for `recipe`, if the backend
    /// attached one to the matching row.
    async fn validate(
        &self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
        recipe: &Recipe,
    ) -> Result<Option<String>, ValidationError>;
}
