//! Recipe execution.

pub mod shell;

use async_trait::async_trait;

use crate::cancel::CancellationToken;
use crate::recipe::Recipe;
use crate::types::{DiscoveryManifest, RecipeVars};

pub use shell::ShellRecipeExecutor;

#[async_trait]
pub trait RecipeExecutor: Send + Sync {
    /// Resolve every variable the recipe's steps will see.
    async fn prepare(
        &self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
        recipe: &Recipe,
        assume_yes: bool,
    ) -> anyhow::Result<RecipeVars>;

    /// Run the recipe's install steps in order, stopping at the first failure.
    async fn execute(
        &self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
        recipe: &Recipe,
        vars: &RecipeVars,
    ) -> anyhow::Result<()>;
}
