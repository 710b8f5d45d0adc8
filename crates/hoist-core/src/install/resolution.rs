//! Which recipes a run installs.
//!
//! Explicit paths win over explicit names, names win over recommendations,
//! and recommendations are only requested when discovery is enabled.

use anyhow::Context;
use tracing::{debug, warn};

use crate::cancel::{CancellationToken, is_cancelled};
use crate::context::InstallerContext;
use crate::recipe::{Recipe, RecipeFetcher, RecipeFileFetcher, RecipeLocation};
use crate::types::DiscoveryManifest;

/// Where a run's recipes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeSource<'a> {
    Paths(&'a [String]),
    Names(&'a [String]),
    Recommendations,
    Nothing,
}

impl<'a> RecipeSource<'a> {
    pub fn for_context(ctx: &'a InstallerContext) -> Self {
        if ctx.recipe_paths_provided() {
            RecipeSource::Paths(&ctx.recipe_paths)
        } else if ctx.recipe_names_provided() {
            RecipeSource::Names(&ctx.recipe_names)
        } else if ctx.should_run_discovery() {
            RecipeSource::Recommendations
        } else {
            RecipeSource::Nothing
        }
    }
}

/// Recipe lookups used during resolution.
pub struct Resolver<'a> {
    pub cancel: &'a CancellationToken,
    pub fetcher: &'a dyn RecipeFetcher,
    pub file_fetcher: &'a dyn RecipeFileFetcher,
}

impl Resolver<'_> {
    /// Resolve the recipes for `source`.
    ///
    /// Path and recommendation failures are fatal. A name that fails to
    /// resolve is logged and left out.
    pub async fn resolve(
        &self,
        source: RecipeSource<'_>,
        manifest: &DiscoveryManifest,
    ) -> anyhow::Result<Vec<Recipe>> {
        match source {
            RecipeSource::Paths(paths) => {
                let mut recipes = Vec::with_capacity(paths.len());
                for path in paths {
                    debug!(path = %path, "loading recipe from path");
                    let recipe = self.recipe_from_path(path).await?;
                    debug!(
                        name = %recipe.name,
                        display_name = %recipe.display_name,
                        path = %path,
                        "found recipe at path"
                    );
                    recipes.push(recipe);
                }
                Ok(recipes)
            }
            RecipeSource::Names(names) => {
                let mut recipes = Vec::with_capacity(names.len());
                for name in names {
                    if let Some(recipe) = self.fetch_named(manifest, name).await? {
                        recipes.push(recipe);
                    }
                }
                Ok(recipes)
            }
            RecipeSource::Recommendations => {
                debug!("fetching recommended recipes");
                let recipes = self
                    .fetcher
                    .fetch_recommendations(self.cancel, manifest)
                    .await
                    .context("error retrieving recipe recommendations")?;

                if recipes.is_empty() {
                    debug!("no available integrations found");
                }
                debug!(recipe_count = recipes.len(), "recipes received");
                Ok(recipes)
            }
            RecipeSource::Nothing => Ok(Vec::new()),
        }
    }

    /// Load and finalize a recipe from a local path or an http(s) URL.
    pub async fn recipe_from_path(&self, raw: &str) -> anyhow::Result<Recipe> {
        let file = match RecipeLocation::parse(raw) {
            RecipeLocation::Remote(url) => self
                .file_fetcher
                .fetch_recipe_file(self.cancel, &url)
                .await
                .with_context(|| format!("could not fetch file {}", raw))?,
            RecipeLocation::Local(path) => self
                .file_fetcher
                .load_recipe_file(&path)
                .with_context(|| format!("could not load file {}", raw))?,
        };

        file.to_recipe()
            .with_context(|| format!("could not finalize recipe {}", file.name))
    }

    /// Fetch a recipe that must exist.
    pub async fn fetch_required(
        &self,
        manifest: &DiscoveryManifest,
        name: &str,
    ) -> anyhow::Result<Recipe> {
        self.fetcher
            .fetch_recipe(self.cancel, manifest, name)
            .await
            .with_context(|| format!("error retrieving recipe {}", name))?
            .ok_or_else(|| anyhow::anyhow!("recipe {} not found", name))
    }

    /// Fetch a user-requested recipe. Lookup failures are warnings; only
    /// cancellation is returned as an error.
    async fn fetch_named(
        &self,
        manifest: &DiscoveryManifest,
        name: &str,
    ) -> anyhow::Result<Option<Recipe>> {
        debug!(name = %name, "fetching recipe by name");

        let recipe = match self.fetcher.fetch_recipe(self.cancel, manifest, name).await {
            Ok(Some(recipe)) => recipe,
            Ok(None) => {
                warn!("Recipe {} not found. Skipping installation.", name);
                return Ok(None);
            }
            Err(e) if is_cancelled(&e) => return Err(e),
            Err(e) => {
                warn!(
                    "Could not install {}. Error retrieving recipe: {:#}",
                    name, e
                );
                return Ok(None);
            }
        };

        if recipe.name != name {
            debug!(
                requested = %name,
                returned = %recipe.name,
                "skipping recipe, name does not match"
            );
            return Ok(None);
        }

        Ok(Some(recipe))
    }
}
