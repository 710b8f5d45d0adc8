//! Recipe service client.
//!
//! Looks recipes up by name, asks for recommendations for a discovered host,
//! and lists the full catalog (used to match running processes).

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use super::Recipe;
use crate::cancel::{CancellationToken, with_cancel};
use crate::http::join_url;
use crate::types::DiscoveryManifest;

#[async_trait]
pub trait RecipeFetcher: Send + Sync {
    /// Fetch a recipe by name. `Ok(None)` means the service has no such recipe.
    async fn fetch_recipe(
        &self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
        name: &str,
    ) -> anyhow::Result<Option<Recipe>>;

    /// Recipes the service recommends for this host. May be empty.
    async fn fetch_recommendations(
        &self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
    ) -> anyhow::Result<Vec<Recipe>>;

    /// Every recipe the service knows about.
    async fn fetch_recipes(&self, cancel: &CancellationToken) -> anyhow::Result<Vec<Recipe>>;
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    name: &'a str,
    manifest: &'a DiscoveryManifest,
}

#[derive(Debug, Serialize)]
struct RecommendationRequest<'a> {
    manifest: &'a DiscoveryManifest,
}

#[derive(Debug, Deserialize)]
struct RecipeList {
    #[serde(default)]
    recipes: Vec<Recipe>,
}

/// [`RecipeFetcher`] backed by the recipe service's JSON API.
#[derive(Debug, Clone)]
pub struct ServiceRecipeFetcher {
    client: reqwest::Client,
    base_url: Url,
}

impl ServiceRecipeFetcher {
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl RecipeFetcher for ServiceRecipeFetcher {
    async fn fetch_recipe(
        &self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
        name: &str,
    ) -> anyhow::Result<Option<Recipe>> {
        let url = join_url(&self.base_url, "recipes/search")?;
        let body = SearchRequest { name, manifest };

        with_cancel(cancel, async {
            let response = self
                .client
                .post(url.clone())
                .json(&body)
                .send()
                .await
                .with_context(|| format!("Failed to query recipe service at {}", url))?;

            if response.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !response.status().is_success() {
                anyhow::bail!(
                    "Recipe service returned HTTP {} for recipe {}",
                    response.status(),
                    name
                );
            }

            let recipe: Recipe = response
                .json()
                .await
                .with_context(|| format!("Failed to parse recipe {} from service", name))?;
            Ok(Some(recipe))
        })
        .await
    }

    async fn fetch_recommendations(
        &self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
    ) -> anyhow::Result<Vec<Recipe>> {
        let url = join_url(&self.base_url, "recipes/recommendations")?;
        let body = RecommendationRequest { manifest };

        with_cancel(cancel, async {
            let response = self
                .client
                .post(url.clone())
                .json(&body)
                .send()
                .await
                .with_context(|| format!("Failed to query recipe service at {}", url))?;

            if !response.status().is_success() {
                anyhow::bail!(
                    "Recipe service returned HTTP {} for recommendations",
                    response.status()
                );
            }

            let list: RecipeList = response
                .json()
                .await
                .context("Failed to parse recommendations response")?;
            Ok(list.recipes)
        })
        .await
    }

    async fn fetch_recipes(&self, cancel: &CancellationToken) -> anyhow::Result<Vec<Recipe>> {
        let url = join_url(&self.base_url, "recipes")?;

        with_cancel(cancel, async {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .with_context(|| format!("Failed to list recipes from {}", url))?;

            if !response.status().is_success() {
                anyhow::bail!(
                    "Recipe service returned HTTP {} listing recipes",
                    response.status()
                );
            }

            let list: RecipeList = response
                .json()
                .await
                .context("Failed to parse recipe list response")?;
            Ok(list.recipes)
        })
        .await
    }
}
