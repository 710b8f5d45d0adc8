//! Loading recipe files from local paths or HTTP URLs.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use url::Url;

use super::file::{RecipeFile, RecipeFileError};
use crate::cancel::{CancellationToken, with_cancel};

/// Where a recipe path given on the command line points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeLocation {
    Remote(Url),
    Local(PathBuf),
}

impl RecipeLocation {
    /// Classify a user-supplied recipe path.
    ///
    /// `http`/`https` URLs are fetched, `file://` URLs and anything that does
    /// not parse as a URL are read from disk. Single-letter schemes are drive
    /// letters, not URLs.
    pub fn parse(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => RecipeLocation::Remote(url),
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => RecipeLocation::Local(path),
                Err(()) => RecipeLocation::Local(PathBuf::from(raw)),
            },
            _ => RecipeLocation::Local(PathBuf::from(raw)),
        }
    }
}

#[async_trait]
pub trait RecipeFileFetcher: Send + Sync {
    async fn fetch_recipe_file(
        &self,
        cancel: &CancellationToken,
        url: &Url,
    ) -> anyhow::Result<RecipeFile>;

    fn load_recipe_file(&self, path: &Path) -> anyhow::Result<RecipeFile>;
}

/// Reads recipe files from disk and downloads remote ones with reqwest.
#[derive(Debug, Clone)]
pub struct HttpRecipeFileFetcher {
    client: reqwest::Client,
}

impl HttpRecipeFileFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecipeFileFetcher for HttpRecipeFileFetcher {
    async fn fetch_recipe_file(
        &self,
        cancel: &CancellationToken,
        url: &Url,
    ) -> anyhow::Result<RecipeFile> {
        let body = with_cancel(cancel, async {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .with_context(|| format!("Failed to fetch recipe file from {}", url))?;

            if !response.status().is_success() {
                anyhow::bail!(
                    "Failed to fetch recipe file: HTTP {} from {}",
                    response.status(),
                    url
                );
            }

            response
                .text()
                .await
                .with_context(|| format!("Failed to read response body from {}", url))
        })
        .await?;

        Ok(RecipeFile::parse(&body)?)
    }

    fn load_recipe_file(&self, path: &Path) -> anyhow::Result<RecipeFile> {
        let content = std::fs::read_to_string(path).map_err(|source| RecipeFileError::Read {
            path: path.display().to_string(),
            source,
        })?;

        RecipeFile::parse(&content)
            .with_context(|| format!("Failed to parse recipe file: {}", path.display()))
    }
}
