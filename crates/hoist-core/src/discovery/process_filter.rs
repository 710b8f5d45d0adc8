//! Process filtering against recipe `process_match` patterns.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use super::ProcessFilterer;
use crate::cancel::CancellationToken;
use crate::recipe::{Recipe, RecipeFetcher};
use crate::types::ProcessInfo;

/// Keeps processes whose name or command line matches any known recipe's
/// `process_match` regex.
pub struct RegexProcessFilterer {
    recipe_fetcher: Arc<dyn RecipeFetcher>,
}

impl RegexProcessFilterer {
    pub fn new(recipe_fetcher: Arc<dyn RecipeFetcher>) -> Self {
        Self { recipe_fetcher }
    }
}

#[async_trait]
impl ProcessFilterer for RegexProcessFilterer {
    async fn filter(
        &self,
        cancel: &CancellationToken,
        processes: Vec<ProcessInfo>,
    ) -> anyhow::Result<Vec<ProcessInfo>> {
        let recipes = self
            .recipe_fetcher
            .fetch_recipes(cancel)
            .await
            .context("Failed to fetch recipes for process matching")?;

        let patterns = compile_patterns(&recipes);
        debug!(
            recipe_count = recipes.len(),
            pattern_count = patterns.len(),
            "matching processes"
        );

        let matched: Vec<ProcessInfo> = processes
            .into_iter()
            .filter(|process| {
                patterns
                    .iter()
                    .any(|re| re.is_match(&process.name) || re.is_match(&process.cmdline))
            })
            .collect();

        debug!(matched = matched.len(), "filtered processes");
        Ok(matched)
    }
}

fn compile_patterns(recipes: &[Recipe]) -> Vec<Regex> {
    let mut patterns = Vec::new();
    for recipe in recipes {
        for raw in &recipe.process_match {
            match Regex::new(raw) {
                Ok(re) => patterns.push(re),
                Err(e) => warn!(
                    name = %recipe.name,
                    pattern = %raw,
                    error = %e,
                    "ignoring invalid process match pattern"
                ),
            }
        }
    }
    patterns
}
