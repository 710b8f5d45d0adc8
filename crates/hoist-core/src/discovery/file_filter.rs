//! Log file discovery for the logging recipe.
//!
//! Each `log_match` candidate carries a file pattern such as
//! `/var/log/nginx/*.log`. The pattern is split into a literal root directory
//! and a glob remainder; the root is walked and relative paths are matched
//! against the remainder. Candidates with no file on disk are dropped.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;
use walkdir::WalkDir;
use wax::{CandidatePath, Glob, Pattern};

use super::FileFilterer;
use crate::cancel::{CancellationToken, with_cancel};
use crate::recipe::Recipe;
use crate::types::LogMatch;

#[derive(Debug, Clone, Copy, Default)]
pub struct GlobFileFilterer;

impl GlobFileFilterer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileFilterer for GlobFileFilterer {
    async fn filter(
        &self,
        cancel: &CancellationToken,
        recipes: &[Recipe],
    ) -> anyhow::Result<Vec<LogMatch>> {
        let candidates = unique_candidates(recipes);
        debug!(candidates = candidates.len(), "checking log match candidates");

        with_cancel(cancel, async move {
            tokio::task::spawn_blocking(move || {
                candidates
                    .into_iter()
                    .filter(|m| pattern_has_match(&m.file))
                    .collect::<Vec<_>>()
            })
            .await
            .context("Log file discovery task failed")
        })
        .await
    }
}

/// Log matches across all recipes, first occurrence of each file pattern wins.
fn unique_candidates(recipes: &[Recipe]) -> Vec<LogMatch> {
    let mut seen = HashSet::new();
    recipes
        .iter()
        .flat_map(|r| r.log_match.iter())
        .filter(|m| !m.file.trim().is_empty() && seen.insert(m.file.clone()))
        .cloned()
        .collect()
}

fn has_glob_meta(segment: &str) -> bool {
    segment.contains(['*', '?', '[', '{'])
}

/// Split `pattern` into the literal directory to walk and the glob remainder.
/// `None` means the pattern contains no glob syntax.
fn split_pattern(pattern: &str) -> (PathBuf, Option<String>) {
    let parts: Vec<&str> = pattern.split('/').collect();
    match parts.iter().position(|p| has_glob_meta(p)) {
        None => (PathBuf::from(pattern), None),
        Some(i) => {
            let root = parts[..i].join("/");
            let root = if !root.is_empty() {
                root
            } else if pattern.starts_with('/') {
                "/".to_string()
            } else {
                ".".to_string()
            };
            (PathBuf::from(root), Some(parts[i..].join("/")))
        }
    }
}

fn pattern_has_match(pattern: &str) -> bool {
    let (root, rest) = split_pattern(pattern);
    let Some(rest) = rest else {
        return root.is_file();
    };

    let glob = match Glob::new(&rest) {
        Ok(glob) => glob,
        Err(e) => {
            debug!(pattern = %pattern, error = %e, "invalid log file pattern");
            return false;
        }
    };

    let max_depth = if rest.contains("**") {
        usize::MAX
    } else {
        rest.split('/').count()
    };

    WalkDir::new(&root)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .any(|entry| matches_relative(&glob, &root, entry.path()))
}

fn matches_relative(glob: &Glob<'_>, root: &Path, path: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    let relative = relative.to_string_lossy().replace('\\', "/");
    glob.matched(&CandidatePath::from(relative.as_str())).is_some()
}
