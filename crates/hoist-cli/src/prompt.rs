//! Terminal prompts backed by dialoguer.

use std::io;

use anyhow::Context;
use dialoguer::{Confirm, MultiSelect, theme::ColorfulTheme};

use hoist_core::ux::Prompter;

/// Asks questions on the attached terminal.
///
/// Esc and Ctrl-C answer "no" (or select nothing) instead of failing the run.
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for DialoguerPrompter {
    fn prompt_yes_no(&self, msg: &str) -> anyhow::Result<bool> {
        let answer = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(msg)
            .default(true)
            .interact_opt();

        Ok(aborted_as_none(answer)
            .context("Failed to read confirmation")?
            .unwrap_or(false))
    }

    fn multi_select(&self, msg: &str, options: &[String]) -> anyhow::Result<Vec<String>> {
        if options.is_empty() {
            return Ok(Vec::new());
        }

        let defaults: Vec<bool> = options.iter().map(|_| true).collect();
        let selections = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(msg)
            .items(options)
            .defaults(&defaults)
            .interact_opt();

        let selections = aborted_as_none(selections)
            .context("Failed to read selection")?
            .unwrap_or_default();
        Ok(selected(options, &selections))
    }
}

/// Treat an interrupted prompt like an Esc.
fn aborted_as_none<T>(result: dialoguer::Result<Option<T>>) -> dialoguer::Result<Option<T>> {
    match result {
        Err(dialoguer::Error::IO(e)) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
        other => other,
    }
}

fn selected(options: &[String], indices: &[usize]) -> Vec<String> {
    indices
        .iter()
        .filter_map(|&i| options.get(i).cloned())
        .collect()
}
