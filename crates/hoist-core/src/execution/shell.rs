//! Runs install steps through the platform shell.

use std::collections::BTreeMap;
use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::RecipeExecutor;
use crate::cancel::{CancellationToken, with_cancel};
use crate::recipe::Recipe;
use crate::types::{DiscoveryManifest, RecipeVars};

/// Number of stderr lines kept in a step failure message.
const STDERR_TAIL_LINES: usize = 10;

/// Executes recipe steps with `sh -c` (PowerShell on Windows), exposing the
/// prepared variables as environment variables and `{{NAME}}` placeholders.
#[derive(Debug, Clone, Default)]
pub struct ShellRecipeExecutor {
    extra_vars: BTreeMap<String, String>,
}

impl ShellRecipeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variables passed to every recipe, below recipe and input vars.
    pub fn with_extra_vars(mut self, vars: BTreeMap<String, String>) -> Self {
        self.extra_vars = vars;
        self
    }
}

/// Host facts every recipe can reference.
pub fn manifest_vars(manifest: &DiscoveryManifest) -> RecipeVars {
    let mut vars = RecipeVars::new();
    vars.insert("HOSTNAME", manifest.hostname.as_str());
    vars.insert("OS", manifest.os.as_str());
    vars.insert(
        "PLATFORM",
        manifest.platform.map(|p| p.as_str()).unwrap_or_default(),
    );
    vars.insert(
        "PLATFORM_FAMILY",
        manifest.platform_family.map(|f| f.as_str()).unwrap_or_default(),
    );
    vars.insert("PLATFORM_VERSION", manifest.platform_version.as_str());
    vars.insert("KERNEL_ARCH", manifest.kernel_arch.as_str());
    vars.insert("KERNEL_VERSION", manifest.kernel_version.as_str());
    vars
}

#[async_trait]
impl RecipeExecutor for ShellRecipeExecutor {
    async fn prepare(
        &self,
        _cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
        recipe: &Recipe,
        assume_yes: bool,
    ) -> anyhow::Result<RecipeVars> {
        let mut vars = manifest_vars(manifest);
        vars.insert("ASSUME_YES", assume_yes.to_string());

        for (key, value) in &self.extra_vars {
            vars.insert(key.as_str(), value.as_str());
        }
        for (key, value) in recipe.vars() {
            vars.insert(key.as_str(), value.as_str());
        }

        for input in &recipe.input_vars {
            if let Ok(value) = std::env::var(&input.name) {
                vars.insert(input.name.as_str(), value);
                continue;
            }
            if vars.contains_key(&input.name) {
                continue;
            }
            match &input.default {
                Some(default) => vars.insert(input.name.as_str(), default.as_str()),
                None => anyhow::bail!(
                    "recipe {} requires variable {} but no value was provided",
                    recipe.name,
                    input.name
                ),
            }
        }

        debug!(name = %recipe.name, var_count = vars.len(), "prepared recipe vars");
        Ok(vars)
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        _manifest: &DiscoveryManifest,
        recipe: &Recipe,
        vars: &RecipeVars,
    ) -> anyhow::Result<()> {
        for (index, step) in recipe.install_steps.iter().enumerate() {
            let label = step
                .name
                .clone()
                .unwrap_or_else(|| format!("step {}", index + 1));
            let script = vars.render(&step.run);

            debug!(name = %recipe.name, step = %label, "running install step");

            let output = with_cancel(cancel, async {
                shell_command(&script)
                    .envs(vars.iter())
                    .stdin(Stdio::null())
                    .kill_on_drop(true)
                    .output()
                    .await
                    .with_context(|| format!("Failed to start shell for {}", label))
            })
            .await?;

            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(step = %label, stdout = %stdout.trim_end(), stderr = %stderr.trim_end(), "step output");

            if !output.status.success() {
                anyhow::bail!(
                    "{} exited with {}: {}",
                    label,
                    output.status,
                    stderr_tail(&stderr)
                );
            }
        }

        Ok(())
    }
}

fn shell_command(script: &str) -> Command {
    if cfg!(windows) {
        let mut command = Command::new("powershell");
        command.args(["-NoProfile", "-NonInteractive", "-Command", script]);
        command
    } else {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
