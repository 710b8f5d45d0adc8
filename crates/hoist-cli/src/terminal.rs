//! Human-readable status output.

use std::io::{self, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use console::style;

use hoist_core::status::{RecipeState, RunStatus, StatusEvent, StatusReporter};

/// Welcome text shown before an install run.
pub fn print_banner() {
    println!();
    println!("{}", style("  Welcome to hoist").bold().cyan());
    println!("  Discovering this host and installing the instrumentation it needs.");
    println!();
}

/// Prints a line per finished recipe and a summary when the run completes.
pub struct TerminalStatusReporter<W: Write + Send = io::Stdout> {
    writer: Mutex<W>,
}

impl TerminalStatusReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl<W: Write + Send> TerminalStatusReporter<W> {
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

#[async_trait]
impl<W: Write + Send> StatusReporter for TerminalStatusReporter<W> {
    fn name(&self) -> &str {
        "terminal"
    }

    async fn report(&self, event: &StatusEvent<'_>, status: &RunStatus) -> anyhow::Result<()> {
        let Some(text) = render(event, status) else {
            return Ok(());
        };

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("terminal writer lock poisoned"))?;
        writeln!(writer, "{}", text)?;
        writer.flush()?;
        Ok(())
    }
}

fn render(event: &StatusEvent<'_>, status: &RunStatus) -> Option<String> {
    match event {
        StatusEvent::RecipeInstalled(e) => Some(format!(
            "  {} {} installed",
            style("✓").green(),
            e.recipe.label()
        )),
        StatusEvent::RecipeFailed(e) => Some(format!(
            "  {} {} failed",
            style("✗").red(),
            e.recipe.label()
        )),
        StatusEvent::RecipeSkipped(e) => Some(format!(
            "  {} {} skipped",
            style("-").dim(),
            e.recipe.label()
        )),
        StatusEvent::Complete => Some(summary(status)),
        _ => None,
    }
}

fn summary(status: &RunStatus) -> String {
    let mut lines = vec![
        String::new(),
        format!("  {}", style("Installation complete").bold()),
        "  ───────────────────────────".to_string(),
    ];

    for (label, state) in [
        ("Installed", RecipeState::Installed),
        ("Failed", RecipeState::Failed),
        ("Skipped", RecipeState::Skipped),
    ] {
        lines.push(format!("  {:<10} {}", format!("{}:", label), status.count(state)));
    }

    let failures: Vec<_> = status
        .statuses
        .iter()
        .filter(|s| s.state == RecipeState::Failed)
        .collect();
    if !failures.is_empty() {
        lines.push(String::new());
        for failed in failures {
            let reason = failed.error.as_deref().unwrap_or("unknown error");
            lines.push(format!("  {} {}: {}", style("✗").red(), failed.name, reason));
        }
    }

    lines.join("\n")
}
