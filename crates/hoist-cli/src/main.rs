//! Hoist - instrumentation recipe installer
//!
//! Usage:
//!   hoist install                  # Discover and install recommended recipes
//!   hoist install -n nginx mysql   # Install named recipes
//!   hoist install -c ./recipe.yml  # Install recipes from files or URLs

mod progress;
mod prompt;
mod terminal;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hoist_core::cancel::{CancellationToken, is_cancelled};
use hoist_core::commands::InstallCommand;
use hoist_core::config::SettingsStore;
use hoist_core::context::InstallerContext;
use hoist_core::ux::ProgressIndicator;

use crate::progress::{PlainProgress, SpinnerProgress};
use crate::prompt::DialoguerPrompter;
use crate::terminal::{TerminalStatusReporter, print_banner};

/// Exit code used when the run is interrupted.
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(name = "hoist")]
#[command(about = "Discover and install instrumentation recipes", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the infrastructure agent, logging and integrations for this host
    Install(Box<InstallArgs>),
}

#[derive(Args, Debug, Default)]
struct InstallArgs {
    /// Recipe names to install instead of recommendations
    #[arg(short = 'n', long = "recipe", value_name = "NAME", num_args = 1..)]
    recipes: Vec<String>,

    /// Recipe files or URLs to install; takes precedence over --recipe
    #[arg(short = 'c', long = "recipe-path", value_name = "PATH", num_args = 1..)]
    recipe_paths: Vec<String>,

    /// Do not request recommendations for this host
    #[arg(long)]
    skip_discovery: bool,

    /// Do not install the infrastructure agent
    #[arg(long)]
    skip_infra_install: bool,

    /// Do not install logging
    #[arg(long)]
    skip_logging_install: bool,

    /// Do not install integrations
    #[arg(long)]
    skip_integrations: bool,

    /// Answer yes to every prompt
    #[arg(short = 'y', long)]
    assume_yes: bool,

    /// Confirm each step before it runs
    #[arg(long)]
    advanced: bool,

    /// Path to hoist.toml
    #[arg(long, env = "HOIST_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,
}

impl InstallArgs {
    fn installer_context(&self) -> InstallerContext {
        InstallerContext {
            skip_discovery: self.skip_discovery,
            skip_infra_install: self.skip_infra_install,
            skip_logging_install: self.skip_logging_install,
            skip_integrations: self.skip_integrations,
            assume_yes: self.assume_yes,
            advanced_mode: self.advanced,
            ..Default::default()
        }
        .with_recipe_names(self.recipes.iter().cloned())
        .with_recipe_paths(self.recipe_paths.iter().cloned())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "hoist=debug,info"
    } else {
        "hoist=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    match cli.command {
        Commands::Install(args) => run_install(*args, cancel).await,
    }
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping install");
            cancel.cancel();
        }
    });
}

async fn run_install(args: InstallArgs, cancel: CancellationToken) -> Result<()> {
    let store = SettingsStore::resolve(args.config.as_deref())?;
    let settings = store
        .load()
        .with_context(|| format!("Failed to load {}", store.config_path().display()))?;
    debug!(path = %store.config_path().display(), "settings loaded");

    let progress: Arc<dyn ProgressIndicator> = if console::user_attended_stderr() {
        Arc::new(SpinnerProgress::new())
    } else {
        Arc::new(PlainProgress::new())
    };

    let cmd = InstallCommand::new(settings, Arc::new(DialoguerPrompter::new()), progress)
        .with_reporter(Box::new(TerminalStatusReporter::stdout()));

    print_banner();

    match cmd.execute(args.installer_context(), cancel).await {
        Ok(report) => {
            debug!(
                installed = report.installed(),
                failed = report.failed(),
                skipped = report.skipped(),
                "install finished"
            );
            Ok(())
        }
        Err(e) if is_cancelled(&e) => {
            eprintln!("Installation cancelled");
            std::process::exit(EXIT_INTERRUPTED);
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_install(args: &[&str]) -> InstallArgs {
        let cli = Cli::try_parse_from(args).expect("CLI parsing should succeed");
        match cli.command {
            Commands::Install(args) => *args,
        }
    }

    #[test]
    fn install_without_flags_uses_recommendations() {
        let ctx = parse_install(&["hoist", "install"]).installer_context();
        assert_eq!(ctx, InstallerContext::new());
        assert!(ctx.should_run_discovery());
        assert!(!ctx.should_prompt());
    }

    #[test]
    fn install_accepts_multiple_recipe_names() {
        let args = parse_install(&["hoist", "install", "-n", "nginx", "mysql", "--recipe", "redis"]);
        assert_eq!(args.recipes, vec!["nginx", "mysql", "redis"]);
        assert!(args.installer_context().recipe_names_provided());
    }

    #[test]
    fn install_accepts_recipe_paths() {
        let args = parse_install(&[
            "hoist",
            "install",
            "-c",
            "./nginx.yml",
            "--recipe-path",
            "https://example.com/mysql.yml",
        ]);
        let ctx = args.installer_context();
        assert_eq!(
            ctx.recipe_paths,
            vec!["./nginx.yml", "https://example.com/mysql.yml"]
        );
        assert!(!ctx.should_install_infra_agent());
    }

    #[test]
    fn install_skip_flags_map_to_context() {
        let ctx = parse_install(&[
            "hoist",
            "install",
            "--skip-discovery",
            "--skip-infra-install",
            "--skip-logging-install",
            "--skip-integrations",
            "-y",
            "--advanced",
        ])
        .installer_context();

        assert!(ctx.skip_discovery);
        assert!(ctx.skip_infra_install);
        assert!(ctx.skip_logging_install);
        assert!(ctx.skip_integrations);
        assert!(ctx.assume_yes);
        assert!(ctx.advanced_mode);
        assert!(!ctx.should_prompt());
    }

    #[test]
    fn verbose_flag_is_global() {
        let cli = Cli::try_parse_from(["hoist", "install", "-v"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn config_flag_parses_path() {
        let args = parse_install(&["hoist", "install", "--config", "/tmp/hoist.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/hoist.toml")));
    }

    #[test]
    fn install_requires_subcommand() {
        assert!(Cli::try_parse_from(["hoist"]).is_err());
    }
}
