//! Hoist Core Library
//!
//! Discovers what runs on a host, resolves installation recipes for it and
//! drives their installation, validation and status reporting.

pub mod cancel;
pub mod commands;
pub mod config;
pub mod context;
pub mod discovery;
pub mod execution;
pub mod http;
pub mod install;
pub mod recipe;
pub mod status;
pub mod types;
pub mod ux;
pub mod validation;

/// Re-exports of commonly used types
pub mod prelude {
    // Run configuration
    pub use crate::config::{Settings, SettingsStore};
    pub use crate::context::InstallerContext;

    // Orchestration
    pub use crate::cancel::{CancellationToken, Cancelled};
    pub use crate::commands::{InstallCommand, InstallReport};
    pub use crate::install::{Collaborators, RecipeInstaller};

    // Domain
    pub use crate::recipe::{Recipe, RecipeFile};
    pub use crate::types::{DiscoveryManifest, LogMatch, ProcessInfo, RecipeVars};

    // Status
    pub use crate::status::{
        RecipeState, RecipeStatus, RecipeStatusEvent, RunStatus, StatusEvent, StatusReporter,
        StatusRollup,
    };

    // Interaction
    pub use crate::ux::{ProgressIndicator, Prompter};
}
