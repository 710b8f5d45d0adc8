//! High-level commands for hoist operations.
//!
//! Frontends call these with their own prompter, progress display and
//! status reporters; everything else is built from [`Settings`](crate::config::Settings).

pub mod install;

pub use install::{InstallCommand, InstallReport};
