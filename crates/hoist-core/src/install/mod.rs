//! Install run orchestration.

pub mod orchestrator;
pub mod resolution;

pub use orchestrator::{Collaborators, RecipeInstaller};
pub use resolution::{RecipeSource, Resolver};
