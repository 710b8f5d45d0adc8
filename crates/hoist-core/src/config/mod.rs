//! Configuration loaded from hoist.toml
//!
//! Settings live in the platform config directory unless a path is given
//! explicitly. A missing file means defaults.

pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use parser::{parse_settings, parse_settings_str};
pub use paths::{CONFIG_FILE_NAME, config_path, global_config_dir};
pub use schema::{API_KEY_ENV, ServiceSettings, Settings, StatusSettings, ValidationSettings};
pub use store::SettingsStore;
