//! Configuration module for entity-sql.
//!
//! Handles the config file, environment variables, and builder/logging settings.

mod settings;

pub use settings::{expand_env_vars, BuilderSettings, LoggingSettings, Settings, SettingsError};
