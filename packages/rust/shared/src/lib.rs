//! Shared error model, configuration, and collaborator seams for bookport.
//!
//! This crate is the foundation depended on by all other bookport crates.
//! It provides:
//! - [`BookportError`], the unified error type
//! - Configuration ([`AppConfig`], config loading, token resolution)
//! - External-collaborator traits ([`SettingsStore`], [`IntentClassifier`])

pub mod collab;
pub mod config;
pub mod error;

// Re-export public API at crate root for ergonomic imports.
pub use collab::{IntentClassifier, MemoryStore, SettingsStore, is_exported, mark_exported};
pub use config::{
    AppConfig, DestinationConfig, ExportDefaultsConfig, MediaMode, PermissionsConfig,
    SourceConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
    resolve_database_id, resolve_token,
};
pub use error::{BookportError, Result};
