//! Application configuration for bookport.
//!
//! User config lives at `~/.bookport/bookport.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BookportError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "bookport.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".bookport";

// ---------------------------------------------------------------------------
// Config structs (matching bookport.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Destination workspace settings.
    #[serde(default)]
    pub destination: DestinationConfig,

    /// Source forum settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Export filters and pacing.
    #[serde(default)]
    pub export: ExportDefaultsConfig,

    /// Permission / confirmation / audit settings.
    #[serde(default)]
    pub permissions: PermissionsConfig,
}

/// `[destination]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Name of the env var holding the API token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub api_token_env: String,

    /// Target database id to create pages under.
    #[serde(default)]
    pub database_id: Option<String>,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            api_token_env: default_token_env(),
            database_id: None,
        }
    }
}

fn default_token_env() -> String {
    "BOOKPORT_API_TOKEN".into()
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the forum the bookmarks live on.
    #[serde(default = "default_source_url")]
    pub base_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_source_url(),
        }
    }
}

fn default_source_url() -> String {
    "https://linux.do".into()
}

/// How embedded images are carried into the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaMode {
    /// Download and re-upload to the destination (default).
    Upload,
    /// Link the original URL directly.
    External,
    /// Drop embedded images entirely.
    Skip,
}

impl Default for MediaMode {
    fn default() -> Self {
        Self::Upload
    }
}

/// `[export]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDefaultsConfig {
    /// Lowest post number to include.
    #[serde(default = "default_range_start")]
    pub range_start: u32,

    /// Highest post number to include.
    #[serde(default = "default_range_end")]
    pub range_end: u32,

    /// Export only the opening post of each topic.
    #[serde(default)]
    pub first_post_only: bool,

    /// Export only posts written by the topic author.
    #[serde(default)]
    pub author_only: bool,

    /// Image handling mode.
    #[serde(default)]
    pub media_mode: MediaMode,

    /// Delay in ms between exported items, to respect the shared rate budget.
    #[serde(default = "default_item_delay")]
    pub item_delay_ms: u64,
}

impl Default for ExportDefaultsConfig {
    fn default() -> Self {
        Self {
            range_start: default_range_start(),
            range_end: default_range_end(),
            first_post_only: false,
            author_only: false,
            media_mode: MediaMode::default(),
            item_delay_ms: default_item_delay(),
        }
    }
}

fn default_range_start() -> u32 {
    1
}
fn default_range_end() -> u32 {
    999_999
}
fn default_item_delay() -> u64 {
    1000
}

/// `[permissions]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsConfig {
    /// Authorization level: 0 read-only, 1 standard, 2 advanced, 3 admin.
    #[serde(default = "default_level")]
    pub level: u8,

    /// Require interactive confirmation before dangerous operations.
    #[serde(default = "default_true")]
    pub require_confirm: bool,

    /// Append an audit record around every guarded operation.
    #[serde(default = "default_true")]
    pub enable_audit_log: bool,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            require_confirm: true,
            enable_audit_log: true,
        }
    }
}

fn default_level() -> u8 {
    1
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.bookport/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BookportError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.bookport/bookport.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| BookportError::config(format!("failed to read {}: {e}", path.display())))?;

    toml::from_str(&content)
        .map_err(|e| BookportError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)
        .map_err(|e| BookportError::config(format!("failed to create {}: {e}", dir.display())))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BookportError::config(e.to_string()))?;

    std::fs::write(&path, content)
        .map_err(|e| BookportError::config(format!("failed to write {}: {e}", path.display())))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the destination API token from the configured env var.
///
/// Fails with a validation error before any network call is attempted.
pub fn resolve_token(config: &AppConfig) -> Result<String> {
    let var_name = &config.destination.api_token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(BookportError::validation(format!(
            "destination API token not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Check that a database id is configured, before any network call.
pub fn resolve_database_id(config: &AppConfig, flag: Option<&str>) -> Result<String> {
    flag.map(str::to_string)
        .or_else(|| config.destination.database_id.clone())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            BookportError::validation(
                "no destination database id configured (set [destination].database_id or pass --database)",
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("BOOKPORT_API_TOKEN"));
        assert!(toml_str.contains("media_mode"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.export.range_start, 1);
        assert_eq!(parsed.export.range_end, 999_999);
        assert_eq!(parsed.export.media_mode, MediaMode::Upload);
        assert_eq!(parsed.permissions.level, 1);
        assert!(parsed.permissions.require_confirm);
        assert!(parsed.permissions.enable_audit_log);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[destination]
database_id = "abc123"

[export]
first_post_only = true
media_mode = "skip"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.destination.database_id.as_deref(), Some("abc123"));
        assert!(config.export.first_post_only);
        assert_eq!(config.export.media_mode, MediaMode::Skip);
        // Untouched sections keep defaults
        assert_eq!(config.export.range_start, 1);
        assert_eq!(config.permissions.level, 1);
    }

    #[test]
    fn token_resolution_fails_without_env() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.destination.api_token_env = "BP_TEST_NONEXISTENT_TOKEN_98765".into();
        let result = resolve_token(&config);
        assert!(matches!(
            result,
            Err(BookportError::Validation { .. })
        ));
    }

    #[test]
    fn database_id_flag_overrides_config() {
        let mut config = AppConfig::default();
        config.destination.database_id = Some("from-config".into());

        assert_eq!(
            resolve_database_id(&config, Some("from-flag")).unwrap(),
            "from-flag"
        );
        assert_eq!(
            resolve_database_id(&config, None).unwrap(),
            "from-config"
        );

        config.destination.database_id = None;
        assert!(resolve_database_id(&config, None).is_err());
    }
}
