//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.burrow/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::store::OpenOptions;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BurrowConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub open_timeout_ms: Option<u64>,
    pub read_only: Option<bool>,
    pub no_value: Option<bool>,
    pub export_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub file: Option<String>,
    pub level: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_OPEN_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_EXPORT_DIR: &str = ".";
pub const DEFAULT_LOG_FILE: &str = "burrow.log";
pub const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub open_timeout: Duration,
    pub read_only: bool,
    pub no_value: bool,
    pub export_dir: PathBuf,
    pub log_file: PathBuf,
    pub log_level: log::LevelFilter,
}

impl ResolvedConfig {
    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            read_only: self.read_only,
            timeout: self.open_timeout,
        }
    }
}

/// Settings given on the command line. `None`/`false` means "not specified".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub timeout: Option<Duration>,
    pub read_only: bool,
    pub no_value: bool,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Duration(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::Duration(s) => write!(f, "invalid duration: {s:?}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.burrow/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".burrow").join("config.toml"))
}

/// Load config from `~/.burrow/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `BurrowConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<BurrowConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(BurrowConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<BurrowConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(BurrowConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: BurrowConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Burrow Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# open_timeout_ms = 1000       # How long to wait for a locked file (--timeout)
# read_only = false            # Or set BURROW_READ_ONLY=1, or pass --readonly
# no_value = false             # Hide values in the tree (--no-value)
# export_dir = "."             # Where x / X write files (BURROW_EXPORT_DIR)

# [logging]
# file = "burrow.log"
# level = "info"               # "error", "warn", "info", "debug", "trace" (BURROW_LOG)
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &BurrowConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |name| std::env::var(name).ok())
}

fn resolve_with_env<F>(config: &BurrowConfig, cli: &CliOverrides, env: F) -> ResolvedConfig
where
    F: Fn(&str) -> Option<String>,
{
    // Timeout: CLI → config → default
    let open_timeout = cli.timeout.unwrap_or_else(|| {
        Duration::from_millis(
            config
                .general
                .open_timeout_ms
                .unwrap_or(DEFAULT_OPEN_TIMEOUT_MS),
        )
    });

    // Read-only: CLI flag → env → config → false
    let read_only = cli.read_only
        || env("BURROW_READ_ONLY")
            .map(|v| parse_flag(&v))
            .or(config.general.read_only)
            .unwrap_or(false);

    let no_value = cli.no_value || config.general.no_value.unwrap_or(false);

    // Export dir: env → config → default
    let export_dir = env("BURROW_EXPORT_DIR")
        .or_else(|| config.general.export_dir.clone())
        .unwrap_or_else(|| DEFAULT_EXPORT_DIR.to_string());

    // Log level: env → config → default. Unknown names fall back to the default.
    let log_level = env("BURROW_LOG")
        .or_else(|| config.logging.level.clone())
        .and_then(|level| match level.parse() {
            Ok(level) => Some(level),
            Err(_) => {
                warn!("Unknown log level {:?}, using {}", level, DEFAULT_LOG_LEVEL);
                None
            }
        })
        .unwrap_or(DEFAULT_LOG_LEVEL);

    ResolvedConfig {
        open_timeout,
        read_only,
        no_value,
        export_dir: PathBuf::from(export_dir),
        log_file: PathBuf::from(
            config
                .logging
                .file
                .clone()
                .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
        ),
        log_level,
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parses `500ms`, `2s`, `1m`, or a bare number of seconds.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let input = input.trim();
    let invalid = || ConfigError::Duration(input.to_string());
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(split);
    let amount: u64 = number.parse().map_err(|_| invalid())?;
    match unit {
        "" | "s" => Ok(Duration::from_secs(amount)),
        "ms" => Ok(Duration::from_millis(amount)),
        "m" => Ok(Duration::from_secs(amount * 60)),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with_env(&BurrowConfig::default(), &CliOverrides::default(), no_env);
        assert_eq!(resolved.open_timeout, Duration::from_secs(1));
        assert!(!resolved.read_only);
        assert!(!resolved.no_value);
        assert_eq!(resolved.export_dir, PathBuf::from("."));
        assert_eq!(resolved.log_file, PathBuf::from("burrow.log"));
        assert_eq!(resolved.log_level, log::LevelFilter::Info);
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = BurrowConfig {
            general: GeneralConfig {
                open_timeout_ms: Some(250),
                read_only: Some(true),
                no_value: Some(true),
                export_dir: Some("/tmp/out".to_string()),
            },
            logging: LoggingConfig {
                file: Some("b.log".to_string()),
                level: Some("debug".to_string()),
            },
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.open_timeout, Duration::from_millis(250));
        assert!(resolved.read_only);
        assert!(resolved.no_value);
        assert_eq!(resolved.export_dir, PathBuf::from("/tmp/out"));
        assert_eq!(resolved.log_level, log::LevelFilter::Debug);
    }

    #[test]
    fn test_env_beats_config_and_cli_beats_both() {
        let config = BurrowConfig {
            general: GeneralConfig {
                read_only: Some(false),
                export_dir: Some("from-config".to_string()),
                open_timeout_ms: Some(5000),
                ..Default::default()
            },
            ..Default::default()
        };
        let env = |name: &str| match name {
            "BURROW_READ_ONLY" => Some("1".to_string()),
            "BURROW_EXPORT_DIR" => Some("from-env".to_string()),
            "BURROW_LOG" => Some("warn".to_string()),
            _ => None,
        };
        let cli = CliOverrides {
            timeout: Some(Duration::from_millis(100)),
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &cli, env);
        assert!(resolved.read_only);
        assert_eq!(resolved.export_dir, PathBuf::from("from-env"));
        assert_eq!(resolved.log_level, log::LevelFilter::Warn);
        assert_eq!(resolved.open_timeout, Duration::from_millis(100));
    }

    #[test]
    fn test_unknown_log_level_falls_back() {
        let config = BurrowConfig {
            logging: LoggingConfig {
                level: Some("loud".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_sparse_toml_parses() {
        let toml_str = r#"
[general]
read_only = true
"#;
        let config: BurrowConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.read_only, Some(true));
        assert!(config.general.export_dir.is_none());
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_missing_file_generates_commented_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = load_config_from(&path).unwrap();
        assert!(config.general.open_timeout_ms.is_none());
        let generated = fs::read_to_string(&path).unwrap();
        assert!(generated.contains("# open_timeout_ms = 1000"));
        // The generated file parses to the same (empty) config.
        let reparsed: BurrowConfig = toml::from_str(&generated).unwrap();
        assert!(reparsed.general.read_only.is_none());
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[general\nread_only = ").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
        assert!(parse_duration("fast").is_err());
        assert!(parse_duration("5h").is_err());
        assert!(parse_duration("").is_err());
    }
}
