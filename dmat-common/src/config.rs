//! Bootstrap configuration loading and path resolution
//!
//! Resolution priority for every bootstrap value:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing config file is not an error: defaults are used and a warning
//! is logged. A config file that exists but fails to parse is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const ENV_CONFIG: &str = "DMAT_CONFIG";
/// Environment variable overriding the database path
pub const ENV_DATABASE: &str = "DMAT_DATABASE";
/// Environment variable overriding the HTTP port
pub const ENV_PORT: &str = "DMAT_PORT";

/// Bootstrap configuration loaded from TOML
///
/// Read once at startup; changes require a restart.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// SQLite database file (relative or absolute)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Run all imports at startup when the database has no areas
    #[serde(default = "default_auto_import")]
    pub auto_import: bool,

    /// Source workbook locations
    #[serde(default)]
    pub workbooks: WorkbookPaths,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Sheet layout overrides, deserialized by the import pipeline
    #[serde(default)]
    pub layouts: Option<toml::Value>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            bind_address: default_bind_address(),
            port: default_port(),
            auto_import: default_auto_import(),
            workbooks: WorkbookPaths::default(),
            logging: LoggingConfig::default(),
            layouts: None,
        }
    }
}

/// Locations of the two source workbooks
#[derive(Debug, Clone, Deserialize)]
pub struct WorkbookPaths {
    /// Workbook holding the `CheckSheet` and `RatingScales` tabs
    #[serde(default = "default_checksheet_workbook")]
    pub checksheet: PathBuf,

    /// Workbook holding the `Reports` and `Smart Factory CheckSheet` tabs
    #[serde(default = "default_maturity_workbook")]
    pub maturity: PathBuf,
}

impl Default for WorkbookPaths {
    fn default() -> Self {
        Self {
            checksheet: default_checksheet_workbook(),
            maturity: default_maturity_workbook(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level directive (trace, debug, info, warn, error or an EnvFilter string)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_auto_import() -> bool {
    true
}

fn default_checksheet_workbook() -> PathBuf {
    PathBuf::from("data/CheckSheetData.xlsx")
}

fn default_maturity_workbook() -> PathBuf {
    PathBuf::from("data/MM_Data.xlsx")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load configuration following the resolution priority
    ///
    /// Falls back to defaults when no config file can be located.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_path) {
            Some(path) => {
                let config = Self::from_file(&path)?;
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            None => {
                warn!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Effective HTTP port (environment overrides TOML)
    pub fn effective_port(&self) -> u16 {
        match std::env::var(ENV_PORT).ok().map(|v| v.parse::<u16>()) {
            Some(Ok(port)) => port,
            Some(Err(_)) => {
                warn!("Ignoring invalid {} value", ENV_PORT);
                self.port
            }
            None => self.port,
        }
    }
}

/// Locate the config file
///
/// An explicit path (CLI or environment) is returned even if it does not
/// exist so that the caller reports the mistake instead of silently using
/// defaults.
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(ENV_CONFIG) {
        return Some(PathBuf::from(path));
    }

    let candidates = [
        dirs::config_dir().map(|d| d.join("dmat").join("config.toml")),
        Some(PathBuf::from("dmat.toml")),
    ];

    candidates.into_iter().flatten().find(|p| p.exists())
}

/// Resolve the database file path
pub fn resolve_database_path(cli_path: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ENV_DATABASE) {
        return PathBuf::from(path);
    }

    if let Some(path) = &config.database_path {
        return path.clone();
    }

    default_data_folder().join("dmat.db")
}

/// OS-dependent default data folder
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("dmat"))
        .unwrap_or_else(|| PathBuf::from("./dmat_data"))
}
