//! Configuration loading and store location resolution
//!
//! The ingestion tool and the query service must agree on where the
//! component store lives, so both resolve it through
//! [`resolve_database_path`] with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. `CHIPDB_DATABASE` environment variable
//! 3. `database` key in the TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the store file
pub const DATABASE_ENV_VAR: &str = "CHIPDB_DATABASE";

/// Environment variable naming an explicit config file (skips discovery)
pub const CONFIG_ENV_VAR: &str = "CHIPDB_CONFIG";

/// File name of the store inside the default data directory
pub const DEFAULT_DATABASE_FILE: &str = "chip_design.db";

/// Default bind address of the query service
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TomlConfig {
    /// Component store file
    pub database: Option<PathBuf>,
    /// Query service bind address
    pub listen: Option<String>,
    /// Per-file ingestion timeout in seconds (unset = no timeout)
    pub file_timeout_secs: Option<u64>,
}

/// Load the TOML config file.
///
/// A missing file is not an error: defaults are returned. A file that
/// exists but cannot be read or parsed is a `Config` error.
pub fn load_toml_config() -> Result<TomlConfig> {
    let explicit = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);

    let path = match explicit {
        Some(path) => path,
        None => match discover_config_file() {
            Some(path) => path,
            None => {
                debug!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    read_toml_config(&path)
}

/// Parse one TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;

    let config = toml::from_str::<TomlConfig>(&content)
        .map_err(|e| Error::Config(format!("invalid {}: {e}", path.display())))?;

    debug!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Resolve the component store location (see module docs for priority)
pub fn resolve_database_path(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Some(path) = std::env::var_os(DATABASE_ENV_VAR).filter(|v| !v.is_empty()) {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.database {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_database_path()
}

/// OS-dependent default store path
///
/// - Linux: `~/.local/share/chipdb/chip_design.db`
/// - macOS: `~/Library/Application Support/chipdb/chip_design.db`
/// - Windows: `%LOCALAPPDATA%\chipdb\chip_design.db`
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("chipdb"))
        .unwrap_or_else(|| PathBuf::from("./chipdb_data"))
        .join(DEFAULT_DATABASE_FILE)
}

fn discover_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("chipdb").join("config.toml"));
    if let Some(path) = user_config.filter(|p| p.exists()) {
        return Some(path);
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/chipdb/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}
