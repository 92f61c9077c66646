//! Configuration loading
//!
//! Config file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. `DAYLOG_CONFIG` environment variable
//! 3. Platform config directory (`<config dir>/daylog/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is not an error; the compiled defaults are used.
//! A config file that exists but does not parse is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "DAYLOG_CONFIG";

/// Frame rate assumed for clips that carry none
pub const DEFAULT_FPS: f64 = 25.0;

/// Label used for sources that do not live on a mounted volume
pub const DEFAULT_SYSTEM_VOLUME_LABEL: &str = "Macintosh HD";

/// Mount point under which removable volumes appear
pub const DEFAULT_VOLUMES_ROOT: &str = "/Volumes";

/// Top-level TOML configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Frame rate used when a clip has no fps of its own
    pub default_fps: f64,
    /// Volume label for local (non-mounted) source paths
    pub system_volume_label: String,
    /// Root directory of mounted volumes
    pub volumes_root: PathBuf,
    /// Accepted media extensions per ingest kind
    pub extensions: ExtensionsConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            default_fps: DEFAULT_FPS,
            system_volume_label: DEFAULT_SYSTEM_VOLUME_LABEL.to_string(),
            volumes_root: PathBuf::from(DEFAULT_VOLUMES_ROOT),
            extensions: ExtensionsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Reject values that would poison downstream arithmetic
    pub fn validate(&self) -> Result<()> {
        if !self.default_fps.is_finite() || self.default_fps <= 0.0 {
            return Err(Error::Config(format!(
                "default_fps must be a positive number, got {}",
                self.default_fps
            )));
        }
        if self.extensions.ocf.is_empty() || self.extensions.sound.is_empty() {
            return Err(Error::Config(
                "extensions.ocf and extensions.sound must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Media extensions kept by the manifest filter (lowercase, no dot)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionsConfig {
    pub ocf: Vec<String>,
    pub sound: Vec<String>,
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        let ocf = [
            "mov", "mxf", "mp4", "braw", "r3d", "ari", "arx", "crm", "dng", "avi", "mkv", "dpx",
            "exr", "cine", "nev",
        ];
        Self {
            ocf: ocf.iter().map(|s| s.to_string()).collect(),
            sound: vec!["wav".to_string()],
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (e.g. "info", "daylog_ingest=debug")
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Resolve which config file to read, if any
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    dirs::config_dir()
        .map(|dir| dir.join("daylog").join("config.toml"))
        .filter(|path| path.exists())
}

/// Load configuration, falling back to compiled defaults
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        debug!("No config file found, using compiled defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using compiled defaults");
        return Ok(TomlConfig::default());
    }

    let config = read_config_file(&path)?;
    info!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Read and validate a specific config file
pub fn read_config_file(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}
