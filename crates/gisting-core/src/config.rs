//! Persisted user configuration.
//!
//! The config lives at `<user config dir>/gisting/config.json` next to the
//! local store and the log directory. Every setter rewrites the file in full.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GistingError, Result};

/// Name of the config file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Name of the local store file inside the config directory.
pub const STORE_FILE_NAME: &str = "gisting.db";

/// Theme name used when none is configured.
pub const DEFAULT_THEME: &str = "default";

/// User configuration persisted as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub access token, empty when logged out
    pub access_token: String,
    /// Color theme name
    pub theme: String,
    /// Directory holding config, store and logs
    #[serde(skip)]
    dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            theme: DEFAULT_THEME.to_string(),
            dir: PathBuf::new(),
        }
    }
}

impl Config {
    /// Load the config from `dir`, creating the directory and a default
    /// config file when they do not exist yet.
    pub fn load_or_init(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| GistingError::DirectoryCreation {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            let config = Self {
                dir: dir.to_path_buf(),
                ..Self::default()
            };
            config.save()?;
            info!(path = %path.display(), "created default config");
            return Ok(config);
        }

        let raw = fs::read_to_string(&path).map_err(|e| GistingError::io("reading", &path, e))?;
        let mut config: Config =
            serde_json::from_str(&raw).map_err(|e| GistingError::config_invalid(&path, e))?;
        config.dir = dir.to_path_buf();
        if config.theme.is_empty() {
            config.set_theme(DEFAULT_THEME)?;
        }

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Directory holding config, store and logs.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the config file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    /// Path of the local store file.
    pub fn store_path(&self) -> PathBuf {
        self.dir.join(STORE_FILE_NAME)
    }

    /// Default log directory.
    pub fn log_dir(&self) -> PathBuf {
        self.dir.join("logs")
    }

    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Store a new access token and persist.
    pub fn set_access_token(&mut self, token: impl Into<String>) -> Result<()> {
        self.access_token = token.into();
        self.save()
    }

    /// Store a new theme name and persist.
    pub fn set_theme(&mut self, theme: impl Into<String>) -> Result<()> {
        self.theme = theme.into();
        self.save()
    }

    /// Forget the access token.
    pub fn clear_secrets(&mut self) -> Result<()> {
        self.set_access_token("")
    }

    /// Write the whole config to disk.
    pub fn save(&self) -> Result<()> {
        let path = self.path();
        let data = serde_json::to_string_pretty(self).map_err(|e| GistingError::json("config", e))?;
        fs::write(&path, data).map_err(|e| GistingError::io("writing", &path, e))?;
        restrict_permissions(&path)?;
        Ok(())
    }
}

/// Default config directory: `<user config dir>/gisting`.
pub fn default_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("gisting"))
        .ok_or(GistingError::ConfigDirUnavailable)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|e| GistingError::io("restricting permissions on", path, e))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
