//! Application configuration at `<config_dir>/event-calendar/config.toml`.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, Result, WrapErr};
use serde::Deserialize;

use crate::calendar::{RecoveryPolicy, DEFAULT_KEY};
use crate::theme::ThemeConfig;

pub const APP_NAME: &str = "event-calendar";

fn default_storage_key() -> String {
    DEFAULT_KEY.to_string()
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the stored event list.
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Largest stored value in bytes.
    pub quota_bytes: Option<usize>,
    pub on_corrupt: RecoveryPolicy,
    pub log_file: Option<PathBuf>,
    pub theme: ThemeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            storage_key: default_storage_key(),
            quota_bytes: None,
            on_corrupt: RecoveryPolicy::default(),
            log_file: None,
            theme: ThemeConfig::default(),
        }
    }
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_NAME).join("config.toml"))
    }

    /// Load from the default location. A missing file yields defaults.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Could not read config file {}", path.display()))?;
        Self::parse(&content).wrap_err_with(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|d| d.join(APP_NAME))
                .ok_or_else(|| eyre!("Could not determine data directory; set data_dir in config")),
        }
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.log_file.clone().or_else(|| {
            dirs::cache_dir().map(|d| d.join(APP_NAME).join(format!("{APP_NAME}.log")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.storage_key, "EVENTS");
        assert_eq!(config.on_corrupt, RecoveryPolicy::Fail);
    }

    #[test]
    fn parses_all_fields() {
        let config = Config::parse(
            r##"
data_dir = "/tmp/cal"
storage_key = "WORK"
quota_bytes = 5242880
on_corrupt = "reset"
log_file = "/tmp/cal.log"

[theme]
preset = "gruvbox"
blue_fg = "#0000ff"
"##,
        )
        .unwrap();

        assert_eq!(config.data_dir.as_deref(), Some(Path::new("/tmp/cal")));
        assert_eq!(config.storage_key, "WORK");
        assert_eq!(config.quota_bytes, Some(5_242_880));
        assert_eq!(config.on_corrupt, RecoveryPolicy::Reset);
        assert_eq!(config.log_file(), Some(PathBuf::from("/tmp/cal.log")));
        assert_eq!(config.theme.preset.as_deref(), Some("gruvbox"));
        assert_eq!(config.theme.blue_fg.as_deref(), Some("#0000ff"));
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/cal"));
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(Config::parse(r#"on_corrupt = "ignore""#).is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "storage_key = \"HOME\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.storage_key, "HOME");
    }
}
