use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::domain::identity::DEFAULT_MACHINE_ID_PATH;
use crate::domain::marker::{UploadMarker, APP_DIR_NAME};

pub const ENV_PREFIX: &str = "GNOME_INFO_COLLECT_";
pub const DEFAULT_UPLOAD_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Address the record is posted to.
    pub upload_url: String,
    pub log_level: String,
    /// Overrides the user data directory that holds the marker.
    pub data_dir: Option<PathBuf>,
    pub machine_id_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            log_level: "warn".to_string(),
            data_dir: None,
            machine_id_path: PathBuf::from(DEFAULT_MACHINE_ID_PATH),
        }
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("could not determine config directory")?;
        Ok(config_dir.join(APP_DIR_NAME).join("config.yaml"))
    }

    /// Defaults, then the YAML file, then `GNOME_INFO_COLLECT_*` variables.
    pub fn figment(file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(file))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir().context("could not determine user data directory"),
        }
    }

    pub fn marker(&self) -> Result<UploadMarker> {
        Ok(UploadMarker::in_data_dir(&self.data_dir()?))
    }
}

/// Load from `file`, or the default location when `None`. A missing file is
/// not an error.
pub fn load(file: Option<&Path>) -> Result<Config> {
    let path = match file {
        Some(p) => p.to_path_buf(),
        None => Config::path()?,
    };
    Config::figment(&path)
        .extract()
        .with_context(|| format!("loading configuration from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|jail| {
            let config: Config = Config::figment(&jail.directory().join("absent.yaml")).extract()?;
            assert_eq!(config, Config::default());
            assert_eq!(config.machine_id_path, Path::new("/etc/machine-id"));
            Ok(())
        });
    }

    #[test]
    fn test_file_then_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                "upload_url: https://collect.example.org/\nlog_level: info\ndata_dir: /tmp/gic\n",
            )?;
            jail.set_env("GNOME_INFO_COLLECT_LOG_LEVEL", "debug");

            let config: Config = Config::figment(&jail.directory().join("config.yaml")).extract()?;
            assert_eq!(config.upload_url, "https://collect.example.org/");
            assert_eq!(config.log_level, "debug");
            assert_eq!(config.data_dir.as_deref(), Some(Path::new("/tmp/gic")));
            Ok(())
        });
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "upload_url: [unterminated\n")?;
            assert!(load(Some(&jail.directory().join("config.yaml"))).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_marker_lives_under_data_dir() {
        let config = Config {
            data_dir: Some(PathBuf::from("/var/tmp/user-data")),
            ..Config::default()
        };
        assert_eq!(
            config.marker().unwrap().path(),
            Path::new("/var/tmp/user-data/gnome-info-collect/uploaded")
        );
    }
}
