use std::path::{Path, PathBuf};

use cal26_common::{Error, Result};
use tracing::{debug, info};

use crate::model::AppConfig;

/// File names looked up in the working directory when no config file is given.
const DEFAULT_FILE_NAMES: &[&str] = &["cal26.toml", "cal26.yaml", "cal26.yml"];

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from `explicit` if given, otherwise from the first
    /// default file found in the working directory. Falls back to defaults
    /// when no file exists.
    pub fn load(explicit: Option<&Path>) -> Result<AppConfig> {
        Self::load_from(explicit, Path::new("."))
    }

    /// Same as [`ConfigLoader::load`], probing `search_dir` instead of the
    /// working directory.
    pub fn load_from(explicit: Option<&Path>, search_dir: &Path) -> Result<AppConfig> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_file(path);
        }

        match Self::find_default(search_dir) {
            Some(path) => Self::load_file(&path),
            None => {
                debug!("no config file found in {}, using defaults", search_dir.display());
                Ok(AppConfig::default())
            }
        }
    }

    fn find_default(search_dir: &Path) -> Option<PathBuf> {
        DEFAULT_FILE_NAMES
            .iter()
            .map(|name| search_dir.join(name))
            .find(|p| p.is_file())
    }

    pub fn load_file(path: &Path) -> Result<AppConfig> {
        let contents = std::fs::read_to_string(path)?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = match ext {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("YAML parse error in {}: {e}", path.display())))?,
            "toml" => toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("TOML parse error in {}: {e}", path.display())))?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported config extension: {other}"
                )));
            }
        };

        info!("loaded config from {}", path.display());
        Ok(config)
    }
}
