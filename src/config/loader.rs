//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the
//! application configuration and its seed data from YAML files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

use super::types::{AppConfig, SeedData};

/// Loads and provides access to the application configuration.
///
/// # Example
///
/// ```no_run
/// use department_app::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/app.yaml").unwrap();
/// println!("Listening on {}", loader.config().server.address());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: AppConfig,
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Loads configuration from the specified YAML file.
    ///
    /// Relative paths inside the file (such as `seed_file`) are resolved
    /// against the directory containing it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ConfigNotFound`] if the file cannot be read and
    /// [`AppError::ConfigParseError`] if it is not valid configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        let config = Self::load_yaml::<AppConfig>(path)?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(Self { config, base_dir })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> AppResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| AppError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| AppError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns a mutable reference, for command line overrides.
    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    /// Returns the resolved database file path, if one is configured.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.resolve(self.config.database_file.as_ref())
    }

    /// Returns the resolved seed file path, if one is configured.
    pub fn seed_path(&self) -> Option<PathBuf> {
        self.resolve(self.config.seed_file.as_ref())
    }

    fn resolve(&self, file: Option<&PathBuf>) -> Option<PathBuf> {
        file.map(|file| self.base_dir.join(file))
    }

    /// Loads the seed data named by the configuration.
    ///
    /// Returns `Ok(None)` when no seed file is configured.
    pub fn load_seed(&self) -> AppResult<Option<SeedData>> {
        self.seed_path()
            .map(|path| Self::load_yaml::<SeedData>(&path))
            .transpose()
    }
}
