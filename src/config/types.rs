//! Configuration types for the department application.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML files.

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Address the HTTP server binds to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Host name or IP address.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Returns `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The application configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Server binding.
    #[serde(default)]
    pub server: ServerConfig,
    /// Default `tracing` filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// SQLite database file, relative to the configuration file.
    /// Records are kept in memory when unset.
    #[serde(default)]
    pub database_file: Option<PathBuf>,
    /// Optional seed data file, relative to the configuration file.
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            log_filter: default_log_filter(),
            database_file: None,
            seed_file: None,
        }
    }
}

/// Initial records loaded into an empty store.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SeedData {
    /// Departments to create, each with its employees.
    #[serde(default)]
    pub departments: Vec<SeedDepartment>,
}

/// A department in the seed file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeedDepartment {
    /// Department name.
    pub name: String,
    /// Employee field mappings; `department_id` is filled in from the parent.
    #[serde(default)]
    pub employees: Vec<Map<String, Value>>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_filter() -> String {
    "info".to_string()
}
