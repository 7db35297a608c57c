//! Configuration loading and management for the department application.
//!
//! This module loads the server settings and optional seed data from YAML
//! files.
//!
//! # Example
//!
//! ```no_run
//! use department_app::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/app.yaml").unwrap();
//! println!("Binding to {}", config.config().server.address());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{AppConfig, SeedData, SeedDepartment, ServerConfig};
