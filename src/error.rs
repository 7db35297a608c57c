//! Error types for the department application.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the entities, the store and the configuration layer
//! can report.

use thiserror::Error;

/// The main error type for the department application.
///
/// Validation errors display their message verbatim, because that message
/// is what gets shown to the person who submitted the data.
///
/// # Example
///
/// ```
/// use department_app::error::AppError;
///
/// let error = AppError::InvalidValue {
///     message: "Name must not be empty".to_string(),
/// };
/// assert_eq!(error.to_string(), "Name must not be empty");
/// assert!(error.is_validation());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// A field had the wrong type (e.g. a number where a string is required).
    #[error("{message}")]
    InvalidType {
        /// The human-readable message.
        message: String,
    },

    /// A field had the right type but an unacceptable value.
    #[error("{message}")]
    InvalidValue {
        /// The human-readable message.
        message: String,
    },

    /// A request body was not a JSON object.
    #[error("Invalid json")]
    InvalidJson,

    /// No department exists with the given identifier.
    #[error("Department not found")]
    DepartmentNotFound {
        /// The identifier that was looked up.
        id: i64,
    },

    /// No employee exists with the given identifier.
    #[error("Employee not found")]
    EmployeeNotFound {
        /// The identifier that was looked up.
        id: i64,
    },

    /// The store refused a write (constraint violation or missing row).
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the failure.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

impl AppError {
    /// Creates a TypeError-kind validation error.
    pub fn invalid_type(message: impl Into<String>) -> Self {
        Self::InvalidType {
            message: message.into(),
        }
    }

    /// Creates a ValueError-kind validation error.
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Returns true for errors caused by bad input shape, range or type.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidType { .. } | Self::InvalidValue { .. })
    }

    /// Returns true when a looked-up record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DepartmentNotFound { .. } | Self::EmployeeNotFound { .. }
        )
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        Self::storage(err.to_string())
    }
}

/// A type alias for Results that return AppError.
pub type AppResult<T> = Result<T, AppError>;
