//! Response types for the department API.
//!
//! This module defines the `{"content", "links"}` envelope wrapped around
//! every record, the `{"error"}` body and the mapping from [`AppError`] to
//! HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Department, DepartmentApi, Employee, EmployeeApi};

/// Message returned when a save fails in the store.
pub const INSERTION_FAILED: &str = "Database insertion failed!";

/// Returns the API path of a department.
pub fn department_path(id: Option<i64>) -> String {
    format!("/api/departments/{}", display_id(id))
}

/// Returns the API path of an employee.
pub fn employee_path(id: Option<i64>) -> String {
    format!("/api/employees/{}", display_id(id))
}

/// Message for a delete the store refused.
pub fn not_deleted_message(record: &str) -> String {
    format!("{record} record not deleted!")
}

fn display_id(id: Option<i64>) -> String {
    id.map_or_else(|| "None".to_string(), |id| id.to_string())
}

/// Hypermedia links attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    /// Where the record itself lives.
    #[serde(rename = "self")]
    pub self_link: String,
    /// The owning department, for employees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// A record together with its links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// The record's native view.
    pub content: T,
    /// Links to related resources.
    pub links: Links,
}

impl Envelope<DepartmentApi> {
    /// Wraps a department.
    pub fn department(department: &Department) -> Self {
        Self {
            content: department.to_api_dict(),
            links: Links {
                self_link: department_path(department.id),
                department: None,
            },
        }
    }
}

impl Envelope<EmployeeApi> {
    /// Wraps an employee, linking to its department.
    pub fn employee(employee: &Employee) -> Self {
        Self {
            content: employee.to_api_dict(),
            links: Links {
                self_link: employee_path(employee.id),
                department: Some(department_path(employee.department_id)),
            },
        }
    }
}

/// API error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable error message.
    pub error: String,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Creates an error response.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            error: ApiError::new(message),
        }
    }

    /// The response for a delete the store refused.
    pub fn not_deleted(record: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, not_deleted_message(record))
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<AppError> for ApiErrorResponse {
    fn from(error: AppError) -> Self {
        let status = match &error {
            AppError::InvalidType { .. } | AppError::InvalidValue { .. } | AppError::InvalidJson => {
                StatusCode::BAD_REQUEST
            }
            AppError::DepartmentNotFound { .. } | AppError::EmployeeNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            AppError::Storage { .. } => {
                return Self::new(StatusCode::BAD_REQUEST, INSERTION_FAILED);
            }
            AppError::ConfigNotFound { .. } | AppError::ConfigParseError { .. } => {
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Configuration error");
            }
        };
        Self::new(status, error.to_string())
    }
}
