//! JSON API for departments and employees.
//!
//! This module provides the `/api` REST endpoints, the application state
//! they share with the HTML interface, and the request and response types.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub(crate) use handlers::parse_id;
pub use request::{EmployeeFilter, parse_json_body};
pub use response::{
    ApiError, ApiErrorResponse, Envelope, INSERTION_FAILED, Links, department_path,
    employee_path, not_deleted_message,
};
pub use state::AppState;
