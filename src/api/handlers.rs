//! HTTP request handlers for the department JSON API.
//!
//! This module contains the handler functions for all `/api` endpoints.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Department, Employee, FieldMap};

use super::request::{EmployeeFilter, parse_json_body};
use super::response::{ApiErrorResponse, Envelope};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api", get(root_handler))
        .route(
            "/api/departments",
            get(list_departments_handler).post(create_department_handler),
        )
        .route(
            "/api/departments/:id",
            get(get_department_handler)
                .put(update_department_handler)
                .delete(delete_department_handler),
        )
        .route(
            "/api/employees",
            get(list_employees_handler).post(create_employee_handler),
        )
        .route(
            "/api/employees/:id",
            get(get_employee_handler)
                .put(update_employee_handler)
                .delete(delete_employee_handler),
        )
        .with_state(state)
}

/// Parses a path identifier; anything that is not an integer matches no record.
pub(crate) fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

/// Handler for GET /api.
async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "links": {
            "departments": "/api/departments",
            "employees": "/api/employees"
        }
    }))
}

/// Handler for GET /api/departments.
///
/// Lists departments by average salary, highest first.
async fn list_departments_handler(State(state): State<AppState>) -> Response {
    let departments = state
        .db()
        .transaction(|tx| tx.departments_by_average_salary())
        .await;
    match departments {
        Ok(departments) => {
            let body: Vec<_> = departments.iter().map(Envelope::department).collect();
            Json(body).into_response()
        }
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Handler for GET /api/departments/:id.
async fn get_department_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(id) = parse_id(&id) else {
        return ApiErrorResponse::from(AppError::DepartmentNotFound { id: 0 }).into_response();
    };
    let department = state
        .db()
        .transaction(|tx| {
            tx.get_department(id)?
                .ok_or(AppError::DepartmentNotFound { id })
        })
        .await;
    match department {
        Ok(department) => Json(Envelope::department(&department)).into_response(),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Handler for POST /api/departments.
async fn create_department_handler(State(state): State<AppState>, body: Bytes) -> Response {
    save_department(&state, None, parse_json_body(&body)).await
}

/// Handler for PUT /api/departments/:id.
async fn update_department_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return ApiErrorResponse::from(AppError::DepartmentNotFound { id: 0 }).into_response();
    };
    save_department(&state, Some(id), parse_json_body(&body)).await
}

/// Loads (or creates), validates and stores a department in one transaction.
async fn save_department(state: &AppState, id: Option<i64>, fields: Option<FieldMap>) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, department_id = ?id, "Saving department");

    let result = state
        .db()
        .transaction(|tx| {
            let mut department = match id {
                Some(id) => tx
                    .get_department(id)?
                    .ok_or(AppError::DepartmentNotFound { id })?,
                None => Department::default(),
            };
            let fields = fields.ok_or(AppError::InvalidJson)?;
            department.populate_from_dict(&fields)?;
            tx.save_department(&mut department)?;
            Ok(department)
        })
        .await;

    match result {
        Ok(department) => {
            info!(
                correlation_id = %correlation_id,
                department_id = ?department.id,
                name = %department.name,
                "Department saved"
            );
            Json(Envelope::department(&department)).into_response()
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Department not saved");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for DELETE /api/departments/:id.
///
/// Deletes the department and all of its employees atomically.
async fn delete_department_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return ApiErrorResponse::from(AppError::DepartmentNotFound { id: 0 }).into_response();
    };
    let correlation_id = Uuid::new_v4();

    let result = state
        .db()
        .transaction(|tx| {
            let department = tx
                .get_department(id)?
                .ok_or(AppError::DepartmentNotFound { id })?;
            tx.delete_department_cascade(&department)?;
            Ok(department.employees_count())
        })
        .await;

    match result {
        Ok(employees_deleted) => {
            info!(
                correlation_id = %correlation_id,
                department_id = id,
                employees_deleted,
                "Department deleted"
            );
            Json(json!({})).into_response()
        }
        Err(err) if err.is_not_found() => ApiErrorResponse::from(err).into_response(),
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Department not deleted");
            ApiErrorResponse::not_deleted("Department").into_response()
        }
    }
}

/// Handler for GET /api/employees.
///
/// Lists employees by full name, optionally only those born between
/// `from_date` and `to_date` inclusive.
async fn list_employees_handler(
    State(state): State<AppState>,
    Query(filter): Query<EmployeeFilter>,
) -> Response {
    let range = match filter.range() {
        Ok(range) => range,
        Err(err) => return ApiErrorResponse::from(err).into_response(),
    };
    let employees = state
        .db()
        .transaction(|tx| tx.employees_by_full_name(range))
        .await;
    match employees {
        Ok(employees) => {
            let body: Vec<_> = employees.iter().map(Envelope::employee).collect();
            Json(body).into_response()
        }
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Handler for GET /api/employees/:id.
async fn get_employee_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(id) = parse_id(&id) else {
        return ApiErrorResponse::from(AppError::EmployeeNotFound { id: 0 }).into_response();
    };
    let employee = state
        .db()
        .transaction(|tx| tx.get_employee(id)?.ok_or(AppError::EmployeeNotFound { id }))
        .await;
    match employee {
        Ok(employee) => Json(Envelope::employee(&employee)).into_response(),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Handler for POST /api/employees.
async fn create_employee_handler(State(state): State<AppState>, body: Bytes) -> Response {
    save_employee(&state, None, parse_json_body(&body)).await
}

/// Handler for PUT /api/employees/:id.
async fn update_employee_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return ApiErrorResponse::from(AppError::EmployeeNotFound { id: 0 }).into_response();
    };
    save_employee(&state, Some(id), parse_json_body(&body)).await
}

/// Loads (or creates), validates and stores an employee in one transaction.
async fn save_employee(state: &AppState, id: Option<i64>, fields: Option<FieldMap>) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, employee_id = ?id, "Saving employee");

    let result = state
        .db()
        .transaction(|tx| {
            let mut employee = match id {
                Some(id) => tx
                    .get_employee(id)?
                    .ok_or(AppError::EmployeeNotFound { id })?,
                None => Employee::default(),
            };
            let fields = fields.ok_or(AppError::InvalidJson)?;
            employee.populate_from_dict(&fields)?;
            tx.save_employee(&mut employee)?;
            Ok(employee)
        })
        .await;

    match result {
        Ok(employee) => {
            info!(
                correlation_id = %correlation_id,
                employee_id = ?employee.id,
                department_id = ?employee.department_id,
                "Employee saved"
            );
            Json(Envelope::employee(&employee)).into_response()
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Employee not saved");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for DELETE /api/employees/:id.
async fn delete_employee_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(id) = parse_id(&id) else {
        return ApiErrorResponse::from(AppError::EmployeeNotFound { id: 0 }).into_response();
    };
    let correlation_id = Uuid::new_v4();

    let result = state
        .db()
        .transaction(|tx| {
            tx.get_employee(id)?
                .ok_or(AppError::EmployeeNotFound { id })?;
            tx.delete_employee(id)
        })
        .await;

    match result {
        Ok(()) => {
            info!(correlation_id = %correlation_id, employee_id = id, "Employee deleted");
            (StatusCode::OK, Json(json!({}))).into_response()
        }
        Err(err) if err.is_not_found() => ApiErrorResponse::from(err).into_response(),
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Employee not deleted");
            ApiErrorResponse::not_deleted("Employee").into_response()
        }
    }
}
