//! HTTP request handlers for the HTML interface.

use std::collections::HashMap;

use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use chrono::Local;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{AppState, EmployeeFilter, INSERTION_FAILED, not_deleted_message, parse_id};
use crate::error::AppError;
use crate::models::{Department, Employee, FieldMap};

use super::pages;

/// Creates the router for the HTML pages.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/search", get(search_handler))
        .route("/departments", get(departments_handler))
        .route("/departments/:id", get(department_handler))
        .route(
            "/departments/:id/edit",
            get(edit_department_handler).post(submit_department_handler),
        )
        .route(
            "/departments/:id/delete",
            get(confirm_delete_department_handler).post(delete_department_handler),
        )
        .route("/employees", get(employees_handler))
        .route("/employees/:id", get(employee_handler))
        .route(
            "/employees/:id/edit",
            get(edit_employee_handler).post(submit_employee_handler),
        )
        .route(
            "/employees/:id/delete",
            get(confirm_delete_employee_handler).post(delete_employee_handler),
        )
        .with_state(state)
}

/// Which record an edit page works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditTarget {
    New,
    Existing(i64),
}

impl EditTarget {
    fn parse(raw: &str) -> Option<Self> {
        if raw == "new" {
            Some(Self::New)
        } else {
            parse_id(raw).map(Self::Existing)
        }
    }
}

/// Plain text 404 for missing records, 500 for anything else.
fn lookup_failed(err: &AppError) -> Response {
    let status = if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, err.to_string()).into_response()
}

fn department_not_found() -> Response {
    lookup_failed(&AppError::DepartmentNotFound { id: 0 })
}

fn employee_not_found() -> Response {
    lookup_failed(&AppError::EmployeeNotFound { id: 0 })
}

/// Message shown on a form after a failed submission.
fn submission_message(err: &AppError) -> String {
    if err.is_validation() {
        err.to_string()
    } else {
        INSERTION_FAILED.to_string()
    }
}

fn form_fields(form: HashMap<String, String>) -> FieldMap {
    FieldMap::from_form(form)
}

async fn index_handler() -> Redirect {
    Redirect::to("/departments")
}

async fn search_handler() -> Html<String> {
    Html(pages::search(Local::now().date_naive()))
}

async fn departments_handler(State(state): State<AppState>) -> Response {
    match state
        .db()
        .transaction(|tx| tx.departments_by_average_salary())
        .await
    {
        Ok(departments) => Html(pages::departments(&departments)).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

async fn department_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(id) = parse_id(&id) else {
        return department_not_found();
    };
    match state
        .db()
        .transaction(|tx| tx.get_department(id)?.ok_or(AppError::DepartmentNotFound { id }))
        .await
    {
        Ok(department) => Html(pages::department(&department)).into_response(),
        Err(err) => lookup_failed(&err),
    }
}

async fn edit_department_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let department = match EditTarget::parse(&id) {
        Some(EditTarget::New) => Department::default(),
        Some(EditTarget::Existing(id)) => {
            match state
                .db()
                .transaction(|tx| tx.get_department(id)?.ok_or(AppError::DepartmentNotFound { id }))
                .await
            {
                Ok(department) => department,
                Err(err) => return lookup_failed(&err),
            }
        }
        None => return department_not_found(),
    };
    Html(pages::department_form(&department.to_dict(), None)).into_response()
}

async fn submit_department_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let Some(target) = EditTarget::parse(&id) else {
        return department_not_found();
    };
    let correlation_id = Uuid::new_v4();
    let fields = form_fields(form);

    let mut current = None;
    let result = state
        .db()
        .transaction(|tx| {
            let department = current.insert(match target {
                EditTarget::New => Department::default(),
                EditTarget::Existing(id) => tx
                    .get_department(id)?
                    .ok_or(AppError::DepartmentNotFound { id })?,
            });
            department.populate_from_dict(&fields)?;
            tx.save_department(department)
        })
        .await;

    match (result, current) {
        (Ok(()), Some(department)) => {
            info!(correlation_id = %correlation_id, department_id = ?department.id, "Department saved");
            let id = department.to_dict().id;
            Redirect::to(&format!("/departments/{id}")).into_response()
        }
        (Err(err), Some(department)) if !err.is_not_found() => {
            warn!(correlation_id = %correlation_id, error = %err, "Department not saved");
            let message = submission_message(&err);
            let page = pages::department_form(&department.to_dict(), Some(&message));
            (StatusCode::BAD_REQUEST, Html(page)).into_response()
        }
        (Err(err), _) => lookup_failed(&err),
        (Ok(()), None) => department_not_found(),
    }
}

async fn confirm_delete_department_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return department_not_found();
    };
    match state
        .db()
        .transaction(|tx| tx.get_department(id)?.ok_or(AppError::DepartmentNotFound { id }))
        .await
    {
        Ok(department) => Html(pages::delete_department(&department)).into_response(),
        Err(err) => lookup_failed(&err),
    }
}

/// Deletes the department with its employees, then returns to the list
/// whether or not the delete went through.
async fn delete_department_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return department_not_found();
    };
    let correlation_id = Uuid::new_v4();
    let result = state
        .db()
        .transaction(|tx| {
            let department = tx
                .get_department(id)?
                .ok_or(AppError::DepartmentNotFound { id })?;
            tx.delete_department_cascade(&department)?;
            Ok(department)
        })
        .await;

    match result {
        Ok(department) => {
            info!(
                correlation_id = %correlation_id,
                department_id = id,
                name = %department.name,
                employees_deleted = department.employees_count(),
                "Department deleted"
            );
        }
        Err(err) if err.is_not_found() => return lookup_failed(&err),
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Department not deleted");
        }
    }
    Redirect::to("/departments").into_response()
}

async fn employees_handler(
    State(state): State<AppState>,
    Query(filter): Query<EmployeeFilter>,
) -> Response {
    let range = match filter.range() {
        Ok(range) => range,
        Err(err) => {
            return (StatusCode::BAD_REQUEST, Html(pages::error(&err.to_string()))).into_response();
        }
    };
    match state
        .db()
        .transaction(|tx| tx.employees_by_full_name(range))
        .await
    {
        Ok(employees) => Html(pages::employees(&employees, &filter)).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

async fn employee_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(id) = parse_id(&id) else {
        return employee_not_found();
    };
    let result = state
        .db()
        .transaction(|tx| {
            let employee = tx
                .get_employee(id)?
                .ok_or(AppError::EmployeeNotFound { id })?;
            let department = match employee.department_id {
                Some(department_id) => tx.get_department(department_id)?,
                None => None,
            };
            Ok((employee, department))
        })
        .await;
    match result {
        Ok((employee, department)) => {
            Html(pages::employee(&employee, department.as_ref())).into_response()
        }
        Err(err) => lookup_failed(&err),
    }
}

async fn edit_employee_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(target) = EditTarget::parse(&id) else {
        return employee_not_found();
    };
    let result = state
        .db()
        .transaction(|tx| {
            let employee = match target {
                EditTarget::New => Employee::default(),
                EditTarget::Existing(id) => tx
                    .get_employee(id)?
                    .ok_or(AppError::EmployeeNotFound { id })?,
            };
            Ok((employee, tx.departments()?))
        })
        .await;
    match result {
        Ok((employee, departments)) => Html(pages::employee_form(
            &employee.to_dict(),
            &departments,
            Local::now().date_naive(),
            None,
        ))
        .into_response(),
        Err(err) => lookup_failed(&err),
    }
}

async fn submit_employee_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let Some(target) = EditTarget::parse(&id) else {
        return employee_not_found();
    };
    let correlation_id = Uuid::new_v4();
    let fields = form_fields(form);
    let today = Local::now().date_naive();

    let mut current = None;
    let result = state
        .db()
        .transaction(|tx| {
            let employee = current.insert(match target {
                EditTarget::New => Employee::default(),
                EditTarget::Existing(id) => tx
                    .get_employee(id)?
                    .ok_or(AppError::EmployeeNotFound { id })?,
            });
            employee.populate_from_dict_as_of(&fields, today)?;
            tx.save_employee(employee)
        })
        .await;

    match (result, current) {
        (Ok(()), Some(employee)) => {
            info!(correlation_id = %correlation_id, employee_id = ?employee.id, "Employee saved");
            let id = employee.to_dict().id;
            Redirect::to(&format!("/employees/{id}")).into_response()
        }
        (Err(err), Some(employee)) if !err.is_not_found() => {
            warn!(correlation_id = %correlation_id, error = %err, "Employee not saved");
            let departments = state
                .db()
                .transaction(|tx| tx.departments())
                .await
                .unwrap_or_default();
            let message = submission_message(&err);
            let page = pages::employee_form(&employee.to_dict(), &departments, today, Some(&message));
            (StatusCode::BAD_REQUEST, Html(page)).into_response()
        }
        (Err(err), _) => lookup_failed(&err),
        (Ok(()), None) => employee_not_found(),
    }
}

async fn confirm_delete_employee_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return employee_not_found();
    };
    match state
        .db()
        .transaction(|tx| tx.get_employee(id)?.ok_or(AppError::EmployeeNotFound { id }))
        .await
    {
        Ok(employee) => Html(pages::delete_employee(&employee)).into_response(),
        Err(err) => lookup_failed(&err),
    }
}

async fn delete_employee_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(id) = parse_id(&id) else {
        return employee_not_found();
    };
    let correlation_id = Uuid::new_v4();
    let result = state
        .db()
        .transaction(|tx| {
            let employee = tx
                .get_employee(id)?
                .ok_or(AppError::EmployeeNotFound { id })?;
            tx.delete_employee(id)?;
            Ok(employee)
        })
        .await;

    match result {
        Ok(employee) => {
            info!(
                correlation_id = %correlation_id,
                employee_id = id,
                name = %employee.full_name(),
                "Employee deleted"
            );
            Redirect::to("/employees").into_response()
        }
        Err(err) if err.is_not_found() => lookup_failed(&err),
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Employee not deleted");
            let page = pages::error(&not_deleted_message("Employee"));
            (StatusCode::BAD_REQUEST, Html(page)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;
    use axum::{
        body::Body,
        http::{Request, header},
    };
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn seeded_state() -> AppState {
        seed(AppState::new(Database::open_in_memory().unwrap())).await
    }

    async fn seed(state: AppState) -> AppState {
        state
            .db()
            .transaction(|tx| {
                let mut department = Department {
                    name: "Accounting".to_string(),
                    ..Department::default()
                };
                tx.save_department(&mut department)?;
                let mut employee = Employee::default();
                employee.populate_from_dict(&FieldMap::from_form([
                    ("first_name", "Anna"),
                    ("last_name", "Smith"),
                    ("date_of_birth", "2000-11-11"),
                    ("monthly_salary", "1000.24"),
                    ("department_id", "1"),
                ]))?;
                tx.save_employee(&mut employee)
            })
            .await
            .unwrap();
        state
    }

    async fn get(state: AppState, uri: &str) -> (StatusCode, String) {
        let response = create_router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn post_form(state: AppState, uri: &str, body: &str) -> Response {
        create_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    #[test]
    fn test_edit_target_parse() {
        assert_eq!(EditTarget::parse("new"), Some(EditTarget::New));
        assert_eq!(EditTarget::parse("12"), Some(EditTarget::Existing(12)));
        assert_eq!(EditTarget::parse("twelve"), None);
    }

    #[tokio::test]
    async fn test_index_redirects_to_departments() {
        let response = create_router(AppState::new(Database::open_in_memory().unwrap()))
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(location(&response), "/departments");
    }

    #[tokio::test]
    async fn test_departments_page_lists_average() {
        let (status, body) = get(seeded_state().await, "/departments").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Accounting"));
        assert!(body.contains("1000.24"));
    }

    #[tokio::test]
    async fn test_unknown_department_page_is_404() {
        let (status, body) = get(seeded_state().await, "/departments/9").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Department not found");
    }

    #[tokio::test]
    async fn test_new_department_form() {
        let (status, body) = get(AppState::new(Database::open_in_memory().unwrap()), "/departments/new/edit").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("action=\"/departments/new/edit\""));
    }

    #[tokio::test]
    async fn test_create_department_redirects_to_detail() {
        let state = AppState::new(Database::open_in_memory().unwrap());
        let response = post_form(state.clone(), "/departments/new/edit", "name=Sales").await;
        assert!(response.status().is_redirection());
        assert_eq!(location(&response), "/departments/1");

        let (_, body) = get(state, "/departments/1").await;
        assert!(body.contains("Sales"));
    }

    #[tokio::test]
    async fn test_invalid_department_form_returns_400_with_message() {
        let state = seeded_state().await;
        let response = post_form(state.clone(), "/departments/1/edit", "name=").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Name must not be empty"));
        assert!(body.contains("value=\"Accounting\""));
    }

    #[tokio::test]
    async fn test_duplicate_department_reports_insertion_failure() {
        let state = seeded_state().await;
        let response = post_form(state, "/departments/new/edit", "name=Accounting").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8(body.to_vec()).unwrap().contains(INSERTION_FAILED));
    }

    #[tokio::test]
    async fn test_delete_department_cascades_and_redirects() {
        let state = seeded_state().await;
        let response = post_form(state.clone(), "/departments/1/delete", "").await;
        assert!(response.status().is_redirection());
        assert_eq!(location(&response), "/departments");

        let remaining = state
            .db()
            .transaction(|tx| Ok((tx.departments()?.len(), tx.employees()?.len())))
            .await
            .unwrap();
        assert_eq!(remaining, (0, 0));
    }

    #[tokio::test]
    async fn test_employee_form_rejects_today() {
        let state = seeded_state().await;
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
        let body = format!(
            "first_name=Bob&last_name=Adams&date_of_birth={today}&monthly_salary=10&department_id=1"
        );
        let response = post_form(state, "/employees/new/edit", &body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(
            String::from_utf8(body.to_vec())
                .unwrap()
                .contains("Date is not in range between 1900-01-01 and today")
        );
    }

    #[tokio::test]
    async fn test_edit_employee_redirects_to_detail() {
        let state = seeded_state().await;
        let response = post_form(state.clone(), "/employees/1/edit", "first_name=Maria").await;
        assert!(response.status().is_redirection());
        assert_eq!(location(&response), "/employees/1");

        let (_, body) = get(state, "/employees/1").await;
        assert!(body.contains("Smith Maria"));
        assert!(body.contains("Accounting"));
    }

    #[tokio::test]
    async fn test_employees_page_filters_by_birth_date() {
        let state = seeded_state().await;
        let (status, body) = get(
            state.clone(),
            "/employees?from_date=1990-01-01&to_date=1999-12-31",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("Smith Anna"));

        let (_, body) = get(state, "/employees?from_date=2000-11-11&to_date=2000-11-11").await;
        assert!(body.contains("Smith Anna"));
    }

    #[tokio::test]
    async fn test_delete_employee_redirects_to_list() {
        let state = seeded_state().await;
        let response = post_form(state, "/employees/1/delete", "").await;
        assert!(response.status().is_redirection());
        assert_eq!(location(&response), "/employees");
    }

    #[tokio::test]
    async fn test_refused_employee_delete_shows_message() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("departments.db");
        let state = seed(AppState::new(Database::open(&path).unwrap())).await;
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER keep_employees BEFORE DELETE ON employee \
                 BEGIN SELECT RAISE(ABORT, 'employees are read-only'); END;",
            )
            .unwrap();

        let response = post_form(state.clone(), "/employees/1/delete", "").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(
            String::from_utf8(body.to_vec())
                .unwrap()
                .contains("Employee record not deleted!")
        );

        let (status, _) = get(state, "/employees/1").await;
        assert_eq!(status, StatusCode::OK);
    }
}
