//! Server-side HTML pages.
//!
//! Pages are plain strings built from the entity views. Every piece of
//! record data is escaped before it is interpolated.

use chrono::NaiveDate;

use crate::api::EmployeeFilter;
use crate::models::{DATE_FORMAT, Department, DepartmentForm, Employee, EmployeeForm};

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<nav>\
         <a href=\"/departments\">Departments</a> | \
         <a href=\"/employees\">Employees</a> | \
         <a href=\"/search\">Search</a></nav>\n\
         <h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = escape(title),
    )
}

fn error_banner(error: Option<&str>) -> String {
    error
        .map(|message| format!("<p class=\"error\">{}</p>\n", escape(message)))
        .unwrap_or_default()
}

fn salary_text(department: &Department) -> String {
    department
        .average_monthly_salary()
        .map(|salary| salary.to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// The department listing.
pub fn departments(departments: &[Department]) -> String {
    let mut rows = String::new();
    for department in departments {
        let id = department.to_dict().id;
        rows.push_str(&format!(
            "<tr><td><a href=\"/departments/{id}\">{name}</a></td><td>{salary}</td><td>{count}</td></tr>\n",
            id = escape(&id),
            name = escape(&department.name),
            salary = salary_text(department),
            count = department.employees_count(),
        ));
    }
    let body = format!(
        "<p><a href=\"/departments/new/edit\">New department</a></p>\n\
         <table>\n<tr><th>Name</th><th>Average monthly salary</th><th>Employees</th></tr>\n\
         {rows}</table>"
    );
    layout("Departments", &body)
}

/// A single department with its employees.
pub fn department(department: &Department) -> String {
    let id = escape(&department.to_dict().id);
    let mut employees = String::new();
    for employee in &department.employees {
        employees.push_str(&format!(
            "<li><a href=\"/employees/{id}\">{name}</a></li>\n",
            id = escape(&employee.to_dict().id),
            name = escape(&employee.full_name()),
        ));
    }
    let body = format!(
        "<dl>\n<dt>Average monthly salary</dt><dd>{salary}</dd>\n\
         <dt>Employees</dt><dd>{count}</dd>\n</dl>\n<ul>\n{employees}</ul>\n\
         <p><a href=\"/departments/{id}/edit\">Edit</a> | \
         <a href=\"/departments/{id}/delete\">Delete</a></p>",
        salary = salary_text(department),
        count = department.employees_count(),
    );
    layout(&department.name, &body)
}

/// The create/edit department form.
pub fn department_form(form: &DepartmentForm, error: Option<&str>) -> String {
    let (title, action) = if form.id == "None" {
        ("New department".to_string(), "/departments/new/edit".to_string())
    } else {
        (
            format!("Edit {}", form.name),
            format!("/departments/{}/edit", escape(&form.id)),
        )
    };
    let body = format!(
        "{error}<form method=\"post\" action=\"{action}\">\n\
         <label>Name <input type=\"text\" name=\"name\" value=\"{name}\" required></label>\n\
         <button type=\"submit\">Save</button>\n</form>",
        error = error_banner(error),
        name = escape(&form.name),
    );
    layout(&title, &body)
}

/// The delete department confirmation.
pub fn delete_department(department: &Department) -> String {
    let body = format!(
        "<p>Delete department {name} and its {count} employee(s)?</p>\n\
         <form method=\"post\" action=\"/departments/{id}/delete\">\
         <button type=\"submit\">Delete</button></form>",
        name = escape(&department.name),
        count = department.employees_count(),
        id = escape(&department.to_dict().id),
    );
    layout("Delete department", &body)
}

/// The employee listing.
pub fn employees(employees: &[Employee], filter: &EmployeeFilter) -> String {
    let mut rows = String::new();
    for employee in employees {
        let form = employee.to_dict();
        rows.push_str(&format!(
            "<tr><td><a href=\"/employees/{id}\">{name}</a></td><td>{born}</td>\
             <td>{salary}</td><td><a href=\"/departments/{department}\">{department}</a></td></tr>\n",
            id = escape(&form.id),
            name = escape(&employee.full_name()),
            born = escape(&form.date_of_birth),
            salary = escape(&form.monthly_salary),
            department = escape(&form.department_id),
        ));
    }
    let range = match (&filter.from_date, &filter.to_date) {
        (Some(from), Some(to)) if !from.is_empty() && !to.is_empty() => format!(
            "<p>Born between {} and {}</p>\n",
            escape(from),
            escape(to)
        ),
        _ => String::new(),
    };
    let body = format!(
        "{range}<p><a href=\"/employees/new/edit\">New employee</a></p>\n\
         <table>\n<tr><th>Name</th><th>Date of birth</th><th>Monthly salary</th>\
         <th>Department</th></tr>\n{rows}</table>"
    );
    layout("Employees", &body)
}

/// A single employee.
pub fn employee(employee: &Employee, department: Option<&Department>) -> String {
    let form = employee.to_dict();
    let department_name = department
        .map(|department| escape(&department.name))
        .unwrap_or_default();
    let body = format!(
        "<dl>\n<dt>Date of birth</dt><dd>{born}</dd>\n\
         <dt>Monthly salary</dt><dd>{salary}</dd>\n\
         <dt>Department</dt><dd><a href=\"/departments/{department_id}\">{department_name}</a></dd>\n\
         </dl>\n<p><a href=\"/employees/{id}/edit\">Edit</a> | \
         <a href=\"/employees/{id}/delete\">Delete</a></p>",
        born = escape(&form.date_of_birth),
        salary = escape(&form.monthly_salary),
        department_id = escape(&form.department_id),
        id = escape(&form.id),
    );
    layout(&employee.full_name(), &body)
}

/// The create/edit employee form.
pub fn employee_form(
    form: &EmployeeForm,
    departments: &[Department],
    today: NaiveDate,
    error: Option<&str>,
) -> String {
    let (title, action) = if form.id == "None" {
        ("New employee".to_string(), "/employees/new/edit".to_string())
    } else {
        (
            format!("Edit {} {}", form.last_name, form.first_name),
            format!("/employees/{}/edit", escape(&form.id)),
        )
    };
    let mut options = String::new();
    for department in departments {
        let id = department.to_dict().id;
        let selected = if id == form.department_id { " selected" } else { "" };
        options.push_str(&format!(
            "<option value=\"{id}\"{selected}>{name}</option>\n",
            id = escape(&id),
            name = escape(&department.name),
        ));
    }
    let body = format!(
        "{error}<form method=\"post\" action=\"{action}\">\n\
         <label>First name <input type=\"text\" name=\"first_name\" value=\"{first}\" required></label>\n\
         <label>Last name <input type=\"text\" name=\"last_name\" value=\"{last}\" required></label>\n\
         <label>Date of birth <input type=\"date\" name=\"date_of_birth\" value=\"{born}\" \
         min=\"1900-01-01\" max=\"{today}\" required></label>\n\
         <label>Monthly salary <input type=\"number\" step=\"0.01\" name=\"monthly_salary\" \
         value=\"{salary}\" required></label>\n\
         <label>Department <select name=\"department_id\">\n{options}</select></label>\n\
         <button type=\"submit\">Save</button>\n</form>",
        error = error_banner(error),
        first = escape(&form.first_name),
        last = escape(&form.last_name),
        born = escape(&form.date_of_birth),
        today = today.format(DATE_FORMAT),
        salary = escape(&form.monthly_salary),
    );
    layout(&title, &body)
}

/// The delete employee confirmation.
pub fn delete_employee(employee: &Employee) -> String {
    let body = format!(
        "<p>Delete employee {name}?</p>\n\
         <form method=\"post\" action=\"/employees/{id}/delete\">\
         <button type=\"submit\">Delete</button></form>",
        name = escape(&employee.full_name()),
        id = escape(&employee.to_dict().id),
    );
    layout("Delete employee", &body)
}

/// The birth date search form.
pub fn search(today: NaiveDate) -> String {
    let today = today.format(DATE_FORMAT);
    let body = format!(
        "<form method=\"get\" action=\"/employees\">\n\
         <label>Born from <input type=\"date\" name=\"from_date\" max=\"{today}\" required></label>\n\
         <label>to <input type=\"date\" name=\"to_date\" max=\"{today}\" required></label>\n\
         <button type=\"submit\">Search</button>\n</form>"
    );
    layout("Search employees", &body)
}

/// A bare error page.
pub fn error(message: &str) -> String {
    layout("Error", &error_banner(Some(message)))
}
