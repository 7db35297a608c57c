//! Core data models for the department application.
//!
//! This module contains the two entities, the untrusted field mapping they
//! are populated from, and their serialization views.

mod department;
mod employee;
mod fields;

pub use department::{Department, DepartmentApi, DepartmentForm};
pub use employee::{
    DATE_FORMAT_INVALID, DATE_OUT_OF_RANGE, DEPARTMENT_INVALID, Employee, EmployeeApi,
    EmployeeForm, SALARY_INVALID, earliest_birth_date,
};
pub use fields::{DATE_FORMAT, FieldMap, MONEY_SCALE, to_float, to_money};
