//! Employee model and its validation rules.
//!
//! This module defines the [`Employee`] record together with the string
//! view used to pre-fill edit forms and the native view returned by the
//! JSON API.

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::fields::{self, FieldMap};

/// Message reported when a date of birth cannot be parsed.
pub const DATE_FORMAT_INVALID: &str = "Date format is invalid. Should be YYYY-MM-DD";

/// Message reported when a date of birth is outside the accepted range.
pub const DATE_OUT_OF_RANGE: &str = "Date is not in range between 1900-01-01 and today";

/// Message reported when a salary is not a decimal number.
pub const SALARY_INVALID: &str = "Salary must be a decimal number";

/// Message reported when a department reference is not an integer.
pub const DEPARTMENT_INVALID: &str = "Department is not valid";

/// Returns the earliest accepted date of birth, 1900-01-01.
pub fn earliest_birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// A person record that always belongs to exactly one department.
///
/// Every field except `id` can be set through
/// [`populate_from_dict`](Employee::populate_from_dict); `id` is assigned by
/// the store on first save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Employee {
    /// Identifier, `None` until the record is first saved.
    pub id: Option<i64>,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Date of birth, within `[1900-01-01, today)`.
    pub date_of_birth: Option<NaiveDate>,
    /// Monthly salary with two fractional digits.
    pub monthly_salary: Option<Decimal>,
    /// Identifier of the owning department.
    pub department_id: Option<i64>,
}

/// String view of an [`Employee`], used to pre-fill edit forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeForm {
    /// Identifier, or `"None"` before the first save.
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// ISO date, or empty when unset.
    pub date_of_birth: String,
    /// Exact decimal text, or empty when unset.
    pub monthly_salary: String,
    /// Department identifier, or empty when unset.
    pub department_id: String,
}

/// Native view of an [`Employee`], returned by the JSON API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct EmployeeApi {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub monthly_salary: Option<f64>,
    pub department_id: Option<i64>,
}

impl Employee {
    /// Returns `last_name` and `first_name` joined by a single space.
    ///
    /// # Examples
    ///
    /// ```
    /// use department_app::models::Employee;
    ///
    /// let employee = Employee {
    ///     first_name: "Anna".to_string(),
    ///     last_name: "Smith".to_string(),
    ///     ..Employee::default()
    /// };
    /// assert_eq!(employee.full_name(), "Smith Anna");
    /// ```
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }

    /// Returns the string view of this employee.
    pub fn to_dict(&self) -> EmployeeForm {
        EmployeeForm {
            id: self
                .id
                .map_or_else(|| "None".to_string(), |id| id.to_string()),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            date_of_birth: self
                .date_of_birth
                .map(|date| date.format(fields::DATE_FORMAT).to_string())
                .unwrap_or_default(),
            monthly_salary: self
                .monthly_salary
                .map(|salary| salary.to_string())
                .unwrap_or_default(),
            department_id: self
                .department_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        }
    }

    /// Returns the native view of this employee.
    ///
    /// The salary only becomes floating point here.
    pub fn to_api_dict(&self) -> EmployeeApi {
        EmployeeApi {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            date_of_birth: self.date_of_birth,
            monthly_salary: self.monthly_salary.and_then(fields::to_float),
            department_id: self.department_id,
        }
    }

    /// Validates `data` against today's date and assigns the fields it names.
    ///
    /// See [`populate_from_dict_as_of`](Employee::populate_from_dict_as_of).
    pub fn populate_from_dict(&mut self, data: &FieldMap) -> AppResult<()> {
        self.populate_from_dict_as_of(data, Local::now().date_naive())
    }

    /// Validates `data` and assigns the fields it names.
    ///
    /// Checks run in a fixed order: first name, last name, date of birth,
    /// salary, department. Every candidate value is computed before any is
    /// assigned, so on error the employee is left exactly as it was. Absent
    /// keys keep their current value.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidType`] when a name is not a string, and
    /// [`AppError::InvalidValue`] for every other rejected field.
    pub fn populate_from_dict_as_of(
        &mut self,
        data: &FieldMap,
        today: NaiveDate,
    ) -> AppResult<()> {
        let first_name = name_field(data, "first_name", "First name")?;
        let last_name = name_field(data, "last_name", "Last name")?;

        let date_of_birth = match data.get("date_of_birth") {
            Some(value) => Some(birth_date(value, today)?),
            None => self.date_of_birth,
        };

        let monthly_salary = match data.get("monthly_salary") {
            Some(value) => Some(
                fields::as_money(value).ok_or_else(|| AppError::invalid_value(SALARY_INVALID))?,
            ),
            None => self.monthly_salary,
        };

        let department_id = match data.get("department_id") {
            Some(value) => Some(
                fields::as_integer(value)
                    .ok_or_else(|| AppError::invalid_value(DEPARTMENT_INVALID))?,
            ),
            None => self.department_id,
        };

        if let Some(first_name) = first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = last_name {
            self.last_name = last_name;
        }
        self.date_of_birth = date_of_birth;
        self.monthly_salary = monthly_salary;
        self.department_id = department_id;
        Ok(())
    }
}

/// Reads an optional, non-empty name field.
fn name_field(data: &FieldMap, key: &str, label: &str) -> AppResult<Option<String>> {
    let Some(value) = data.get(key) else {
        return Ok(None);
    };
    let text = fields::as_text(value)
        .ok_or_else(|| AppError::invalid_type(format!("{label} must be a string")))?;
    if text.is_empty() {
        return Err(AppError::invalid_value(format!("{label} must not be empty")));
    }
    Ok(Some(text.to_string()))
}

/// Parses a date of birth and checks it lies in `[1900-01-01, today)`.
fn birth_date(value: &serde_json::Value, today: NaiveDate) -> AppResult<NaiveDate> {
    let date =
        fields::as_date(value).ok_or_else(|| AppError::invalid_value(DATE_FORMAT_INVALID))?;
    if date < earliest_birth_date() || date >= today {
        return Err(AppError::invalid_value(DATE_OUT_OF_RANGE));
    }
    Ok(date)
}
