//! Department model and its aggregate properties.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::employee::Employee;
use super::fields::{self, FieldMap};

/// An organizational unit.
///
/// `employees` holds the employees whose `department_id` matches this
/// department's `id`, as loaded by the store. The aggregates are computed
/// from that list on every call, so adding or removing an employee is
/// reflected immediately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Department {
    /// Identifier, `None` until the record is first saved.
    pub id: Option<i64>,
    /// Unique, non-empty name.
    pub name: String,
    /// Employees belonging to this department.
    pub employees: Vec<Employee>,
}

/// String view of a [`Department`], used to pre-fill edit forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentForm {
    /// Identifier, or `"None"` before the first save.
    pub id: String,
    /// Name, or empty when unset.
    pub name: String,
}

/// Native view of a [`Department`], returned by the JSON API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentApi {
    /// Identifier, `null` before the first save.
    pub id: Option<i64>,
    /// Name.
    pub name: String,
    /// Mean monthly salary, `null` without employees.
    pub average_monthly_salary: Option<f64>,
    /// Number of employees.
    pub employees_count: usize,
}

impl Department {
    /// Returns the number of employees in this department.
    pub fn employees_count(&self) -> usize {
        self.employees.len()
    }

    /// Returns the mean monthly salary rounded to two places.
    ///
    /// Returns `None` when the department has no employees. Employees
    /// without a salary count as zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use department_app::models::{Department, Employee};
    /// use rust_decimal::Decimal;
    ///
    /// let mut department = Department::default();
    /// assert_eq!(department.average_monthly_salary(), None);
    ///
    /// for cents in [100024, 90000] {
    ///     department.employees.push(Employee {
    ///         monthly_salary: Some(Decimal::new(cents, 2)),
    ///         ..Employee::default()
    ///     });
    /// }
    /// assert_eq!(department.average_monthly_salary(), Some(Decimal::new(95012, 2)));
    /// ```
    pub fn average_monthly_salary(&self) -> Option<Decimal> {
        let count = self.employees.len();
        if count == 0 {
            return None;
        }
        let total: Decimal = self
            .employees
            .iter()
            .filter_map(|employee| employee.monthly_salary)
            .sum();
        let mean = total.checked_div(Decimal::from(count))?;
        Some(mean.round_dp_with_strategy(fields::MONEY_SCALE, RoundingStrategy::MidpointNearestEven))
    }

    /// Returns the string view of this department.
    pub fn to_dict(&self) -> DepartmentForm {
        DepartmentForm {
            id: self
                .id
                .map_or_else(|| "None".to_string(), |id| id.to_string()),
            name: self.name.clone(),
        }
    }

    /// Returns the native view of this department.
    pub fn to_api_dict(&self) -> DepartmentApi {
        DepartmentApi {
            id: self.id,
            name: self.name.clone(),
            average_monthly_salary: self.average_monthly_salary().and_then(fields::to_float),
            employees_count: self.employees_count(),
        }
    }

    /// Validates `data` and assigns the name if one is given.
    ///
    /// An absent `name` leaves the department untouched.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidType`] when `name` is not a string and
    /// [`AppError::InvalidValue`] when it is empty.
    pub fn populate_from_dict(&mut self, data: &FieldMap) -> AppResult<()> {
        let Some(value) = data.get("name") else {
            return Ok(());
        };
        let name =
            fields::as_text(value).ok_or_else(|| AppError::invalid_type("Name must be a string"))?;
        if name.is_empty() {
            return Err(AppError::invalid_value("Name must not be empty"));
        }
        self.name = name.to_string();
        Ok(())
    }
}
