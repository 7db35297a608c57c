//! Loading seed records into the store.

use tracing::info;

use crate::config::SeedData;
use crate::error::AppResult;
use crate::models::{Department, Employee, FieldMap};

use super::Database;

impl Database {
    /// Creates the seed departments and their employees in one transaction.
    ///
    /// Does nothing when the store already holds departments, so restarting
    /// against a database file keeps what was committed there.
    ///
    /// Every record goes through `populate_from_dict`, so seed files are
    /// held to the same rules as form and API input. Returns the number of
    /// departments and employees created.
    pub async fn seed(&self, seed: &SeedData) -> AppResult<(usize, usize)> {
        let counts = self
            .transaction(|tx| {
                if !tx.departments()?.is_empty() {
                    return Ok((0, 0));
                }
                let mut employees_created = 0;
                for entry in &seed.departments {
                    let mut department = Department::default();
                    let name = FieldMap::new().with("name", entry.name.clone());
                    department.populate_from_dict(&name)?;
                    tx.save_department(&mut department)?;

                    for fields in &entry.employees {
                        let mut employee = Employee::default();
                        employee.populate_from_dict(&FieldMap::from(fields.clone()))?;
                        employee.department_id = department.id;
                        tx.save_employee(&mut employee)?;
                        employees_created += 1;
                    }
                }
                Ok((seed.departments.len(), employees_created))
            })
            .await?;

        info!(
            departments = counts.0,
            employees = counts.1,
            "Seed data loaded"
        );
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedDepartment;
    use crate::error::AppError;
    use serde_json::json;

    fn seed_department(name: &str, employees: Vec<serde_json::Value>) -> SeedDepartment {
        SeedDepartment {
            name: name.to_string(),
            employees: employees
                .into_iter()
                .map(|value| value.as_object().cloned().unwrap())
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_seed_creates_departments_and_employees() {
        let db = Database::open_in_memory().unwrap();
        let seed = SeedData {
            departments: vec![
                seed_department(
                    "Accounting",
                    vec![
                        json!({"first_name": "Anna", "last_name": "Smith",
                               "date_of_birth": "2000-11-11", "monthly_salary": "1000.24"}),
                        json!({"first_name": "Bob", "last_name": "Adams",
                               "date_of_birth": "1980-01-05", "monthly_salary": 900}),
                    ],
                ),
                seed_department("Logistics", vec![]),
            ],
        };

        assert_eq!(db.seed(&seed).await.unwrap(), (2, 2));

        let accounting = db
            .transaction(|tx| tx.get_department(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(accounting.name, "Accounting");
        assert_eq!(accounting.employees_count(), 2);
        assert_eq!(accounting.to_api_dict().average_monthly_salary, Some(950.12));
    }

    #[tokio::test]
    async fn test_invalid_seed_record_loads_nothing() {
        let db = Database::open_in_memory().unwrap();
        let seed = SeedData {
            departments: vec![seed_department(
                "Accounting",
                vec![json!({"first_name": "Anna", "last_name": "Smith",
                            "date_of_birth": "1850-01-01", "monthly_salary": "10.00"})],
            )],
        };

        let err = db.seed(&seed).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidValue { .. }));

        let count = db
            .transaction(|tx| Ok(tx.departments()?.len()))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_seed_skips_populated_store() {
        let db = Database::open_in_memory().unwrap();
        let seed = SeedData {
            departments: vec![seed_department("Accounting", vec![])],
        };

        assert_eq!(db.seed(&seed).await.unwrap(), (1, 0));
        assert_eq!(db.seed(&seed).await.unwrap(), (0, 0));

        let count = db
            .transaction(|tx| Ok(tx.departments()?.len()))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
