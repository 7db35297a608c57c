//! SQLite-backed relational store with closure-scoped transactions.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Params, Row, params};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{Department, Employee, MONEY_SCALE, to_money};

/// Salaries are stored in hundredths; the check keeps them inside the
/// range of a `NUMERIC(10, 2)` column.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS department (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(80) NOT NULL UNIQUE CHECK (length(name) BETWEEN 1 AND 80)
    );

    CREATE TABLE IF NOT EXISTS employee (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name VARCHAR(80) NOT NULL CHECK (length(first_name) BETWEEN 1 AND 80),
        last_name VARCHAR(80) NOT NULL CHECK (length(last_name) BETWEEN 1 AND 80),
        date_of_birth DATE NOT NULL,
        monthly_salary INTEGER NOT NULL CHECK (abs(monthly_salary) <= 9999999999),
        department_id INTEGER NOT NULL REFERENCES department(id)
    );

    CREATE INDEX IF NOT EXISTS idx_employee_department
        ON employee(department_id);
";

const EMPLOYEE_COLUMNS: &str =
    "id, first_name, last_name, date_of_birth, monthly_salary, department_id";

/// Department and employee tables in one SQLite connection.
///
/// The connection sits behind an async mutex and all access goes through
/// [`Database::transaction`].
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens (creating if needed) a database file.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] if the file cannot be opened or the
    /// schema cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Opening database file");
        Self::initialize(Connection::open(path)?)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] if the schema cannot be created.
    pub fn open_in_memory() -> AppResult<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> AppResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs `f` inside a transaction.
    ///
    /// If `f` returns `Ok` the transaction is committed; if it returns
    /// `Err`, or the commit itself fails, everything `f` did is rolled back.
    pub async fn transaction<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Transaction<'_>) -> AppResult<T>,
    {
        let mut conn = self.conn.lock().await;
        let mut tx = Transaction {
            tx: conn.transaction()?,
        };
        match f(&mut tx) {
            Ok(value) => {
                tx.tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "Transaction rolled back");
                if let Err(rollback) = tx.tx.rollback() {
                    warn!(error = %rollback, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}

/// A unit of work against the tables, see [`Database::transaction`].
pub struct Transaction<'a> {
    tx: rusqlite::Transaction<'a>,
}

impl Transaction<'_> {
    /// Loads a department together with its employees.
    pub fn get_department(&self, id: i64) -> AppResult<Option<Department>> {
        let name: Option<String> = self
            .tx
            .query_row("SELECT name FROM department WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?;
        name.map(|name| self.hydrate(id, name)).transpose()
    }

    /// Loads every department, ordered by id.
    pub fn departments(&self) -> AppResult<Vec<Department>> {
        let mut statement = self
            .tx
            .prepare("SELECT id, name FROM department ORDER BY id")?;
        let rows = statement
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<(i64, String)>, _>>()?;
        rows.into_iter()
            .map(|(id, name)| self.hydrate(id, name))
            .collect()
    }

    /// Loads every department, highest average salary first.
    ///
    /// Departments without employees come last. Ties keep id order.
    pub fn departments_by_average_salary(&self) -> AppResult<Vec<Department>> {
        let mut departments = self.departments()?;
        departments.sort_by_cached_key(|department| {
            std::cmp::Reverse(department.average_monthly_salary())
        });
        Ok(departments)
    }

    /// Loads a single employee.
    pub fn get_employee(&self, id: i64) -> AppResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employee WHERE id = ?1");
        Ok(self.tx.query_row(&sql, [id], employee_from_row).optional()?)
    }

    /// Loads every employee, ordered by id.
    pub fn employees(&self) -> AppResult<Vec<Employee>> {
        self.query_employees("ORDER BY id", [])
    }

    /// Loads employees ordered by full name.
    ///
    /// With `born_between`, only employees whose date of birth lies in the
    /// inclusive range are returned.
    pub fn employees_by_full_name(
        &self,
        born_between: Option<(NaiveDate, NaiveDate)>,
    ) -> AppResult<Vec<Employee>> {
        const ORDER: &str = "ORDER BY last_name || ' ' || first_name, id";
        match born_between {
            Some((from, to)) => self.query_employees(
                &format!("WHERE date_of_birth BETWEEN ?1 AND ?2 {ORDER}"),
                params![from, to],
            ),
            None => self.query_employees(ORDER, []),
        }
    }

    /// Inserts or updates a department, assigning its id on first save.
    ///
    /// # Errors
    ///
    /// Fails on an empty, over-long or duplicate name, or an id that is not
    /// stored.
    pub fn save_department(&mut self, department: &mut Department) -> AppResult<()> {
        match department.id {
            Some(id) => {
                let updated = self.tx.execute(
                    "UPDATE department SET name = ?1 WHERE id = ?2",
                    params![department.name, id],
                )?;
                if updated == 0 {
                    return Err(AppError::storage(format!("department {id} does not exist")));
                }
            }
            None => {
                self.tx.execute(
                    "INSERT INTO department (name) VALUES (?1)",
                    [&department.name],
                )?;
                department.id = Some(self.tx.last_insert_rowid());
            }
        }
        Ok(())
    }

    /// Inserts or updates an employee, assigning its id on first save.
    ///
    /// # Errors
    ///
    /// Fails when a required column is unset or too long, the salary does
    /// not fit the column, the department does not exist, or the id is not
    /// stored.
    pub fn save_employee(&mut self, employee: &mut Employee) -> AppResult<()> {
        let salary = employee.monthly_salary.map(to_hundredths).transpose()?;
        match employee.id {
            Some(id) => {
                let updated = self.tx.execute(
                    "UPDATE employee SET first_name = ?1, last_name = ?2, date_of_birth = ?3, \
                     monthly_salary = ?4, department_id = ?5 WHERE id = ?6",
                    params![
                        employee.first_name,
                        employee.last_name,
                        employee.date_of_birth,
                        salary,
                        employee.department_id,
                        id
                    ],
                )?;
                if updated == 0 {
                    return Err(AppError::storage(format!("employee {id} does not exist")));
                }
            }
            None => {
                self.tx.execute(
                    "INSERT INTO employee \
                     (first_name, last_name, date_of_birth, monthly_salary, department_id) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        employee.first_name,
                        employee.last_name,
                        employee.date_of_birth,
                        salary,
                        employee.department_id
                    ],
                )?;
                employee.id = Some(self.tx.last_insert_rowid());
            }
        }
        Ok(())
    }

    /// Deletes an employee.
    pub fn delete_employee(&mut self, id: i64) -> AppResult<()> {
        let deleted = self.tx.execute("DELETE FROM employee WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(AppError::storage(format!("employee {id} does not exist")));
        }
        Ok(())
    }

    /// Deletes a department that no employee references any more.
    pub fn delete_department(&mut self, id: i64) -> AppResult<()> {
        let deleted = self
            .tx
            .execute("DELETE FROM department WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(AppError::storage(format!("department {id} does not exist")));
        }
        Ok(())
    }

    /// Deletes every employee of `department`, then the department itself.
    ///
    /// Works from the employees loaded with `department`. If any of the
    /// deletions fails the error is returned and the enclosing transaction
    /// rolls all of them back.
    pub fn delete_department_cascade(&mut self, department: &Department) -> AppResult<()> {
        let id = department
            .id
            .ok_or_else(|| AppError::storage("department has not been saved"))?;
        for employee in &department.employees {
            let employee_id = employee
                .id
                .ok_or_else(|| AppError::storage("employee has not been saved"))?;
            self.delete_employee(employee_id)?;
        }
        self.delete_department(id)
    }

    fn hydrate(&self, id: i64, name: String) -> AppResult<Department> {
        Ok(Department {
            id: Some(id),
            name,
            employees: self.query_employees("WHERE department_id = ?1 ORDER BY id", [id])?,
        })
    }

    fn query_employees<P: Params>(&self, clause: &str, params: P) -> AppResult<Vec<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employee {clause}");
        let mut statement = self.tx.prepare(&sql)?;
        let employees = statement
            .query_map(params, employee_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(employees)
    }
}

fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: Some(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        date_of_birth: Some(row.get(3)?),
        monthly_salary: Some(Decimal::new(row.get(4)?, MONEY_SCALE)),
        department_id: Some(row.get(5)?),
    })
}

fn to_hundredths(salary: Decimal) -> AppResult<i64> {
    let mut amount = to_money(salary);
    amount.rescale(MONEY_SCALE);
    i64::try_from(amount.mantissa())
        .map_err(|_| AppError::storage("employee.monthly_salary out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn department(name: &str) -> Department {
        Department {
            name: name.to_string(),
            ..Department::default()
        }
    }

    fn employee(first: &str, last: &str, born: &str, salary: &str, department_id: i64) -> Employee {
        Employee {
            id: None,
            first_name: first.to_string(),
            last_name: last.to_string(),
            date_of_birth: Some(date(born)),
            monthly_salary: Some(Decimal::from_str(salary).unwrap()),
            department_id: Some(department_id),
        }
    }

    async fn seed_into(db: &Database) {
        db.transaction(|tx| {
            let mut accounting = department("Accounting");
            tx.save_department(&mut accounting)?;
            let mut logistics = department("Logistics");
            tx.save_department(&mut logistics)?;
            let id = accounting.id.unwrap();
            tx.save_employee(&mut employee("Anna", "Smith", "2000-11-11", "1000.24", id))?;
            tx.save_employee(&mut employee("Bob", "Adams", "1980-01-05", "900.00", id))?;
            Ok(())
        })
        .await
        .unwrap();
    }

    /// Creates "Accounting" (with two employees) and "Logistics" (empty).
    async fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        seed_into(&db).await;
        db
    }

    fn is_storage<T>(result: AppResult<T>) -> bool {
        matches!(result, Err(AppError::Storage { .. }))
    }

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let db = Database::open_in_memory().unwrap();
        let (first, second) = db
            .transaction(|tx| {
                let mut a = department("A");
                let mut b = department("B");
                tx.save_department(&mut a)?;
                tx.save_department(&mut b)?;
                Ok((a.id, b.id))
            })
            .await
            .unwrap();
        assert_eq!(first, Some(1));
        assert_eq!(second, Some(2));
    }

    #[tokio::test]
    async fn test_department_is_hydrated_with_employees() {
        let db = seeded().await;
        let accounting = db.transaction(|tx| tx.get_department(1)).await.unwrap();
        let accounting = accounting.unwrap();

        assert_eq!(accounting.employees_count(), 2);
        assert_eq!(
            accounting.average_monthly_salary(),
            Some(Decimal::from_str("950.12").unwrap())
        );
    }

    #[tokio::test]
    async fn test_employee_round_trips_exactly() {
        let db = seeded().await;
        let anna = db.transaction(|tx| tx.get_employee(1)).await.unwrap();
        assert_eq!(
            anna,
            Some(Employee {
                id: Some(1),
                ..employee("Anna", "Smith", "2000-11-11", "1000.24", 1)
            })
        );
    }

    #[tokio::test]
    async fn test_missing_records_load_as_none() {
        let db = seeded().await;
        let (department, employee) = db
            .transaction(|tx| Ok((tx.get_department(9)?, tx.get_employee(9)?)))
            .await
            .unwrap();
        assert!(department.is_none());
        assert!(employee.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_department_name_is_rejected() {
        let db = seeded().await;
        let result = db
            .transaction(|tx| tx.save_department(&mut department("Accounting")))
            .await;
        assert!(is_storage(result));
    }

    #[tokio::test]
    async fn test_empty_department_name_is_rejected() {
        let db = seeded().await;
        let result = db
            .transaction(|tx| tx.save_department(&mut Department::default()))
            .await;
        assert!(is_storage(result));
    }

    #[tokio::test]
    async fn test_names_longer_than_column_are_rejected() {
        let db = seeded().await;
        let long = "x".repeat(200);

        let result = db
            .transaction(|tx| tx.save_department(&mut department(&long)))
            .await;
        assert!(is_storage(result));

        let result = db
            .transaction(|tx| {
                tx.save_employee(&mut employee(&long, "Doe", "1990-01-01", "1.00", 1))
            })
            .await;
        assert!(is_storage(result));

        let result = db
            .transaction(|tx| tx.save_department(&mut department(&"y".repeat(80))))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_renaming_department_to_its_own_name_is_allowed() {
        let db = seeded().await;
        db.transaction(|tx| {
            let mut accounting = tx.get_department(1)?.unwrap();
            tx.save_department(&mut accounting)
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_saving_unknown_id_is_rejected() {
        let db = seeded().await;
        let result = db
            .transaction(|tx| {
                let mut ghost = Department {
                    id: Some(42),
                    ..department("Ghost")
                };
                tx.save_department(&mut ghost)
            })
            .await;
        assert!(is_storage(result));
    }

    #[tokio::test]
    async fn test_employee_requires_existing_department() {
        let db = seeded().await;
        let result = db
            .transaction(|tx| {
                tx.save_employee(&mut employee("Carl", "Doe", "1990-01-01", "1.00", 42))
            })
            .await;
        assert!(is_storage(result));
    }

    #[tokio::test]
    async fn test_employee_requires_all_columns() {
        let db = seeded().await;
        let result = db
            .transaction(|tx| {
                let mut blank = Employee {
                    first_name: "Carl".to_string(),
                    ..Employee::default()
                };
                tx.save_employee(&mut blank)
            })
            .await;
        assert!(is_storage(result));
    }

    #[tokio::test]
    async fn test_salary_must_fit_column() {
        let db = seeded().await;
        let result = db
            .transaction(|tx| {
                tx.save_employee(&mut employee("Carl", "Doe", "1990-01-01", "100000000.00", 1))
            })
            .await;
        assert!(is_storage(result));

        let largest = db
            .transaction(|tx| {
                tx.save_employee(&mut employee("Carl", "Doe", "1990-01-01", "99999999.99", 1))
            })
            .await;
        assert!(largest.is_ok());
    }

    #[tokio::test]
    async fn test_failed_transaction_rolls_back() {
        let db = seeded().await;
        let result: AppResult<()> = db
            .transaction(|tx| {
                tx.save_department(&mut department("Research"))?;
                Err(AppError::storage("boom"))
            })
            .await;
        assert!(result.is_err());

        let names: Vec<String> = db
            .transaction(|tx| Ok(tx.departments()?.into_iter().map(|d| d.name).collect()))
            .await
            .unwrap();
        assert_eq!(names, vec!["Accounting", "Logistics"]);
    }

    #[tokio::test]
    async fn test_commits_survive_reopening_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("departments.db");

        let db = Database::open(&path).unwrap();
        seed_into(&db).await;
        db.transaction(|tx| tx.save_department(&mut department("Committed")))
            .await
            .unwrap();
        drop(db);

        let reopened = Database::open(&path).unwrap();
        let (names, employees) = reopened
            .transaction(|tx| {
                let names: Vec<String> =
                    tx.departments()?.into_iter().map(|d| d.name).collect();
                Ok((names, tx.employees()?.len()))
            })
            .await
            .unwrap();
        assert_eq!(names, vec!["Accounting", "Logistics", "Committed"]);
        assert_eq!(employees, 2);
    }

    #[tokio::test]
    async fn test_departments_sorted_by_average_salary() {
        let db = seeded().await;
        let names: Vec<String> = db
            .transaction(|tx| {
                let mut research = department("Research");
                tx.save_department(&mut research)?;
                let id = research.id.unwrap();
                tx.save_employee(&mut employee("Dora", "Lee", "1970-03-03", "2000.00", id))?;
                Ok(tx
                    .departments_by_average_salary()?
                    .into_iter()
                    .map(|d| d.name)
                    .collect())
            })
            .await
            .unwrap();
        assert_eq!(names, vec!["Research", "Accounting", "Logistics"]);
    }

    #[tokio::test]
    async fn test_employees_sorted_by_full_name() {
        let db = seeded().await;
        let names: Vec<String> = db
            .transaction(|tx| {
                Ok(tx
                    .employees_by_full_name(None)?
                    .iter()
                    .map(Employee::full_name)
                    .collect())
            })
            .await
            .unwrap();
        assert_eq!(names, vec!["Adams Bob", "Smith Anna"]);
    }

    async fn born_between(db: &Database, from: &str, to: &str) -> usize {
        let range = Some((date(from), date(to)));
        db.transaction(|tx| Ok(tx.employees_by_full_name(range)?.len()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_birth_date_filter_is_inclusive() {
        let db = seeded().await;
        assert_eq!(born_between(&db, "2000-11-11", "2000-11-11").await, 1);
        assert_eq!(born_between(&db, "1980-01-05", "2000-11-11").await, 2);
        assert_eq!(born_between(&db, "1980-01-06", "2000-11-10").await, 0);
    }

    #[tokio::test]
    async fn test_department_with_employees_cannot_be_deleted_directly() {
        let db = seeded().await;
        let result = db.transaction(|tx| tx.delete_department(1)).await;
        assert!(is_storage(result));
    }

    #[tokio::test]
    async fn test_cascade_deletes_department_and_employees() {
        let db = seeded().await;
        db.transaction(|tx| {
            let accounting = tx.get_department(1)?.unwrap();
            tx.delete_department_cascade(&accounting)
        })
        .await
        .unwrap();

        let (departments, employees) = db
            .transaction(|tx| Ok((tx.departments()?.len(), tx.employees()?.len())))
            .await
            .unwrap();
        assert_eq!(departments, 1);
        assert_eq!(employees, 0);
    }

    #[tokio::test]
    async fn test_failed_cascade_commits_nothing() {
        let db = seeded().await;
        let stale = db
            .transaction(|tx| Ok(tx.get_department(1)?.unwrap()))
            .await
            .unwrap();

        // Someone else removes one employee after the snapshot was taken.
        let removed = stale.employees[1].id.unwrap();
        db.transaction(|tx| tx.delete_employee(removed)).await.unwrap();

        let result = db
            .transaction(|tx| tx.delete_department_cascade(&stale))
            .await;
        assert!(is_storage(result));

        let accounting = db
            .transaction(|tx| tx.get_department(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(accounting.employees_count(), 1);
    }
}
