//! `SQLite` Org Store Implementation
//!
//! This module implements the `OrgStore` trait for `SQLite` databases.
//!
//! # Features
//! - File-based connections (`/path/to/org.db`)
//! - In-memory connections (`:memory:`), used by the test suite
//! - Foreign keys enforced per connection (`PRAGMA foreign_keys = ON`)
//!
//! # Implementation Notes
//! - Uses `rusqlite` (synchronous driver, no async needed)
//! - One connection behind a `Mutex`; the menu issues one statement at a time
//! - `SUM` over no rows yields NULL, surfaced as `None`

use rusqlite::{params, Connection, OpenFlags};
use std::sync::{Mutex, MutexGuard};

use crate::engine::{
    ConnectionConfig, DatabaseType, Department, DepartmentBudget, EmployeeListing,
    EmployeeSummary, NewEmployee, NewRole, OrgStore, Role, RoleListing, ServerInfo,
};
use crate::error::{OrgError, Result};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS department (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(30) NOT NULL
    );
    CREATE TABLE IF NOT EXISTS role (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title VARCHAR(30) NOT NULL,
        salary REAL NOT NULL,
        department_id INTEGER NOT NULL REFERENCES department(id)
    );
    CREATE TABLE IF NOT EXISTS employee (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name VARCHAR(30) NOT NULL,
        last_name VARCHAR(30) NOT NULL,
        role_id INTEGER NOT NULL REFERENCES role(id),
        manager_id INTEGER REFERENCES employee(id)
    );";

/// `SQLite` org store implementation
pub struct SqliteStore {
    conn: Mutex<Connection>,
    label: String,
}

impl SqliteStore {
    /// Open the database file named by `config`
    pub fn open(config: &ConnectionConfig) -> Result<Self> {
        // Validate config is for SQLite
        if config.engine != DatabaseType::SQLite {
            return Err(OrgError::invalid_input(format!(
                "Expected SQLite engine, got {}",
                config.engine
            )));
        }

        let file_path = config
            .file
            .as_ref()
            .ok_or_else(|| OrgError::invalid_input("SQLite requires 'file' parameter"))?;

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        let conn = Connection::open_with_flags(file_path, flags).map_err(|e| {
            OrgError::connection_failed(format!("Failed to open SQLite database: {e}"))
        })?;

        let label = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Self::from_connection(conn, label)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            OrgError::connection_failed(format!("Failed to open in-memory SQLite database: {e}"))
        })?;
        Self::from_connection(conn, ":memory:".to_string())
    }

    fn from_connection(conn: Connection, label: String) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON").map_err(|e| {
            OrgError::engine_error("sqlite", format!("Failed to enable foreign keys: {e}"))
        })?;

        tracing::debug!(database = %label, "opened sqlite store");
        Ok(Self { conn: Mutex::new(conn), label })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| OrgError::engine_error("sqlite", "Connection mutex poisoned"))
    }
}

impl OrgStore for SqliteStore {
    async fn server_info(&self) -> Result<ServerInfo> {
        let conn = self.lock()?;
        let version: String =
            conn.query_row("SELECT sqlite_version()", [], |row| row.get(0)).map_err(|e| {
                OrgError::connection_failed(format!("Failed to query SQLite version: {e}"))
            })?;

        Ok(ServerInfo {
            database_version: version.clone(),
            server_info: format!("SQLite {version}"),
            connected_database: self.label.clone(),
        })
    }

    async fn create_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| OrgError::query_failed(format!("Failed to create schema: {e}")))
    }

    async fn list_departments(&self) -> Result<Vec<Department>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, name FROM department ORDER BY id")
            .map_err(|e| OrgError::query_failed(format!("Failed to prepare query: {e}")))?;

        let departments = stmt
            .query_map([], |row| Ok(Department { id: row.get(0)?, name: row.get(1)? }))
            .map_err(|e| OrgError::query_failed(format!("Failed to query departments: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                OrgError::engine_error("sqlite", format!("Failed to read department: {e}"))
            })?;

        Ok(departments)
    }

    async fn list_roles(&self) -> Result<Vec<RoleListing>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT r.id, r.title, r.salary, d.name AS department
                 FROM role r
                 JOIN department d ON r.department_id = d.id
                 ORDER BY r.id",
            )
            .map_err(|e| OrgError::query_failed(format!("Failed to prepare query: {e}")))?;

        let roles = stmt
            .query_map([], |row| {
                Ok(RoleListing {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    salary: row.get(2)?,
                    department: row.get(3)?,
                })
            })
            .map_err(|e| OrgError::query_failed(format!("Failed to query roles: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| OrgError::engine_error("sqlite", format!("Failed to read role: {e}")))?;

        Ok(roles)
    }

    async fn list_role_choices(&self) -> Result<Vec<Role>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, title, salary, department_id FROM role ORDER BY id")
            .map_err(|e| OrgError::query_failed(format!("Failed to prepare query: {e}")))?;

        let roles = stmt
            .query_map([], |row| {
                Ok(Role {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    salary: row.get(2)?,
                    department_id: row.get(3)?,
                })
            })
            .map_err(|e| OrgError::query_failed(format!("Failed to query roles: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| OrgError::engine_error("sqlite", format!("Failed to read role: {e}")))?;

        Ok(roles)
    }

    async fn list_employees(&self) -> Result<Vec<EmployeeListing>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT e.id, e.first_name, e.last_name, r.title, d.name AS department, r.salary,
                        m.first_name || ' ' || m.last_name AS manager
                 FROM employee e
                 LEFT JOIN role r ON e.role_id = r.id
                 LEFT JOIN department d ON r.department_id = d.id
                 LEFT JOIN employee m ON e.manager_id = m.id
                 ORDER BY e.id",
            )
            .map_err(|e| OrgError::query_failed(format!("Failed to prepare query: {e}")))?;

        let employees = stmt
            .query_map([], |row| {
                Ok(EmployeeListing {
                    id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    title: row.get(3)?,
                    department: row.get(4)?,
                    salary: row.get(5)?,
                    manager: row.get(6)?,
                })
            })
            .map_err(|e| OrgError::query_failed(format!("Failed to query employees: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| OrgError::engine_error("sqlite", format!("Failed to read employee: {e}")))?;

        Ok(employees)
    }

    async fn list_employee_summaries(&self) -> Result<Vec<EmployeeSummary>> {
        let conn = self.lock()?;
        query_summaries(
            &conn,
            "SELECT id, first_name, last_name FROM employee ORDER BY id",
            params![],
        )
    }

    async fn list_managers(&self) -> Result<Vec<EmployeeSummary>> {
        let conn = self.lock()?;
        query_summaries(
            &conn,
            "SELECT DISTINCT m.id, m.first_name, m.last_name
             FROM employee m
             JOIN employee e ON e.manager_id = m.id
             ORDER BY m.id",
            params![],
        )
    }

    async fn add_department(&self, name: &str) -> Result<i32> {
        let conn = self.lock()?;
        conn.execute("INSERT INTO department (name) VALUES (?1)", params![name])
            .map_err(|e| OrgError::query_failed(format!("Failed to insert department: {e}")))?;
        last_insert_id(&conn)
    }

    async fn add_role(&self, role: &NewRole) -> Result<i32> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO role (title, salary, department_id) VALUES (?1, ?2, ?3)",
            params![role.title, role.salary, role.department_id],
        )
        .map_err(|e| OrgError::query_failed(format!("Failed to insert role: {e}")))?;
        last_insert_id(&conn)
    }

    async fn add_employee(&self, employee: &NewEmployee) -> Result<i32> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO employee (first_name, last_name, role_id, manager_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                employee.first_name,
                employee.last_name,
                employee.role_id,
                employee.manager_id
            ],
        )
        .map_err(|e| OrgError::query_failed(format!("Failed to insert employee: {e}")))?;
        last_insert_id(&conn)
    }

    async fn update_employee_role(&self, employee_id: i32, role_id: i32) -> Result<u64> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE employee SET role_id = ?1 WHERE id = ?2",
                params![role_id, employee_id],
            )
            .map_err(|e| OrgError::query_failed(format!("Failed to update employee role: {e}")))?;
        Ok(changed as u64)
    }

    async fn update_employee_manager(
        &self,
        employee_id: i32,
        manager_id: Option<i32>,
    ) -> Result<u64> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE employee SET manager_id = ?1 WHERE id = ?2",
                params![manager_id, employee_id],
            )
            .map_err(|e| {
                OrgError::query_failed(format!("Failed to update employee manager: {e}"))
            })?;
        Ok(changed as u64)
    }

    async fn employees_by_manager(&self, manager_id: i32) -> Result<Vec<EmployeeSummary>> {
        let conn = self.lock()?;
        query_summaries(
            &conn,
            "SELECT id, first_name, last_name FROM employee WHERE manager_id = ?1 ORDER BY id",
            [manager_id],
        )
    }

    async fn employees_by_department(&self, department_id: i32) -> Result<Vec<EmployeeSummary>> {
        let conn = self.lock()?;
        query_summaries(
            &conn,
            "SELECT id, first_name, last_name FROM employee
             WHERE role_id IN (SELECT id FROM role WHERE department_id = ?1)
             ORDER BY id",
            [department_id],
        )
    }

    async fn delete_department(&self, id: i32) -> Result<u64> {
        let conn = self.lock()?;
        let deleted = conn
            .execute("DELETE FROM department WHERE id = ?1", [id])
            .map_err(|e| OrgError::query_failed(format!("Failed to delete department: {e}")))?;
        Ok(deleted as u64)
    }

    async fn delete_role(&self, id: i32) -> Result<u64> {
        let conn = self.lock()?;
        let deleted = conn
            .execute("DELETE FROM role WHERE id = ?1", [id])
            .map_err(|e| OrgError::query_failed(format!("Failed to delete role: {e}")))?;
        Ok(deleted as u64)
    }

    async fn delete_employee(&self, id: i32) -> Result<u64> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| OrgError::query_failed(format!("Failed to begin transaction: {e}")))?;

        let released = tx
            .execute("UPDATE employee SET manager_id = NULL WHERE manager_id = ?1", [id])
            .map_err(|e| OrgError::query_failed(format!("Failed to release direct reports: {e}")))?;

        let deleted = tx
            .execute("DELETE FROM employee WHERE id = ?1", [id])
            .map_err(|e| OrgError::query_failed(format!("Failed to delete employee: {e}")))?;

        tx.commit()
            .map_err(|e| OrgError::query_failed(format!("Failed to commit transaction: {e}")))?;

        tracing::debug!(employee_id = id, released, deleted, "deleted employee");
        Ok(deleted as u64)
    }

    async fn department_budget(&self, department_id: i32) -> Result<DepartmentBudget> {
        let conn = self.lock()?;
        let total: Option<f64> = conn
            .query_row(
                "SELECT SUM(salary) AS total_budget FROM role WHERE department_id = ?1",
                [department_id],
                |row| row.get(0),
            )
            .map_err(|e| OrgError::query_failed(format!("Failed to query budget: {e}")))?;

        Ok(DepartmentBudget { department_id, total })
    }

    async fn close(self) -> Result<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| OrgError::engine_error("sqlite", "Connection mutex poisoned"))?;
        conn.close().map_err(|(_, e)| {
            OrgError::connection_failed(format!("Failed to close SQLite database: {e}"))
        })?;
        tracing::debug!(database = %self.label, "closed sqlite store");
        Ok(())
    }
}

/// Run a query producing `(id, first_name, last_name)` rows
fn query_summaries<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<EmployeeSummary>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| OrgError::query_failed(format!("Failed to prepare query: {e}")))?;

    let employees = stmt
        .query_map(params, |row| {
            Ok(EmployeeSummary {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
            })
        })
        .map_err(|e| OrgError::query_failed(format!("Failed to query employees: {e}")))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| OrgError::engine_error("sqlite", format!("Failed to read employee: {e}")))?;

    Ok(employees)
}

fn last_insert_id(conn: &Connection) -> Result<i32> {
    i32::try_from(conn.last_insert_rowid()).map_err(|_| {
        OrgError::engine_error("sqlite", "Generated id does not fit in a 32-bit integer")
    })
}
