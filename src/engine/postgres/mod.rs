//! `PostgreSQL` Org Store Implementation
//!
//! This module implements the `OrgStore` trait for `PostgreSQL` databases.
//!
//! # Implementation Notes
//! - Uses `tokio-postgres` (async driver, requires tokio runtime)
//! - One client; the connection future runs on a spawned task until the
//!   client is dropped
//! - NUMERIC salaries are cast to `float8` in SQL so they decode as `f64`
//! - Generated ids come back through `RETURNING id`

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_postgres::types::FromSql;
use tokio_postgres::{Client, Config, NoTls, Row};

use crate::engine::{
    ConnectionConfig, DatabaseType, Department, DepartmentBudget, EmployeeListing,
    EmployeeSummary, NewEmployee, NewRole, OrgStore, Role, RoleListing, ServerInfo,
};
use crate::error::{OrgError, Result};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS department (
        id SERIAL PRIMARY KEY,
        name VARCHAR(30) NOT NULL
    );
    CREATE TABLE IF NOT EXISTS role (
        id SERIAL PRIMARY KEY,
        title VARCHAR(30) NOT NULL,
        salary NUMERIC(10, 2) NOT NULL,
        department_id INTEGER NOT NULL REFERENCES department(id)
    );
    CREATE TABLE IF NOT EXISTS employee (
        id SERIAL PRIMARY KEY,
        first_name VARCHAR(30) NOT NULL,
        last_name VARCHAR(30) NOT NULL,
        role_id INTEGER NOT NULL REFERENCES role(id),
        manager_id INTEGER REFERENCES employee(id)
    );";

/// `PostgreSQL` org store implementation
pub struct PostgresStore {
    client: Mutex<Client>,
    connection: JoinHandle<()>,
}

impl PostgresStore {
    /// Connect and spawn the connection driver task
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        // Validate config is for PostgreSQL
        if config.engine != DatabaseType::Postgres {
            return Err(OrgError::invalid_input(format!(
                "Expected PostgreSQL engine, got {}",
                config.engine
            )));
        }

        let pg_config = build_pg_config(config)?;

        let (client, connection) = pg_config.connect(NoTls).await.map_err(|e| {
            OrgError::connection_failed(format!("Failed to connect to PostgreSQL: {e}"))
        })?;

        // Connection errors are logged without the connection string
        let connection = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(error = %e, "postgres connection closed with error");
            }
        });

        tracing::debug!(target_db = %config.describe(), "opened postgres client");
        Ok(Self { client: Mutex::new(client), connection })
    }
}

impl OrgStore for PostgresStore {
    async fn server_info(&self) -> Result<ServerInfo> {
        let client = self.client.lock().await;
        let row = client
            .query_one("SELECT current_setting('server_version'), current_database()", &[])
            .await
            .map_err(|e| {
                OrgError::connection_failed(format!("Failed to query PostgreSQL version: {e}"))
            })?;

        let database_version: String = column(&row, 0, "server_version")?;
        let connected_database: String = column(&row, 1, "current_database")?;

        Ok(ServerInfo {
            server_info: format!("PostgreSQL {database_version}"),
            database_version,
            connected_database,
        })
    }

    async fn create_schema(&self) -> Result<()> {
        let client = self.client.lock().await;
        client
            .batch_execute(SCHEMA)
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to create schema: {e}")))
    }

    async fn list_departments(&self) -> Result<Vec<Department>> {
        let client = self.client.lock().await;
        let rows = client
            .query("SELECT id, name FROM department ORDER BY id", &[])
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to query departments: {e}")))?;

        rows.iter()
            .map(|row| Ok(Department { id: column(row, 0, "id")?, name: column(row, 1, "name")? }))
            .collect()
    }

    async fn list_roles(&self) -> Result<Vec<RoleListing>> {
        let client = self.client.lock().await;
        let rows = client
            .query(
                "SELECT r.id, r.title, r.salary::float8, d.name AS department
                 FROM role r
                 JOIN department d ON r.department_id = d.id
                 ORDER BY r.id",
                &[],
            )
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to query roles: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(RoleListing {
                    id: column(row, 0, "id")?,
                    title: column(row, 1, "title")?,
                    salary: column(row, 2, "salary")?,
                    department: column(row, 3, "department")?,
                })
            })
            .collect()
    }

    async fn list_role_choices(&self) -> Result<Vec<Role>> {
        let client = self.client.lock().await;
        let rows = client
            .query("SELECT id, title, salary::float8, department_id FROM role ORDER BY id", &[])
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to query roles: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(Role {
                    id: column(row, 0, "id")?,
                    title: column(row, 1, "title")?,
                    salary: column(row, 2, "salary")?,
                    department_id: column(row, 3, "department_id")?,
                })
            })
            .collect()
    }

    async fn list_employees(&self) -> Result<Vec<EmployeeListing>> {
        let client = self.client.lock().await;
        let rows = client
            .query(
                "SELECT e.id, e.first_name, e.last_name, r.title, d.name AS department,
                        r.salary::float8, m.first_name || ' ' || m.last_name AS manager
                 FROM employee e
                 LEFT JOIN role r ON e.role_id = r.id
                 LEFT JOIN department d ON r.department_id = d.id
                 LEFT JOIN employee m ON e.manager_id = m.id
                 ORDER BY e.id",
                &[],
            )
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to query employees: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(EmployeeListing {
                    id: column(row, 0, "id")?,
                    first_name: column(row, 1, "first_name")?,
                    last_name: column(row, 2, "last_name")?,
                    title: column(row, 3, "title")?,
                    department: column(row, 4, "department")?,
                    salary: column(row, 5, "salary")?,
                    manager: column(row, 6, "manager")?,
                })
            })
            .collect()
    }

    async fn list_employee_summaries(&self) -> Result<Vec<EmployeeSummary>> {
        let client = self.client.lock().await;
        let rows = client
            .query("SELECT id, first_name, last_name FROM employee ORDER BY id", &[])
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to query employees: {e}")))?;

        rows.iter().map(summary_from_row).collect()
    }

    async fn list_managers(&self) -> Result<Vec<EmployeeSummary>> {
        let client = self.client.lock().await;
        let rows = client
            .query(
                "SELECT DISTINCT m.id, m.first_name, m.last_name
                 FROM employee m
                 JOIN employee e ON e.manager_id = m.id
                 ORDER BY m.id",
                &[],
            )
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to query managers: {e}")))?;

        rows.iter().map(summary_from_row).collect()
    }

    async fn add_department(&self, name: &str) -> Result<i32> {
        let client = self.client.lock().await;
        let row = client
            .query_one("INSERT INTO department (name) VALUES ($1) RETURNING id", &[&name])
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to insert department: {e}")))?;
        column(&row, 0, "id")
    }

    async fn add_role(&self, role: &NewRole) -> Result<i32> {
        let client = self.client.lock().await;
        let row = client
            .query_one(
                "INSERT INTO role (title, salary, department_id)
                 VALUES ($1, $2::float8, $3)
                 RETURNING id",
                &[&role.title, &role.salary, &role.department_id],
            )
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to insert role: {e}")))?;
        column(&row, 0, "id")
    }

    async fn add_employee(&self, employee: &NewEmployee) -> Result<i32> {
        let client = self.client.lock().await;
        let row = client
            .query_one(
                "INSERT INTO employee (first_name, last_name, role_id, manager_id)
                 VALUES ($1, $2, $3, $4)
                 RETURNING id",
                &[
                    &employee.first_name,
                    &employee.last_name,
                    &employee.role_id,
                    &employee.manager_id,
                ],
            )
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to insert employee: {e}")))?;
        column(&row, 0, "id")
    }

    async fn update_employee_role(&self, employee_id: i32, role_id: i32) -> Result<u64> {
        let client = self.client.lock().await;
        client
            .execute("UPDATE employee SET role_id = $1 WHERE id = $2", &[&role_id, &employee_id])
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to update employee role: {e}")))
    }

    async fn update_employee_manager(
        &self,
        employee_id: i32,
        manager_id: Option<i32>,
    ) -> Result<u64> {
        let client = self.client.lock().await;
        client
            .execute(
                "UPDATE employee SET manager_id = $1 WHERE id = $2",
                &[&manager_id, &employee_id],
            )
            .await
            .map_err(|e| {
                OrgError::query_failed(format!("Failed to update employee manager: {e}"))
            })
    }

    async fn employees_by_manager(&self, manager_id: i32) -> Result<Vec<EmployeeSummary>> {
        let client = self.client.lock().await;
        let rows = client
            .query(
                "SELECT id, first_name, last_name FROM employee WHERE manager_id = $1 ORDER BY id",
                &[&manager_id],
            )
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to query employees: {e}")))?;

        rows.iter().map(summary_from_row).collect()
    }

    async fn employees_by_department(&self, department_id: i32) -> Result<Vec<EmployeeSummary>> {
        let client = self.client.lock().await;
        let rows = client
            .query(
                "SELECT id, first_name, last_name FROM employee
                 WHERE role_id IN (SELECT id FROM role WHERE department_id = $1)
                 ORDER BY id",
                &[&department_id],
            )
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to query employees: {e}")))?;

        rows.iter().map(summary_from_row).collect()
    }

    async fn delete_department(&self, id: i32) -> Result<u64> {
        let client = self.client.lock().await;
        client
            .execute("DELETE FROM department WHERE id = $1", &[&id])
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to delete department: {e}")))
    }

    async fn delete_role(&self, id: i32) -> Result<u64> {
        let client = self.client.lock().await;
        client
            .execute("DELETE FROM role WHERE id = $1", &[&id])
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to delete role: {e}")))
    }

    async fn delete_employee(&self, id: i32) -> Result<u64> {
        let mut client = self.client.lock().await;
        let tx = client
            .transaction()
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to begin transaction: {e}")))?;

        let released = tx
            .execute("UPDATE employee SET manager_id = NULL WHERE manager_id = $1", &[&id])
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to release direct reports: {e}")))?;

        let deleted = tx
            .execute("DELETE FROM employee WHERE id = $1", &[&id])
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to delete employee: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to commit transaction: {e}")))?;

        tracing::debug!(employee_id = id, released, deleted, "deleted employee");
        Ok(deleted)
    }

    async fn department_budget(&self, department_id: i32) -> Result<DepartmentBudget> {
        let client = self.client.lock().await;
        let row = client
            .query_one(
                "SELECT SUM(salary)::float8 AS total_budget FROM role WHERE department_id = $1",
                &[&department_id],
            )
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to query budget: {e}")))?;

        Ok(DepartmentBudget { department_id, total: column(&row, 0, "total_budget")? })
    }

    async fn close(self) -> Result<()> {
        // Dropping the client ends the connection future
        drop(self.client);
        self.connection.await.map_err(|e| {
            OrgError::connection_failed(format!("Connection task did not shut down: {e}"))
        })?;
        tracing::debug!("closed postgres client");
        Ok(())
    }
}

/// Build `PostgreSQL` connection config from `ConnectionConfig`
fn build_pg_config(config: &ConnectionConfig) -> Result<Config> {
    let host = config
        .host
        .as_ref()
        .ok_or_else(|| OrgError::invalid_input("PostgreSQL requires 'host' parameter"))?;

    let port = config
        .port
        .ok_or_else(|| OrgError::invalid_input("PostgreSQL requires 'port' parameter"))?;

    let user = config
        .user
        .as_ref()
        .ok_or_else(|| OrgError::invalid_input("PostgreSQL requires 'user' parameter"))?;

    let password = config
        .password
        .as_ref()
        .ok_or_else(|| OrgError::invalid_input("PostgreSQL requires 'password' parameter"))?;

    let database = config
        .database
        .as_ref()
        .ok_or_else(|| OrgError::invalid_input("PostgreSQL requires 'database' parameter"))?;

    let mut pg_config = Config::new();
    pg_config.host(host).port(port).user(user).password(password).dbname(database);

    Ok(pg_config)
}

/// Decode one column of a row
fn column<'a, T: FromSql<'a>>(row: &'a Row, idx: usize, name: &str) -> Result<T> {
    row.try_get(idx).map_err(|e| {
        OrgError::engine_error("postgres", format!("Failed to decode '{name}': {e}"))
    })
}

fn summary_from_row(row: &Row) -> Result<EmployeeSummary> {
    Ok(EmployeeSummary {
        id: column(row, 0, "id")?,
        first_name: column(row, 1, "first_name")?,
        last_name: column(row, 2, "last_name")?,
    })
}
