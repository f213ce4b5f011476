//! MySQL Org Store Implementation
//!
//! This module implements the `OrgStore` trait for MySQL databases (including MariaDB).
//!
//! # Features
//! - Pooled client-server connections via TCP (at most 10 connections)
//! - Parameterized statements over the binary protocol
//! - MySQL and MariaDB version detection
//!
//! # Implementation Notes
//! - Uses `mysql_async` (async driver, requires tokio runtime)
//! - DECIMAL salaries arrive as bytes and are parsed into `f64`
//! - The employee delete runs inside an explicit transaction; dropping an
//!   uncommitted transaction rolls it back

use mysql_async::{
    prelude::*, Conn, OptsBuilder, Pool, PoolConstraints, PoolOpts, Row, TxOpts,
};

use crate::engine::{
    ConnectionConfig, DatabaseType, Department, DepartmentBudget, EmployeeListing,
    EmployeeSummary, NewEmployee, NewRole, OrgStore, Role, RoleListing, ServerInfo,
};
use crate::error::{OrgError, Result};

/// Upper bound on pooled connections
const MAX_CONNECTIONS: usize = 10;

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS department (
        id INT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(30) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS role (
        id INT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        title VARCHAR(30) NOT NULL,
        salary DECIMAL(10, 2) NOT NULL,
        department_id INT NOT NULL,
        FOREIGN KEY (department_id) REFERENCES department(id)
    )",
    "CREATE TABLE IF NOT EXISTS employee (
        id INT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        first_name VARCHAR(30) NOT NULL,
        last_name VARCHAR(30) NOT NULL,
        role_id INT NOT NULL,
        manager_id INT NULL,
        FOREIGN KEY (role_id) REFERENCES role(id),
        FOREIGN KEY (manager_id) REFERENCES employee(id)
    )",
];

/// MySQL org store implementation
pub struct MySqlStore {
    pool: Pool,
}

impl MySqlStore {
    /// Build the connection pool and check out one connection to validate it
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        // Validate config is for MySQL
        if config.engine != DatabaseType::MySQL {
            return Err(OrgError::invalid_input(format!(
                "Expected MySQL engine, got {}",
                config.engine
            )));
        }

        let opts = build_mysql_opts(config)?;
        let pool = Pool::new(opts);

        // Fail fast on bad credentials instead of on the first menu action
        let conn = pool.get_conn().await.map_err(|e| {
            OrgError::connection_failed(format!("Failed to connect to MySQL: {e}"))
        })?;
        drop(conn);

        tracing::debug!(target_db = %config.describe(), "opened mysql pool");
        Ok(Self { pool })
    }

    async fn conn(&self) -> Result<Conn> {
        self.pool.get_conn().await.map_err(|e| {
            OrgError::connection_failed(format!("Failed to get connection from pool: {e}"))
        })
    }
}

impl OrgStore for MySqlStore {
    async fn server_info(&self) -> Result<ServerInfo> {
        let mut conn = self.conn().await?;

        let row: Row = conn
            .query_first("SELECT VERSION(), DATABASE()")
            .await
            .map_err(|e| {
                OrgError::connection_failed(format!("Failed to query MySQL version: {e}"))
            })?
            .ok_or_else(|| OrgError::connection_failed("No version returned"))?;

        let version_string: String = column(&row, 0, "version")?;
        let connected_database: Option<String> = column(&row, 1, "database")?;

        // Detect MySQL vs MariaDB
        let (database_version, server_info) = parse_mysql_version(&version_string);

        Ok(ServerInfo {
            database_version,
            server_info,
            connected_database: connected_database.unwrap_or_default(),
        })
    }

    async fn create_schema(&self) -> Result<()> {
        let mut conn = self.conn().await?;
        for statement in SCHEMA {
            conn.query_drop(statement)
                .await
                .map_err(|e| OrgError::query_failed(format!("Failed to create schema: {e}")))?;
        }
        Ok(())
    }

    async fn list_departments(&self) -> Result<Vec<Department>> {
        let mut conn = self.conn().await?;
        let rows: Vec<Row> = conn
            .query("SELECT id, name FROM department ORDER BY id")
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to query departments: {e}")))?;

        rows.iter()
            .map(|row| Ok(Department { id: column(row, 0, "id")?, name: column(row, 1, "name")? }))
            .collect()
    }

    async fn list_roles(&self) -> Result<Vec<RoleListing>> {
        let mut conn = self.conn().await?;
        let rows: Vec<Row> = conn
            .query(
                "SELECT r.id, r.title, r.salary, d.name AS department
                 FROM role r
                 JOIN department d ON r.department_id = d.id
                 ORDER BY r.id",
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
        let mut conn = self.conn().await?;
        let rows: Vec<Row> = conn
            .query("SELECT id, title, salary, department_id FROM role ORDER BY id")
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
        let mut conn = self.conn().await?;
        let rows: Vec<Row> = conn
            .query(
                "SELECT e.id, e.first_name, e.last_name, r.title, d.name AS department, r.salary,
                        CONCAT(m.first_name, ' ', m.last_name) AS manager
                 FROM employee e
                 LEFT JOIN role r ON e.role_id = r.id
                 LEFT JOIN department d ON r.department_id = d.id
                 LEFT JOIN employee m ON e.manager_id = m.id
                 ORDER BY e.id",
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
        let mut conn = self.conn().await?;
        let rows: Vec<Row> = conn
            .query("SELECT id, first_name, last_name FROM employee ORDER BY id")
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to query employees: {e}")))?;

        rows.iter().map(summary_from_row).collect()
    }

    async fn list_managers(&self) -> Result<Vec<EmployeeSummary>> {
        let mut conn = self.conn().await?;
        let rows: Vec<Row> = conn
            .query(
                "SELECT DISTINCT m.id, m.first_name, m.last_name
                 FROM employee m
                 JOIN employee e ON e.manager_id = m.id
                 ORDER BY m.id",
            )
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to query managers: {e}")))?;

        rows.iter().map(summary_from_row).collect()
    }

    async fn add_department(&self, name: &str) -> Result<i32> {
        let mut conn = self.conn().await?;
        conn.exec_drop("INSERT INTO department (name) VALUES (?)", (name,))
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to insert department: {e}")))?;
        last_insert_id(&conn)
    }

    async fn add_role(&self, role: &NewRole) -> Result<i32> {
        let mut conn = self.conn().await?;
        conn.exec_drop(
            "INSERT INTO role (title, salary, department_id) VALUES (?, ?, ?)",
            (role.title.as_str(), role.salary, role.department_id),
        )
        .await
        .map_err(|e| OrgError::query_failed(format!("Failed to insert role: {e}")))?;
        last_insert_id(&conn)
    }

    async fn add_employee(&self, employee: &NewEmployee) -> Result<i32> {
        let mut conn = self.conn().await?;
        conn.exec_drop(
            "INSERT INTO employee (first_name, last_name, role_id, manager_id) VALUES (?, ?, ?, ?)",
            (
                employee.first_name.as_str(),
                employee.last_name.as_str(),
                employee.role_id,
                employee.manager_id,
            ),
        )
        .await
        .map_err(|e| OrgError::query_failed(format!("Failed to insert employee: {e}")))?;
        last_insert_id(&conn)
    }

    async fn update_employee_role(&self, employee_id: i32, role_id: i32) -> Result<u64> {
        let mut conn = self.conn().await?;
        conn.exec_drop("UPDATE employee SET role_id = ? WHERE id = ?", (role_id, employee_id))
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to update employee role: {e}")))?;
        Ok(conn.affected_rows())
    }

    async fn update_employee_manager(
        &self,
        employee_id: i32,
        manager_id: Option<i32>,
    ) -> Result<u64> {
        let mut conn = self.conn().await?;
        conn.exec_drop(
            "UPDATE employee SET manager_id = ? WHERE id = ?",
            (manager_id, employee_id),
        )
        .await
        .map_err(|e| OrgError::query_failed(format!("Failed to update employee manager: {e}")))?;
        Ok(conn.affected_rows())
    }

    async fn employees_by_manager(&self, manager_id: i32) -> Result<Vec<EmployeeSummary>> {
        let mut conn = self.conn().await?;
        let rows: Vec<Row> = conn
            .exec(
                "SELECT id, first_name, last_name FROM employee WHERE manager_id = ? ORDER BY id",
                (manager_id,),
            )
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to query employees: {e}")))?;

        rows.iter().map(summary_from_row).collect()
    }

    async fn employees_by_department(&self, department_id: i32) -> Result<Vec<EmployeeSummary>> {
        let mut conn = self.conn().await?;
        let rows: Vec<Row> = conn
            .exec(
                "SELECT id, first_name, last_name FROM employee
                 WHERE role_id IN (SELECT id FROM role WHERE department_id = ?)
                 ORDER BY id",
                (department_id,),
            )
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to query employees: {e}")))?;

        rows.iter().map(summary_from_row).collect()
    }

    async fn delete_department(&self, id: i32) -> Result<u64> {
        let mut conn = self.conn().await?;
        conn.exec_drop("DELETE FROM department WHERE id = ?", (id,))
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to delete department: {e}")))?;
        Ok(conn.affected_rows())
    }

    async fn delete_role(&self, id: i32) -> Result<u64> {
        let mut conn = self.conn().await?;
        conn.exec_drop("DELETE FROM role WHERE id = ?", (id,))
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to delete role: {e}")))?;
        Ok(conn.affected_rows())
    }

    async fn delete_employee(&self, id: i32) -> Result<u64> {
        let mut conn = self.conn().await?;
        let mut tx = conn
            .start_transaction(TxOpts::default())
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to begin transaction: {e}")))?;

        tx.exec_drop("UPDATE employee SET manager_id = NULL WHERE manager_id = ?", (id,))
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to release direct reports: {e}")))?;
        let released = tx.affected_rows();

        tx.exec_drop("DELETE FROM employee WHERE id = ?", (id,))
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to delete employee: {e}")))?;
        let deleted = tx.affected_rows();

        tx.commit()
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to commit transaction: {e}")))?;

        tracing::debug!(employee_id = id, released, deleted, "deleted employee");
        Ok(deleted)
    }

    async fn department_budget(&self, department_id: i32) -> Result<DepartmentBudget> {
        let mut conn = self.conn().await?;
        let row: Option<Row> = conn
            .exec_first(
                "SELECT SUM(salary) AS total_budget FROM role WHERE department_id = ?",
                (department_id,),
            )
            .await
            .map_err(|e| OrgError::query_failed(format!("Failed to query budget: {e}")))?;

        let total = match row {
            Some(row) => column::<Option<f64>>(&row, 0, "total_budget")?,
            None => None,
        };

        Ok(DepartmentBudget { department_id, total })
    }

    async fn close(self) -> Result<()> {
        self.pool
            .disconnect()
            .await
            .map_err(|e| OrgError::connection_failed(format!("Failed to disconnect: {e}")))?;
        tracing::debug!("closed mysql pool");
        Ok(())
    }
}

/// Build MySQL connection options from ConnectionConfig
fn build_mysql_opts(config: &ConnectionConfig) -> Result<OptsBuilder> {
    let host = config
        .host
        .as_ref()
        .ok_or_else(|| OrgError::invalid_input("MySQL requires 'host' parameter"))?;

    let port = config
        .port
        .ok_or_else(|| OrgError::invalid_input("MySQL requires 'port' parameter"))?;

    let user = config
        .user
        .as_ref()
        .ok_or_else(|| OrgError::invalid_input("MySQL requires 'user' parameter"))?;

    let password = config
        .password
        .as_ref()
        .ok_or_else(|| OrgError::invalid_input("MySQL requires 'password' parameter"))?;

    let database = config
        .database
        .as_ref()
        .ok_or_else(|| OrgError::invalid_input("MySQL requires 'database' parameter"))?;

    let constraints = PoolConstraints::new(0, MAX_CONNECTIONS)
        .ok_or_else(|| OrgError::config_error("Invalid MySQL pool constraints"))?;

    let opts = OptsBuilder::default()
        .ip_or_hostname(host)
        .tcp_port(port)
        .user(Some(user))
        .pass(Some(password))
        .db_name(Some(database))
        .pool_opts(PoolOpts::default().with_constraints(constraints));

    Ok(opts)
}

/// Parse MySQL version string to detect MySQL vs MariaDB
fn parse_mysql_version(version_string: &str) -> (String, String) {
    // Example MySQL: "8.0.35"
    // Example MariaDB: "10.11.2-MariaDB"

    if version_string.to_uppercase().contains("MARIADB") {
        let version = version_string.split('-').next().unwrap_or("unknown").to_string();
        (version.clone(), format!("MariaDB {version}"))
    } else {
        let version = version_string
            .split_whitespace()
            .next()
            .unwrap_or(version_string)
            .to_string();
        (version.clone(), format!("MySQL {version}"))
    }
}

/// Decode one column of a row
fn column<T: FromValue>(row: &Row, idx: usize, name: &str) -> Result<T> {
    row.get_opt::<T, usize>(idx)
        .ok_or_else(|| OrgError::engine_error("mysql", format!("Missing column '{name}'")))?
        .map_err(|e| OrgError::engine_error("mysql", format!("Failed to decode '{name}': {e}")))
}

fn summary_from_row(row: &Row) -> Result<EmployeeSummary> {
    Ok(EmployeeSummary {
        id: column(row, 0, "id")?,
        first_name: column(row, 1, "first_name")?,
        last_name: column(row, 2, "last_name")?,
    })
}

fn last_insert_id(conn: &Conn) -> Result<i32> {
    let id = conn
        .last_insert_id()
        .ok_or_else(|| OrgError::engine_error("mysql", "No generated id returned"))?;
    i32::try_from(id).map_err(|_| {
        OrgError::engine_error("mysql", "Generated id does not fit in a 32-bit integer")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mysql_version() {
        let (version, info) = parse_mysql_version("8.0.35");
        assert_eq!(version, "8.0.35");
        assert_eq!(info, "MySQL 8.0.35");

        let (version, info) = parse_mysql_version("10.11.2-MariaDB");
        assert_eq!(version, "10.11.2");
        assert_eq!(info, "MariaDB 10.11.2");
    }

    #[test]
    fn test_build_opts_missing_host() {
        let config = ConnectionConfig {
            engine: DatabaseType::MySQL,
            host: None,
            port: Some(3306),
            user: Some("root".to_string()),
            password: Some("password".to_string()),
            database: Some("company".to_string()),
            file: None,
        };

        let err = build_mysql_opts(&config).err().expect("missing host must fail");
        assert!(err.message().contains("MySQL requires 'host' parameter"));
    }

    #[test]
    fn test_build_opts_missing_password() {
        let mut config = ConnectionConfig::mysql(
            "localhost".to_string(),
            3306,
            "root".to_string(),
            "password".to_string(),
            "company".to_string(),
        );
        config.password = None;

        let err = build_mysql_opts(&config).err().expect("missing password must fail");
        assert!(err.message().contains("'password'"));
    }

    #[tokio::test]
    async fn test_connect_wrong_engine() {
        let mut config = ConnectionConfig::mysql(
            "localhost".to_string(),
            3306,
            "root".to_string(),
            "password".to_string(),
            "company".to_string(),
        );
        config.engine = DatabaseType::Postgres;

        let err = MySqlStore::connect(&config).await.err().expect("wrong engine must fail");
        assert!(err.message().contains("Expected MySQL engine"));
    }

    // Note: Store round-trips require a running MySQL instance
    // Run with: cargo test --features mysql -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_department_round_trip() {
        let config = ConnectionConfig::mysql(
            "localhost".to_string(),
            3306,
            "root".to_string(),
            "password".to_string(),
            "orgchart_test".to_string(),
        );

        let store = MySqlStore::connect(&config).await.expect("MySQL must be running");
        store.create_schema().await.unwrap();

        let id = store.add_department("Ignored Test Dept").await.unwrap();
        assert!(store.list_departments().await.unwrap().iter().any(|d| d.id == id));
        assert_eq!(store.delete_department(id).await.unwrap(), 1);

        store.close().await.unwrap();
    }
}
