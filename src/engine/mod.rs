//! Database Store Trait and Core Types
//!
//! This module defines the org-chart data model and the `OrgStore` trait.
//! Each engine (`MySQL`, `PostgreSQL`, `SQLite`) implements `OrgStore`.
//!
//! # Long-Lived Store
//! A store is opened once at startup and owned by the menu loop.
//! `close` consumes the store, so the pool is released exactly once.
//!
//! # Engine Isolation
//! Each engine implementation is completely independent.
//! No shared SQL helpers or cross-engine abstractions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{OrgError, Result};

// Engine-specific implementations
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "mysql")]
pub mod mysql;

/// Supported database engine types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// `MySQL` database (includes `MariaDB`)
    MySQL,
    /// `PostgreSQL` database
    Postgres,
    /// `SQLite` database
    SQLite,
}

impl DatabaseType {
    /// Get the engine name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MySQL => "mysql",
            Self::Postgres => "postgres",
            Self::SQLite => "sqlite",
        }
    }

    /// Default TCP port for client-server engines
    #[must_use]
    pub const fn default_port(&self) -> Option<u16> {
        match self {
            Self::MySQL => Some(3306),
            Self::Postgres => Some(5432),
            Self::SQLite => None,
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DatabaseType {
    type Err = OrgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySQL),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "sqlite" | "sqlite3" => Ok(Self::SQLite),
            other => Err(OrgError::config_error(format!(
                "Unknown database engine '{other}'. Expected mysql, postgres or sqlite"
            ))),
        }
    }
}

/// Connection configuration for database engines
///
/// Fields are engine-specific (e.g., `file` only applies to `SQLite`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database engine type
    pub engine: DatabaseType,

    /// Hostname (for postgres/mysql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Port number (for postgres/mysql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Username (for postgres/mysql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Password (for postgres/mysql)
    /// WARNING: Sensitive data, do not log or include in error messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Database name (for postgres/mysql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Database file path (for sqlite)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl ConnectionConfig {
    /// Create a new `MySQL` connection config
    #[must_use]
    pub const fn mysql(
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    ) -> Self {
        Self {
            engine: DatabaseType::MySQL,
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            database: Some(database),
            file: None,
        }
    }

    /// Create a new `PostgreSQL` connection config
    #[must_use]
    pub const fn postgres(
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    ) -> Self {
        Self {
            engine: DatabaseType::Postgres,
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            database: Some(database),
            file: None,
        }
    }

    /// Create a new `SQLite` connection config
    #[must_use]
    pub const fn sqlite(file: PathBuf) -> Self {
        Self {
            engine: DatabaseType::SQLite,
            host: None,
            port: None,
            user: None,
            password: None,
            database: None,
            file: Some(file),
        }
    }

    /// Short human-readable target, e.g. `mysql://app@localhost:3306/company`
    #[must_use]
    pub fn describe(&self) -> String {
        match self.engine {
            DatabaseType::SQLite => format!(
                "sqlite://{}",
                self.file.as_ref().map_or_else(|| "?".to_string(), |f| f.display().to_string())
            ),
            engine => format!(
                "{}://{}@{}:{}/{}",
                engine,
                self.user.as_deref().unwrap_or("?"),
                self.host.as_deref().unwrap_or("?"),
                self.port.map_or_else(|| "?".to_string(), |p| p.to_string()),
                self.database.as_deref().unwrap_or("?"),
            ),
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("engine", &self.engine)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("file", &self.file)
            .finish()
    }
}

/// Server information returned by `OrgStore::server_info`
#[derive(Debug, Clone)]
pub struct ServerInfo {
    /// Database server version string
    pub database_version: String,

    /// Server information (implementation-specific)
    pub server_info: String,

    /// Name of the connected database
    pub connected_database: String,
}

/// An organizational unit owning zero or more roles
#[derive(Debug, Clone, PartialEq)]
pub struct Department {
    pub id: i32,
    pub name: String,
}

/// A job title with a salary, scoped to one department
#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub id: i32,
    pub title: String,
    pub salary: f64,
    pub department_id: i32,
}

/// Role joined with the name of its department
#[derive(Debug, Clone, PartialEq)]
pub struct RoleListing {
    pub id: i32,
    pub title: String,
    pub salary: f64,
    pub department: String,
}

/// Employee joined with role, department and manager
///
/// Joined columns are optional because the listing uses LEFT JOINs.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeListing {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub title: Option<String>,
    pub department: Option<String>,
    pub salary: Option<f64>,
    pub manager: Option<String>,
}

/// Minimal employee row used for choices and filtered listings
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeSummary {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

impl EmployeeSummary {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Total salary of all roles in a department
///
/// `total` is `None` when the department has no roles (SQL `SUM` over no rows).
#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentBudget {
    pub department_id: i32,
    pub total: Option<f64>,
}

/// Fields collected for a new role
#[derive(Debug, Clone, PartialEq)]
pub struct NewRole {
    pub title: String,
    pub salary: f64,
    pub department_id: i32,
}

/// Fields collected for a new employee
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub role_id: i32,
    pub manager_id: Option<i32>,
}

/// Org-chart store trait
///
/// All database engines implement this trait. Every operation issues one
/// parameterized statement, except `delete_employee` which runs two inside
/// a single transaction.
pub trait OrgStore {
    /// Report server version and the connected database
    fn server_info(&self) -> impl std::future::Future<Output = Result<ServerInfo>> + Send;

    /// Create the `department`, `role` and `employee` tables if missing
    fn create_schema(&self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// All departments ordered by id
    fn list_departments(&self) -> impl std::future::Future<Output = Result<Vec<Department>>> + Send;

    /// All roles with their department name
    fn list_roles(&self) -> impl std::future::Future<Output = Result<Vec<RoleListing>>> + Send;

    /// All roles as stored, used to build role choices
    fn list_role_choices(&self) -> impl std::future::Future<Output = Result<Vec<Role>>> + Send;

    /// All employees with title, department, salary and manager name
    fn list_employees(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<EmployeeListing>>> + Send;

    /// All employees as id and name
    fn list_employee_summaries(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<EmployeeSummary>>> + Send;

    /// Employees that have at least one direct report
    fn list_managers(&self)
        -> impl std::future::Future<Output = Result<Vec<EmployeeSummary>>> + Send;

    /// Insert a department, returning its generated id
    fn add_department(&self, name: &str) -> impl std::future::Future<Output = Result<i32>> + Send;

    /// Insert a role, returning its generated id
    fn add_role(&self, role: &NewRole) -> impl std::future::Future<Output = Result<i32>> + Send;

    /// Insert an employee, returning its generated id
    fn add_employee(
        &self,
        employee: &NewEmployee,
    ) -> impl std::future::Future<Output = Result<i32>> + Send;

    /// Point an employee at a new role, returning rows affected
    fn update_employee_role(
        &self,
        employee_id: i32,
        role_id: i32,
    ) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// Set or clear an employee's manager, returning rows affected
    fn update_employee_manager(
        &self,
        employee_id: i32,
        manager_id: Option<i32>,
    ) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// Direct reports of a manager
    fn employees_by_manager(
        &self,
        manager_id: i32,
    ) -> impl std::future::Future<Output = Result<Vec<EmployeeSummary>>> + Send;

    /// Employees whose role belongs to the department
    fn employees_by_department(
        &self,
        department_id: i32,
    ) -> impl std::future::Future<Output = Result<Vec<EmployeeSummary>>> + Send;

    /// Delete a department, returning rows affected
    fn delete_department(&self, id: i32) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// Delete a role, returning rows affected
    fn delete_role(&self, id: i32) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// Delete an employee, returning rows affected
    ///
    /// In one transaction:
    /// 1. Clears `manager_id` on the employee's direct reports
    /// 2. Deletes the employee row
    ///
    /// A failure in either step rolls back both.
    fn delete_employee(&self, id: i32) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// Sum of role salaries in a department
    fn department_budget(
        &self,
        department_id: i32,
    ) -> impl std::future::Future<Output = Result<DepartmentBudget>> + Send;

    /// Release the pool (or connection)
    fn close(self) -> impl std::future::Future<Output = Result<()>> + Send
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_type_serialization() {
        assert_eq!(serde_json::to_string(&DatabaseType::Postgres).unwrap(), r#""postgres""#);
        assert_eq!(serde_json::to_string(&DatabaseType::MySQL).unwrap(), r#""mysql""#);
        assert_eq!(serde_json::to_string(&DatabaseType::SQLite).unwrap(), r#""sqlite""#);
    }

    #[test]
    fn test_database_type_from_str() {
        assert_eq!("mysql".parse::<DatabaseType>().unwrap(), DatabaseType::MySQL);
        assert_eq!("MariaDB".parse::<DatabaseType>().unwrap(), DatabaseType::MySQL);
        assert_eq!("postgresql".parse::<DatabaseType>().unwrap(), DatabaseType::Postgres);
        assert_eq!(" sqlite ".parse::<DatabaseType>().unwrap(), DatabaseType::SQLite);

        let err = "oracle".parse::<DatabaseType>().unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert!(err.message().contains("oracle"));
    }

    #[test]
    fn test_default_ports() {
        assert_eq!(DatabaseType::MySQL.default_port(), Some(3306));
        assert_eq!(DatabaseType::Postgres.default_port(), Some(5432));
        assert_eq!(DatabaseType::SQLite.default_port(), None);
    }

    #[test]
    fn test_connection_config_constructors() {
        let mysql_config = ConnectionConfig::mysql(
            "localhost".to_string(),
            3306,
            "user".to_string(),
            "pass".to_string(),
            "company".to_string(),
        );
        assert_eq!(mysql_config.engine, DatabaseType::MySQL);
        assert_eq!(mysql_config.port, Some(3306));

        let pg_config = ConnectionConfig::postgres(
            "localhost".to_string(),
            5432,
            "user".to_string(),
            "pass".to_string(),
            "company".to_string(),
        );
        assert_eq!(pg_config.engine, DatabaseType::Postgres);

        let sqlite_config = ConnectionConfig::sqlite(PathBuf::from("/tmp/org.db"));
        assert_eq!(sqlite_config.engine, DatabaseType::SQLite);
        assert!(sqlite_config.file.is_some());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ConnectionConfig::mysql(
            "db.internal".to_string(),
            3306,
            "app".to_string(),
            "hunter2".to_string(),
            "company".to_string(),
        );
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("db.internal"));
    }

    #[test]
    fn test_describe_omits_password() {
        let config = ConnectionConfig::postgres(
            "localhost".to_string(),
            5432,
            "app".to_string(),
            "secret".to_string(),
            "company".to_string(),
        );
        assert_eq!(config.describe(), "postgres://app@localhost:5432/company");

        let sqlite = ConnectionConfig::sqlite(PathBuf::from("org.db"));
        assert_eq!(sqlite.describe(), "sqlite://org.db");
    }

    #[test]
    fn test_employee_full_name() {
        let e = EmployeeSummary { id: 1, first_name: "Ada".into(), last_name: "Lovelace".into() };
        assert_eq!(e.full_name(), "Ada Lovelace");
    }
}
