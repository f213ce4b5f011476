//! Orgchart - Interactive Org-Chart Manager
//!
//! Orgchart keeps a company's departments, roles and employees in a relational
//! database and lets an operator view and change them from a terminal menu.
//!
//! # Core Principles
//! - One menu action, one parameterized statement (the employee delete runs two in a transaction)
//! - Choices are always built from rows that exist
//! - A failed action is reported and the menu comes back
//! - The connection is opened once and released once
//!
//! # Module Organization
//! - [`error`] - Error types and handling
//! - [`engine`] - Data model, `OrgStore` trait and engine implementations
//! - [`config`] - Connection resolution (flags, environment, `.env`, config file)
//! - [`prompt`] - Prompter seam over dialoguer
//! - [`render`] - Console tables
//! - [`ui`] - Coloured console messages
//! - [`app`] - Menu state machine and handlers
//! - [`seed`] - Sample data

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod prompt;
pub mod render;
pub mod seed;
pub mod ui;

// Re-export commonly used types for convenience
pub use app::{App, Outcome, Screen, State};
pub use config::{resolve_connection, ConnectionOverrides, StoredConnection};
pub use engine::{
    ConnectionConfig, DatabaseType, Department, DepartmentBudget, EmployeeListing,
    EmployeeSummary, NewEmployee, NewRole, OrgStore, Role, RoleListing, ServerInfo,
};
pub use error::{OrgError, Result};
pub use prompt::{Prompter, ScriptedPrompter, TerminalPrompter};
pub use render::Table;
