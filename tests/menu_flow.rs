//! Menu Flow Tests
//!
//! Drives complete menu sessions through `App::run` with a scripted prompter
//! over a `SQLite` store. Validates:
//! - Every action returns to the menu, including failed ones
//! - Exit ends the loop and closes the store exactly once
//! - A failing menu prompt is fatal and still closes the store
//! - Data written through the menu is what the store holds afterwards

#![cfg(feature = "sqlite")]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use orgchart::engine::sqlite::SqliteStore;
use orgchart::prompt::{Answer, Validator};
use orgchart::{
    App, Outcome, ConnectionConfig, Department, DepartmentBudget, EmployeeListing, EmployeeSummary,
    NewEmployee, NewRole, OrgStore, Prompter, Result, Role, RoleListing, Screen,
    ScriptedPrompter, ServerInfo,
};
use pretty_assertions::assert_eq;

// ============================================================================
// Test Helpers
// ============================================================================

/// Store wrapper counting how often `close` runs
///
/// With `stale_deletes` set, deletes touch nothing and report zero rows, as
/// if another session had removed the row after the choice list was built.
struct CountingStore {
    inner: SqliteStore,
    closes: Arc<AtomicUsize>,
    stale_deletes: bool,
}

impl OrgStore for CountingStore {
    async fn server_info(&self) -> Result<ServerInfo> {
        self.inner.server_info().await
    }

    async fn create_schema(&self) -> Result<()> {
        self.inner.create_schema().await
    }

    async fn list_departments(&self) -> Result<Vec<Department>> {
        self.inner.list_departments().await
    }

    async fn list_roles(&self) -> Result<Vec<RoleListing>> {
        self.inner.list_roles().await
    }

    async fn list_role_choices(&self) -> Result<Vec<Role>> {
        self.inner.list_role_choices().await
    }

    async fn list_employees(&self) -> Result<Vec<EmployeeListing>> {
        self.inner.list_employees().await
    }

    async fn list_employee_summaries(&self) -> Result<Vec<EmployeeSummary>> {
        self.inner.list_employee_summaries().await
    }

    async fn list_managers(&self) -> Result<Vec<EmployeeSummary>> {
        self.inner.list_managers().await
    }

    async fn add_department(&self, name: &str) -> Result<i32> {
        self.inner.add_department(name).await
    }

    async fn add_role(&self, role: &NewRole) -> Result<i32> {
        self.inner.add_role(role).await
    }

    async fn add_employee(&self, employee: &NewEmployee) -> Result<i32> {
        self.inner.add_employee(employee).await
    }

    async fn update_employee_role(&self, employee_id: i32, role_id: i32) -> Result<u64> {
        self.inner.update_employee_role(employee_id, role_id).await
    }

    async fn update_employee_manager(
        &self,
        employee_id: i32,
        manager_id: Option<i32>,
    ) -> Result<u64> {
        self.inner.update_employee_manager(employee_id, manager_id).await
    }

    async fn employees_by_manager(&self, manager_id: i32) -> Result<Vec<EmployeeSummary>> {
        self.inner.employees_by_manager(manager_id).await
    }

    async fn employees_by_department(&self, department_id: i32) -> Result<Vec<EmployeeSummary>> {
        self.inner.employees_by_department(department_id).await
    }

    async fn delete_department(&self, id: i32) -> Result<u64> {
        if self.stale_deletes {
            return Ok(0);
        }
        self.inner.delete_department(id).await
    }

    async fn delete_role(&self, id: i32) -> Result<u64> {
        if self.stale_deletes {
            return Ok(0);
        }
        self.inner.delete_role(id).await
    }

    async fn delete_employee(&self, id: i32) -> Result<u64> {
        if self.stale_deletes {
            return Ok(0);
        }
        self.inner.delete_employee(id).await
    }

    async fn department_budget(&self, department_id: i32) -> Result<DepartmentBudget> {
        self.inner.department_budget(department_id).await
    }

    async fn close(self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close().await
    }
}

/// Prompter handle that stays inspectable after `App::run` consumes the app
#[derive(Clone)]
struct SharedPrompter(Rc<RefCell<ScriptedPrompter>>);

impl Prompter for SharedPrompter {
    fn select(&mut self, prompt: &str, items: &[String]) -> Result<usize> {
        self.0.borrow_mut().select(prompt, items)
    }

    fn input(&mut self, prompt: &str, validator: Validator<'_>) -> Result<String> {
        self.0.borrow_mut().input(prompt, validator)
    }
}

fn temp_db_path() -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!("orgchart_menu_{}_{id}.db", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

type Session = (App<CountingStore, SharedPrompter>, Arc<AtomicUsize>, SharedPrompter);

async fn session(path: &Path, answers: Vec<Answer>) -> Session {
    session_with(path, answers, false).await
}

async fn session_with(path: &Path, answers: Vec<Answer>, stale_deletes: bool) -> Session {
    let inner = SqliteStore::open(&ConnectionConfig::sqlite(path.to_path_buf())).unwrap();
    inner.create_schema().await.unwrap();

    let closes = Arc::new(AtomicUsize::new(0));
    let store = CountingStore { inner, closes: Arc::clone(&closes), stale_deletes };
    let prompter = SharedPrompter(Rc::new(RefCell::new(ScriptedPrompter::new(answers))));

    (App::new(store, prompter.clone()), closes, prompter)
}

fn menu(screen: Screen) -> Answer {
    Answer::Pick(screen.label().to_string())
}

fn text(s: &str) -> Answer {
    Answer::Text(s.to_string())
}

fn pick(s: &str) -> Answer {
    Answer::Pick(s.to_string())
}

fn reopen(path: &Path) -> SqliteStore {
    SqliteStore::open(&ConnectionConfig::sqlite(path.to_path_buf())).unwrap()
}

// ============================================================================
// Sessions
// ============================================================================

#[tokio::test]
async fn test_full_session() {
    let path = temp_db_path();
    let (app, closes, prompter) = session(
        &path,
        vec![
            menu(Screen::AddDepartment),
            text("Engineering"),
            menu(Screen::AddRole),
            text("Engineer"),
            text("lots"),
            text("120000"),
            pick("Engineering"),
            menu(Screen::AddEmployee),
            text("Ada"),
            text("Lovelace"),
            pick("Engineer"),
            pick("None"),
            menu(Screen::AddEmployee),
            text("Alan"),
            text("Turing"),
            pick("Engineer"),
            pick("Ada Lovelace"),
            menu(Screen::ViewEmployeesByManager),
            pick("Ada Lovelace"),
            menu(Screen::ViewDepartmentBudget),
            pick("Engineering"),
            menu(Screen::DeleteEmployee),
            pick("Ada Lovelace"),
            menu(Screen::ViewEmployees),
            menu(Screen::Exit),
        ],
    )
    .await;

    app.run().await.unwrap();

    assert_eq!(closes.load(Ordering::SeqCst), 1);
    let prompter = prompter.0.borrow();
    assert_eq!(prompter.remaining(), 0);
    assert_eq!(prompter.rejected(), ["Invalid salary. Please enter a number."]);

    let store = reopen(&path);
    let employees = store.list_employees().await.unwrap();
    assert_eq!(employees.len(), 1);
    assert_eq!(employees[0].first_name, "Alan");
    assert_eq!(employees[0].manager, None);
    assert_eq!(employees[0].salary, Some(120_000.0));

    store.close().await.unwrap();
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_failed_action_returns_to_menu() {
    let path = temp_db_path();
    let (app, closes, prompter) = session(
        &path,
        vec![
            // nothing to choose from: fails before any field prompt
            menu(Screen::AddRole),
            menu(Screen::ViewDepartmentBudget),
            menu(Screen::AddDepartment),
            text("Legal"),
            menu(Screen::ViewDepartmentBudget),
            pick("Legal"),
            menu(Screen::Exit),
        ],
    )
    .await;

    app.run().await.unwrap();
    assert_eq!(closes.load(Ordering::SeqCst), 1);

    let asked = prompter.0.borrow().asked().to_vec();
    let menus = asked.iter().filter(|p| *p == "What would you like to do?").count();
    assert_eq!(menus, 5);

    let store = reopen(&path);
    let departments = store.list_departments().await.unwrap();
    assert_eq!(departments.len(), 1);
    assert_eq!(store.department_budget(departments[0].id).await.unwrap().total, None);

    store.close().await.unwrap();
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_menu_prompt_failure_is_fatal() {
    let path = temp_db_path();
    let (app, closes, _prompter) = session(&path, vec![menu(Screen::ViewDepartments)]).await;

    let err = app.run().await.unwrap_err();
    assert_eq!(err.error_code(), "PROMPT_FAILED");
    assert_eq!(closes.load(Ordering::SeqCst), 1);

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_exit_immediately() {
    let path = temp_db_path();
    let (app, closes, prompter) = session(&path, vec![menu(Screen::Exit)]).await;

    app.run().await.unwrap();
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert_eq!(prompter.0.borrow().asked().len(), 1);

    let _ = std::fs::remove_file(&path);
}

// ============================================================================
// Single Handlers
// ============================================================================

#[tokio::test]
async fn test_add_department_inserts_one_row() {
    let path = temp_db_path();
    let (mut app, _closes, _prompter) = session(&path, vec![text("Finance")]).await;

    app.handle(Screen::AddDepartment).await.unwrap();

    let departments = app.store().list_departments().await.unwrap();
    assert_eq!(departments.len(), 1);
    assert!(departments[0].id > 0);
    assert_eq!(departments[0].name, "Finance");

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_role_choices_come_from_existing_departments() {
    let path = temp_db_path();
    let (mut app, _closes, prompter) =
        session(&path, vec![text("Analyst"), text("90000"), pick("Marketing")]).await;
    app.store().add_department("Finance").await.unwrap();

    let err = app.handle(Screen::AddRole).await.unwrap_err();
    assert_eq!(err.error_code(), "INVALID_INPUT");
    assert!(app.store().list_roles().await.unwrap().is_empty());
    assert_eq!(prompter.0.borrow().asked().len(), 3);

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_view_by_department_table() {
    let path = temp_db_path();
    let (mut app, _closes, _prompter) = session(&path, vec![pick("Sales"), pick("Legal")]).await;

    let sales = app.store().add_department("Sales").await.unwrap();
    app.store().add_department("Legal").await.unwrap();
    let role = app
        .store()
        .add_role(&NewRole { title: "Seller".into(), salary: 1.0, department_id: sales })
        .await
        .unwrap();
    app.store()
        .add_employee(&NewEmployee {
            first_name: "Sam".into(),
            last_name: "Seller".into(),
            role_id: role,
            manager_id: None,
        })
        .await
        .unwrap();

    let Outcome::Table(table) = app.handle(Screen::ViewEmployeesByDepartment).await.unwrap()
    else {
        panic!("expected a table");
    };
    assert_eq!(table.rows(), [vec!["1".to_string(), "Sam".to_string(), "Seller".to_string()]]);

    let Outcome::Table(empty) = app.handle(Screen::ViewEmployeesByDepartment).await.unwrap()
    else {
        panic!("expected a table");
    };
    assert!(empty.is_empty());

    let _ = std::fs::remove_file(&path);
}

/// Sales with one seller, Legal with one clerk role
async fn sales_and_legal(app: &App<CountingStore, SharedPrompter>) -> i32 {
    let store = app.store();
    let sales = store.add_department("Sales").await.unwrap();
    let legal = store.add_department("Legal").await.unwrap();
    let seller = store
        .add_role(&NewRole { title: "Seller".into(), salary: 70_000.0, department_id: sales })
        .await
        .unwrap();
    store
        .add_role(&NewRole { title: "Clerk".into(), salary: 50_000.0, department_id: legal })
        .await
        .unwrap();
    store
        .add_employee(&NewEmployee {
            first_name: "Sam".into(),
            last_name: "Seller".into(),
            role_id: seller,
            manager_id: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_views_update_and_deletes() {
    let path = temp_db_path();
    let (mut app, _closes, prompter) = session(
        &path,
        vec![pick("Sam Seller"), pick("Clerk"), pick("Seller"), pick("Sales")],
    )
    .await;
    let sam = sales_and_legal(&app).await;

    let Outcome::Table(departments) = app.handle(Screen::ViewDepartments).await.unwrap() else {
        panic!("expected a table");
    };
    assert_eq!(departments.len(), 2);

    let Outcome::Table(roles) = app.handle(Screen::ViewRoles).await.unwrap() else {
        panic!("expected a table");
    };
    assert_eq!(roles.len(), 2);
    assert!(roles.rows().iter().any(|row| row[1] == "Seller" && row[3] == "Sales"));

    assert_eq!(
        app.handle(Screen::UpdateEmployeeRole).await.unwrap(),
        Outcome::Success("Employee role updated successfully.".into())
    );
    assert_eq!(
        app.handle(Screen::DeleteRole).await.unwrap(),
        Outcome::Success("Role deleted successfully.".into())
    );
    assert_eq!(
        app.handle(Screen::DeleteDepartment).await.unwrap(),
        Outcome::Success("Department deleted successfully.".into())
    );
    assert_eq!(prompter.0.borrow().remaining(), 0);

    let store = app.store();
    let listing = store.list_employees().await.unwrap();
    assert_eq!(listing[0].id, sam);
    assert_eq!(listing[0].title.as_deref(), Some("Clerk"));
    assert_eq!(listing[0].department.as_deref(), Some("Legal"));

    let roles: Vec<String> = store.list_roles().await.unwrap().into_iter().map(|r| r.title).collect();
    assert_eq!(roles, ["Clerk"]);
    let departments: Vec<String> =
        store.list_departments().await.unwrap().into_iter().map(|d| d.name).collect();
    assert_eq!(departments, ["Legal"]);

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_delete_of_vanished_row_is_not_found() {
    let path = temp_db_path();
    let (mut app, _closes, _prompter) =
        session_with(&path, vec![pick("Legal"), pick("Clerk"), pick("Sam Seller")], true).await;
    sales_and_legal(&app).await;

    let err = app.handle(Screen::DeleteDepartment).await.unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
    assert!(err.message().contains("No department with id"));

    let err = app.handle(Screen::DeleteRole).await.unwrap_err();
    assert!(err.message().contains("No role with id"));

    let err = app.handle(Screen::DeleteEmployee).await.unwrap_err();
    assert!(err.message().contains("No employee with id"));

    assert_eq!(app.store().list_departments().await.unwrap().len(), 2);

    let _ = std::fs::remove_file(&path);
}
