//! Menu dispatcher
//!
//! The interactive flow is a small state machine:
//!
//! ```text
//! Menu --(pick action)--> Action(screen) --(handler done or failed)--> Menu
//! Menu --(pick Exit)----> Action(Exit) --> Done
//! Menu --(prompt fails)--> fatal: close store, return error
//! ```
//!
//! Handler errors are reported and never leave the loop. Only a failure of
//! the top-level menu prompt ends the program early.

use crate::engine::{NewEmployee, NewRole, OrgStore};
use crate::error::{OrgError, Result};
use crate::prompt::{choose, parse_salary, require_non_empty, Choice, Prompter};
use crate::render::{self, Table};
use crate::ui;

/// Menu actions, in the order they are listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    ViewDepartments,
    ViewRoles,
    ViewEmployees,
    AddDepartment,
    AddRole,
    AddEmployee,
    UpdateEmployeeRole,
    UpdateEmployeeManager,
    ViewEmployeesByManager,
    ViewEmployeesByDepartment,
    DeleteDepartment,
    DeleteRole,
    DeleteEmployee,
    ViewDepartmentBudget,
    Exit,
}

/// Where the loop goes next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Menu,
    Action(Screen),
    Done,
}

impl Screen {
    pub const ALL: [Self; 15] = [
        Self::ViewDepartments,
        Self::ViewRoles,
        Self::ViewEmployees,
        Self::AddDepartment,
        Self::AddRole,
        Self::AddEmployee,
        Self::UpdateEmployeeRole,
        Self::UpdateEmployeeManager,
        Self::ViewEmployeesByManager,
        Self::ViewEmployeesByDepartment,
        Self::DeleteDepartment,
        Self::DeleteRole,
        Self::DeleteEmployee,
        Self::ViewDepartmentBudget,
        Self::Exit,
    ];

    /// Text shown in the menu
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ViewDepartments => "View all departments",
            Self::ViewRoles => "View all roles",
            Self::ViewEmployees => "View all employees",
            Self::AddDepartment => "Add a department",
            Self::AddRole => "Add a role",
            Self::AddEmployee => "Add an employee",
            Self::UpdateEmployeeRole => "Update an employee role",
            Self::UpdateEmployeeManager => "Update employee managers",
            Self::ViewEmployeesByManager => "View employees by manager",
            Self::ViewEmployeesByDepartment => "View employees by department",
            Self::DeleteDepartment => "Delete departments",
            Self::DeleteRole => "Delete roles",
            Self::DeleteEmployee => "Delete employees",
            Self::ViewDepartmentBudget => "View the total utilized budget of a department",
            Self::Exit => "Exit",
        }
    }

    /// Prefix for the message printed when the handler fails
    #[must_use]
    pub const fn error_context(self) -> &'static str {
        match self {
            Self::ViewDepartments => "Error retrieving departments",
            Self::ViewRoles => "Error retrieving roles",
            Self::ViewEmployees => "Error retrieving employees",
            Self::AddDepartment => "Error adding department",
            Self::AddRole => "Error adding role",
            Self::AddEmployee => "Error adding employee",
            Self::UpdateEmployeeRole => "Error updating employee role",
            Self::UpdateEmployeeManager => "Error updating employee manager",
            Self::ViewEmployeesByManager => "Error retrieving employees by manager",
            Self::ViewEmployeesByDepartment => "Error retrieving employees by department",
            Self::DeleteDepartment => "Error deleting department",
            Self::DeleteRole => "Error deleting role",
            Self::DeleteEmployee => "Error deleting employee",
            Self::ViewDepartmentBudget => "Error retrieving department budget",
            Self::Exit => "Error",
        }
    }

    /// State after this screen has run
    #[must_use]
    pub const fn transition(self) -> State {
        match self {
            Self::Exit => State::Done,
            _ => State::Menu,
        }
    }

    fn menu_labels() -> Vec<String> {
        Self::ALL.iter().map(|s| s.label().to_string()).collect()
    }
}

/// What a handler produced
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Table(Table),
    Success(String),
    Message(String),
}

impl Outcome {
    pub fn print(&self) {
        match self {
            Self::Table(table) => ui::info(&table.render()),
            Self::Success(message) => ui::success(message),
            Self::Message(message) => ui::info(message),
        }
    }
}

/// The interactive application: one store, one prompter
pub struct App<S, P> {
    store: S,
    prompter: P,
}

impl<S: OrgStore, P: Prompter> App<S, P> {
    pub const fn new(store: S, prompter: P) -> Self {
        Self { store, prompter }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn prompter(&self) -> &P {
        &self.prompter
    }

    /// Ask for the next action
    pub fn menu(&mut self) -> Result<Screen> {
        let index = self.prompter.select("What would you like to do?", &Screen::menu_labels())?;
        Screen::ALL
            .get(index)
            .copied()
            .ok_or_else(|| OrgError::invalid_input(format!("Menu entry {index} does not exist")))
    }

    /// Run the menu until Exit
    ///
    /// The store is closed on both ways out.
    pub async fn run(mut self) -> Result<()> {
        let mut state = State::Menu;

        loop {
            state = match state {
                State::Menu => match self.menu() {
                    Ok(screen) => State::Action(screen),
                    Err(err) => {
                        tracing::error!(code = err.error_code(), error = %err, "menu prompt failed");
                        ui::error("Error", &err);
                        if let Err(close_err) = self.store.close().await {
                            tracing::warn!(error = %close_err, "failed to close store");
                        }
                        return Err(err);
                    }
                },
                State::Action(screen) => {
                    tracing::debug!(?screen, "dispatch");
                    match self.handle(screen).await {
                        Ok(outcome) => outcome.print(),
                        Err(err) => {
                            tracing::warn!(?screen, code = err.error_code(), error = %err, "handler failed");
                            ui::error(screen.error_context(), &err);
                        }
                    }
                    screen.transition()
                }
                State::Done => break,
            };
        }

        self.store.close().await
    }

    /// Run the handler for one screen
    pub async fn handle(&mut self, screen: Screen) -> Result<Outcome> {
        match screen {
            Screen::ViewDepartments => {
                let departments = self.store.list_departments().await?;
                Ok(Outcome::Table(render::departments_table(&departments)))
            }
            Screen::ViewRoles => {
                let roles = self.store.list_roles().await?;
                Ok(Outcome::Table(render::roles_table(&roles)))
            }
            Screen::ViewEmployees => {
                let employees = self.store.list_employees().await?;
                Ok(Outcome::Table(render::employees_table(&employees)))
            }
            Screen::AddDepartment => self.add_department().await,
            Screen::AddRole => self.add_role().await,
            Screen::AddEmployee => self.add_employee().await,
            Screen::UpdateEmployeeRole => self.update_employee_role().await,
            Screen::UpdateEmployeeManager => self.update_employee_manager().await,
            Screen::ViewEmployeesByManager => {
                let managers = employee_choices(self.store.list_managers().await?);
                let manager_id = choose(
                    &mut self.prompter,
                    "Select the manager to view their employees:",
                    "managers",
                    &managers,
                )?;
                let employees = self.store.employees_by_manager(manager_id).await?;
                Ok(Outcome::Table(render::summaries_table(&employees)))
            }
            Screen::ViewEmployeesByDepartment => {
                let department_id =
                    self.pick_department("Select the department to view its employees:").await?;
                let employees = self.store.employees_by_department(department_id).await?;
                Ok(Outcome::Table(render::summaries_table(&employees)))
            }
            Screen::DeleteDepartment => {
                let id = self.pick_department("Select the department to delete:").await?;
                expect_row(self.store.delete_department(id).await?, "department", id)?;
                Ok(Outcome::Success("Department deleted successfully.".to_string()))
            }
            Screen::DeleteRole => {
                let roles = role_choices(&self.store).await?;
                let id = choose(&mut self.prompter, "Select the role to delete:", "roles", &roles)?;
                expect_row(self.store.delete_role(id).await?, "role", id)?;
                Ok(Outcome::Success("Role deleted successfully.".to_string()))
            }
            Screen::DeleteEmployee => {
                let employees = employee_choices(self.store.list_employee_summaries().await?);
                let id = choose(
                    &mut self.prompter,
                    "Select the employee to delete:",
                    "employees",
                    &employees,
                )?;
                expect_row(self.store.delete_employee(id).await?, "employee", id)?;
                Ok(Outcome::Success("Employee deleted successfully.".to_string()))
            }
            Screen::ViewDepartmentBudget => {
                let id = self.pick_department("Select the department to view its budget:").await?;
                let budget = self.store.department_budget(id).await?;
                Ok(Outcome::Table(render::budget_table(&budget)))
            }
            Screen::Exit => Ok(Outcome::Message("Goodbye!".to_string())),
        }
    }

    async fn add_department(&mut self) -> Result<Outcome> {
        let name = self.prompter.input(
            "Enter the name of the department:",
            &require_non_empty("Department name cannot be empty"),
        )?;

        let id = self.store.add_department(&name).await?;
        tracing::debug!(id, %name, "department added");
        Ok(Outcome::Success("Department added successfully.".to_string()))
    }

    async fn add_role(&mut self) -> Result<Outcome> {
        let departments = department_choices(&self.store).await?;
        require_choices(&departments, "departments")?;

        let title = self
            .prompter
            .input("Enter the title of the role:", &require_non_empty("Role title cannot be empty"))?;
        let raw_salary = self
            .prompter
            .input("Enter the salary for the role:", &|s: &str| parse_salary(s).map(|_| ()))?;
        let salary = parse_salary(&raw_salary).map_err(OrgError::invalid_input)?;
        let department_id = choose(
            &mut self.prompter,
            "Select the department for the role:",
            "departments",
            &departments,
        )?;

        let id = self.store.add_role(&NewRole { title, salary, department_id }).await?;
        tracing::debug!(id, department_id, "role added");
        Ok(Outcome::Success("Role added successfully.".to_string()))
    }

    async fn add_employee(&mut self) -> Result<Outcome> {
        let roles = role_choices(&self.store).await?;
        require_choices(&roles, "roles")?;
        let managers = with_none(employee_choices(self.store.list_employee_summaries().await?));

        let first_name = self.prompter.input(
            "Enter the first name of the employee:",
            &require_non_empty("First name cannot be empty"),
        )?;
        let last_name = self.prompter.input(
            "Enter the last name of the employee:",
            &require_non_empty("Last name cannot be empty"),
        )?;
        let role_id =
            choose(&mut self.prompter, "Select the role for the employee:", "roles", &roles)?;
        let manager_id = choose(
            &mut self.prompter,
            "Select the manager for the employee:",
            "managers",
            &managers,
        )?;

        let id = self
            .store
            .add_employee(&NewEmployee { first_name, last_name, role_id, manager_id })
            .await?;
        tracing::debug!(id, role_id, ?manager_id, "employee added");
        Ok(Outcome::Success("Employee added successfully.".to_string()))
    }

    async fn update_employee_role(&mut self) -> Result<Outcome> {
        let employees = employee_choices(self.store.list_employee_summaries().await?);
        let roles = role_choices(&self.store).await?;
        require_choices(&roles, "roles")?;

        let employee_id = choose(
            &mut self.prompter,
            "Select the employee to update their role:",
            "employees",
            &employees,
        )?;
        let role_id =
            choose(&mut self.prompter, "Select the new role for the employee:", "roles", &roles)?;

        let affected = self.store.update_employee_role(employee_id, role_id).await?;
        expect_row(affected, "employee", employee_id)?;
        Ok(Outcome::Success("Employee role updated successfully.".to_string()))
    }

    async fn update_employee_manager(&mut self) -> Result<Outcome> {
        let summaries = self.store.list_employee_summaries().await?;
        let employees = employee_choices(summaries.clone());

        let employee_id = choose(
            &mut self.prompter,
            "Select the employee to update their manager:",
            "employees",
            &employees,
        )?;

        let others = summaries.into_iter().filter(|e| e.id != employee_id).collect();
        let managers = with_none(employee_choices(others));
        let manager_id = choose(
            &mut self.prompter,
            "Select the new manager for the employee:",
            "managers",
            &managers,
        )?;

        expect_row(
            self.store.update_employee_manager(employee_id, manager_id).await?,
            "employee",
            employee_id,
        )?;
        Ok(Outcome::Success("Employee manager updated successfully.".to_string()))
    }

    async fn pick_department(&mut self, prompt: &str) -> Result<i32> {
        let departments = department_choices(&self.store).await?;
        choose(&mut self.prompter, prompt, "departments", &departments)
    }
}

async fn department_choices<S: OrgStore>(store: &S) -> Result<Vec<Choice<i32>>> {
    let departments = store.list_departments().await?;
    Ok(departments.into_iter().map(|d| Choice::new(d.name, d.id)).collect())
}

async fn role_choices<S: OrgStore>(store: &S) -> Result<Vec<Choice<i32>>> {
    let roles = store.list_role_choices().await?;
    Ok(roles.into_iter().map(|r| Choice::new(r.title, r.id)).collect())
}

fn employee_choices(employees: Vec<crate::engine::EmployeeSummary>) -> Vec<Choice<i32>> {
    employees.into_iter().map(|e| Choice::new(e.full_name(), e.id)).collect()
}

fn with_none(choices: Vec<Choice<i32>>) -> Vec<Choice<Option<i32>>> {
    choices
        .into_iter()
        .map(|c| Choice::new(c.label, Some(c.value)))
        .chain(std::iter::once(Choice::new("None", None)))
        .collect()
}

fn require_choices<T>(choices: &[Choice<T>], what: &str) -> Result<()> {
    if choices.is_empty() {
        return Err(OrgError::invalid_input(format!("No {what} available")));
    }
    Ok(())
}

fn expect_row(affected: u64, what: &str, id: i32) -> Result<()> {
    if affected == 0 {
        return Err(OrgError::not_found(format!("No {what} with id {id}")));
    }
    Ok(())
}
