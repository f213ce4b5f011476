//! Sample organisation for `orgchart init --seed`.

use crate::engine::{NewEmployee, NewRole, OrgStore};
use crate::error::Result;

const DEPARTMENTS: [&str; 4] = ["Sales", "Engineering", "Finance", "Legal"];

// (title, salary, department index)
const ROLES: [(&str, f64, usize); 8] = [
    ("Sales Lead", 100_000.0, 0),
    ("Salesperson", 80_000.0, 0),
    ("Lead Engineer", 150_000.0, 1),
    ("Software Engineer", 120_000.0, 1),
    ("Account Manager", 160_000.0, 2),
    ("Accountant", 125_000.0, 2),
    ("Legal Team Lead", 250_000.0, 3),
    ("Lawyer", 190_000.0, 3),
];

// (first, last, role index, manager index into this list)
const EMPLOYEES: [(&str, &str, usize, Option<usize>); 8] = [
    ("John", "Doe", 0, None),
    ("Mike", "Chan", 1, Some(0)),
    ("Ashley", "Rodriguez", 2, None),
    ("Kevin", "Tupik", 3, Some(2)),
    ("Kunal", "Singh", 4, None),
    ("Malia", "Brown", 5, Some(4)),
    ("Sarah", "Lourd", 6, None),
    ("Tom", "Allen", 7, Some(6)),
];

/// Row counts inserted by `seed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub departments: usize,
    pub roles: usize,
    pub employees: usize,
}

/// Insert the sample departments, roles and employees
///
/// Ids are taken from the inserts, so seeding works on a store that already
/// holds data.
pub async fn seed<S: OrgStore>(store: &S) -> Result<SeedSummary> {
    let mut department_ids = Vec::with_capacity(DEPARTMENTS.len());
    for name in DEPARTMENTS {
        department_ids.push(store.add_department(name).await?);
    }

    let mut role_ids = Vec::with_capacity(ROLES.len());
    for (title, salary, department) in ROLES {
        let role = NewRole { title: title.to_string(), salary, department_id: department_ids[department] };
        role_ids.push(store.add_role(&role).await?);
    }

    let mut employee_ids: Vec<i32> = Vec::with_capacity(EMPLOYEES.len());
    for (first_name, last_name, role, manager) in EMPLOYEES {
        let employee = NewEmployee {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            role_id: role_ids[role],
            manager_id: manager.map(|m| employee_ids[m]),
        };
        employee_ids.push(store.add_employee(&employee).await?);
    }

    tracing::info!(
        departments = department_ids.len(),
        roles = role_ids.len(),
        employees = employee_ids.len(),
        "seeded sample data"
    );

    Ok(SeedSummary {
        departments: department_ids.len(),
        roles: role_ids.len(),
        employees: employee_ids.len(),
    })
}
