//! Console tables
//!
//! Fixed-width tables drawn with box characters. Column widths include one
//! space of padding on each side; longer cells are truncated with `…`.

use console::{pad_str, style, truncate_str, Alignment};

use crate::engine::{Department, DepartmentBudget, EmployeeListing, EmployeeSummary, RoleListing};

/// Placeholder for an absent value
pub const NULL: &str = "NULL";

const PADDING: usize = 1;

/// A table with fixed column widths
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    widths: Vec<usize>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table
    ///
    /// `widths` are matched to `headers` by position. Missing widths fall
    /// back to the header length plus padding.
    #[must_use]
    pub fn new(headers: &[&str], widths: &[usize]) -> Self {
        let widths = headers
            .iter()
            .enumerate()
            .map(|(i, h)| widths.get(i).copied().unwrap_or(h.chars().count() + 2 * PADDING))
            .collect();

        Self { headers: headers.iter().map(|h| (*h).to_string()).collect(), widths, rows: Vec::new() }
    }

    /// Append a row; extra cells are dropped and missing cells render empty
    pub fn push_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Draw the table
    #[must_use]
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 4);

        lines.push(self.border('┌', '┬', '┐'));
        lines.push(self.line(&self.headers, true));

        if !self.rows.is_empty() {
            lines.push(self.border('├', '┼', '┤'));
            for row in &self.rows {
                lines.push(self.line(row, false));
            }
        }

        lines.push(self.border('└', '┴', '┘'));
        lines.join("\n")
    }

    fn border(&self, left: char, mid: char, right: char) -> String {
        let segments: Vec<String> = self.widths.iter().map(|w| "─".repeat(*w)).collect();
        let line = format!("{left}{}{right}", segments.join(&mid.to_string()));
        style(line).yellow().to_string()
    }

    fn line(&self, cells: &[String], header: bool) -> String {
        let bar = style("│").yellow().to_string();
        let mut out = bar.clone();

        for (i, width) in self.widths.iter().enumerate() {
            let inner = width.saturating_sub(2 * PADDING);
            let raw = cells.get(i).map_or("", String::as_str).replace('\n', " ");
            let clipped = truncate_str(&raw, inner, "…");
            let padded = pad_str(&clipped, inner, Alignment::Left, None).to_string();
            let cell = if header { style(padded).cyan().bold().to_string() } else { padded };

            out.push_str(&" ".repeat(PADDING));
            out.push_str(&cell);
            out.push_str(&" ".repeat(PADDING));
            out.push_str(&bar);
        }

        out
    }
}

/// Salary with two decimals
#[must_use]
pub fn money(value: f64) -> String {
    format!("{value:.2}")
}

/// Cell text for an optional value
#[must_use]
pub fn or_null(value: Option<&str>) -> String {
    value.unwrap_or(NULL).to_string()
}

pub fn departments_table(departments: &[Department]) -> Table {
    let mut table = Table::new(&["ID", "Name"], &[5, 20]);
    for d in departments {
        table.push_row(vec![d.id.to_string(), d.name.clone()]);
    }
    table
}

pub fn roles_table(roles: &[RoleListing]) -> Table {
    let mut table = Table::new(&["ID", "Title", "Salary", "Department"], &[5, 30, 15, 30]);
    for r in roles {
        table.push_row(vec![r.id.to_string(), r.title.clone(), money(r.salary), r.department.clone()]);
    }
    table
}

pub fn employees_table(employees: &[EmployeeListing]) -> Table {
    let mut table = Table::new(
        &["ID", "First Name", "Last Name", "Job Title", "Department", "Salary", "Manager"],
        &[5, 15, 15, 30, 30, 15, 30],
    );
    for e in employees {
        table.push_row(vec![
            e.id.to_string(),
            e.first_name.clone(),
            e.last_name.clone(),
            or_null(e.title.as_deref()),
            or_null(e.department.as_deref()),
            e.salary.map_or_else(|| NULL.to_string(), money),
            or_null(e.manager.as_deref()),
        ]);
    }
    table
}

/// ID / First Name / Last Name table used by the filtered views
pub fn summaries_table(employees: &[EmployeeSummary]) -> Table {
    let mut table = Table::new(&["ID", "First Name", "Last Name"], &[5, 15, 15]);
    for e in employees {
        table.push_row(vec![e.id.to_string(), e.first_name.clone(), e.last_name.clone()]);
    }
    table
}

pub fn budget_table(budget: &DepartmentBudget) -> Table {
    let mut table = Table::new(&["Total Budget"], &[15]);
    table.push_row(vec![budget.total.map_or_else(|| NULL.to_string(), money)]);
    table
}
