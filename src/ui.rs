//! Console messages: success, error, info and the welcome banner.

use console::style;
use std::fmt::Display;

const RULE: &str = "_______________________________________________";

const LOGO: [&str; 7] = [
    r" ______      ____    ____    _________",
    r"|______|     ||\    //||    ||_______|",
    r"||           || \  // ||    ||        ",
    r"||           ||  \//  ||    ||_______  ",
    r"||           ||       ||    ||______ | ",
    r"||_____      ||       ||     ______| | ",
    r"|______|     ||       ||    |______|_| ",
];

/// Print a success message in bold green
pub fn success(message: &str) {
    println!("{}", style(message).green().bold());
}

/// Print `<context>: <err>` in red to stderr
pub fn error(context: &str, err: &dyn Display) {
    eprintln!("{}", style(error_line(context, err)).red());
}

/// Print a plain informational line
pub fn info(message: &str) {
    println!("{message}");
}

/// Print the welcome banner
pub fn banner() {
    println!("{}", banner_text());
}

fn error_line(context: &str, err: &dyn Display) -> String {
    format!("{context}: {err}")
}

fn banner_text() -> String {
    let mut lines = vec![RULE.to_string(), style("    Hello! Welcome to").yellow().bold().to_string()];
    lines.extend(LOGO.iter().map(|l| style(*l).cyan().bold().to_string()));
    lines.push(RULE.to_string());
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrgError;

    #[test]
    fn test_error_line_includes_context() {
        let err = OrgError::not_found("No employee with id 7");
        assert_eq!(
            error_line("Error deleting employee", &err),
            "Error deleting employee: Not found: No employee with id 7"
        );
    }

    #[test]
    fn test_banner_text() {
        let text = console::strip_ansi_codes(&banner_text()).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], RULE);
        assert_eq!(lines[1], "    Hello! Welcome to");
        assert_eq!(lines[2], LOGO[0]);
        assert_eq!(lines[9], RULE);
    }
}
