//! Interactive prompts
//!
//! The menu talks to the terminal only through the `Prompter` trait so the
//! flows can be driven by a scripted prompter in tests.

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use std::collections::VecDeque;

use crate::error::{OrgError, Result};

/// Validator run against every submitted line
///
/// `Err` carries the message shown to the user before re-prompting.
pub type Validator<'a> = &'a dyn Fn(&str) -> std::result::Result<(), String>;

/// Source of user answers
pub trait Prompter {
    /// Pick one of `items`, returning its index
    fn select(&mut self, prompt: &str, items: &[String]) -> Result<usize>;

    /// Read a line, re-asking until `validator` accepts it
    fn input(&mut self, prompt: &str, validator: Validator<'_>) -> Result<String>;
}

/// `Prompter` backed by dialoguer on the controlling terminal
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    #[must_use]
    pub fn new() -> Self {
        Self { theme: ColorfulTheme::default() }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn select(&mut self, prompt: &str, items: &[String]) -> Result<usize> {
        let index = Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact()?;
        Ok(index)
    }

    fn input(&mut self, prompt: &str, validator: Validator<'_>) -> Result<String> {
        let value: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .validate_with(|line: &String| validator(line))
            .interact_text()?;
        Ok(value.trim().to_string())
    }
}

/// A canned answer for `ScriptedPrompter`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Select the item with this exact label
    Pick(String),
    /// Select by position
    Index(usize),
    /// Type this line
    Text(String),
}

/// `Prompter` that replays a fixed list of answers
///
/// Rejected text answers are recorded and the next answer is tried, the way
/// the terminal prompt re-asks. Running out of answers fails like a closed
/// stdin.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    asked: Vec<String>,
    rejected: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self { answers: answers.into_iter().collect(), ..Self::default() }
    }

    /// Prompts shown so far, in order
    #[must_use]
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    /// Validation messages produced by rejected answers
    #[must_use]
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    /// Answers not yet consumed
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, prompt: &str) -> Result<Answer> {
        self.asked.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| OrgError::prompt_failed(format!("no answer scripted for '{prompt}'")))
    }
}

impl Prompter for ScriptedPrompter {
    fn select(&mut self, prompt: &str, items: &[String]) -> Result<usize> {
        match self.next(prompt)? {
            Answer::Index(index) if index < items.len() => Ok(index),
            Answer::Index(index) => {
                Err(OrgError::invalid_input(format!("Selection {index} is out of range")))
            }
            Answer::Pick(label) => items
                .iter()
                .position(|item| *item == label)
                .ok_or_else(|| OrgError::invalid_input(format!("'{label}' is not one of the choices"))),
            Answer::Text(text) => Err(OrgError::prompt_failed(format!(
                "expected a selection for '{prompt}', got text '{text}'"
            ))),
        }
    }

    fn input(&mut self, prompt: &str, validator: Validator<'_>) -> Result<String> {
        loop {
            match self.next(prompt)? {
                Answer::Text(text) => match validator(&text) {
                    Ok(()) => return Ok(text.trim().to_string()),
                    Err(message) => self.rejected.push(message),
                },
                other => {
                    return Err(OrgError::prompt_failed(format!(
                        "expected text for '{prompt}', got {other:?}"
                    )));
                }
            }
        }
    }
}

/// One selectable entry: the text shown and the value it stands for
#[derive(Debug, Clone, PartialEq)]
pub struct Choice<T> {
    pub label: String,
    pub value: T,
}

impl<T> Choice<T> {
    pub fn new(label: impl Into<String>, value: T) -> Self {
        Self { label: label.into(), value }
    }
}

/// Ask the user to pick one of `choices` and return its value
///
/// `what` names the kind of thing being chosen ("departments", "roles") and
/// is used in the error when there is nothing to pick from.
pub fn choose<T: Clone>(
    prompter: &mut dyn Prompter,
    prompt: &str,
    what: &str,
    choices: &[Choice<T>],
) -> Result<T> {
    if choices.is_empty() {
        return Err(OrgError::invalid_input(format!("No {what} available")));
    }

    let labels: Vec<String> = choices.iter().map(|c| c.label.clone()).collect();
    let index = prompter.select(prompt, &labels)?;

    choices
        .get(index)
        .map(|c| c.value.clone())
        .ok_or_else(|| OrgError::invalid_input(format!("Selection {index} is out of range")))
}

/// Validator rejecting blank input with `message`
pub fn require_non_empty(message: &str) -> impl Fn(&str) -> std::result::Result<(), String> + '_ {
    move |input| {
        if input.trim().is_empty() {
            Err(message.to_string())
        } else {
            Ok(())
        }
    }
}

/// Parse a salary: a finite, non-negative number
pub fn parse_salary(input: &str) -> std::result::Result<f64, String> {
    match input.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err("Invalid salary. Please enter a number.".to_string()),
    }
}
