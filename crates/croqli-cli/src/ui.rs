//! Thin wrappers over `dialoguer` prompts.
//!
//! All wrappers share one theme and map terminal errors to strings.

use croqli::logging::{LogBuffer, LogLevel};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

fn theme() -> ColorfulTheme {
    ColorfulTheme::default()
}

/// Show a selection list. `None` when the user cancels with Esc or `q`.
pub fn select(prompt: &str, items: &[String], default: usize) -> Result<Option<usize>, String> {
    if items.is_empty() {
        return Ok(None);
    }
    Select::with_theme(&theme())
        .with_prompt(prompt)
        .items(items)
        .default(default.min(items.len() - 1))
        .interact_opt()
        .map_err(|e| format!("menu failed: {e}"))
}

/// Read a line, which may be empty.
pub fn read_line(prompt: &str) -> Result<String, String> {
    Input::<String>::with_theme(&theme())
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map_err(|e| format!("input failed: {e}"))
}

/// Read a line, offering `initial` as editable starting text.
pub fn edit_line(prompt: &str, initial: &str) -> Result<String, String> {
    Input::<String>::with_theme(&theme())
        .with_prompt(prompt)
        .with_initial_text(initial)
        .allow_empty(true)
        .interact_text()
        .map_err(|e| format!("input failed: {e}"))
}

/// Read a value of type `T`, re-prompting until it parses.
pub fn input_value<T>(prompt: &str, default: T) -> Result<T, String>
where
    T: Clone + ToString + std::str::FromStr,
    T::Err: ToString,
{
    Input::<T>::with_theme(&theme())
        .with_prompt(prompt)
        .default(default)
        .interact_text()
        .map_err(|e| format!("input failed: {e}"))
}

pub fn confirm(prompt: &str, default: bool) -> Result<bool, String> {
    Confirm::with_theme(&theme())
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| format!("confirmation failed: {e}"))
}

/// Print and clear every captured log line.
pub fn print_logs(logs: &LogBuffer) {
    for line in logs.drain() {
        match line.level {
            LogLevel::Warn | LogLevel::Error => eprintln!("{line}"),
            _ => println!("{line}"),
        }
    }
}
