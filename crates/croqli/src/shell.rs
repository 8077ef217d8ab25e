//! Shell assistance: environment detection, guarded command execution,
//! a bounded command history, and shell history-file search.
//!
//! The command assistant asks the model for a [`CommandSuggestion`], runs it
//! with [`CommandRunner`], and on repeated failure asks for a [`HelpfulTip`].
//! Prompts for each step are built here so the CLI only orchestrates.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::json_schema_for;
use crate::prompt::SystemPromptBuilder;

/// Substrings (lowercase) of commands that are never executed.
pub const DEFAULT_BLOCKED_COMMANDS: &[&str] = &["rm -rf /", "mkfs", "> /dev/sd", "dd if=", ":(){"];

/// Entries kept in [`CommandHistory`].
pub const COMMAND_HISTORY_LENGTH: usize = 100;

/// History entries shown to the model in the assistant prompt.
pub const PROMPT_HISTORY_ENTRIES: usize = 3;

// ── Environment ────────────────────────────────────────────────────

/// The user's shell (by name, e.g. `zsh`) and operating system.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct ShellAndOs {
    pub shell: String,
    pub os: String,
}

/// How to open files and which browser to mention on a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformHints {
    pub open_command: &'static str,
    pub browser: &'static str,
}

impl ShellAndOs {
    /// Detect from `$SHELL` and the compile-time target OS.
    pub fn detect() -> Self {
        let shell = std::env::var("SHELL").ok();
        Self::from_shell_path(shell.as_deref(), std::env::consts::OS)
    }

    /// Build from a shell path such as `/usr/bin/zsh`. Defaults to `bash`.
    pub fn from_shell_path(shell_path: Option<&str>, os: &str) -> Self {
        let shell = shell_path
            .and_then(|p| Path::new(p).file_name())
            .and_then(|n| n.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("bash");
        Self {
            shell: shell.to_string(),
            os: os.to_lowercase(),
        }
    }

    pub fn platform_hints(&self) -> Option<PlatformHints> {
        match self.os.as_str() {
            "macos" => Some(PlatformHints {
                open_command: "open",
                browser: "Safari",
            }),
            "linux" => Some(PlatformHints {
                open_command: "xdg-open",
                browser: "firefox",
            }),
            _ => None,
        }
    }

    /// OS name for prose, e.g. `Linux`, `macOS`.
    pub fn os_label(&self) -> String {
        match self.os.as_str() {
            "macos" => "macOS".to_string(),
            other => {
                let mut chars = other.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => "an unknown OS".to_string(),
                }
            }
        }
    }
}

// ── Command execution ──────────────────────────────────────────────

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub stdout: String,
    pub stderr: String,
    /// Exit status, or -1 when the process was killed by a signal.
    pub exit_code: i32,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Best available description of a failure.
    pub fn error_text(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            format!("command exited with status {}", self.exit_code)
        } else {
            stderr.to_string()
        }
    }
}

/// Runs commands through the user's shell (`<shell> -c <command>`), refusing
/// any that match a blocked pattern.
pub struct CommandRunner {
    shell: String,
    blocked_commands: Vec<String>,
}

impl CommandRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            blocked_commands: DEFAULT_BLOCKED_COMMANDS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    /// Add a blocked pattern (lowercased substring match).
    pub fn block_command(mut self, pattern: impl Into<String>) -> Self {
        self.blocked_commands.push(pattern.into().to_lowercase());
        self
    }

    pub fn is_blocked(&self, command: &str) -> bool {
        let lower = command.to_lowercase();
        self.blocked_commands.iter().any(|pat| lower.contains(pat))
    }

    /// Run `command` to completion. `Err` means it never started.
    pub async fn run(&self, command: &str) -> Result<CommandOutcome, String> {
        let command = command.trim();
        if command.is_empty() {
            return Err("no command to run".to_string());
        }
        if self.is_blocked(command) {
            warn!("Blocked command: {command}");
            return Err(format!("refusing to run potentially destructive command: {command}"));
        }

        debug!("Running via {}: {command}", self.shell);
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .output()
            .await
            .map_err(|e| format!("failed to start {}: {e}", self.shell))?;

        let outcome = CommandOutcome {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        };
        debug!("Command exited with {}", outcome.exit_code);
        Ok(outcome)
    }
}

// ── Command history ────────────────────────────────────────────────

/// One assistant attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub user_prompt: String,
    pub command: String,
    pub success: bool,
    pub output: Option<String>,
    pub error: Option<String>,
}

/// Most recent assistant attempts, oldest first, capped at a fixed length.
#[derive(Debug, Clone)]
pub struct CommandHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::with_capacity(COMMAND_HISTORY_LENGTH)
    }
}

impl CommandHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, dropping the oldest when full. Also logs the attempt.
    pub fn record(&mut self, entry: HistoryEntry) {
        info!(
            user_prompt = %entry.user_prompt,
            command = %entry.command,
            success = entry.success,
            "Assistant command {}",
            if entry.success { "succeeded" } else { "failed" }
        );
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }
}

// ── Shell history files ────────────────────────────────────────────

/// Location of the history file for `shell` under `home`.
pub fn history_file(shell: &str, home: &Path) -> Option<PathBuf> {
    match shell {
        "bash" => Some(home.join(".bash_history")),
        "zsh" => Some(home.join(".zsh_history")),
        "fish" => Some(home.join(".local/share/fish/fish_history")),
        _ => None,
    }
}

/// Extract commands from history file text, oldest first.
///
/// Handles plain bash history (skipping `#<timestamp>` lines), zsh extended
/// history (`: <time>:<duration>;<command>`), and fish's YAML-like format.
pub fn parse_history(shell: &str, text: &str) -> Vec<String> {
    let commands = text.lines().filter_map(|line| {
        if shell == "fish" {
            return line.strip_prefix("- cmd: ").map(str::to_string);
        }
        if line
            .strip_prefix('#')
            .is_some_and(|ts| !ts.is_empty() && ts.chars().all(|c| c.is_ascii_digit()))
        {
            return None;
        }
        let command = match line.strip_prefix(": ") {
            Some(rest) => rest.split_once(';').map_or(line, |(_, cmd)| cmd),
            None => line,
        };
        Some(command.to_string())
    });
    commands.filter(|c| !c.trim().is_empty()).collect()
}

/// Up to `limit` distinct history commands containing `query`
/// (case-insensitive), most recent first.
pub fn search_history(shell: &str, home: &Path, query: &str, limit: usize) -> Vec<String> {
    let Some(path) = history_file(shell, home) else {
        debug!("No history file known for shell {shell}");
        return Vec::new();
    };
    let bytes = match std::fs::read(&path) {
        Ok(b) => b,
        Err(e) => {
            debug!("Cannot read history file {}: {e}", path.display());
            return Vec::new();
        }
    };
    let text = String::from_utf8_lossy(&bytes);
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<String> = Vec::new();
    for command in parse_history(shell, &text).into_iter().rev() {
        if command.to_lowercase().contains(&needle) && !matches.contains(&command) {
            matches.push(command);
            if matches.len() == limit {
                break;
            }
        }
    }
    matches
}

/// [`search_history`] in the current user's home directory.
pub fn search_user_history(shell: &str, query: &str, limit: usize) -> Vec<String> {
    match dirs::home_dir() {
        Some(home) => search_history(shell, &home, query, limit),
        None => {
            warn!("Cannot determine home directory for history search");
            Vec::new()
        }
    }
}

// ── Structured model responses ─────────────────────────────────────

/// A single shell command proposed by the model.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct CommandSuggestion {
    /// The complete shell command to run.
    pub command: String,
}

/// The model's advice after a command failed twice.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct HelpfulTip {
    /// Why the command failed.
    pub explanation: String,
    /// How to fix it, or an alternative approach.
    pub suggestion: String,
    /// Anything else worth knowing about the command or error.
    #[serde(default)]
    pub additional_info: String,
}

impl HelpfulTip {
    fn unparseable() -> Self {
        Self {
            explanation: "The assistant's advice could not be parsed.".to_string(),
            suggestion: "Check the command and the error message.".to_string(),
            additional_info: String::new(),
        }
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "Why it failed: {}\nTry this: {}",
            self.explanation.trim(),
            self.suggestion.trim()
        );
        if !self.additional_info.trim().is_empty() {
            out.push_str(&format!("\nAlso: {}", self.additional_info.trim()));
        }
        out
    }
}

pub fn parse_command_suggestion(text: &str) -> Result<CommandSuggestion, String> {
    let suggestion: CommandSuggestion = serde_json::from_str(text.trim())
        .map_err(|e| format!("model did not return a command object: {e}"))?;
    if suggestion.command.trim().is_empty() {
        return Err("model returned an empty command".to_string());
    }
    Ok(suggestion)
}

/// Parse a tip, substituting a generic one when the model's JSON is unusable.
pub fn parse_helpful_tip(text: &str) -> HelpfulTip {
    serde_json::from_str(text.trim()).unwrap_or_else(|e| {
        warn!("Unparseable helpful tip ({e}): {text}");
        HelpfulTip::unparseable()
    })
}

// ── Prompts ────────────────────────────────────────────────────────

/// System prompt for turning a request into a [`CommandSuggestion`].
pub fn assistant_system_prompt(env: &ShellAndOs, history: &CommandHistory) -> String {
    let recent: Vec<String> = history
        .recent(PROMPT_HISTORY_ENTRIES)
        .map(|h| {
            format!(
                "Previous Command: {}, Success: {}, Error: {}",
                h.command,
                h.success,
                h.error.as_deref().unwrap_or("None")
            )
        })
        .collect();
    let recent = if recent.is_empty() {
        "No command history available.".to_string()
    } else {
        recent.join("\n")
    };
    let hints = env.platform_hints().map(|h| {
        format!(
            "Open command: {}\nDefault browser: {}",
            h.open_command, h.browser
        )
    });

    SystemPromptBuilder::new(format!(
        "You are a CLI assistant for {} using the {} shell. Turn the user's request \
         into one shell command that can run as-is.",
        env.os_label(),
        env.shell
    ))
    .section("System", pretty_json(env))
    .section("Recent command history", recent)
    .section_opt("Platform", hints)
    .section("Response format", response_format_note::<CommandSuggestion>())
    .build()
}

/// User message asking for a corrected command after `failed_command` failed.
pub fn retry_prompt(failed_command: &str, error: &str, related: &[String]) -> String {
    let mut prompt = format!(
        "The command `{failed_command}` failed with the following error:\n{}\n\
         Please modify the command to fix the error.",
        error.trim()
    );
    if !related.is_empty() {
        prompt.push_str("\n\nRelevant command history:\n");
        let lines: Vec<String> = related
            .iter()
            .map(|c| format!("Previous Command: {c}"))
            .collect();
        prompt.push_str(&lines.join("\n"));
    }
    prompt
}

/// `(system, user)` messages asking for a [`HelpfulTip`].
pub fn tip_prompts(env: &ShellAndOs, command: &str, error: &str) -> (String, String) {
    let system = SystemPromptBuilder::new(format!(
        "You are a CLI assistant helping with a failed command on {} using the {} shell.",
        env.os_label(),
        env.shell
    ))
    .section("Response format", response_format_note::<HelpfulTip>())
    .build();
    let user = format!(
        "The following command failed:\nCommand: {command}\nError message: {}\n\n\
         Explain why it failed, suggest a fix or alternative, and add anything else \
         that would help.",
        error.trim()
    );
    (system, user)
}

fn response_format_note<T: JsonSchema>() -> String {
    format!(
        "Respond with a single JSON object matching this schema and nothing else:\n{}",
        pretty_json(&json_schema_for::<T>())
    )
}

fn pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
