//! CLI-assistant mode: natural language in, shell command out.
//!
//! One request runs at most two commands. The model proposes a command, the
//! user confirms, and it runs through the user's shell. If it fails, related
//! commands from the shell's history file are sent back with the error and
//! the model proposes a fix. If the fix fails too, the model is asked to
//! explain the failure instead of guessing again.

use croqli::logging::LogBuffer;
use croqli::shell::{
    CommandHistory, CommandRunner, HelpfulTip, HistoryEntry, ShellAndOs, assistant_system_prompt,
    parse_command_suggestion, parse_helpful_tip, retry_prompt, search_user_history, tip_prompts,
};
use croqli::{ChatRequest, GenerationParams, Message};
use tracing::warn;

use crate::completer::Completer;
use crate::ui;

/// Related history commands sent along with a retry request.
const RELATED_HISTORY_LIMIT: usize = 3;

/// Sampling temperature for corrections and tips.
const REPAIR_TEMPERATURE: f32 = 0.1;

/// Looks up history-file commands: `(shell, query, limit)`.
pub type HistorySearch = fn(&str, &str, usize) -> Vec<String>;

/// How a request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistOutcome {
    Succeeded { command: String },
    /// The user did not confirm a proposed command.
    Declined,
    /// The proposed command matched a blocked pattern and was not run.
    Blocked { command: String },
    /// Both attempts failed. `tip` is `None` if the model could not be asked.
    Failed {
        command: String,
        tip: Option<HelpfulTip>,
    },
}

enum Attempt {
    Succeeded,
    Blocked,
    Failed(String),
}

pub struct Assistant<'a, C: Completer> {
    completer: &'a C,
    params: GenerationParams,
    env: ShellAndOs,
    runner: CommandRunner,
    history: &'a mut CommandHistory,
    history_search: HistorySearch,
}

impl<'a, C: Completer> Assistant<'a, C> {
    pub fn new(
        completer: &'a C,
        params: GenerationParams,
        env: ShellAndOs,
        history: &'a mut CommandHistory,
    ) -> Self {
        Self {
            completer,
            params,
            runner: CommandRunner::new(env.shell.clone()),
            env,
            history,
            history_search: search_user_history,
        }
    }

    pub fn with_history_search(mut self, search: HistorySearch) -> Self {
        self.history_search = search;
        self
    }

    /// Handle one request. `confirm` is asked before every command runs and
    /// `report` receives progress lines. `Err` means the model could not
    /// produce a usable command.
    pub async fn handle(
        &mut self,
        request: &str,
        confirm: &mut impl FnMut(&str) -> Result<bool, String>,
        report: &mut impl FnMut(&str),
    ) -> Result<AssistOutcome, String> {
        let system = assistant_system_prompt(&self.env, &*self.history);
        let messages = vec![Message::system(system), Message::user(request)];
        let command = self.suggest(messages, self.params.temperature).await?;

        report(&format!("Suggested command: {command}"));
        if !confirm(&command)? {
            return Ok(AssistOutcome::Declined);
        }
        let error = match self.execute(request, &command, report).await {
            Attempt::Succeeded => return Ok(AssistOutcome::Succeeded { command }),
            Attempt::Blocked => return Ok(AssistOutcome::Blocked { command }),
            Attempt::Failed(error) => error,
        };

        let query = command.split_whitespace().next().unwrap_or_default();
        let related = (self.history_search)(&self.env.shell, query, RELATED_HISTORY_LIMIT);
        let system = assistant_system_prompt(&self.env, &*self.history);
        let messages = vec![
            Message::system(system),
            Message::user(request),
            Message::user(retry_prompt(&command, &error, &related)),
        ];
        let retry = self.suggest(messages, REPAIR_TEMPERATURE).await?;

        report(&format!("Retrying with: {retry}"));
        if !confirm(&retry)? {
            return Ok(AssistOutcome::Declined);
        }
        let error = match self.execute(request, &retry, report).await {
            Attempt::Succeeded => return Ok(AssistOutcome::Succeeded { command: retry }),
            Attempt::Blocked => return Ok(AssistOutcome::Blocked { command: retry }),
            Attempt::Failed(error) => error,
        };

        let tip = self.tip(&retry, &error).await;
        if let Some(tip) = &tip {
            report(&tip.render());
        }
        Ok(AssistOutcome::Failed {
            command: retry,
            tip,
        })
    }

    async fn suggest(&self, messages: Vec<Message>, temperature: f32) -> Result<String, String> {
        let mut request = ChatRequest::new(&self.params, messages).json_object();
        request.temperature = Some(temperature);
        let text = self.completer.complete(&request).await?;
        Ok(parse_command_suggestion(&text)?.command.trim().to_string())
    }

    async fn tip(&self, command: &str, error: &str) -> Option<HelpfulTip> {
        let (system, user) = tip_prompts(&self.env, command, error);
        let mut request =
            ChatRequest::new(&self.params, vec![Message::system(system), Message::user(user)])
                .json_object();
        request.temperature = Some(REPAIR_TEMPERATURE);
        match self.completer.complete(&request).await {
            Ok(text) => Some(parse_helpful_tip(&text)),
            Err(e) => {
                warn!("Could not ask for a helpful tip: {e}");
                None
            }
        }
    }

    async fn execute(
        &mut self,
        request: &str,
        command: &str,
        report: &mut impl FnMut(&str),
    ) -> Attempt {
        let mut entry = HistoryEntry {
            user_prompt: request.to_string(),
            command: command.to_string(),
            success: false,
            output: None,
            error: None,
        };

        if self.runner.is_blocked(command) {
            report(&format!(
                "Refusing to run potentially destructive command: {command}"
            ));
            entry.error = Some("blocked".to_string());
            self.history.record(entry);
            return Attempt::Blocked;
        }

        report(&format!("Running command [{command}] ..."));
        let attempt = match self.runner.run(command).await {
            Ok(outcome) if outcome.success() => {
                report("Command executed successfully.");
                if !outcome.stdout.trim().is_empty() {
                    report(outcome.stdout.trim_end());
                }
                entry.success = true;
                entry.output = Some(outcome.stdout);
                Attempt::Succeeded
            }
            Ok(outcome) => {
                let error = outcome.error_text();
                report(&format!("Error executing command: {error}"));
                entry.output = Some(outcome.stdout);
                entry.error = Some(error.clone());
                Attempt::Failed(error)
            }
            Err(error) => {
                report(&format!("Error executing command: {error}"));
                entry.error = Some(error.clone());
                Attempt::Failed(error)
            }
        };
        self.history.record(entry);
        attempt
    }
}

fn is_leave_command(line: &str) -> bool {
    matches!(
        line.trim().to_lowercase().as_str(),
        "exit" | "quit" | "/quit" | "/back" | "/menu"
    )
}

/// Run the assistant loop until the user leaves. `history` outlives the loop
/// so later visits still see earlier attempts.
pub async fn run(
    completer: &impl Completer,
    params: &GenerationParams,
    history: &mut CommandHistory,
    logs: &LogBuffer,
) -> Result<(), String> {
    let env = ShellAndOs::detect();
    println!(
        "CLI-assistant mode ({} on {}). Describe what you want to do; /menu returns.",
        env.shell,
        env.os_label()
    );
    let mut assistant = Assistant::new(completer, params.clone(), env, history);

    loop {
        let line = ui::read_line("Query")?;
        if is_leave_command(&line) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let mut confirm = |command: &str| ui::confirm(&format!("Run `{command}`?"), true);
        let mut report = |message: &str| println!("{message}");
        match assistant.handle(line.trim(), &mut confirm, &mut report).await {
            Ok(AssistOutcome::Declined) => println!("Command not run."),
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error: {e}");
                eprintln!("Tip: Please ensure your input is clear, or try simplifying your request.");
            }
        }
        ui::print_logs(logs);
    }
    Ok(())
}
