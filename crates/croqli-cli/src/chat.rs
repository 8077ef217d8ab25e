//! Chat mode: a conversation with the model under the active system prompt.

use croqli::logging::LogBuffer;
use croqli::prompts::{PromptEngine, PromptStore};
use croqli::{ChatRequest, GenerationParams, Message};

use crate::completer::Completer;
use crate::prompts_menu::{list_lines, render_error};
use crate::ui;

/// One line of chat input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Empty,
    Leave,
    ListPrompts,
    /// `/prompt <n>` with a 1-based display position.
    ActivatePrompt(usize),
    Clear,
    Invalid(String),
    Message(String),
}

pub fn parse_chat_input(line: &str) -> ChatInput {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    let lower = line.to_lowercase();
    match lower.as_str() {
        "/quit" | "/back" | "/menu" => return ChatInput::Leave,
        "/prompts" => return ChatInput::ListPrompts,
        "/clear" => return ChatInput::Clear,
        _ => {}
    }
    if let Some(arg) = lower.strip_prefix("/prompt")
        && (arg.is_empty() || arg.starts_with(char::is_whitespace))
    {
        return match arg.trim().parse::<usize>() {
            Ok(n) if n > 0 => ChatInput::ActivatePrompt(n),
            _ => ChatInput::Invalid("Usage: /prompt <number>".to_string()),
        };
    }
    ChatInput::Message(line.to_string())
}

/// Conversation history for one chat session.
#[derive(Debug, Default)]
pub struct ChatSession {
    history: Vec<Message>,
}

impl ChatSession {
    /// Messages for the next turn: optional system prompt, history, then `user`.
    pub fn messages(&self, system: Option<&str>, user: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        if let Some(system) = system {
            messages.push(Message::system(system));
        }
        messages.extend(self.history.iter().cloned());
        messages.push(Message::user(user));
        messages
    }

    /// Send one turn. History only grows when the model answers.
    pub async fn send(
        &mut self,
        completer: &impl Completer,
        params: &GenerationParams,
        system: Option<&str>,
        user: &str,
    ) -> Result<String, String> {
        let request = ChatRequest::new(params, self.messages(system, user));
        let reply = completer.complete(&request).await?;
        self.history.push(Message::user(user));
        self.history.push(Message::assistant(reply.clone()));
        Ok(reply)
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn turns(&self) -> usize {
        self.history.len() / 2
    }
}

/// Run the chat loop until the user leaves.
pub async fn run<S: PromptStore>(
    completer: &impl Completer,
    params: &GenerationParams,
    engine: &mut PromptEngine<S>,
    logs: &LogBuffer,
) -> Result<(), String> {
    println!("Chat mode. /prompts lists prompts, /prompt <n> switches, /back returns.");
    if let Some(active) = engine.active() {
        println!("Active prompt: {}", active.title());
    }
    let mut session = ChatSession::default();

    loop {
        let line = ui::read_line("You")?;
        match parse_chat_input(&line) {
            ChatInput::Empty => continue,
            ChatInput::Leave => break,
            ChatInput::Clear => {
                session.clear();
                println!("History cleared.");
            }
            ChatInput::ListPrompts => {
                for line in list_lines(&engine.view()) {
                    println!("{line}");
                }
            }
            ChatInput::ActivatePrompt(n) => match engine.id_at(n) {
                Some(id) => match engine.set_active(Some(&id)) {
                    Ok(()) => {
                        let title = engine.get(&id).map(|r| r.title()).unwrap_or_default();
                        println!("Switched to prompt {n}: {title}");
                    }
                    Err(e) => eprintln!("{}", render_error(&e)),
                },
                None => eprintln!("No prompt at position {n} (1..{}).", engine.len()),
            },
            ChatInput::Invalid(usage) => eprintln!("{usage}"),
            ChatInput::Message(text) => {
                let system = engine.active_content().map(str::to_string);
                match session.send(completer, params, system.as_deref(), &text).await {
                    Ok(reply) => println!("Assistant: {reply}"),
                    Err(e) => eprintln!("An error occurred: {e}"),
                }
            }
        }
        ui::print_logs(logs);
    }

    println!("Exiting chat mode.");
    Ok(())
}
