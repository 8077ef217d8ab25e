//! The System Prompts menu.
//!
//! Pure presentation over [`PromptEngine`]: positions are resolved to ids at
//! the moment a prompt is selected, and every change goes through the engine.

use croqli::logging::LogBuffer;
use croqli::prompts::{
    Direction, PIN_QUOTA, PinChange, PromptEngine, PromptEntry, PromptError, PromptId, PromptStore,
};

use crate::ui;

/// One row of the prompt list, e.g. ` 2. [*] Shell Expert (pinned)`.
pub fn entry_label(entry: &PromptEntry) -> String {
    let marker = if entry.is_active { '*' } else { ' ' };
    let pinned = if entry.pinned { " (pinned)" } else { "" };
    format!("{:>2}. [{marker}] {}{pinned}", entry.position, entry.title)
}

pub fn list_lines(entries: &[PromptEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["No system prompts.".to_string()];
    }
    entries.iter().map(entry_label).collect()
}

/// One-line message for an engine error. Persistence failures carry a
/// warning since the change only lives in memory.
pub fn render_error(error: &PromptError) -> String {
    if error.is_applied() {
        format!("{error}\nWarning: changes may not survive a restart.")
    } else {
        format!("Error: {error}")
    }
}

/// A change the user asked for on one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptCommand {
    Use,
    Edit(String),
    Rename(String),
    Move(Direction),
    /// 0-based list order among unpinned prompts.
    MoveTo(usize),
    /// Target list order when unpinning; ignored when pinning.
    TogglePin(Option<usize>),
    Delete,
}

/// Apply `command` to `id`, returning a status line for the user.
pub fn perform<S: PromptStore>(
    engine: &mut PromptEngine<S>,
    id: &PromptId,
    command: PromptCommand,
) -> Result<String, PromptError> {
    let title = engine
        .get(id)
        .map(|r| r.title().to_string())
        .unwrap_or_default();
    let message = match command {
        PromptCommand::Use => {
            engine.set_active(Some(id))?;
            format!("Now using '{title}'.")
        }
        PromptCommand::Edit(content) => {
            engine.edit_content(id, &content)?;
            format!("Updated '{title}'.")
        }
        PromptCommand::Rename(new_title) => {
            engine.rename(id, &new_title)?;
            format!("Renamed '{title}' to '{}'.", new_title.trim())
        }
        PromptCommand::Move(direction) => {
            let moved = engine.move_by(id, direction)?;
            match (moved, direction) {
                (true, Direction::Up) => format!("Moved '{title}' up."),
                (true, Direction::Down) => format!("Moved '{title}' down."),
                (false, Direction::Up) => format!("'{title}' is already at the top."),
                (false, Direction::Down) => format!("'{title}' is already at the bottom."),
            }
        }
        PromptCommand::MoveTo(list_order) => {
            engine.reposition(id, list_order)?;
            format!(
                "Moved '{title}' to position {} of the unpinned list.",
                list_order + 1
            )
        }
        PromptCommand::TogglePin(target) => match engine.toggle_pin(id, target)? {
            PinChange::Pinned(rank) => format!("Pinned '{title}' ({} of {PIN_QUOTA}).", rank + 1),
            PinChange::Unpinned(rank) => {
                format!("Unpinned '{title}' to position {} of the unpinned list.", rank + 1)
            }
        },
        PromptCommand::Delete => {
            engine.delete(id)?;
            format!("Deleted '{title}'.")
        }
    };
    Ok(message)
}

/// Parse a 1-based position typed by the user into a 0-based index below
/// `len`. Blank input yields `None`.
pub fn parse_position(input: &str, len: usize) -> Result<Option<usize>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Ok(Some(n - 1)),
        _ => Err(format!("Enter a number from 1 to {len}.")),
    }
}

/// Menu entries for one prompt. Pinned prompts keep their pin order, so they
/// get no move actions.
fn action_labels(pinned: bool) -> Vec<&'static str> {
    let mut labels = vec!["Use", "Edit Prompt", "Change Title"];
    if !pinned {
        labels.extend(["Move Up", "Move Down", "Move To Position"]);
    }
    labels.push(if pinned { "Unpin" } else { "Pin" });
    labels.extend(["Delete", "Back"]);
    labels
}

/// Run the menu until the user goes back.
pub fn run<S: PromptStore>(engine: &mut PromptEngine<S>, logs: &LogBuffer) -> Result<(), String> {
    loop {
        let entries = engine.view();
        let mut items = vec!["Add New Prompt".to_string()];
        items.extend(entries.iter().map(entry_label));
        items.push("Back".to_string());

        let Some(choice) = ui::select("System Prompts", &items, 0)? else {
            break;
        };
        let result = if choice == 0 {
            add_prompt(engine)?
        } else if let Some(entry) = entries.get(choice - 1) {
            prompt_actions(engine, entry)?
        } else {
            break;
        };

        match result {
            Some(Ok(message)) => println!("{message}"),
            Some(Err(e)) => eprintln!("{}", render_error(&e)),
            None => {}
        }
        ui::print_logs(logs);
    }
    Ok(())
}

/// `Ok(None)` means the user backed out without changing anything.
type Step = Result<Option<Result<String, PromptError>>, String>;

fn add_prompt<S: PromptStore>(engine: &mut PromptEngine<S>) -> Step {
    let title = ui::read_line("Title")?;
    if title.trim().is_empty() {
        return Ok(None);
    }
    let content = ui::read_line("Prompt text")?;
    let make_active = ui::confirm("Use this prompt now?", false)?;
    Ok(Some(
        engine
            .add(title.trim(), &content, make_active)
            .map(|_| format!("Added '{}'.", title.trim())),
    ))
}

fn prompt_actions<S: PromptStore>(engine: &mut PromptEngine<S>, entry: &PromptEntry) -> Step {
    let id = entry.id.clone();
    let labels = action_labels(entry.pinned);
    let items: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
    let Some(choice) = ui::select(&entry_label(entry), &items, 0)? else {
        return Ok(None);
    };

    let command = match labels[choice] {
        "Use" => PromptCommand::Use,
        "Edit Prompt" => {
            let current = engine.get(&id).map(|r| r.content().to_string());
            PromptCommand::Edit(ui::edit_line("Prompt text", &current.unwrap_or_default())?)
        }
        "Change Title" => PromptCommand::Rename(ui::edit_line("Title", &entry.title)?),
        "Move Up" => PromptCommand::Move(Direction::Up),
        "Move Down" => PromptCommand::Move(Direction::Down),
        "Move To Position" => {
            let len = engine.unpinned_count();
            let input = ui::read_line(&format!("New position in the unpinned list (1-{len})"))?;
            match parse_position(&input, len) {
                Ok(Some(order)) => PromptCommand::MoveTo(order),
                Ok(None) => return Ok(None),
                Err(e) => {
                    eprintln!("{e}");
                    return Ok(None);
                }
            }
        }
        "Pin" => PromptCommand::TogglePin(None),
        "Unpin" => {
            let slots = engine.unpinned_count() + 1;
            let input = ui::read_line(&format!(
                "Position in the unpinned list (1-{slots}, blank for the end)"
            ))?;
            match parse_position(&input, slots) {
                Ok(target) => PromptCommand::TogglePin(target),
                Err(e) => {
                    eprintln!("{e}");
                    return Ok(None);
                }
            }
        }
        "Delete" => {
            if !ui::confirm(&format!("Delete '{}'?", entry.title), false)? {
                return Ok(None);
            }
            PromptCommand::Delete
        }
        _ => return Ok(None),
    };
    Ok(Some(perform(engine, &id, command)))
}
