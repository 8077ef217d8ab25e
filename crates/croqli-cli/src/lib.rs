//! Interactive terminal front end for croqli.
//!
//! The `croqli` binary opens a menu with four modes:
//!
//! - **Chat** with the model under the active system prompt.
//! - **Search** the web through Tavily.
//! - **CLI-Assistant**: describe a task, confirm the proposed shell command,
//!   and let the assistant repair it once if it fails.
//! - **System Prompts**: add, edit, reorder, pin and activate prompts.
//!
//! ```sh
//! export GROQ_API_KEY=gsk_...
//! croqli                         # main menu
//! croqli --mode assist           # straight into CLI-assistant mode
//! croqli --prompts-file ~/p.json --model mixtral-8x7b-32768
//! ```

pub mod app;
pub mod assist;
pub mod chat;
pub mod cli;
pub mod completer;
pub mod config;
pub mod prompts_menu;
pub mod search_mode;
pub mod settings_menu;
pub mod ui;

pub use app::App;
pub use cli::{Cli, Mode};
pub use config::Settings;
