//! Main menu and mode dispatch.

use croqli::ChatClient;
use croqli::logging::LogBuffer;
use croqli::prompts::{PromptEngine, PromptStore};
use croqli::search::SearchClient;
use croqli::shell::CommandHistory;

use crate::cli::Mode;
use crate::config::Settings;
use crate::{assist, chat, prompts_menu, search_mode, settings_menu, ui};

const MENU: [(&str, MenuItem); 6] = [
    ("Chat Mode", MenuItem::Chat),
    ("Search Mode", MenuItem::Search),
    ("CLI-Assistant Mode", MenuItem::Assist),
    ("Settings", MenuItem::Settings),
    ("System Prompts", MenuItem::Prompts),
    ("Quit", MenuItem::Quit),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MenuItem {
    Chat,
    Search,
    Assist,
    Settings,
    Prompts,
    Quit,
}

/// Session state shared by every mode.
pub struct App<S: PromptStore> {
    settings: Settings,
    engine: PromptEngine<S>,
    history: CommandHistory,
    logs: LogBuffer,
}

impl<S: PromptStore> App<S> {
    pub fn new(settings: Settings, engine: PromptEngine<S>, logs: LogBuffer) -> Self {
        Self {
            settings,
            engine,
            history: CommandHistory::default(),
            logs,
        }
    }

    /// Open `mode`; the menu loops until Quit, the other modes return when
    /// the user leaves them.
    pub async fn run(&mut self, mode: Mode) -> Result<(), String> {
        ui::print_logs(&self.logs);
        match mode {
            Mode::Menu => self.menu().await,
            Mode::Chat => self.open(MenuItem::Chat).await,
            Mode::Search => self.open(MenuItem::Search).await,
            Mode::Assist => self.open(MenuItem::Assist).await,
        }
    }

    async fn menu(&mut self) -> Result<(), String> {
        let items: Vec<String> = MENU.iter().map(|(label, _)| label.to_string()).collect();
        loop {
            let choice = ui::select("Light CroqLI", &items, 0)?;
            let item = choice.map_or(MenuItem::Quit, |i| MENU[i].1);
            if item == MenuItem::Quit {
                println!("Goodbye.");
                return Ok(());
            }
            if let Err(e) = self.open(item).await {
                eprintln!("Error: {e}");
            }
            ui::print_logs(&self.logs);
        }
    }

    async fn open(&mut self, item: MenuItem) -> Result<(), String> {
        match item {
            MenuItem::Chat => {
                let client = self.chat_client()?;
                chat::run(
                    &client,
                    &self.settings.generation,
                    &mut self.engine,
                    &self.logs,
                )
                .await
            }
            MenuItem::Search => {
                let client = self.search_client()?;
                search_mode::run(&client, &self.logs).await
            }
            MenuItem::Assist => {
                let client = self.chat_client()?;
                assist::run(
                    &client,
                    &self.settings.generation,
                    &mut self.history,
                    &self.logs,
                )
                .await
            }
            MenuItem::Settings => settings_menu::run(&mut self.settings),
            MenuItem::Prompts => prompts_menu::run(&mut self.engine, &self.logs),
            MenuItem::Quit => Ok(()),
        }
    }

    fn chat_client(&self) -> Result<ChatClient, String> {
        let key = self
            .settings
            .groq_api_key
            .as_deref()
            .ok_or("GROQ_API_KEY is not set")?;
        ChatClient::with_endpoint(key, self.settings.groq_url.as_str())
    }

    fn search_client(&self) -> Result<SearchClient, String> {
        let key = self
            .settings
            .tavily_api_key
            .as_deref()
            .ok_or("TAVILY_API_KEY is not set")?;
        SearchClient::with_base_url(key, self.settings.tavily_url.as_str())
    }
}
