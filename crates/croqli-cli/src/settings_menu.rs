//! The Settings menu. Changes last for the current session only.

use croqli::api::KNOWN_MODELS;

use crate::config::Settings;
use crate::ui;

const ITEMS: [&str; 6] = [
    "Model",
    "Max Tokens",
    "Temperature",
    "Top-p",
    "API Keys",
    "Back",
];

pub fn run(settings: &mut Settings) -> Result<(), String> {
    let items: Vec<String> = ITEMS.iter().map(|s| s.to_string()).collect();
    loop {
        println!("\n{}\n", settings.summary());
        let Some(choice) = ui::select("Settings", &items, 0)? else {
            break;
        };
        let result = match ITEMS[choice] {
            "Model" => choose_model(settings)?,
            "Max Tokens" => {
                let limit = settings.max_tokens_limit();
                let value = ui::input_value(
                    &format!("Max tokens (1-{limit})"),
                    settings.generation.max_tokens,
                )?;
                settings.set_max_tokens(value)
            }
            "Temperature" => {
                let value =
                    ui::input_value("Temperature (0.0-1.0)", settings.generation.temperature)?;
                settings.set_temperature(value)
            }
            "Top-p" => {
                let value = ui::input_value("Top-p (0.0-1.0)", settings.generation.top_p)?;
                settings.set_top_p(value)
            }
            "API Keys" => {
                for line in settings.key_status() {
                    println!("{line}");
                }
                Ok(())
            }
            _ => break,
        };
        if let Err(e) = result {
            eprintln!("Error: {e}");
        }
    }
    Ok(())
}

/// Menu rows for the known models, e.g. `mixtral-8x7b-32768 (max 32768 tokens)`.
pub fn model_labels() -> Vec<String> {
    KNOWN_MODELS
        .iter()
        .map(|m| format!("{} (max {} tokens)", m.name, m.max_tokens))
        .collect()
}

fn choose_model(settings: &mut Settings) -> Result<Result<(), String>, String> {
    let current = KNOWN_MODELS
        .iter()
        .position(|m| m.name == settings.generation.model)
        .unwrap_or(0);
    let Some(choice) = ui::select("Model", &model_labels(), current)? else {
        return Ok(Ok(()));
    };
    Ok(KNOWN_MODELS
        .get(choice)
        .ok_or_else(|| "no such model".to_string())
        .and_then(|m| settings.set_model(m.name)))
}
