//! Search mode: web search from the terminal.

use croqli::logging::LogBuffer;
use croqli::search::{DEFAULT_MAX_RESULTS, SearchClient, format_results};

use crate::ui;

/// Whether a search-mode line asks to leave.
pub fn is_leave_command(line: &str) -> bool {
    matches!(
        line.trim().to_lowercase().as_str(),
        "/quit" | "/back" | "/menu"
    )
}

pub async fn run(client: &SearchClient, logs: &LogBuffer) -> Result<(), String> {
    println!("Search mode. /back returns to the menu.");
    loop {
        let query = ui::read_line("Search")?;
        if is_leave_command(&query) {
            break;
        }
        if query.trim().is_empty() {
            continue;
        }
        match client.search(&query, DEFAULT_MAX_RESULTS).await {
            Ok(response) => println!("{}\n", format_results(&response)),
            Err(e) => eprintln!("Search failed: {e}"),
        }
        ui::print_logs(logs);
    }
    println!("Exiting search mode.");
    Ok(())
}
