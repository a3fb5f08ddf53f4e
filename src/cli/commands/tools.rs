//! Tools command - list the tools advertised by the configured servers.

use crate::cli::Output;
use crate::config::Settings;
use crate::mcp::Toolbox;
use console::style;

/// Run the tools command.
pub async fn run_tools(settings: Settings) -> anyhow::Result<()> {
    let spinner = Output::spinner("Connecting to tool servers...");
    let toolbox = Toolbox::connect(&settings).await?;
    spinner.finish_and_clear();

    if toolbox.is_empty() {
        Output::warning("No tool servers connected.");
        Output::info("Check server configuration with 'vett config show'.");
        return Ok(());
    }

    for (server, tools) in toolbox.catalog() {
        Output::header(&format!("{} ({} tools)", server, tools.len()));
        for tool in tools {
            println!(
                "  {} {} - {}",
                style("*").cyan(),
                style(&tool.name).bold(),
                first_sentence(&tool.description)
            );
        }
    }

    Ok(())
}

/// The first sentence of a tool description, for compact listing.
fn first_sentence(description: &str) -> &str {
    match description.find(". ") {
        Some(idx) => &description[..idx + 1],
        None => description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sentence() {
        assert_eq!(
            first_sentence("Search the web. Use this for facts."),
            "Search the web."
        );
        assert_eq!(first_sentence("No trailing period"), "No trailing period");
    }
}
