//! Ask command implementation.

use crate::agent::Agent;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::mcp::Toolbox;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    settings: Settings,
) -> anyhow::Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Chat) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vett doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let spinner = Output::spinner("Connecting to tool servers...");
    let toolbox = Toolbox::connect(&settings).await?;
    spinner.finish_and_clear();

    if toolbox.is_empty() {
        Output::warning("No tool servers connected. The assistant will answer without tools.");
    }

    let mut agent = Agent::new(toolbox, &settings.agent);
    if let Some(model) = model {
        agent = agent.with_model(&model);
    }

    let spinner = Output::spinner("Thinking...");

    match agent.run(&[], question).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.content);

            if !response.tool_calls.is_empty() {
                Output::header("Tool calls");
                for record in &response.tool_calls {
                    Output::list_item(&format!("{}", record));
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
