//! Interactive chat command.

use crate::agent::{Agent, ChatTurn};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::mcp::Toolbox;
use console::style;
use std::io::{self, BufRead, Write};
use tracing::info;
use uuid::Uuid;

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, settings: Settings) -> anyhow::Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Chat) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vett doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let session_id = Uuid::new_v4();
    info!("Starting chat session {}", session_id);

    let spinner = Output::spinner("Connecting to tool servers...");
    let toolbox = Toolbox::connect(&settings).await?;
    spinner.finish_and_clear();

    if toolbox.is_empty() {
        Output::warning("No tool servers connected. The assistant will answer without tools.");
    } else {
        Output::info(&format!(
            "Connected servers: {}",
            toolbox.server_names().join(", ")
        ));
    }

    let mut agent = Agent::new(toolbox, &settings.agent);
    if let Some(model) = model {
        agent = agent.with_model(&model);
    }

    println!("\n{}", style("Vett Chat").bold().cyan());
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. Use 'clear' to reset conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut history: Vec<ChatTurn> = Vec::new();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            history.clear();
            Output::info("Conversation history cleared.");
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        match agent.run(&history, input).await {
            Ok(response) => {
                spinner.finish_and_clear();

                for record in &response.tool_calls {
                    println!("{}", style(format!("  [{}]", record.name)).dim());
                }

                println!(
                    "\n{} {}\n",
                    style("Vett:").cyan().bold(),
                    response.content
                );

                history.push(ChatTurn {
                    user: input.to_string(),
                    assistant: response.content,
                });
            }
            Err(e) => {
                spinner.finish_and_clear();
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
