//! Agent command handlers (interactive + single-message mode).

use std::io::{self, BufRead, Write};

use anyhow::Result;

use redpulse::config::Config;

use super::common::build_agent;

/// Interactive or single-message agent mode.
pub(crate) async fn cmd_agent(config: Config, message: Option<String>) -> Result<()> {
    let runlog_enabled = config.runlog.enabled;
    let runlog_path = config.runlog_path();
    let model = config.agent.model.clone();

    let mut agent = build_agent(config)?;

    if let Some(msg) = message {
        // Single message mode
        match agent.run(&msg).await {
            Ok(answer) => {
                println!("{}", answer);
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Interactive mode
    println!("RedPulse Research Agent");
    println!("Model: {}", model);
    if runlog_enabled {
        println!("Run log: {}", runlog_path.display());
    } else {
        println!("Run log: disabled");
    }
    println!("Type your question and press Enter. Type 'quit' or 'exit' to stop.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                // EOF
                println!();
                break;
            }
            Ok(_) => {
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }
                if input == "quit" || input == "exit" {
                    println!("Goodbye!");
                    break;
                }

                match agent.run(input).await {
                    Ok(answer) => {
                        println!();
                        println!("{}", answer);
                        println!();
                    }
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        eprintln!();
                    }
                }
            }
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }
    }

    Ok(())
}
