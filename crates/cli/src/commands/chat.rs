//! `loopsmith chat` — Interactive or single-message chat mode.

use anyhow::{Context, Result};
use loopsmith_agent::{Agent, ChatOptions};
use loopsmith_config::AppConfig;
use loopsmith_core::event::AgentEvent;
use loopsmith_model::OpenAiCompatClient;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;

pub async fn run(message: Option<String>, no_stream: bool) -> Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    let stream = !no_stream && config.agent.enable_streaming;

    let client = OpenAiCompatClient::with_timeout(
        &config.model.base_url,
        config.model.api_key.clone(),
        Duration::from_secs(config.model.timeout_secs),
    )
    .context("Failed to build model client")?;

    let model_name = config.model.model.clone();
    let workspace = config.workspace.root_path.clone();
    let agent = Agent::new(config, Arc::new(client));

    // Render tool activity and stream chunks as they happen
    let mut events = agent.events().subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event.as_ref() {
                AgentEvent::StreamChunk { content, .. } => {
                    print!("{content}");
                    let _ = std::io::stdout().flush();
                }
                AgentEvent::ToolCallStart {
                    tool_name,
                    arguments,
                    ..
                } => {
                    eprintln!("  [tool] {tool_name} {arguments}");
                }
                AgentEvent::SubAgentStart {
                    name, task_preview, ..
                } => {
                    eprintln!("  [subagent] {name}: {task_preview}");
                }
                _ => {}
            }
        }
    });

    if let Some(msg) = message {
        // Single message mode
        let result = agent
            .chat(
                &msg,
                ChatOptions {
                    stream: Some(stream),
                    ..Default::default()
                },
            )
            .await;
        if stream {
            // Content was already printed chunk by chunk
            println!();
        } else {
            println!("{}", result.content);
        }
        if let Some(error) = &result.error {
            eprintln!("  [error] {error}");
        }
    } else {
        // Interactive mode
        println!();
        println!("  Loopsmith — Interactive Mode");
        println!("  Model:     {model_name}");
        println!("  Workspace: {workspace}");
        println!("  Skills:    {}", agent.skills().len());
        println!();
        println!("  Type your message and press Enter. Type 'exit' to quit.");
        println!();

        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();

        print!("  You > ");
        std::io::stdout().flush()?;

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                print!("  You > ");
                std::io::stdout().flush()?;
                continue;
            }
            if line == "exit" || line == "quit" {
                break;
            }

            println!();
            let result = agent
                .chat(
                    line,
                    ChatOptions {
                        stream: Some(stream),
                        ..Default::default()
                    },
                )
                .await;

            if stream {
                println!();
            } else {
                for out in result.content.lines() {
                    println!("  Assistant > {out}");
                }
            }
            if let Some(error) = &result.error {
                eprintln!("  [error] {error}");
            }

            println!();
            print!("  You > ");
            std::io::stdout().flush()?;
        }

        println!();
        println!("  Goodbye!");
    }

    printer.abort();
    Ok(())
}
