//! deepchat - terminal chat client

mod commands;
mod config;
mod ui;
mod utils;

use clap::Parser;
use deepchat_client::DEFAULT_MODEL_LABEL;
use deepchat_session::{ChatMode, HttpTransport, Session, SessionConfig, SessionEvent};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// deepchat - chat with a DeepSeek-backed service from the terminal
#[derive(Parser, Debug)]
#[command(name = "deepchat")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the chat API (default: http://127.0.0.1:3000/api)
    #[arg(short, long)]
    api_url: Option<String>,

    /// Wait for the complete reply instead of streaming it
    #[arg(short, long)]
    sync: bool,

    /// Label shown for replies whose backend names no model
    #[arg(long)]
    model_label: Option<String>,

    /// Run in non-interactive mode with a single message
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable TUI mode (use simple stdin/stdout)
    #[arg(long)]
    no_tui: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so piped replies stay clean
    if args.verbose {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "deepchat=debug,deepchat_client=debug,deepchat_session=debug".into()
        });
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let cfg = config::Config::load();

    // CLI takes precedence over the config file
    let api_url = args
        .api_url
        .clone()
        .unwrap_or_else(|| cfg.api_url().to_string());
    let mode = if args.sync {
        ChatMode::Sync
    } else {
        cfg.mode.unwrap_or_default()
    };
    let model_label = args
        .model_label
        .clone()
        .or(cfg.model_label.clone())
        .unwrap_or_else(|| DEFAULT_MODEL_LABEL.to_string());
    let use_tui = !args.no_tui && cfg.tui.unwrap_or(true);

    tracing::debug!(%api_url, %mode, "Starting deepchat");

    let transport = Arc::new(HttpTransport::new(api_url));
    let mut session = Session::new(SessionConfig { mode, model_label }, transport);

    if let Some(command) = args.command {
        return run_command(&mut session, &command).await;
    }

    if use_tui {
        return ui::run_tui(&mut session, cfg.suggestions()).await;
    }

    run_interactive(&mut session, &cfg.suggestions()).await
}

/// Print one send's replies as they arrive. Resolves to whether the send failed.
fn spawn_printer(mut receiver: broadcast::Receiver<SessionEvent>) -> JoinHandle<bool> {
    tokio::spawn(async move {
        let mut printed = String::new();
        let mut stdout = io::stdout();

        loop {
            let event = match receiver.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Printer lagged behind session events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return false,
            };

            match event {
                SessionEvent::MessageAdded { message }
                | SessionEvent::MessageUpdated { message }
                    if message.is_assistant() && !message.is_error =>
                {
                    let (restart, delta) = utils::streaming_delta(&printed, &message.content);
                    if restart {
                        println!();
                    }
                    print!("{}", delta);
                    stdout.flush().ok();
                    printed = message.content;
                }
                SessionEvent::MessageAdded { message } if message.is_error => {
                    if !printed.is_empty() {
                        println!();
                        printed.clear();
                    }
                    eprintln!("{}", message.content);
                }
                SessionEvent::MessageFinalized { .. } => {
                    println!();
                    printed.clear();
                }
                SessionEvent::SendEnd { failed } => {
                    if !printed.is_empty() {
                        println!();
                    }
                    return failed;
                }
                _ => {}
            }
        }
    })
}

/// Send one message and wait until its reply has been printed
async fn send_and_print(session: &mut Session, text: &str) -> anyhow::Result<bool> {
    let printer = spawn_printer(session.subscribe());

    match session.send(text).await {
        Ok(outcome) => {
            let failed = printer.await.unwrap_or(outcome.is_failed());
            Ok(failed)
        }
        Err(e) => {
            printer.abort();
            Err(e.into())
        }
    }
}

async fn run_command(session: &mut Session, command: &str) -> anyhow::Result<()> {
    println!("deepchat> {}", command);
    println!();

    if send_and_print(session, command).await? {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_interactive(session: &mut Session, suggestions: &[String]) -> anyhow::Result<()> {
    if io::IsTerminal::is_terminal(&io::stderr()) {
        eprintln!("deepchat ({} mode, {})", session.mode(), session.config().model_label);
        eprintln!("Type /help for commands.");
        eprintln!();
    }

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(result) = commands::execute_command(input, session.mode()) {
            match result {
                commands::CommandResult::Clear => {
                    session.clear();
                    println!("Cleared conversation.");
                }
                commands::CommandResult::Exit => break,
                commands::CommandResult::Message(msg) => println!("{}", msg),
                commands::CommandResult::SetMode(mode) => {
                    session.set_mode(mode);
                    println!("Mode set to: {}", mode);
                }
                commands::CommandResult::OpenSuggestions => {
                    println!("Try asking:");
                    for suggestion in suggestions {
                        println!("  • {}", suggestion);
                    }
                }
                commands::CommandResult::Unknown(cmd) => {
                    println!("Unknown command: /{}", cmd);
                    println!("Type /help for available commands.");
                }
            }
            println!();
            continue;
        }

        tracing::debug!(prompt = %utils::truncate_chars(input, 60), "Submitting");
        println!();

        if let Err(e) = send_and_print(session, input).await {
            eprintln!("Error: {}", e);
        }
        println!();
    }

    Ok(())
}
