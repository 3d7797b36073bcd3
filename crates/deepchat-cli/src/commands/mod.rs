//! Slash commands for interactive mode

mod mode;

pub use mode::ModeCommand;

use deepchat_session::ChatMode;

/// Result of executing a slash command
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Clear the conversation
    Clear,
    /// Switch the request mode
    SetMode(ChatMode),
    /// Show the starter prompts
    OpenSuggestions,
    /// Show a message to the user (not sent to the backend)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(input: &str, current_mode: ChatMode) -> Option<CommandResult> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next().unwrap_or("").to_lowercase();
    let args = parts.next().map(str::trim).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "clear" | "c" => CommandResult::Clear,

        "quit" | "exit" | "q" => CommandResult::Exit,

        "mode" | "m" => ModeCommand::execute(args, current_mode),

        "suggest" | "s" => CommandResult::OpenSuggestions,

        _ => CommandResult::Unknown(command),
    })
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?          Show this help message
  /mode, /m [mode]       Show or set the request mode (stream/sync)
  /suggest, /s           Show starter prompts
  /clear, /c             Clear the conversation
  /quit, /exit, /q       Exit deepchat

Keys (TUI):
  Enter    Send message
  Ctrl+T   Toggle stream/sync mode
  Ctrl+S   Starter prompts
  Ctrl+L   Clear conversation
  PgUp/Dn  Scroll history
  Ctrl+C   Quit"#
        .to_string()
}
