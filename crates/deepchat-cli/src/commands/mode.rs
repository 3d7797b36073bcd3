//! /mode command - show and set the request mode

use super::CommandResult;
use deepchat_session::ChatMode;

pub struct ModeCommand;

impl ModeCommand {
    pub fn execute(args: &str, current: ChatMode) -> CommandResult {
        if args.is_empty() {
            return CommandResult::Message(show_modes(current));
        }

        match args.parse::<ChatMode>() {
            Ok(mode) => CommandResult::SetMode(mode),
            Err(e) => CommandResult::Message(format!("{}\nValid modes: stream, sync", e)),
        }
    }
}

fn show_modes(current: ChatMode) -> String {
    let modes = [
        (ChatMode::Stream, "Show the reply as it is generated"),
        (ChatMode::Sync, "Wait for the complete reply"),
    ];

    let mut output = String::from("Request modes:\n\n");
    for (mode, desc) in modes {
        let marker = if mode == current { " *" } else { "" };
        output.push_str(&format!("  {:<8} {}{}\n", mode.as_str(), desc, marker));
    }
    output.push_str("\nSet with: /mode <stream|sync> (or Ctrl+T)");
    output
}
