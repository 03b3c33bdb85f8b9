//! Parsing of REPL input lines into protocol frames.

use irori_shared::protocol::Inbound;

/// What one input line asks the client to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Send this frame to the server.
    Send(Inbound),
    Help,
    Quit,
    /// A slash command we do not know.
    Unknown(String),
}

/// Parse one line of user input. Returns `None` for blank lines.
///
/// Anything not starting with `/` is a chat message.
pub fn parse_line(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Some(rest) = trimmed.strip_prefix('/') else {
        return Some(Command::Send(Inbound::Chat {
            text: trimmed.to_string(),
        }));
    };

    let (cmd, arg) = match rest.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (rest, ""),
    };

    Some(match cmd {
        "name" => Command::Send(Inbound::SetName {
            name: arg.to_string(),
        }),
        "status" => Command::Send(Inbound::Status),
        "users" => Command::Send(Inbound::ListUsers),
        "ping" => Command::Send(Inbound::Ping {
            token: (!arg.is_empty()).then(|| arg.to_string()),
        }),
        "ai" => Command::Send(Inbound::Ai {
            prompt: arg.to_string(),
        }),
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    })
}
