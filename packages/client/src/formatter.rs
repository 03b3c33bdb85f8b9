//! Rendering of server frames for the terminal.

use chrono::DateTime;

use irori_shared::protocol::Outbound;

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[90m";
const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Render an epoch-milliseconds timestamp as a wall-clock time.
fn clock(at: i64) -> String {
    DateTime::from_timestamp_millis(at)
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

/// Format one server frame as a line (or block) for the terminal.
pub fn format_frame(frame: &Outbound) -> String {
    match frame {
        Outbound::Chat { from, text, at } => {
            format!("{DIM}{}{RESET} {BOLD}{from}{RESET}: {text}", clock(*at))
        }
        Outbound::System { text, at } => {
            format!("{DIM}{}{RESET} {YELLOW}* {text}{RESET}", clock(*at))
        }
        Outbound::AckName { name, .. } => {
            format!("{GREEN}Your name is now: {name}{RESET}")
        }
        Outbound::Status {
            version,
            uptime_seconds,
            user_count,
            peak_users,
            messages_sent,
            messages_per_second,
            memory_mb,
            ai_enabled,
            ai_model,
            ..
        } => {
            let ai = match ai_model {
                Some(model) if *ai_enabled => format!("ai: {model}"),
                _ => "ai: off".to_string(),
            };
            format!(
                "{CYAN}[status] v{version} | users: {user_count} (peak {peak_users}) | \
                 uptime: {uptime_seconds}s | msgs: {messages_sent} ({messages_per_second}/s) | \
                 mem: {memory_mb} MB | {ai}{RESET}"
            )
        }
        Outbound::ListUsers { users } => {
            if users.is_empty() {
                return format!("{CYAN}[users] nobody connected{RESET}");
            }
            let mut output = format!("{CYAN}[users] {} connected{RESET}", users.len());
            for user in users {
                output.push_str(&format!("\n  {BOLD}{}{RESET} ({} / {})", user.name, user.ip, user.id));
            }
            output
        }
        Outbound::Pong { token, at } => match token {
            Some(token) => format!("{CYAN}pong (token: {token}) at {}{RESET}", clock(*at)),
            None => format!("{CYAN}pong at {}{RESET}", clock(*at)),
        },
        Outbound::Ai {
            from,
            prompt,
            response,
            response_ms,
            ..
        } => {
            format!(
                "{DIM}{from} asked: {prompt}{RESET}\n{BOLD}AI{RESET} ({response_ms} ms): {response}"
            )
        }
        Outbound::Error { message } => format!("{RED}! {message}{RESET}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_frame_shows_name_and_text() {
        // given:
        let frame = Outbound::Chat {
            from: "alice".to_string(),
            text: "hi".to_string(),
            at: 1_700_000_000_000,
        };

        // when:
        let line = format_frame(&frame);

        // then:
        assert!(line.contains("alice"));
        assert!(line.contains(": hi"));
    }

    #[test]
    fn test_error_frame_is_marked() {
        // given:
        let frame = Outbound::Error {
            message: "Message cannot be empty.".to_string(),
        };

        // when:
        let line = format_frame(&frame);

        // then:
        assert!(line.contains("! Message cannot be empty."));
    }

    #[test]
    fn test_pong_without_token() {
        // given:
        let frame = Outbound::Pong {
            token: None,
            at: 1_700_000_000_000,
        };

        // when:
        let line = format_frame(&frame);

        // then:
        assert!(line.contains("pong at"));
    }

    #[test]
    fn test_list_users_lists_every_entry() {
        // given:
        let frame = Outbound::ListUsers {
            users: vec![
                irori_shared::protocol::UserInfo {
                    id: "id-1".to_string(),
                    name: "alice".to_string(),
                    ip: "127.0.0.1".to_string(),
                },
                irori_shared::protocol::UserInfo {
                    id: "id-2".to_string(),
                    name: "bob".to_string(),
                    ip: "unknown".to_string(),
                },
            ],
        };

        // when:
        let block = format_frame(&frame);

        // then:
        assert!(block.contains("2 connected"));
        assert!(block.contains("alice"));
        assert!(block.contains("bob"));
    }

    #[test]
    fn test_invalid_timestamp_renders_placeholder() {
        // given:
        let frame = Outbound::System {
            text: "x".to_string(),
            at: i64::MAX,
        };

        // when:
        let line = format_frame(&frame);

        // then:
        assert!(line.contains("--:--:--"));
    }
}
