//! Terminal client for the irori chat relay.

mod command;
mod formatter;
mod session;

pub use command::{Command, parse_line};
pub use formatter::format_frame;
pub use session::{ClientError, run_client};
