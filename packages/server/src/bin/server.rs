//! irori chat relay server.
//!
//! Accepts WebSocket connections and broadcasts chat activity to everyone
//! connected.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin irori-server
//! cargo run --bin irori-server -- --host 0.0.0.0 --port 3000
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use irori_server::ai::{AiConfig, OpenRouterClient};
use irori_server::rate_limit::RateLimitConfig;
use irori_server::run_server;
use irori_server::state::AppState;
use irori_shared::logger::setup_logger;
use irori_shared::time::SystemClock;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "irori WebSocket chat relay server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Max chat messages per user per minute (omit for unlimited)
    #[arg(long)]
    max_messages_per_minute: Option<u32>,

    /// Write logs to this file instead of stdout
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // The appender guard must outlive the server loop when logging to a file.
    let _guard = setup_logger(env!("CARGO_BIN_NAME"), "info", args.log_file.as_deref());

    let chat_limit = match args.max_messages_per_minute {
        Some(limit) => {
            tracing::info!(messages_per_minute = limit, "chat rate limiting enabled");
            RateLimitConfig::per_minute(limit)
        }
        None => RateLimitConfig::disabled(),
    };

    let ai_config = AiConfig::from_env();
    let ai_rate_limit = ai_config.rate_limit;
    let ai = match OpenRouterClient::new(ai_config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Failed to create AI client: {}", e);
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState::new(
        chat_limit,
        ai,
        ai_rate_limit,
        Arc::new(SystemClock),
    ));

    if let Err(e) = run_server(state, args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
