//! irori terminal chat client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin irori-client
//! cargo run --bin irori-client -- --url ws://example.org:8080/ws
//! ```

use clap::Parser;

use irori_client::run_client;
use irori_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "irori terminal chat client", long_about = None)]
struct Args {
    /// WebSocket URL of the relay server
    #[arg(short, long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Keep the terminal clean: only warnings unless RUST_LOG says otherwise.
    let _guard = setup_logger(env!("CARGO_BIN_NAME"), "warn", None);

    let args = Args::parse();

    if let Err(err) = run_client(&args.url).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
