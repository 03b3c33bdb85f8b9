//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use irori_shared::protocol::Outbound;

use crate::command::{Command, parse_line};
use crate::formatter::format_frame;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect to {url}: {reason}")]
    Connect { url: String, reason: String },
}

fn print_help() {
    println!("Commands:");
    println!("  /name <username>  Change your username");
    println!("  /status           Show server status");
    println!("  /users            List connected users");
    println!("  /ping [token]     Ping the server");
    println!("  /ai <question>    Ask the AI a question");
    println!("  /help             Show this help");
    println!("  /quit             Exit the client");
}

/// Run the interactive client session until the user quits or the server
/// goes away.
pub async fn run_client(url: &str) -> Result<(), ClientError> {
    let (ws_stream, _response) =
        connect_async(url)
            .await
            .map_err(|err| ClientError::Connect {
                url: url.to_string(),
                reason: err.to_string(),
            })?;

    tracing::info!("connected to {url}");
    println!("Connected to {url}. Type messages, or /help for commands.");

    let (mut write, mut read) = ws_stream.split();

    // Print incoming frames as they arrive.
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => match serde_json::from_str::<Outbound>(text.as_str()) {
                    Ok(frame) => println!("{}", format_frame(&frame)),
                    Err(err) => tracing::warn!(?err, "unrecognized frame: {text}"),
                },
                Ok(Message::Close(_)) => {
                    println!("Server closed the connection.");
                    break;
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(?err, "connection error");
                    break;
                }
            }
        }
    });

    // rustyline blocks, so it gets its own thread; lines flow over a channel.
    let (line_tx, mut line_rx) = mpsc::channel::<String>(32);
    std::thread::spawn(move || {
        let Ok(mut editor) = DefaultEditor::new() else {
            return;
        };
        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    if line_tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("input error: {err}");
                    break;
                }
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut read_task => break,
            line = line_rx.recv() => {
                let Some(line) = line else { break };
                match parse_line(&line) {
                    None => {}
                    Some(Command::Help) => print_help(),
                    Some(Command::Quit) => break,
                    Some(Command::Unknown(cmd)) => {
                        println!("Unknown command: /{cmd}. Type /help for the list.");
                    }
                    Some(Command::Send(frame)) => {
                        let text = serde_json::to_string(&frame)
                            .expect("inbound frames always serialize");
                        if write.send(Message::Text(text.into())).await.is_err() {
                            println!("Connection lost.");
                            break;
                        }
                    }
                }
            }
        }
    }

    read_task.abort();
    Ok(())
}
