//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::{error::ClientError, message::ChatMessage};

use super::formatter::MessageFormatter;

/// Typing this on its own line closes the send direction and ends the
/// session once the server's close is observed.
const QUIT_COMMAND: &str = "quit";

/// Run one client session against the chat relay.
pub async fn run_session(url: &str, user: &str) -> Result<(), ClientError> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| ClientError::Connection(e.to_string()))?;

    tracing::info!("Connected to chat server");
    println!(
        "\nYou are '{}'. Type messages and press Enter to send. Type \"{}\" or press Ctrl+C to exit.\n",
        user, QUIT_COMMAND
    );

    let (mut write, mut read) = ws_stream.split();

    // Task printing every broadcast the server relays to us.
    let user_for_read = user.to_string();
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<ChatMessage>(&text) {
                        Ok(msg) => {
                            print!(
                                "{}",
                                MessageFormatter::format_chat_message(&msg.user, &msg.text)
                            );
                        }
                        Err(_) => {
                            print!("{}", MessageFormatter::format_raw_message(&text));
                        }
                    }
                    MessageFormatter::redisplay_prompt(&user_for_read);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    connection_error = true;
                    break;
                }
                _ => {}
            }
        }

        connection_error
    });

    // Blocking thread for rustyline (synchronous readline).
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    let prompt_user = user.to_string();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", prompt_user);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line).ok();
                    if input_tx.send(line.to_string()).is_err() {
                        // Channel closed, exit thread
                        break;
                    }
                    if line == QUIT_COMMAND {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    // Ctrl+C / Ctrl+D behave like `quit`.
                    let _ = input_tx.send(QUIT_COMMAND.to_string());
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Task sending each input line as a chat message.
    let user_for_write = user.to_string();
    let mut write_task = tokio::spawn(async move {
        let mut write_error = false;

        while let Some(line) = input_rx.recv().await {
            if line == QUIT_COMMAND {
                // Close our send direction; the read task then waits for
                // the server to end the stream.
                if let Err(e) = write.send(Message::Close(None)).await {
                    tracing::warn!("Failed to close send direction: {}", e);
                    write_error = true;
                }
                break;
            }

            let msg = ChatMessage::new(user_for_write.clone(), line);
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send message: {}", e);
                write_error = true;
                break;
            }
        }

        write_error
    });

    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            if read_result.unwrap_or(false) {
                return Err(ClientError::Connection("connection lost".to_string()));
            }
        }
        write_result = &mut write_task => {
            // Send direction is closed; wait for the read side to observe
            // the end of the stream.
            let write_error = write_result.unwrap_or(false);
            let read_error = read_task.await.unwrap_or(false);
            if write_error || read_error {
                return Err(ClientError::Connection("connection lost".to_string()));
            }
        }
    }

    Ok(())
}
