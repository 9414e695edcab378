//! Client session: the join stream, the clocked receive loop, and the
//! rustyline input loop.

use std::sync::Arc;

use futures_util::StreamExt;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use chitty_chat_shared::{
    clock::LamportClock,
    wire::{ChatMessage, LeaveRequest},
};

use super::{
    api::ChatApi,
    error::ClientError,
    receiver,
    ui::{help_text, redisplay_prompt, validate_message, welcome_text},
};

/// Run one client session until the user leaves or the connection dies.
///
/// The clock is owned by the caller so it survives reconnects: a session that
/// resumes keeps its causal position instead of restarting at zero.
pub async fn run_client_session(
    base_url: &str,
    user_id: &str,
    name: &str,
    clock: Arc<LamportClock>,
) -> Result<(), ClientError> {
    let ws_url = join_stream_url(base_url, user_id, name);

    let (ws_stream, _response) = connect_async(&ws_url)
        .await
        .map_err(|e| ClientError::Connection(e.to_string()))?;

    tracing::info!("Connected to Chitty-Chat server");
    print!("{}", welcome_text(user_id));
    redisplay_prompt(user_id);

    let (_write, mut read) = ws_stream.split();

    let api = Arc::new(ChatApi::new(base_url));

    // Announce the join as a system notice; the server appends the Lamport
    // stamp to the text.
    api.publish(&ChatMessage {
        sender_id: String::new(),
        text: format!("{} joined Chitty-Chat at Lamport time ", user_id),
        lamport: clock.tick(),
    })
    .await?;

    // The clocked receive loop: one blocking receive at a time, merge the
    // delivered timestamp, render in arrival order.
    let clock_for_read = clock.clone();
    let user_id_for_read = user_id.to_string();
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => match serde_json::from_str::<ChatMessage>(&text) {
                    Ok(msg) => {
                        print!("{}", receiver::receive(&clock_for_read, &msg));
                        redisplay_prompt(&user_id_for_read);
                    }
                    Err(e) => {
                        tracing::warn!("Ignoring unparseable frame: {}", e);
                    }
                },
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the stream");
                    connection_error = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!("Stream read error: {}", e);
                    connection_error = true;
                    break;
                }
                _ => {}
            }
        }

        connection_error
    });

    // rustyline needs a real thread; it feeds lines into the async side
    // through a channel.
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    let prompt_user_id = user_id.to_string();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", prompt_user_id);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    // Treat Ctrl+C / Ctrl+D as a leave request.
                    input_tx.send("\\leave".to_string()).ok();
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Input loop: commands and publishes. Every publish is a local causal
    // event, so it ticks the clock before going out.
    let clock_for_write = clock.clone();
    let user_id_for_write = user_id.to_string();
    let api_for_write = api.clone();
    let mut write_task = tokio::spawn(async move {
        let mut write_error = false;

        while let Some(line) = input_rx.recv().await {
            match line.as_str() {
                "\\leave" => {
                    let request = LeaveRequest {
                        user_id: user_id_for_write.clone(),
                        lamport: clock_for_write.tick(),
                    };
                    if let Err(e) = api_for_write.leave(&request).await {
                        tracing::warn!("Leave call failed: {}", e);
                    }
                    println!("\nYou left Chitty-Chat.");
                    break;
                }
                "\\help" => {
                    print!("{}", help_text());
                    redisplay_prompt(&user_id_for_write);
                }
                text => {
                    if let Err(reason) = validate_message(text) {
                        println!("\nMessage not sent: {}", reason);
                        redisplay_prompt(&user_id_for_write);
                        continue;
                    }

                    let message = ChatMessage {
                        sender_id: user_id_for_write.clone(),
                        text: text.to_string(),
                        lamport: clock_for_write.tick(),
                    };
                    if let Err(e) = api_for_write.publish(&message).await {
                        tracing::warn!("Publish failed: {}", e);
                        write_error = true;
                        break;
                    }
                }
            }
        }

        write_error
    });

    // Whichever loop ends first takes the session down with it.
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            if read_result.unwrap_or(true) {
                return Err(ClientError::Connection("stream closed".to_string()));
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            if write_result.unwrap_or(true) {
                return Err(ClientError::Connection("send path failed".to_string()));
            }
        }
    }

    Ok(())
}

fn join_stream_url(base_url: &str, user_id: &str, name: &str) -> String {
    let ws_base = base_url
        .trim_end_matches('/')
        .replacen("http://", "ws://", 1)
        .replacen("https://", "wss://", 1);
    format!("{}/ws?user_id={}&name={}", ws_base, user_id, name)
}
