//! Terminal helpers: prompt, welcome, help, input validation.

use std::io::Write;

use chitty_chat_shared::wire::MAX_MESSAGE_CHARS;

/// Redisplay the prompt after printing a received message.
pub fn redisplay_prompt(user_id: &str) {
    print!("{}> ", user_id);
    std::io::stdout().flush().ok();
}

pub fn welcome_text(user_id: &str) -> String {
    format!(
        "\nWelcome to Chitty-Chat! You are '{}'.\n\
         Type messages and press Enter to send. Type \\help for commands.\n",
        user_id
    )
}

pub fn help_text() -> String {
    "\nCommands:\n  \\leave  leave the chat and exit\n  \\help   show this help\n".to_string()
}

/// Validate an outbound message line before it reaches the server.
///
/// The core assumes this precondition holds; it lives here at the CLI
/// boundary.
pub fn validate_message(text: &str) -> Result<(), String> {
    if text.is_empty() {
        return Err("message is empty".to_string());
    }
    let chars = text.chars().count();
    if chars > MAX_MESSAGE_CHARS {
        return Err(format!(
            "message is {} characters, the limit is {}",
            chars, MAX_MESSAGE_CHARS
        ));
    }
    Ok(())
}
