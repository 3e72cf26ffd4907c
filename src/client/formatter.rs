//! Terminal output for the client: message rendering and the input prompt.

use std::io::Write;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a received chat message as `user: text`.
    pub fn format_chat_message(user: &str, text: &str) -> String {
        format!("\n{}: {}\n", user, text)
    }

    /// Format a frame that could not be parsed as a chat message.
    pub fn format_raw_message(text: &str) -> String {
        format!("\n{}\n", text)
    }

    /// Print the input prompt again after output has pushed it off the
    /// current line.
    pub fn redisplay_prompt(user: &str) {
        print!("{}> ", user);
        std::io::stdout().flush().ok();
    }
}
