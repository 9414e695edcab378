//! Message rendering for the terminal.

/// Format a user message as `[sender : local clock] text`.
pub fn format_chat_message(sender_id: &str, text: &str, local_clock: u64) -> String {
    format!("\n[{} : {}] {}\n", sender_id, local_clock, text)
}

/// Format a system notice. No sender prefix; never attributed to a user.
pub fn format_system_notice(text: &str, local_clock: u64) -> String {
    format!("\n* {} (local clock {})\n", text, local_clock)
}
