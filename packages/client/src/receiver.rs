//! The clocked receive step.
//!
//! Each delivered message first advances the local Lamport clock via the
//! merge rule, then is rendered with the post-merge value. The session runs
//! one receive at a time per stream, so renderings follow arrival order.

use chitty_chat_shared::{clock::LamportClock, wire::ChatMessage};

use super::formatter;

/// Merge a delivered message's timestamp into the local clock and render it.
pub fn receive(clock: &LamportClock, message: &ChatMessage) -> String {
    let local = clock.merge(message.lamport);

    if message.is_system_notice() {
        formatter::format_system_notice(&message.text, local)
    } else {
        formatter::format_chat_message(&message.sender_id, &message.text, local)
    }
}
