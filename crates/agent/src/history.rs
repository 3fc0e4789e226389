//! Sliding-window history pruning.
//!
//! Keeps the system message plus the most recent `max_messages` entries.
//! A `tool` message must stay paired with the assistant message that
//! issued its call, so if the window would open on orphaned tool
//! responses the window start advances past them.

use loopsmith_core::message::{Message, Role};
use tracing::debug;

/// Prune `messages` in place to the system message plus a recent window.
///
/// Returns how many messages were dropped.
pub fn prune(messages: &mut Vec<Message>, max_messages: usize) -> usize {
    if messages.len() <= max_messages {
        return 0;
    }

    let system = match messages.first() {
        Some(m) if m.role == Role::System => Some(m.clone()),
        _ => None,
    };

    let mut window_start = messages.len() - max_messages;
    // Skip tool responses whose assistant message fell outside the window
    while window_start < messages.len() && messages[window_start].role == Role::Tool {
        window_start += 1;
    }

    let original_len = messages.len();
    let mut kept: Vec<Message> = Vec::with_capacity(original_len - window_start + 1);
    if let Some(system) = system {
        kept.push(system);
    }
    kept.extend(messages.drain(window_start..));

    let pruned = original_len - kept.len();
    *messages = kept;
    if pruned > 0 {
        debug!(pruned, kept = messages.len(), "Pruned old messages");
    }
    pruned
}
