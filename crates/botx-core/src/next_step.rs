//! Pending continuations for multi-turn dialogs.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use botx_models::IncomingMessage;

use crate::handler::Callable;

/// Scope of a pending continuation: one user in one conversation on one
/// chat server, addressed to one bot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NextStepKey {
    host: String,
    bot_id: Uuid,
    group_chat_id: Uuid,
    user_huid: Uuid,
}

impl NextStepKey {
    /// Builds the key for a message, or `None` when the sender is anonymous.
    fn for_message(message: &IncomingMessage) -> Option<Self> {
        Some(Self {
            host: message.host().to_string(),
            bot_id: message.bot_id,
            group_chat_id: message.group_chat_id(),
            user_huid: message.user_huid()?,
        })
    }
}

/// Table of pending next-step handlers.
///
/// Written from handlers, read from `parse`; one mutex serializes both
/// sides.
#[derive(Default)]
pub struct NextStepTable {
    pending: Mutex<HashMap<NextStepKey, VecDeque<Callable>>>,
}

impl NextStepTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a continuation for the sender of `message`.
    ///
    /// Group-anonymous continuations are disallowed: a message without a
    /// sender HUID is dropped and `false` is returned.
    pub fn register(&self, message: &IncomingMessage, callable: Callable) -> bool {
        let Some(key) = NextStepKey::for_message(message) else {
            debug!(
                group_chat_id = %message.group_chat_id(),
                "Dropping next-step registration without a sender HUID"
            );
            return false;
        };

        self.pending.lock().entry(key).or_default().push_back(callable);
        true
    }

    /// Takes the oldest continuation pending for the sender of `message`.
    pub fn take(&self, message: &IncomingMessage) -> Option<Callable> {
        let key = NextStepKey::for_message(message)?;
        let mut pending = self.pending.lock();
        let queue = pending.get_mut(&key)?;
        let callable = queue.pop_front();
        if queue.is_empty() {
            pending.remove(&key);
        }
        callable
    }
}
