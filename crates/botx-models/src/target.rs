//! Where an outgoing message is addressed.

use uuid::Uuid;

use crate::ids::SyncId;

/// The destination of an outgoing message.
///
/// The tag decides the endpoint: a [`ChatTarget::Reply`] goes to the command
/// callback, the other two go to the notification callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatTarget {
    /// Direct reply to an incoming message.
    Reply(SyncId),
    /// Notification into a single conversation.
    Group(Uuid),
    /// Notification into several conversations.
    Broadcast(Vec<Uuid>),
}

impl From<SyncId> for ChatTarget {
    fn from(sync_id: SyncId) -> Self {
        Self::Reply(sync_id)
    }
}

impl From<Uuid> for ChatTarget {
    fn from(group_chat_id: Uuid) -> Self {
        Self::Group(group_chat_id)
    }
}

impl From<Vec<Uuid>> for ChatTarget {
    fn from(group_chat_ids: Vec<Uuid>) -> Self {
        Self::Broadcast(group_chat_ids)
    }
}

impl ChatTarget {
    /// Conversation ids for the notification endpoint, or `None` for a reply.
    pub fn group_chat_ids(&self) -> Option<Vec<Uuid>> {
        match self {
            Self::Reply(_) => None,
            Self::Group(id) => Some(vec![*id]),
            Self::Broadcast(ids) => Some(ids.clone()),
        }
    }
}
