//! Identifier types shared across the wire models.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The UUID of an incoming message, tagged as a reply target.
///
/// A `SyncId` authorizes a direct reply: sending to one selects the command
/// callback endpoint, while a plain [`Uuid`] chat id selects the notification
/// endpoint. Keeping it a distinct type makes that switch explicit at the
/// call site instead of a runtime guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncId(pub Uuid);

impl SyncId {
    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for SyncId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for SyncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The kind of conversation a message originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatType {
    /// One-on-one conversation with the bot.
    Chat,
    /// Multi-user group chat.
    GroupChat,
    /// Broadcast channel.
    Channel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sync_id_is_transparent_on_the_wire() {
        let id = SyncId(Uuid::nil());
        let value = serde_json::to_value(id).unwrap();
        assert_eq!(value, json!("00000000-0000-0000-0000-000000000000"));

        let back: SyncId = serde_json::from_value(value).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn chat_type_uses_snake_case() {
        assert_eq!(
            serde_json::to_value(ChatType::GroupChat).unwrap(),
            json!("group_chat")
        );
        let parsed: ChatType = serde_json::from_value(json!("channel")).unwrap();
        assert_eq!(parsed, ChatType::Channel);
    }
}
