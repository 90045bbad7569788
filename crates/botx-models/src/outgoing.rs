//! Outgoing commands, notifications and file uploads.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::file::File;
use crate::ids::SyncId;
use crate::recipients::Recipients;
use crate::ui::{BubbleElement, KeyboardElement, Mention};

/// The renderable body shared by command results and notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Always `"ok"`.
    pub status: String,
    /// Message text.
    pub body: String,
    /// Inline commands attached to the message.
    pub commands: Vec<Value>,
    /// Reply-keyboard rows, in rendering order.
    pub keyboard: Vec<Vec<KeyboardElement>>,
    /// Bubble rows, in rendering order.
    pub bubble: Vec<Vec<BubbleElement>>,
    /// Mentions embedded in the text.
    pub mentions: Vec<Mention>,
}

impl MessagePayload {
    /// Creates a payload around plain text.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            body: body.into(),
            commands: Vec::new(),
            keyboard: Vec::new(),
            bubble: Vec::new(),
            mentions: Vec::new(),
        }
    }
}

/// Direct reply to an incoming message, POSTed to the command callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingCommandResult {
    /// Reply target taken from the incoming message.
    pub sync_id: SyncId,
    /// The rendered reply.
    pub command_result: MessagePayload,
    /// Who sees the reply.
    pub recipients: Recipients,
    /// Optional attachment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<File>,
    /// Sending bot.
    pub bot_id: Uuid,
}

/// Unsolicited message, POSTed to the notification callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingNotification {
    /// Target conversations.
    pub group_chat_ids: Vec<Uuid>,
    /// The rendered message.
    pub notification: MessagePayload,
    /// Who sees the message.
    pub recipients: Recipients,
    /// Optional attachment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<File>,
    /// Sending bot.
    pub bot_id: Uuid,
}

/// File upload, sent as multipart to the file callback.
///
/// Unlike the two JSON bodies above this one never serializes whole: the
/// client splits it into form fields and a raw-bytes `file` part.
#[derive(Debug, Clone)]
pub struct OutgoingFile {
    /// Sending bot.
    pub bot_id: Uuid,
    /// Reply target the file belongs to.
    pub sync_id: SyncId,
    /// The file itself.
    pub file: File,
}
