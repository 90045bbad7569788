//! Incoming webhook events.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::file::File;
use crate::ids::{ChatType, SyncId};

/// The command carried by an incoming message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCommand {
    /// Raw command body, e.g. `/hello world`.
    pub body: String,
    /// Structured payload attached by the platform.
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Who sent the message, and from where.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSender {
    /// Sender's user HUID. Absent for system events.
    #[serde(default)]
    pub user_huid: Option<Uuid>,
    /// Conversation the message belongs to.
    pub group_chat_id: Uuid,
    /// Conversation kind.
    pub chat_type: ChatType,
    /// Active Directory login.
    #[serde(default)]
    pub ad_login: Option<String>,
    /// Active Directory domain.
    #[serde(default)]
    pub ad_domain: Option<String>,
    /// Display name.
    #[serde(default)]
    pub username: Option<String>,
    /// Chat server the message came through.
    pub host: String,
}

/// A command event delivered by the platform webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Reply target for this message.
    pub sync_id: SyncId,
    /// The command itself.
    pub command: MessageCommand,
    /// Attached file, if any.
    #[serde(default)]
    pub file: Option<File>,
    /// Sender details. Named `from` on the wire.
    #[serde(rename = "from")]
    pub sender: MessageSender,
    /// The bot this event is addressed to.
    pub bot_id: Uuid,
}

impl IncomingMessage {
    /// The raw command body.
    pub fn body(&self) -> &str {
        &self.command.body
    }

    /// The structured command payload.
    pub fn data(&self) -> &Map<String, Value> {
        &self.command.data
    }

    /// The sender's user HUID, when present.
    pub fn user_huid(&self) -> Option<Uuid> {
        self.sender.user_huid
    }

    /// The conversation id.
    pub fn group_chat_id(&self) -> Uuid {
        self.sender.group_chat_id
    }

    /// The conversation kind.
    pub fn chat_type(&self) -> ChatType {
        self.sender.chat_type
    }

    /// The chat server host.
    pub fn host(&self) -> &str {
        &self.sender.host
    }
}
