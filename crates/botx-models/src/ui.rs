//! UI primitives rendered with outgoing messages.
//!
//! Bubbles and keyboard buttons are arranged as rows; the order of rows and
//! of elements within a row is the transmission order and the platform
//! renders them exactly as sent.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A quick-action button rendered inline with the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BubbleElement {
    /// Command body sent back when the button is pressed.
    pub command: String,
    /// Visible caption. Defaults to the command itself.
    pub label: String,
}

impl BubbleElement {
    /// Creates a bubble with an explicit label.
    pub fn new(command: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            label: label.into(),
        }
    }

    /// Creates a bubble whose label is the command itself.
    pub fn from_command(command: impl Into<String>) -> Self {
        let command = command.into();
        Self {
            label: command.clone(),
            command,
        }
    }
}

/// A reply-keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardElement {
    /// Command body sent back when the button is pressed.
    pub command: String,
    /// Visible caption. Defaults to the command itself.
    pub label: String,
}

impl KeyboardElement {
    /// Creates a keyboard button with an explicit label.
    pub fn new(command: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            label: label.into(),
        }
    }

    /// Creates a keyboard button whose label is the command itself.
    pub fn from_command(command: impl Into<String>) -> Self {
        let command = command.into();
        Self {
            label: command.clone(),
            command,
        }
    }
}

/// A user mention embedded in a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    /// Mention kind. Only users can be mentioned.
    pub mention_type: MentionType,
    /// Who is mentioned.
    pub mention_data: MentionData,
}

impl Mention {
    /// Creates a user mention.
    pub fn user(user_huid: Uuid, name: impl Into<String>) -> Self {
        Self {
            mention_type: MentionType::User,
            mention_data: MentionData {
                user_huid,
                name: name.into(),
            },
        }
    }
}

/// Mention kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionType {
    /// Mention of a user.
    User,
}

/// Target of a mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionData {
    /// Mentioned user's HUID.
    pub user_huid: Uuid,
    /// Mentioned user's display name.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bubble_label_defaults_to_command() {
        let bubble = BubbleElement::from_command("/buy");
        assert_eq!(bubble.label, "/buy");
        assert_eq!(
            serde_json::to_value(&bubble).unwrap(),
            json!({"command": "/buy", "label": "/buy"})
        );
    }

    #[test]
    fn mention_serializes_with_user_type() {
        let mention = Mention::user(Uuid::nil(), "User");
        assert_eq!(
            serde_json::to_value(&mention).unwrap(),
            json!({
                "mention_type": "user",
                "mention_data": {
                    "user_huid": "00000000-0000-0000-0000-000000000000",
                    "name": "User"
                }
            })
        );
    }
}
