//! The bot's self-description returned on a status request.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response to a status webhook request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotStatus {
    /// Always `"ok"`.
    pub status: String,
    /// Status body.
    pub result: StatusResult,
}

impl BotStatus {
    /// Builds the standard "bot is working" status around a command menu.
    pub fn working(commands: Vec<MenuCommand>) -> Self {
        Self {
            status: "ok".to_string(),
            result: StatusResult {
                enabled: true,
                status_message: "Bot is working".to_string(),
                commands,
            },
        }
    }
}

/// Body of the status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResult {
    /// Whether the bot accepts commands.
    pub enabled: bool,
    /// Human-readable state.
    pub status_message: String,
    /// Visible commands, in registration order.
    pub commands: Vec<MenuCommand>,
}

/// One entry of the command menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuCommand {
    /// Trigger body, e.g. `/hello`.
    pub body: String,
    /// Menu caption.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Free-form UI options.
    pub options: Map<String, Value>,
    /// Free-form UI elements, in rendering order.
    pub elements: Vec<Value>,
}
