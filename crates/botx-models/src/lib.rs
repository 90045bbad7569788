//! # BotX Models
//!
//! Typed wire representations for the BotX chat platform: incoming webhook
//! events, outgoing command results / notifications / file uploads, and the
//! UI primitives embedded in both.
//!
//! The models mirror the platform's JSON shapes exactly; everything else in
//! the SDK builds on top of them. Nothing in this crate talks to the network.

pub mod file;
pub mod ids;
pub mod message;
pub mod outgoing;
pub mod recipients;
pub mod status;
pub mod target;
pub mod ui;

pub use file::{File, FileError};
pub use ids::{ChatType, SyncId};
pub use message::{IncomingMessage, MessageCommand, MessageSender};
pub use outgoing::{MessagePayload, OutgoingCommandResult, OutgoingFile, OutgoingNotification};
pub use recipients::Recipients;
pub use status::{BotStatus, MenuCommand, StatusResult};
pub use target::ChatTarget;
pub use ui::{BubbleElement, KeyboardElement, Mention, MentionData, MentionType};
