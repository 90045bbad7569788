//! # BotX
//!
//! A client SDK for the BotX corporate chat platform.
//!
//! ## Overview
//!
//! BotX-powered chat servers deliver webhook events (status probes and user
//! commands) to a bot and accept replies, notifications and file uploads over
//! authenticated callback endpoints. This crate is the application-facing
//! surface of the SDK: construct a [`Bot`], register command handlers, feed
//! it webhook payloads and let handlers answer through the API handle they
//! receive.
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌───────────┐
//! │   Webhook   │────▶│    Bot     │────▶│  Handler  │──┐
//! │   payload   │     │ (dispatch) │     └───────────┘  │ outbound
//! └─────────────┘     └────────────┘     ┌───────────┐  │ callbacks
//!                                        │  ApiClient│◀─┘
//!                                        └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use botx::prelude::*;
//!
//! let bot = Bot::builder()
//!     .workers(4)
//!     .add_cts("cts.example.com", "secret-key")
//!     .build()?;
//!
//! bot.add_handler(
//!     CommandHandler::builder(
//!         "hello",
//!         Callable::blocking(|message, bot| {
//!             let _ = bot.answer_message_blocking("Hi!", &message, SendOptions::default());
//!         }),
//!     )
//!     .description("says hi")
//!     .build(),
//! )?;
//!
//! bot.start()?;
//! let handled = bot.execute_command_blocking(payload)?;
//! ```
//!
//! The cooperative flavor swaps the worker pool for a single-threaded task
//! scheduler; handlers become async functions using the non-`_blocking` API.

pub mod bot;
pub mod client;
pub mod logging;

pub use bot::{Bot, BotBuilder, Flavor};
pub use client::ApiClient;

pub use botx_core as core;
pub use botx_models as models;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use botx::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bot::{Bot, BotBuilder, Flavor};

    pub use botx_core::api::{ApiResponse, BotApi, BoxedBot, SendOptions};
    pub use botx_core::dispatch::{ParseResult, RequestKind};
    pub use botx_core::error::{ApiError, ApiResult, DispatchError, DispatchResult};
    pub use botx_core::handler::{Callable, CommandHandler};
    pub use botx_core::registry::CommandRegistry;

    pub use botx_models::{
        BotStatus, BubbleElement, ChatTarget, ChatType, File, IncomingMessage, KeyboardElement,
        Mention, Recipients, SyncId,
    };
}
