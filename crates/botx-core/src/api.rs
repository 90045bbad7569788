//! The bot surface visible to handlers.
//!
//! The facade crate implements [`BotApi`]; the dispatchers hand every
//! scheduled handler an `Arc<dyn BotApi>` next to the incoming message. Core
//! defines the trait (rather than the facade) so the dispatch engine never
//! depends on the crate that drives it.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use botx_models::{
    BubbleElement, ChatTarget, File, IncomingMessage, KeyboardElement, Mention, Recipients, SyncId,
};

use crate::error::ApiResult;
use crate::handler::Callable;

/// The platform's answer to an outbound call.
///
/// Non-2xx statuses are carried here unchanged; the SDK never turns them
/// into errors.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Raw response body.
    pub body: String,
    /// HTTP status code.
    pub status: u16,
}

impl ApiResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Optional attachments and decorations for an outgoing message.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// File attached to the message.
    pub file: Option<File>,
    /// Who sees the message. Defaults to everyone.
    pub recipients: Recipients,
    /// Mentions embedded in the text.
    pub mentions: Vec<Mention>,
    /// Bubble rows.
    pub bubble: Vec<Vec<BubbleElement>>,
    /// Keyboard rows.
    pub keyboard: Vec<Vec<KeyboardElement>>,
}

/// Outbound operations handlers can invoke on the bot.
///
/// The async methods are the primary surface; the `_blocking` counterparts
/// exist for handlers running on the worker-pool flavor, which execute on
/// plain OS threads and cannot await. On the cooperative flavor the blocking
/// methods return [`ApiError::BlockingUnavailable`](crate::ApiError).
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Sends `text` to `target`, choosing the endpoint by the target's tag.
    async fn send_message(
        &self,
        text: &str,
        target: ChatTarget,
        bot_id: Uuid,
        host: &str,
        options: SendOptions,
    ) -> ApiResult<ApiResponse>;

    /// Replies to `message`, deriving target, bot id and host from it.
    async fn answer_message(
        &self,
        text: &str,
        message: &IncomingMessage,
        options: SendOptions,
    ) -> ApiResult<ApiResponse>;

    /// Uploads `file` into the conversation identified by `sync_id`.
    async fn send_file(
        &self,
        file: &File,
        sync_id: SyncId,
        bot_id: Uuid,
        host: &str,
    ) -> ApiResult<ApiResponse>;

    /// Blocking form of [`send_message`](BotApi::send_message).
    fn send_message_blocking(
        &self,
        text: &str,
        target: ChatTarget,
        bot_id: Uuid,
        host: &str,
        options: SendOptions,
    ) -> ApiResult<ApiResponse>;

    /// Blocking form of [`answer_message`](BotApi::answer_message).
    fn answer_message_blocking(
        &self,
        text: &str,
        message: &IncomingMessage,
        options: SendOptions,
    ) -> ApiResult<ApiResponse>;

    /// Blocking form of [`send_file`](BotApi::send_file).
    fn send_file_blocking(
        &self,
        file: &File,
        sync_id: SyncId,
        bot_id: Uuid,
        host: &str,
    ) -> ApiResult<ApiResponse>;

    /// Registers a single-shot continuation for the sender of `message`.
    ///
    /// The next command from that user, whatever its body, is routed to
    /// `callable` instead of the registry (unless the body is itself a
    /// registered trigger, which always wins). Messages without a sender
    /// HUID are ignored.
    fn register_next_step(&self, message: &IncomingMessage, callable: Callable);
}

/// A shared, type-erased bot handle.
pub type BoxedBot = Arc<dyn BotApi>;
