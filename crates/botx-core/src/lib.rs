//! # BotX Core
//!
//! The command dispatch engine of the BotX SDK.
//!
//! This crate provides the machinery between a decoded webhook request and a
//! running user handler: the command registry, the two execution backends,
//! the next-step dialog table, and the per-host credential cache.
//!
//! ## Architecture
//!
//! - **Handlers**: user callables and their registry records
//!   ([`Callable`], [`CommandHandler`], [`CommandRegistry`])
//! - **Dispatch**: the shared contract and its backends
//!   ([`Dispatcher`], [`BlockingDispatcher`], [`CooperativeDispatcher`])
//! - **Credentials**: chat-server records and the token cache
//!   ([`Cts`], [`CredentialsStore`])
//! - **Bot surface**: what a scheduled handler can call back into
//!   ([`BotApi`], [`BoxedBot`])
//!
//! Every webhook request flows through one dispatcher:
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌───────────┐
//! │   Webhook   │────▶│ Dispatcher │────▶│  Handler  │
//! │   payload   │     │  (parse)   │────▶│  Handler  │
//! └─────────────┘     └────────────┘────▶│  Handler  │
//!                                        └───────────┘
//! ```
//!
//! `parse` answers as soon as a handler is accepted; handler execution and
//! the webhook response are decoupled on purpose.

pub mod api;
pub mod cts;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod next_step;
pub mod registry;

pub use api::{ApiResponse, BotApi, BoxedBot, SendOptions};
pub use cts::{BotCredentials, CredentialsStore, Cts, calculate_signature};
pub use dispatch::{
    BlockingDispatcher, CooperativeDispatcher, Dispatcher, ParseResult, RequestKind,
};
pub use error::{ApiError, ApiResult, DispatchError, DispatchResult};
pub use handler::{Callable, CommandHandler, CommandHandlerBuilder};
pub use next_step::NextStepTable;
pub use registry::CommandRegistry;

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for the dispatcher tests.

    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{Value, json};
    use uuid::Uuid;

    use botx_models::{ChatTarget, File, IncomingMessage, SyncId};

    use crate::api::{ApiResponse, BotApi, BoxedBot, SendOptions};
    use crate::error::ApiResult;
    use crate::handler::Callable;

    /// A bot handle that accepts every call and reports success.
    pub struct NullBot;

    impl NullBot {
        pub fn boxed() -> BoxedBot {
            Arc::new(NullBot)
        }
    }

    fn ok() -> ApiResult<ApiResponse> {
        Ok(ApiResponse {
            body: "{}".to_string(),
            status: 200,
        })
    }

    #[async_trait]
    impl BotApi for NullBot {
        async fn send_message(
            &self,
            _text: &str,
            _target: ChatTarget,
            _bot_id: Uuid,
            _host: &str,
            _options: SendOptions,
        ) -> ApiResult<ApiResponse> {
            ok()
        }

        async fn answer_message(
            &self,
            _text: &str,
            _message: &IncomingMessage,
            _options: SendOptions,
        ) -> ApiResult<ApiResponse> {
            ok()
        }

        async fn send_file(
            &self,
            _file: &File,
            _sync_id: SyncId,
            _bot_id: Uuid,
            _host: &str,
        ) -> ApiResult<ApiResponse> {
            ok()
        }

        fn send_message_blocking(
            &self,
            _text: &str,
            _target: ChatTarget,
            _bot_id: Uuid,
            _host: &str,
            _options: SendOptions,
        ) -> ApiResult<ApiResponse> {
            ok()
        }

        fn answer_message_blocking(
            &self,
            _text: &str,
            _message: &IncomingMessage,
            _options: SendOptions,
        ) -> ApiResult<ApiResponse> {
            ok()
        }

        fn send_file_blocking(
            &self,
            _file: &File,
            _sync_id: SyncId,
            _bot_id: Uuid,
            _host: &str,
        ) -> ApiResult<ApiResponse> {
            ok()
        }

        fn register_next_step(&self, _message: &IncomingMessage, _callable: Callable) {}
    }

    /// A minimal command payload, optionally carrying a sender HUID.
    pub fn incoming(body: &str, with_user: bool) -> Value {
        let mut from = json!({
            "group_chat_id": "8dada2c8-67a6-4434-9dec-570d244e78ee",
            "chat_type": "chat",
            "host": "cts.example.com"
        });
        if with_user {
            from["user_huid"] = json!("ab103983-6001-44e9-889e-d55feb295494");
        }
        json!({
            "sync_id": "a465f0f3-1354-491c-8f11-f400164295cb",
            "command": {"body": body},
            "from": from,
            "bot_id": "dcfa5a7c-7cc4-4c89-b6c0-80325604f9f4"
        })
    }
}
