//! The `Bot` facade: construction, inbound webhook entry points and the
//! outbound API handed to handlers.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::runtime::{self, Runtime};
use tracing::{debug, warn};
use uuid::Uuid;

use botx_core::api::{ApiResponse, BotApi, BoxedBot, SendOptions};
use botx_core::cts::{CredentialsStore, Cts};
use botx_core::dispatch::{
    BlockingDispatcher, CooperativeDispatcher, Dispatcher, ParseResult, RequestKind,
};
use botx_core::error::{ApiError, ApiResult, DispatchError, DispatchResult};
use botx_core::handler::{Callable, CommandHandler};
use botx_core::registry::CommandRegistry;
use botx_models::{
    BotStatus, ChatTarget, File, IncomingMessage, MessagePayload, OutgoingCommandResult,
    OutgoingFile, OutgoingNotification, SyncId,
};

use crate::client::ApiClient;

/// Execution flavor of a bot, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// Handlers run on a pool of OS threads and may block freely.
    Workers {
        /// Pool size.
        count: usize,
    },
    /// Handlers run as cooperative tasks on one scheduler thread.
    Cooperative,
}

/// Builder for [`Bot`].
pub struct BotBuilder {
    flavor: Flavor,
    hosts: Vec<Cts>,
    credentials_enabled: bool,
    insecure_http: bool,
}

impl BotBuilder {
    fn new() -> Self {
        Self {
            flavor: Flavor::Workers {
                count: num_cpus::get(),
            },
            hosts: Vec::new(),
            credentials_enabled: true,
            insecure_http: false,
        }
    }

    /// Selects the worker-pool flavor with an explicit pool size.
    pub fn workers(mut self, count: usize) -> Self {
        self.flavor = Flavor::Workers { count };
        self
    }

    /// Selects the cooperative flavor.
    pub fn cooperative(mut self) -> Self {
        self.flavor = Flavor::Cooperative;
        self
    }

    /// Registers a chat server the bot is allowed to talk to.
    pub fn add_cts(mut self, host: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.hosts.push(Cts::new(host, secret_key));
        self
    }

    /// Switches outbound calls to the unauthenticated v2 endpoints and skips
    /// token acquisition entirely.
    pub fn disable_credentials(mut self) -> Self {
        self.credentials_enabled = false;
        self
    }

    /// Talks plain HTTP instead of HTTPS. For local development and tests.
    pub fn insecure_http(mut self) -> Self {
        self.insecure_http = true;
        self
    }

    /// Builds the bot. Fails only if the private runtime of the workers
    /// flavor cannot be created.
    pub fn build(self) -> DispatchResult<Bot> {
        let dispatcher: Box<dyn Dispatcher> = match self.flavor {
            Flavor::Workers { count } => Box::new(BlockingDispatcher::with_workers(count)),
            Flavor::Cooperative => Box::new(CooperativeDispatcher::new()),
        };

        // The workers flavor drives the async client from plain threads, so
        // it carries a small private runtime to block_on with. The
        // cooperative flavor runs inside the ambient runtime instead.
        let runtime = match self.flavor {
            Flavor::Workers { .. } => Some(
                runtime::Builder::new_multi_thread()
                    .worker_threads(1)
                    .thread_name("botx-client")
                    .enable_all()
                    .build()?,
            ),
            Flavor::Cooperative => None,
        };

        let client = if self.insecure_http {
            ApiClient::insecure()
        } else {
            ApiClient::new()
        };

        let store = CredentialsStore::new();
        for cts in self.hosts {
            store.register(cts);
        }

        Ok(Bot {
            core: Arc::new(BotCore {
                dispatcher,
                client,
                store,
                credentials_enabled: self.credentials_enabled,
                runtime,
            }),
        })
    }
}

/// The public face of the SDK.
///
/// Wraps the dispatcher, the HTTP client and the credential cache behind one
/// handle. Cloning is cheap and every clone drives the same bot.
#[derive(Clone)]
pub struct Bot {
    core: Arc<BotCore>,
}

impl Bot {
    /// Starts building a bot.
    pub fn builder() -> BotBuilder {
        BotBuilder::new()
    }

    /// Brings the execution backend up. Must precede `execute`.
    pub fn start(&self) -> DispatchResult<()> {
        self.core.dispatcher.start()
    }

    /// Stops the backend. In-flight blocking handlers are drained;
    /// cooperative tasks are cancelled.
    pub async fn shutdown(&self) {
        self.core.dispatcher.shutdown().await;
    }

    /// Blocking form of [`shutdown`](Bot::shutdown), for the workers flavor.
    pub fn shutdown_blocking(&self) -> DispatchResult<()> {
        let runtime = self.blocking_runtime()?;
        runtime.block_on(self.shutdown());
        Ok(())
    }

    /// Registers a chat server after construction.
    pub fn register_cts(&self, host: impl Into<String>, secret_key: impl Into<String>) {
        self.core.store.register(Cts::new(host, secret_key));
    }

    /// Registers a command handler.
    pub fn add_handler(&self, handler: CommandHandler) -> DispatchResult<()> {
        self.core.dispatcher.add_handler(handler)
    }

    /// Registers every handler of `registry`.
    pub fn add_commands(&self, registry: CommandRegistry) -> DispatchResult<()> {
        self.core.dispatcher.add_commands(registry)
    }

    /// The status response for a status webhook request.
    pub fn status(&self) -> BotStatus {
        self.core.dispatcher.status()
    }

    /// A shareable handle to the outbound API, as handlers receive it.
    pub fn api(&self) -> BoxedBot {
        self.core.clone()
    }

    /// Feeds a webhook payload to the dispatcher.
    pub async fn execute(&self, payload: Value, kind: RequestKind) -> DispatchResult<ParseResult> {
        self.core.dispatcher.parse(payload, kind, self.core.clone()).await
    }

    /// Feeds a command payload; `true` iff a handler was scheduled.
    pub async fn execute_command(&self, payload: Value) -> DispatchResult<bool> {
        Ok(self
            .execute(payload, RequestKind::Command)
            .await?
            .was_scheduled())
    }

    /// Blocking form of [`execute_command`](Bot::execute_command), for the
    /// workers flavor.
    pub fn execute_command_blocking(&self, payload: Value) -> DispatchResult<bool> {
        let runtime = self.blocking_runtime()?;
        runtime.block_on(self.execute_command(payload))
    }

    fn blocking_runtime(&self) -> DispatchResult<&Runtime> {
        self.core
            .runtime
            .as_ref()
            .ok_or(DispatchError::BlockingUnavailable)
    }
}

// =============================================================================
// Outbound core
// =============================================================================

#[derive(Deserialize)]
struct TokenResponse {
    result: String,
}

/// What the token step decided for one outbound call.
enum TokenOutcome {
    /// Credentials disabled; no bearer attached.
    Skip,
    /// Token in hand, cached or freshly acquired.
    Bearer(String),
    /// The platform refused the acquisition; its answer short-circuits the
    /// call.
    Denied(ApiResponse),
}

struct BotCore {
    dispatcher: Box<dyn Dispatcher>,
    client: ApiClient,
    store: CredentialsStore,
    credentials_enabled: bool,
    runtime: Option<Runtime>,
}

impl BotCore {
    /// Runs the token step: at most one acquisition per outbound call.
    async fn obtain_token(&self, host: &str, bot_id: Uuid) -> ApiResult<TokenOutcome> {
        if !self.credentials_enabled {
            if !self.store.knows(host) {
                return Err(ApiError::UnknownHost(host.to_string()));
            }
            return Ok(TokenOutcome::Skip);
        }

        if let Some(token) = self.store.token_for(host)? {
            return Ok(TokenOutcome::Bearer(token));
        }

        let signature = self.store.signature_for(host, bot_id)?;
        debug!(host = %host, "Requesting bearer token");
        let response = self.client.request_token(host, bot_id, &signature).await?;
        if !response.is_success() {
            warn!(host = %host, status = response.status, "Token acquisition denied");
            return Ok(TokenOutcome::Denied(response));
        }

        let token: TokenResponse = serde_json::from_str(&response.body)?;
        self.store.set_token(host, bot_id, token.result.clone())?;
        Ok(TokenOutcome::Bearer(token.result))
    }

    /// A 401 means the cached token went stale; drop it so the next call
    /// re-authenticates.
    fn note_unauthorized(&self, host: &str, response: &ApiResponse) {
        if response.status == 401 {
            self.store.invalidate(host);
        }
    }

    fn block_on<F: Future>(&self, fut: F) -> ApiResult<F::Output> {
        match &self.runtime {
            Some(runtime) => Ok(runtime.block_on(fut)),
            None => Err(ApiError::BlockingUnavailable),
        }
    }
}

#[async_trait]
impl BotApi for BotCore {
    async fn send_message(
        &self,
        text: &str,
        target: ChatTarget,
        bot_id: Uuid,
        host: &str,
        options: SendOptions,
    ) -> ApiResult<ApiResponse> {
        let token = match self.obtain_token(host, bot_id).await? {
            TokenOutcome::Denied(response) => return Ok(response),
            TokenOutcome::Bearer(token) => Some(token),
            TokenOutcome::Skip => None,
        };

        let mut payload = MessagePayload::text(text);
        payload.mentions = options.mentions;
        payload.bubble = options.bubble;
        payload.keyboard = options.keyboard;

        let response = match &target {
            ChatTarget::Reply(sync_id) => {
                let result = OutgoingCommandResult {
                    sync_id: *sync_id,
                    command_result: payload,
                    recipients: options.recipients,
                    file: options.file,
                    bot_id,
                };
                self.client
                    .send_command_result(host, &result, token.as_deref())
                    .await?
            }
            _ => {
                let group_chat_ids = target.group_chat_ids().unwrap_or_default();
                let notification = OutgoingNotification {
                    group_chat_ids,
                    notification: payload,
                    recipients: options.recipients,
                    file: options.file,
                    bot_id,
                };
                self.client
                    .send_notification(host, &notification, token.as_deref())
                    .await?
            }
        };

        self.note_unauthorized(host, &response);
        Ok(response)
    }

    async fn answer_message(
        &self,
        text: &str,
        message: &IncomingMessage,
        options: SendOptions,
    ) -> ApiResult<ApiResponse> {
        self.send_message(
            text,
            ChatTarget::Reply(message.sync_id),
            message.bot_id,
            message.host(),
            options,
        )
        .await
    }

    async fn send_file(
        &self,
        file: &File,
        sync_id: SyncId,
        bot_id: Uuid,
        host: &str,
    ) -> ApiResult<ApiResponse> {
        let token = match self.obtain_token(host, bot_id).await? {
            TokenOutcome::Denied(response) => return Ok(response),
            TokenOutcome::Bearer(token) => Some(token),
            TokenOutcome::Skip => None,
        };

        let upload = OutgoingFile {
            bot_id,
            sync_id,
            file: file.clone(),
        };
        let response = self
            .client
            .send_file(host, &upload, token.as_deref())
            .await?;

        self.note_unauthorized(host, &response);
        Ok(response)
    }

    fn send_message_blocking(
        &self,
        text: &str,
        target: ChatTarget,
        bot_id: Uuid,
        host: &str,
        options: SendOptions,
    ) -> ApiResult<ApiResponse> {
        self.block_on(self.send_message(text, target, bot_id, host, options))?
    }

    fn answer_message_blocking(
        &self,
        text: &str,
        message: &IncomingMessage,
        options: SendOptions,
    ) -> ApiResult<ApiResponse> {
        self.block_on(self.answer_message(text, message, options))?
    }

    fn send_file_blocking(
        &self,
        file: &File,
        sync_id: SyncId,
        bot_id: Uuid,
        host: &str,
    ) -> ApiResult<ApiResponse> {
        self.block_on(self.send_file(file, sync_id, bot_id, host))?
    }

    fn register_next_step(&self, message: &IncomingMessage, callable: Callable) {
        if let Err(err) = self.dispatcher.register_next_step(message, callable) {
            warn!(error = %err, "Dropped next-step registration");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooperative_flavor_has_no_blocking_entry_points() {
        let bot = Bot::builder().cooperative().build().unwrap();
        assert!(matches!(
            bot.execute_command_blocking(Value::Null),
            Err(DispatchError::BlockingUnavailable)
        ));
        assert!(matches!(
            bot.shutdown_blocking(),
            Err(DispatchError::BlockingUnavailable)
        ));
    }

    #[test]
    fn workers_flavor_carries_a_private_runtime() {
        let bot = Bot::builder().workers(2).build().unwrap();
        bot.start().unwrap();
        // Unknown payloads decode-fail before touching the pool.
        assert!(matches!(
            bot.execute_command_blocking(Value::Null),
            Err(DispatchError::MalformedPayload(_))
        ));
        bot.shutdown_blocking().unwrap();
    }
}
