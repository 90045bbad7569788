//! The dispatcher contract and its two execution backends.
//!
//! A dispatcher binds the command registry to an execution backend. Both
//! backends share the same resolution rules and status synthesis; they differ
//! only in how an accepted handler runs:
//!
//! | Backend | Handlers | Execution |
//! |---------|----------|-----------|
//! | [`BlockingDispatcher`] | [`Callable::Blocking`] | fixed pool of OS threads |
//! | [`CooperativeDispatcher`] | [`Callable::Cooperative`] | single-threaded cooperative scheduler |
//!
//! `parse` returns as soon as a handler is *accepted* for execution, never
//! awaiting its completion; callers use the verdict to acknowledge the
//! webhook immediately.

mod blocking;
mod cooperative;

use std::str::FromStr;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use botx_models::{BotStatus, IncomingMessage};

use crate::api::BoxedBot;
use crate::error::{DispatchError, DispatchResult};
use crate::handler::{Callable, CommandHandler};
use crate::next_step::NextStepTable;
use crate::registry::CommandRegistry;

pub use blocking::BlockingDispatcher;
pub use cooperative::CooperativeDispatcher;

/// The kind of webhook request being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Status request: answer with the command menu.
    Status,
    /// Command request: route to a handler.
    Command,
}

impl FromStr for RequestKind {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(Self::Status),
            "command" => Ok(Self::Command),
            other => Err(DispatchError::UnknownRequestKind(other.to_string())),
        }
    }
}

/// Outcome of [`Dispatcher::parse`].
#[derive(Debug)]
pub enum ParseResult {
    /// The synthesized status response.
    Status(BotStatus),
    /// Whether a handler was accepted for execution.
    Command(bool),
}

impl ParseResult {
    /// `true` iff a command handler was accepted.
    pub fn was_scheduled(&self) -> bool {
        matches!(self, Self::Command(true))
    }
}

/// A command dispatcher bound to one execution backend.
///
/// Backends are interchangeable behind this trait; the flavor is picked at
/// construction, never auto-detected at dispatch time.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Brings the execution backend up. Must precede `parse`.
    fn start(&self) -> DispatchResult<()>;

    /// Stops the backend. The blocking flavor drains in-flight handlers;
    /// the cooperative flavor cancels outstanding tasks. Idempotent.
    async fn shutdown(&self);

    /// Registers a handler, rejecting callables of the wrong flavor before
    /// any registry write.
    fn add_handler(&self, handler: CommandHandler) -> DispatchResult<()>;

    /// Registers every handler of `registry`, including its default slot.
    fn add_commands(&self, registry: CommandRegistry) -> DispatchResult<()> {
        let (handlers, default_handler) = registry.into_parts();
        for handler in handlers {
            self.add_handler(handler)?;
        }
        if let Some(handler) = default_handler {
            self.add_handler(handler)?;
        }
        Ok(())
    }

    /// Queues a continuation for the sender of `message`.
    ///
    /// Continuations of the wrong flavor are rejected; messages without a
    /// sender HUID are silently dropped.
    fn register_next_step(
        &self,
        message: &IncomingMessage,
        callable: Callable,
    ) -> DispatchResult<()>;

    /// Synthesizes the status response from the registry.
    fn status(&self) -> BotStatus;

    /// Parses a webhook payload.
    ///
    /// For [`RequestKind::Status`] the payload is ignored and the menu is
    /// returned. For [`RequestKind::Command`] the payload is decoded into an
    /// [`IncomingMessage`], resolved against the registry, and the matched
    /// handler, if any, is scheduled on the backend with `bot` as its
    /// second argument.
    async fn parse(
        &self,
        payload: Value,
        kind: RequestKind,
        bot: BoxedBot,
    ) -> DispatchResult<ParseResult>;
}

// =============================================================================
// Shared dispatcher state
// =============================================================================

/// Registry + next-step table shared by both backends.
pub(crate) struct DispatcherState {
    registry: RwLock<CommandRegistry>,
    next_steps: NextStepTable,
}

impl DispatcherState {
    pub(crate) fn new() -> Self {
        Self {
            registry: RwLock::new(CommandRegistry::new()),
            next_steps: NextStepTable::new(),
        }
    }

    pub(crate) fn add_handler(&self, handler: CommandHandler) {
        self.registry.write().add(handler);
    }

    pub(crate) fn register_next_step(&self, message: &IncomingMessage, callable: Callable) {
        self.next_steps.register(message, callable);
    }

    pub(crate) fn status(&self) -> BotStatus {
        BotStatus::working(self.registry.read().menu())
    }

    /// Resolves a message to a callable.
    ///
    /// Precedence: exact trigger match on the leading token of the body,
    /// then a pending next-step continuation (consumed), then the default
    /// handler. A registered command always wins over a continuation so
    /// users can escape a dialog by issuing another command.
    pub(crate) fn resolve(&self, message: &IncomingMessage) -> Option<(Callable, &'static str)> {
        let token = leading_token(message.body());

        {
            let registry = self.registry.read();
            if let Some(handler) = registry.get(token) {
                return Some((handler.callable.clone(), "registry"));
            }
        }

        if let Some(callable) = self.next_steps.take(message) {
            return Some((callable, "next_step"));
        }

        let registry = self.registry.read();
        if let Some(handler) = registry.default_handler() {
            return Some((handler.callable.clone(), "default"));
        }

        debug!(body = %message.body(), "No handler found for command");
        None
    }
}

/// The dispatch key: everything before the first space.
fn leading_token(body: &str) -> &str {
    match body.split_once(' ') {
        Some((head, _)) => head,
        None => body,
    }
}

/// Decodes a command payload into an incoming message.
pub(crate) fn decode_message(payload: Value) -> DispatchResult<IncomingMessage> {
    Ok(serde_json::from_value(payload)?)
}
