//! Unified error types for the dispatch engine.
//!
//! Remote non-2xx responses are deliberately *not* represented here: the
//! platform's answer travels back to the caller as data
//! ([`ApiResponse`](crate::api::ApiResponse)). These enums cover
//! configuration and request faults only.

use thiserror::Error;

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Errors raised while registering handlers or parsing webhook requests.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The webhook carried a request kind this SDK does not know.
    #[error("unknown request kind '{0}'")]
    UnknownRequestKind(String),

    /// The command payload did not deserialize into an incoming message.
    #[error("malformed command payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// `parse` was called before `start`.
    #[error("dispatcher has not been started")]
    NotStarted,

    /// The dispatcher was shut down and refuses new submissions.
    #[error("dispatcher is shut down")]
    ShutDown,

    /// A handler of the wrong flavor was offered to a dispatcher.
    #[error("{dispatcher} dispatcher cannot run {offered} handler '{trigger}'")]
    HandlerKindMismatch {
        /// The dispatcher that rejected the handler.
        dispatcher: &'static str,
        /// The flavor of the rejected callable.
        offered: &'static str,
        /// The handler's trigger body.
        trigger: String,
    },

    /// A worker or scheduler thread could not be spawned.
    #[error("failed to spawn dispatcher thread: {0}")]
    Spawn(String),

    /// A blocking entry point was called on the cooperative flavor.
    #[error("blocking call is not available on the cooperative flavor")]
    BlockingUnavailable,
}

impl From<std::io::Error> for DispatchError {
    fn from(err: std::io::Error) -> Self {
        Self::Spawn(err.to_string())
    }
}

// =============================================================================
// API Errors
// =============================================================================

/// Errors raised on the outbound path, before or instead of a platform reply.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The host was never registered with the credentials store.
    #[error("host '{0}' is not registered")]
    UnknownHost(String),

    /// The HTTP request itself failed (connection, TLS, timeout).
    #[error("http request failed: {0}")]
    Http(String),

    /// The platform answered 200 with a body this SDK cannot read.
    #[error("malformed platform response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    /// The attachment could not be decoded for upload.
    #[error(transparent)]
    File(#[from] botx_models::FileError),

    /// A blocking API was called on the cooperative bot flavor.
    #[error("blocking api is not available on the cooperative bot")]
    BlockingUnavailable,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Result type for outbound API operations.
pub type ApiResult<T> = Result<T, ApiError>;
