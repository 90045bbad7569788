//! Logging setup built on `tracing` and `tracing-subscriber`.
//!
//! The SDK itself only emits `tracing` events; installing a subscriber is the
//! application's call. [`LoggingBuilder`] covers the common case:
//!
//! ```rust,ignore
//! use botx::logging::LoggingBuilder;
//!
//! LoggingBuilder::new()
//!     .with_level(tracing::Level::DEBUG)
//!     .directive("botx_core=trace")
//!     .init();
//! ```
//!
//! The `RUST_LOG` environment variable is honored on top of the configured
//! level, so deployments can adjust verbosity without a rebuild.

use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt};

/// A builder for configuring the global subscriber.
pub struct LoggingBuilder {
    directives: Vec<String>,
    level: tracing::Level,
    with_target: bool,
    with_thread_ids: bool,
}

impl LoggingBuilder {
    /// Creates a builder with `INFO` level, targets shown, thread ids hidden.
    pub fn new() -> Self {
        Self {
            directives: Vec::new(),
            level: tracing::Level::INFO,
            with_target: true,
            with_thread_ids: false,
        }
    }

    /// Sets the default log level.
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self
    }

    /// Adds a filter directive, e.g. `"botx_core=debug"`.
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    /// Whether to show the event target (module path).
    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }

    /// Whether to show thread ids; handy when debugging the worker pool.
    pub fn with_thread_ids(mut self, with_thread_ids: bool) -> Self {
        self.with_thread_ids = with_thread_ids;
        self
    }

    /// Installs the subscriber, failing if one is already set.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let mut filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.level).into())
            .from_env_lossy();
        let mut invalid = Vec::new();
        for directive in &self.directives {
            match directive.parse::<Directive>() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(_) => invalid.push(directive.clone()),
            }
        }

        let layer = fmt::layer()
            .compact()
            .with_target(self.with_target)
            .with_thread_ids(self.with_thread_ids);

        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()?;

        for directive in invalid {
            tracing::warn!(directive = %directive, "Ignoring invalid log directive");
        }
        Ok(())
    }

    /// Installs the subscriber, ignoring an already-installed one.
    pub fn init(self) {
        let _ = self.try_init();
    }
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}
