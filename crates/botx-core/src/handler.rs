//! Command handlers: the callable, its registry record, and the metadata
//! builder.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{Map, Value};

use botx_models::{IncomingMessage, MenuCommand};

use crate::api::BoxedBot;

/// A blocking handler function.
pub type BlockingFn = Arc<dyn Fn(IncomingMessage, BoxedBot) + Send + Sync>;

/// A suspendable handler function.
pub type CooperativeFn =
    Arc<dyn Fn(IncomingMessage, BoxedBot) -> BoxFuture<'static, ()> + Send + Sync>;

/// A user handler in one of the two execution flavors.
///
/// Every handler receives the incoming message and a bot handle; the type
/// system enforces that arity, so the only registration check left to runtime
/// is the flavor: the worker-pool dispatcher runs [`Callable::Blocking`]
/// only, the cooperative dispatcher runs [`Callable::Cooperative`] only.
#[derive(Clone)]
pub enum Callable {
    /// Runs to completion on a worker thread; may block freely.
    Blocking(BlockingFn),
    /// Runs as a cooperative task; suspends at awaits.
    Cooperative(CooperativeFn),
}

impl Callable {
    /// Wraps a plain function as a blocking callable.
    pub fn blocking<F>(f: F) -> Self
    where
        F: Fn(IncomingMessage, BoxedBot) + Send + Sync + 'static,
    {
        Self::Blocking(Arc::new(f))
    }

    /// Wraps an async function as a cooperative callable.
    pub fn cooperative<F, Fut>(f: F) -> Self
    where
        F: Fn(IncomingMessage, BoxedBot) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::Cooperative(Arc::new(move |message, bot| Box::pin(f(message, bot))))
    }

    /// The flavor name, for logs and errors.
    pub fn flavor(&self) -> &'static str {
        match self {
            Self::Blocking(_) => "blocking",
            Self::Cooperative(_) => "cooperative",
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callable").field(&self.flavor()).finish()
    }
}

/// One entry of the command registry.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    /// Body that triggers this handler, e.g. `/hello`.
    pub trigger_body: String,
    /// The handler itself.
    pub callable: Callable,
    /// Caption shown in the menu.
    pub menu_name: String,
    /// Description shown in the menu.
    pub description: String,
    /// Hidden from the menu even when otherwise visible.
    pub exclude_from_menu: bool,
    /// Fallback handler; stored apart from the trigger map.
    pub is_default: bool,
    /// System handler; excluded from the menu, trigger kept verbatim.
    pub system: bool,
    /// Free-form UI options forwarded to the menu.
    pub ui_options: Map<String, Value>,
    /// Free-form UI elements forwarded to the menu, in rendering order.
    pub ui_elements: Vec<Value>,
}

impl CommandHandler {
    /// Starts building a handler registered under `symbol`.
    ///
    /// The symbol plays the role the function name plays in the platform's
    /// reference SDKs: missing metadata is synthesized from it.
    pub fn builder(symbol: impl Into<String>, callable: Callable) -> CommandHandlerBuilder {
        CommandHandlerBuilder {
            symbol: symbol.into(),
            callable,
            name: None,
            body: None,
            description: None,
            as_default: false,
            hidden: false,
            system: false,
            options: Map::new(),
            elements: Vec::new(),
        }
    }

    /// Shortcut: receiver for incoming file transfers.
    ///
    /// Registered hidden and system under the platform's `file_transfer`
    /// trigger.
    pub fn file_transfer(callable: Callable) -> Self {
        Self::builder("file_transfer", callable)
            .system(true)
            .hidden(true)
            .build()
    }

    /// Shortcut: receiver for chat-created system events.
    pub fn chat_created(callable: Callable) -> Self {
        Self::builder("chat_created", callable)
            .body("system:chat_created")
            .system(true)
            .build()
    }

    /// Whether this handler appears in the status menu.
    pub fn is_visible(&self) -> bool {
        !self.exclude_from_menu && !self.is_default && !self.system
    }

    /// Renders this handler as a menu entry.
    pub fn menu_entry(&self) -> MenuCommand {
        MenuCommand {
            body: self.trigger_body.clone(),
            name: self.menu_name.clone(),
            description: self.description.clone(),
            options: self.ui_options.clone(),
            elements: self.ui_elements.clone(),
        }
    }
}

/// Builder synthesizing handler metadata from the registered symbol.
pub struct CommandHandlerBuilder {
    symbol: String,
    callable: Callable,
    name: Option<String>,
    body: Option<String>,
    description: Option<String>,
    as_default: bool,
    hidden: bool,
    system: bool,
    options: Map<String, Value>,
    elements: Vec<Value>,
}

impl CommandHandlerBuilder {
    /// Sets the menu caption.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the trigger body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the menu description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks this handler as the registry's fallback.
    pub fn as_default(mut self, as_default: bool) -> Self {
        self.as_default = as_default;
        self
    }

    /// Hides this handler from the menu.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Marks this handler as a system handler.
    pub fn system(mut self, system: bool) -> Self {
        self.system = system;
        self
    }

    /// Attaches free-form UI options.
    pub fn options(mut self, options: Map<String, Value>) -> Self {
        self.options = options;
        self
    }

    /// Attaches free-form UI elements.
    pub fn elements(mut self, elements: Vec<Value>) -> Self {
        self.elements = elements;
        self
    }

    /// Finalizes the handler, filling missing metadata from the symbol.
    ///
    /// - trigger: explicit body, else the symbol lower-cased with a trailing
    ///   `command` fragment stripped; `/`-prefixed unless system;
    /// - menu name: explicit name, else the symbol lower-cased;
    /// - description: explicit text, else `"<name> command"`.
    pub fn build(self) -> CommandHandler {
        let menu_name = self
            .name
            .unwrap_or_else(|| self.symbol.to_lowercase());

        let mut trigger_body = self
            .body
            .unwrap_or_else(|| strip_command_fragment(&self.symbol.to_lowercase()));
        if !self.system && !trigger_body.starts_with('/') {
            trigger_body.insert(0, '/');
        }

        let description = self
            .description
            .unwrap_or_else(|| format!("{menu_name} command"));

        CommandHandler {
            trigger_body,
            callable: self.callable,
            menu_name,
            description,
            exclude_from_menu: self.hidden,
            is_default: self.as_default,
            system: self.system,
            ui_options: self.options,
            ui_elements: self.elements,
        }
    }
}

/// Drops a trailing `command` word fragment and its separator.
///
/// `hello_command` → `hello`, `hellocommand` → `hello`. A symbol that is
/// nothing but the fragment is kept whole.
fn strip_command_fragment(symbol: &str) -> String {
    match symbol.strip_suffix("command") {
        Some(head) => {
            let head = head.trim_end_matches('_');
            if head.is_empty() {
                symbol.to_string()
            } else {
                head.to_string()
            }
        }
        None => symbol.to_string(),
    }
}
