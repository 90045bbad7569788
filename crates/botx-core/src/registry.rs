//! Insertion-ordered command registry.

use std::collections::HashMap;

use tracing::debug;

use botx_models::MenuCommand;

use crate::handler::CommandHandler;

/// Maps trigger bodies to handlers, preserving registration order, with at
/// most one default (fallback) handler stored apart.
///
/// A collision keeps the first registration's menu position but takes the
/// later handler, so composing registries behaves like a dictionary update.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: Vec<CommandHandler>,
    index: HashMap<String, usize>,
    default_handler: Option<CommandHandler>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler, replacing any previous one with the same trigger.
    pub fn add(&mut self, handler: CommandHandler) {
        if handler.is_default {
            debug!(trigger = %handler.trigger_body, "Registering default handler");
            self.default_handler = Some(handler);
            return;
        }

        match self.index.get(&handler.trigger_body) {
            Some(&slot) => {
                debug!(trigger = %handler.trigger_body, "Replacing existing handler");
                self.handlers[slot] = handler;
            }
            None => {
                self.index
                    .insert(handler.trigger_body.clone(), self.handlers.len());
                self.handlers.push(handler);
            }
        }
    }

    /// Merges another registry into this one; its entries win on collision.
    pub fn add_all(&mut self, other: CommandRegistry) {
        for handler in other.handlers {
            self.add(handler);
        }
        if let Some(default_handler) = other.default_handler {
            self.default_handler = Some(default_handler);
        }
    }

    /// Looks up a handler by exact trigger body.
    pub fn get(&self, trigger_body: &str) -> Option<&CommandHandler> {
        self.index
            .get(trigger_body)
            .map(|&slot| &self.handlers[slot])
    }

    /// The fallback handler, if one is registered.
    pub fn default_handler(&self) -> Option<&CommandHandler> {
        self.default_handler.as_ref()
    }

    /// Number of trigger entries (the default slot not counted).
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry holds no trigger entries.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Consumes the registry into its trigger entries and default slot.
    pub fn into_parts(self) -> (Vec<CommandHandler>, Option<CommandHandler>) {
        (self.handlers, self.default_handler)
    }

    /// Menu entries for all visible handlers, in registration order.
    pub fn menu(&self) -> Vec<MenuCommand> {
        self.handlers
            .iter()
            .filter(|handler| handler.is_visible())
            .map(CommandHandler::menu_entry)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Callable;

    fn handler(symbol: &str) -> CommandHandler {
        CommandHandler::builder(symbol, Callable::blocking(|_, _| {})).build()
    }

    #[test]
    fn menu_preserves_insertion_order() {
        let mut registry = CommandRegistry::new();
        registry.add(handler("bravo"));
        registry.add(handler("alpha"));
        registry.add(handler("charlie"));

        let bodies: Vec<_> = registry.menu().into_iter().map(|c| c.body).collect();
        assert_eq!(bodies, ["/bravo", "/alpha", "/charlie"]);
    }

    #[test]
    fn menu_excludes_hidden_default_and_system() {
        let mut registry = CommandRegistry::new();
        registry.add(handler("visible"));
        registry.add(
            CommandHandler::builder("hidden", Callable::blocking(|_, _| {}))
                .hidden(true)
                .build(),
        );
        registry.add(
            CommandHandler::builder("fallback", Callable::blocking(|_, _| {}))
                .as_default(true)
                .build(),
        );
        registry.add(CommandHandler::file_transfer(Callable::blocking(|_, _| {})));

        let bodies: Vec<_> = registry.menu().into_iter().map(|c| c.body).collect();
        assert_eq!(bodies, ["/visible"]);
        assert!(registry.default_handler().is_some());
    }

    #[test]
    fn collision_keeps_position_takes_later_value() {
        let mut registry = CommandRegistry::new();
        registry.add(handler("first"));
        registry.add(handler("second"));
        registry.add(
            CommandHandler::builder("first", Callable::blocking(|_, _| {}))
                .description("replaced")
                .build(),
        );

        assert_eq!(registry.len(), 2);
        let menu = registry.menu();
        assert_eq!(menu[0].body, "/first");
        assert_eq!(menu[0].description, "replaced");
        assert_eq!(menu[1].body, "/second");
    }

    #[test]
    fn add_all_merges_entries_and_default() {
        let mut base = CommandRegistry::new();
        base.add(handler("keep"));

        let mut other = CommandRegistry::new();
        other.add(handler("new"));
        other.add(
            CommandHandler::builder("fallback", Callable::blocking(|_, _| {}))
                .as_default(true)
                .build(),
        );

        base.add_all(other);
        assert_eq!(base.len(), 2);
        assert!(base.get("/keep").is_some());
        assert!(base.get("/new").is_some());
        assert!(base.default_handler().is_some());
    }
}
