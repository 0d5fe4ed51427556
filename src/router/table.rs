//! Router table
//!
//! HashMap of lowercase command names to shared handlers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{Handler, HandlerFn, NotFoundHandler};
use crate::protocol::Reply;

/// Command routing table
#[derive(Default)]
pub struct Router {
    /// Handlers keyed by lowercase command name
    handlers: RwLock<HashMap<String, Arc<dyn Handler>>>,
}

impl Router {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `name`, replacing any previous one
    pub fn register(&self, name: &str, handler: impl Handler + 'static) {
        self.register_arc(name, Arc::new(handler));
    }

    /// Register an already shared handler under `name`
    pub fn register_arc(&self, name: &str, handler: Arc<dyn Handler>) {
        let key = name.to_lowercase();
        if self.handlers.write().insert(key, handler).is_some() {
            tracing::debug!("Replaced handler for command '{}'", name);
        }
    }

    /// Register a closure under `name`
    pub fn register_fn<F>(&self, name: &str, func: F)
    where
        F: Fn(&str, &mut Reply) + Send + Sync + 'static,
    {
        self.register(name, HandlerFn::new(func));
    }

    /// Look up the handler for a command name (case-insensitive)
    pub fn handler(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.read().get(&name.to_lowercase()).cloned()
    }

    /// Whether a handler is registered for `name`
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.read().contains_key(&name.to_lowercase())
    }

    /// Number of registered commands
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Registered command names, sorted
    pub fn commands(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Route `line` to the handler named by its first token
    ///
    /// The handler receives `line` unchanged, command token included.
    /// Unknown commands go to [`NotFoundHandler`].
    pub fn dispatch(&self, line: &str, reply: &mut Reply) {
        let name = line.split(' ').next().unwrap_or_default();

        // Clone out of the lock so the handler runs unlocked
        match self.handler(name) {
            Some(handler) => handler.handle(line, reply),
            None => {
                tracing::trace!("No handler for command '{}'", name);
                NotFoundHandler.handle(line, reply);
            }
        }
    }
}

impl Handler for Router {
    fn handle(&self, line: &str, reply: &mut Reply) {
        self.dispatch(line, reply);
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("commands", &self.commands())
            .finish()
    }
}
