//! Built-in Commands
//!
//! Small handlers the demo server registers out of the box.

use crate::protocol::Reply;
use crate::router::{Handler, Router};

/// `noop`: always succeeds
#[derive(Debug, Default, Clone, Copy)]
pub struct Noop;

impl Handler for Noop {
    fn handle(&self, _line: &str, reply: &mut Reply) {
        reply.write_response("OK NOOP completed");
    }
}

/// `capability`: lists capabilities on an untagged line
#[derive(Debug, Clone)]
pub struct Capability {
    capabilities: Vec<String>,
}

impl Capability {
    pub fn new<I, T>(capabilities: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            capabilities: capabilities.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for Capability {
    fn default() -> Self {
        Self::new(["IMAP4rev1", "AUTH"])
    }
}

impl Handler for Capability {
    fn handle(&self, _line: &str, reply: &mut Reply) {
        reply.write_status("CAPABILITY");
        for capability in &self.capabilities {
            reply.write_status(" ");
            reply.write_status(capability);
        }
        reply.write_response("OK CAPABILITY completed");
    }
}

/// `logout`: says goodbye and closes the session
#[derive(Debug, Default, Clone, Copy)]
pub struct Logout;

impl Handler for Logout {
    fn handle(&self, _line: &str, reply: &mut Reply) {
        reply.write_status("BYE logging out");
        reply.write_response("OK LOGOUT completed");
        reply.close();
    }
}

/// Wraps a handler so it only runs for authenticated sessions
///
/// Unauthenticated requests get `NO authentication required`.
pub struct RequireAuth<H> {
    inner: H,
}

impl<H: Handler> RequireAuth<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H: Handler> Handler for RequireAuth<H> {
    fn handle(&self, line: &str, reply: &mut Reply) {
        if reply.auth() {
            self.inner.handle(line, reply);
        } else {
            reply.write_response("NO authentication required");
        }
    }
}

/// Register `noop`, `capability` and `logout`
pub fn register_builtins(router: &Router) {
    router.register("noop", Noop);
    router.register("capability", Capability::default());
    router.register("logout", Logout);
}
