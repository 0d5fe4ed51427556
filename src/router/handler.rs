//! Handler definitions
//!
//! The unit of logic bound to a command name.

use crate::protocol::{Reply, COMMAND_NOT_FOUND};

/// Processes one routed command
///
/// `line` is the full routed line, starting with the (lowercased) command
/// name itself; handlers parse their own arguments. Failures are reported by
/// writing into `reply`, there is no error channel back to the session.
pub trait Handler: Send + Sync {
    fn handle(&self, line: &str, reply: &mut Reply);
}

/// Adapter turning a closure into a [`Handler`]
pub struct HandlerFn<F> {
    func: F,
}

impl<F> HandlerFn<F>
where
    F: Fn(&str, &mut Reply) + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&str, &mut Reply) + Send + Sync,
{
    fn handle(&self, line: &str, reply: &mut Reply) {
        (self.func)(line, reply)
    }
}

/// Fallback for unknown commands and malformed lines
///
/// Writes [`COMMAND_NOT_FOUND`] to the response channel and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotFoundHandler;

impl Handler for NotFoundHandler {
    fn handle(&self, _line: &str, reply: &mut Reply) {
        reply.write_response(COMMAND_NOT_FOUND);
    }
}
