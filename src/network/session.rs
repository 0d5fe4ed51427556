//! Session
//!
//! Runs the tagged line protocol for one client connection.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthGate, DenyAll};
use crate::error::{Result, TagmuxError};
use crate::protocol::{format_status, format_tagged, parse_line, Parsed, Reply, AUTH_COMMAND};
use crate::router::{Handler, NotFoundHandler, Router};

use super::transport::{ConnectionStream, LineTransport};

/// Per-connection protocol state
///
/// ## Loop
/// ```text
/// OPEN ── read line ── parse ── dispatch ── flush reply ──┐
///   ▲                                                     │
///   └─────────────────────────────────────────────────────┘
///          (read/write error, EOF or close request → CLOSED)
/// ```
///
/// Authentication is a flag, not a loop state: handlers see it through
/// [`Reply::auth`] and decide for themselves what an unauthenticated
/// client may do.
pub struct Session<S: ConnectionStream> {
    /// Line reader/writer over the client stream
    transport: LineTransport<S>,

    /// Shared command table
    router: Arc<Router>,

    /// Shared credential check for `auth`
    auth_gate: Arc<dyn AuthGate>,

    /// Idle timeout applied to every line read
    timeout: Duration,

    /// Result of the most recent `auth` attempt
    auth: bool,

    /// Set once the session must stop reading
    closed: bool,
}

impl<S: ConnectionStream> Session<S> {
    /// Create a session with an empty router and the deny-all gate
    pub fn new(stream: S, timeout: Duration) -> Self {
        Self::with_services(stream, timeout, Arc::new(Router::new()), Arc::new(DenyAll))
    }

    /// Create a session sharing the given router and gate
    pub fn with_services(
        stream: S,
        timeout: Duration,
        router: Arc<Router>,
        auth_gate: Arc<dyn AuthGate>,
    ) -> Self {
        Self {
            transport: LineTransport::new(stream),
            router,
            auth_gate,
            timeout,
            auth: false,
            closed: false,
        }
    }

    pub fn set_auth_gate(&mut self, auth_gate: Arc<dyn AuthGate>) {
        self.auth_gate = auth_gate;
    }

    /// Whether the last `auth` attempt succeeded
    pub fn is_auth(&self) -> bool {
        self.auth
    }

    /// Run the gate and store its verdict as the session's auth flag
    pub fn authenticate(&mut self, username: &str, password: &str) -> bool {
        self.auth = self.auth_gate.authenticate(username, password);
        self.auth
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Stop the loop before the next read
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Peer label for logging
    pub fn peer(&self) -> &str {
        self.transport.peer()
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// Write a raw line
    pub fn write_line(&mut self, text: &str) -> Result<()> {
        self.transport.write_line(text)
    }

    /// Write `<tag> <text>`
    pub fn write_tagged(&mut self, tag: &str, text: &str) -> Result<()> {
        self.transport.write_line(&format_tagged(tag, text))
    }

    /// Write `* <text>`
    pub fn write_status(&mut self, text: &str) -> Result<()> {
        self.transport.write_line(&format_status(text))
    }

    // =========================================================================
    // Protocol Loop
    // =========================================================================

    /// Handle the connection (blocking until closed)
    ///
    /// Returns `Ok` when the client disconnects, goes idle past the timeout,
    /// or a handler closes the session. Other I/O errors are returned.
    pub fn run(&mut self) -> Result<()> {
        tracing::debug!("Session started for {}", self.peer());

        while !self.closed {
            let line = match self.transport.read_line(self.timeout) {
                Ok(line) => line,
                Err(e) => return self.fail(e),
            };

            if let Err(e) = self.process_line(&line) {
                return self.fail(e);
            }
        }

        tracing::debug!("Session closed for {}", self.peer());
        Ok(())
    }

    /// Process one line that has already been read
    ///
    /// Malformed lines get the fixed not-found response untagged; the reserved
    /// `auth` command updates the auth flag and writes nothing; everything
    /// else goes through the router. Only write errors are returned.
    pub fn process_line(&mut self, line: &str) -> Result<()> {
        let parsed = parse_line(line);
        let mut reply = Reply::new(self.auth);

        let tag = match &parsed {
            Parsed::Untagged => {
                tracing::debug!("No tag in command from {}", self.peer());
                NotFoundHandler.handle(line, &mut reply);
                None
            }
            Parsed::InvalidTag => {
                // Never reflect an unvalidated tag onto the wire
                tracing::debug!("Invalid tag in command from {}", self.peer());
                NotFoundHandler.handle(line, &mut reply);
                None
            }
            Parsed::Command { name, args, .. } if name == AUTH_COMMAND => {
                self.handle_auth(args);
                return Ok(());
            }
            Parsed::Command { tag, name, .. } => {
                tracing::debug!("Command '{}' tagged {} from {}", name, tag, self.peer());
                if let Some(routed) = parsed.routed_line() {
                    self.router.dispatch(&routed, &mut reply);
                }
                Some(*tag)
            }
        };

        self.flush_reply(tag, &reply)?;

        if reply.close_requested() {
            tracing::debug!("Handler requested close for {}", self.peer());
            self.closed = true;
        }
        Ok(())
    }

    /// `auth <username> <password>`: no reply is written either way
    fn handle_auth(&mut self, args: &str) {
        let mut tokens = args.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some(username), Some(password)) => {
                let accepted = self.authenticate(username, password);
                tracing::info!(
                    "Authentication {} for user '{}' from {}",
                    if accepted { "accepted" } else { "rejected" },
                    username,
                    self.peer()
                );
            }
            _ => {
                // Gate is not consulted without both credentials
                tracing::debug!("Incomplete auth command from {}", self.peer());
                self.auth = false;
            }
        }
    }

    /// Status first as one untagged line, then the response as one line
    /// (tagged when a valid tag is known, untagged otherwise)
    fn flush_reply(&mut self, tag: Option<&str>, reply: &Reply) -> Result<()> {
        if let Some(status) = reply.status_text() {
            self.write_status(&status)?;
        }

        if let Some(response) = reply.response_text() {
            match tag {
                Some(tag) => self.write_tagged(tag, &response)?,
                None => self.write_status(&response)?,
            }
        }
        Ok(())
    }

    /// End the loop on a transport error
    fn fail(&mut self, e: TagmuxError) -> Result<()> {
        let was_closed = std::mem::replace(&mut self.closed, true);

        if e.is_disconnect() {
            if !was_closed {
                tracing::debug!("Client {} disconnected: {}", self.peer(), e);
            }
            return Ok(());
        }

        if !was_closed {
            tracing::warn!("Connection error for {}: {}", self.peer(), e);
        }
        Err(e)
    }
}
