//! Reply definitions
//!
//! Per-command output sink handed to handlers.

use std::io::Write;

use bytes::{BufMut, BytesMut};

/// Output collected while one command runs
///
/// The status channel becomes a single untagged line and the response
/// channel a single tagged line. Handlers that want several logical lines in
/// one channel embed the line breaks themselves.
#[derive(Debug, Default)]
pub struct Reply {
    /// Untagged output (`* ...`)
    status: BytesMut,

    /// Tagged completion output (`<tag> ...`)
    response: BytesMut,

    /// Session authentication flag at dispatch time
    auth: bool,

    /// Set when the handler wants the session closed after this reply
    close: bool,
}

impl Reply {
    /// Create an empty reply carrying the session's auth snapshot
    pub fn new(auth: bool) -> Self {
        Self {
            auth,
            ..Self::default()
        }
    }

    /// Whether the session was authenticated when this command was dispatched
    pub fn auth(&self) -> bool {
        self.auth
    }

    /// Writer for the untagged status channel
    pub fn status(&mut self) -> impl Write + '_ {
        (&mut self.status).writer()
    }

    /// Writer for the tagged response channel
    pub fn response(&mut self) -> impl Write + '_ {
        (&mut self.response).writer()
    }

    /// Append text to the status channel
    pub fn write_status(&mut self, text: &str) {
        self.status.extend_from_slice(text.as_bytes());
    }

    /// Append text to the response channel
    pub fn write_response(&mut self, text: &str) {
        self.response.extend_from_slice(text.as_bytes());
    }

    /// Raw bytes written to the status channel
    pub fn status_bytes(&self) -> &[u8] {
        &self.status
    }

    /// Raw bytes written to the response channel
    pub fn response_bytes(&self) -> &[u8] {
        &self.response
    }

    /// Status channel as text, or `None` if nothing was written
    pub fn status_text(&self) -> Option<String> {
        text_of(&self.status)
    }

    /// Response channel as text, or `None` if nothing was written
    pub fn response_text(&self) -> Option<String> {
        text_of(&self.response)
    }

    /// Ask the session to close once this reply is flushed
    pub fn close(&mut self) {
        self.close = true;
    }

    pub fn close_requested(&self) -> bool {
        self.close
    }
}

fn text_of(buf: &BytesMut) -> Option<String> {
    if buf.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(buf).into_owned())
    }
}
