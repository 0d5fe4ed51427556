//! Error types for tagmux
//!
//! Provides a unified error type for transport, protocol and setup failures.

use std::io::ErrorKind;

use thiserror::Error;

/// Result type alias using TagmuxError
pub type Result<T> = std::result::Result<T, TagmuxError>;

/// Unified error type for tagmux operations
#[derive(Debug, Error)]
pub enum TagmuxError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Read timed out waiting for a line")]
    Timeout,

    #[error("Line exceeds maximum length of {limit} bytes")]
    LineTooLong { limit: usize },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TagmuxError {
    /// True for errors that mean the peer went away or went idle.
    ///
    /// These end a session quietly rather than being reported as failures.
    pub fn is_disconnect(&self) -> bool {
        match self {
            TagmuxError::ConnectionClosed | TagmuxError::Timeout => true,
            TagmuxError::Io(e) => matches!(
                e.kind(),
                ErrorKind::UnexpectedEof
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
