//! Protocol codec
//!
//! Constants and formatting helpers for server output lines.

/// Terminator appended to every line the server writes
pub const LINE_TERMINATOR: &str = "\r\n";

/// Prefix used in place of a tag on untagged lines
pub const UNTAGGED: &str = "*";

/// Reserved command name intercepted by the session
pub const AUTH_COMMAND: &str = "auth";

/// Fixed response for unknown commands and malformed lines
pub const COMMAND_NOT_FOUND: &str = "BAD error in IMAP command received by server";

/// Maximum accepted line length (64 KiB), terminator excluded
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Format an untagged status line: `* <text>`
pub fn format_status(text: &str) -> String {
    format_tagged(UNTAGGED, text)
}

/// Format a tagged line: `<tag> <text>`
pub fn format_tagged(tag: &str, text: &str) -> String {
    let mut line = String::with_capacity(tag.len() + 1 + text.len());
    line.push_str(tag);
    line.push(' ');
    line.push_str(text);
    line
}
