//! Protocol Module
//!
//! Defines the tagged line protocol spoken between client and server.
//!
//! ## Line Format
//!
//! ### Request
//! ```text
//! <tag> SP <command-name> [SP <arguments...>] CRLF
//! ```
//! - tag: one or more ASCII alphanumeric characters
//! - command-name: matched case-insensitively
//! - a bare LF is accepted as terminator as well
//!
//! ### Responses
//! ```text
//! * SP <status text> CRLF          untagged (zero or one per command)
//! <tag> SP <response text> CRLF    tagged (at most one per command)
//! ```
//!
//! ### Reserved Commands
//! - `auth <username> <password>`: handled by the session itself, never
//!   routed, and never answered

mod parser;
mod reply;
mod codec;

pub use parser::{is_valid_tag, parse_line, Parsed};
pub use reply::Reply;
pub use codec::{
    format_status, format_tagged, AUTH_COMMAND, COMMAND_NOT_FOUND, LINE_TERMINATOR,
    MAX_LINE_LENGTH, UNTAGGED,
};
