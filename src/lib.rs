//! # tagmux
//!
//! Session and command-routing core for a tagged, line-oriented protocol
//! server in the style of IMAP:
//! - Client lines carry a tag that is echoed on the completion line
//! - Case-insensitive command routing with a fixed `BAD` fallback
//! - Pluggable authentication gate, deny-all by default
//! - One blocking session per connection with a per-line idle timeout
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │              (one thread per connection)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Session                                 │
//! │        read line → parse tag → dispatch → flush reply        │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │ "auth"                           │ everything else
//!            ▼                                  ▼
//!   ┌─────────────────┐                ┌─────────────────┐
//!   │    Auth Gate    │                │     Router      │
//!   │  (shared, Arc)  │                │ (RwLock table)  │
//!   └─────────────────┘                └────────┬────────┘
//!                                               │
//!                                               ▼
//!                                      ┌─────────────────┐
//!                                      │    Handlers     │
//!                                      │ (write Replies) │
//!                                      └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use tagmux::{Config, Server, StaticAuthGate};
//!
//! let mut server = Server::new(Config::default());
//! server.handle_fn("noop", |_line, reply| reply.write_response("OK done"));
//! server.set_auth_gate(StaticAuthGate::new([("alice", "secret")]));
//! server.run().unwrap();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod auth;
pub mod commands;
pub mod network;
pub mod protocol;
pub mod router;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use auth::{AuthGate, DenyAll, StaticAuthGate};
pub use config::Config;
pub use error::{Result, TagmuxError};
pub use network::{Server, Session, ShutdownHandle};
pub use protocol::Reply;
pub use router::{Handler, HandlerFn, Router};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of tagmux
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
