//! Router Module
//!
//! Maps command names to handlers.
//!
//! ## Responsibilities
//! - Case-insensitive lookup by command name
//! - Last registration wins for a given name
//! - Fixed `BAD` fallback for unknown commands
//!
//! ## Concurrency
//! The table sits behind a `parking_lot::RwLock`. Sessions take the read
//! lock only long enough to clone the handler's `Arc`, so handlers never run
//! while the lock is held and registration can happen at any time.

mod handler;
mod table;

pub use handler::{Handler, HandlerFn, NotFoundHandler};
pub use table::Router;
