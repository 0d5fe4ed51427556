//! Network Module
//!
//! TCP acceptor, per-connection sessions and the line transport under them.
//!
//! ## Architecture
//! - Single acceptor thread polling a non-blocking listener
//! - One thread per connection, each owning its `Session`
//! - Router and auth gate shared read-only through `Arc`

mod server;
mod session;
mod transport;

pub use server::{Server, ShutdownHandle};
pub use session::Session;
pub use transport::{ConnectionStream, LineTransport};
