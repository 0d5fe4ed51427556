//! TCP Server
//!
//! Accepts connections and runs one session per connection thread.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::sync::WaitGroup;

use crate::auth::{AuthGate, DenyAll};
use crate::config::Config;
use crate::error::Result;
use crate::protocol::Reply;
use crate::router::{Handler, Router};

use super::session::Session;
use super::transport::ConnectionStream;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// TCP server for the tagged line protocol
///
/// Owns the one router and the one auth gate every session shares. Register
/// handlers and set the gate before calling [`Server::run`].
pub struct Server {
    config: Config,

    /// Command table shared by all sessions
    router: Arc<Router>,

    /// Credential check shared by all sessions
    auth_gate: Arc<dyn AuthGate>,

    /// Set to stop the accept loop
    shutdown: Arc<AtomicBool>,

    /// Sessions currently running
    active: Arc<AtomicUsize>,
}

/// Cloneable handle that stops a running accept loop
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl Server {
    /// Create a server with an empty router and the deny-all gate
    pub fn new(config: Config) -> Self {
        Self::with_services(config, Arc::new(Router::new()), Arc::new(DenyAll))
    }

    /// Create a server around an existing router and gate
    pub fn with_services(config: Config, router: Arc<Router>, auth_gate: Arc<dyn AuthGate>) -> Self {
        Self {
            config,
            router,
            auth_gate,
            shutdown: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn set_router(&mut self, router: Arc<Router>) {
        self.router = router;
    }

    pub fn set_auth_gate(&mut self, auth_gate: impl AuthGate + 'static) {
        self.auth_gate = Arc::new(auth_gate);
    }

    /// Register a handler on the server's router
    pub fn handle(&self, name: &str, handler: impl Handler + 'static) {
        self.router.register(name, handler);
    }

    /// Register a closure on the server's router
    pub fn handle_fn<F>(&self, name: &str, func: F)
    where
        F: Fn(&str, &mut Reply) + Send + Sync + 'static,
    {
        self.router.register_fn(name, func);
    }

    /// Number of sessions currently running
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown_handle().shutdown();
    }

    /// Run one session over `stream` to completion (blocking)
    pub fn serve<S: ConnectionStream>(&self, stream: S, idle_timeout: Duration) -> Result<()> {
        run_session(
            stream,
            idle_timeout,
            self.config.write_timeout(),
            Arc::clone(&self.router),
            Arc::clone(&self.auth_gate),
        )
    }

    /// Bind `config.listen_addr` and serve until shutdown (blocking)
    pub fn run(&self) -> Result<()> {
        self.config.validate()?;
        let listener = TcpListener::bind(&self.config.listen_addr)?;
        tracing::info!("Listening on {}", listener.local_addr()?);
        self.serve_listener(listener)
    }

    /// Accept connections from `listener` until shutdown (blocking)
    ///
    /// On shutdown the loop stops accepting, closes `listener` and waits for
    /// live sessions to end. A fatal accept error is returned after the same
    /// wait.
    ///
    /// Sessions end on EOF, idle timeout or logout. With
    /// `idle_timeout_secs == 0` there is no idle timeout, so the wait lasts
    /// until every client disconnects or logs out.
    pub fn serve_listener(&self, listener: TcpListener) -> Result<()> {
        // Non-blocking accept so the shutdown flag is polled
        listener.set_nonblocking(true)?;
        let sessions = WaitGroup::new();

        let result = loop {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::info!("Shutdown requested, no longer accepting connections");
                break Ok(());
            }

            match listener.accept() {
                Ok((stream, addr)) => self.spawn_session(stream, addr, &sessions),
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(ref e)
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::Interrupted | std::io::ErrorKind::ConnectionAborted
                    ) =>
                {
                    tracing::debug!("Transient accept error: {}", e);
                }
                Err(e) => {
                    tracing::error!("Failed to accept connection: {}", e);
                    break Err(e.into());
                }
            }
        };

        // New connections are refused while sessions drain
        drop(listener);

        let active = self.active_connections();
        if active > 0 {
            tracing::info!("Waiting for {} active session(s) to finish", active);
        }
        sessions.wait();

        result
    }

    /// Hand an accepted connection to its own thread
    fn spawn_session(&self, stream: TcpStream, addr: SocketAddr, sessions: &WaitGroup) {
        let limit = self.config.max_connections;
        if self.active_connections() >= limit {
            tracing::warn!("Connection limit ({}) reached, rejecting {}", limit, addr);
            return;
        }

        // Accepted sockets may inherit non-blocking mode from the listener
        let prepared = stream
            .set_nonblocking(false)
            .and_then(|_| stream.set_nodelay(true));
        if let Err(e) = prepared {
            tracing::warn!("Failed to configure connection from {}: {}", addr, e);
            return;
        }

        tracing::info!("Accepted connection from {}", addr);

        let guard = ActiveGuard::new(Arc::clone(&self.active));
        let member = sessions.clone();
        let router = Arc::clone(&self.router);
        let auth_gate = Arc::clone(&self.auth_gate);
        let idle_timeout = self.config.idle_timeout();
        let write_timeout = self.config.write_timeout();

        let spawned = thread::Builder::new()
            .name(format!("session-{}", addr))
            .spawn(move || {
                let _guard = guard;
                let _member = member;
                if let Err(e) = run_session(stream, idle_timeout, write_timeout, router, auth_gate) {
                    tracing::warn!("Session for {} ended with error: {}", addr, e);
                }
                tracing::debug!("Connection from {} finished", addr);
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to spawn session thread for {}: {}", addr, e);
        }
    }
}

fn run_session<S: ConnectionStream>(
    stream: S,
    idle_timeout: Duration,
    write_timeout: Option<Duration>,
    router: Arc<Router>,
    auth_gate: Arc<dyn AuthGate>,
) -> Result<()> {
    stream.set_write_deadline(write_timeout)?;
    let mut session = Session::with_services(stream, idle_timeout, router, auth_gate);
    session.run()
}

/// Counts a session as active for as long as it lives
struct ActiveGuard {
    active: Arc<AtomicUsize>,
}

impl ActiveGuard {
    fn new(active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::AcqRel);
        Self { active }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}
