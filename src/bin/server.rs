//! tagmux Server Binary
//!
//! Starts a TCP server speaking the tagged line protocol with the built-in
//! commands registered.

use clap::Parser;
use tagmux::commands::{register_builtins, RequireAuth};
use tagmux::{Config, Server, StaticAuthGate};
use tracing_subscriber::{fmt, EnvFilter};

/// tagmux Server
#[derive(Parser, Debug)]
#[command(name = "tagmux-server")]
#[command(about = "Tagged line protocol server")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:1143")]
    listen: String,

    /// Idle timeout per line read, in seconds (0 disables it)
    #[arg(short = 't', long, default_value = "300")]
    idle_timeout: u64,

    /// Write timeout in milliseconds (0 disables it)
    #[arg(short, long, default_value = "0")]
    write_timeout_ms: u64,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Accepted credentials as name:password (repeatable)
    #[arg(short, long = "user", value_parser = parse_credential)]
    users: Vec<(String, String)>,
}

fn parse_credential(raw: &str) -> Result<(String, String), String> {
    match raw.split_once(':') {
        Some((user, pass)) if !user.is_empty() && !user.contains(' ') && !pass.contains(' ') => {
            Ok((user.to_string(), pass.to_string()))
        }
        _ => Err(format!("expected name:password without spaces, got '{}'", raw)),
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tagmux=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("tagmux Server v{}", tagmux::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .listen_addr(&args.listen)
        .idle_timeout_secs(args.idle_timeout)
        .write_timeout_ms(args.write_timeout_ms)
        .max_connections(args.max_connections)
        .build();

    let mut server = Server::new(config);
    register_builtins(server.router());
    server.handle_fn("check", |_line, reply| {
        reply.write_response("OK CHECK completed");
    });
    server.handle(
        "whoami",
        RequireAuth::new(tagmux::HandlerFn::new(|_line: &str, reply: &mut tagmux::Reply| {
            reply.write_response("OK authenticated");
        })),
    );

    if args.users.is_empty() {
        tracing::warn!("No users configured, every auth attempt will be rejected");
    } else {
        tracing::info!("{} user(s) configured", args.users.len());
        server.set_auth_gate(StaticAuthGate::new(args.users));
    }

    tracing::info!("Commands: {}", server.router().commands().join(", "));

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
