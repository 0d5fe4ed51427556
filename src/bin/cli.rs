//! tagmux CLI Client
//!
//! Sends tagged commands to a tagmux server and prints what comes back.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::TcpStream;
use std::time::Duration;

use clap::Parser;
use tagmux::protocol::LINE_TERMINATOR;

/// tagmux CLI
#[derive(Parser, Debug)]
#[command(name = "tagmux-cli")]
#[command(about = "CLI for a tagmux server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:1143")]
    server: String,

    /// How long to wait for a tagged response, in milliseconds
    #[arg(short, long, default_value = "1000")]
    wait_ms: u64,

    /// Commands to send, e.g. "noop" or "auth alice secret"
    #[arg(required = true)]
    commands: Vec<String>,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> std::io::Result<()> {
    let stream = TcpStream::connect(&args.server)?;
    stream.set_read_timeout(Some(Duration::from_millis(args.wait_ms.max(1))))?;

    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    for (n, command) in args.commands.iter().enumerate() {
        let tag = format!("A{:03}", n + 1);
        write!(writer, "{} {}{}", tag, command, LINE_TERMINATOR)?;
        writer.flush()?;
        println!("> {} {}", tag, command);

        // Commands like `auth` never answer, so stop at the tagged line or
        // when the wait runs out
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => {
                    println!("(connection closed)");
                    return Ok(());
                }
                Ok(_) => {
                    let line = line.trim_end_matches(['\r', '\n']);
                    println!("< {}", line);
                    if line.starts_with(&format!("{} ", tag)) {
                        break;
                    }
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    println!("(no tagged response)");
                    break;
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok(())
}
