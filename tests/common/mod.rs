//! Shared test helpers
//!
//! An in-memory `ConnectionStream` fed from a script of client lines.

#![allow(dead_code)]

use std::io::{self, Cursor, ErrorKind, Read, Write};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tagmux::network::ConnectionStream;

/// Stream that replays `input` and records everything written to it
pub struct ScriptedStream {
    input: Cursor<Vec<u8>>,
    output: Arc<Mutex<Vec<u8>>>,
    deadlines: Arc<Mutex<Vec<Option<Duration>>>>,
    /// Returned instead of EOF once the input runs out
    read_error: Option<ErrorKind>,
    /// Returned from every write
    write_error: Option<ErrorKind>,
}

impl ScriptedStream {
    pub fn new(input: &str) -> Self {
        Self::from_bytes(input.as_bytes().to_vec())
    }

    pub fn from_bytes(input: Vec<u8>) -> Self {
        Self {
            input: Cursor::new(input),
            output: Arc::new(Mutex::new(Vec::new())),
            deadlines: Arc::new(Mutex::new(Vec::new())),
            read_error: None,
            write_error: None,
        }
    }

    /// Build from client lines, each terminated with CRLF
    pub fn lines(lines: &[&str]) -> Self {
        let mut input = String::new();
        for line in lines {
            input.push_str(line);
            input.push_str("\r\n");
        }
        Self::new(&input)
    }

    pub fn with_read_error(mut self, kind: ErrorKind) -> Self {
        self.read_error = Some(kind);
        self
    }

    pub fn with_write_error(mut self, kind: ErrorKind) -> Self {
        self.write_error = Some(kind);
        self
    }

    pub fn output(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.output)
    }

    pub fn deadlines(&self) -> Arc<Mutex<Vec<Option<Duration>>>> {
        Arc::clone(&self.deadlines)
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.input.read(buf)?;
        if n == 0 && !buf.is_empty() {
            if let Some(kind) = self.read_error {
                return Err(io::Error::new(kind, "scripted read error"));
            }
        }
        Ok(n)
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(kind) = self.write_error {
            return Err(io::Error::new(kind, "scripted write error"));
        }
        self.output.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ConnectionStream for ScriptedStream {
    fn set_read_deadline(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.deadlines.lock().push(timeout);
        Ok(())
    }

    fn peer_label(&self) -> String {
        "scripted".to_string()
    }
}

/// Split recorded output into lines, checking every line ends in CRLF
pub fn output_lines(output: &Mutex<Vec<u8>>) -> Vec<String> {
    let text = String::from_utf8(output.lock().clone()).expect("output is UTF-8");
    assert!(
        text.is_empty() || text.ends_with("\r\n"),
        "output not CRLF terminated: {:?}",
        text
    );
    text.split_terminator("\r\n").map(str::to_string).collect()
}
