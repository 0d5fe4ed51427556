//! Line Transport
//!
//! Newline-delimited reads with a per-line idle deadline, and
//! write-then-flush line output.

use std::io::{self, BufRead, BufReader, ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::error::{Result, TagmuxError};
use crate::protocol::{LINE_TERMINATOR, MAX_LINE_LENGTH};

/// A connected, bidirectional byte stream a session can run on
pub trait ConnectionStream: Read + Write + Send {
    /// Arm (`Some`) or disarm (`None`) the read deadline
    fn set_read_deadline(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Arm (`Some`) or disarm (`None`) the write deadline
    fn set_write_deadline(&self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    /// Human readable peer identity for logs
    fn peer_label(&self) -> String {
        "unknown".to_string()
    }
}

impl ConnectionStream for TcpStream {
    fn set_read_deadline(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.set_read_timeout(timeout)
    }

    fn set_write_deadline(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.set_write_timeout(timeout)
    }

    fn peer_label(&self) -> String {
        self.peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    }
}

/// Line-oriented wrapper around a [`ConnectionStream`]
pub struct LineTransport<S: ConnectionStream> {
    /// Buffered reader; writes go straight to the inner stream
    reader: BufReader<S>,

    /// Peer label captured at construction
    peer: String,
}

impl<S: ConnectionStream> LineTransport<S> {
    pub fn new(stream: S) -> Self {
        let peer = stream.peer_label();
        Self {
            reader: BufReader::new(stream),
            peer,
        }
    }

    /// Peer label for logging
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Read one line, waiting at most `timeout` (zero waits forever)
    ///
    /// The terminator (CRLF or LF) is stripped. EOF, a partial final line,
    /// an over-long line and timeouts are all errors.
    pub fn read_line(&mut self, timeout: Duration) -> Result<String> {
        let deadline = (!timeout.is_zero()).then_some(timeout);
        self.reader.get_ref().set_read_deadline(deadline)?;

        let result = self.read_raw_line();

        // Disarm even when the read failed
        let disarmed = self.reader.get_ref().set_read_deadline(None);
        let line = result?;
        disarmed?;

        Ok(line)
    }

    fn read_raw_line(&mut self) -> Result<String> {
        // Room for the longest allowed line plus CRLF
        let limit = (MAX_LINE_LENGTH + 2) as u64;
        let mut buf = Vec::new();

        let n = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut buf)
            .map_err(map_read_error)?;

        if n == 0 {
            return Err(TagmuxError::ConnectionClosed);
        }

        if buf.last() != Some(&b'\n') {
            if n as u64 >= limit {
                return Err(TagmuxError::LineTooLong {
                    limit: MAX_LINE_LENGTH,
                });
            }
            // Peer closed mid-line
            return Err(TagmuxError::ConnectionClosed);
        }

        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }

        if buf.len() > MAX_LINE_LENGTH {
            return Err(TagmuxError::LineTooLong {
                limit: MAX_LINE_LENGTH,
            });
        }

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Write `text` followed by the line terminator and flush
    pub fn write_line(&mut self, text: &str) -> Result<()> {
        let mut data = Vec::with_capacity(text.len() + LINE_TERMINATOR.len());
        data.extend_from_slice(text.as_bytes());
        data.extend_from_slice(LINE_TERMINATOR.as_bytes());

        let stream = self.reader.get_mut();
        stream.write_all(&data)?;
        stream.flush()?;
        Ok(())
    }
}

fn map_read_error(e: io::Error) -> TagmuxError {
    match e.kind() {
        // Unix reports an expired SO_RCVTIMEO as WouldBlock, Windows as TimedOut
        ErrorKind::WouldBlock | ErrorKind::TimedOut => TagmuxError::Timeout,
        _ => TagmuxError::Io(e),
    }
}
