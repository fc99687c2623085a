//! Stdio-based transport for JSON-RPC 2.0.
//!
//! This module implements stdio-based NDJSON (newline-delimited JSON) transport
//! for JSON-RPC 2.0 communication over stdin/stdout.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Stdin, Stdout};
use tracing::debug;

use crate::dispatcher::RequestDispatcher;
use crate::error::Error;
use crate::transports::Transport;

/// Stdio-based transport for JSON-RPC messages.
///
/// This transport reads newline-delimited JSON from stdin and writes
/// newline-terminated JSON to stdout. Lines are handled in order, so
/// responses appear in request order. Batch arrays must fit on one line.
pub struct Stdio {
    reader: BufReader<Stdin>,
    writer: BufWriter<Stdout>,
}

impl Stdio {
    /// Create a new stdio transport.
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
            writer: BufWriter::new(tokio::io::stdout()),
        }
    }

    /// Read a single newline-delimited message from stdin.
    ///
    /// The line is returned as raw bytes so that invalid UTF-8 reaches the
    /// dispatcher and is answered with a parse error. Returns `None` at end
    /// of input.
    async fn read_message(&mut self) -> Result<Option<Vec<u8>>, Error> {
        let mut line = Vec::new();
        let bytes_read = self.reader.read_until(b'\n', &mut line).await?;
        if bytes_read == 0 {
            return Ok(None);
        }

        if line.ends_with(b"\n") {
            line.pop();
            if line.ends_with(b"\r") {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    /// Write a message to stdout with newline termination.
    async fn write_message(&mut self, message: &[u8]) -> Result<(), Error> {
        self.writer.write_all(message).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

impl Default for Stdio {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for Stdio {
    async fn serve(mut self, dispatcher: Arc<RequestDispatcher>) -> Result<(), Error> {
        while let Some(line) = self.read_message().await? {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            debug!("Received message from stdin: {}", String::from_utf8_lossy(&line));

            if let Some(response) = dispatcher.dispatch(&line).await {
                self.write_message(&response).await?;
            }
        }

        debug!("EOF received, stopping stdio transport");
        Ok(())
    }
}
