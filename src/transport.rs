//! SCPI transport abstraction.
//!
//! The drivers only need to send a text command and, for queries, read back a
//! single text reply. [`ScpiTransport`] captures exactly that, so the same
//! driver code runs over a VISA session, a raw socket, a serial line or the
//! in-memory [`MockTransport`](crate::mock::MockTransport).
//!
//! Opening the underlying connection belongs to the caller. [`LineTransport`]
//! adapts any already-established tokio byte stream by handling command and
//! reply termination, bounding each reply by a read timeout, and keeping
//! replies paired with the queries that asked for them.

use crate::error::TransportError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

/// Default termination for both directions (`'\n'`).
pub const DEFAULT_TERMINATION: &str = "\n";

/// Default time to wait for a reply.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Per-read window used when draining stale input; a window with no data
/// ends the drain.
const DRAIN_POLL: Duration = Duration::from_millis(5);

/// Upper bound on one drain pass.
const DRAIN_LIMIT: Duration = Duration::from_millis(50);

/// Trait for SCPI communication transports.
///
/// Abstracts the underlying communication mechanism (VISA, TCP, serial) to
/// enable protocol-agnostic SCPI operations.
#[async_trait]
pub trait ScpiTransport: Send + Sync {
    /// Send a query command and return the response, without termination.
    async fn query(&self, command: &str) -> Result<String, TransportError>;

    /// Send a command without expecting a response.
    async fn write(&self, command: &str) -> Result<(), TransportError>;
}

#[async_trait]
impl<T: ScpiTransport + ?Sized> ScpiTransport for Arc<T> {
    async fn query(&self, command: &str) -> Result<String, TransportError> {
        (**self).query(command).await
    }

    async fn write(&self, command: &str) -> Result<(), TransportError> {
        (**self).write(command).await
    }
}

#[async_trait]
impl<T: ScpiTransport + ?Sized> ScpiTransport for Box<T> {
    async fn query(&self, command: &str) -> Result<String, TransportError> {
        (**self).query(command).await
    }

    async fn write(&self, command: &str) -> Result<(), TransportError> {
        (**self).write(command).await
    }
}

/// Line-oriented SCPI transport over an established byte stream.
///
/// Commands are written with `write_termination` appended; replies are read
/// up to and including `read_termination`, which is then stripped. Each
/// reply must arrive within `timeout`, otherwise the query fails with a
/// [`TransportError`].
///
/// The stream is held behind a mutex so one exchange completes before the
/// next begins. If a query future is dropped after its command went out, the
/// reply it was waiting for is discarded at the start of the next exchange,
/// and any other stale input is drained before every command.
pub struct LineTransport<S> {
    port: Mutex<Port<S>>,
    read_termination: String,
    write_termination: String,
    timeout: Duration,
}

struct Port<S> {
    reader: BufReader<S>,
    /// A command was sent but its reply has not been consumed.
    reply_pending: bool,
}

impl<S> LineTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap `stream` using `'\n'` termination in both directions and the
    /// default reply timeout.
    pub fn new(stream: S) -> Self {
        Self {
            port: Mutex::new(Port {
                reader: BufReader::new(stream),
                reply_pending: false,
            }),
            read_termination: DEFAULT_TERMINATION.to_string(),
            write_termination: DEFAULT_TERMINATION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the termination expected at the end of each reply.
    ///
    /// An empty string falls back to the default.
    pub fn with_read_termination(mut self, termination: impl Into<String>) -> Self {
        let termination = termination.into();
        self.read_termination = if termination.is_empty() {
            DEFAULT_TERMINATION.to_string()
        } else {
            termination
        };
        self
    }

    /// Set the termination appended to each command.
    pub fn with_write_termination(mut self, termination: impl Into<String>) -> Self {
        self.write_termination = termination.into();
        self
    }

    /// Set how long a query waits for its reply.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Termination expected at the end of each reply.
    pub fn read_termination(&self) -> &str {
        &self.read_termination
    }

    /// Termination appended to each command.
    pub fn write_termination(&self) -> &str {
        &self.write_termination
    }

    /// Reply timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Unwrap the transport, returning the underlying stream.
    pub fn into_inner(self) -> S {
        self.port.into_inner().reader.into_inner()
    }

    /// Bring the stream back to a clean state before a new command.
    async fn resync(&self, port: &mut Port<S>) -> Result<(), TransportError> {
        if port.reply_pending {
            match tokio::time::timeout(self.timeout, self.receive(&mut port.reader)).await {
                Ok(Ok(stale)) => {
                    tracing::debug!(len = stale.len(), "discarded reply to abandoned query");
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => tracing::debug!("abandoned query never answered"),
            }
            port.reply_pending = false;
        }

        let buffered = port.reader.buffer().len();
        if buffered > 0 {
            tracing::debug!(bytes = buffered, "clearing buffered input");
            port.reader.consume(buffered);
        }

        let mut discard = [0u8; 256];
        let deadline = tokio::time::Instant::now() + DRAIN_LIMIT;
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(DRAIN_POLL, port.reader.get_mut().read(&mut discard)).await {
                Ok(Ok(0)) | Err(_) => break,
                Ok(Ok(n)) => tracing::debug!(bytes = n, "flushed stale input"),
                Ok(Err(e)) => return Err(e.into()),
            }
        }
        Ok(())
    }

    async fn send(&self, port: &mut BufReader<S>, command: &str) -> Result<(), TransportError> {
        let mut frame = String::with_capacity(command.len() + self.write_termination.len());
        frame.push_str(command);
        frame.push_str(&self.write_termination);
        tracing::debug!(cmd = %command, "sending SCPI command");
        port.get_mut().write_all(frame.as_bytes()).await?;
        port.get_mut().flush().await?;
        Ok(())
    }

    async fn receive(&self, port: &mut BufReader<S>) -> Result<String, TransportError> {
        let termination = self.read_termination.as_bytes();
        let Some(&last) = termination.last() else {
            return Err(TransportError::msg("empty read termination"));
        };
        let mut buf = Vec::new();
        loop {
            let n = port.read_until(last, &mut buf).await?;
            if n == 0 {
                return Err(TransportError::msg(
                    "connection closed before reply termination",
                ));
            }
            if buf.ends_with(termination) {
                buf.truncate(buf.len() - termination.len());
                break;
            }
        }
        let reply = String::from_utf8(buf)
            .map_err(|e| TransportError::msg(format!("reply is not valid UTF-8: {}", e)))?;
        tracing::debug!(len = reply.len(), "received SCPI reply");
        Ok(reply)
    }
}

#[async_trait]
impl<S> ScpiTransport for LineTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn query(&self, command: &str) -> Result<String, TransportError> {
        let mut guard = self.port.lock().await;
        let port = &mut *guard;
        self.resync(port).await?;
        self.send(&mut port.reader, command).await?;
        port.reply_pending = true;

        let result = tokio::time::timeout(self.timeout, self.receive(&mut port.reader)).await;
        port.reply_pending = false;
        match result {
            Ok(reply) => reply,
            Err(_) => Err(TransportError::msg(format!(
                "timed out after {:?} waiting for reply to '{}'",
                self.timeout, command
            ))),
        }
    }

    async fn write(&self, command: &str) -> Result<(), TransportError> {
        let mut guard = self.port.lock().await;
        let port = &mut *guard;
        self.resync(port).await?;
        self.send(&mut port.reader, command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

    /// Read one command from `host` and answer it with `reply`.
    async fn answer(host: &mut DuplexStream, reply: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8; 64];
        let n = host.read(&mut buf).await.unwrap();
        buf.truncate(n);
        host.write_all(reply).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn query_appends_and_strips_termination() {
        let (mut host, device) = tokio::io::duplex(256);
        let transport = LineTransport::new(device);

        let device_side = tokio::spawn(async move { answer(&mut host, b"HP8563E\n").await });
        let reply = transport.query("ID?").await.unwrap();
        assert_eq!(reply, "HP8563E");
        assert_eq!(device_side.await.unwrap(), b"ID?\n");
    }

    #[tokio::test]
    async fn multi_byte_read_termination() {
        let (mut host, device) = tokio::io::duplex(256);
        let transport = LineTransport::new(device)
            .with_read_termination("\r\n")
            .with_write_termination("\r\n");

        let device_side = tokio::spawn(async move { answer(&mut host, b"1.0,\r2.0\r\n").await });
        let reply = transport.query("TRA?").await.unwrap();
        assert_eq!(reply, "1.0,\r2.0");
        assert_eq!(device_side.await.unwrap(), b"TRA?\r\n");
    }

    #[tokio::test]
    async fn write_sends_without_reading() {
        let (mut host, device) = tokio::io::duplex(256);
        let transport = LineTransport::new(device);

        transport.write("CF 1000000").await.unwrap();

        let mut buf = vec![0u8; 32];
        let n = host.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"CF 1000000\n");
    }

    #[tokio::test]
    async fn closed_stream_is_a_transport_error() {
        let (host, device) = tokio::io::duplex(256);
        let transport = LineTransport::new(device);
        drop(host);

        assert!(transport.query("ID?").await.is_err());
    }

    #[tokio::test]
    async fn silent_device_times_out() {
        let (_host, device) = tokio::io::duplex(256);
        let transport = LineTransport::new(device).with_timeout(Duration::from_millis(100));

        let err = transport.query("ID?").await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn stale_input_is_flushed_before_query() {
        let (mut host, device) = tokio::io::duplex(256);
        let transport = LineTransport::new(device);

        host.write_all(b"garbage from power-on\n").await.unwrap();
        let device_side = tokio::spawn(async move {
            // Wait until the stale line has been drained, then answer
            tokio::time::sleep(Duration::from_millis(100)).await;
            answer(&mut host, b"HP8563E\n").await
        });
        assert_eq!(transport.query("ID?").await.unwrap(), "HP8563E");
        assert_eq!(device_side.await.unwrap(), b"ID?\n");
    }

    #[tokio::test]
    async fn late_reply_to_cancelled_query_is_discarded() {
        let (mut host, device) = tokio::io::duplex(256);
        let transport = LineTransport::new(device);

        let device_side = tokio::spawn(async move {
            let first = answer_after(&mut host, Duration::from_millis(200), b"-80,-70,-60\n").await;
            let second = answer_after(&mut host, Duration::ZERO, b"1.0E+09\n").await;
            (first, second)
        });

        let cancelled =
            tokio::time::timeout(Duration::from_millis(50), transport.query("TRA?")).await;
        assert!(cancelled.is_err());

        assert_eq!(transport.query("FA?").await.unwrap(), "1.0E+09");
        let (first, second) = device_side.await.unwrap();
        assert_eq!(first, b"TRA?\n");
        assert_eq!(second, b"FA?\n");
    }

    async fn answer_after(host: &mut DuplexStream, delay: Duration, reply: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8; 64];
        let n = host.read(&mut buf).await.unwrap();
        buf.truncate(n);
        tokio::time::sleep(delay).await;
        host.write_all(reply).await.unwrap();
        buf
    }

    #[test]
    fn empty_read_termination_falls_back_to_default() {
        let (_host, device) = tokio::io::duplex(8);
        let transport = LineTransport::new(device).with_read_termination("");
        assert_eq!(transport.read_termination(), "\n");
        assert_eq!(transport.timeout(), DEFAULT_TIMEOUT);
    }
}
