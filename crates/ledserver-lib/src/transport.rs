//! Datagram transports — UDP socket and optional ZeroMQ SUB.
//!
//! Both deliver the same thing: a sequence of discrete, unordered,
//! unreliable byte payloads, one per receive call. The serve loop only sees
//! the [`DatagramSource`] trait, so transport choice is a startup concern.
//!
//! Receives time out periodically so the loop can re-check the shutdown
//! flag even with no traffic; a timeout surfaces as `Ok(None)`.

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

// ── Error type ──

/// Transport errors.
///
/// `Resolve` and `Bind` occur at startup and are fatal — the process cannot
/// proceed without its listening endpoint. `Recv` is transient: the loop
/// logs it and keeps going.
#[derive(Debug)]
pub enum TransportError {
    Resolve(String),
    Bind(String),
    Recv(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Resolve(e) => write!(f, "Failed to resolve listen address: {e}"),
            TransportError::Bind(e) => write!(f, "Failed to bind: {e}"),
            TransportError::Recv(e) => write!(f, "Receive failed: {e}"),
        }
    }
}

impl std::error::Error for TransportError {}

pub type Result<T> = std::result::Result<T, TransportError>;

// ── Trait ──

/// A bound source of discrete byte payloads.
pub trait DatagramSource {
    /// Block for the next payload, up to the poll interval.
    ///
    /// `Ok(Some(n))` — a payload of `n` bytes was written into `buf`
    /// (clamped to `buf.len()`). `Ok(None)` — timed out or interrupted;
    /// the caller should re-check its shutdown flag and call again.
    fn recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>>;

    /// The endpoint this source is bound to, for diagnostics.
    fn endpoint(&self) -> &str;
}

// ── UDP ──

/// UDP datagram source bound to `host:port`.
#[derive(Debug)]
pub struct UdpSource {
    socket: UdpSocket,
    endpoint: String,
}

impl UdpSource {
    /// Resolve and bind the listening socket.
    pub fn bind(addr: &str, poll_interval: Duration) -> Result<Self> {
        let addrs: Vec<SocketAddr> = addr
            .to_socket_addrs()
            .map_err(|e| TransportError::Resolve(format!("{addr}: {e}")))?
            .collect();
        let socket = UdpSocket::bind(&addrs[..])
            .map_err(|e| TransportError::Bind(format!("{addr}: {e}")))?;
        socket
            .set_read_timeout(Some(poll_interval))
            .map_err(|e| TransportError::Bind(format!("{addr}: set_read_timeout: {e}")))?;
        let endpoint = socket
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| addr.to_string());
        Ok(UdpSource { socket, endpoint })
    }

    /// Port the socket actually bound to (useful when binding port 0).
    pub fn local_port(&self) -> Option<u16> {
        self.socket.local_addr().ok().map(|a| a.port())
    }
}

impl DatagramSource for UdpSource {
    fn recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        use std::io::ErrorKind;
        match self.socket.recv_from(buf) {
            Ok((n, _src)) => Ok(Some(n)),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(None),
            // EINTR during shutdown: let the caller re-check its flag.
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(TransportError::Recv(e.to_string())),
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

// ── ZeroMQ SUB ──

/// ZeroMQ SUB source bound to `tcp://host:port`, subscribed to everything.
#[cfg(feature = "pubsub")]
pub struct ZmqSource {
    socket: zmq::Socket,
    // The context must outlive the socket.
    _ctx: zmq::Context,
    endpoint: String,
}

#[cfg(feature = "pubsub")]
impl ZmqSource {
    /// Create the SUB socket and bind the endpoint.
    pub fn bind(endpoint: &str, poll_interval: Duration) -> Result<Self> {
        let ctx = zmq::Context::new();
        let socket = ctx
            .socket(zmq::SUB)
            .map_err(|e| TransportError::Bind(format!("{endpoint}: socket: {e}")))?;
        socket
            .set_subscribe(b"")
            .map_err(|e| TransportError::Bind(format!("{endpoint}: subscribe: {e}")))?;
        socket
            .set_rcvtimeo(poll_interval.as_millis() as i32)
            .map_err(|e| TransportError::Bind(format!("{endpoint}: rcvtimeo: {e}")))?;
        socket
            .bind(endpoint)
            .map_err(|e| TransportError::Bind(format!("{endpoint}: {e}")))?;
        Ok(ZmqSource {
            socket,
            _ctx: ctx,
            endpoint: endpoint.to_string(),
        })
    }
}

#[cfg(feature = "pubsub")]
impl DatagramSource for ZmqSource {
    fn recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        match self.socket.recv_into(buf, 0) {
            // recv_into reports the full message size even when truncated;
            // clamp so the caller never slices past the buffer. A clamped
            // oversize still exceeds the wire limit and is rejected there.
            Ok(n) => Ok(Some(n.min(buf.len()))),
            Err(zmq::Error::EAGAIN) => Ok(None),
            Err(zmq::Error::EINTR) => Ok(None),
            Err(e) => Err(TransportError::Recv(e.to_string())),
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

// ── Mock source ──

pub mod mock {
    use super::*;
    use crate::lifecycle::ShutdownFlag;
    use std::collections::VecDeque;

    /// One scripted receive outcome.
    pub enum Event {
        /// Deliver a payload.
        Datagram(Vec<u8>),
        /// Simulate a receive timeout.
        Timeout,
        /// Simulate a transient socket error.
        Error(String),
    }

    /// Scripted datagram source for serve-loop tests.
    ///
    /// Plays back a fixed sequence of [`Event`]s; once drained it requests
    /// shutdown on the attached flag (if any) and reports timeouts, so a
    /// test loop terminates on its own.
    pub struct MockSource {
        queue: VecDeque<Event>,
        stop_when_drained: Option<ShutdownFlag>,
    }

    impl MockSource {
        pub fn new(events: Vec<Event>) -> Self {
            MockSource {
                queue: events.into(),
                stop_when_drained: None,
            }
        }

        /// Request shutdown on `flag` once all events have been played.
        pub fn stop_when_drained(mut self, flag: ShutdownFlag) -> Self {
            self.stop_when_drained = Some(flag);
            self
        }
    }

    impl DatagramSource for MockSource {
        fn recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
            match self.queue.pop_front() {
                Some(Event::Datagram(payload)) => {
                    let n = payload.len().min(buf.len());
                    buf[..n].copy_from_slice(&payload[..n]);
                    Ok(Some(n))
                }
                Some(Event::Timeout) => Ok(None),
                Some(Event::Error(e)) => Err(TransportError::Recv(e)),
                None => {
                    if let Some(flag) = &self.stop_when_drained {
                        flag.request_stop();
                    }
                    Ok(None)
                }
            }
        }

        fn endpoint(&self) -> &str {
            "mock://scripted"
        }
    }
}
