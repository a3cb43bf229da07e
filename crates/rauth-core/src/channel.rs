//! Persistent duplex connection to the gateway.
//!
//! The core only needs ordered text frames in both directions and a close
//! signal. Implementations: [`crate::ws_channel`] for the real gateway and
//! [`crate::harness::MemoryChannel`] for tests.

use async_trait::async_trait;

use crate::errors::ChannelError;

/// Lifecycle of the connection as seen by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    /// Session created, no connection attempted yet
    Idle,
    /// Opening the connection
    Connecting,
    /// Frames flowing
    Open,
    /// Closed for any reason
    Closed,
}

/// An open channel.
///
/// `recv` must be cancel safe: the session driver polls it inside
/// `tokio::select!` alongside timers and commands.
#[async_trait]
pub trait FrameChannel: Send {
    /// Send one text frame.
    async fn send(&mut self, text: String) -> Result<(), ChannelError>;

    /// Next text frame in peer order. `None` once the peer has closed.
    async fn recv(&mut self) -> Option<Result<String, ChannelError>>;

    /// Start a graceful shutdown. No-op if already closed.
    async fn close(&mut self) -> Result<(), ChannelError>;

    fn is_open(&self) -> bool;
}

/// Opens channels. Supplied by the environment.
#[async_trait]
pub trait ChannelConnector: Send + Sync {
    /// Connect to `url`, presenting `origin` as the `Origin` header.
    async fn open(&self, url: &str, origin: &str) -> Result<Box<dyn FrameChannel>, ChannelError>;
}
