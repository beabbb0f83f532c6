//! ProxyContext: the state every proxy, poller and harness shares.
//!
//! One context stands for one connection to one peer.  It holds:
//!
//! - the borrowed stream handle messages are written to,
//! - the [`CursorPositionCache`] both move policies consult,
//! - the [`AutomationBridge`] registration.
//!
//! Everything that needs this state receives an `Arc<ProxyContext>` at
//! construction; nothing reaches it through a global.  Two contexts are fully
//! independent, so tests can run many proxies side by side.

use std::sync::Arc;

use screenlink_core::{CursorPosition, CursorPositionCache, ProtocolError, ProxyMessage};
use thiserror::Error;

use crate::application::bridge::AutomationBridge;

/// Error type for stream writes.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The underlying transport reported an I/O failure.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The stream was closed earlier and accepts no more writes.
    #[error("stream is closed")]
    Closed,
    /// The message could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// A sink for outbound protocol messages.
///
/// Infrastructure implementations frame the message onto a socket; test
/// implementations record it.  Implementations must serialise concurrent
/// writers so that frames never interleave.
#[cfg_attr(test, mockall::automock)]
pub trait MessageStream: Send + Sync {
    /// Writes one message to the peer.
    fn write_message(&self, msg: &ProxyMessage) -> Result<(), StreamError>;
}

/// Shared state for one peer connection.
#[derive(Debug)]
pub struct ProxyContext {
    stream: Arc<dyn MessageStream>,
    cursor: CursorPositionCache,
    bridge: AutomationBridge,
}

impl ProxyContext {
    /// Creates a context with the cursor cache at its default position.
    pub fn new(stream: Arc<dyn MessageStream>) -> Self {
        Self {
            stream,
            cursor: CursorPositionCache::default(),
            bridge: AutomationBridge::new(),
        }
    }

    /// Creates a context with the cursor cache at `initial`.
    pub fn with_initial_cursor(stream: Arc<dyn MessageStream>, initial: CursorPosition) -> Self {
        Self {
            stream,
            cursor: CursorPositionCache::new(initial),
            bridge: AutomationBridge::new(),
        }
    }

    pub fn cursor(&self) -> &CursorPositionCache {
        &self.cursor
    }

    pub fn bridge(&self) -> &AutomationBridge {
        &self.bridge
    }

    /// Writes `msg` to the shared stream.
    pub fn send(&self, msg: &ProxyMessage) -> Result<(), StreamError> {
        self.stream.write_message(msg)
    }
}

impl std::fmt::Debug for dyn MessageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MessageStream")
    }
}
