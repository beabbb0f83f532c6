//! # screenlink-core
//!
//! Shared library for ScreenLink containing the outbound protocol messages,
//! the binary frame codec, the per-version emission strategies and the
//! cursor-position state shared by every sender.
//!
//! It has no sockets or OS input APIs.
//!
//! # Architecture overview (for beginners)
//!
//! ScreenLink shares one keyboard and mouse across several machines.  The
//! machine with the physical devices (the *server*) keeps one *client proxy*
//! per remote screen.  When the cursor crosses onto a remote screen the proxy
//! turns local input into small binary messages and writes them to the
//! remote peer.
//!
//! This crate (`screenlink-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – The eight outbound messages, how they are framed into
//!   bytes, and which field layout each protocol version uses.
//!
//! - **`domain`** – Pure state with no I/O: the transient input events and the
//!   cursor-position cache that decides whether a move is worth sending.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `screenlink_core::ProxyMessage` instead of the full module path.
pub use domain::cursor::{CursorPosition, CursorPositionCache, MoveOutcome, MovePolicy};
pub use domain::events::{KeyEvent, ScreenTransitionEvent};
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::ProxyMessage;
pub use protocol::version::{strategy_for, EmissionStrategy, ProtocolVersion};
