//! screenlink-server library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does screenlink-server do? (for beginners)
//!
//! The server owns the physical keyboard and mouse.  For every remote screen
//! it keeps a [`VersionedClientProxy`](application::client_proxy::VersionedClientProxy)
//! that turns local input into protocol messages for that peer.
//!
//! Next to the production path sits an optional *automation bridge*: an
//! external consumer (typically a test harness) can register hooks to observe
//! key presses and focus changes, receive a steady stream of poll ticks, and
//! inject input directly through the [`Harness`](application::harness::Harness).

/// Application layer: proxy, bridge, poller and harness.
pub mod application;

/// Infrastructure layer: framed stream, bundled hooks, config storage, console.
pub mod infrastructure;
