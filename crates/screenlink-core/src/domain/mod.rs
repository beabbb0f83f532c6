//! Domain state for ScreenLink.
//!
//! Pure types with no I/O: the transient input events handed to a proxy and
//! the cursor-position cache both the production and the automation paths
//! consult before emitting a move.

/// The last cursor position reported to the peer.
pub mod cursor;

/// Transient keyboard and screen-transition events.
pub mod events;
