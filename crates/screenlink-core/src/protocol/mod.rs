//! Protocol module containing message types, the binary codec, and the
//! per-version emission strategies.

pub mod codec;
pub mod messages;
pub mod version;

pub use codec::{decode_message, encode_message, ProtocolError};
pub use messages::*;
pub use version::{strategy_for, EmissionStrategy, ProtocolVersion};
