//! Per-version emission strategies.
//!
//! Each protocol revision decides which fields a message carries.  Instead of
//! stacking one proxy type on top of another per revision, every revision is a
//! small [`EmissionStrategy`] object and [`strategy_for`] looks the right one
//! up in a flat table.  Adding a revision means adding one entry.
//!
//! The trait's default methods are the base (1.0) message set; later revisions
//! override only what changed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::events::{KeyEvent, ScreenTransitionEvent};
use crate::protocol::messages::{
    KeyMessage, KeyRepeatMessage, MouseMoveMessage, ProxyMessage, ScreenEnterMessage,
};

/// A `major.minor` protocol revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProtocolVersion {
    pub major: u16,
    pub minor: u16,
}

impl ProtocolVersion {
    /// Base revision: key messages carry no button.
    pub const V1_0: ProtocolVersion = ProtocolVersion { major: 1, minor: 0 };
    /// Adds the physical key button to every key message.
    pub const V1_1: ProtocolVersion = ProtocolVersion { major: 1, minor: 1 };

    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::V1_1
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Returned when a `major.minor` string cannot be parsed.
#[derive(Debug, Error, PartialEq)]
#[error("invalid protocol version {0:?}; expected \"major.minor\"")]
pub struct InvalidVersion(pub String);

impl FromStr for ProtocolVersion {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| InvalidVersion(s.to_string()))?;
        let major = major.parse().map_err(|_| InvalidVersion(s.to_string()))?;
        let minor = minor.parse().map_err(|_| InvalidVersion(s.to_string()))?;
        Ok(Self { major, minor })
    }
}

/// Builds the outbound message for each local event under one protocol revision.
pub trait EmissionStrategy: Send + Sync {
    /// The revision this strategy implements.
    fn version(&self) -> ProtocolVersion;

    fn key_down(&self, event: &KeyEvent) -> ProxyMessage {
        ProxyMessage::KeyDown(KeyMessage {
            key: event.key,
            mask: event.mask,
            button: None,
        })
    }

    fn key_up(&self, event: &KeyEvent) -> ProxyMessage {
        ProxyMessage::KeyUp(KeyMessage {
            key: event.key,
            mask: event.mask,
            button: None,
        })
    }

    /// A missing repeat count is sent as a single repeat.
    fn key_repeat(&self, event: &KeyEvent) -> ProxyMessage {
        ProxyMessage::KeyRepeat(KeyRepeatMessage {
            key: event.key,
            mask: event.mask,
            count: event.repeat_count.unwrap_or(1),
            button: None,
        })
    }

    fn mouse_down(&self, button: i32) -> ProxyMessage {
        ProxyMessage::MouseDown { button }
    }

    fn mouse_up(&self, button: i32) -> ProxyMessage {
        ProxyMessage::MouseUp { button }
    }

    fn mouse_move(&self, x: i32, y: i32) -> ProxyMessage {
        ProxyMessage::MouseMove(MouseMoveMessage { x, y })
    }

    fn enter(&self, event: &ScreenTransitionEvent) -> ProxyMessage {
        ProxyMessage::ScreenEnter(ScreenEnterMessage {
            x: event.x,
            y: event.y,
            sequence_number: event.sequence_number,
            modifier_mask: event.modifier_mask,
        })
    }

    fn leave(&self) -> ProxyMessage {
        ProxyMessage::ScreenLeave
    }
}

/// Protocol 1.0: the base message set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtocolV1_0;

impl EmissionStrategy for ProtocolV1_0 {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::V1_0
    }
}

/// Protocol 1.1: key messages gain the physical button field.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtocolV1_1;

impl EmissionStrategy for ProtocolV1_1 {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::V1_1
    }

    fn key_down(&self, event: &KeyEvent) -> ProxyMessage {
        ProxyMessage::KeyDown(KeyMessage {
            key: event.key,
            mask: event.mask,
            button: Some(event.button),
        })
    }

    fn key_up(&self, event: &KeyEvent) -> ProxyMessage {
        ProxyMessage::KeyUp(KeyMessage {
            key: event.key,
            mask: event.mask,
            button: Some(event.button),
        })
    }

    fn key_repeat(&self, event: &KeyEvent) -> ProxyMessage {
        ProxyMessage::KeyRepeat(KeyRepeatMessage {
            key: event.key,
            mask: event.mask,
            count: event.repeat_count.unwrap_or(1),
            button: Some(event.button),
        })
    }
}

static STRATEGIES: [&dyn EmissionStrategy; 2] = [&ProtocolV1_0, &ProtocolV1_1];

/// Returns the strategy for `version`, or `None` if the revision is unknown.
pub fn strategy_for(version: ProtocolVersion) -> Option<&'static dyn EmissionStrategy> {
    let found = STRATEGIES.iter().copied().find(|s| s.version() == version);
    if found.is_none() {
        debug!("no emission strategy for protocol {version}");
    }
    found
}
