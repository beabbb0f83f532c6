//! All outbound ScreenLink protocol message types.
//!
//! Each message is identified on the wire by a four-character ASCII code.
//! Field values are carried as plain integers; the frame layout lives in
//! [`crate::protocol::codec`].

use serde::{Deserialize, Serialize};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Size of the big-endian length prefix in front of every frame.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Size of the ASCII message code at the start of every payload.
pub const CODE_SIZE: usize = 4;

// ── Message codes ─────────────────────────────────────────────────────────────

/// All message codes this side of the protocol emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageCode {
    // Data messages
    KeyDown,
    KeyUp,
    KeyRepeat,
    MouseDown,
    MouseUp,
    MouseMove,
    // Command messages
    ScreenEnter,
    ScreenLeave,
}

impl MessageCode {
    /// Returns the four ASCII bytes that identify this message on the wire.
    pub fn as_bytes(self) -> &'static [u8; CODE_SIZE] {
        match self {
            MessageCode::KeyDown => b"DKDN",
            MessageCode::KeyUp => b"DKUP",
            MessageCode::KeyRepeat => b"DKRP",
            MessageCode::MouseDown => b"DMDN",
            MessageCode::MouseUp => b"DMUP",
            MessageCode::MouseMove => b"DMMV",
            MessageCode::ScreenEnter => b"CINN",
            MessageCode::ScreenLeave => b"COUT",
        }
    }
}

impl TryFrom<[u8; CODE_SIZE]> for MessageCode {
    type Error = ();

    fn try_from(value: [u8; CODE_SIZE]) -> Result<Self, Self::Error> {
        match &value {
            b"DKDN" => Ok(MessageCode::KeyDown),
            b"DKUP" => Ok(MessageCode::KeyUp),
            b"DKRP" => Ok(MessageCode::KeyRepeat),
            b"DMDN" => Ok(MessageCode::MouseDown),
            b"DMUP" => Ok(MessageCode::MouseUp),
            b"DMMV" => Ok(MessageCode::MouseMove),
            b"CINN" => Ok(MessageCode::ScreenEnter),
            b"COUT" => Ok(MessageCode::ScreenLeave),
            _ => Err(()),
        }
    }
}

// ── Per-message payload structs ───────────────────────────────────────────────

/// Payload shared by key-down and key-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMessage {
    /// Platform-independent key identifier.
    pub key: i32,
    /// Active modifier mask at the time of the event.
    pub mask: u32,
    /// Physical key button.  `None` for protocol 1.0, which has no button field.
    pub button: Option<u32>,
}

/// KEY_REPEAT: auto-repeat of a held key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRepeatMessage {
    pub key: i32,
    pub mask: u32,
    /// Number of repeats folded into this message.
    pub count: i32,
    /// Physical key button.  `None` for protocol 1.0.
    pub button: Option<u32>,
}

/// MOUSE_MOVE: absolute cursor position in the remote screen's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseMoveMessage {
    pub x: i32,
    pub y: i32,
}

/// SCREEN_ENTER: the cursor entered the remote screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenEnterMessage {
    /// Entry X position.
    pub x: i32,
    /// Entry Y position.
    pub y: i32,
    /// Sequence number the peer echoes back in later replies.
    pub sequence_number: u32,
    /// Modifier keys held down at the moment of entry.
    pub modifier_mask: u32,
}

// ── Top-level message enum ────────────────────────────────────────────────────

/// Every message a client proxy can emit, discriminated by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyMessage {
    KeyDown(KeyMessage),
    KeyUp(KeyMessage),
    KeyRepeat(KeyRepeatMessage),
    MouseDown { button: i32 },
    MouseUp { button: i32 },
    MouseMove(MouseMoveMessage),
    ScreenEnter(ScreenEnterMessage),
    ScreenLeave,
}

impl ProxyMessage {
    /// Returns the [`MessageCode`] discriminant for this message.
    pub fn code(&self) -> MessageCode {
        match self {
            ProxyMessage::KeyDown(_) => MessageCode::KeyDown,
            ProxyMessage::KeyUp(_) => MessageCode::KeyUp,
            ProxyMessage::KeyRepeat(_) => MessageCode::KeyRepeat,
            ProxyMessage::MouseDown { .. } => MessageCode::MouseDown,
            ProxyMessage::MouseUp { .. } => MessageCode::MouseUp,
            ProxyMessage::MouseMove(_) => MessageCode::MouseMove,
            ProxyMessage::ScreenEnter(_) => MessageCode::ScreenEnter,
            ProxyMessage::ScreenLeave => MessageCode::ScreenLeave,
        }
    }
}
