//! Binary codec for encoding and decoding ScreenLink protocol frames.
//!
//! Wire format:
//! ```text
//! [payload_len:4][code:4][fields:N]
//! ```
//! `payload_len` counts the code and the fields.  All multi-byte integers are
//! big-endian.  Fields are fixed width; values wider than their field are
//! truncated on encode, matching what the peer reads back.
//!
//! | Message      | Fields (bytes)                          |
//! |--------------|-----------------------------------------|
//! | `DKDN`/`DKUP`| key 2, mask 2, button 2 (1.0: no button)|
//! | `DKRP`       | key 2, mask 2, count 2, button 2        |
//! | `DMDN`/`DMUP`| button 1                                |
//! | `DMMV`       | x 2, y 2                                |
//! | `CINN`       | x 2, y 2, seq 4, mask 2                 |
//! | `COUT`       | –                                       |

use crate::protocol::messages::{
    KeyMessage, KeyRepeatMessage, MessageCode, MouseMoveMessage, ProxyMessage,
    ScreenEnterMessage, CODE_SIZE, FRAME_HEADER_SIZE,
};
use thiserror::Error;

/// Errors that can occur during frame encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The four-byte message code is not one this codec knows.
    #[error("unknown message code: {0:?}")]
    UnknownMessageCode([u8; CODE_SIZE]),

    /// The payload could not be parsed (wrong field count for the code, etc.).
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The length prefix does not match the data available.
    #[error("payload length mismatch: header says {declared}, available is {available}")]
    PayloadLengthMismatch { declared: usize, available: usize },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`ProxyMessage`] into one length-prefixed frame.
///
/// # Errors
///
/// Returns [`ProtocolError`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use screenlink_core::protocol::{decode_message, encode_message};
/// use screenlink_core::protocol::messages::{MouseMoveMessage, ProxyMessage};
///
/// let msg = ProxyMessage::MouseMove(MouseMoveMessage { x: 100, y: -4 });
/// let bytes = encode_message(&msg).unwrap();
/// let (decoded, consumed) = decode_message(&bytes).unwrap();
/// assert_eq!(decoded, msg);
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_message(msg: &ProxyMessage) -> Result<Vec<u8>, ProtocolError> {
    let payload = encode_payload(msg);

    let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decodes one [`ProxyMessage`] from the beginning of `bytes`.
///
/// Returns the decoded message and the total number of bytes consumed
/// (length prefix + payload), so the caller can advance their read cursor.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the bytes are malformed or truncated.
pub fn decode_message(bytes: &[u8]) -> Result<(ProxyMessage, usize), ProtocolError> {
    if bytes.len() < FRAME_HEADER_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: FRAME_HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let payload_len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let total_needed = FRAME_HEADER_SIZE + payload_len;
    if bytes.len() < total_needed {
        return Err(ProtocolError::PayloadLengthMismatch {
            declared: payload_len,
            available: bytes.len() - FRAME_HEADER_SIZE,
        });
    }

    let payload = &bytes[FRAME_HEADER_SIZE..total_needed];
    if payload.len() < CODE_SIZE {
        return Err(ProtocolError::MalformedPayload(format!(
            "payload of {} bytes cannot hold a message code",
            payload.len()
        )));
    }

    let raw_code = [payload[0], payload[1], payload[2], payload[3]];
    let code =
        MessageCode::try_from(raw_code).map_err(|_| ProtocolError::UnknownMessageCode(raw_code))?;
    let msg = decode_fields(code, &payload[CODE_SIZE..])?;
    Ok((msg, total_needed))
}

// ── Payload encoding ──────────────────────────────────────────────────────────

fn encode_payload(msg: &ProxyMessage) -> Vec<u8> {
    let mut buf = Vec::with_capacity(CODE_SIZE + 10);
    buf.extend_from_slice(msg.code().as_bytes());
    match msg {
        ProxyMessage::KeyDown(m) | ProxyMessage::KeyUp(m) => encode_key(&mut buf, m),
        ProxyMessage::KeyRepeat(m) => encode_key_repeat(&mut buf, m),
        ProxyMessage::MouseDown { button } | ProxyMessage::MouseUp { button } => {
            buf.push(*button as u8)
        }
        ProxyMessage::MouseMove(m) => {
            write_i16(&mut buf, m.x);
            write_i16(&mut buf, m.y);
        }
        ProxyMessage::ScreenEnter(m) => encode_screen_enter(&mut buf, m),
        ProxyMessage::ScreenLeave => {} // code only
    }
    buf
}

fn encode_key(buf: &mut Vec<u8>, m: &KeyMessage) {
    write_u16(buf, m.key as u32);
    write_u16(buf, m.mask);
    if let Some(button) = m.button {
        write_u16(buf, button);
    }
}

fn encode_key_repeat(buf: &mut Vec<u8>, m: &KeyRepeatMessage) {
    write_u16(buf, m.key as u32);
    write_u16(buf, m.mask);
    write_u16(buf, m.count as u32);
    if let Some(button) = m.button {
        write_u16(buf, button);
    }
}

fn encode_screen_enter(buf: &mut Vec<u8>, m: &ScreenEnterMessage) {
    write_i16(buf, m.x);
    write_i16(buf, m.y);
    buf.extend_from_slice(&m.sequence_number.to_be_bytes());
    write_u16(buf, m.modifier_mask);
}

// ── Payload decoding ──────────────────────────────────────────────────────────

fn decode_fields(code: MessageCode, p: &[u8]) -> Result<ProxyMessage, ProtocolError> {
    match code {
        MessageCode::KeyDown => decode_key(p, "KeyDown").map(ProxyMessage::KeyDown),
        MessageCode::KeyUp => decode_key(p, "KeyUp").map(ProxyMessage::KeyUp),
        MessageCode::KeyRepeat => decode_key_repeat(p).map(ProxyMessage::KeyRepeat),
        MessageCode::MouseDown => {
            require_exact(p, 1, "MouseDown")?;
            Ok(ProxyMessage::MouseDown { button: i32::from(p[0]) })
        }
        MessageCode::MouseUp => {
            require_exact(p, 1, "MouseUp")?;
            Ok(ProxyMessage::MouseUp { button: i32::from(p[0]) })
        }
        MessageCode::MouseMove => {
            require_exact(p, 4, "MouseMove")?;
            Ok(ProxyMessage::MouseMove(MouseMoveMessage {
                x: read_i16(p, 0),
                y: read_i16(p, 2),
            }))
        }
        MessageCode::ScreenEnter => {
            require_exact(p, 10, "ScreenEnter")?;
            Ok(ProxyMessage::ScreenEnter(ScreenEnterMessage {
                x: read_i16(p, 0),
                y: read_i16(p, 2),
                sequence_number: u32::from_be_bytes([p[4], p[5], p[6], p[7]]),
                modifier_mask: read_u16(p, 8),
            }))
        }
        MessageCode::ScreenLeave => {
            require_exact(p, 0, "ScreenLeave")?;
            Ok(ProxyMessage::ScreenLeave)
        }
    }
}

fn decode_key(p: &[u8], context: &str) -> Result<KeyMessage, ProtocolError> {
    // 4 bytes: protocol 1.0 (key, mask); 6 bytes: 1.1 (key, mask, button)
    let button = match p.len() {
        4 => None,
        6 => Some(read_u16(p, 4)),
        n => {
            return Err(ProtocolError::MalformedPayload(format!(
                "{context}: expected 4 or 6 field bytes, got {n}"
            )))
        }
    };
    Ok(KeyMessage {
        key: read_u16(p, 0) as i32,
        mask: read_u16(p, 2),
        button,
    })
}

fn decode_key_repeat(p: &[u8]) -> Result<KeyRepeatMessage, ProtocolError> {
    let button = match p.len() {
        6 => None,
        8 => Some(read_u16(p, 6)),
        n => {
            return Err(ProtocolError::MalformedPayload(format!(
                "KeyRepeat: expected 6 or 8 field bytes, got {n}"
            )))
        }
    };
    Ok(KeyRepeatMessage {
        key: read_u16(p, 0) as i32,
        mask: read_u16(p, 2),
        count: read_u16(p, 4) as i32,
        button,
    })
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn require_exact(buf: &[u8], expected: usize, context: &str) -> Result<(), ProtocolError> {
    if buf.len() != expected {
        Err(ProtocolError::MalformedPayload(format!(
            "{context}: expected {expected} field bytes, got {}",
            buf.len()
        )))
    } else {
        Ok(())
    }
}

/// Writes the low 16 bits of `value`.
fn write_u16(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&(value as u16).to_be_bytes());
}

/// Writes the low 16 bits of a signed coordinate.
fn write_i16(buf: &mut Vec<u8>, value: i32) {
    buf.extend_from_slice(&(value as i16).to_be_bytes());
}

// Callers check lengths before reading.
fn read_u16(buf: &[u8], offset: usize) -> u32 {
    u32::from(u16::from_be_bytes([buf[offset], buf[offset + 1]]))
}

fn read_i16(buf: &[u8], offset: usize) -> i32 {
    i32::from(i16::from_be_bytes([buf[offset], buf[offset + 1]]))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_frame_layout() {
        // Arrange
        let msg = ProxyMessage::KeyDown(KeyMessage {
            key: 65,
            mask: 0x0002,
            button: Some(38),
        });

        // Act
        let bytes = encode_message(&msg).unwrap();

        // Assert – 4-byte length, "DKDN", then three 2-byte fields
        assert_eq!(
            bytes,
            vec![0, 0, 0, 10, b'D', b'K', b'D', b'N', 0, 65, 0, 2, 0, 38]
        );
    }

    #[test]
    fn test_key_down_without_button_is_shorter() {
        let msg = ProxyMessage::KeyDown(KeyMessage {
            key: 65,
            mask: 0,
            button: None,
        });

        let bytes = encode_message(&msg).unwrap();

        assert_eq!(bytes.len(), FRAME_HEADER_SIZE + CODE_SIZE + 4);
        let (decoded, _) = decode_message(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_screen_leave_is_code_only() {
        let bytes = encode_message(&ProxyMessage::ScreenLeave).unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 4, b'C', b'O', b'U', b'T']);
    }

    #[test]
    fn test_screen_enter_layout_has_four_byte_sequence() {
        let msg = ProxyMessage::ScreenEnter(ScreenEnterMessage {
            x: 10,
            y: 20,
            sequence_number: 0x0102_0304,
            modifier_mask: 8912,
        });

        let bytes = encode_message(&msg).unwrap();

        assert_eq!(&bytes[4..8], b"CINN");
        assert_eq!(&bytes[12..16], &[1, 2, 3, 4]);
        assert_eq!(&bytes[16..18], &8912u16.to_be_bytes());
        assert_eq!(decode_message(&bytes).unwrap().0, msg);
    }

    #[test]
    fn test_negative_coordinates_survive_the_wire() {
        let msg = ProxyMessage::MouseMove(MouseMoveMessage { x: -1920, y: -1 });
        let (decoded, _) = decode_message(&encode_message(&msg).unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_wide_key_values_are_truncated_to_field_width() {
        let msg = ProxyMessage::KeyUp(KeyMessage {
            key: 0x1_0041,
            mask: 0xFFFF_0001,
            button: Some(7),
        });

        let (decoded, _) = decode_message(&encode_message(&msg).unwrap()).unwrap();

        assert_eq!(
            decoded,
            ProxyMessage::KeyUp(KeyMessage {
                key: 0x41,
                mask: 1,
                button: Some(7),
            })
        );
    }

    #[test]
    fn test_decode_rejects_short_header() {
        assert_eq!(
            decode_message(&[0, 0]),
            Err(ProtocolError::InsufficientData {
                needed: 4,
                available: 2
            })
        );
    }

    #[test]
    fn test_decode_rejects_truncated_payload() {
        let bytes = encode_message(&ProxyMessage::MouseMove(MouseMoveMessage { x: 1, y: 1 }))
            .unwrap();
        let result = decode_message(&bytes[..bytes.len() - 1]);
        assert!(matches!(
            result,
            Err(ProtocolError::PayloadLengthMismatch { declared: 8, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_code() {
        let bytes = [0, 0, 0, 4, b'Q', b'I', b'N', b'F'];
        assert_eq!(
            decode_message(&bytes),
            Err(ProtocolError::UnknownMessageCode(*b"QINF"))
        );
    }

    #[test]
    fn test_decode_rejects_wrong_field_count() {
        let bytes = [0, 0, 0, 6, b'D', b'M', b'D', b'N', 1, 2];
        assert!(matches!(
            decode_message(&bytes),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_decode_consumes_only_first_frame() {
        // Arrange – two frames back to back
        let mut bytes = encode_message(&ProxyMessage::MouseDown { button: 1 }).unwrap();
        let first_len = bytes.len();
        bytes.extend(encode_message(&ProxyMessage::MouseUp { button: 1 }).unwrap());

        // Act
        let (first, consumed) = decode_message(&bytes).unwrap();
        let (second, _) = decode_message(&bytes[consumed..]).unwrap();

        // Assert
        assert_eq!(consumed, first_len);
        assert_eq!(first, ProxyMessage::MouseDown { button: 1 });
        assert_eq!(second, ProxyMessage::MouseUp { button: 1 });
    }
}
