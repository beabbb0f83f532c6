use serde::{Deserialize, Serialize};

/// A keyboard event as seen by the local side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Platform-independent key identifier.
    pub key: i32,
    /// Modifier mask active when the event happened.
    pub mask: u32,
    /// Physical key button.
    pub button: u32,
    /// Only set for auto-repeat events.
    pub repeat_count: Option<i32>,
}

impl KeyEvent {
    pub fn new(key: i32, mask: u32, button: u32) -> Self {
        Self {
            key,
            mask,
            button,
            repeat_count: None,
        }
    }

    pub fn with_repeat(mut self, count: i32) -> Self {
        self.repeat_count = Some(count);
        self
    }
}

/// The cursor crossing onto the remote screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenTransitionEvent {
    pub x: i32,
    pub y: i32,
    pub sequence_number: u32,
    pub modifier_mask: u32,
}

impl ScreenTransitionEvent {
    pub fn new(x: i32, y: i32, sequence_number: u32, modifier_mask: u32) -> Self {
        Self {
            x,
            y,
            sequence_number,
            modifier_mask,
        }
    }
}
