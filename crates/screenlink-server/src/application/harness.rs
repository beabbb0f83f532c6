//! Harness: instrumentation entry points for automated input injection.
//!
//! A test harness drives the remote screen directly through these calls
//! instead of going through a [`VersionedClientProxy`].  They write to the
//! same stream and share the same cursor cache, but differ from the
//! production path in two ways:
//!
//! - **No bridge hooks.**  Injected input is not reported back to the
//!   automation consumer that injected it.
//! - **Mouse moves are deduplicated.**  A move to the cached position is
//!   skipped, and the cache only advances when the write succeeds.
//!
//! [`VersionedClientProxy`]: crate::application::client_proxy::VersionedClientProxy

use std::sync::Arc;

use screenlink_core::protocol::version::ProtocolV1_1;
use screenlink_core::{
    strategy_for, CursorPosition, EmissionStrategy, KeyEvent, MoveOutcome, MovePolicy,
    ProtocolVersion, ProxyMessage, ScreenTransitionEvent,
};
use tracing::{debug, trace};

use crate::application::client_proxy::ProxyError;
use crate::application::context::ProxyContext;

/// Values the harness uses for screen-enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    pub enter_sequence: u32,
    pub enter_modifier_mask: u32,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            enter_sequence: 25,
            enter_modifier_mask: 8912,
        }
    }
}

/// Injection entry points bound to one [`ProxyContext`].
pub struct Harness {
    context: Arc<ProxyContext>,
    strategy: &'static dyn EmissionStrategy,
    config: HarnessConfig,
}

impl Harness {
    /// Creates a harness that emits the v1.1 field layout.
    pub fn new(context: Arc<ProxyContext>, config: HarnessConfig) -> Self {
        Self {
            context,
            strategy: &ProtocolV1_1,
            config,
        }
    }

    /// Creates a harness that emits the layout for `version`.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::UnsupportedVersion`] for an unknown revision.
    pub fn with_version(
        context: Arc<ProxyContext>,
        config: HarnessConfig,
        version: ProtocolVersion,
    ) -> Result<Self, ProxyError> {
        let strategy = strategy_for(version).ok_or(ProxyError::UnsupportedVersion(version))?;
        Ok(Self {
            context,
            strategy,
            config,
        })
    }

    pub fn version(&self) -> ProtocolVersion {
        self.strategy.version()
    }

    /// Injects a key-down.
    pub fn press_key(&self, key: i32, mask: u32, button: u32) -> Result<(), ProxyError> {
        debug!("inject key down id={key}, mask=0x{mask:04x}, button=0x{button:04x}");
        self.send(&self.strategy.key_down(&KeyEvent::new(key, mask, button)))
    }

    /// Injects a key-up.
    pub fn unpress_key(&self, key: i32, mask: u32, button: u32) -> Result<(), ProxyError> {
        debug!("inject key up id={key}, mask=0x{mask:04x}, button=0x{button:04x}");
        self.send(&self.strategy.key_up(&KeyEvent::new(key, mask, button)))
    }

    /// Injects screen-enter at the cached cursor position.
    pub fn enter_screen(&self) -> Result<(), ProxyError> {
        let pos = self.context.cursor().get();
        debug!(
            "inject enter at {},{} seq={}",
            pos.x, pos.y, self.config.enter_sequence
        );
        let event = ScreenTransitionEvent::new(
            pos.x,
            pos.y,
            self.config.enter_sequence,
            self.config.enter_modifier_mask,
        );
        self.send(&self.strategy.enter(&event))
    }

    pub fn leave_screen(&self) -> Result<(), ProxyError> {
        debug!("inject leave");
        self.send(&self.strategy.leave())
    }

    pub fn click_mouse(&self, button: i32) -> Result<(), ProxyError> {
        debug!("inject mouse down id={button}");
        self.send(&self.strategy.mouse_down(button))
    }

    pub fn unclick_mouse(&self, button: i32) -> Result<(), ProxyError> {
        debug!("inject mouse up id={button}");
        self.send(&self.strategy.mouse_up(button))
    }

    /// Injects a mouse-move unless the cursor is already at (x, y).
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Stream`] if the write fails; the cache keeps its
    /// previous position in that case.
    pub fn move_mouse(&self, x: i32, y: i32) -> Result<MoveOutcome, ProxyError> {
        let outcome = self.context.cursor().move_to(
            CursorPosition::new(x, y),
            MovePolicy::SuppressDuplicates,
            |pos| self.send(&self.strategy.mouse_move(pos.x, pos.y)),
        )?;
        if outcome == MoveOutcome::Suppressed {
            trace!("inject mouse move {x},{y} suppressed");
        }
        Ok(outcome)
    }

    /// The cursor cache's current position.
    pub fn mouse_position(&self) -> CursorPosition {
        self.context.cursor().get()
    }

    fn send(&self, msg: &ProxyMessage) -> Result<(), ProxyError> {
        Ok(self.context.send(msg)?)
    }
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("version", &self.version())
            .field("config", &self.config)
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::context::{MockMessageStream, StreamError};
    use screenlink_core::protocol::messages::{KeyMessage, MouseMoveMessage, ScreenEnterMessage};

    fn harness_with(stream: MockMessageStream) -> Harness {
        let context = Arc::new(ProxyContext::new(Arc::new(stream)));
        Harness::new(context, HarnessConfig::default())
    }

    #[test]
    fn test_default_harness_uses_v1_1_layout() {
        let mut stream = MockMessageStream::new();
        stream
            .expect_write_message()
            .withf(|msg| {
                *msg == ProxyMessage::KeyDown(KeyMessage {
                    key: 65,
                    mask: 0,
                    button: Some(1),
                })
            })
            .times(1)
            .returning(|_| Ok(()));
        let harness = harness_with(stream);

        harness.press_key(65, 0, 1).unwrap();

        assert_eq!(harness.version(), ProtocolVersion::V1_1);
    }

    #[test]
    fn test_enter_screen_uses_cached_position_and_fixed_values() {
        // Arrange – the cache starts at its default (1280, 562)
        let mut stream = MockMessageStream::new();
        stream
            .expect_write_message()
            .withf(|msg| {
                *msg == ProxyMessage::ScreenEnter(ScreenEnterMessage {
                    x: 1280,
                    y: 562,
                    sequence_number: 25,
                    modifier_mask: 8912,
                })
            })
            .times(1)
            .returning(|_| Ok(()));
        let harness = harness_with(stream);

        // Act / Assert
        harness.enter_screen().unwrap();
    }

    #[test]
    fn test_move_to_cached_position_is_suppressed() {
        // Arrange – no write expected at all
        let harness = harness_with(MockMessageStream::new());

        // Act
        let outcome = harness.move_mouse(1280, 562).unwrap();

        // Assert
        assert_eq!(outcome, MoveOutcome::Suppressed);
    }

    #[test]
    fn test_move_to_new_position_emits_and_updates_cache() {
        let mut stream = MockMessageStream::new();
        stream
            .expect_write_message()
            .withf(|msg| *msg == ProxyMessage::MouseMove(MouseMoveMessage { x: 10, y: 20 }))
            .times(1)
            .returning(|_| Ok(()));
        let harness = harness_with(stream);

        let first = harness.move_mouse(10, 20).unwrap();
        let second = harness.move_mouse(10, 20).unwrap();

        assert_eq!(first, MoveOutcome::Emitted);
        assert_eq!(second, MoveOutcome::Suppressed);
        assert_eq!(harness.mouse_position(), CursorPosition::new(10, 20));
    }

    #[test]
    fn test_failed_move_leaves_cache_unchanged() {
        // Arrange
        let mut stream = MockMessageStream::new();
        stream
            .expect_write_message()
            .returning(|_| Err(StreamError::Closed));
        let harness = harness_with(stream);

        // Act
        let result = harness.move_mouse(5, 5);

        // Assert
        assert!(matches!(result, Err(ProxyError::Stream(StreamError::Closed))));
        assert_eq!(harness.mouse_position(), CursorPosition::new(1280, 562));
    }

    #[test]
    fn test_with_version_rejects_unknown_revision() {
        let context = Arc::new(ProxyContext::new(Arc::new(MockMessageStream::new())));

        let result =
            Harness::with_version(context, HarnessConfig::default(), ProtocolVersion::new(2, 0));

        assert!(matches!(result, Err(ProxyError::UnsupportedVersion(_))));
    }

    #[test]
    fn test_v1_0_harness_drops_button() {
        let mut stream = MockMessageStream::new();
        stream
            .expect_write_message()
            .withf(|msg| {
                *msg == ProxyMessage::KeyUp(KeyMessage {
                    key: 66,
                    mask: 2,
                    button: None,
                })
            })
            .times(1)
            .returning(|_| Ok(()));
        let context = Arc::new(ProxyContext::new(Arc::new(stream)));
        let harness =
            Harness::with_version(context, HarnessConfig::default(), ProtocolVersion::V1_0)
                .unwrap();

        harness.unpress_key(66, 2, 9).unwrap();
    }
}
