//! VersionedClientProxy: the local stand-in for one remote screen.
//!
//! Every local keyboard, mouse or focus event becomes exactly one outbound
//! message.  The field layout comes from the [`EmissionStrategy`] selected for
//! the peer's protocol revision; the proxy itself decides *when* the
//! automation bridge is told and how the cursor cache is updated.
//!
//! # Hook ordering
//!
//! | Operation    | Bridge hook                   | Cache                 |
//! |--------------|-------------------------------|-----------------------|
//! | `key_down`   | `on_key_press` before sending | –                     |
//! | `key_up`     | none                          | –                     |
//! | `key_repeat` | none                          | –                     |
//! | `mouse_move` | none                          | always written        |
//! | `enter`      | `on_focus_change(true)` first | set to entry position |
//! | `leave`      | `on_focus_change(false)` first| –                     |
//!
//! Only key-down is reported to the bridge; key-up and key-repeat are not.
//!
//! # Lifetime
//!
//! Construction spawns the proxy's [`PollerHandle`].  Dropping the proxy calls
//! `on_shutdown` once, then stops the poller and waits for its thread.

use std::sync::Arc;

use screenlink_core::{
    strategy_for, CursorPosition, EmissionStrategy, KeyEvent, MovePolicy, ProtocolVersion,
    ProxyMessage, ScreenTransitionEvent,
};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::application::context::{ProxyContext, StreamError};
use crate::application::poller::{PollerConfig, PollerHandle, PollerState};

/// Error type for proxy and harness operations.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The stream rejected the message.
    #[error("stream write failed: {0}")]
    Stream(#[from] StreamError),
    /// No emission strategy exists for the requested revision.
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(ProtocolVersion),
    /// The poller thread could not be started.
    #[error("failed to spawn poller thread: {0}")]
    PollerSpawn(#[source] std::io::Error),
}

/// Notifications posted to the external event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyEvent {
    /// A write to the peer failed; the connection is likely gone.
    WriteFailed {
        proxy: Uuid,
        name: String,
        error: String,
    },
    /// The proxy was dropped.
    Closed { proxy: Uuid, name: String },
}

/// Local representative of one remote input-receiving screen.
pub struct VersionedClientProxy {
    id: Uuid,
    name: String,
    context: Arc<ProxyContext>,
    strategy: &'static dyn EmissionStrategy,
    events: Option<UnboundedSender<ProxyEvent>>,
    poller: PollerHandle,
}

impl VersionedClientProxy {
    /// Creates a proxy for the screen called `name`, speaking `version`, and
    /// starts its poller.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::UnsupportedVersion`] for an unknown revision and
    /// [`ProxyError::PollerSpawn`] if the poller thread cannot be created.
    pub fn new(
        name: impl Into<String>,
        version: ProtocolVersion,
        context: Arc<ProxyContext>,
        poller_config: PollerConfig,
    ) -> Result<Self, ProxyError> {
        let name = name.into();
        let strategy = strategy_for(version).ok_or(ProxyError::UnsupportedVersion(version))?;
        let poller = PollerHandle::spawn(&name, Arc::clone(&context), poller_config)
            .map_err(ProxyError::PollerSpawn)?;

        let id = Uuid::new_v4();
        info!("client proxy \"{name}\" ({id}) created for protocol {version}");
        Ok(Self {
            id,
            name,
            context,
            strategy,
            events: None,
            poller,
        })
    }

    /// Attaches the queue that receives [`ProxyEvent`]s.
    pub fn with_event_queue(mut self, events: UnboundedSender<ProxyEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The remote screen's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> ProtocolVersion {
        self.strategy.version()
    }

    pub fn context(&self) -> &Arc<ProxyContext> {
        &self.context
    }

    pub fn poller_state(&self) -> PollerState {
        self.poller.state()
    }

    /// Sends key-down after reporting the press to the bridge.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Stream`] if the write fails.
    pub fn key_down(&self, key: i32, mask: u32, button: u32) -> Result<(), ProxyError> {
        debug!(
            "send key down to \"{}\" id={key}, mask=0x{mask:04x}, button=0x{button:04x}",
            self.name
        );
        self.context.bridge().notify_key_press(key, mask, button);
        self.send(&self.strategy.key_down(&KeyEvent::new(key, mask, button)))
    }

    /// Sends key-up.  The bridge is not told.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Stream`] if the write fails.
    pub fn key_up(&self, key: i32, mask: u32, button: u32) -> Result<(), ProxyError> {
        debug!(
            "send key up to \"{}\" id={key}, mask=0x{mask:04x}, button=0x{button:04x}",
            self.name
        );
        self.send(&self.strategy.key_up(&KeyEvent::new(key, mask, button)))
    }

    /// Sends key-repeat.  The bridge is not told.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Stream`] if the write fails.
    pub fn key_repeat(
        &self,
        key: i32,
        mask: u32,
        count: i32,
        button: u32,
    ) -> Result<(), ProxyError> {
        debug!(
            "send key repeat to \"{}\" id={key}, mask=0x{mask:04x}, count={count}, button=0x{button:04x}",
            self.name
        );
        let event = KeyEvent::new(key, mask, button).with_repeat(count);
        self.send(&self.strategy.key_repeat(&event))
    }

    pub fn mouse_down(&self, button: i32) -> Result<(), ProxyError> {
        debug!("send mouse down to \"{}\" id={button}", self.name);
        self.send(&self.strategy.mouse_down(button))
    }

    pub fn mouse_up(&self, button: i32) -> Result<(), ProxyError> {
        debug!("send mouse up to \"{}\" id={button}", self.name);
        self.send(&self.strategy.mouse_up(button))
    }

    /// Records (x, y) in the cursor cache and sends mouse-move, even if the
    /// position did not change.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Stream`] if the write fails; the cache still holds
    /// (x, y).
    pub fn mouse_move(&self, x: i32, y: i32) -> Result<(), ProxyError> {
        trace!("send mouse move to \"{}\" {x},{y}", self.name);
        self.context
            .cursor()
            .move_to(CursorPosition::new(x, y), MovePolicy::Always, |pos| {
                self.send(&self.strategy.mouse_move(pos.x, pos.y))
            })?;
        Ok(())
    }

    /// Sends screen-enter at (x, y) after updating the cache and telling the
    /// bridge focus arrived.
    ///
    /// `_for_screensaver` is part of the upstream call shape and unused here.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Stream`] if the write fails.
    pub fn enter(
        &self,
        x: i32,
        y: i32,
        sequence_number: u32,
        modifier_mask: u32,
        _for_screensaver: bool,
    ) -> Result<(), ProxyError> {
        debug!(
            "send enter to \"{}\", {x},{y} seq={sequence_number} mask=0x{modifier_mask:04x}",
            self.name
        );
        self.context.cursor().set(CursorPosition::new(x, y));
        self.context.bridge().notify_focus_change(true);
        let event = ScreenTransitionEvent::new(x, y, sequence_number, modifier_mask);
        self.send(&self.strategy.enter(&event))
    }

    /// Sends screen-leave after telling the bridge focus left.
    ///
    /// Returns `Ok(true)` once the message is written.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Stream`] if the write fails.
    pub fn leave(&self) -> Result<bool, ProxyError> {
        debug!("send leave to \"{}\"", self.name);
        self.context.bridge().notify_focus_change(false);
        self.send(&self.strategy.leave())?;
        Ok(true)
    }

    fn send(&self, msg: &ProxyMessage) -> Result<(), ProxyError> {
        self.context.send(msg).map_err(|e| {
            warn!("write to \"{}\" failed: {e}", self.name);
            self.post(ProxyEvent::WriteFailed {
                proxy: self.id,
                name: self.name.clone(),
                error: e.to_string(),
            });
            ProxyError::from(e)
        })
    }

    fn post(&self, event: ProxyEvent) {
        if let Some(events) = &self.events {
            // A closed queue only means nobody is listening any more.
            let _ = events.send(event);
        }
    }
}

impl Drop for VersionedClientProxy {
    fn drop(&mut self) {
        self.context.bridge().notify_shutdown();
        self.poller.stop();
        self.post(ProxyEvent::Closed {
            proxy: self.id,
            name: self.name.clone(),
        });
        info!("client proxy \"{}\" ({}) closed", self.name, self.id);
    }
}

impl std::fmt::Debug for VersionedClientProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionedClientProxy")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("version", &self.version())
            .field("poller", &self.poller)
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
