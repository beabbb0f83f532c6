//! AutomationBridge: optional hooks for an external consumer.
//!
//! An automated test harness (or any other plugin) can watch key presses and
//! focus changes and receive periodic poll ticks without the proxy knowing
//! its concrete type.  The consumer implements [`AutomationHooks`] and
//! registers it once on the [`AutomationBridge`] inside a
//! [`ProxyContext`](crate::application::context::ProxyContext).
//!
//! # Registration rules
//!
//! - Registration is set-once.  A second [`AutomationBridge::register`] fails
//!   with [`BridgeError::AlreadyRegistered`] and keeps the first hooks.
//! - Presence is looked up on every call, never cached by a proxy, so hooks
//!   registered after a proxy was built still see its later events.
//! - Hooks run on the caller's thread (or the poller thread for ticks) with no
//!   proxy lock held, so a hook may call back into the harness.

use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tracing::info;

/// Error type for bridge registration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("an automation bridge is already registered")]
    AlreadyRegistered,
}

/// The capability set an automation consumer provides.
///
/// All four hooks are registered together; each defaults to a no-op so a
/// consumer that only cares about ticks implements just [`on_poll_tick`].
///
/// [`on_poll_tick`]: AutomationHooks::on_poll_tick
pub trait AutomationHooks: Send + Sync {
    /// A key-down is about to be sent to the peer.
    fn on_key_press(&self, _key: i32, _mask: u32, _button: u32) {}

    /// The cursor is about to enter (`true`) or leave (`false`) the remote screen.
    fn on_focus_change(&self, _entered: bool) {}

    /// Called repeatedly from the proxy's poller thread.
    fn on_poll_tick(&self) {}

    /// A proxy is being destroyed.  Called once per proxy, before its poller stops.
    fn on_shutdown(&self) {}
}

/// Set-once holder for the registered hooks.
#[derive(Default)]
pub struct AutomationBridge {
    hooks: OnceLock<Arc<dyn AutomationHooks>>,
}

impl AutomationBridge {
    /// Creates an empty (inert) bridge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `hooks` for every proxy and poller sharing this bridge.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::AlreadyRegistered`] if hooks were registered
    /// before; the earlier registration stays active.
    pub fn register(&self, hooks: Arc<dyn AutomationHooks>) -> Result<(), BridgeError> {
        self.hooks
            .set(hooks)
            .map_err(|_| BridgeError::AlreadyRegistered)?;
        info!("automation bridge registered");
        Ok(())
    }

    /// Returns `true` once hooks have been registered.
    pub fn is_registered(&self) -> bool {
        self.hooks.get().is_some()
    }

    /// Returns the registered hooks, if any.
    pub fn hooks(&self) -> Option<&Arc<dyn AutomationHooks>> {
        self.hooks.get()
    }

    pub fn notify_key_press(&self, key: i32, mask: u32, button: u32) {
        if let Some(hooks) = self.hooks.get() {
            hooks.on_key_press(key, mask, button);
        }
    }

    pub fn notify_focus_change(&self, entered: bool) {
        if let Some(hooks) = self.hooks.get() {
            hooks.on_focus_change(entered);
        }
    }

    pub fn notify_shutdown(&self) {
        if let Some(hooks) = self.hooks.get() {
            hooks.on_shutdown();
        }
    }
}

impl std::fmt::Debug for AutomationBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutomationBridge")
            .field("registered", &self.is_registered())
            .finish()
    }
}
