//! Recording automation hooks for tests.
//!
//! [`RecordingHooks`] remembers every key-press, focus and shutdown call and
//! counts poll ticks.  Paired with a [`RecordingStream`] on the same
//! [`Timeline`], it lets a test assert that a hook fired *before* the
//! matching message was written.
//!
//! [`RecordingStream`]: crate::infrastructure::stream::mock::RecordingStream

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use screenlink_core::ProxyMessage;

use crate::application::bridge::AutomationHooks;

/// One call made on [`AutomationHooks`], excluding poll ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookCall {
    KeyPress { key: i32, mask: u32, button: u32 },
    FocusChange { entered: bool },
    Shutdown,
}

/// Something a test observed, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observed {
    Hook(HookCall),
    Sent(ProxyMessage),
}

/// Shared ordered log of hook calls and written messages.
pub type Timeline = Arc<Mutex<Vec<Observed>>>;

/// [`AutomationHooks`] implementation that records what it receives.
#[derive(Default)]
pub struct RecordingHooks {
    calls: Mutex<Vec<HookCall>>,
    ticks: AtomicU64,
    timeline: Option<Timeline>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates hooks that also append each call to `timeline`.
    pub fn with_timeline(timeline: Timeline) -> Self {
        Self {
            timeline: Some(timeline),
            ..Self::default()
        }
    }

    /// Returns a copy of every non-tick call received so far.
    pub fn calls(&self) -> Vec<HookCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Number of `on_shutdown` calls received.
    pub fn shutdowns(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, HookCall::Shutdown))
            .count()
    }

    fn record(&self, call: HookCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        if let Some(timeline) = &self.timeline {
            timeline
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Observed::Hook(call));
        }
    }
}

impl AutomationHooks for RecordingHooks {
    fn on_key_press(&self, key: i32, mask: u32, button: u32) {
        self.record(HookCall::KeyPress { key, mask, button });
    }

    fn on_focus_change(&self, entered: bool) {
        self.record(HookCall::FocusChange { entered });
    }

    fn on_poll_tick(&self) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
    }

    fn on_shutdown(&self) {
        self.record(HookCall::Shutdown);
    }
}
