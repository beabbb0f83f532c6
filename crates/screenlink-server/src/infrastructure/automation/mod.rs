//! Automation infrastructure: concrete [`AutomationHooks`] implementations.
//!
//! - [`TracingHooks`] – logs every hook through `tracing`.  The binary
//!   registers it so an operator can watch focus changes and key presses.
//! - [`mock::RecordingHooks`] – records calls for tests.

pub mod mock;

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, trace};

use crate::application::bridge::AutomationHooks;

/// Hooks that log each notification.
///
/// Poll ticks are too frequent to log individually; every
/// `tick_log_every`-th tick is logged at `trace` level instead.
#[derive(Debug)]
pub struct TracingHooks {
    ticks: AtomicU64,
    tick_log_every: u64,
}

impl TracingHooks {
    pub fn new(tick_log_every: u64) -> Self {
        Self {
            ticks: AtomicU64::new(0),
            tick_log_every: tick_log_every.max(1),
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Default for TracingHooks {
    fn default() -> Self {
        Self::new(100_000)
    }
}

impl AutomationHooks for TracingHooks {
    fn on_key_press(&self, key: i32, mask: u32, button: u32) {
        debug!("hook: key press id={key}, mask=0x{mask:04x}, button=0x{button:04x}");
    }

    fn on_focus_change(&self, entered: bool) {
        info!(
            "hook: focus {}",
            if entered { "entered remote screen" } else { "left remote screen" }
        );
    }

    fn on_poll_tick(&self) {
        let n = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        if n % self.tick_log_every == 0 {
            trace!("hook: {n} poll ticks");
        }
    }

    fn on_shutdown(&self) {
        info!("hook: proxy shutting down after {} poll ticks", self.ticks());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_hooks_count_ticks() {
        let hooks = TracingHooks::new(2);

        hooks.on_poll_tick();
        hooks.on_poll_tick();
        hooks.on_poll_tick();

        assert_eq!(hooks.ticks(), 3);
    }

    #[test]
    fn test_zero_log_interval_is_clamped() {
        // Arrange / Act – a zero divisor must not panic on the first tick
        let hooks = TracingHooks::new(0);
        hooks.on_poll_tick();

        // Assert
        assert_eq!(hooks.ticks(), 1);
    }
}
