//! BackgroundPoller: drives `on_poll_tick` for the lifetime of one proxy.
//!
//! # State machine
//!
//! ```text
//! Running ──stop()──► StopRequested ──thread exits──► Stopped
//! ```
//!
//! There is no paused state.  Each proxy owns exactly one [`PollerHandle`]
//! with its own stop signal; stopping one proxy never affects another.
//!
//! # Why a dedicated OS thread? (for beginners)
//!
//! With the default configuration the tick loop runs as fast as the scheduler
//! allows.  On a shared async executor that loop would starve the tasks that
//! write messages to the peer.  A dedicated thread is preempted like any
//! other, and `thread::yield_now()` between ticks hands the core back to the
//! emitting threads whenever they are runnable.
//!
//! # Stopping
//!
//! The stop signal is a `Mutex<bool>` paired with a `Condvar`.  [`PollerHandle::stop`]
//! sets the flag, wakes the thread if it is waiting, and then *joins* it, so
//! when `stop` returns no tick is running and none will start.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info};

use crate::application::context::ProxyContext;

/// Timing knobs for the tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Pause between ticks.  Zero means "yield and tick again".
    pub tick_interval: Duration,
    /// How long to wait before re-checking when no bridge is registered.
    pub idle_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::ZERO,
            idle_interval: Duration::from_millis(10),
        }
    }
}

/// Lifecycle state of a poller thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PollerState {
    Running = 0,
    StopRequested = 1,
    Stopped = 2,
}

impl From<u8> for PollerState {
    fn from(value: u8) -> Self {
        match value {
            0 => PollerState::Running,
            1 => PollerState::StopRequested,
            _ => PollerState::Stopped,
        }
    }
}

/// State shared between the handle and its thread.
struct Shared {
    stop: Mutex<bool>,
    wake: Condvar,
    state: AtomicU8,
    ticks: AtomicU64,
}

impl Shared {
    fn stop_requested(&self) -> bool {
        *self.stop.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleeps for up to `timeout`, returning early if a stop is requested.
    fn wait(&self, timeout: Duration) {
        let guard = self.stop.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = self
            .wake
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
    }

    fn request_stop(&self) {
        *self.stop.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.wake.notify_all();
    }

    fn set_state(&self, state: PollerState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

/// Owner of one running poller thread.
///
/// Dropping the handle stops the thread and waits for it to exit.
pub struct PollerHandle {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Spawns a poller thread named `screenlink-poll-{name}` that ticks the
    /// bridge in `context` until stopped.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be created.
    pub fn spawn(
        name: &str,
        context: Arc<ProxyContext>,
        config: PollerConfig,
    ) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            stop: Mutex::new(false),
            wake: Condvar::new(),
            state: AtomicU8::new(PollerState::Running as u8),
            ticks: AtomicU64::new(0),
        });

        let thread_shared = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name(format!("screenlink-poll-{name}"))
            .spawn(move || {
                run(&thread_shared, &context, config);
                thread_shared.set_state(PollerState::Stopped);
            })?;

        debug!("poller for \"{name}\" started");
        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    pub fn state(&self) -> PollerState {
        PollerState::from(self.shared.state.load(Ordering::SeqCst))
    }

    /// Number of completed `on_poll_tick` calls.
    pub fn ticks(&self) -> u64 {
        self.shared.ticks.load(Ordering::SeqCst)
    }

    /// Signals the thread to stop and waits for it to exit.
    ///
    /// Idempotent.  When called from the poller thread itself (a hook dropping
    /// its own proxy) the signal is sent but the join is skipped.
    pub fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        if self.state() == PollerState::Running {
            self.shared.set_state(PollerState::StopRequested);
        }
        self.shared.request_stop();

        if thread.thread().id() == thread::current().id() {
            debug!("poller stop requested from its own thread; not joining");
            return;
        }

        if thread.join().is_err() {
            error!("poller thread panicked outside of a tick");
        }
        self.shared.set_state(PollerState::Stopped);
        info!("poller stopped after {} tick(s)", self.ticks());
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for PollerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollerHandle")
            .field("state", &self.state())
            .field("ticks", &self.ticks())
            .finish()
    }
}

fn run(shared: &Shared, context: &ProxyContext, config: PollerConfig) {
    while !shared.stop_requested() {
        let Some(hooks) = context.bridge().hooks() else {
            shared.wait(config.idle_interval);
            continue;
        };

        // A panicking hook must not leave the thread in an unknown state.
        if panic::catch_unwind(AssertUnwindSafe(|| hooks.on_poll_tick())).is_err() {
            error!("on_poll_tick panicked; poller terminating");
            return;
        }
        shared.ticks.fetch_add(1, Ordering::SeqCst);

        if config.tick_interval.is_zero() {
            thread::yield_now();
        } else {
            shared.wait(config.tick_interval);
        }
    }
}
