//! Cursor-position cache shared by every path that emits mouse moves.
//!
//! # Two move policies, one cache (for beginners)
//!
//! The proxy forwards real cursor motion: every move the user makes is
//! meaningful, so it is always sent ([`MovePolicy::Always`]).
//!
//! An automation harness instead issues "make sure the cursor is at (x, y)"
//! requests, often many times in a row.  Sending a message for each would be
//! wasteful, so the harness skips the move when the cache already holds the
//! target ([`MovePolicy::SuppressDuplicates`]).
//!
//! Both policies read and write the *same* cache: a harness move changes what
//! the next production move is compared against, and vice versa.
//!
//! # Thread safety
//!
//! The position lives behind a `Mutex`.  [`CursorPositionCache::move_to`]
//! compares and claims the target under the lock, then releases it before
//! emitting.  Two threads asking for the same target can never both decide
//! the move is new, and a slow peer write never blocks readers of the cache.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

/// Position assumed before anything has been sent to the peer.
pub const DEFAULT_CURSOR_POSITION: CursorPosition = CursorPosition { x: 1280, y: 562 };

/// An absolute cursor position on the remote screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CursorPosition {
    pub x: i32,
    pub y: i32,
}

impl CursorPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Whether a move equal to the cached position is still emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePolicy {
    /// Production path: write the cache, then always emit.
    Always,
    /// Automation path: skip the emission when the cache already matches.
    SuppressDuplicates,
}

/// What [`CursorPositionCache::move_to`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// A move message was handed to the emitter.
    Emitted,
    /// The target equalled the cache; nothing was emitted.
    Suppressed,
}

/// The last cursor position told to the peer.
#[derive(Debug)]
pub struct CursorPositionCache {
    inner: Mutex<CursorPosition>,
}

impl CursorPositionCache {
    /// Creates a cache holding `initial`.
    pub fn new(initial: CursorPosition) -> Self {
        Self {
            inner: Mutex::new(initial),
        }
    }

    /// Returns the cached position.
    pub fn get(&self) -> CursorPosition {
        *self.lock()
    }

    /// Overwrites the cached position without emitting anything.
    ///
    /// Used when the peer learns the position by other means (screen enter).
    pub fn set(&self, position: CursorPosition) {
        *self.lock() = position;
    }

    /// Moves the cursor to `target` under `policy`, calling `emit` to send the
    /// move message.
    ///
    /// - [`MovePolicy::Always`] stores `target` and then emits, so the cache
    ///   follows real motion even if the write fails.
    /// - [`MovePolicy::SuppressDuplicates`] returns
    ///   [`MoveOutcome::Suppressed`] without calling `emit` when the cache
    ///   already equals `target`.  Otherwise it claims `target`, emits, and on
    ///   failure restores the previous position unless another mover has
    ///   replaced `target` in the meantime.
    ///
    /// `emit` runs with the cache unlocked.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `emit`.
    pub fn move_to<E, F>(
        &self,
        target: CursorPosition,
        policy: MovePolicy,
        emit: F,
    ) -> Result<MoveOutcome, E>
    where
        F: FnOnce(CursorPosition) -> Result<(), E>,
    {
        let previous = {
            let mut current = self.lock();
            if policy == MovePolicy::SuppressDuplicates && *current == target {
                return Ok(MoveOutcome::Suppressed);
            }
            std::mem::replace(&mut *current, target)
        };

        if let Err(e) = emit(target) {
            if policy == MovePolicy::SuppressDuplicates {
                let mut current = self.lock();
                if *current == target {
                    *current = previous;
                }
            }
            return Err(e);
        }
        Ok(MoveOutcome::Emitted)
    }

    // A poisoned lock still holds a valid position; keep using it.
    fn lock(&self) -> MutexGuard<'_, CursorPosition> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CursorPositionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CURSOR_POSITION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{mpsc, Arc};
    use std::thread;
    use std::time::Duration;

    fn ok(_: CursorPosition) -> Result<(), ()> {
        Ok(())
    }

    #[test]
    fn test_default_cache_starts_at_default_position() {
        assert_eq!(CursorPositionCache::default().get(), DEFAULT_CURSOR_POSITION);
    }

    #[test]
    fn test_always_policy_emits_even_when_unchanged() {
        // Arrange
        let cache = CursorPositionCache::new(CursorPosition::new(100, 100));
        let mut emitted = Vec::new();

        // Act
        let outcome = cache.move_to(CursorPosition::new(100, 100), MovePolicy::Always, |p| {
            emitted.push(p);
            Ok::<(), ()>(())
        });

        // Assert
        assert_eq!(outcome, Ok(MoveOutcome::Emitted));
        assert_eq!(emitted, vec![CursorPosition::new(100, 100)]);
    }

    #[test]
    fn test_suppress_policy_skips_duplicate() {
        // Arrange
        let cache = CursorPositionCache::new(CursorPosition::new(5, 6));
        let mut calls = 0;

        // Act
        let outcome = cache.move_to(CursorPosition::new(5, 6), MovePolicy::SuppressDuplicates, |_| {
            calls += 1;
            Ok::<(), ()>(())
        });

        // Assert
        assert_eq!(outcome, Ok(MoveOutcome::Suppressed));
        assert_eq!(calls, 0, "emit must not run for a duplicate move");
    }

    #[test]
    fn test_suppress_policy_emits_and_updates_on_change() {
        let cache = CursorPositionCache::new(CursorPosition::new(0, 0));

        let outcome = cache.move_to(CursorPosition::new(7, 8), MovePolicy::SuppressDuplicates, ok);

        assert_eq!(outcome, Ok(MoveOutcome::Emitted));
        assert_eq!(cache.get(), CursorPosition::new(7, 8));
    }

    #[test]
    fn test_failed_emit_leaves_cache_for_suppress_policy() {
        // Arrange
        let cache = CursorPositionCache::new(CursorPosition::new(0, 0));

        // Act
        let outcome = cache.move_to(CursorPosition::new(9, 9), MovePolicy::SuppressDuplicates, |_| {
            Err("broken pipe")
        });

        // Assert – the peer never saw (9, 9), so the cache must not claim it did
        assert_eq!(outcome, Err("broken pipe"));
        assert_eq!(cache.get(), CursorPosition::new(0, 0));
    }

    #[test]
    fn test_failed_emit_still_updates_cache_for_always_policy() {
        let cache = CursorPositionCache::new(CursorPosition::new(0, 0));

        let outcome = cache.move_to(CursorPosition::new(9, 9), MovePolicy::Always, |_| Err(()));

        assert_eq!(outcome, Err(()));
        assert_eq!(cache.get(), CursorPosition::new(9, 9));
    }

    #[test]
    fn test_policies_share_one_cache() {
        // Arrange – production move records (3, 3)
        let cache = CursorPositionCache::new(CursorPosition::new(0, 0));
        cache
            .move_to(CursorPosition::new(3, 3), MovePolicy::Always, ok)
            .unwrap();

        // Act – an automation move to the same spot
        let outcome = cache.move_to(CursorPosition::new(3, 3), MovePolicy::SuppressDuplicates, ok);

        // Assert
        assert_eq!(outcome, Ok(MoveOutcome::Suppressed));
    }

    #[test]
    fn test_concurrent_suppressed_moves_emit_once() {
        // Arrange
        let cache = Arc::new(CursorPositionCache::new(CursorPosition::new(0, 0)));
        let thread_count = 8;

        // Act – every thread asks for the same target
        let handles: Vec<_> = (0..thread_count)
            .map(|_| {
                let c = Arc::clone(&cache);
                thread::spawn(move || {
                    c.move_to(CursorPosition::new(42, 42), MovePolicy::SuppressDuplicates, ok)
                        .expect("emit never fails here")
                })
            })
            .collect();
        let emitted = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .filter(|o| *o == MoveOutcome::Emitted)
            .count();

        // Assert – exactly one thread won the race
        assert_eq!(emitted, 1);
        assert_eq!(cache.get(), CursorPosition::new(42, 42));
    }

    #[test]
    fn test_cache_is_readable_while_emit_blocks() {
        // Arrange – an emitter that blocks until released
        let cache = Arc::new(CursorPositionCache::new(CursorPosition::new(0, 0)));
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let mover = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                cache.move_to(CursorPosition::new(5, 5), MovePolicy::Always, |_| {
                    started_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    Ok::<(), ()>(())
                })
            })
        };
        started_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("emit should start");

        // Act – read the cache from another thread while the emit is stuck
        let (read_tx, read_rx) = mpsc::channel();
        {
            let cache = Arc::clone(&cache);
            thread::spawn(move || read_tx.send(cache.get()).unwrap());
        }
        let observed = read_rx.recv_timeout(Duration::from_millis(500));
        release_tx.send(()).unwrap();
        let outcome = mover.join().expect("mover panicked");

        // Assert
        assert_eq!(observed, Ok(CursorPosition::new(5, 5)));
        assert_eq!(outcome, Ok(MoveOutcome::Emitted));
    }

    #[test]
    fn test_failed_suppressed_move_keeps_newer_position_from_another_mover() {
        // Arrange
        let cache = CursorPositionCache::new(CursorPosition::new(0, 0));

        // Act – a production move lands while the automation emit is failing
        let outcome = cache.move_to(CursorPosition::new(9, 9), MovePolicy::SuppressDuplicates, |_| {
            cache.set(CursorPosition::new(1, 2));
            Err(())
        });

        // Assert – the rollback must not clobber the newer position
        assert_eq!(outcome, Err(()));
        assert_eq!(cache.get(), CursorPosition::new(1, 2));
    }
}
