//! Recording message stream for tests.
//!
//! Captures every message instead of writing bytes, so tests can assert on
//! exactly what a proxy or harness emitted.  Can be switched into a failing
//! mode to exercise write-error paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use screenlink_core::ProxyMessage;

use crate::application::context::{MessageStream, StreamError};
use crate::infrastructure::automation::mock::{Observed, Timeline};

/// A [`MessageStream`] that records messages in memory.
#[derive(Default)]
pub struct RecordingStream {
    sent: Mutex<Vec<ProxyMessage>>,
    should_fail: AtomicBool,
    timeline: Option<Timeline>,
}

impl RecordingStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stream that also appends each successful write to `timeline`.
    pub fn with_timeline(timeline: Timeline) -> Self {
        Self {
            timeline: Some(timeline),
            ..Self::default()
        }
    }

    /// When `true`, every write fails with [`StreamError::Closed`] and records nothing.
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Returns a copy of every message written so far.
    pub fn sent(&self) -> Vec<ProxyMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl MessageStream for RecordingStream {
    fn write_message(&self, msg: &ProxyMessage) -> Result<(), StreamError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(StreamError::Closed);
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*msg);
        if let Some(timeline) = &self.timeline {
            timeline
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Observed::Sent(*msg));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_recording_stream_captures_messages_in_order() {
        // Arrange
        let stream = RecordingStream::new();

        // Act
        stream.write_message(&ProxyMessage::MouseDown { button: 1 }).unwrap();
        stream.write_message(&ProxyMessage::MouseUp { button: 1 }).unwrap();

        // Assert
        assert_eq!(
            stream.sent(),
            vec![
                ProxyMessage::MouseDown { button: 1 },
                ProxyMessage::MouseUp { button: 1 }
            ]
        );
    }

    #[test]
    fn test_failing_stream_records_nothing() {
        let stream = RecordingStream::new();
        stream.set_should_fail(true);

        let result = stream.write_message(&ProxyMessage::ScreenLeave);

        assert!(matches!(result, Err(StreamError::Closed)));
        assert_eq!(stream.sent_count(), 0);
    }

    #[test]
    fn test_timeline_receives_successful_writes() {
        let timeline: Timeline = Arc::default();
        let stream = RecordingStream::with_timeline(Arc::clone(&timeline));

        stream.write_message(&ProxyMessage::ScreenLeave).unwrap();

        assert_eq!(
            *timeline.lock().unwrap(),
            vec![Observed::Sent(ProxyMessage::ScreenLeave)]
        );
    }
}
