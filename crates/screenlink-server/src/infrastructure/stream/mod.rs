//! Stream infrastructure: writing framed messages to the peer.
//!
//! [`FramedStream`] implements the application-layer [`MessageStream`] trait
//! over any blocking [`Write`] (a `std::net::TcpStream` in production, a
//! `Vec<u8>` in tests).  It encodes each message with
//! [`screenlink_core::encode_message`] and writes the whole frame while
//! holding a mutex, so frames from concurrent writers never interleave.
//!
//! After the first I/O failure the stream marks itself closed and every later
//! write fails fast with [`StreamError::Closed`] instead of touching the
//! broken transport again.

pub mod mock;

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use screenlink_core::{encode_message, ProxyMessage};
use tracing::{trace, warn};

use crate::application::context::{MessageStream, StreamError};

/// A [`MessageStream`] that writes length-prefixed frames to `W`.
pub struct FramedStream<W> {
    writer: Mutex<W>,
    closed: AtomicBool,
}

impl<W: Write + Send> FramedStream<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns `true` once a write has failed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Consumes the stream and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> MessageStream for FramedStream<W> {
    fn write_message(&self, msg: &ProxyMessage) -> Result<(), StreamError> {
        if self.is_closed() {
            return Err(StreamError::Closed);
        }

        let frame = encode_message(msg)?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writer.write_all(&frame).and_then(|()| writer.flush()) {
            self.closed.store(true, Ordering::SeqCst);
            warn!("stream write failed, marking closed: {e}");
            return Err(StreamError::Io(e));
        }
        trace!("wrote {:?} frame ({} bytes)", msg.code(), frame.len());
        Ok(())
    }
}

impl<W> std::fmt::Debug for FramedStream<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramedStream")
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use screenlink_core::decode_message;
    use screenlink_core::protocol::messages::MouseMoveMessage;
    use std::io;
    use std::sync::Arc;
    use std::thread;

    /// A writer that fails every call.
    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_produces_decodable_frame() {
        // Arrange
        let stream = FramedStream::new(Vec::new());
        let msg = ProxyMessage::MouseMove(MouseMoveMessage { x: 10, y: -3 });

        // Act
        stream.write_message(&msg).expect("write");
        let bytes = stream.into_inner();

        // Assert
        let (decoded, consumed) = decode_message(&bytes).expect("decode");
        assert_eq!(decoded, msg);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn test_consecutive_writes_append_frames_in_order() {
        // Arrange
        let stream = FramedStream::new(Vec::new());

        // Act
        stream.write_message(&ProxyMessage::MouseDown { button: 1 }).unwrap();
        stream.write_message(&ProxyMessage::ScreenLeave).unwrap();
        let bytes = stream.into_inner();

        // Assert
        let (first, used) = decode_message(&bytes).unwrap();
        let (second, _) = decode_message(&bytes[used..]).unwrap();
        assert_eq!(first, ProxyMessage::MouseDown { button: 1 });
        assert_eq!(second, ProxyMessage::ScreenLeave);
    }

    #[test]
    fn test_first_io_failure_closes_stream() {
        // Arrange
        let stream = FramedStream::new(BrokenWriter);

        // Act
        let first = stream.write_message(&ProxyMessage::ScreenLeave);
        let second = stream.write_message(&ProxyMessage::ScreenLeave);

        // Assert
        assert!(matches!(first, Err(StreamError::Io(_))));
        assert!(matches!(second, Err(StreamError::Closed)));
        assert!(stream.is_closed());
    }

    #[test]
    fn test_concurrent_writers_never_interleave_frames() {
        // Arrange
        let stream = Arc::new(FramedStream::new(Vec::new()));
        let per_thread = 200;

        // Act
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let stream = Arc::clone(&stream);
                thread::spawn(move || {
                    for i in 0..per_thread {
                        let msg = ProxyMessage::MouseMove(MouseMoveMessage { x: t, y: i });
                        stream.write_message(&msg).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let bytes = Arc::try_unwrap(stream).unwrap().into_inner();

        // Assert – every frame decodes and the total count is exact
        let mut offset = 0;
        let mut count = 0;
        while offset < bytes.len() {
            let (msg, used) = decode_message(&bytes[offset..]).expect("whole frame");
            assert!(matches!(msg, ProxyMessage::MouseMove(_)));
            offset += used;
            count += 1;
        }
        assert_eq!(count, 4 * per_thread);
    }
}
