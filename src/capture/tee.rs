//! Tee destination that mirrors one channel into the capture
//!
//! Every byte is forwarded to the wrapped destination unchanged. In parallel
//! the bytes are assembled into lines: `\r` is left out of the line, `\n`
//! completes it. Empty lines are not reported, and a line without a
//! terminator is held back (a flush does not complete it).

use std::io;
use std::sync::{Arc, Mutex};

use super::entry::{Channel, LogEntry};
use crate::streams::Destination;

/// Receiver of the entries a tee produces
pub trait EntrySink: Send + Sync {
    /// Store a completed entry
    ///
    /// Called while the tee's lock is held, so entries of one channel are
    /// stored in the order their line terminators were written. Must not
    /// write to any output destination.
    fn store(&self, entry: &LogEntry);

    /// Announce a stored entry
    ///
    /// Called after the tee released its lock; may write to any destination.
    fn publish(&self, entry: &LogEntry);
}

struct TeeState {
    inner: Arc<dyn Destination>,
    line: Vec<u8>,
}

/// Destination decorator that forwards bytes and reports completed lines
pub struct StreamTee {
    channel: Channel,
    state: Mutex<TeeState>,
    sink: Arc<dyn EntrySink>,
}

impl StreamTee {
    /// Wrap `inner`, reporting lines written to it as `channel`
    pub fn new(inner: Arc<dyn Destination>, channel: Channel, sink: Arc<dyn EntrySink>) -> Self {
        Self {
            channel,
            state: Mutex::new(TeeState {
                inner,
                line: Vec::new(),
            }),
            sink,
        }
    }

    /// The channel this tee reports as
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// The destination bytes are forwarded to
    pub fn inner(&self) -> Arc<dyn Destination> {
        Arc::clone(&self.lock().inner)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TeeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn complete_line(&self, line: &mut Vec<u8>) -> Option<LogEntry> {
        if line.is_empty() {
            return None;
        }
        let message = String::from_utf8_lossy(line).into_owned();
        line.clear();
        Some(LogEntry::new(message, self.channel))
    }
}

impl Destination for StreamTee {
    fn write(&self, buf: &[u8]) -> io::Result<()> {
        let mut completed = Vec::new();
        let forwarded = {
            let mut state = self.lock();
            let forwarded = state.inner.write(buf);

            for &byte in buf {
                match byte {
                    b'\n' => {
                        if let Some(entry) = self.complete_line(&mut state.line) {
                            self.sink.store(&entry);
                            completed.push(entry);
                        }
                    }
                    b'\r' => {}
                    _ => state.line.push(byte),
                }
            }
            forwarded
        };

        for entry in &completed {
            self.sink.publish(entry);
        }
        forwarded
    }

    fn flush(&self) -> io::Result<()> {
        let inner = self.inner();
        inner.flush()
    }

    fn close(&self) -> io::Result<()> {
        let inner = self.inner();
        inner.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::{DirectDestination, MemorySink};

    #[derive(Default)]
    struct Recorder {
        stored: Mutex<Vec<LogEntry>>,
        published: Mutex<Vec<LogEntry>>,
    }

    impl Recorder {
        fn messages(&self) -> Vec<String> {
            self.stored
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.message.clone())
                .collect()
        }
    }

    impl EntrySink for Recorder {
        fn store(&self, entry: &LogEntry) {
            self.stored.lock().unwrap().push(entry.clone());
        }

        fn publish(&self, entry: &LogEntry) {
            self.published.lock().unwrap().push(entry.clone());
        }
    }

    fn tee(channel: Channel) -> (StreamTee, MemorySink, Arc<Recorder>) {
        let memory = MemorySink::new();
        let recorder = Arc::new(Recorder::default());
        let tee = StreamTee::new(
            Arc::new(DirectDestination::new(memory.clone())),
            channel,
            recorder.clone(),
        );
        (tee, memory, recorder)
    }

    #[test]
    fn test_crlf_and_lf_lines() {
        let (tee, memory, recorder) = tee(Channel::Stderr);

        tee.write(b"hello\r\nworld\n").unwrap();

        assert_eq!(recorder.messages(), vec!["hello", "world"]);
        let stored = recorder.stored.lock().unwrap();
        assert!(stored.iter().all(|e| e.source == Channel::Stderr));
        assert_eq!(memory.bytes(), b"hello\r\nworld\n");
        assert_eq!(recorder.published.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_single_terminated_line() {
        let (tee, _, recorder) = tee(Channel::Stdout);
        tee.write("grüße, 世界\r\n".as_bytes()).unwrap();
        tee.flush().unwrap();
        assert_eq!(recorder.messages(), vec!["grüße, 世界"]);
    }

    #[test]
    fn test_blank_lines_suppressed() {
        let (tee, memory, recorder) = tee(Channel::Stdout);
        tee.write(b"\n").unwrap();
        tee.write(b"\r\n\n").unwrap();
        assert!(recorder.messages().is_empty());
        assert_eq!(memory.bytes(), b"\n\r\n\n");
    }

    #[test]
    fn test_partial_line_survives_flush() {
        let (tee, memory, recorder) = tee(Channel::Stdout);

        tee.write(b"par").unwrap();
        tee.flush().unwrap();
        assert!(recorder.messages().is_empty());
        assert_eq!(memory.contents(), "par");

        tee.write(b"tial\n").unwrap();
        assert_eq!(recorder.messages(), vec!["partial"]);
    }

    #[test]
    fn test_byte_at_a_time() {
        let (tee, memory, recorder) = tee(Channel::Stdout);
        for byte in b"one\ntwo\r\n" {
            tee.write(std::slice::from_ref(byte)).unwrap();
        }
        assert_eq!(recorder.messages(), vec!["one", "two"]);
        assert_eq!(memory.contents(), "one\ntwo\r\n");
    }

    #[test]
    fn test_multibyte_char_split_across_writes() {
        let (tee, _, recorder) = tee(Channel::Stdout);
        let bytes = "é\n".as_bytes();
        tee.write(&bytes[..1]).unwrap();
        tee.write(&bytes[1..]).unwrap();
        assert_eq!(recorder.messages(), vec!["é"]);
    }

    #[test]
    fn test_malformed_utf8_is_replaced() {
        let (tee, memory, recorder) = tee(Channel::Stdout);
        tee.write(b"bad \xff\xfe bytes\n").unwrap();
        assert_eq!(recorder.messages(), vec!["bad \u{fffd}\u{fffd} bytes"]);
        assert_eq!(memory.bytes(), b"bad \xff\xfe bytes\n");
    }

    #[test]
    fn test_close_forwards() {
        let (tee, memory, _) = tee(Channel::Stdout);
        tee.close().unwrap();
        assert!(memory.is_closed());
    }

    struct FailingDestination;

    impl Destination for FailingDestination {
        fn write(&self, _: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&self) -> io::Result<()> {
            Ok(())
        }

        fn close(&self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_forward_error_still_captures() {
        let recorder = Arc::new(Recorder::default());
        let tee = StreamTee::new(Arc::new(FailingDestination), Channel::Stderr, recorder.clone());

        let err = tee.write(b"lost\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(recorder.messages(), vec!["lost"]);
    }
}
