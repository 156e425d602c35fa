//! Capture of the process output channels
//!
//! [`LogCapture`] tees both channels of a [`StdStreams`] into a bounded
//! buffer of [`LogEntry`] values and fans every new entry out to registered
//! listeners. The original destinations keep receiving every byte.

mod buffer;
mod entry;
mod listeners;
mod tee;

pub use buffer::{CaptureBuffer, DEFAULT_CAPACITY};
pub use entry::{Channel, LogEntry};
pub use listeners::{Listener, ListenerId, ListenerRegistry};
pub use tee::{EntrySink, StreamTee};

use std::sync::{Arc, Mutex, Weak};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::CaptureError;
use crate::streams::{Destination, StdStreams};

/// Shared state the tees report into
struct CaptureCore {
    buffer: CaptureBuffer,
    listeners: ListenerRegistry,
}

impl EntrySink for CaptureCore {
    fn store(&self, entry: &LogEntry) {
        self.buffer.push(entry.clone());
    }

    fn publish(&self, entry: &LogEntry) {
        self.listeners.notify(entry);
    }
}

/// Destinations displaced by an active capture
struct Session {
    originals: [Arc<dyn Destination>; 2],
    tees: [Arc<dyn Destination>; 2],
}

/// Tees a process's two output channels into a bounded entry buffer
///
/// Starts in the stopped state. `start` and `stop` may be called any number
/// of times; the buffer and listeners survive across sessions until
/// explicitly cleared or dropped.
pub struct LogCapture {
    streams: Arc<StdStreams>,
    core: Arc<CaptureCore>,
    session: Mutex<Option<Session>>,
}

impl LogCapture {
    /// Create a stopped capture over `streams` with the default capacity
    pub fn new(streams: Arc<StdStreams>) -> Self {
        Self::build(streams, DEFAULT_CAPACITY)
    }

    /// Create a stopped capture retaining at most `capacity` entries
    pub fn with_capacity(streams: Arc<StdStreams>, capacity: usize) -> Result<Self, CaptureError> {
        if capacity == 0 {
            return Err(CaptureError::InvalidCapacity(capacity));
        }
        Ok(Self::build(streams, capacity))
    }

    fn build(streams: Arc<StdStreams>, capacity: usize) -> Self {
        Self {
            streams,
            core: Arc::new(CaptureCore {
                buffer: CaptureBuffer::new(capacity),
                listeners: ListenerRegistry::new(),
            }),
            session: Mutex::new(None),
        }
    }

    /// Start capturing; no-op while already capturing
    ///
    /// The current destination of each channel is wrapped in a [`StreamTee`]
    /// which is installed in its place.
    pub fn start(&self) {
        {
            let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
            if session.is_some() {
                return;
            }

            let sink: Arc<dyn EntrySink> = self.core.clone();
            let installed = Channel::ALL.map(|channel| {
                let slot = self.streams.slot(channel);
                let original = slot.current();
                let tee: Arc<dyn Destination> = Arc::new(StreamTee::new(
                    Arc::clone(&original),
                    channel,
                    Arc::clone(&sink),
                ));
                slot.replace(Arc::clone(&tee));
                (original, tee)
            });

            let [(out_original, out_tee), (err_original, err_tee)] = installed;
            *session = Some(Session {
                originals: [out_original, err_original],
                tees: [out_tee, err_tee],
            });
        }

        // Emitted after the session lock is released: the record may pass
        // through the tee and reach a listener that calls back in.
        info!("Log capture started");
    }

    /// Stop capturing and restore the original destinations; no-op while
    /// stopped. Captured entries are kept.
    pub fn stop(&self) {
        let mut displaced_channels = Vec::new();
        {
            let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
            let Some(active) = session.take() else {
                return;
            };

            for (i, channel) in Channel::ALL.into_iter().enumerate() {
                let displaced = self
                    .streams
                    .slot(channel)
                    .replace(Arc::clone(&active.originals[i]));
                if !Arc::ptr_eq(&displaced, &active.tees[i]) {
                    displaced_channels.push(channel);
                }
            }
        }

        // Logged without the session lock, as in `start`
        for channel in displaced_channels {
            warn!(
                channel = %channel,
                "Output destination was replaced while capturing; restoring original anyway"
            );
        }
        info!("Log capture stopped");
    }

    /// Whether the channels are currently teed
    pub fn is_capturing(&self) -> bool {
        self.session
            .lock()
            .map(|s| s.is_some())
            .unwrap_or_else(|e| e.into_inner().is_some())
    }

    /// Append an entry and notify listeners
    ///
    /// Evicts the oldest entries while the buffer is over capacity.
    pub fn append_entry(&self, entry: LogEntry) {
        self.core.store(&entry);
        self.core.publish(&entry);
    }

    /// Point-in-time copy of all captured entries, oldest first
    pub fn get_logs(&self) -> Vec<LogEntry> {
        self.core.buffer.snapshot()
    }

    /// Number of captured entries
    pub fn len(&self) -> usize {
        self.core.buffer.len()
    }

    /// Check if nothing has been captured
    pub fn is_empty(&self) -> bool {
        self.core.buffer.is_empty()
    }

    /// Maximum entries retained
    pub fn capacity(&self) -> usize {
        self.core.buffer.capacity()
    }

    /// Drop every captured entry; listeners and capture state are untouched
    pub fn clear(&self) {
        self.core.buffer.clear();
        debug!("Log buffer cleared");
    }

    /// Register a callback for every new entry
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&LogEntry) + Send + Sync + 'static,
    {
        self.core.listeners.add(Arc::new(listener))
    }

    /// Remove a callback; safe to call from inside a callback
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.core.listeners.remove(id)
    }

    /// Stream of entries appended from now on
    ///
    /// Dropping the stream removes its listener. The channel is unbounded:
    /// a stream that is kept alive but never read holds every entry
    /// appended since it was created.
    pub fn subscribe(&self) -> EntryStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.add_listener(move |entry| {
            // Receiver gone: the stream's Drop is about to unregister us
            let _ = tx.send(entry.clone());
        });
        EntryStream {
            rx,
            id,
            core: Arc::downgrade(&self.core),
        }
    }
}

impl Drop for LogCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Push subscription returned by [`LogCapture::subscribe`]
pub struct EntryStream {
    rx: mpsc::UnboundedReceiver<LogEntry>,
    id: ListenerId,
    core: Weak<CaptureCore>,
}

impl EntryStream {
    /// Wait for the next entry
    ///
    /// Returns `None` once the capture has been dropped and every pending
    /// entry was received.
    pub async fn recv(&mut self) -> Option<LogEntry> {
        self.rx.recv().await
    }

    /// Take an entry if one is ready
    pub fn try_recv(&mut self) -> Option<LogEntry> {
        self.rx.try_recv().ok()
    }
}

impl Drop for EntryStream {
    fn drop(&mut self) {
        if let Some(core) = self.core.upgrade() {
            core.listeners.remove(self.id);
        }
    }
}
