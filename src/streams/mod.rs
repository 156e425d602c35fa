//! Process output destinations
//!
//! A process has two standard output destinations, one per [`Channel`]. Each
//! lives in an [`OutputSlot`] whose active [`Destination`] can be swapped at
//! runtime. Code writes through a [`StreamWriter`], which resolves the slot's
//! current destination on every write, so installing a tee is transparent to
//! every writer.
//!
//! Writes that go straight to `std::io::stdout()` (including `println!`), or
//! through a destination obtained before the swap, bypass the slot and are
//! not observed by a capture.

mod sink;

pub use sink::{MemorySink, Sink, WriteSink};

use std::io::{self, Write};
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use crate::capture::Channel;

/// A shared, internally synchronised output destination
pub trait Destination: Send + Sync {
    /// Write every byte of `buf`
    fn write(&self, buf: &[u8]) -> io::Result<()>;

    /// Flush the destination
    fn flush(&self) -> io::Result<()>;

    /// Close the destination
    fn close(&self) -> io::Result<()>;
}

/// Destination that writes straight into one [`Sink`]
pub struct DirectDestination {
    sink: Mutex<Box<dyn Sink>>,
}

impl DirectDestination {
    /// Wrap a sink
    pub fn new(sink: impl Sink + 'static) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
        }
    }
}

impl Destination for DirectDestination {
    fn write(&self, buf: &[u8]) -> io::Result<()> {
        self.sink
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .write(buf)
    }

    fn flush(&self) -> io::Result<()> {
        self.sink.lock().unwrap_or_else(|e| e.into_inner()).flush()
    }

    fn close(&self) -> io::Result<()> {
        self.sink.lock().unwrap_or_else(|e| e.into_inner()).close()
    }
}

/// Holder of the active destination for one channel
pub struct OutputSlot {
    current: RwLock<Arc<dyn Destination>>,
}

impl OutputSlot {
    /// Create a slot with an initial destination
    pub fn new(destination: Arc<dyn Destination>) -> Self {
        Self {
            current: RwLock::new(destination),
        }
    }

    /// The destination writes are currently routed to
    pub fn current(&self) -> Arc<dyn Destination> {
        Arc::clone(&self.current.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Install a new destination, returning the one it replaced
    pub fn replace(&self, destination: Arc<dyn Destination>) -> Arc<dyn Destination> {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *current, destination)
    }
}

/// The two standard output destinations of a process
pub struct StdStreams {
    stdout: OutputSlot,
    stderr: OutputSlot,
}

static PROCESS_STREAMS: OnceLock<Arc<StdStreams>> = OnceLock::new();

impl StdStreams {
    /// Create a stream pair over the given sinks
    pub fn new(stdout: impl Sink + 'static, stderr: impl Sink + 'static) -> Arc<Self> {
        Arc::new(Self {
            stdout: OutputSlot::new(Arc::new(DirectDestination::new(stdout))),
            stderr: OutputSlot::new(Arc::new(DirectDestination::new(stderr))),
        })
    }

    /// The process-wide pair over the real stdout and stderr
    ///
    /// Created on first use. Everything that should be observable by a
    /// capture has to write through a [`StreamWriter`] obtained from here.
    pub fn process() -> Arc<Self> {
        Arc::clone(PROCESS_STREAMS.get_or_init(|| Self::new(io::stdout(), io::stderr())))
    }

    /// The slot for a channel
    pub fn slot(&self, channel: Channel) -> &OutputSlot {
        match channel {
            Channel::Stdout => &self.stdout,
            Channel::Stderr => &self.stderr,
        }
    }

    /// Writer for a channel
    pub fn writer(self: &Arc<Self>, channel: Channel) -> StreamWriter {
        StreamWriter {
            streams: Arc::clone(self),
            channel,
        }
    }

    /// Writer for the primary output channel
    pub fn stdout(self: &Arc<Self>) -> StreamWriter {
        self.writer(Channel::Stdout)
    }

    /// Writer for the error output channel
    pub fn stderr(self: &Arc<Self>) -> StreamWriter {
        self.writer(Channel::Stderr)
    }
}

/// `io::Write` handle bound to one channel of a [`StdStreams`]
#[derive(Clone)]
pub struct StreamWriter {
    streams: Arc<StdStreams>,
    channel: Channel,
}

impl StreamWriter {
    /// The channel this writer targets
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Close the channel's current destination
    pub fn close(&self) -> io::Result<()> {
        self.streams.slot(self.channel).current().close()
    }
}

impl Write for StreamWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.streams.slot(self.channel).current().write(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.streams.slot(self.channel).current().flush()
    }
}
