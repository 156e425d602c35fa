//! Byte sinks that sit underneath a process output destination

use std::fs::File;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// A writable byte sink exposing write, flush and close
pub trait Sink: Send {
    /// Write every byte of `buf` to the sink
    fn write(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Flush any buffered bytes
    fn flush(&mut self) -> io::Result<()>;

    /// Close the sink. Defaults to a flush.
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl Sink for io::Stdout {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.lock().write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(self)
    }
}

impl Sink for io::Stderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.lock().write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(self)
    }
}

impl Sink for Vec<u8> {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for File {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(self)
    }

    fn close(&mut self) -> io::Result<()> {
        Write::flush(self)?;
        self.sync_all()
    }
}

impl Sink for Box<dyn Sink> {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        (**self).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Adapts any `io::Write` into a [`Sink`]
pub struct WriteSink<W>(pub W);

impl<W: Write + Send> Sink for WriteSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.0.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

/// Shared in-memory sink
///
/// Clones share the same storage, so one clone can be handed to a
/// destination while another inspects what reached it.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    content: Arc<Mutex<Vec<u8>>>,
    closed: Arc<Mutex<bool>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes written so far
    pub fn bytes(&self) -> Vec<u8> {
        self.content.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Bytes written so far, decoded lossily
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed.lock().map(|c| *c).unwrap_or(false)
    }
}

impl Sink for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        if let Ok(mut content) = self.content.lock() {
            content.extend_from_slice(buf);
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        if let Ok(mut closed) = self.closed.lock() {
            *closed = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_shares_content_between_clones() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();

        writer.write(b"hello ").unwrap();
        writer.write(b"world").unwrap();

        assert_eq!(sink.contents(), "hello world");
        assert!(!sink.is_closed());

        writer.close().unwrap();
        assert!(sink.is_closed());
    }

    #[test]
    fn test_write_sink_adapts_writer() {
        let mut sink = WriteSink(Vec::new());
        Sink::write(&mut sink, b"abc").unwrap();
        Sink::flush(&mut sink).unwrap();
        assert_eq!(sink.0, b"abc");
    }

    #[test]
    fn test_boxed_sink_forwards_close() {
        let memory = MemorySink::new();
        let mut boxed: Box<dyn Sink> = Box::new(memory.clone());
        boxed.write(b"x").unwrap();
        boxed.close().unwrap();
        assert_eq!(memory.contents(), "x");
        assert!(memory.is_closed());
    }
}
