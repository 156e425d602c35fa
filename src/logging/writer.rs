//! tracing writer that targets one channel of a stream pair
//!
//! Records written through it land in whatever destination the channel's
//! slot currently holds, so once a capture is active they are teed like any
//! other output.

use std::sync::Arc;

use tracing_subscriber::fmt::MakeWriter;

use crate::capture::Channel;
use crate::streams::{StdStreams, StreamWriter};

/// Writer factory for tracing-subscriber
#[derive(Clone)]
pub struct StreamMakeWriter {
    streams: Arc<StdStreams>,
    channel: Channel,
}

impl StreamMakeWriter {
    /// Target `channel` of `streams`
    pub fn new(streams: Arc<StdStreams>, channel: Channel) -> Self {
        Self { streams, channel }
    }
}

impl<'a> MakeWriter<'a> for StreamMakeWriter {
    type Writer = StreamWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.streams.writer(self.channel)
    }
}
