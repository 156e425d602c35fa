//! Logging for console-capture
//!
//! The crate's own records are formatted by tracing-subscriber and written
//! to the error channel of a [`StdStreams`]. While a capture is active they
//! show up in it like any other line.

mod writer;

pub use writer::StreamMakeWriter;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::capture::Channel;
use crate::streams::StdStreams;

/// Install the global tracing subscriber
///
/// `default_filter` is used when `RUST_LOG` is unset or invalid.
pub fn init_logging(streams: Arc<StdStreams>, default_filter: &str) -> Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(StreamMakeWriter::new(streams, Channel::Stderr))
        .with_ansi(false)
        .with_target(true);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}
