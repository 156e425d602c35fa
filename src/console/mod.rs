//! Consumer-side views over captured entries
//!
//! Filtering, search and export operate on snapshots returned by
//! [`LogCapture::get_logs`](crate::capture::LogCapture::get_logs); none of
//! this touches the capture itself.

mod export;
mod filter;

pub use export::{export_json, export_text, format_entry};
pub use filter::{LogFilter, LogQuery};
