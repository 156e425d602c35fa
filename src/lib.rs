//! console-capture - in-process capture of stdout and stderr
//!
//! Tees a process's two output channels into a bounded, queryable buffer of
//! log lines while still forwarding every byte to the real destinations.

pub mod capture;
pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod runner;
pub mod streams;
