use std::sync::Arc;

use anyhow::{Context, Result};

use console_capture::capture::{Channel, LogCapture};
use console_capture::config::Config;
use console_capture::console::{export_text, LogFilter, LogQuery};
use console_capture::logging;
use console_capture::runner;
use console_capture::streams::StdStreams;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    // Every write that should be captured goes through these streams
    let streams = StdStreams::process();

    // Initialize logging BEFORE any tracing calls
    logging::init_logging(Arc::clone(&streams), &config.log_filter)?;

    let mut args = std::env::args().skip(1);
    let Some(program) = args.next() else {
        anyhow::bail!("usage: console-capture <command> [args...]");
    };
    let args: Vec<String> = args.collect();

    let capture = LogCapture::with_capacity(Arc::clone(&streams), config.buffer_capacity)?;
    capture.start();

    let status = runner::run_command(&streams, &program, &args).await;
    capture.stop();
    let status = status?;

    let logs = capture.get_logs();
    let errors = LogQuery::new().with_filter(LogFilter::Stderr).apply(&logs);
    tracing::info!(
        "{} exited with {}: {} lines captured ({} on {})",
        program,
        status,
        logs.len(),
        errors.len(),
        Channel::Stderr
    );

    if let Some(path) = &config.export_path {
        std::fs::write(path, export_text(&logs))
            .with_context(|| format!("Failed to write export to {}", path.display()))?;
        tracing::info!("Exported {} entries to {}", logs.len(), path.display());
    }

    if !status.success() {
        std::process::exit(status.code().unwrap_or(1));
    }
    Ok(())
}
