//! Runs a child process with its output routed through the stream pair
//!
//! The child's stdout and stderr are piped and every chunk read from them is
//! written to the matching channel, so an active capture sees the child's
//! lines exactly as if this process had printed them.

use std::io::Write;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

use crate::capture::Channel;
use crate::streams::StdStreams;

/// Spawn `program` with `args` and pump its output until it exits
pub async fn run_command(
    streams: &Arc<StdStreams>,
    program: &str,
    args: &[String],
) -> Result<ExitStatus> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to spawn {}", program))?;

    debug!("Spawned {} (pid {:?})", program, child.id());

    let stdout = child.stdout.take().context("Child stdout not captured")?;
    let stderr = child.stderr.take().context("Child stderr not captured")?;

    let out_task = tokio::spawn(pump(stdout, Arc::clone(streams), Channel::Stdout));
    let err_task = tokio::spawn(pump(stderr, Arc::clone(streams), Channel::Stderr));

    let status = child.wait().await.context("Failed to wait for child")?;
    out_task.await.context("Stdout pump panicked")??;
    err_task.await.context("Stderr pump panicked")??;

    Ok(status)
}

async fn pump<R>(mut reader: R, streams: Arc<StdStreams>, channel: Channel) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut writer = streams.writer(channel);
    let mut buf = [0u8; 4096];
    loop {
        let n = reader
            .read(&mut buf)
            .await
            .with_context(|| format!("Failed to read child {}", channel))?;
        if n == 0 {
            break;
        }
        writer
            .write_all(&buf[..n])
            .with_context(|| format!("Failed to forward child {}", channel))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush child {}", channel))?;
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::capture::LogCapture;
    use crate::streams::MemorySink;

    #[tokio::test]
    async fn test_child_output_is_captured() {
        let out = MemorySink::new();
        let err = MemorySink::new();
        let streams = StdStreams::new(out.clone(), err.clone());
        let capture = LogCapture::new(Arc::clone(&streams));
        capture.start();

        let status = run_command(
            &streams,
            "sh",
            &["-c".to_string(), "echo out; echo err >&2".to_string()],
        )
        .await
        .unwrap();
        capture.stop();

        assert!(status.success());
        let logs = capture.get_logs();
        assert!(logs
            .iter()
            .any(|e| e.message == "out" && e.source == Channel::Stdout));
        assert!(logs
            .iter()
            .any(|e| e.message == "err" && e.source == Channel::Stderr));
        assert_eq!(out.contents(), "out\n");
        assert_eq!(err.contents(), "err\n");
    }

    #[tokio::test]
    async fn test_missing_program_errors() {
        let streams = StdStreams::new(MemorySink::new(), MemorySink::new());
        let result = run_command(&streams, "definitely-not-a-real-program-xyz", &[]).await;
        assert!(result.is_err());
    }
}
