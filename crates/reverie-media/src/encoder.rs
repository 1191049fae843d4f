//! Encoder invocation with a hard wall-clock timeout.
//!
//! Spawns one external encoder process per call and guarantees it has
//! exited, naturally or by force, before the call returns. Diagnostic
//! output is captured into a bounded tail buffer so a chatty encoder
//! cannot grow memory without bound.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::graph::EncodeArgs;

/// Default encoder executable.
const DEFAULT_PROGRAM: &str = "ffmpeg";

/// Cap on retained diagnostic output.
const STDERR_TAIL_BYTES: usize = 8 * 1024;

/// Runner for the external encoding process.
#[derive(Debug, Clone)]
pub struct Encoder {
    program: String,
    timeout: Duration,
}

impl Encoder {
    /// Create a runner for `ffmpeg` with the given wall-clock timeout.
    pub fn new(timeout: Duration) -> Self {
        Self::with_program(DEFAULT_PROGRAM, timeout)
    }

    /// Create a runner for an arbitrary executable. Used by tests to
    /// substitute the encoder.
    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Run the encoder to completion or deadline.
    ///
    /// Returns the output path on exit code zero with the output present.
    /// A missed deadline kills the process and fails with `Timeout`,
    /// distinct from a nonzero exit (`EncodeFailed`).
    pub async fn run(&self, encode: &EncodeArgs) -> MediaResult<PathBuf> {
        which::which(&self.program)
            .map_err(|_| MediaError::EncoderNotFound(self.program.clone()))?;

        debug!(program = %self.program, args = %encode.args.join(" "), "Spawning encoder");

        let mut child = Command::new(&self.program)
            .args(&encode.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Drain stderr concurrently into a bounded tail so the pipe never
        // backs up and memory stays capped.
        let stderr = child.stderr.take();
        let tail_task = tokio::spawn(async move {
            let mut tail = String::new();
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tail.push_str(&line);
                    tail.push('\n');
                    if tail.len() > STDERR_TAIL_BYTES {
                        let cut = tail.len() - STDERR_TAIL_BYTES;
                        // Trim from the front on a char boundary.
                        let cut = tail
                            .char_indices()
                            .map(|(i, _)| i)
                            .find(|&i| i >= cut)
                            .unwrap_or(0);
                        tail.drain(..cut);
                    }
                }
            }
            tail
        });

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                warn!(
                    program = %self.program,
                    timeout_secs = self.timeout.as_secs(),
                    "Encoder deadline exceeded, killing process"
                );
                // kill() also reaps the child, so nothing outlives this call.
                let _ = child.kill().await;
                tail_task.abort();
                return Err(MediaError::Timeout(self.timeout.as_secs()));
            }
        };

        let stderr_tail = tail_task.await.unwrap_or_default();

        if !status.success() {
            return Err(MediaError::EncodeFailed {
                exit_code: status.code(),
                stderr_tail,
            });
        }

        if !encode.output.exists() {
            return Err(MediaError::OutputMissing(encode.output.clone()));
        }

        Ok(encode.output.clone())
    }
}
