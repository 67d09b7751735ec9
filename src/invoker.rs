//! Runs the solver executable once and decodes its JSON answer.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::consts::{INDEX_ENV_VAR, MAX_OUTPUT_BYTES, MAX_STDERR_BYTES};
use crate::error::EngineError;

/// Spawns one solver process per call. Holds no per-call state.
#[derive(Debug, Clone)]
pub struct Invoker {
    exec_path: PathBuf,
    index_path: PathBuf,
}

impl Invoker {
    pub fn new(exec_path: impl Into<PathBuf>, index_path: impl Into<PathBuf>) -> Self {
        Self {
            exec_path: exec_path.into(),
            index_path: index_path.into(),
        }
    }

    pub fn exec_path(&self) -> &Path {
        &self.exec_path
    }

    /// Run the solver with `args` and decode one JSON value from its stdout.
    ///
    /// Everything from reading output to reaping the process must finish
    /// before `deadline`, otherwise the process is killed and the call
    /// fails with [`EngineError::ExecutionTimeout`].
    pub async fn invoke<T: DeserializeOwned>(
        &self,
        deadline: Instant,
        args: &[String],
    ) -> Result<T, EngineError> {
        if Instant::now() >= deadline {
            return Err(EngineError::ExecutionTimeout);
        }

        let mut child = Command::new(&self.exec_path)
            .args(args)
            .env_clear()
            .env(INDEX_ENV_VAR, &self.index_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(EngineError::Spawn)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("solver stdout was not captured"))?;
        let mut stderr = child.stderr.take().map(|s| tokio::spawn(read_stderr(s)));

        let outcome =
            tokio::time::timeout_at(deadline, collect(&mut child, stdout, &mut stderr)).await;

        if let Some(handle) = stderr {
            handle.abort();
        }

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                reap(&mut child).await;
                Err(e)
            }
            Err(_) => {
                warn!(exec = %self.exec_path.display(), ?args, "solver exceeded its deadline, killing it");
                reap(&mut child).await;
                Err(EngineError::ExecutionTimeout)
            }
        }
    }
}

const READ_CHUNK: usize = 64 * 1024;

// How long a failed solver's stderr gets to finish after it exits.
const STDERR_GRACE: Duration = Duration::from_millis(100);

async fn collect<T: DeserializeOwned>(
    child: &mut Child,
    stdout: ChildStdout,
    stderr: &mut Option<JoinHandle<String>>,
) -> Result<T, EngineError> {
    let mut buf = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    let mut reader = stdout.take(MAX_OUTPUT_BYTES);

    // Stop at the first complete value. The solver may exit while a
    // descendant still holds the pipe, so EOF is not guaranteed.
    let value = loop {
        let n = reader.read(&mut chunk).await?;
        buf.extend_from_slice(&chunk[..n]);
        let eof = n == 0;
        if eof && buf.len() as u64 >= MAX_OUTPUT_BYTES {
            warn!(limit = MAX_OUTPUT_BYTES, "solver output reached the size cap");
        }
        if let Some(value) = decode_prefix(&buf, eof)? {
            break value;
        }
    };

    // Close our end so a solver still writing gets EPIPE instead of blocking.
    drop(reader);

    let status = child.wait().await?;
    if !status.success() {
        let stderr = match stderr.take() {
            Some(handle) => tokio::time::timeout(STDERR_GRACE, handle)
                .await
                .ok()
                .and_then(Result::ok)
                .unwrap_or_default(),
            None => String::new(),
        };
        warn!(%status, %stderr, "solver exited unsuccessfully");
        return Err(EngineError::Exited { status, stderr });
    }

    Ok(value)
}

/// Try to decode the first JSON value from what has been read so far.
///
/// `Ok(None)` means more input is needed. A value that ends exactly at the
/// end of `bytes` is only trusted if it cannot be extended by further input
/// (an array, object or string) or the stream is finished.
fn decode_prefix<T: DeserializeOwned>(
    bytes: &[u8],
    eof: bool,
) -> Result<Option<T>, serde_json::Error> {
    let mut stream = serde_json::Deserializer::from_slice(bytes).into_iter::<T>();
    match stream.next() {
        Some(Ok(value)) => {
            let end = stream.byte_offset();
            let closed = end > 0 && matches!(bytes[end - 1], b']' | b'}' | b'"');
            if eof || end < bytes.len() || closed {
                Ok(Some(value))
            } else {
                Ok(None)
            }
        }
        Some(Err(e)) if e.is_eof() && !eof => Ok(None),
        Some(Err(e)) => Err(e),
        None if eof => decode(bytes).map(Some),
        None => Ok(None),
    }
}

/// Decode the first JSON value in `bytes`. Trailing bytes are ignored.
fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_json::Error> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    T::deserialize(&mut de)
}

async fn read_stderr(stderr: ChildStderr) -> String {
    let mut kept = Vec::new();
    let mut reader = stderr.take(MAX_STDERR_BYTES);
    let _ = reader.read_to_end(&mut kept).await;

    // Keep draining so the solver never blocks on a full stderr pipe.
    let mut rest = reader.into_inner();
    let _ = tokio::io::copy(&mut rest, &mut tokio::io::sink()).await;

    String::from_utf8_lossy(&kept).trim().to_string()
}

async fn reap(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "solver already gone");
    }
    let _ = child.wait().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_ignores_trailing_output() {
        let words: Vec<String> = decode(b"[\"crane\"]\nextra junk").unwrap();
        assert_eq!(words, vec!["crane"]);
    }

    #[test]
    fn decode_skips_leading_whitespace() {
        let n: u32 = decode(b"\n  42").unwrap();
        assert_eq!(n, 42);
    }

    #[test]
    fn decode_empty_output_fails() {
        assert!(decode::<Vec<String>>(b"").is_err());
    }

    #[test]
    fn decode_truncated_output_fails() {
        assert!(decode::<Vec<String>>(b"[\"crane\", \"sla").is_err());
    }

    #[test]
    fn partial_array_waits_for_more() {
        let got = decode_prefix::<Vec<String>>(b"[\"crane\", \"sla", false).unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn complete_array_is_taken_before_eof() {
        let got = decode_prefix::<Vec<String>>(b"[\"crane\"]", false).unwrap();
        assert_eq!(got, Some(vec!["crane".to_string()]));
    }

    #[test]
    fn bare_number_waits_until_delimited() {
        assert_eq!(decode_prefix::<u32>(b"4", false).unwrap(), None);
        assert_eq!(decode_prefix::<u32>(b"42\n", false).unwrap(), Some(42));
        assert_eq!(decode_prefix::<u32>(b"42", true).unwrap(), Some(42));
    }

    #[test]
    fn truncated_at_eof_is_an_error() {
        let err = decode_prefix::<Vec<String>>(b"[\"cra", true).unwrap_err();
        assert!(err.is_eof());
        assert!(decode_prefix::<Vec<String>>(b"  ", true).is_err());
    }

    #[test]
    fn garbage_fails_without_waiting() {
        assert!(decode_prefix::<Vec<String>>(b"not json", false).is_err());
    }

    #[tokio::test]
    async fn missing_executable_is_spawn_error() {
        let invoker = Invoker::new("/nonexistent/wordsmith", "/tmp/index");
        let deadline = Instant::now() + Duration::from_secs(1);
        let err = invoker
            .invoke::<Vec<String>>(deadline, &["list".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Spawn(_)));
    }

    #[tokio::test]
    async fn past_deadline_never_spawns() {
        let invoker = Invoker::new("/nonexistent/wordsmith", "/tmp/index");
        let err = invoker
            .invoke::<Vec<String>>(Instant::now(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ExecutionTimeout));
    }
}
