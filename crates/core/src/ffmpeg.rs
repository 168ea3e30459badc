//! Local encoder (FFmpeg) invocation for exports.
//!
//! Two jobs are supported: stream-copy concatenation of already encoded clips
//! through a concat manifest, and a single-input H.264 re-encode. Both run the
//! encoder exactly once under a hard wall-clock timeout and verify that the
//! output exists and is non-empty before reporting success.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Default wall-clock limit for one encoder run (5 minutes).
pub const DEFAULT_ENCODER_TIMEOUT: Duration = Duration::from_secs(300);

/// Maximum stderr kept from the encoder (64 KiB). The rest is drained and
/// discarded so the pipe never fills or closes under a running encoder.
const MAX_STDERR_BYTES: usize = 64 * 1024;

/// Error type for encoder operations.
#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    #[error("encoder could not be started: {0}")]
    Spawn(std::io::Error),

    #[error("encoder failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("encoder timed out after {}s and was killed", .0.as_secs())]
    Timeout(Duration),

    #[error("input file not found: {0}")]
    InputNotFound(String),

    #[error("output file is missing or empty: {0}")]
    EmptyOutput(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Which encoder binary to run and for how long.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    pub program: PathBuf,
    pub timeout: Duration,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            timeout: DEFAULT_ENCODER_TIMEOUT,
        }
    }
}

// ---------------------------------------------------------------------------
// Concat manifest
// ---------------------------------------------------------------------------

/// Render a concat-demuxer manifest listing `inputs` in order.
///
/// Backslashes are normalized to forward slashes and single quotes are
/// escaped as `'\''` so each path survives the demuxer's quoting rules.
pub fn concat_manifest(inputs: &[PathBuf]) -> String {
    inputs
        .iter()
        .map(|p| format!("file '{}'", escape_manifest_path(p)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_manifest_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace('\'', r"'\''")
}

/// Write the concat manifest for `inputs` to `manifest_path`.
pub async fn write_concat_manifest(
    manifest_path: &Path,
    inputs: &[PathBuf],
) -> Result<(), EncoderError> {
    tokio::fs::write(manifest_path, concat_manifest(inputs)).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// Concatenate the files listed in `manifest` into `output` without
/// re-encoding.
///
/// The manifest and every input must exist before the encoder is started.
/// Returns the size of the produced file in bytes.
pub async fn concat_stream_copy(
    config: &EncoderConfig,
    manifest: &Path,
    inputs: &[PathBuf],
    output: &Path,
) -> Result<u64, EncoderError> {
    ensure_exists(manifest).await?;
    for input in inputs {
        ensure_exists(input).await?;
    }

    let args: Vec<OsString> = vec![
        "-y".into(),
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        manifest.as_os_str().to_owned(),
        "-c".into(),
        "copy".into(),
        output.as_os_str().to_owned(),
    ];
    run_encoder(config, args).await?;
    verify_output(output).await
}

/// Re-encode `input` to H.264 (`libx264`, `veryfast` preset) at `output`.
///
/// Returns the size of the produced file in bytes.
pub async fn transcode_h264(
    config: &EncoderConfig,
    input: &Path,
    output: &Path,
) -> Result<u64, EncoderError> {
    ensure_exists(input).await?;

    let args: Vec<OsString> = vec![
        "-y".into(),
        "-i".into(),
        input.as_os_str().to_owned(),
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        "veryfast".into(),
        output.as_os_str().to_owned(),
    ];
    run_encoder(config, args).await?;
    verify_output(output).await
}

/// Check that `path` exists and is non-empty, returning its size.
pub async fn verify_output(path: &Path) -> Result<u64, EncoderError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(meta.len()),
        Ok(_) => Err(EncoderError::EmptyOutput(path.to_string_lossy().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(EncoderError::EmptyOutput(path.to_string_lossy().to_string()))
        }
        Err(e) => Err(EncoderError::IoError(e)),
    }
}

// ---------------------------------------------------------------------------
// Process handling
// ---------------------------------------------------------------------------

async fn ensure_exists(path: &Path) -> Result<(), EncoderError> {
    if tokio::fs::try_exists(path).await? {
        Ok(())
    } else {
        Err(EncoderError::InputNotFound(path.to_string_lossy().to_string()))
    }
}

/// Run the encoder once with `args`, killing it if it outlives the timeout.
async fn run_encoder(config: &EncoderConfig, args: Vec<OsString>) -> Result<(), EncoderError> {
    let mut cmd = Command::new(&config.program);
    cmd.args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!(program = ?config.program, ?args, "Spawning encoder");

    let mut child = cmd.spawn().map_err(EncoderError::Spawn)?;
    let stderr_task = tokio::spawn(read_capped(child.stderr.take()));

    match tokio::time::timeout(config.timeout, child.wait()).await {
        Ok(Ok(status)) => {
            let stderr = stderr_task.await.unwrap_or_default();
            if status.success() {
                tracing::debug!("Encoder finished");
                Ok(())
            } else {
                Err(EncoderError::ExecutionFailed {
                    exit_code: status.code(),
                    stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
                })
            }
        }
        Ok(Err(e)) => {
            stderr_task.abort();
            Err(EncoderError::IoError(e))
        }
        Err(_elapsed) => {
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "Failed to kill timed-out encoder");
            }
            stderr_task.abort();
            tracing::warn!(timeout_secs = config.timeout.as_secs(), "Encoder timed out");
            Err(EncoderError::Timeout(config.timeout))
        }
    }
}

async fn read_capped<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut kept = Vec::new();
    let Some(mut h) = handle else {
        return kept;
    };
    let mut chunk = [0u8; 8192];
    loop {
        match h.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = MAX_STDERR_BYTES.saturating_sub(kept.len());
                kept.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }
    kept
}
