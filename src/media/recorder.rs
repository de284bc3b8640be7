/// Camera capture.
///
/// `CameraRecorder` is the seam the Create screen records through. The
/// desktop implementation shells out to `ffmpeg`, reading the platform's
/// default camera and writing one mp4 per session into the capture cache.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::oneshot;

use super::blob::MediaBlob;
use crate::create::draft::CameraMode;

/// Parameters for one recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordRequest {
    /// Duration cap in seconds (0 = unlimited, stop manually)
    pub max_duration_secs: u32,
    /// Creative mode, used to pick a capture filter
    pub theme: CameraMode,
}

/// Error type for camera capture
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("recording failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("recording produced an empty file: {0}")]
    EmptyCapture(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Produces exactly one complete media blob per `record` call.
/// Partial or empty captures are reported as errors, never as blobs.
#[async_trait]
pub trait CameraRecorder: Send + Sync {
    async fn record(&self, request: RecordRequest) -> Result<MediaBlob, RecorderError>;

    /// Ask an in-flight recording to finish early
    fn stop(&self) {}
}

/// Records from the default camera with an ffmpeg subprocess
pub struct FfmpegRecorder {
    binary: String,
    device: Option<String>,
    output_dir: PathBuf,
    /// Stop signal of the session currently holding the camera
    stop: Mutex<Option<(u64, oneshot::Sender<()>)>>,
    sessions: AtomicU64,
}

impl FfmpegRecorder {
    pub fn new(binary: impl Into<String>, device: Option<String>, output_dir: PathBuf) -> Self {
        Self {
            binary: binary.into(),
            device,
            output_dir,
            stop: Mutex::new(None),
            sessions: AtomicU64::new(0),
        }
    }

    /// Register a new session, stopping whichever one still holds the camera
    fn begin_session(&self) -> (u64, oneshot::Receiver<()>) {
        let session = self.sessions.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = oneshot::channel();

        let previous = self
            .stop
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace((session, tx));
        if let Some((old, old_tx)) = previous {
            tracing::warn!("⚠️  recording {} still running, stopping it for {}", old, session);
            let _ = old_tx.send(());
        }

        (session, rx)
    }

    /// Clear the stop slot if it still belongs to `session`
    fn end_session(&self, session: u64) {
        let mut slot = self.stop.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(slot.as_ref(), Some((current, _)) if *current == session) {
            slot.take();
        }
    }

    #[cfg(test)]
    fn active_session(&self) -> Option<u64> {
        self.stop
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|(session, _)| *session)
    }

    /// Full ffmpeg argument list for one session
    pub fn command_args(&self, request: &RecordRequest, output: &Path) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-y"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        args.extend(input_args(self.device.as_deref()));

        if request.max_duration_secs > 0 {
            args.push("-t".to_string());
            args.push(request.max_duration_secs.to_string());
        }

        if let Some(filter) = theme_filter(request.theme) {
            args.push("-vf".to_string());
            args.push(filter.to_string());
        }

        for arg in ["-c:v", "libx264", "-preset", "veryfast", "-pix_fmt", "yuv420p"] {
            args.push(arg.to_string());
        }
        args.push(output.to_string_lossy().to_string());
        args
    }
}

#[async_trait]
impl CameraRecorder for FfmpegRecorder {
    async fn record(&self, request: RecordRequest) -> Result<MediaBlob, RecorderError> {
        let (session, stop_rx) = self.begin_session();
        let result = self.capture(session, request, stop_rx).await;
        self.end_session(session);
        result
    }

    fn stop(&self) {
        if let Some((session, tx)) = self.stop.lock().unwrap_or_else(|e| e.into_inner()).take() {
            tracing::debug!("⏹️  stopping recording {}", session);
            let _ = tx.send(());
        }
    }
}

impl FfmpegRecorder {
    /// Run one ffmpeg session until it exits or `stop_rx` fires
    async fn capture(
        &self,
        session: u64,
        request: RecordRequest,
        stop_rx: oneshot::Receiver<()>,
    ) -> Result<MediaBlob, RecorderError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let file_name = format!("capture-{}-{}.mp4", Utc::now().timestamp_millis(), session);
        let output = self.output_dir.join(&file_name);

        tracing::info!(
            limit_secs = request.max_duration_secs,
            theme = request.theme.id(),
            "🎥 recording to {}",
            output.display()
        );

        let mut child = Command::new(&self.binary)
            .args(self.command_args(&request, &output))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(RecorderError::NotFound)?;

        let mut stdin = child.stdin.take();
        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut buf).await;
            }
            buf
        });

        let waited = tokio::select! {
            status = child.wait() => Some(status),
            Ok(()) = stop_rx => None,
        };

        let status = match waited {
            Some(status) => status?,
            None => {
                // 'q' makes ffmpeg finalize the container before exiting
                if let Some(mut pipe) = stdin.take() {
                    let _ = pipe.write_all(b"q").await;
                }
                child.wait().await?
            }
        };
        drop(stdin);

        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let _ = tokio::fs::remove_file(&output).await;
            return Err(RecorderError::ExecutionFailed {
                exit_code: status.code(),
                stderr,
            });
        }

        let size = tokio::fs::metadata(&output).await.map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            let _ = tokio::fs::remove_file(&output).await;
            return Err(RecorderError::EmptyCapture(output));
        }

        tracing::info!("✅ capture complete: {} ({} bytes)", file_name, size);
        Ok(MediaBlob::new(file_name, output, size))
    }
}

/// Input options for the platform's default camera
fn input_args(device: Option<&str>) -> Vec<String> {
    let args: Vec<String> = if cfg!(target_os = "macos") {
        vec![
            "-f".into(),
            "avfoundation".into(),
            "-framerate".into(),
            "30".into(),
            "-i".into(),
            device.unwrap_or("0:0").into(),
        ]
    } else if cfg!(target_os = "windows") {
        vec![
            "-f".into(),
            "dshow".into(),
            "-i".into(),
            format!("video={}", device.unwrap_or("Integrated Camera")),
        ]
    } else {
        vec![
            "-f".into(),
            "v4l2".into(),
            "-i".into(),
            device.unwrap_or("/dev/video0").into(),
        ]
    };
    args
}

/// Capture filter matching the creative mode
fn theme_filter(theme: CameraMode) -> Option<&'static str> {
    match theme {
        CameraMode::KidsStory => Some("eq=saturation=1.35:brightness=0.04"),
        CameraMode::Mindful => Some("eq=saturation=0.85,gblur=sigma=0.8"),
        CameraMode::Normal | CameraMode::Learning | CameraMode::Duet => None,
    }
}
