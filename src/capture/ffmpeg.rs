use std::io::{Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::capture::encoder::{ChunkSender, EncoderBackend, EncoderConfig, FrameEncoder};
use crate::capture::surface::FrameRgba;
use crate::errors::CaptureError;

/// Size of the reads taken from ffmpeg's stdout; each read becomes a chunk.
const READ_CHUNK: usize = 64 * 1024;

/// VP9 in WebM, encoded by the system `ffmpeg`.
///
/// Raw RGBA frames go to ffmpeg's stdin; the muxed stream is read back from
/// its stdout on a drain thread and forwarded as chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegBackend;

impl FfmpegBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl EncoderBackend for FfmpegBackend {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn extension(&self) -> &'static str {
        "webm"
    }

    fn open(
        &self,
        config: EncoderConfig,
        chunks: ChunkSender,
    ) -> Result<Box<dyn FrameEncoder>, CaptureError> {
        if config.width == 0 || config.height == 0 || config.fps == 0 {
            return Err(CaptureError::Unavailable(
                "ffmpeg needs a non-empty surface and a non-zero rate".to_string(),
            ));
        }
        if !config.width.is_multiple_of(2) || !config.height.is_multiple_of(2) {
            return Err(CaptureError::Unavailable(format!(
                "yuv420p output needs even dimensions, got {}x{}",
                config.width, config.height
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(CaptureError::Unavailable(
                "ffmpeg was not found on PATH".to_string(),
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", config.width, config.height),
            "-r",
            &config.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libvpx-vp9",
            "-deadline",
            "realtime",
            "-cpu-used",
            "8",
            "-pix_fmt",
            "yuv420p",
            "-f",
            "webm",
            "pipe:1",
        ]);

        let mut child = cmd
            .spawn()
            .map_err(|e| CaptureError::Unavailable(format!("failed to spawn ffmpeg: {e}")))?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (Some(stdin), Some(mut stdout), Some(mut stderr)) = (stdin, stdout, stderr) else {
            let _ = child.kill();
            return Err(CaptureError::Unavailable(
                "failed to open ffmpeg pipes".to_string(),
            ));
        };

        let stdout_drain = std::thread::spawn(move || -> std::io::Result<()> {
            let mut buffer = vec![0u8; READ_CHUNK];
            loop {
                let n = stdout.read(&mut buffer)?;
                if n == 0 {
                    return Ok(());
                }
                if chunks.send(buffer[..n].to_vec()).is_err() {
                    return Ok(());
                }
            }
        });
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        log::debug!(
            "ffmpeg started: {}x{} @ {} fps",
            config.width,
            config.height,
            config.fps
        );

        Ok(Box::new(FfmpegEncoder {
            config,
            child,
            stdin: Some(stdin),
            stdout_drain: Some(stdout_drain),
            stderr_drain: Some(stderr_drain),
        }))
    }
}

struct FfmpegEncoder {
    config: EncoderConfig,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout_drain: Option<JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl FrameEncoder for FfmpegEncoder {
    fn encode(&mut self, frame: &FrameRgba) -> Result<(), CaptureError> {
        if frame.width != self.config.width || frame.height != self.config.height {
            return Err(CaptureError::Encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.config.width, self.config.height
            )));
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(CaptureError::Encode("ffmpeg stdin already closed".to_string()));
        };
        stdin
            .write_all(&frame.data)
            .map_err(|e| CaptureError::Encode(format!("failed to write frame to ffmpeg: {e}")))
    }

    fn finish(mut self: Box<Self>) -> Result<(), CaptureError> {
        drop(self.stdin.take());

        let status = self.child.wait()?;
        if let Some(handle) = self.stdout_drain.take() {
            handle
                .join()
                .map_err(|_| CaptureError::Encode("ffmpeg stdout drain panicked".to_string()))??;
        }
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| CaptureError::Encode("ffmpeg stderr drain panicked".to_string()))??,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(CaptureError::Encode(format!(
                "ffmpeg exited with {status}: {}",
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        // Only reached without `finish` when encoding failed part way.
        if self.stdin.take().is_some() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Returns `true` when `ffmpeg` can be invoked from `PATH`.
#[must_use]
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}
