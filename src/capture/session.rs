use std::path::PathBuf;
use std::thread::JoinHandle;

use chrono::Utc;

use crate::capture::encoder::{EncoderBackend, EncoderConfig, backend_for};
use crate::capture::surface::{FrameRgba, RenderSurface};
use crate::errors::CaptureError;
use crate::settings::CaptureSettings;

/// The file produced by a completed capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOutput {
    pub path: PathBuf,
    pub bytes: u64,
    pub frames: u64,
}

/// State of the one running capture.
struct ActiveCapture {
    duration_seconds: f64,
    elapsed_seconds: f64,
    frames_sent: u64,
    frame_tx: flume::Sender<FrameRgba>,
    chunk_rx: flume::Receiver<Vec<u8>>,
    chunks: Vec<Vec<u8>>,
    worker: JoinHandle<Result<u64, CaptureError>>,
    extension: &'static str,
}

impl ActiveCapture {
    /// Frame slots due at the current elapsed time, counting the one at t = 0.
    fn due_slots(&self, fps: f64) -> u64 {
        let total = (self.duration_seconds * fps).ceil().max(1.0) as u64;
        let elapsed = self.elapsed_seconds.min(self.duration_seconds);
        ((elapsed * fps).floor() as u64 + 1).min(total)
    }
}

/// Fixed-rate, fixed-duration recording of a [`RenderSurface`].
///
/// The countdown is driven by [`tick`](Self::tick) or, on frames with no
/// surface to read, [`advance`](Self::advance); the session never reads the
/// wall clock. At most one recording is active at a time.
pub struct CaptureSession {
    settings: CaptureSettings,
    backend: Box<dyn EncoderBackend>,
    active: Option<ActiveCapture>,
}

impl CaptureSession {
    /// Creates a session using the backend named in `settings`.
    #[must_use]
    pub fn new(settings: CaptureSettings) -> Self {
        let backend = backend_for(&settings);
        Self::with_backend(settings, backend)
    }

    #[must_use]
    pub fn with_backend(settings: CaptureSettings, backend: Box<dyn EncoderBackend>) -> Self {
        Self {
            settings,
            backend,
            active: None,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Whole seconds left, rounded up. 0 when idle.
    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.active.as_ref().map_or(0, |a| {
            (a.duration_seconds - a.elapsed_seconds).max(0.0).ceil() as u32
        })
    }

    #[must_use]
    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Starts recording `surface` for `duration_ms`.
    ///
    /// Fails with [`CaptureError::Conflict`] while another recording runs,
    /// leaving it untouched, and with [`CaptureError::Unavailable`] when the
    /// encoder cannot start. No session exists after a failed start.
    pub fn start(
        &mut self,
        surface: &mut dyn RenderSurface,
        duration_ms: u64,
    ) -> Result<(), CaptureError> {
        if self.active.is_some() {
            log::warn!("Capture start rejected: a session is already active");
            return Err(CaptureError::Conflict);
        }

        let (width, height) = surface.dimensions();
        let config = EncoderConfig {
            width,
            height,
            fps: self.settings.fps.max(1),
        };

        let (chunk_tx, chunk_rx) = flume::unbounded();
        let (frame_tx, frame_rx) = flume::unbounded::<FrameRgba>();

        let mut encoder = self.backend.open(config, chunk_tx).map_err(|e| {
            log::error!("Capture backend '{}' failed to start: {e}", self.backend.name());
            match e {
                CaptureError::Unavailable(_) => e,
                other => CaptureError::Unavailable(other.to_string()),
            }
        })?;

        let worker = std::thread::Builder::new()
            .name("clipview-capture".to_string())
            .spawn(move || -> Result<u64, CaptureError> {
                let mut frames = 0;
                for frame in frame_rx.iter() {
                    encoder.encode(&frame)?;
                    frames += 1;
                }
                encoder.finish()?;
                Ok(frames)
            })
            .map_err(|e| CaptureError::Unavailable(format!("failed to spawn encoder: {e}")))?;

        self.active = Some(ActiveCapture {
            duration_seconds: duration_ms as f64 / 1000.0,
            elapsed_seconds: 0.0,
            frames_sent: 0,
            frame_tx,
            chunk_rx,
            chunks: Vec::new(),
            worker,
            extension: self.backend.extension(),
        });

        log::info!(
            "Capture started: {width}x{height} @ {} fps for {duration_ms} ms ({})",
            config.fps,
            self.backend.name()
        );

        // First frame at t = 0.
        if let Err(e) = self.sample(surface) {
            if let Some(active) = self.active.take() {
                Self::abandon(active);
            }
            log::error!("Capture start aborted: first frame unreadable: {e}");
            return Err(CaptureError::Unavailable(e.to_string()));
        }
        Ok(())
    }

    /// Advances the countdown by `dt` seconds, sampling the surface for every
    /// frame slot that came due.
    ///
    /// Returns the output once the duration has elapsed. If the surface can
    /// no longer be read, the recording so far is still written and the read
    /// error is returned.
    pub fn tick(
        &mut self,
        dt: f32,
        surface: &mut dyn RenderSurface,
    ) -> Result<Option<CaptureOutput>, CaptureError> {
        self.step(dt, Some(surface))
    }

    /// Advances the countdown without reading pixels.
    ///
    /// Slots that come due are skipped, not duplicated later. The recording
    /// still stops on time.
    pub fn advance(&mut self, dt: f32) -> Result<Option<CaptureOutput>, CaptureError> {
        self.step(dt, None)
    }

    fn step(
        &mut self,
        dt: f32,
        surface: Option<&mut dyn RenderSurface>,
    ) -> Result<Option<CaptureOutput>, CaptureError> {
        let fps = f64::from(self.settings.fps.max(1));
        let Some(active) = self.active.as_mut() else {
            return Ok(None);
        };
        active.elapsed_seconds += f64::from(dt.max(0.0));
        active.chunks.extend(active.chunk_rx.try_iter());
        let finished = active.elapsed_seconds >= active.duration_seconds;
        if surface.is_none() {
            active.frames_sent = active.frames_sent.max(active.due_slots(fps));
        }

        let sampled = match surface {
            Some(surface) => self.sample(surface),
            None => Ok(()),
        };
        if sampled.is_ok() && !finished {
            return Ok(None);
        }

        let Some(active) = self.active.take() else {
            return Ok(None);
        };
        let output = self.finalize(active);
        if let Err(e) = sampled {
            match &output {
                Ok(partial) => log::warn!(
                    "Capture aborted ({e}); partial recording kept at {}",
                    partial.path.display()
                ),
                Err(flush) => log::error!("Capture aborted ({e}); flush failed: {flush}"),
            }
            return Err(e);
        }
        output.map(Some)
    }

    /// Ends the recording early and writes what was captured so far.
    pub fn stop(&mut self) -> Result<CaptureOutput, CaptureError> {
        let active = self.active.take().ok_or(CaptureError::NotActive)?;
        log::info!("Capture stopped explicitly");
        self.finalize(active)
    }

    /// Sends one surface read for every frame slot due but not yet sent.
    fn sample(&mut self, surface: &mut dyn RenderSurface) -> Result<(), CaptureError> {
        let fps = f64::from(self.settings.fps.max(1));
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };

        let due = active.due_slots(fps);
        if due <= active.frames_sent {
            return Ok(());
        }

        let frame = surface.read_frame()?;
        for _ in active.frames_sent..due {
            active
                .frame_tx
                .send(frame.clone())
                .map_err(|_| CaptureError::Encode("encoder stopped".to_string()))?;
        }
        active.frames_sent = due;
        Ok(())
    }

    /// Stops the encoder and discards everything it produced.
    fn abandon(active: ActiveCapture) {
        let ActiveCapture {
            frame_tx, worker, ..
        } = active;
        drop(frame_tx);
        if worker.join().is_err() {
            log::error!("Capture encoder panicked while shutting down");
        }
    }

    /// Joins the encoder, writes the collected chunks and clears the buffer.
    fn finalize(&self, active: ActiveCapture) -> Result<CaptureOutput, CaptureError> {
        let ActiveCapture {
            frame_tx,
            chunk_rx,
            mut chunks,
            worker,
            extension,
            ..
        } = active;

        drop(frame_tx);
        let frames = worker
            .join()
            .map_err(|_| CaptureError::Encode("encoder thread panicked".to_string()))?;
        chunks.extend(chunk_rx.try_iter());
        let frames = frames?;

        std::fs::create_dir_all(&self.settings.output_dir)?;
        let file_name = format!(
            "{}_{}.{extension}",
            self.settings.file_prefix,
            Utc::now().timestamp_millis()
        );
        let path = self.settings.output_dir.join(file_name);

        let bytes: Vec<u8> = chunks.concat();
        std::fs::write(&path, &bytes)?;
        log::info!(
            "Capture written to {} ({} frames, {} chunks, {} bytes)",
            path.display(),
            frames,
            chunks.len(),
            bytes.len()
        );

        Ok(CaptureOutput {
            path,
            bytes: bytes.len() as u64,
            frames,
        })
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            log::warn!("Capture session dropped while active, flushing");
            if let Err(e) = self.finalize(active) {
                log::error!("Capture flush failed: {e}");
            }
        }
    }
}
