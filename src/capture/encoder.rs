use crate::capture::ffmpeg::FfmpegBackend;
use crate::capture::mjpeg::MjpegBackend;
use crate::capture::surface::FrameRgba;
use crate::errors::CaptureError;
use crate::settings::{CaptureBackendKind, CaptureSettings};

/// Where encoders deliver encoded chunks, in stream order.
pub type ChunkSender = flume::Sender<Vec<u8>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Factory for encoders of one container format.
pub trait EncoderBackend: Send {
    fn name(&self) -> &'static str;

    /// File extension of the produced container, without the dot.
    fn extension(&self) -> &'static str;

    /// Starts an encoder. Fails with [`CaptureError::Unavailable`] when the
    /// backend cannot run on this system.
    fn open(
        &self,
        config: EncoderConfig,
        chunks: ChunkSender,
    ) -> Result<Box<dyn FrameEncoder>, CaptureError>;
}

/// A running encoder. Lives on the capture worker thread.
pub trait FrameEncoder: Send {
    fn encode(&mut self, frame: &FrameRgba) -> Result<(), CaptureError>;

    /// Flushes trailing data; every chunk has been sent once this returns.
    fn finish(self: Box<Self>) -> Result<(), CaptureError>;
}

/// The backend selected by the settings.
#[must_use]
pub fn backend_for(settings: &CaptureSettings) -> Box<dyn EncoderBackend> {
    match settings.backend {
        CaptureBackendKind::Mjpeg => Box::new(MjpegBackend::new(settings.jpeg_quality)),
        CaptureBackendKind::Ffmpeg => Box::new(FfmpegBackend::new()),
    }
}
