//! Timed recording of the rendered output.
//!
//! A [`CaptureSession`] samples a [`RenderSurface`] at a fixed rate for a
//! fixed duration, feeds the frames to an encoder running on its own thread,
//! and collects the encoded chunks in order. When the session ends, by
//! timeout or by an explicit stop, the chunks are written to one output
//! file and the buffer is released.
//!
//! Two encoders are available:
//! - [`MjpegBackend`]: pure Rust Motion-JPEG, always available
//! - [`FfmpegBackend`]: VP9 in WebM through the system `ffmpeg`

pub mod encoder;
pub mod ffmpeg;
pub mod mjpeg;
pub mod session;
pub mod surface;

pub use encoder::{ChunkSender, EncoderBackend, EncoderConfig, FrameEncoder, backend_for};
pub use ffmpeg::{FfmpegBackend, is_ffmpeg_on_path};
pub use mjpeg::MjpegBackend;
pub use session::{CaptureOutput, CaptureSession};
pub use surface::{FrameRgba, RenderSurface};
