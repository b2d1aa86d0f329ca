use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;

use crate::capture::encoder::{ChunkSender, EncoderBackend, EncoderConfig, FrameEncoder};
use crate::capture::surface::FrameRgba;
use crate::errors::CaptureError;

/// Motion-JPEG: every frame is a complete JPEG, concatenated into one stream.
#[derive(Debug, Clone, Copy)]
pub struct MjpegBackend {
    quality: u8,
}

impl MjpegBackend {
    #[must_use]
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for MjpegBackend {
    fn default() -> Self {
        Self::new(85)
    }
}

impl EncoderBackend for MjpegBackend {
    fn name(&self) -> &'static str {
        "mjpeg"
    }

    fn extension(&self) -> &'static str {
        "mjpeg"
    }

    fn open(
        &self,
        config: EncoderConfig,
        chunks: ChunkSender,
    ) -> Result<Box<dyn FrameEncoder>, CaptureError> {
        if config.width == 0 || config.height == 0 {
            return Err(CaptureError::Unavailable(
                "render surface has zero size".to_string(),
            ));
        }
        Ok(Box::new(MjpegEncoder {
            config,
            quality: self.quality,
            chunks,
        }))
    }
}

struct MjpegEncoder {
    config: EncoderConfig,
    quality: u8,
    chunks: ChunkSender,
}

impl FrameEncoder for MjpegEncoder {
    fn encode(&mut self, frame: &FrameRgba) -> Result<(), CaptureError> {
        if frame.width != self.config.width || frame.height != self.config.height {
            return Err(CaptureError::Encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.config.width, self.config.height
            )));
        }

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.quality).encode(
            &frame.to_rgb8(),
            frame.width,
            frame.height,
            ExtendedColorType::Rgb8,
        )?;
        self.chunks
            .send(jpeg)
            .map_err(|_| CaptureError::Encode("chunk receiver dropped".to_string()))
    }

    fn finish(self: Box<Self>) -> Result<(), CaptureError> {
        Ok(())
    }
}
