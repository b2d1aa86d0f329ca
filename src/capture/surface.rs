use crate::errors::CaptureError;

/// One rendered frame: tightly packed RGBA8, straight alpha, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRgba {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CaptureError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(CaptureError::Encode(format!(
                "frame of {width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A frame filled with one color.
    #[must_use]
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    /// Drops alpha, compositing over black.
    #[must_use]
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.data.len() / 4 * 3);
        for px in self.data.chunks_exact(4) {
            let a = u16::from(px[3]);
            for &c in &px[..3] {
                rgb.push(((u16::from(c) * a + 127) / 255) as u8);
            }
        }
        rgb
    }
}

/// Something the previewer renders into and the capture can read back.
pub trait RenderSurface {
    /// Size in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Reads the most recently presented frame.
    fn read_frame(&mut self) -> Result<FrameRgba, CaptureError>;
}
