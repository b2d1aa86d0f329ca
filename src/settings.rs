//! Previewer Settings
//!
//! All tunables of the preview core live in [`PreviewSettings`]. Every field
//! has a default, so a settings file only needs the values it overrides.
//!
//! ```rust,ignore
//! use clipview::settings::{PreviewSettings, LoopPolicy};
//!
//! let mut settings = PreviewSettings::from_json_file("clipview.json")?;
//! settings.playback.loop_policy = LoopPolicy::Loop;
//! let engine = PreviewEngine::new(settings)?;
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// What happens when playback reaches the end of the active clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPolicy {
    /// Hold the last frame and pause.
    #[default]
    Clamp,
    /// Wrap to the start and keep playing.
    Loop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Cross-fade window between clips, in seconds.
    pub fade_seconds: f32,
    pub loop_policy: LoopPolicy,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            fade_seconds: 0.2,
            loop_policy: LoopPolicy::Clamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Framing distance multiplier.
    pub margin: f32,
    /// Upward camera offset as a fraction of model height.
    pub lift: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// World units moved per zoom step.
    pub zoom_step: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 50.0,
            margin: 1.5,
            lift: 0.3,
            min_distance: 2.0,
            max_distance: 50.0,
            zoom_step: 2.0,
        }
    }
}

/// Which encoder produces captured video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureBackendKind {
    /// In-process Motion-JPEG stream.
    #[default]
    Mjpeg,
    /// System `ffmpeg`, VP9 in WebM.
    Ffmpeg,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Samples per second taken from the render surface.
    pub fps: u32,
    /// Default recording length in milliseconds.
    pub duration_ms: u64,
    pub output_dir: PathBuf,
    pub file_prefix: String,
    pub backend: CaptureBackendKind,
    /// JPEG quality for the Motion-JPEG backend (1-100).
    pub jpeg_quality: u8,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            fps: 30,
            duration_ms: 10_000,
            output_dir: PathBuf::from("."),
            file_prefix: String::from("animation"),
            backend: CaptureBackendKind::Mjpeg,
            jpeg_quality: 85,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    pub playback: PlaybackSettings,
    pub camera: CameraSettings,
    pub capture: CaptureSettings,
}

impl PreviewSettings {
    /// Parses settings from JSON text; absent fields keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Settings(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
