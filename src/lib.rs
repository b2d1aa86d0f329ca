#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! # clipview
//!
//! Headless core of a character animation previewer: load a model and
//! standalone clips, cross-fade between clips, scrub and annotate the
//! timeline, frame the camera, and record the rendered playback.
//!
//! [`PreviewEngine`] ties the subsystems together; each one is usable on its
//! own through its module.

pub mod animation;
pub mod assets;
pub mod capture;
pub mod engine;
pub mod errors;
pub mod playback;
pub mod scene;
pub mod settings;
pub mod timeline;
pub mod utils;

pub use animation::{AnimationAction, AnimationClip, AnimationMixer, Binder, LoopMode};
pub use assets::{AssetServer, ByteSource, ClipLibrary, GltfLoader, LoadExecutor, Model};
pub use capture::{CaptureOutput, CaptureSession, FrameRgba, RenderSurface};
pub use engine::{FrameReport, PreviewCommand, PreviewEngine};
pub use errors::{Error, Result};
pub use playback::{PlaybackController, PlaybackState};
pub use scene::{Aabb, Camera, CameraFraming, CameraPose, Node, Scene};
pub use settings::{LoopPolicy, PreviewSettings};
pub use timeline::{Annotation, AnnotationDocument, TimelineSync, format_time, frame_for_time};
pub use utils::OrbitControls;
