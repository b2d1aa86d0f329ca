//! Error Types
//!
//! This module defines the error types used throughout the previewer.
//!
//! # Overview
//!
//! The main error type [`Error`] groups the failure modes of each subsystem:
//! - [`AssetError`]: model and clip byte streams that cannot be decoded
//! - [`PlaybackError`]: clip library and selection failures
//! - [`AnnotationError`]: comment editing and import/export failures
//! - [`CaptureError`]: recording backend failures and conflicts
//!
//! None of these are fatal. Callers receive them as explicit results so a UI
//! layer can present a retry, and prior state is always retained.
//!
//! ```rust,ignore
//! use clipview::errors::{Error, Result};
//!
//! fn import(engine: &mut PreviewEngine, text: &str) -> Result<()> {
//!     engine.timeline_mut().import_str(text)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the previewer.
#[derive(Error, Debug)]
pub enum Error {
    /// Model or clip decoding failure.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Clip library or playback failure.
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// Annotation editing or document failure.
    #[error(transparent)]
    Annotation(#[from] AnnotationError),

    /// Recording failure.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Settings file could not be parsed.
    #[error("Settings error: {0}")]
    Settings(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ========================================================================
// Asset Loading Errors
// ========================================================================

/// A model or clip byte stream is malformed or unsupported.
///
/// Reported to the caller; never installs a partial model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// The glTF container or its accessors could not be parsed.
    #[error("Decode error in '{label}': {reason}")]
    Decode {
        /// Source label (file name or upload name)
        label: String,
        /// Human readable cause
        reason: String,
    },

    /// A standalone clip asset carried no animation.
    #[error("No animation found in '{0}'")]
    MissingAnimation(String),

    /// A buffer referenced an external URI, which a byte source cannot resolve.
    #[error("Unsupported buffer source in '{label}': {uri}")]
    UnsupportedBuffer {
        /// Source label
        label: String,
        /// Offending URI
        uri: String,
    },

    /// Reading the byte source failed.
    #[error("IO error reading '{label}': {reason}")]
    Io {
        /// Source label
        label: String,
        /// Human readable cause
        reason: String,
    },

    /// The decode task was cancelled or panicked.
    #[error("Load task failed: {0}")]
    TaskFailed(String),
}

impl AssetError {
    pub(crate) fn decode(label: &str, reason: impl ToString) -> Self {
        Self::Decode {
            label: label.to_string(),
            reason: reason.to_string(),
        }
    }
}

// ========================================================================
// Playback Errors
// ========================================================================

/// Clip library and playback errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// `select_clip` referenced a name with no descriptor.
    #[error("Unknown clip: {0}")]
    UnknownClip(String),

    /// A clip was selected before any model was installed.
    #[error("No model loaded")]
    NoModel,

    /// A clip with the same name is already registered.
    #[error("Clip '{0}' is already registered")]
    DuplicateClip(String),
}

// ========================================================================
// Annotation Errors
// ========================================================================

/// Annotation editing and document errors.
#[derive(Error, Debug)]
pub enum AnnotationError {
    /// The import document has no usable `comments` sequence.
    #[error("Import format error: {0}")]
    ImportFormat(String),

    /// Comment text was empty after trimming.
    #[error("Comment text is empty")]
    EmptyText,

    /// Comments can only be edited while playback is paused.
    #[error("Comments cannot be edited while playing")]
    EditWhilePlaying,

    /// No annotation with the given id.
    #[error("Annotation {0} not found")]
    NotFound(u64),

    /// JSON serialization or parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document file I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ========================================================================
// Capture Errors
// ========================================================================

/// Recording errors.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The encoder backend is missing or failed to initialize.
    #[error("Capture unavailable: {0}")]
    Unavailable(String),

    /// A capture session is already running.
    #[error("A capture session is already active")]
    Conflict,

    /// Stop was requested with no active session.
    #[error("No capture session is active")]
    NotActive,

    /// Encoding a frame failed.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Writing the output container failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for CaptureError {
    fn from(err: image::ImageError) -> Self {
        CaptureError::Encode(err.to_string())
    }
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
