use std::path::Path;

use chrono::Utc;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::AnnotationError;
use crate::playback::PlaybackState;
use crate::timeline::annotation::{Annotation, MAX_FRAME, MAX_ID, now_millis};
use crate::timeline::document::AnnotationDocument;

/// Frames per second of the `m:ss:ff` readout.
const READOUT_FPS: f32 = 30.0;

/// Maps playback time to a frame slot: `round(time / duration * 100)`.
///
/// Returns 0 when `duration` is not positive, and always stays in `0..=100`.
#[must_use]
pub fn frame_for_time(time: f32, duration: f32) -> u32 {
    if duration.is_nan() || duration <= 0.0 || !time.is_finite() {
        return 0;
    }
    let slot = (time / duration * MAX_FRAME as f32).round();
    slot.clamp(0.0, MAX_FRAME as f32) as u32
}

/// Formats seconds as `m:ss:ff`, frames counted at 30 fps.
#[must_use]
pub fn format_time(seconds: f32) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let minutes = (seconds / 60.0).floor() as u32;
    let secs = (seconds % 60.0).floor() as u32;
    let frames = ((seconds % 1.0) * READOUT_FPS).floor() as u32;
    format!("{minutes}:{secs:02}:{frames:02}")
}

/// Owns the annotation collection.
///
/// Every mutation either applies fully or leaves the collection untouched.
#[derive(Debug, Default)]
pub struct TimelineSync {
    annotations: Vec<Annotation>,
    last_id: u64,
}

impl TimelineSync {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// The annotation occupying `frame`, if any.
    #[must_use]
    pub fn annotation_at(&self, frame: u32) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.frame == frame)
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Appends an annotation at `frame` and returns its id.
    pub fn add_annotation(
        &mut self,
        frame: u32,
        text: &str,
        clip_name: Option<&str>,
    ) -> Result<u64, AnnotationError> {
        if text.trim().is_empty() {
            return Err(AnnotationError::EmptyText);
        }
        let id = self.next_id();
        self.annotations
            .push(Annotation::new(id, frame, text, clip_name.map(str::to_string)));
        Ok(id)
    }

    pub fn update_annotation(&mut self, id: u64, text: &str) -> Result<(), AnnotationError> {
        if text.trim().is_empty() {
            return Err(AnnotationError::EmptyText);
        }
        let annotation = self
            .annotations
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AnnotationError::NotFound(id))?;
        annotation.text = text.to_string();
        Ok(())
    }

    pub fn delete_annotation(&mut self, id: u64) -> Result<Annotation, AnnotationError> {
        let index = self
            .annotations
            .iter()
            .position(|a| a.id == id)
            .ok_or(AnnotationError::NotFound(id))?;
        Ok(self.annotations.remove(index))
    }

    /// Writes `text` at the frame slot of the paused playback position.
    ///
    /// Updates the slot's annotation when one exists, otherwise adds one.
    /// Rejected while playing, since the slot would move under the editor.
    pub fn submit_comment(
        &mut self,
        state: &PlaybackState,
        text: &str,
    ) -> Result<u64, AnnotationError> {
        if state.is_playing {
            return Err(AnnotationError::EditWhilePlaying);
        }
        let frame = frame_for_time(state.current_time, state.duration_seconds);
        match self.annotation_at(frame).map(|a| a.id) {
            Some(id) => {
                self.update_annotation(id, text)?;
                Ok(id)
            }
            None => self.add_annotation(frame, text, state.active_clip_name.as_deref()),
        }
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
    }

    /// Millisecond timestamp, bumped past the last id handed out or imported.
    fn next_id(&mut self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        self.last_id = now.max(self.last_id.saturating_add(1));
        self.last_id
    }

    // ========================================================================
    // Export
    // ========================================================================

    #[must_use]
    pub fn export_document(&self, clip_name: Option<&str>, duration: f32) -> AnnotationDocument {
        AnnotationDocument {
            animation: clip_name.map(str::to_string),
            duration,
            comments: self.annotations.clone(),
            export_date: now_millis(),
        }
    }

    pub fn export_string(
        &self,
        clip_name: Option<&str>,
        duration: f32,
    ) -> Result<String, AnnotationError> {
        Ok(serde_json::to_string_pretty(
            &self.export_document(clip_name, duration),
        )?)
    }

    pub fn export_to_path(
        &self,
        path: impl AsRef<Path>,
        clip_name: Option<&str>,
        duration: f32,
    ) -> Result<(), AnnotationError> {
        let text = self.export_string(clip_name, duration)?;
        std::fs::write(path.as_ref(), text)?;
        log::info!(
            "Exported {} annotations to {}",
            self.annotations.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    // ========================================================================
    // Import
    // ========================================================================

    /// Replaces the collection with `document.comments`.
    ///
    /// The document is validated as a whole first; a missing or malformed
    /// `comments` field, or any invalid entry, leaves the collection as it
    /// was. Returns the number of imported annotations.
    pub fn import_value(&mut self, document: &Value) -> Result<usize, AnnotationError> {
        let comments = match parse_comments(document) {
            Ok(comments) => comments,
            Err(e) => {
                log::warn!("Annotation import rejected: {e}");
                return Err(e);
            }
        };

        if let Some(max_id) = comments.iter().map(|a| a.id).max() {
            self.last_id = self.last_id.max(max_id);
        }
        let count = comments.len();
        self.annotations = comments;
        log::info!("Imported {count} annotations");
        Ok(count)
    }

    pub fn import_str(&mut self, text: &str) -> Result<usize, AnnotationError> {
        let value: Value = serde_json::from_str(text)?;
        self.import_value(&value)
    }

    pub fn import_from_path(&mut self, path: impl AsRef<Path>) -> Result<usize, AnnotationError> {
        let text = std::fs::read_to_string(path)?;
        self.import_str(&text)
    }
}

fn parse_comments(document: &Value) -> Result<Vec<Annotation>, AnnotationError> {
    let Some(entries) = document.get("comments") else {
        return Err(AnnotationError::ImportFormat(
            "missing `comments` field".to_string(),
        ));
    };
    let Value::Array(entries) = entries else {
        return Err(AnnotationError::ImportFormat(
            "`comments` is not a sequence".to_string(),
        ));
    };

    let mut seen = FxHashSet::default();
    let mut comments = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let annotation = Annotation::deserialize(entry)
            .map_err(|e| AnnotationError::ImportFormat(format!("comment {index}: {e}")))?;
        if annotation.frame > MAX_FRAME {
            return Err(AnnotationError::ImportFormat(format!(
                "comment {index}: frame {} outside 0..={MAX_FRAME}",
                annotation.frame
            )));
        }
        if annotation.id > MAX_ID {
            return Err(AnnotationError::ImportFormat(format!(
                "comment {index}: id {} above {MAX_ID}",
                annotation.id
            )));
        }
        if !seen.insert(annotation.id) {
            return Err(AnnotationError::ImportFormat(format!(
                "comment {index}: duplicate id {}",
                annotation.id
            )));
        }
        comments.push(annotation);
    }
    Ok(comments)
}
