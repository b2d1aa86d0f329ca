use std::path::Path;
use std::sync::Arc;

use crate::animation::AnimationClip;
use crate::assets::io::ByteSource;
use crate::errors::PlaybackError;

/// One selectable clip: an upload awaiting decode, or a decoded clip.
#[derive(Debug, Clone)]
pub struct ClipDescriptor {
    pub name: String,
    /// Bytes to decode. `None` for clips embedded in the model.
    pub source: Option<ByteSource>,
    pub clip: Option<Arc<AnimationClip>>,
}

impl ClipDescriptor {
    #[must_use]
    pub fn loaded(&self) -> bool {
        self.clip.is_some()
    }

    /// Duration once decoded, `0.0` before.
    #[must_use]
    pub fn duration_seconds(&self) -> f32 {
        self.clip.as_ref().map_or(0.0, |c| c.duration)
    }

    #[must_use]
    pub fn is_embedded(&self) -> bool {
        self.source.is_none()
    }
}

/// Clip descriptors of the session, in upload order.
#[derive(Debug, Default)]
pub struct ClipLibrary {
    entries: Vec<ClipDescriptor>,
}

impl ClipLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an upload under `name`. Names are unique per session.
    pub fn add_source(
        &mut self,
        name: impl Into<String>,
        source: ByteSource,
    ) -> Result<&ClipDescriptor, PlaybackError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(PlaybackError::DuplicateClip(name));
        }
        log::info!("Registered clip '{name}' from {}", source.label());
        self.entries.push(ClipDescriptor {
            name,
            source: Some(source),
            clip: None,
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Registers a file, named after its stem (`walk.glb` becomes `walk`).
    pub fn add_path(&mut self, path: impl AsRef<Path>) -> Result<&ClipDescriptor, PlaybackError> {
        let source = ByteSource::from_path(path);
        let name = source.stem();
        self.add_source(name, source)
    }

    /// Replaces the embedded clips of the previous model with `clips`.
    ///
    /// An embedded clip whose name collides with an upload is skipped.
    pub fn register_embedded(&mut self, clips: &[Arc<AnimationClip>]) {
        self.entries.retain(|d| !d.is_embedded());
        for clip in clips {
            if self.contains(&clip.name) {
                log::warn!("Embedded clip '{}' shadows an upload, skipped", clip.name);
                continue;
            }
            self.entries.push(ClipDescriptor {
                name: clip.name.clone(),
                source: None,
                clip: Some(Arc::clone(clip)),
            });
        }
    }

    /// Removes a descriptor, releasing its bytes and decoded clip.
    pub fn remove(&mut self, name: &str) -> Option<ClipDescriptor> {
        let index = self.entries.iter().position(|d| d.name == name)?;
        Some(self.entries.remove(index))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ClipDescriptor> {
        self.entries.iter().find(|d| d.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Stores a decoded clip. Returns `false` when the descriptor is gone.
    pub fn mark_loaded(&mut self, name: &str, clip: Arc<AnimationClip>) -> bool {
        match self.entries.iter_mut().find(|d| d.name == name) {
            Some(descriptor) => {
                descriptor.clip = Some(clip);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClipDescriptor> {
        self.entries.iter()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|d| d.name.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
