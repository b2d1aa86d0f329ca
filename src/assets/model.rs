use std::sync::Arc;

use uuid::Uuid;

use crate::animation::AnimationClip;
use crate::scene::{Aabb, NodeHandle, Scene};

/// A decoded model: its scene graph, bounds and embedded clips.
///
/// Owned by the playback controller for its lifetime; replacing it drops the
/// scene graph and every action bound to it.
#[derive(Debug, Clone)]
pub struct Model {
    pub id: Uuid,
    pub label: String,
    pub scene: Scene,
    /// Synthetic root every top-level node of the file hangs from.
    pub root: NodeHandle,
    /// World-space bounds in the rest pose.
    pub bounds: Aabb,
    /// Clips embedded in the model file.
    pub clips: Vec<Arc<AnimationClip>>,
}

impl Model {
    /// Recomputes bounds from the scene's current pose.
    pub fn refresh_bounds(&mut self) -> Aabb {
        self.scene.update_matrix_world();
        self.bounds = self.scene.compute_bounding_box();
        self.bounds
    }
}
