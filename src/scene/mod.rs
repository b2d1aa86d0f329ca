//! Scene graph of a loaded model.
//!
//! Nodes live in a slotmap and form a hierarchy through parent/child
//! handles. Each node carries a TRS [`Transform`] and, when it owns mesh
//! geometry, the local bounding box of that geometry. World matrices are
//! refreshed by [`Scene::update_matrix_world`] and feed
//! [`Scene::compute_bounding_box`], which camera framing consumes.

pub mod bounds;
pub mod camera;
pub mod framing;
pub mod node;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod transform;

use slotmap::new_key_type;

new_key_type! {
    /// Handle to a node in a [`Scene`].
    pub struct NodeHandle;
}

pub use bounds::Aabb;
pub use camera::{Camera, CameraPose};
pub use framing::CameraFraming;
pub use node::Node;
pub use scene::Scene;
pub use transform::Transform;
