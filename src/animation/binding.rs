use crate::scene::NodeHandle;

/// The node property a track drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetPath {
    Translation,
    Rotation,
    Scale,
}

/// A clip track resolved against one model: `track_index` in the clip feeds
/// `target` on the node at `node_handle`.
///
/// Bindings are built once when an action is created, so sampling never
/// looks nodes up by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyBinding {
    pub node_handle: NodeHandle,
    pub target: TargetPath,
    pub track_index: usize,
}
