use rustc_hash::FxHashMap;

use crate::animation::binding::PropertyBinding;
use crate::animation::clip::AnimationClip;
use crate::scene::{NodeHandle, Scene};

pub struct Binder;

impl Binder {
    /// Resolves every track of `clip` to a node under `root` by node name.
    ///
    /// Tracks naming nodes that do not exist in the subtree are skipped; a
    /// clip authored for a different skeleton therefore binds partially or
    /// not at all, and is logged.
    #[must_use]
    pub fn bind(scene: &Scene, root: NodeHandle, clip: &AnimationClip) -> Vec<PropertyBinding> {
        let names = collect_names(scene, root);
        let mut bindings = Vec::with_capacity(clip.tracks.len());

        for (track_index, track) in clip.tracks.iter().enumerate() {
            if let Some(&node_handle) = names.get(track.meta.node_name.as_str()) {
                bindings.push(PropertyBinding {
                    track_index,
                    node_handle,
                    target: track.meta.target,
                });
            }
        }

        if bindings.len() < clip.tracks.len() {
            log::warn!(
                "Clip '{}': bound {} of {} tracks (skeleton mismatch?)",
                clip.name,
                bindings.len(),
                clip.tracks.len()
            );
        }

        bindings
    }
}

/// Name index of the subtree; the first node in depth-first order wins.
fn collect_names(scene: &Scene, root: NodeHandle) -> FxHashMap<&str, NodeHandle> {
    let mut names = FxHashMap::default();
    let mut stack = vec![root];

    while let Some(current) = stack.pop() {
        let Some(node) = scene.get_node(current) else {
            continue;
        };
        names.entry(node.name.as_str()).or_insert(current);
        stack.extend(node.children().iter().rev().copied());
    }

    names
}
