use glam::{Quat, Vec3, Vec4};
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};

use crate::animation::action::{AnimationAction, TrackValue};
use crate::animation::binding::TargetPath;
use crate::scene::{NodeHandle, Scene};

new_key_type! {
    /// Handle to an action owned by an [`AnimationMixer`].
    pub struct ActionHandle;
}

/// Rest transform of a node, captured before any action writes to it.
#[derive(Debug, Clone, Copy)]
struct RestPose {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
}

/// Weighted accumulator for one node.
#[derive(Debug, Clone, Copy, Default)]
struct PoseAccumulator {
    position: Vec3,
    position_weight: f32,
    rotation: Vec4,
    rotation_weight: f32,
    scale: Vec3,
    scale_weight: f32,
}

impl PoseAccumulator {
    fn add(&mut self, target: TargetPath, value: TrackValue, weight: f32) {
        match (target, value) {
            (TargetPath::Translation, TrackValue::Vector3(v)) => {
                self.position += v * weight;
                self.position_weight += weight;
            }
            (TargetPath::Scale, TrackValue::Vector3(v)) => {
                self.scale += v * weight;
                self.scale_weight += weight;
            }
            (TargetPath::Rotation, TrackValue::Quaternion(q)) => {
                // Keep every contribution in the same hemisphere as the first.
                let mut v = Vec4::from(q);
                if self.rotation_weight > 0.0 && self.rotation.dot(v) < 0.0 {
                    v = -v;
                }
                self.rotation += v * weight;
                self.rotation_weight += weight;
            }
            _ => {}
        }
    }

    /// Fills the weight missing to reach 1 from the rest pose and resolves.
    fn resolve(mut self, rest: &RestPose) -> (Vec3, Quat, Vec3) {
        if self.position_weight < 1.0 {
            self.add(
                TargetPath::Translation,
                TrackValue::Vector3(rest.position),
                1.0 - self.position_weight,
            );
        }
        if self.rotation_weight < 1.0 {
            self.add(
                TargetPath::Rotation,
                TrackValue::Quaternion(rest.rotation),
                1.0 - self.rotation_weight,
            );
        }
        if self.scale_weight < 1.0 {
            self.add(
                TargetPath::Scale,
                TrackValue::Vector3(rest.scale),
                1.0 - self.scale_weight,
            );
        }

        let rotation = if self.rotation.length_squared() > f32::EPSILON {
            Quat::from_vec4(self.rotation / self.rotation_weight).normalize()
        } else {
            rest.rotation
        };

        (
            self.position / self.position_weight,
            rotation,
            self.scale / self.scale_weight,
        )
    }
}

/// Owns the actions of one model and blends them into its scene graph.
#[derive(Default)]
pub struct AnimationMixer {
    actions: SlotMap<ActionHandle, AnimationAction>,
    rest_poses: FxHashMap<NodeHandle, RestPose>,
}

impl AnimationMixer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an action and records the rest pose of every node it binds.
    pub fn add_action(&mut self, action: AnimationAction, scene: &Scene) -> ActionHandle {
        for binding in &action.bindings {
            if self.rest_poses.contains_key(&binding.node_handle) {
                continue;
            }
            if let Some(node) = scene.get_node(binding.node_handle) {
                self.rest_poses.insert(
                    binding.node_handle,
                    RestPose {
                        position: node.transform.position,
                        rotation: node.transform.rotation,
                        scale: node.transform.scale,
                    },
                );
            }
        }
        self.actions.insert(action)
    }

    /// Removes an action, releasing its clip reference.
    pub fn remove_action(&mut self, handle: ActionHandle) -> Option<AnimationAction> {
        self.actions.remove(handle)
    }

    #[must_use]
    pub fn action(&self, handle: ActionHandle) -> Option<&AnimationAction> {
        self.actions.get(handle)
    }

    pub fn action_mut(&mut self, handle: ActionHandle) -> Option<&mut AnimationAction> {
        self.actions.get_mut(handle)
    }

    /// Number of live actions.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Drops every action and restores the rest pose.
    pub fn stop_all(&mut self, scene: &mut Scene) {
        self.actions.clear();
        self.apply(scene);
    }

    /// Advances every action by `dt`.
    pub fn update(&mut self, dt: f32) {
        for action in self.actions.values_mut() {
            action.update(dt);
        }
    }

    /// Samples every weighted action and writes the blended pose.
    ///
    /// Nodes touched by no action with positive weight return to rest.
    pub fn apply(&mut self, scene: &mut Scene) {
        let mut accumulators: FxHashMap<NodeHandle, PoseAccumulator> = FxHashMap::default();

        for action in self.actions.values_mut() {
            if !action.enabled || action.weight <= 0.0 {
                continue;
            }
            let weight = action.weight.min(1.0);
            for index in 0..action.bindings.len() {
                let binding = action.bindings[index];
                if let Some(value) = action.sample_track(binding.track_index) {
                    accumulators
                        .entry(binding.node_handle)
                        .or_default()
                        .add(binding.target, value, weight);
                }
            }
        }

        for (&node_handle, rest) in &self.rest_poses {
            let Some(node) = scene.get_node_mut(node_handle) else {
                continue;
            };
            let (position, rotation, scale) = accumulators
                .get(&node_handle)
                .copied()
                .unwrap_or_default()
                .resolve(rest);
            node.transform.position = position;
            node.transform.rotation = rotation;
            node.transform.scale = scale;
            node.transform.mark_dirty();
        }
    }
}
