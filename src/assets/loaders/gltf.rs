use std::sync::Arc;

use base64::Engine as _;
use glam::{Quat, Vec3};
use uuid::Uuid;

use crate::animation::binding::TargetPath;
use crate::animation::clip::{AnimationClip, Track, TrackData, TrackMeta};
use crate::animation::tracks::{InterpolationMode, KeyframeTrack};
use crate::assets::model::Model;
use crate::errors::AssetError;
use crate::scene::{Aabb, NodeHandle, Scene};

/// Decodes glTF 2.0 assets from a byte buffer.
///
/// Only what the previewer needs is extracted: the node hierarchy with TRS
/// transforms, per-node mesh bounds and skeletal animation tracks. Materials
/// and textures are left to the renderer.
pub struct GltfLoader<'a> {
    label: &'a str,
    gltf: gltf::Gltf,
    buffers: Vec<Vec<u8>>,
}

impl<'a> GltfLoader<'a> {
    /// Parses the container and resolves its buffers.
    pub fn parse(bytes: &[u8], label: &'a str) -> Result<Self, AssetError> {
        let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| AssetError::decode(label, e))?;
        let buffers = Self::load_buffers(&gltf, label)?;
        Ok(Self {
            label,
            gltf,
            buffers,
        })
    }

    /// Decodes a complete model with its embedded clips.
    pub fn load_model(bytes: &[u8], label: &'a str) -> Result<Model, AssetError> {
        let loader = Self::parse(bytes, label)?;
        loader.build_model()
    }

    /// Decodes the first animation of a standalone clip asset.
    pub fn load_clip(bytes: &[u8], label: &'a str) -> Result<AnimationClip, AssetError> {
        let loader = Self::parse(bytes, label)?;
        loader
            .load_animations()?
            .into_iter()
            .next()
            .ok_or_else(|| AssetError::MissingAnimation(label.to_string()))
    }

    fn load_buffers(gltf: &gltf::Gltf, label: &str) -> Result<Vec<Vec<u8>>, AssetError> {
        let mut buffer_data = Vec::new();
        for buffer in gltf.buffers() {
            let data = match buffer.source() {
                gltf::buffer::Source::Bin => gltf
                    .blob
                    .clone()
                    .ok_or_else(|| AssetError::decode(label, "missing GLB binary chunk"))?,
                gltf::buffer::Source::Uri(uri) => decode_data_uri(uri).ok_or_else(|| {
                    AssetError::UnsupportedBuffer {
                        label: label.to_string(),
                        uri: uri.chars().take(64).collect(),
                    }
                })??,
            };
            if data.len() < buffer.length() {
                return Err(AssetError::decode(
                    label,
                    format!(
                        "buffer {} holds {} bytes, {} declared",
                        buffer.index(),
                        data.len(),
                        buffer.length()
                    ),
                ));
            }
            buffer_data.push(data);
        }
        Ok(buffer_data)
    }

    fn build_model(&self) -> Result<Model, AssetError> {
        let mut scene = Scene::new();

        // 1. Nodes and transforms
        let mut node_mapping: Vec<NodeHandle> = Vec::with_capacity(self.gltf.nodes().count());
        for node in self.gltf.nodes() {
            let handle = scene.create_node_with_name(&node_name(&node));
            if let Some(engine_node) = scene.get_node_mut(handle) {
                let (t, r, s) = node.transform().decomposed();
                engine_node.transform.position = Vec3::from_array(t);
                engine_node.transform.rotation = Quat::from_array(r).normalize();
                engine_node.transform.scale = Vec3::from_array(s);
                if let Some(mesh) = node.mesh() {
                    engine_node.mesh_bounds = Self::mesh_bounds(&mesh);
                }
            }
            node_mapping.push(handle);
        }

        // 2. Hierarchy
        let root = scene.create_node_with_name("gltf_root");
        for node in self.gltf.nodes() {
            let parent = node_mapping[node.index()];
            for child in node.children() {
                scene.attach(node_mapping[child.index()], parent);
            }
        }
        if let Some(default_scene) = self.gltf.default_scene().or_else(|| self.gltf.scenes().next()) {
            for node in default_scene.nodes() {
                scene.attach(node_mapping[node.index()], root);
            }
        }
        // Nodes outside the default scene stay out of the model.
        scene.root_nodes.retain(|&h| h == root);

        // 3. Animations
        let clips = self
            .load_animations()?
            .into_iter()
            .map(Arc::new)
            .collect::<Vec<_>>();

        let mut model = Model {
            id: Uuid::new_v4(),
            label: self.label.to_string(),
            scene,
            root,
            bounds: Aabb::EMPTY,
            clips,
        };
        model.refresh_bounds();

        log::info!(
            "Decoded model '{}': {} nodes, {} embedded clips",
            self.label,
            model.scene.node_count(),
            model.clips.len()
        );
        Ok(model)
    }

    /// Union of the primitive bounds of a mesh, in mesh-local space.
    ///
    /// Taken from the POSITION accessor min/max, which glTF requires.
    fn mesh_bounds(mesh: &gltf::Mesh) -> Option<Aabb> {
        let bounds = mesh
            .primitives()
            .filter_map(|primitive| {
                let accessor = primitive.get(&gltf::Semantic::Positions)?;
                let min = accessor.min().as_ref().and_then(json_vec3)?;
                let max = accessor.max().as_ref().and_then(json_vec3)?;
                Some(Aabb::new(min, max))
            })
            .fold(Aabb::EMPTY, |acc, b| acc.union(&b));
        (!bounds.is_empty()).then_some(bounds)
    }

    fn load_animations(&self) -> Result<Vec<AnimationClip>, AssetError> {
        let mut animations = Vec::new();

        for anim in self.gltf.animations() {
            let mut tracks = Vec::new();

            for channel in anim.channels() {
                let reader =
                    channel.reader(|buffer| self.buffers.get(buffer.index()).map(Vec::as_slice));
                let target = channel.target();
                let node_name = node_name(&target.node());

                let Some(inputs) = reader.read_inputs() else {
                    return Err(AssetError::decode(
                        self.label,
                        format!("animation channel on '{node_name}' has no keyframe times"),
                    ));
                };
                let times: Vec<f32> = inputs.collect();

                let interpolation = match channel.sampler().interpolation() {
                    gltf::animation::Interpolation::Linear => InterpolationMode::Linear,
                    gltf::animation::Interpolation::Step => InterpolationMode::Step,
                    gltf::animation::Interpolation::CubicSpline => InterpolationMode::CubicSpline,
                };

                let outputs = reader.read_outputs();
                let (target_path, data) = match outputs {
                    Some(gltf::animation::util::ReadOutputs::Translations(iter)) => (
                        TargetPath::Translation,
                        TrackData::Vector3(KeyframeTrack::new(
                            times,
                            iter.map(Vec3::from_array).collect(),
                            interpolation,
                        )),
                    ),
                    Some(gltf::animation::util::ReadOutputs::Rotations(iter)) => (
                        TargetPath::Rotation,
                        TrackData::Quaternion(KeyframeTrack::new(
                            times,
                            iter.into_f32().map(Quat::from_array).collect(),
                            interpolation,
                        )),
                    ),
                    Some(gltf::animation::util::ReadOutputs::Scales(iter)) => (
                        TargetPath::Scale,
                        TrackData::Vector3(KeyframeTrack::new(
                            times,
                            iter.map(Vec3::from_array).collect(),
                            interpolation,
                        )),
                    ),
                    Some(gltf::animation::util::ReadOutputs::MorphTargetWeights(_)) => {
                        log::debug!("Skipping morph weight channel on '{node_name}'");
                        continue;
                    }
                    None => {
                        return Err(AssetError::decode(
                            self.label,
                            format!("animation channel on '{node_name}' has no output values"),
                        ));
                    }
                };

                let consistent = match &data {
                    TrackData::Vector3(t) => t.is_consistent(),
                    TrackData::Quaternion(t) => t.is_consistent(),
                };
                if !consistent {
                    return Err(AssetError::decode(
                        self.label,
                        format!("animation channel on '{node_name}' has mismatched keyframe data"),
                    ));
                }

                tracks.push(Track {
                    meta: TrackMeta {
                        node_name,
                        target: target_path,
                    },
                    data,
                });
            }

            let name = anim
                .name()
                .map_or_else(|| format!("Animation_{}", anim.index()), str::to_string);
            animations.push(AnimationClip::new(name, tracks));
        }

        Ok(animations)
    }
}

/// Node name used for binding; unnamed nodes get a stable index-based name.
fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map_or_else(|| format!("Node_{}", node.index()), str::to_string)
}

fn json_vec3(value: &gltf::json::Value) -> Option<Vec3> {
    let array = value.as_array()?;
    if array.len() != 3 {
        return None;
    }
    let x = array[0].as_f64()? as f32;
    let y = array[1].as_f64()? as f32;
    let z = array[2].as_f64()? as f32;
    Some(Vec3::new(x, y, z))
}

/// Decodes a base64 `data:` URI. `None` for any other URI scheme.
fn decode_data_uri(uri: &str) -> Option<Result<Vec<u8>, AssetError>> {
    let rest = uri.strip_prefix("data:")?;
    let (_, payload) = rest.split_once(";base64,")?;
    Some(
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| AssetError::decode("data uri", e)),
    )
}
