//! Shared fixtures for the integration tests.
//!
//! - [`AssetBuilder`]: hand-built glTF assets (GLB or embedded JSON)
//! - [`TestSurface`]: a solid-color [`RenderSurface`]
//! - [`BrokenBackend`]: an [`EncoderBackend`] that never starts
//! - [`ManualExecutor`]: a [`LoadExecutor`] whose requests are resolved by
//!   the test, in any order

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use base64::Engine as _;
use serde_json::{Value, json};

use clipview::assets::request::execute_blocking;
use clipview::assets::{LoadExecutor, LoadRequest, LoadResponse, LoadRole, RequestToken};
use clipview::capture::{
    ChunkSender, EncoderBackend, EncoderConfig, FrameEncoder, FrameRgba, RenderSurface,
};
use clipview::errors::CaptureError;

const FLOAT: u32 = 5126;
const GLB_MAGIC: u32 = 0x4654_6C67;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

/// Height of the fixture's mesh; its box spans `[-0.5, 0, -0.5]..[0.5, 2, 0.5]`.
pub const MESH_MIN: [f32; 3] = [-0.5, 0.0, -0.5];
pub const MESH_MAX: [f32; 3] = [0.5, 2.0, 0.5];

/// Rest translation of the `Spine` node.
pub const SPINE_REST_Y: f32 = 1.0;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// glTF fixture builder
// ============================================================================

/// One animation: `Spine` translates linearly from rest to `rest + lift` on Y.
#[derive(Debug, Clone)]
pub struct ClipSpec {
    pub name: Option<String>,
    pub duration: f32,
    pub lift: f32,
}

/// Builds a two-node skeleton (`Hips` -> `Spine`) with an optional cube mesh
/// on `Hips` and any number of animations.
#[derive(Debug, Clone, Default)]
pub struct AssetBuilder {
    with_mesh: bool,
    clips: Vec<ClipSpec>,
}

impl AssetBuilder {
    /// A character: skeleton plus cube mesh.
    pub fn character() -> Self {
        Self {
            with_mesh: true,
            clips: Vec::new(),
        }
    }

    /// A standalone clip file: skeleton only.
    pub fn skeleton() -> Self {
        Self::default()
    }

    pub fn clip(mut self, name: &str, duration: f32, lift: f32) -> Self {
        self.clips.push(ClipSpec {
            name: Some(name.to_string()),
            duration,
            lift,
        });
        self
    }

    pub fn unnamed_clip(mut self, duration: f32, lift: f32) -> Self {
        self.clips.push(ClipSpec {
            name: None,
            duration,
            lift,
        });
        self
    }

    /// Binary glTF.
    pub fn glb(&self) -> Vec<u8> {
        let (mut doc, bin) = self.document();
        if !bin.is_empty() {
            doc["buffers"] = json!([{ "byteLength": bin.len() }]);
        }
        encode_glb(&doc, &bin)
    }

    /// JSON glTF with the buffer inlined as a base64 data URI.
    pub fn gltf_embedded(&self) -> Vec<u8> {
        let (mut doc, bin) = self.document();
        if !bin.is_empty() {
            let uri = format!(
                "data:application/octet-stream;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(&bin)
            );
            doc["buffers"] = json!([{ "byteLength": bin.len(), "uri": uri }]);
        }
        serde_json::to_vec(&doc).unwrap()
    }

    /// JSON glTF pointing at an external `.bin` next to it.
    pub fn gltf_external(&self) -> Vec<u8> {
        let (mut doc, bin) = self.document();
        doc["buffers"] = json!([{ "byteLength": bin.len().max(4), "uri": "scene.bin" }]);
        serde_json::to_vec(&doc).unwrap()
    }

    fn document(&self) -> (Value, Vec<u8>) {
        let mut bin = BinWriter::default();

        let mut hips = json!({ "name": "Hips", "children": [1] });
        let spine = json!({ "name": "Spine", "translation": [0.0, SPINE_REST_Y, 0.0] });

        let mut meshes = Vec::new();
        if self.with_mesh {
            let positions: Vec<[f32; 3]> = (0..8)
                .map(|i| {
                    [
                        if i & 1 == 0 { MESH_MIN[0] } else { MESH_MAX[0] },
                        if i & 2 == 0 { MESH_MIN[1] } else { MESH_MAX[1] },
                        if i & 4 == 0 { MESH_MIN[2] } else { MESH_MAX[2] },
                    ]
                })
                .collect();
            let accessor =
                bin.vec3_accessor(&positions, Some((MESH_MIN.to_vec(), MESH_MAX.to_vec())));
            meshes.push(json!({ "primitives": [{ "attributes": { "POSITION": accessor } }] }));
            hips["mesh"] = json!(0);
        }

        let mut animations = Vec::new();
        for clip in &self.clips {
            let input = bin.scalar_accessor(&[0.0, clip.duration]);
            let output = bin.vec3_accessor(
                &[
                    [0.0, SPINE_REST_Y, 0.0],
                    [0.0, SPINE_REST_Y + clip.lift, 0.0],
                ],
                None,
            );
            let mut animation = json!({
                "channels": [{ "sampler": 0, "target": { "node": 1, "path": "translation" } }],
                "samplers": [{ "input": input, "output": output, "interpolation": "LINEAR" }],
            });
            if let Some(name) = &clip.name {
                animation["name"] = json!(name);
            }
            animations.push(animation);
        }

        let mut doc = json!({
            "asset": { "version": "2.0", "generator": "clipview-tests" },
            "scene": 0,
            "scenes": [{ "nodes": [0] }],
            "nodes": [hips, spine],
        });
        if !meshes.is_empty() {
            doc["meshes"] = Value::Array(meshes);
        }
        if !animations.is_empty() {
            doc["animations"] = Value::Array(animations);
        }
        if !bin.data.is_empty() {
            doc["bufferViews"] = Value::Array(bin.views);
            doc["accessors"] = Value::Array(bin.accessors);
        }
        (doc, bin.data)
    }
}

#[derive(Default)]
struct BinWriter {
    data: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
}

impl BinWriter {
    fn push_view(&mut self, bytes: &[u8]) -> usize {
        while self.data.len() % 4 != 0 {
            self.data.push(0);
        }
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);
        self.views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
        }));
        self.views.len() - 1
    }

    fn scalar_accessor(&mut self, values: &[f32]) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let view = self.push_view(&bytes);
        let min = values.iter().copied().fold(f32::INFINITY, f32::min);
        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        self.accessors.push(json!({
            "bufferView": view,
            "componentType": FLOAT,
            "count": values.len(),
            "type": "SCALAR",
            "min": [min],
            "max": [max],
        }));
        self.accessors.len() - 1
    }

    fn vec3_accessor(&mut self, values: &[[f32; 3]], bounds: Option<(Vec<f32>, Vec<f32>)>) -> usize {
        let bytes: Vec<u8> = values
            .iter()
            .flat_map(|v| v.iter().flat_map(|c| c.to_le_bytes()))
            .collect();
        let view = self.push_view(&bytes);
        let mut accessor = json!({
            "bufferView": view,
            "componentType": FLOAT,
            "count": values.len(),
            "type": "VEC3",
        });
        if let Some((min, max)) = bounds {
            accessor["min"] = json!(min);
            accessor["max"] = json!(max);
        }
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }
}

fn encode_glb(doc: &Value, bin: &[u8]) -> Vec<u8> {
    let mut json_bytes = serde_json::to_vec(doc).unwrap();
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }
    let mut bin_bytes = bin.to_vec();
    while bin_bytes.len() % 4 != 0 {
        bin_bytes.push(0);
    }

    let mut total = 12 + 8 + json_bytes.len();
    if !bin_bytes.is_empty() {
        total += 8 + bin_bytes.len();
    }

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());

    out.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json_bytes);

    if !bin_bytes.is_empty() {
        out.extend_from_slice(&(bin_bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(&bin_bytes);
    }
    out
}

/// A character with no embedded clips.
pub fn character_glb() -> Vec<u8> {
    AssetBuilder::character().glb()
}

/// A standalone clip file with one animation.
pub fn clip_glb(name: &str, duration: f32, lift: f32) -> Vec<u8> {
    AssetBuilder::skeleton().clip(name, duration, lift).glb()
}

// ============================================================================
// Render surface
// ============================================================================

/// Solid-color surface that counts reads.
pub struct TestSurface {
    pub width: u32,
    pub height: u32,
    pub color: [u8; 4],
    pub reads: usize,
    pub fail_reads: bool,
}

impl TestSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            color: [200, 40, 40, 255],
            reads: 0,
            fail_reads: false,
        }
    }
}

impl RenderSurface for TestSurface {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_frame(&mut self) -> Result<FrameRgba, CaptureError> {
        if self.fail_reads {
            return Err(CaptureError::Encode("surface lost".to_string()));
        }
        self.reads += 1;
        Ok(FrameRgba::solid(self.width, self.height, self.color))
    }
}

/// A backend whose encoder can never start.
pub struct BrokenBackend;

impl EncoderBackend for BrokenBackend {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn extension(&self) -> &'static str {
        "bin"
    }

    fn open(
        &self,
        _config: EncoderConfig,
        _chunks: ChunkSender,
    ) -> Result<Box<dyn FrameEncoder>, CaptureError> {
        Err(CaptureError::Encode("no encoder device".to_string()))
    }
}

// ============================================================================
// Manual load executor
// ============================================================================

#[derive(Default)]
struct ManualQueue {
    submitted: Vec<LoadRequest>,
    ready: Vec<LoadResponse>,
}

/// Holds submitted requests until the test resolves them.
///
/// Clones share the same queue, so a test keeps one handle while the engine
/// owns another.
#[derive(Clone, Default)]
pub struct ManualExecutor {
    queue: Rc<RefCell<ManualQueue>>,
}

impl ManualExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests not yet resolved, in submission order.
    pub fn pending(&self) -> Vec<(LoadRole, RequestToken, String)> {
        self.queue
            .borrow()
            .submitted
            .iter()
            .map(|r| (r.role, r.token, r.name.clone()))
            .collect()
    }

    /// Decodes the request carrying `token` and queues its response.
    pub fn resolve(&self, token: RequestToken) {
        let mut queue = self.queue.borrow_mut();
        let index = queue
            .submitted
            .iter()
            .position(|r| r.token == token)
            .expect("no request with that token");
        let request = queue.submitted.remove(index);
        let response = execute_blocking(&request);
        queue.ready.push(response);
    }

    /// Resolves every pending request in submission order.
    pub fn resolve_all(&self) {
        let tokens: Vec<RequestToken> = self.pending().into_iter().map(|(_, t, _)| t).collect();
        for token in tokens {
            self.resolve(token);
        }
    }
}

impl LoadExecutor for ManualExecutor {
    fn submit(&self, request: LoadRequest) {
        self.queue.borrow_mut().submitted.push(request);
    }

    fn drain(&self) -> Vec<LoadResponse> {
        std::mem::take(&mut self.queue.borrow_mut().ready)
    }
}
