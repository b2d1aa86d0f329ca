//! Asset Pipeline Tests
//!
//! Tests for:
//! - glTF model decoding (GLB and embedded data URIs): hierarchy, bounds, clips
//! - Standalone clip decoding and its failure modes
//! - ByteSource naming
//! - ClipLibrary bookkeeping
//! - RequestTracker token semantics
//! - AssetServer end-to-end on the tokio runtime

mod common;

use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;

use clipview::animation::{AnimationClip, TargetPath};
use clipview::assets::{
    AssetServer, ByteSource, ClipLibrary, GltfLoader, LoadExecutor, LoadRequest, LoadRole,
    LoadedAsset, RequestTracker,
};
use clipview::errors::{AssetError, PlaybackError};

use common::{AssetBuilder, MESH_MAX, MESH_MIN, SPINE_REST_Y};

const EPSILON: f32 = 1e-5;

fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    a.abs_diff_eq(b, EPSILON)
}

// ============================================================================
// Model decoding
// ============================================================================

#[test]
fn glb_model_hierarchy_and_bounds() {
    let bytes = AssetBuilder::character().clip("idle", 2.0, 0.5).glb();
    let model = GltfLoader::load_model(&bytes, "hero.glb").unwrap();

    // Hips, Spine and the synthetic root
    assert_eq!(model.scene.node_count(), 3);
    assert_eq!(model.scene.root_nodes, vec![model.root]);

    let hips = model.scene.find_node_by_name("Hips").unwrap();
    let spine = model.scene.find_node_by_name("Spine").unwrap();
    assert_eq!(model.scene.get_node(spine).unwrap().parent(), Some(hips));
    assert_eq!(model.scene.get_node(hips).unwrap().parent(), Some(model.root));
    assert!(approx_vec3(
        model.scene.get_node(spine).unwrap().transform.position,
        Vec3::new(0.0, SPINE_REST_Y, 0.0)
    ));

    assert!(approx_vec3(model.bounds.min, Vec3::from_array(MESH_MIN)));
    assert!(approx_vec3(model.bounds.max, Vec3::from_array(MESH_MAX)));
    assert_eq!(model.label, "hero.glb");
}

#[test]
fn glb_model_embedded_clips() {
    let bytes = AssetBuilder::character()
        .clip("idle", 2.0, 0.5)
        .unnamed_clip(1.0, 0.1)
        .glb();
    let model = GltfLoader::load_model(&bytes, "hero.glb").unwrap();

    assert_eq!(model.clips.len(), 2);
    assert_eq!(model.clips[0].name, "idle");
    assert_eq!(model.clips[1].name, "Animation_1");
    assert!((model.clips[0].duration - 2.0).abs() < EPSILON);

    let track = &model.clips[0].tracks[0];
    assert_eq!(track.meta.node_name, "Spine");
    assert_eq!(track.meta.target, TargetPath::Translation);
}

#[test]
fn embedded_data_uri_matches_glb() {
    let builder = AssetBuilder::character().clip("idle", 2.0, 0.5);
    let from_glb = GltfLoader::load_model(&builder.glb(), "a.glb").unwrap();
    let from_json = GltfLoader::load_model(&builder.gltf_embedded(), "a.gltf").unwrap();

    assert_eq!(from_glb.bounds, from_json.bounds);
    assert_eq!(from_glb.clips.len(), from_json.clips.len());
    assert_eq!(from_glb.scene.node_count(), from_json.scene.node_count());
}

#[test]
fn nodes_outside_default_scene_do_not_affect_bounds() {
    let mut doc: serde_json::Value =
        serde_json::from_slice(&AssetBuilder::character().gltf_embedded()).unwrap();
    doc["nodes"]
        .as_array_mut()
        .unwrap()
        .push(serde_json::json!({ "name": "Stray", "mesh": 0, "translation": [100.0, 0.0, 0.0] }));
    let bytes = serde_json::to_vec(&doc).unwrap();

    let model = GltfLoader::load_model(&bytes, "stray.gltf").unwrap();
    assert_eq!(model.scene.node_count(), 4);
    assert!(model.scene.find_node_by_name("Stray").is_none());
    assert!(approx_vec3(model.bounds.min, Vec3::from_array(MESH_MIN)));
    assert!(approx_vec3(model.bounds.max, Vec3::from_array(MESH_MAX)));
}

#[test]
fn model_without_mesh_has_empty_bounds() {
    let bytes = AssetBuilder::skeleton().clip("walk", 1.0, 1.0).glb();
    let model = GltfLoader::load_model(&bytes, "rig.glb").unwrap();
    assert!(model.bounds.is_empty());
}

#[test]
fn external_buffer_uri_is_rejected() {
    let bytes = AssetBuilder::character().gltf_external();
    let err = GltfLoader::load_model(&bytes, "scene.gltf").unwrap_err();
    assert!(
        matches!(err, AssetError::UnsupportedBuffer { ref uri, .. } if uri == "scene.bin"),
        "got {err:?}"
    );
}

#[test]
fn garbage_bytes_fail_to_decode() {
    let err = GltfLoader::load_model(b"definitely not a model", "junk.glb").unwrap_err();
    assert!(matches!(err, AssetError::Decode { ref label, .. } if label == "junk.glb"));
}

// ============================================================================
// Clip decoding
// ============================================================================

#[test]
fn clip_decode_takes_first_animation() {
    let bytes = AssetBuilder::skeleton()
        .clip("first", 1.0, 1.0)
        .clip("second", 3.0, 1.0)
        .glb();
    let clip: AnimationClip = GltfLoader::load_clip(&bytes, "moves.glb").unwrap();
    assert_eq!(clip.name, "first");
    assert!((clip.duration - 1.0).abs() < EPSILON);
}

#[test]
fn clip_decode_without_animation_fails() {
    let bytes = AssetBuilder::character().glb();
    let err = GltfLoader::load_clip(&bytes, "static.glb").unwrap_err();
    assert_eq!(err, AssetError::MissingAnimation("static.glb".to_string()));
}

#[test]
fn clip_request_is_renamed_to_upload_name() {
    let request = LoadRequest {
        role: LoadRole::Clip,
        token: clipview::assets::RequestToken(1),
        name: "walk".to_string(),
        source: ByteSource::from_bytes("walk.glb", common::clip_glb("mixamo.com", 1.2, 1.0)),
    };
    let response = clipview::assets::request::execute_blocking(&request);
    match response.result {
        Ok(LoadedAsset::Clip(clip)) => assert_eq!(clip.name, "walk"),
        other => panic!("unexpected result: {other:?}"),
    }
}

// ============================================================================
// ByteSource
// ============================================================================

#[test]
fn byte_source_labels_and_stems() {
    let memory = ByteSource::from_bytes("Walking.fbx.glb", vec![1u8, 2, 3]);
    assert_eq!(memory.label(), "Walking.fbx.glb");
    assert_eq!(memory.stem(), "Walking.fbx");

    let file = ByteSource::from_path("/tmp/clips/run.glb");
    assert_eq!(file.label(), "run.glb");
    assert_eq!(file.stem(), "run");
}

#[test]
fn byte_source_missing_file_is_io_error() {
    let source = ByteSource::from_path("/nonexistent/clipview/missing.glb");
    let err = source.read_bytes_blocking().unwrap_err();
    assert!(matches!(err, AssetError::Io { ref label, .. } if label == "missing.glb"));
}

// ============================================================================
// ClipLibrary
// ============================================================================

#[test]
fn library_rejects_duplicate_names() {
    let mut library = ClipLibrary::new();
    library
        .add_source("walk", ByteSource::from_bytes("walk.glb", vec![0u8]))
        .unwrap();
    let err = library
        .add_source("walk", ByteSource::from_bytes("walk2.glb", vec![0u8]))
        .unwrap_err();
    assert_eq!(err, PlaybackError::DuplicateClip("walk".to_string()));
    assert_eq!(library.len(), 1);
}

#[test]
fn library_add_path_uses_file_stem() {
    let mut library = ClipLibrary::new();
    let descriptor = library.add_path("assets/Samba Dancing.glb").unwrap();
    assert_eq!(descriptor.name, "Samba Dancing");
    assert!(!descriptor.loaded());
    assert!((descriptor.duration_seconds() - 0.0).abs() < EPSILON);
}

#[test]
fn library_keeps_insertion_order_and_marks_loaded() {
    let mut library = ClipLibrary::new();
    for name in ["c", "a", "b"] {
        library
            .add_source(name, ByteSource::from_bytes(name, vec![0u8]))
            .unwrap();
    }
    assert_eq!(library.names(), vec!["c", "a", "b"]);

    let clip = Arc::new(AnimationClip::new("a", Vec::new()));
    assert!(library.mark_loaded("a", clip));
    assert!(library.get("a").unwrap().loaded());
    assert!(!library.mark_loaded("zzz", Arc::new(AnimationClip::new("zzz", Vec::new()))));
}

#[test]
fn library_remove_releases_descriptor() {
    let mut library = ClipLibrary::new();
    library
        .add_source("walk", ByteSource::from_bytes("walk.glb", vec![0u8; 16]))
        .unwrap();
    let removed = library.remove("walk").unwrap();
    assert_eq!(removed.name, "walk");
    assert!(library.get("walk").is_none());
    assert!(library.remove("walk").is_none());
}

#[test]
fn library_embedded_clips_are_replaced_per_model() {
    let mut library = ClipLibrary::new();
    library
        .add_source("upload", ByteSource::from_bytes("upload.glb", vec![0u8]))
        .unwrap();

    let first = vec![
        Arc::new(AnimationClip::new("idle", Vec::new())),
        Arc::new(AnimationClip::new("upload", Vec::new())),
    ];
    library.register_embedded(&first);
    // The colliding embedded clip is skipped
    assert_eq!(library.names(), vec!["upload", "idle"]);
    assert!(library.get("idle").unwrap().is_embedded());
    assert!(library.get("idle").unwrap().loaded());

    let second = vec![Arc::new(AnimationClip::new("dance", Vec::new()))];
    library.register_embedded(&second);
    assert_eq!(library.names(), vec!["upload", "dance"]);
}

// ============================================================================
// RequestTracker
// ============================================================================

#[test]
fn tracker_latest_token_wins() {
    let mut tracker = RequestTracker::new();
    let first = tracker.issue(LoadRole::Clip);
    let second = tracker.issue(LoadRole::Clip);
    assert!(second > first);

    assert!(!tracker.is_current(LoadRole::Clip, first));
    assert!(tracker.is_current(LoadRole::Clip, second));
    assert!(!tracker.complete(LoadRole::Clip, first));
    assert!(tracker.complete(LoadRole::Clip, second));
    // Completed tokens cannot complete twice
    assert!(!tracker.complete(LoadRole::Clip, second));
}

#[test]
fn tracker_roles_are_independent() {
    let mut tracker = RequestTracker::new();
    let model = tracker.issue(LoadRole::Model);
    let clip = tracker.issue(LoadRole::Clip);

    tracker.invalidate(LoadRole::Clip);
    assert_eq!(tracker.pending(LoadRole::Clip), None);
    assert!(!tracker.is_current(LoadRole::Clip, clip));
    assert!(tracker.is_current(LoadRole::Model, model));
}

// ============================================================================
// AssetServer
// ============================================================================

#[test]
fn asset_server_loads_off_thread() {
    common::init_logger();
    let server = AssetServer::new().unwrap();
    let mut tracker = RequestTracker::new();
    let token = tracker.issue(LoadRole::Model);

    server.submit(LoadRequest {
        role: LoadRole::Model,
        token,
        name: "hero.glb".to_string(),
        source: ByteSource::from_bytes("hero.glb", common::character_glb()),
    });

    let response = server
        .wait_for_response(Duration::from_secs(10))
        .expect("load timed out");
    assert_eq!(response.token, token);
    assert!(matches!(response.result, Ok(LoadedAsset::Model(_))));
    assert!(server.drain().is_empty());
}

#[test]
fn asset_server_reads_files_and_reports_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("walk.glb");
    std::fs::write(&path, common::clip_glb("walk", 1.0, 1.0)).unwrap();

    let server = AssetServer::new().unwrap();
    server.submit(LoadRequest {
        role: LoadRole::Clip,
        token: clipview::assets::RequestToken(7),
        name: "walk".to_string(),
        source: ByteSource::from_path(&path),
    });
    server.submit(LoadRequest {
        role: LoadRole::Clip,
        token: clipview::assets::RequestToken(8),
        name: "gone".to_string(),
        source: ByteSource::from_path(dir.path().join("gone.glb")),
    });

    let mut responses = Vec::new();
    while responses.len() < 2 {
        let response = server
            .wait_for_response(Duration::from_secs(10))
            .expect("load timed out");
        responses.push(response);
    }
    responses.sort_by_key(|r| r.token);

    assert!(matches!(responses[0].result, Ok(LoadedAsset::Clip(ref c)) if c.name == "walk"));
    assert!(matches!(responses[1].result, Err(AssetError::Io { .. })));
}
