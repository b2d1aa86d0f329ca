//! Playback Tests
//!
//! Tests for:
//! - seek clamping and pause semantics
//! - tick under Clamp and Loop policies
//! - cross-fade weights, collapse of in-flight fades, pause during a fade
//! - coalesced state publication

mod common;

use std::sync::Arc;

use clipview::animation::AnimationClip;
use clipview::assets::GltfLoader;
use clipview::errors::PlaybackError;
use clipview::playback::{PlaybackController, PlaybackState};
use clipview::settings::{LoopPolicy, PlaybackSettings};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn controller() -> PlaybackController {
    common::init_logger();
    let mut controller = PlaybackController::new(PlaybackSettings::default());
    let model = GltfLoader::load_model(&common::character_glb(), "hero.glb").unwrap();
    assert!(controller.install_model(model).is_none());
    controller
}

fn clip(name: &str, duration: f32, lift: f32) -> Arc<AnimationClip> {
    let bytes = common::clip_glb(name, duration, lift);
    Arc::new(GltfLoader::load_clip(&bytes, name).unwrap())
}

fn spine_y(controller: &PlaybackController) -> f32 {
    let model = controller.model().unwrap();
    let spine = model.scene.find_node_by_name("Spine").unwrap();
    model.scene.get_node(spine).unwrap().transform.position.y
}

fn clip_name(controller: &PlaybackController, handle: clipview::animation::ActionHandle) -> String {
    controller.mixer().action(handle).unwrap().clip().name.clone()
}

// ============================================================================
// Seek
// ============================================================================

#[test]
fn seek_clamps_to_clip_and_pauses() {
    let mut playback = controller();
    playback.begin_transition("walk", clip("walk", 4.0, 1.0)).unwrap();
    assert!(playback.state().is_playing);

    playback.seek(-2.0);
    assert!(approx(playback.state().current_time, 0.0));
    assert!(!playback.state().is_playing);

    playback.set_playing(true);
    playback.seek(10.0);
    assert!(approx(playback.state().current_time, 4.0));
    assert!(!playback.state().is_playing);

    playback.seek(f32::NAN);
    assert!(approx(playback.state().current_time, 0.0));
}

#[test]
fn seek_reposes_model_without_advancing() {
    let mut playback = controller();
    playback.begin_transition("walk", clip("walk", 4.0, 1.0)).unwrap();

    playback.seek(2.0);
    assert!(approx(spine_y(&playback), 1.5), "got {}", spine_y(&playback));

    // Paused: ticks leave both time and pose alone
    playback.tick(1.0);
    assert!(approx(playback.state().current_time, 2.0));
    assert!(approx(spine_y(&playback), 1.5));
}

#[test]
fn seek_without_clip_stays_at_zero() {
    let mut playback = controller();
    playback.seek(3.0);
    assert_eq!(playback.state().current_time, 0.0);
    assert!(!playback.state().is_playing);
}

// ============================================================================
// Tick
// ============================================================================

#[test]
fn tick_advances_only_while_playing() {
    let mut playback = controller();
    playback.begin_transition("walk", clip("walk", 4.0, 1.0)).unwrap();

    playback.tick(1.0);
    assert!(approx(playback.state().current_time, 1.0));
    assert!(approx(spine_y(&playback), 1.25));

    playback.set_playing(false);
    playback.tick(1.0);
    assert!(approx(playback.state().current_time, 1.0));

    // Resuming keeps the time cursor
    playback.set_playing(true);
    assert!(approx(playback.state().current_time, 1.0));
}

#[test]
fn clamp_policy_stops_at_end_and_restarts_on_resume() {
    let mut playback = controller();
    playback.begin_transition("walk", clip("walk", 4.0, 1.0)).unwrap();

    playback.tick(3.0);
    playback.tick(3.0);
    let state = playback.state();
    assert!(approx(state.current_time, 4.0));
    assert!(!state.is_playing);
    assert!(approx(spine_y(&playback), 2.0));

    playback.set_playing(true);
    assert!(approx(playback.state().current_time, 0.0));
    playback.tick(0.5);
    assert!(approx(playback.state().current_time, 0.5));
}

#[test]
fn loop_policy_wraps() {
    let mut playback = controller();
    playback.set_loop_policy(LoopPolicy::Loop);
    playback.begin_transition("walk", clip("walk", 4.0, 1.0)).unwrap();

    playback.tick(5.0);
    assert!(approx(playback.state().current_time, 1.0));
    assert!(playback.state().is_playing);
}

#[test]
fn loop_policy_change_applies_to_active_clip() {
    let mut playback = controller();
    playback.begin_transition("walk", clip("walk", 1.0, 1.0)).unwrap();
    playback.set_loop_policy(LoopPolicy::Loop);

    playback.tick(1.5);
    assert!(approx(playback.state().current_time, 0.5));
    assert!(playback.state().is_playing);
}

// ============================================================================
// Cross-fade
// ============================================================================

#[test]
fn first_clip_starts_without_fade() {
    let mut playback = controller();
    playback.begin_transition("walk", clip("walk", 1.0, 1.0)).unwrap();

    assert!(playback.transition().is_none());
    assert_eq!(playback.mixer().action_count(), 1);
    let state = playback.state();
    assert_eq!(state.active_clip_name.as_deref(), Some("walk"));
    assert!(approx(state.duration_seconds, 1.0));
    assert_eq!(state.current_time, 0.0);
}

#[test]
fn cross_fade_blends_linearly_then_releases_outgoing() {
    let mut playback = controller();
    playback.begin_transition("idle", clip("idle", 1.0, 0.0)).unwrap();
    playback.begin_transition("jump", clip("jump", 1.0, 2.0)).unwrap();

    assert_eq!(playback.mixer().action_count(), 2);
    assert_eq!(playback.state().active_clip_name.as_deref(), Some("jump"));

    // Halfway through the 0.2s window: idle holds y = 1, jump is at 1.2
    playback.tick(0.1);
    let fade = *playback.transition().unwrap();
    let (outgoing, incoming) = fade.weights();
    assert!(approx(outgoing, 0.5) && approx(incoming, 0.5));
    assert!(approx(spine_y(&playback), 1.1), "got {}", spine_y(&playback));

    playback.tick(0.15);
    assert!(playback.transition().is_none());
    assert_eq!(playback.mixer().action_count(), 1);
    assert!(approx(spine_y(&playback), 1.5), "got {}", spine_y(&playback));
}

#[test]
fn new_transition_collapses_in_flight_fade() {
    let mut playback = controller();
    playback.begin_transition("a", clip("a", 2.0, 0.0)).unwrap();
    playback.begin_transition("b", clip("b", 2.0, 1.0)).unwrap();
    playback.tick(0.05);
    playback.begin_transition("c", clip("c", 2.0, 2.0)).unwrap();

    // Exactly one fade, from b into c
    assert_eq!(playback.mixer().action_count(), 2);
    let fade = *playback.transition().unwrap();
    assert_eq!(clip_name(&playback, fade.outgoing), "b");
    assert_eq!(clip_name(&playback, fade.incoming), "c");
    assert_eq!(fade.progress(), 0.0);

    playback.begin_transition("d", clip("d", 2.0, 3.0)).unwrap();
    assert_eq!(playback.mixer().action_count(), 2);

    playback.tick(1.0);
    assert!(playback.transition().is_none());
    assert_eq!(playback.mixer().action_count(), 1);
    assert_eq!(playback.state().active_clip_name.as_deref(), Some("d"));
}

#[test]
fn paused_fade_does_not_progress() {
    let mut playback = controller();
    playback.begin_transition("a", clip("a", 1.0, 0.0)).unwrap();
    playback.begin_transition("b", clip("b", 1.0, 1.0)).unwrap();
    playback.set_playing(false);

    playback.tick(5.0);
    let fade = playback.transition().unwrap();
    assert_eq!(fade.progress(), 0.0);
    assert_eq!(playback.mixer().action_count(), 2);
}

#[test]
fn seek_during_fade_poses_blend() {
    let mut playback = controller();
    playback.begin_transition("idle", clip("idle", 1.0, 0.0)).unwrap();
    playback.begin_transition("jump", clip("jump", 1.0, 2.0)).unwrap();
    playback.tick(0.1);

    playback.seek(0.5);
    // Half idle (y = 1), half jump at 0.5 (y = 2)
    assert!(approx(spine_y(&playback), 1.5), "got {}", spine_y(&playback));
    assert!(playback.transition().is_some());
}

#[test]
fn zero_fade_switches_immediately() {
    let mut playback = PlaybackController::new(PlaybackSettings {
        fade_seconds: 0.0,
        ..PlaybackSettings::default()
    });
    playback.install_model(GltfLoader::load_model(&common::character_glb(), "hero.glb").unwrap());

    playback.begin_transition("a", clip("a", 1.0, 0.0)).unwrap();
    playback.begin_transition("b", clip("b", 1.0, 1.0)).unwrap();
    assert!(playback.transition().is_none());
    assert_eq!(playback.mixer().action_count(), 1);
}

#[test]
fn transition_requires_model() {
    let mut playback = PlaybackController::new(PlaybackSettings::default());
    let err = playback.begin_transition("walk", clip("walk", 1.0, 1.0)).unwrap_err();
    assert_eq!(err, PlaybackError::NoModel);
    assert_eq!(playback.state(), &PlaybackState::default());
}

#[test]
fn clear_active_returns_to_rest() {
    let mut playback = controller();
    playback.begin_transition("walk", clip("walk", 1.0, 1.0)).unwrap();
    playback.tick(0.5);
    assert!(spine_y(&playback) > 1.0);

    playback.clear_active();
    assert!(approx(spine_y(&playback), 1.0));
    assert_eq!(playback.state().active_clip_name, None);
    assert!(!playback.state().is_playing);
    assert_eq!(playback.mixer().action_count(), 0);
}

#[test]
fn install_model_resets_playback() {
    let mut playback = controller();
    playback.begin_transition("walk", clip("walk", 1.0, 1.0)).unwrap();

    let replacement = GltfLoader::load_model(&common::character_glb(), "other.glb").unwrap();
    let previous = playback.install_model(replacement).unwrap();
    assert_eq!(previous.label, "hero.glb");
    assert_eq!(playback.state(), &PlaybackState::default());
    assert_eq!(playback.mixer().action_count(), 0);
}

// ============================================================================
// Publication
// ============================================================================

#[test]
fn publish_is_coalesced() {
    let mut playback = controller();
    let rx = playback.subscribe();

    // Unchanged default state: nothing to send
    assert!(!playback.publish());

    playback.begin_transition("walk", clip("walk", 4.0, 1.0)).unwrap();
    playback.tick(0.25);
    playback.tick(0.25);
    assert!(playback.publish());
    assert!(!playback.publish());
    assert_eq!(playback.published_count(), 1);

    // Observers only see the last value
    let seen = rx.borrow().clone();
    assert!(approx(seen.current_time, 0.5));
    assert_eq!(seen.active_clip_name.as_deref(), Some("walk"));
}

#[tokio::test]
async fn subscribers_wake_on_publish() {
    let mut playback = controller();
    let mut rx = playback.subscribe();

    playback.begin_transition("walk", clip("walk", 4.0, 1.0)).unwrap();
    assert!(playback.publish());

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().active_clip_name.as_deref(), Some("walk"));
    assert!(!rx.has_changed().unwrap());
}

#[test]
fn published_state_serializes_camel_case() {
    let state = PlaybackState {
        active_clip_name: Some("walk".to_string()),
        pending_clip_name: None,
        current_time: 1.5,
        is_playing: true,
        duration_seconds: 4.0,
    };
    let value = serde_json::to_value(&state).unwrap();
    assert_eq!(value["activeClipName"], "walk");
    assert_eq!(value["currentTime"], 1.5);
    assert_eq!(value["isPlaying"], true);
    assert_eq!(value["durationSeconds"], 4.0);
}
