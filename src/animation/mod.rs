//! Skeletal animation: keyframe tracks, clips, actions and the blending mixer.
//!
//! Data flows one way: an [`AnimationClip`] is decoded once and shared behind
//! an `Arc`; an [`AnimationAction`] is a playing instance of a clip bound to
//! the nodes of one model; the [`AnimationMixer`] advances every action and
//! writes the weighted blend of their samples into the scene graph.

pub mod action;
pub mod binder;
pub mod binding;
pub mod clip;
pub mod mixer;
pub mod tracks;
pub mod values;

pub use action::{AnimationAction, LoopMode};
pub use binder::Binder;
pub use binding::{PropertyBinding, TargetPath};
pub use clip::{AnimationClip, Track, TrackData, TrackMeta};
pub use mixer::{ActionHandle, AnimationMixer};
pub use tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
