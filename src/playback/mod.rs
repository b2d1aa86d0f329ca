//! Playback of the active clip.
//!
//! [`PlaybackController`] owns the installed model, the animation mixer and
//! at most one [`CrossFade`]. It is advanced by the frame tick and publishes a
//! [`PlaybackState`] snapshot through a [`StatePublisher`] at most once per
//! frame.

pub mod controller;
pub mod publisher;
pub mod transition;

pub use controller::{PlaybackController, PlaybackState};
pub use publisher::StatePublisher;
pub use transition::CrossFade;
