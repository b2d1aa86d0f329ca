use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::animation::{
    ActionHandle, AnimationAction, AnimationClip, AnimationMixer, Binder, LoopMode,
};
use crate::assets::Model;
use crate::errors::PlaybackError;
use crate::playback::publisher::StatePublisher;
use crate::playback::transition::CrossFade;
use crate::settings::{LoopPolicy, PlaybackSettings};

/// Snapshot of playback published to observers.
///
/// `0 <= current_time <= duration_seconds` holds for every published value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub active_clip_name: Option<String>,
    /// Clip whose load is in flight; it becomes active once decoded.
    pub pending_clip_name: Option<String>,
    pub current_time: f32,
    pub is_playing: bool,
    pub duration_seconds: f32,
}

/// Owns the model, its mixer and the active clip's time cursor.
pub struct PlaybackController {
    settings: PlaybackSettings,
    model: Option<Model>,
    mixer: AnimationMixer,
    active: Option<ActionHandle>,
    transition: Option<CrossFade>,
    state: PlaybackState,
    publisher: StatePublisher,
}

impl PlaybackController {
    #[must_use]
    pub fn new(settings: PlaybackSettings) -> Self {
        let state = PlaybackState::default();
        Self {
            settings,
            model: None,
            mixer: AnimationMixer::new(),
            active: None,
            transition: None,
            publisher: StatePublisher::new(state.clone()),
            state,
        }
    }

    // ========================================================================
    // Model
    // ========================================================================

    /// Replaces the model, dropping every action bound to the old one.
    ///
    /// Returns the previous model.
    pub fn install_model(&mut self, model: Model) -> Option<Model> {
        log::info!("Installing model '{}'", model.label);
        self.transition = None;
        self.active = None;
        self.mixer = AnimationMixer::new();
        self.state = PlaybackState::default();
        self.model.replace(model)
    }

    #[must_use]
    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    #[must_use]
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    // ========================================================================
    // Clip switching
    // ========================================================================

    /// Makes `clip` the active clip, cross-fading from the current one.
    ///
    /// Time restarts at 0 and playback starts. A fade already in flight is
    /// collapsed first: its outgoing action is dropped and its incoming
    /// action becomes the new outgoing one.
    pub fn begin_transition(
        &mut self,
        name: &str,
        clip: Arc<AnimationClip>,
    ) -> Result<(), PlaybackError> {
        let Some(model) = self.model.as_mut() else {
            return Err(PlaybackError::NoModel);
        };

        let bindings = Binder::bind(&model.scene, model.root, &clip);
        let mut action = AnimationAction::new(Arc::clone(&clip)).with_bindings(bindings);
        action.loop_mode = loop_mode(self.settings.loop_policy);

        if let Some(fade) = self.transition.take() {
            self.mixer.remove_action(fade.outgoing);
            log::debug!("Cross-fade superseded by '{name}'");
        }

        let fade_seconds = self.settings.fade_seconds;
        let incoming = match self.active.take() {
            Some(previous) if fade_seconds > 0.0 => {
                action.weight = 0.0;
                let incoming = self.mixer.add_action(action, &model.scene);
                if let Some(outgoing) = self.mixer.action_mut(previous) {
                    outgoing.weight = 1.0;
                }
                self.transition = Some(CrossFade::new(previous, incoming, fade_seconds));
                log::debug!("Cross-fade into '{name}' over {fade_seconds}s");
                incoming
            }
            previous => {
                if let Some(previous) = previous {
                    self.mixer.remove_action(previous);
                }
                action.weight = 1.0;
                self.mixer.add_action(action, &model.scene)
            }
        };
        self.active = Some(incoming);

        self.state.active_clip_name = Some(name.to_string());
        if self.state.pending_clip_name.as_deref() == Some(name) {
            self.state.pending_clip_name = None;
        }
        self.state.current_time = 0.0;
        self.state.duration_seconds = clip.duration.max(0.0);
        self.state.is_playing = true;

        self.apply_pose();
        Ok(())
    }

    /// Stops playback and drops every action, returning the model to rest.
    pub fn clear_active(&mut self) {
        self.transition = None;
        self.active = None;
        match self.model.as_mut() {
            Some(model) => {
                self.mixer.stop_all(&mut model.scene);
                model.scene.update_matrix_world();
            }
            None => self.mixer = AnimationMixer::new(),
        }
        self.state.active_clip_name = None;
        self.state.current_time = 0.0;
        self.state.duration_seconds = 0.0;
        self.state.is_playing = false;
    }

    pub fn set_pending(&mut self, name: Option<String>) {
        self.state.pending_clip_name = name;
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Toggles playback without moving the time cursor.
    ///
    /// Resuming a clip that was clamped at its end restarts it from 0.
    pub fn set_playing(&mut self, playing: bool) {
        if playing
            && let Some(action) = self.active.and_then(|h| self.mixer.action_mut(h))
            && action.is_finished()
        {
            action.reset();
            self.state.current_time = 0.0;
        }
        self.state.is_playing = playing;
    }

    /// Jumps to `time`, clamped to the clip, and pauses.
    ///
    /// The pose is re-evaluated at the new time with a zero-delta update, so
    /// during a cross-fade the blended pose reflects the seek.
    pub fn seek(&mut self, time: f32) {
        let time = if time.is_nan() { 0.0 } else { time };
        let time = time.clamp(0.0, self.state.duration_seconds);
        self.state.current_time = time;
        self.state.is_playing = false;

        if let Some(action) = self.active.and_then(|h| self.mixer.action_mut(h)) {
            action.set_time(time);
            action.paused = false;
        }
        self.apply_pose();
    }

    /// Advances playback by `dt` seconds.
    ///
    /// Nothing moves while paused, cross-fades included.
    pub fn tick(&mut self, dt: f32) {
        if !self.state.is_playing || self.model.is_none() {
            return;
        }
        let dt = dt.max(0.0);

        if let Some(mut fade) = self.transition {
            let complete = fade.advance(dt);
            let (outgoing_weight, incoming_weight) = fade.weights();
            if complete {
                self.mixer.remove_action(fade.outgoing);
                self.transition = None;
                log::debug!("Cross-fade complete");
            } else {
                if let Some(action) = self.mixer.action_mut(fade.outgoing) {
                    action.weight = outgoing_weight;
                }
                self.transition = Some(fade);
            }
            if let Some(action) = self.mixer.action_mut(fade.incoming) {
                action.weight = incoming_weight;
            }
        }

        self.mixer.update(dt);

        if let Some(action) = self.active.and_then(|h| self.mixer.action(h)) {
            if action.is_finished() {
                self.state.current_time = self.state.duration_seconds;
                self.state.is_playing = false;
                log::debug!("Reached end of clip, playback stopped");
            } else {
                self.state.current_time = action.time.clamp(0.0, self.state.duration_seconds);
            }
        }

        self.apply_pose();
    }

    /// Changes the looping policy of the active and future actions.
    pub fn set_loop_policy(&mut self, policy: LoopPolicy) {
        self.settings.loop_policy = policy;
        let mode = loop_mode(policy);
        for handle in [self.active, self.transition.map(|f| f.outgoing)]
            .into_iter()
            .flatten()
        {
            if let Some(action) = self.mixer.action_mut(handle) {
                action.loop_mode = mode;
            }
        }
    }

    fn apply_pose(&mut self) {
        if let Some(model) = self.model.as_mut() {
            self.mixer.apply(&mut model.scene);
            model.scene.update_matrix_world();
        }
    }

    // ========================================================================
    // Observation
    // ========================================================================

    #[must_use]
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    #[must_use]
    pub fn transition(&self) -> Option<&CrossFade> {
        self.transition.as_ref()
    }

    #[must_use]
    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    #[must_use]
    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    /// Publishes the current snapshot if it changed. Called once per frame.
    pub fn publish(&mut self) -> bool {
        self.publisher.publish(&self.state)
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.publisher.subscribe()
    }

    #[must_use]
    pub fn published_count(&self) -> u64 {
        self.publisher.published_count()
    }
}

fn loop_mode(policy: LoopPolicy) -> LoopMode {
    match policy {
        LoopPolicy::Clamp => LoopMode::Once,
        LoopPolicy::Loop => LoopMode::Loop,
    }
}
