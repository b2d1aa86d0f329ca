//! Preview Coordinator
//!
//! [`PreviewEngine`] is the single owner of a preview session: the load
//! executor and its request tokens, the clip library, playback, camera,
//! annotations and capture. Nothing in the session is shared or global;
//! every change goes through a method here or through [`PreviewEngine::apply`].
//!
//! # Frame cadence
//!
//! The host calls [`PreviewEngine::frame`] once per rendered frame:
//!
//! 1. finished loads are drained and applied (stale ones discarded)
//! 2. playback advances by `dt`
//! 3. an active capture counts down, sampling the surface when one is given
//! 4. the playback snapshot is published, at most once
//!
//! Load results therefore never land in the middle of a pose update.
//!
//! ```rust,ignore
//! use clipview::{PreviewEngine, PreviewCommand, ByteSource};
//!
//! let mut engine = PreviewEngine::new(PreviewSettings::default())?;
//! engine.apply(PreviewCommand::SelectModel(ByteSource::from_path("hero.glb")))?;
//! engine.apply(PreviewCommand::AddClip(ByteSource::from_path("walk.glb")))?;
//! engine.apply(PreviewCommand::SelectClip("walk".into()))?;
//!
//! loop {
//!     let report = engine.frame(dt, Some(&mut surface));
//!     // ... render engine.model() with engine.camera() ...
//! }
//! ```

use tokio::sync::watch;

use crate::assets::{
    AssetServer, ByteSource, ClipLibrary, LoadExecutor, LoadRequest, LoadResponse, LoadRole,
    LoadedAsset, Model, RequestToken, RequestTracker,
};
use crate::capture::{CaptureOutput, CaptureSession, RenderSurface};
use crate::errors::{CaptureError, Error, PlaybackError, Result};
use crate::playback::{PlaybackController, PlaybackState};
use crate::scene::{Camera, CameraFraming, CameraPose};
use crate::settings::{LoopPolicy, PreviewSettings};
use crate::timeline::{AnnotationDocument, TimelineSync};
use crate::utils::OrbitControls;

/// A user action, as emitted by a UI layer.
#[derive(Debug, Clone)]
pub enum PreviewCommand {
    SelectModel(ByteSource),
    /// Registers a clip upload, named after its file stem.
    AddClip(ByteSource),
    RemoveClip(String),
    SelectClip(String),
    SetPlaying(bool),
    Seek(f32),
    ResetCameraView,
    ZoomIn,
    ZoomOut,
    /// Orbit by angles in radians.
    Rotate { theta: f32, phi: f32 },
    /// Move the orbit target in the view plane, in world units.
    Pan { right: f32, up: f32 },
    SetRotateEnabled(bool),
    SetPanEnabled(bool),
    SetLoopPolicy(LoopPolicy),
}

/// What happened during one [`PreviewEngine::frame`].
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Load and capture failures that surfaced this frame.
    pub errors: Vec<Error>,
    /// Set when a capture finished by timeout this frame.
    pub capture_output: Option<CaptureOutput>,
    /// Whether a new playback snapshot was published.
    pub published: bool,
}

/// The preview session.
pub struct PreviewEngine {
    settings: PreviewSettings,

    executor: Box<dyn LoadExecutor>,
    requests: RequestTracker,
    library: ClipLibrary,
    playback: PlaybackController,

    camera: Camera,
    framing: CameraFraming,
    controls: OrbitControls,

    timeline: TimelineSync,
    capture: CaptureSession,

    frame_count: u64,
}

impl PreviewEngine {
    /// Creates a session that loads assets on its own [`AssetServer`].
    pub fn new(settings: PreviewSettings) -> Result<Self> {
        let server = AssetServer::new()?;
        Ok(Self::with_executor(settings, Box::new(server)))
    }

    /// Creates a session with a caller-supplied load executor.
    #[must_use]
    pub fn with_executor(settings: PreviewSettings, executor: Box<dyn LoadExecutor>) -> Self {
        let capture = CaptureSession::new(settings.capture.clone());
        Self::with_parts(settings, executor, capture)
    }

    /// Creates a session with a caller-supplied executor and capture session.
    #[must_use]
    pub fn with_parts(
        settings: PreviewSettings,
        executor: Box<dyn LoadExecutor>,
        capture: CaptureSession,
    ) -> Self {
        let mut camera = Camera::default();
        camera.fov = settings.camera.fov_degrees.to_radians();
        let controls = OrbitControls::new(&settings.camera);
        controls.apply(&mut camera);

        Self {
            framing: CameraFraming::new(&settings.camera),
            playback: PlaybackController::new(settings.playback.clone()),
            executor,
            requests: RequestTracker::new(),
            library: ClipLibrary::new(),
            camera,
            controls,
            timeline: TimelineSync::new(),
            capture,
            frame_count: 0,
            settings,
        }
    }

    /// Applies one UI command.
    pub fn apply(&mut self, command: PreviewCommand) -> Result<()> {
        match command {
            PreviewCommand::SelectModel(source) => {
                self.select_model(source);
            }
            PreviewCommand::AddClip(source) => {
                self.add_clip(source)?;
            }
            PreviewCommand::RemoveClip(name) => self.remove_clip(&name)?,
            PreviewCommand::SelectClip(name) => {
                self.select_clip(&name);
            }
            PreviewCommand::SetPlaying(playing) => self.set_playing(playing),
            PreviewCommand::Seek(time) => self.seek(time),
            PreviewCommand::ResetCameraView => self.reset_camera_view(),
            PreviewCommand::ZoomIn => self.update_controls(OrbitControls::zoom_in),
            PreviewCommand::ZoomOut => self.update_controls(OrbitControls::zoom_out),
            PreviewCommand::Rotate { theta, phi } => {
                self.update_controls(|c| c.rotate(theta, phi));
            }
            PreviewCommand::Pan { right, up } => self.update_controls(|c| c.pan(right, up)),
            PreviewCommand::SetRotateEnabled(enabled) => self.controls.enable_rotate = enabled,
            PreviewCommand::SetPanEnabled(enabled) => self.controls.enable_pan = enabled,
            PreviewCommand::SetLoopPolicy(policy) => self.playback.set_loop_policy(policy),
        }
        Ok(())
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Starts loading a model. A later call supersedes this one.
    pub fn select_model(&mut self, source: ByteSource) -> RequestToken {
        let token = self.requests.issue(LoadRole::Model);
        let name = source.label().into_owned();
        log::info!("Model load #{} issued for '{name}'", token.0);
        self.executor.submit(LoadRequest {
            role: LoadRole::Model,
            token,
            name,
            source,
        });
        token
    }

    /// Registers a clip upload under its file stem and returns the name.
    pub fn add_clip(&mut self, source: ByteSource) -> Result<String> {
        let name = source.stem();
        self.library.add_source(name.clone(), source)?;
        Ok(name)
    }

    /// Registers a clip upload under an explicit name.
    pub fn add_clip_named(&mut self, name: &str, source: ByteSource) -> Result<()> {
        self.library.add_source(name, source)?;
        Ok(())
    }

    /// Removes a clip. Removing the active clip stops playback; removing a
    /// clip that is still loading abandons the load.
    pub fn remove_clip(&mut self, name: &str) -> Result<()> {
        if self.library.remove(name).is_none() {
            return Err(PlaybackError::UnknownClip(name.to_string()).into());
        }
        let state = self.playback.state();
        let was_active = state.active_clip_name.as_deref() == Some(name);
        let was_pending = state.pending_clip_name.as_deref() == Some(name);
        if was_active {
            self.playback.clear_active();
        }
        if was_pending {
            self.requests.invalidate(LoadRole::Clip);
            self.playback.set_pending(None);
        }
        log::info!("Removed clip '{name}'");
        Ok(())
    }

    /// Switches to the named clip, loading it first when needed.
    ///
    /// Unknown names and selections without a model are ignored and logged.
    /// Returns the load token when a load was issued.
    pub fn select_clip(&mut self, name: &str) -> Option<RequestToken> {
        let Some(descriptor) = self.library.get(name) else {
            log::warn!("Ignoring selection of unknown clip '{name}'");
            return None;
        };
        if !self.playback.has_model() {
            log::warn!("Ignoring selection of '{name}': no model loaded");
            return None;
        }

        // A newer selection always supersedes an in-flight clip load.
        self.requests.invalidate(LoadRole::Clip);
        self.playback.set_pending(None);

        if let Some(clip) = descriptor.clip.clone() {
            if let Err(e) = self.playback.begin_transition(name, clip) {
                log::error!("Clip '{name}' could not start: {e}");
            }
            return None;
        }

        let Some(source) = descriptor.source.clone() else {
            return None;
        };
        let token = self.requests.issue(LoadRole::Clip);
        log::info!("Clip load #{} issued for '{name}'", token.0);
        self.playback.set_pending(Some(name.to_string()));
        self.executor.submit(LoadRequest {
            role: LoadRole::Clip,
            token,
            name: name.to_string(),
            source,
        });
        Some(token)
    }

    fn handle_response(&mut self, response: LoadResponse, report: &mut FrameReport) {
        let LoadResponse {
            role,
            token,
            name,
            result,
        } = response;

        if !self.requests.complete(role, token) {
            log::debug!("Discarding stale {role:?} load #{} for '{name}'", token.0);
            return;
        }

        match result {
            Err(e) => {
                log::error!("{role:?} load #{} for '{name}' failed: {e}", token.0);
                if role == LoadRole::Clip {
                    self.playback.set_pending(None);
                }
                report.errors.push(e.into());
            }
            Ok(LoadedAsset::Model(model)) => {
                log::info!("Model load #{} resolved for '{name}'", token.0);
                self.install_model(*model);
            }
            Ok(LoadedAsset::Clip(clip)) => {
                log::info!("Clip load #{} resolved for '{name}'", token.0);
                if !self.library.mark_loaded(&name, clip.clone()) {
                    log::debug!("Clip '{name}' was removed while loading");
                    return;
                }
                if let Err(e) = self.playback.begin_transition(&name, clip) {
                    report.errors.push(e.into());
                }
            }
        }
    }

    fn install_model(&mut self, model: Model) {
        self.requests.invalidate(LoadRole::Clip);
        self.library.register_embedded(&model.clips);
        self.playback.install_model(model);
        self.reset_camera_view();
    }

    // ========================================================================
    // Playback
    // ========================================================================

    pub fn set_playing(&mut self, playing: bool) {
        self.playback.set_playing(playing);
    }

    pub fn seek(&mut self, time: f32) {
        self.playback.seek(time);
    }

    /// Runs one frame. See the module docs for the order of work.
    pub fn frame(&mut self, dt: f32, surface: Option<&mut dyn RenderSurface>) -> FrameReport {
        let mut report = FrameReport::default();

        for response in self.executor.drain() {
            self.handle_response(response, &mut report);
        }

        self.playback.tick(dt);

        if self.capture.is_active() {
            let step = match surface {
                Some(surface) => self.capture.tick(dt, surface),
                None => self.capture.advance(dt),
            };
            match step {
                Ok(Some(output)) => {
                    self.playback.set_playing(false);
                    report.capture_output = Some(output);
                }
                Ok(None) => {}
                Err(e) => {
                    log::error!("Capture aborted: {e}");
                    self.playback.set_playing(false);
                    report.errors.push(e.into());
                }
            }
        }

        report.published = self.playback.publish();
        self.frame_count += 1;
        report
    }

    // ========================================================================
    // Camera
    // ========================================================================

    /// Frames the current model, discarding user zoom and orbit.
    pub fn reset_camera_view(&mut self) {
        let pose = self.playback.model().map_or(CameraPose::DEFAULT, |model| {
            self.framing.frame(&model.bounds, self.camera.fov)
        });
        self.controls.set_pose(pose);
        self.controls.apply(&mut self.camera);
    }

    fn update_controls(&mut self, f: impl FnOnce(&mut OrbitControls)) {
        f(&mut self.controls);
        self.controls.apply(&mut self.camera);
    }

    // ========================================================================
    // Capture
    // ========================================================================

    /// Starts a recording and playback together. Returns `false` when the
    /// recording did not start; playback is then left as it was.
    pub fn start_capture(
        &mut self,
        surface: &mut dyn RenderSurface,
        duration_ms: Option<u64>,
    ) -> bool {
        match self.try_start_capture(surface, duration_ms) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Capture did not start: {e}");
                false
            }
        }
    }

    /// Like [`start_capture`](Self::start_capture), with the failure reason.
    pub fn try_start_capture(
        &mut self,
        surface: &mut dyn RenderSurface,
        duration_ms: Option<u64>,
    ) -> Result<()> {
        if self.playback.state().active_clip_name.is_none() {
            return Err(CaptureError::Unavailable("no active clip to record".to_string()).into());
        }
        let was_playing = self.playback.state().is_playing;
        self.playback.set_playing(true);

        let duration_ms = duration_ms.unwrap_or(self.settings.capture.duration_ms);
        if let Err(e) = self.capture.start(surface, duration_ms) {
            self.playback.set_playing(was_playing);
            return Err(e.into());
        }
        Ok(())
    }

    /// Ends the recording early and writes it out.
    pub fn stop_capture(&mut self) -> Result<CaptureOutput> {
        let output = self.capture.stop()?;
        self.playback.set_playing(false);
        Ok(output)
    }

    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.capture.is_active()
    }

    #[must_use]
    pub fn capture_remaining_seconds(&self) -> u32 {
        self.capture.remaining_seconds()
    }

    // ========================================================================
    // Annotations
    // ========================================================================

    /// Adds or updates the comment at the paused position.
    pub fn submit_comment(&mut self, text: &str) -> Result<u64> {
        Ok(self.timeline.submit_comment(self.playback.state(), text)?)
    }

    /// The export document for the active clip.
    #[must_use]
    pub fn export_annotations(&self) -> AnnotationDocument {
        let state = self.playback.state();
        self.timeline
            .export_document(state.active_clip_name.as_deref(), state.duration_seconds)
    }

    /// Current frame slot of the playback position.
    #[must_use]
    pub fn current_frame(&self) -> u32 {
        let state = self.playback.state();
        crate::timeline::frame_for_time(state.current_time, state.duration_seconds)
    }

    #[must_use]
    pub fn timeline(&self) -> &TimelineSync {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut TimelineSync {
        &mut self.timeline
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn state(&self) -> &PlaybackState {
        self.playback.state()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.playback.subscribe()
    }

    #[must_use]
    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    #[must_use]
    pub fn model(&self) -> Option<&Model> {
        self.playback.model()
    }

    #[must_use]
    pub fn library(&self) -> &ClipLibrary {
        &self.library
    }

    #[must_use]
    pub fn requests(&self) -> &RequestTracker {
        &self.requests
    }

    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[must_use]
    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    #[must_use]
    pub fn settings(&self) -> &PreviewSettings {
        &self.settings
    }

    /// Number of frames run since creation.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
