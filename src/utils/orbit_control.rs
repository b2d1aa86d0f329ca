use glam::Vec3;

use crate::scene::camera::{Camera, CameraPose};
use crate::settings::CameraSettings;

const EPS: f32 = 0.0001;

/// Orbit camera around a target, driven by discrete viewport commands.
///
/// The camera position is kept in spherical coordinates around `center`:
/// `theta` is the azimuth about +Y, `phi` the polar angle from +Y.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub enable_rotate: bool,
    pub enable_pan: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    /// World units moved by one zoom step.
    pub zoom_step: f32,

    pub center: Vec3,
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
}

impl OrbitControls {
    #[must_use]
    pub fn new(settings: &CameraSettings) -> Self {
        let mut controls = Self {
            enable_rotate: true,
            enable_pan: false,
            min_distance: settings.min_distance,
            max_distance: settings.max_distance,
            zoom_step: settings.zoom_step,
            center: Vec3::ZERO,
            radius: 1.0,
            theta: 0.0,
            phi: std::f32::consts::FRAC_PI_2,
        };
        controls.set_pose(CameraPose::DEFAULT);
        controls
    }

    /// Re-centers the orbit on `pose`. The distance is taken as given, even
    /// outside the zoom limits.
    pub fn set_pose(&mut self, pose: CameraPose) {
        let offset = pose.position - pose.target;
        self.center = pose.target;
        self.radius = offset.length().max(EPS);
        self.theta = offset.x.atan2(offset.z);
        self.phi = (offset.y / self.radius).clamp(-1.0, 1.0).acos();
    }

    #[must_use]
    pub fn pose(&self) -> CameraPose {
        let sin_phi = self.phi.sin();
        let offset = Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        );
        CameraPose {
            position: self.center + offset,
            target: self.center,
        }
    }

    /// Moves one step towards the target.
    pub fn zoom_in(&mut self) {
        self.radius = (self.radius - self.zoom_step).clamp(self.min_distance, self.max_distance);
    }

    /// Moves one step away from the target.
    pub fn zoom_out(&mut self) {
        self.radius = (self.radius + self.zoom_step).clamp(self.min_distance, self.max_distance);
    }

    /// Orbits by the given angles in radians. No-op while rotation is off.
    pub fn rotate(&mut self, delta_theta: f32, delta_phi: f32) {
        if !self.enable_rotate {
            return;
        }
        self.theta += delta_theta;
        self.phi = (self.phi + delta_phi).clamp(EPS, std::f32::consts::PI - EPS);
    }

    /// Slides the target in the view plane by world units. No-op while
    /// panning is off.
    pub fn pan(&mut self, right: f32, up: f32) {
        if !self.enable_pan {
            return;
        }
        let pose = self.pose();
        let forward = pose.direction();
        let right_axis = forward.cross(Vec3::Y).try_normalize().unwrap_or(Vec3::X);
        let up_axis = right_axis.cross(forward).normalize();
        self.center += right_axis * right + up_axis * up;
    }

    /// Writes the current pose into `camera`.
    pub fn apply(&self, camera: &mut Camera) {
        let pose = self.pose();
        camera.look_at(pose.position, pose.target);
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(&CameraSettings::default())
    }
}
