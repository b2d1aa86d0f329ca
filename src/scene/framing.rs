use glam::Vec3;

use crate::scene::bounds::Aabb;
use crate::scene::camera::CameraPose;
use crate::settings::CameraSettings;

/// Derives a camera pose that keeps a whole model in view.
#[derive(Debug, Clone, Copy)]
pub struct CameraFraming {
    /// Multiplier on the fitting distance.
    pub margin: f32,
    /// Upward camera offset as a fraction of the box height.
    pub lift: f32,
}

impl CameraFraming {
    #[must_use]
    pub fn new(settings: &CameraSettings) -> Self {
        Self {
            margin: settings.margin,
            lift: settings.lift,
        }
    }

    /// Frames `bounds` for a camera with vertical field of view `fov` (radians).
    ///
    /// The distance fits the largest extent of the box in the view cone and
    /// is scaled by the margin. The camera is raised by `lift` of the box
    /// height and looks at the box center. Empty bounds yield
    /// [`CameraPose::DEFAULT`].
    #[must_use]
    pub fn frame(&self, bounds: &Aabb, fov: f32) -> CameraPose {
        if bounds.is_empty() {
            return CameraPose::DEFAULT;
        }

        let size = bounds.size();
        let center = bounds.center();
        let max_dim = size.x.max(size.y).max(size.z);

        let half_tan = (fov * 0.5).tan();
        let fit = if half_tan > f32::EPSILON {
            (max_dim * 0.5 / half_tan).abs()
        } else {
            max_dim
        };
        let distance = fit * self.margin;

        CameraPose {
            position: Vec3::new(center.x, center.y + size.y * self.lift, center.z + distance),
            target: center,
        }
    }
}

impl Default for CameraFraming {
    fn default() -> Self {
        Self::new(&CameraSettings::default())
    }
}
