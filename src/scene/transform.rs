use glam::{Affine3A, Quat, Vec3};

/// The translation/rotation/scale triple a local matrix was last built from.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Trs {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
}

/// Local pose of a node and the matrices derived from it.
///
/// The pose fields are public and may be written directly; the local matrix
/// is rebuilt lazily by [`Transform::update_local_matrix`] whenever they
/// differ from the values it was last built from.
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    pub(crate) local_matrix: Affine3A,
    pub(crate) world_matrix: Affine3A,

    built_from: Option<Trs>,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self::from_trs(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE)
    }

    #[must_use]
    pub fn from_trs(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
            local_matrix: Affine3A::IDENTITY,
            world_matrix: Affine3A::IDENTITY,
            built_from: None,
        }
    }

    fn current(&self) -> Trs {
        Trs {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    /// Forces a rebuild on the next update even if the pose is unchanged.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.built_from = None;
    }

    /// Rebuilds the local matrix when the pose changed. Returns whether it did.
    pub fn update_local_matrix(&mut self) -> bool {
        let trs = self.current();
        if self.built_from == Some(trs) {
            return false;
        }
        self.local_matrix = Affine3A::from_scale_rotation_translation(trs.scale, trs.rotation, trs.position);
        self.built_from = Some(trs);
        true
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine3A {
        &self.local_matrix
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
