use crate::animation::ActionHandle;

/// A linear cross-fade from one action to another.
///
/// The outgoing weight falls from 1 to 0 while the incoming weight rises from
/// 0 to 1; the two always sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossFade {
    pub outgoing: ActionHandle,
    pub incoming: ActionHandle,
    elapsed: f32,
    fade_seconds: f32,
}

impl CrossFade {
    #[must_use]
    pub fn new(outgoing: ActionHandle, incoming: ActionHandle, fade_seconds: f32) -> Self {
        Self {
            outgoing,
            incoming,
            elapsed: 0.0,
            fade_seconds: fade_seconds.max(0.0),
        }
    }

    /// Advances the fade. Returns `true` once it has completed.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.fade_seconds);
        self.is_complete()
    }

    /// Fraction of the fade done, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.fade_seconds <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.fade_seconds).clamp(0.0, 1.0)
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress() >= 1.0
    }

    /// `(outgoing, incoming)` weights.
    #[must_use]
    pub fn weights(&self) -> (f32, f32) {
        let t = self.progress();
        (1.0 - t, t)
    }
}
