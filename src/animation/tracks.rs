use crate::animation::values::Interpolatable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    Linear,
    Step,
    CubicSpline,
}

/// How far a cursor scans linearly before falling back to binary search.
const MAX_SCAN_OFFSET: usize = 3;

/// Remembers the keyframe interval of the previous sample so that steady
/// playback resolves the next interval in O(1).
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    pub times: Vec<f32>,
    /// For `CubicSpline`, laid out as `[in_tangent, value, out_tangent]` per key.
    pub values: Vec<T>,
    pub interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    #[must_use]
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Self {
        Self {
            times,
            values,
            interpolation,
        }
    }

    /// Number of keyframes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time of the last keyframe, `0.0` for an empty track.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// True when the value buffer matches the key count for the interpolation mode.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let expected = match self.interpolation {
            InterpolationMode::CubicSpline => self.times.len() * 3,
            InterpolationMode::Linear | InterpolationMode::Step => self.times.len(),
        };
        !self.times.is_empty() && self.values.len() == expected
    }

    /// Stateless sample. Binary-searches the keyframe interval.
    #[must_use]
    pub fn sample(&self, time: f32) -> Option<T> {
        if self.times.is_empty() {
            return None;
        }
        self.sample_at_frame(self.search(time), time)
    }

    /// Samples using `cursor` as a hint and updates it.
    ///
    /// Steady playback in either direction finds the interval within a few
    /// keys of the previous one; scrubbing and loop wraps fall back to a
    /// binary search.
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> Option<T> {
        match self.times.len() {
            0 => None,
            1 => self.value_at(0),
            _ => {
                let index = self
                    .scan_from(cursor.last_index, time)
                    .unwrap_or_else(|| self.search(time));
                cursor.last_index = index;
                self.sample_at_frame(index, time)
            }
        }
    }

    /// Index of the last key at or before `time`, or 0 when `time` precedes
    /// every key.
    fn search(&self, time: f32) -> usize {
        self.times.partition_point(|&t| t <= time).saturating_sub(1)
    }

    /// Looks for the interval containing `time` near `hint`. Requires at
    /// least two keys.
    fn scan_from(&self, hint: usize, time: f32) -> Option<usize> {
        let last = self.times.len() - 1;
        let hint = hint.min(last);

        if time < self.times[hint] {
            return (hint.saturating_sub(MAX_SCAN_OFFSET)..hint)
                .rev()
                .find(|&idx| time >= self.times[idx]);
        }

        let end = (hint + MAX_SCAN_OFFSET).min(last);
        for idx in hint..=end {
            if idx == last || time < self.times[idx + 1] {
                return Some(idx);
            }
        }
        None
    }

    /// Value at key `index`; for cubic splines, skips the tangents.
    fn value_at(&self, index: usize) -> Option<T> {
        match self.interpolation {
            InterpolationMode::CubicSpline => self.values.get(index * 3 + 1).copied(),
            InterpolationMode::Linear | InterpolationMode::Step => self.values.get(index).copied(),
        }
    }

    /// Interpolates inside the interval that starts at key `index`.
    fn sample_at_frame(&self, index: usize, time: f32) -> Option<T> {
        let last = self.times.len() - 1;
        if index >= last {
            return self.value_at(last);
        }

        let (start, end) = (self.times[index], self.times[index + 1]);
        let span = end - start;
        let t = if span > 1e-6 {
            ((time - start) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };

        match self.interpolation {
            InterpolationMode::Step => self.value_at(index),
            InterpolationMode::Linear => Some(T::interpolate_linear(
                self.value_at(index)?,
                self.value_at(index + 1)?,
                t,
            )),
            InterpolationMode::CubicSpline => {
                // Per key: [in_tangent, value, out_tangent]
                let a = index * 3;
                let b = a + 3;
                let keys = self.values.get(a + 1..b + 2)?;
                Some(T::interpolate_cubic(keys[0], keys[1], keys[2], keys[3], t, span))
            }
        }
    }
}
