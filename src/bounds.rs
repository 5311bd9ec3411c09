use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Milliseconds since UNIX epoch (UTC).
pub type TimestampMs = i64;

/// A span of time in milliseconds.
pub type DurationMs = i64;

/// Time bounds of a block: `duration / step_size` evenly spaced steps,
/// the first one at `start`. Covers the closed-open range `[start, start + duration)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub start: TimestampMs,
    pub duration: DurationMs,
    pub step_size: DurationMs,
}

impl Bounds {
    #[inline]
    pub fn new(start: TimestampMs, duration: DurationMs, step_size: DurationMs) -> Self {
        debug_assert!(duration >= 0);
        Self { start, duration, step_size }
    }

    /// Bounds covering exactly one step beginning at `start`.
    #[inline]
    pub fn single_step(start: TimestampMs, step_size: DurationMs) -> Self {
        Self { start, duration: step_size, step_size }
    }

    /// Number of steps; zero when the step size is not positive.
    #[inline]
    pub fn steps(&self) -> usize {
        if self.step_size <= 0 || self.duration <= 0 {
            return 0;
        }
        (self.duration / self.step_size) as usize
    }

    #[inline]
    pub fn end(&self) -> TimestampMs {
        self.start + self.duration
    }

    /// Timestamp of the step at `index`.
    pub fn time_for_index(&self, index: usize) -> Result<TimestampMs> {
        let steps = self.steps();
        if index >= steps {
            return Err(Error::Bounds { index, steps });
        }
        Ok(self.start + index as i64 * self.step_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_and_times() {
        let b = Bounds::new(1_000, 50, 10);
        assert_eq!(b.steps(), 5);
        assert_eq!(b.end(), 1_050);
        assert_eq!(b.time_for_index(0).unwrap(), 1_000);
        assert_eq!(b.time_for_index(4).unwrap(), 1_040);
        assert!(matches!(
            b.time_for_index(5),
            Err(Error::Bounds { index: 5, steps: 5 })
        ));
    }

    #[test]
    fn zero_step_size_has_no_steps() {
        let b = Bounds::new(0, 100, 0);
        assert_eq!(b.steps(), 0);
        assert!(b.time_for_index(0).is_err());
    }

    #[test]
    fn single_step_bounds() {
        let b = Bounds::single_step(40, 10);
        assert_eq!(b.steps(), 1);
        assert_eq!(b.time_for_index(0).unwrap(), 40);
    }
}
