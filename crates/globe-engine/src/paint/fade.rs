use std::time::{Duration, Instant};

use super::Color;

/// Timed transition between two colors.
///
/// A fade only looks smooth if frames keep coming until it ends, so callers
/// push the renderer's deadline to [`ColorFade::deadline`] when starting one.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorFade {
    pub from: Color,
    pub to: Color,
    pub start: Instant,
    pub duration: Duration,
}

impl ColorFade {
    pub fn new(from: Color, to: Color, start: Instant, duration: Duration) -> Self {
        Self { from, to, start, duration }
    }

    #[inline]
    pub fn end(&self) -> Instant {
        self.start + self.duration
    }

    /// Render-until time covering the fade.
    ///
    /// One frame interval past the end, so a frame lands at or after `end()`
    /// and shows the final color.
    pub fn deadline(&self, frame_interval: Duration) -> Instant {
        self.end() + frame_interval
    }

    /// Linear progress in [0, 1].
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        now >= self.end()
    }

    /// Eased color at `now`.
    pub fn sample(&self, now: Instant) -> Color {
        let t = self.progress(now);
        let eased = t * t * (3.0 - 2.0 * t);
        self.from.lerp(self.to, eased)
    }
}
