use std::time::{Duration, Instant};

/// Extend-only render deadline.
///
/// While `now < until`, frames must keep being produced even if nothing else
/// changed. Animations push the deadline forward; a request for an earlier
/// time never shortens one that is already pending.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct RenderDeadline {
    until: Option<Instant>,
}

impl RenderDeadline {
    pub const fn new() -> Self {
        Self { until: None }
    }

    /// Moves the deadline to `t` if `t` is later than the current one.
    ///
    /// Returns `true` when the deadline moved.
    pub fn extend(&mut self, t: Instant) -> bool {
        match self.until {
            Some(current) if current >= t => false,
            _ => {
                self.until = Some(t);
                true
            }
        }
    }

    /// Effective deadline, if one was ever set.
    #[inline]
    pub fn until(&self) -> Option<Instant> {
        self.until
    }

    #[inline]
    pub fn is_active(&self, now: Instant) -> bool {
        self.until.is_some_and(|until| now < until)
    }

    /// Time left before the deadline; zero once it has passed.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.until
            .map(|until| until.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }
}
