use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};

use crate::paint::Color;
use crate::time::{Clock, FrameClock, FrameStats, RenderDeadline, SystemClock};

use super::{
    FrameError, FrameInput, RenderBackend, Renderer, ResizeError, SchedulerConfig, SurfaceInfo,
};

/// Scheduler lifecycle.
///
/// `Uninitialized → ContextBound → Rendering ⇄ Idle`. Losing the context
/// returns to `Uninitialized`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SchedulerState {
    Uninitialized,
    ContextBound,
    Rendering,
    Idle,
}

/// What the host loop should do next.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Schedule {
    /// A frame is due; call `render`.
    RenderNow,
    /// A frame will be due at this time.
    WaitUntil(Instant),
    /// Nothing to draw until something changes.
    Idle,
}

/// Decides when frames are produced and drives a [`RenderBackend`].
///
/// Frames are due while the view is invalidated or the render-until deadline
/// is live, paced at the configured frame interval.
pub struct RenderScheduler<B, C = SystemClock> {
    backend: B,
    clock: C,
    state: SchedulerState,
    surface: Option<SurfaceInfo>,
    deadline: RenderDeadline,
    /// A deadline extension that has not seen a frame yet.
    deadline_frame_owed: bool,
    dirty: bool,
    failed: bool,
    unbound_reported: bool,
    clear: Color,
    frame_interval: Duration,
    last_frame: Option<Instant>,
    frame_clock: FrameClock,
    stats: FrameStats,
}

impl<B: RenderBackend> RenderScheduler<B, SystemClock> {
    pub fn new(backend: B, config: &SchedulerConfig) -> Self {
        Self::with_clock(backend, config, SystemClock)
    }
}

impl<B: RenderBackend, C: Clock> RenderScheduler<B, C> {
    pub fn with_clock(backend: B, config: &SchedulerConfig, clock: C) -> Self {
        Self {
            backend,
            clock,
            state: SchedulerState::Uninitialized,
            surface: None,
            deadline: RenderDeadline::new(),
            deadline_frame_owed: false,
            dirty: true,
            failed: false,
            unbound_reported: false,
            clear: config.clear_color,
            frame_interval: config.frame_interval(),
            last_frame: None,
            frame_clock: FrameClock::new(),
            stats: FrameStats::new(config.perf_interval),
        }
    }

    /// Current lifecycle state.
    ///
    /// Once frames have been drawn, `Rendering` and `Idle` follow from whether
    /// a frame is still wanted right now.
    pub fn state(&self) -> SchedulerState {
        match self.state {
            SchedulerState::Rendering | SchedulerState::Idle => {
                if self.wants_frame(self.clock.now()) {
                    SchedulerState::Rendering
                } else {
                    SchedulerState::Idle
                }
            }
            other => other,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Current time in the scheduler's clock domain.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Last surface accepted by `resize`.
    pub fn surface(&self) -> Option<&SurfaceInfo> {
        self.surface.as_ref()
    }

    pub fn deadline(&self) -> &RenderDeadline {
        &self.deadline
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn clear_color(&self) -> Color {
        self.clear
    }

    /// True once a fatal frame error occurred; the scheduler stops drawing.
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Marks the view as changed; the next `poll` asks for a frame.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn set_clear_color(&mut self, color: Color) {
        if self.clear != color {
            self.clear = color;
            self.invalidate();
        }
    }

    /// Context-invalidating event (e.g. the app was suspended).
    ///
    /// `use_context` must be called again before the next frame.
    pub fn context_lost(&mut self) {
        if self.state == SchedulerState::Uninitialized {
            return;
        }
        log::info!("{} context lost", self.backend.kind().name());
        self.backend.release_context();
        self.state = SchedulerState::Uninitialized;
    }

    /// Frame decision at `now`.
    pub fn poll(&self, now: Instant) -> Schedule {
        if self.failed || self.state == SchedulerState::Uninitialized || self.surface.is_none() {
            return Schedule::Idle;
        }

        let deadline_live = self.deadline.is_active(now);
        if !self.dirty && !deadline_live {
            return Schedule::Idle;
        }

        let slot = self
            .last_frame
            .map_or(now, |last| last + self.frame_interval);
        if now >= slot {
            return Schedule::RenderNow;
        }

        match self.deadline.until() {
            // Only the deadline is asking for frames. A fresh extension that
            // ends before the next slot gets its frame now, not after it.
            Some(until) if !self.dirty => {
                if slot >= until && self.deadline_frame_owed {
                    Schedule::RenderNow
                } else {
                    Schedule::WaitUntil(slot.min(until))
                }
            }
            _ => Schedule::WaitUntil(slot),
        }
    }

    /// `poll` at the scheduler's current time.
    pub fn schedule(&self) -> Schedule {
        self.poll(self.clock.now())
    }

    fn wants_frame(&self, now: Instant) -> bool {
        self.dirty || self.deadline.is_active(now)
    }

    fn fail(&mut self, reason: &str) {
        log::error!("{} renderer failed: {reason}", self.backend.kind().name());
        self.backend.release_context();
        self.state = SchedulerState::Uninitialized;
        self.failed = true;
    }
}

impl<B: RenderBackend, C: Clock> Renderer for RenderScheduler<B, C> {
    fn render(&mut self, budget: Duration) {
        if self.failed {
            return;
        }

        if self.state == SchedulerState::Uninitialized {
            if !self.unbound_reported {
                log::error!("render called without a bound context; frame skipped");
                self.unbound_reported = true;
            }
            return;
        }

        let Some(surface) = self.surface else {
            log::debug!("no valid surface yet; frame skipped");
            return;
        };

        let started = self.clock.now();
        self.state = SchedulerState::Rendering;

        let input = FrameInput {
            time: self.frame_clock.tick(started),
            budget,
            clear: self.clear,
            surface: &surface,
        };
        let outcome = self.backend.draw(&input);

        let finished = self.clock.now();
        self.last_frame = Some(started);
        self.deadline_frame_owed = false;

        match outcome {
            Ok(()) => {
                self.dirty = false;
                self.stats
                    .record(started, finished.saturating_duration_since(started), budget);
            }
            Err(FrameError::Skipped(reason)) => {
                log::warn!("frame {} skipped: {reason}", input.time.frame_index);
            }
            Err(FrameError::Fatal(reason)) => {
                self.fail(&reason);
                return;
            }
        }

        self.state = if self.wants_frame(finished) {
            SchedulerState::Rendering
        } else {
            SchedulerState::Idle
        };
        log::trace!("frame done, state={:?}", self.state);
    }

    fn resize(&mut self, surface: &SurfaceInfo) -> Result<(), ResizeError> {
        let result = surface
            .validate()
            .and_then(|()| self.backend.resize_targets(surface));

        if let Err(err) = &result {
            log::warn!("resize to {}x{} rejected: {err}", surface.width, surface.height);
            return result;
        }

        log::debug!(
            "resized to {}x{} @{}x",
            surface.width,
            surface.height,
            surface.scale_factor
        );
        self.surface = Some(*surface);
        self.invalidate();
        Ok(())
    }

    fn use_context(&mut self) -> Result<()> {
        if self.failed {
            bail!("renderer has failed; context cannot be bound again");
        }

        let kind = self.backend.kind();
        self.backend
            .bind_context()
            .with_context(|| format!("failed to bind {} context", kind.name()))?;

        if self.state == SchedulerState::Uninitialized {
            log::debug!("{} context bound", kind.name());
            self.state = SchedulerState::ContextBound;
            self.unbound_reported = false;
            self.frame_clock.reset(self.clock.now());
            // A fresh binding has nothing presented yet.
            self.dirty = true;
        }
        Ok(())
    }

    fn set_render_until(&mut self, until: Instant) {
        if self.deadline.extend(until) {
            let now = self.clock.now();
            if self.deadline.is_active(now) {
                self.deadline_frame_owed = true;
            }
            log::trace!(
                "render-until extended, {:?} remaining",
                self.deadline.remaining(now)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{BackendKind, SoftwareBackend};
    use crate::time::ManualClock;

    const FRAME: Duration = Duration::from_nanos(1_000_000_000 / 60);

    fn surface(w: u32, h: u32) -> SurfaceInfo {
        SurfaceInfo::new(w, h, 2.0, wgpu::TextureFormat::Bgra8UnormSrgb)
    }

    fn scheduler() -> (RenderScheduler<SoftwareBackend, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let s = RenderScheduler::with_clock(
            SoftwareBackend::new(),
            &SchedulerConfig::default(),
            clock.clone(),
        );
        (s, clock)
    }

    fn ready() -> (RenderScheduler<SoftwareBackend, ManualClock>, ManualClock) {
        let (mut s, clock) = scheduler();
        s.use_context().unwrap();
        s.resize(&surface(64, 48)).unwrap();
        (s, clock)
    }

    /// Backend whose next draw returns a scripted error.
    struct ScriptedBackend {
        inner: SoftwareBackend,
        next_error: Option<FrameError>,
    }

    impl RenderBackend for ScriptedBackend {
        fn kind(&self) -> BackendKind {
            self.inner.kind()
        }

        fn bind_context(&mut self) -> Result<()> {
            self.inner.bind_context()
        }

        fn release_context(&mut self) {
            self.inner.release_context()
        }

        fn resize_targets(&mut self, surface: &SurfaceInfo) -> Result<(), ResizeError> {
            self.inner.resize_targets(surface)
        }

        fn draw(&mut self, frame: &FrameInput<'_>) -> Result<(), FrameError> {
            match self.next_error.take() {
                Some(err) => Err(err),
                None => self.inner.draw(frame),
            }
        }
    }

    /// Backend that cannot bind.
    struct NoContext;

    impl RenderBackend for NoContext {
        fn kind(&self) -> BackendKind {
            BackendKind::Wgpu
        }

        fn bind_context(&mut self) -> Result<()> {
            bail!("no adapter")
        }

        fn release_context(&mut self) {}

        fn resize_targets(&mut self, _surface: &SurfaceInfo) -> Result<(), ResizeError> {
            Ok(())
        }

        fn draw(&mut self, _frame: &FrameInput<'_>) -> Result<(), FrameError> {
            Ok(())
        }
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn starts_uninitialized_and_binds() {
        let (mut s, _) = scheduler();
        assert_eq!(s.state(), SchedulerState::Uninitialized);

        s.use_context().unwrap();
        assert_eq!(s.state(), SchedulerState::ContextBound);
    }

    #[test]
    fn use_context_is_idempotent() {
        let (mut s, _) = scheduler();
        s.use_context().unwrap();
        s.use_context().unwrap();

        assert_eq!(s.state(), SchedulerState::ContextBound);
        assert_eq!(s.backend().acquisitions(), 1);
        assert_eq!(s.backend().binds(), 2);
    }

    #[test]
    fn render_without_context_draws_nothing() {
        let (mut s, _) = scheduler();
        s.resize(&surface(32, 32)).unwrap();

        s.render(FRAME);
        assert_eq!(s.backend().presented_frames(), 0);
        assert_eq!(s.state(), SchedulerState::Uninitialized);
        assert_eq!(s.schedule(), Schedule::Idle);

        // The pending frame is drawn once the context is bound.
        s.use_context().unwrap();
        assert_eq!(s.schedule(), Schedule::RenderNow);
        s.render(FRAME);
        assert_eq!(s.backend().presented_frames(), 1);
    }

    #[test]
    fn lost_context_requires_rebinding() {
        let (mut s, clock) = ready();
        s.render(FRAME);

        s.context_lost();
        assert_eq!(s.state(), SchedulerState::Uninitialized);
        assert!(!s.backend().is_bound());

        clock.advance(FRAME);
        s.render(FRAME);
        assert_eq!(s.backend().presented_frames(), 1);

        s.use_context().unwrap();
        assert_eq!(s.backend().acquisitions(), 2);
        s.render(FRAME);
        assert_eq!(s.backend().presented_frames(), 2);
    }

    #[test]
    fn bind_failure_is_reported() {
        let mut s = RenderScheduler::with_clock(NoContext, &SchedulerConfig::default(), ManualClock::new());
        let err = s.use_context().unwrap_err();
        assert!(format!("{err:#}").contains("no adapter"));
        assert_eq!(s.state(), SchedulerState::Uninitialized);
    }

    // ── resize ────────────────────────────────────────────────────────────

    #[test]
    fn repeated_resize_and_render_do_not_leak() {
        let (mut s, clock) = ready();
        let live = s.backend().ledger().live();

        for i in 1..=20u32 {
            s.resize(&surface(16 * i, 9 * i)).unwrap();
            s.render(FRAME);
            clock.advance(FRAME);
            assert_eq!(s.backend().ledger().live(), live);
        }
        assert_eq!(s.backend().presented_frames(), 20);
        assert!(!s.has_failed());
    }

    #[test]
    fn invalid_resize_is_atomic() {
        let (mut s, _) = ready();
        s.render(FRAME);

        let err = s.resize(&surface(0, 0)).unwrap_err();
        assert_eq!(err, ResizeError::ZeroArea { width: 0, height: 0 });

        assert_eq!(s.surface(), Some(&surface(64, 48)));
        assert_eq!(s.backend().target_size(), Some((64, 48)));
        assert_eq!(s.backend().ledger().live(), 3);
        assert_eq!(s.schedule(), Schedule::Idle);
    }

    #[test]
    fn resize_invalidates() {
        let (mut s, clock) = ready();
        s.render(FRAME);
        clock.advance(FRAME);
        assert_eq!(s.schedule(), Schedule::Idle);

        s.resize(&surface(80, 60)).unwrap();
        assert_eq!(s.schedule(), Schedule::RenderNow);
    }

    // ── deadline ──────────────────────────────────────────────────────────

    #[test]
    fn render_until_is_extend_only() {
        let (mut s, clock) = ready();
        let t1 = clock.now() + Duration::from_secs(1);
        let t2 = clock.now() + Duration::from_secs(2);

        s.set_render_until(t1);
        s.set_render_until(t2);
        assert_eq!(s.deadline().until(), Some(t2));

        s.set_render_until(t1);
        assert_eq!(s.deadline().until(), Some(t2));
    }

    #[test]
    fn live_deadline_keeps_frames_coming() {
        let (mut s, clock) = ready();
        s.render(FRAME);
        assert_eq!(s.state(), SchedulerState::Idle);

        let until = clock.now() + Duration::from_millis(100);
        s.set_render_until(until);
        assert_eq!(s.state(), SchedulerState::Rendering);

        match s.schedule() {
            Schedule::WaitUntil(t) => assert!(t < until && t > clock.now()),
            other => panic!("expected a paced wait, got {other:?}"),
        }

        clock.advance(FRAME);
        assert_eq!(s.schedule(), Schedule::RenderNow);
    }

    #[test]
    fn deadline_inside_the_frame_interval_still_renders() {
        let (mut s, clock) = ready();
        s.render(FRAME);

        let until = clock.now() + Duration::from_millis(5);
        s.set_render_until(until);
        assert_eq!(s.schedule(), Schedule::RenderNow);

        s.render(FRAME);
        assert_eq!(s.backend().presented_frames(), 2);
        // The extension got its frame; the next slot lies past the deadline.
        assert_eq!(s.schedule(), Schedule::WaitUntil(until));

        clock.set(until);
        assert_eq!(s.schedule(), Schedule::Idle);
    }

    #[test]
    fn host_loop_renders_before_a_short_deadline_passes() {
        let (mut s, clock) = ready();
        s.render(FRAME);
        clock.advance(Duration::from_millis(2));

        let until = clock.now() + Duration::from_millis(5);
        s.set_render_until(until);

        let mut before_deadline = 0;
        loop {
            match s.schedule() {
                Schedule::RenderNow => {
                    if clock.now() < until {
                        before_deadline += 1;
                    }
                    s.render(FRAME);
                    clock.advance(Duration::from_millis(1));
                }
                Schedule::WaitUntil(t) => {
                    assert!(t <= until);
                    clock.set(t);
                }
                Schedule::Idle => break,
            }
        }

        assert_eq!(before_deadline, 1);
        assert_eq!(s.backend().presented_frames(), 2);
        assert!(clock.now() >= until);
    }

    #[test]
    fn past_deadline_does_not_wake() {
        let (mut s, clock) = ready();
        s.render(FRAME);
        clock.advance(Duration::from_secs(1));

        s.set_render_until(clock.now() - Duration::from_millis(1));
        assert_eq!(s.state(), SchedulerState::Idle);
        assert_eq!(s.schedule(), Schedule::Idle);
    }

    #[test]
    fn resize_render_and_fade_scenario() {
        let (mut s, clock) = scheduler();
        s.use_context().unwrap();

        assert!(s.resize(&surface(0, 0)).is_err());
        assert!(s.resize(&surface(100, 100)).is_ok());

        s.render(FRAME);
        assert_eq!(s.backend().presented_frames(), 1);

        let start = clock.now();
        let until = start + Duration::from_secs(2);
        s.set_render_until(until);

        // Host loop: sleep until told, draw when told, stop when idle.
        let mut frames = 0;
        loop {
            match s.schedule() {
                Schedule::RenderNow => {
                    s.render(FRAME);
                    frames += 1;
                    clock.advance(Duration::from_millis(1));
                }
                Schedule::WaitUntil(t) => {
                    assert!(t <= until);
                    clock.set(t);
                }
                Schedule::Idle => break,
            }
        }

        assert!(clock.now() >= until);
        // 2s at 60fps.
        assert!((119..=121).contains(&frames), "frames = {frames}");
        assert_eq!(s.state(), SchedulerState::Idle);

        clock.advance(Duration::from_secs(10));
        assert_eq!(s.schedule(), Schedule::Idle);
    }

    // ── invalidation & pacing ─────────────────────────────────────────────

    #[test]
    fn invalidation_is_paced() {
        let (mut s, clock) = ready();
        s.render(FRAME);
        let first = clock.now();

        clock.advance(Duration::from_millis(4));
        s.invalidate();
        assert_eq!(s.schedule(), Schedule::WaitUntil(first + FRAME));

        clock.set(first + FRAME);
        assert_eq!(s.schedule(), Schedule::RenderNow);
    }

    #[test]
    fn clear_color_reaches_the_backend() {
        let (mut s, clock) = ready();
        s.render(FRAME);
        clock.advance(FRAME);

        s.set_clear_color(Color::from_premul(0.0, 1.0, 0.0, 1.0));
        assert_eq!(s.schedule(), Schedule::RenderNow);
        s.render(FRAME);

        assert_eq!(s.backend().pixel(0, 0), Some([0, 255, 0, 255]));
        assert_eq!(s.backend().pixel(63, 47), Some([0, 255, 0, 255]));

        // The surface is BGRA, so red lands in the third byte.
        clock.advance(FRAME);
        s.set_clear_color(Color::from_premul(1.0, 0.0, 0.0, 1.0));
        s.render(FRAME);
        assert_eq!(s.backend().pixel(0, 0), Some([0, 0, 255, 255]));
    }

    #[test]
    fn unchanged_clear_color_does_not_invalidate() {
        let (mut s, clock) = ready();
        s.render(FRAME);
        clock.advance(FRAME);

        s.set_clear_color(s.clear_color());
        assert_eq!(s.schedule(), Schedule::Idle);
    }

    // ── frame errors ──────────────────────────────────────────────────────

    fn scripted() -> (RenderScheduler<ScriptedBackend, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let backend = ScriptedBackend {
            inner: SoftwareBackend::new(),
            next_error: None,
        };
        let mut s = RenderScheduler::with_clock(backend, &SchedulerConfig::default(), clock.clone());
        s.use_context().unwrap();
        s.resize(&surface(16, 16)).unwrap();
        (s, clock)
    }

    #[test]
    fn skipped_frame_stays_pending() {
        let (mut s, clock) = scripted();
        s.backend_mut().next_error = Some(FrameError::Skipped("timeout".into()));

        s.render(FRAME);
        assert_eq!(s.backend().inner.presented_frames(), 0);
        assert!(!s.has_failed());

        clock.advance(FRAME);
        assert_eq!(s.schedule(), Schedule::RenderNow);
        s.render(FRAME);
        assert_eq!(s.backend().inner.presented_frames(), 1);
    }

    #[test]
    fn fatal_frame_error_stops_the_scheduler() {
        let (mut s, clock) = scripted();
        s.backend_mut().next_error = Some(FrameError::Fatal("out of memory".into()));

        s.render(FRAME);
        assert!(s.has_failed());
        assert_eq!(s.state(), SchedulerState::Uninitialized);
        assert!(!s.backend().inner.is_bound());
        assert_eq!(s.schedule(), Schedule::Idle);

        assert!(s.use_context().is_err());
        clock.advance(FRAME);
        s.render(FRAME);
        assert_eq!(s.backend().inner.presented_frames(), 0);
    }

    #[test]
    fn stats_count_drawn_frames() {
        let (mut s, clock) = ready();
        for _ in 0..5 {
            s.render(FRAME);
            clock.advance(FRAME);
        }
        assert_eq!(s.stats().total_frames(), 5);
        assert_eq!(s.stats().total_overruns(), 0);
    }
}
