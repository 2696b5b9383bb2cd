use std::time::{Duration, Instant};

/// Summary emitted once per perf interval.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameReport {
    /// Frames drawn in the interval.
    pub frames: u32,
    /// Frames per second over the interval.
    pub fps: f32,
    /// Frames in the interval whose draw time exceeded the advisory budget.
    pub overruns: u32,
}

/// Frame-rate accounting.
///
/// Every `perf_interval` frames the window closes, a `FrameReport` is produced
/// and logged. An interval of `0` disables reporting but keeps the totals.
#[derive(Debug, Clone)]
pub struct FrameStats {
    perf_interval: u32,
    window_start: Option<Instant>,
    window_frames: u32,
    window_overruns: u32,
    total_frames: u64,
    total_overruns: u64,
    last_report: Option<FrameReport>,
}

impl FrameStats {
    pub fn new(perf_interval: u32) -> Self {
        Self {
            perf_interval,
            window_start: None,
            window_frames: 0,
            window_overruns: 0,
            total_frames: 0,
            total_overruns: 0,
            last_report: None,
        }
    }

    /// Records one drawn frame.
    ///
    /// `started` is the frame's start timestamp, `spent` how long drawing took.
    pub fn record(&mut self, started: Instant, spent: Duration, budget: Duration) -> Option<FrameReport> {
        let window_start = *self.window_start.get_or_insert(started);

        self.total_frames += 1;
        self.window_frames += 1;
        if spent > budget {
            self.total_overruns += 1;
            self.window_overruns += 1;
            log::trace!("frame over budget: spent={spent:?} budget={budget:?}");
        }

        if self.perf_interval == 0 || self.window_frames < self.perf_interval {
            return None;
        }

        let elapsed = (started + spent).saturating_duration_since(window_start);
        let fps = if elapsed.is_zero() {
            0.0
        } else {
            self.window_frames as f32 / elapsed.as_secs_f32()
        };

        let report = FrameReport {
            frames: self.window_frames,
            fps,
            overruns: self.window_overruns,
        };
        log::info!(
            "frame stats: fps={:.1} frames={} overruns={}",
            report.fps,
            report.frames,
            report.overruns
        );

        self.window_start = None;
        self.window_frames = 0;
        self.window_overruns = 0;
        self.last_report = Some(report);
        Some(report)
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn total_overruns(&self) -> u64 {
        self.total_overruns
    }

    pub fn last_report(&self) -> Option<FrameReport> {
        self.last_report
    }
}
