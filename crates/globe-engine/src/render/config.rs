use std::time::Duration;

use crate::paint::Color;

/// Scheduler configuration.
///
/// `from_env` overlays `GLOBE_TARGET_FPS` and `GLOBE_PERF_INTERVAL` on the
/// defaults; unparsable or zero fps values are ignored.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Pacing target while frames are due.
    pub target_fps: u32,

    /// Frames per stats report; `0` disables reporting.
    pub perf_interval: u32,

    /// Initial clear color.
    pub clear_color: Color,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            perf_interval: 0,
            clear_color: Color::BLACK,
        }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u32>().ok());

        let mut config = Self::default();
        if let Some(fps) = parse("GLOBE_TARGET_FPS").filter(|v| *v > 0) {
            config.target_fps = fps;
        }
        if let Some(interval) = parse("GLOBE_PERF_INTERVAL") {
            config.perf_interval = interval;
        }
        config
    }

    /// Time between paced frames.
    pub fn frame_interval(&self) -> Duration {
        let safe_fps = self.target_fps.max(1);
        Duration::from_nanos(1_000_000_000u64 / safe_fps as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_defaults() {
        let config = SchedulerConfig::from_lookup(|key| match key {
            "GLOBE_TARGET_FPS" => Some("120".to_string()),
            "GLOBE_PERF_INTERVAL" => Some(" 300 ".to_string()),
            _ => None,
        });
        assert_eq!(config.target_fps, 120);
        assert_eq!(config.perf_interval, 300);
    }

    #[test]
    fn bad_values_fall_back() {
        let config = SchedulerConfig::from_lookup(|key| match key {
            "GLOBE_TARGET_FPS" => Some("0".to_string()),
            "GLOBE_PERF_INTERVAL" => Some("often".to_string()),
            _ => None,
        });
        assert_eq!(config.target_fps, 60);
        assert_eq!(config.perf_interval, 0);
    }

    #[test]
    fn frame_interval_from_fps() {
        let config = SchedulerConfig {
            target_fps: 50,
            ..Default::default()
        };
        assert_eq!(config.frame_interval(), Duration::from_millis(20));

        let config = SchedulerConfig {
            target_fps: 0,
            ..Default::default()
        };
        assert_eq!(config.frame_interval(), Duration::from_secs(1));
    }
}
