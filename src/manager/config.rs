use std::time::Duration;

use crate::utils::Point;

/// Default upper bound on simultaneously open windows
pub const MAX_WINDOWS: usize = 64;
/// Default number of events dispatched by a single `should_close` call
pub const EVENTS_PER_CALL: usize = 10;
/// Default frame rate `window_update` paces to
pub const TARGET_FPS: u32 = 60;

/// Tunables of a [`WindowManager`](super::WindowManager)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManagerConfig {
    pub(crate) max_windows: usize,
    pub(crate) events_per_call: usize,
    pub(crate) target_fps: u32,
    pub(crate) initial_position: Point<i32>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            max_windows: MAX_WINDOWS,
            events_per_call: EVENTS_PER_CALL,
            target_fps: TARGET_FPS,
            initial_position: Point::new(10, 10),
        }
    }
}

impl ManagerConfig {
    /// Start building a configuration from the defaults
    pub fn builder() -> ManagerConfigBuilder {
        ManagerConfigBuilder {
            config: ManagerConfig::default(),
        }
    }

    /// Maximum number of open windows
    pub fn max_windows(&self) -> usize {
        self.max_windows
    }

    /// Maximum number of events dispatched per `should_close` call
    pub fn events_per_call(&self) -> usize {
        self.events_per_call
    }

    /// Frame rate `window_update` paces to, `0` if pacing is disabled
    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// Position new windows are created at
    pub fn initial_position(&self) -> Point<i32> {
        self.initial_position
    }

    pub(crate) fn frame_interval(&self) -> Option<Duration> {
        (self.target_fps > 0).then(|| Duration::from_secs(1) / self.target_fps)
    }
}

/// Builder for [`ManagerConfig`]
#[derive(Debug, Clone, Copy)]
pub struct ManagerConfigBuilder {
    config: ManagerConfig,
}

impl ManagerConfigBuilder {
    /// Sets the maximum number of open windows. At least one window is always allowed.
    pub fn max_windows(self, max_windows: usize) -> Self {
        Self {
            config: ManagerConfig {
                max_windows: max_windows.max(1),
                ..self.config
            },
        }
    }

    /// Sets how many events a single `should_close` call dispatches at most.
    ///
    /// At least one event is always dispatched.
    pub fn events_per_call(self, events_per_call: usize) -> Self {
        Self {
            config: ManagerConfig {
                events_per_call: events_per_call.max(1),
                ..self.config
            },
        }
    }

    /// Sets the frame rate `window_update` paces to. `0` disables pacing.
    pub fn target_fps(self, target_fps: u32) -> Self {
        Self {
            config: ManagerConfig {
                target_fps,
                ..self.config
            },
        }
    }

    /// Sets the position new windows are created at.
    ///
    /// Window managers are free to ignore it.
    pub fn initial_position(self, position: impl Into<Point<i32>>) -> Self {
        Self {
            config: ManagerConfig {
                initial_position: position.into(),
                ..self.config
            },
        }
    }

    /// Finish the configuration
    pub fn build(self) -> ManagerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.max_windows(), 64);
        assert_eq!(config.events_per_call(), 10);
        assert_eq!(config.frame_interval(), Some(Duration::from_secs(1) / 60));
        assert_eq!(config.initial_position(), Point::new(10, 10));
    }

    #[test]
    fn builder_clamps() {
        let config = ManagerConfig::builder()
            .max_windows(0)
            .events_per_call(0)
            .target_fps(0)
            .build();
        assert_eq!(config.max_windows(), 1);
        assert_eq!(config.events_per_call(), 1);
        assert_eq!(config.frame_interval(), None);
    }
}
