use std::{
    thread,
    time::{Duration, Instant},
};

/// Caps the rate at which a single window is updated
#[derive(Debug, Default)]
pub(crate) struct FramePacer {
    last_frame: Option<Instant>,
    last_interval: Option<Duration>,
}

impl FramePacer {
    /// Sleep until at least `interval` passed since the previous frame, then start a new frame.
    ///
    /// The first frame never sleeps.
    pub fn pace(&mut self, interval: Option<Duration>) {
        if let Some(last) = self.last_frame {
            if let Some(interval) = interval {
                let elapsed = last.elapsed();
                if elapsed < interval {
                    thread::sleep(interval - elapsed);
                }
            }
            self.last_interval = Some(last.elapsed());
        }
        self.last_frame = Some(Instant::now());
    }

    /// Frames per second measured over the last frame, `0.0` before the second frame
    pub fn fps(&self) -> f64 {
        match self.last_interval {
            Some(interval) if !interval.is_zero() => 1.0 / interval.as_secs_f64(),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_does_not_sleep() {
        let mut pacer = FramePacer::default();
        let start = Instant::now();
        pacer.pace(Some(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(pacer.fps(), 0.0);
    }

    #[test]
    fn frames_are_spaced() {
        let interval = Duration::from_millis(20);
        let mut pacer = FramePacer::default();
        let start = Instant::now();
        for _ in 0..3 {
            pacer.pace(Some(interval));
        }
        assert!(start.elapsed() >= interval * 2);
        assert!(pacer.fps() > 0.0 && pacer.fps() <= 50.0);
    }
}
