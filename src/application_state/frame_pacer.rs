//! Optional frame rate cap.

use web_time::{Duration, Instant};

/// Spaces frames at least `1 / max_fps` apart. A cap of zero disables pacing.
pub struct FramePacer {
    frame_time: Option<Duration>,
    next_frame: Instant,
}

impl FramePacer {
    pub fn new(max_fps: u32, now: Instant) -> Self {
        Self {
            frame_time: (max_fps > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(max_fps))),
            next_frame: now,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_frame
    }

    /// When the next frame may start, or `None` when uncapped.
    pub fn deadline(&self) -> Option<Instant> {
        self.frame_time.map(|_| self.next_frame)
    }

    pub fn frame_started(&mut self, now: Instant) {
        if let Some(frame_time) = self.frame_time {
            self.next_frame = now + frame_time;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncapped_is_always_due() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(0, start);
        pacer.frame_started(start);
        assert!(pacer.is_due(start));
        assert_eq!(pacer.deadline(), None);
    }

    #[test]
    fn capped_waits_one_frame_time() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(50, start);
        assert!(pacer.is_due(start));

        pacer.frame_started(start);
        assert!(!pacer.is_due(start + Duration::from_millis(10)));
        assert!(pacer.is_due(start + Duration::from_millis(20)));
        assert_eq!(pacer.deadline(), Some(start + Duration::from_millis(20)));
    }
}
