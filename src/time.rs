//! Frame clock feeding `update(delta)` calls.
//!
//! ```ignore
//! let mut clock = Clock::new();
//! loop {
//!     let dt = clock.tick();
//!     stage.frame_with_delta(dt);
//! }
//! ```

use std::time::{Duration, Instant};

/// Longest delta a single tick reports, so a stalled host does not skip
/// whole transitions in one frame.
pub const MAX_DELTA: f32 = 0.1;

/// Per-frame delta timing.
#[derive(Debug)]
pub struct Clock {
    start: Instant,
    last_tick: Instant,
    delta_secs: f32,
    frame_count: u64,
    /// When the current pause began.
    paused_at: Option<Instant>,
    pause_elapsed: Duration,
    /// Fixed delta for deterministic stepping.
    fixed_delta: Option<f32>,
    max_delta: f32,
}

impl Clock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
            delta_secs: 0.0,
            frame_count: 0,
            paused_at: None,
            pause_elapsed: Duration::ZERO,
            fixed_delta: None,
            max_delta: MAX_DELTA,
        }
    }

    /// Advance one frame and return the delta in seconds.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();

        if self.paused_at.is_some() {
            self.delta_secs = 0.0;
            return 0.0;
        }

        let raw = now.duration_since(self.last_tick).as_secs_f32();
        self.delta_secs = self.fixed_delta.unwrap_or(raw).min(self.max_delta);
        self.last_tick = now;
        self.frame_count += 1;
        self.delta_secs
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Wall-clock seconds since creation, excluding paused time.
    pub fn elapsed(&self) -> f32 {
        let ongoing = self.paused_at.map_or(Duration::ZERO, |at| at.elapsed());
        self.start
            .elapsed()
            .saturating_sub(self.pause_elapsed + ongoing)
            .as_secs_f32()
    }

    pub fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(Instant::now());
        }
    }

    pub fn resume(&mut self) {
        if let Some(at) = self.paused_at.take() {
            let paused_for = at.elapsed();
            self.pause_elapsed += paused_for;
            // Time before the pause still counts toward the next delta
            self.last_tick += paused_for;
        }
    }

    /// Pass `None` to return to real frame timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    pub fn set_max_delta(&mut self, max: f32) {
        self.max_delta = max.max(0.0);
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_tick_counts_frames() {
        let mut clock = Clock::new();
        thread::sleep(Duration::from_millis(5));
        assert!(clock.tick() > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_pause_reports_zero_delta() {
        let mut clock = Clock::new();
        clock.pause();
        thread::sleep(Duration::from_millis(5));
        assert_eq!(clock.tick(), 0.0);
        assert_eq!(clock.frame(), 0);

        clock.resume();
        assert!(!clock.is_paused());
    }

    #[test]
    fn test_time_before_pause_is_not_paused_time() {
        let mut clock = Clock::new();
        thread::sleep(Duration::from_millis(20));
        clock.pause();
        clock.resume();
        assert!(clock.elapsed() >= 0.019);

        clock.pause();
        thread::sleep(Duration::from_millis(20));
        let during = clock.elapsed();
        clock.resume();
        assert!(clock.elapsed() - during < 0.015);
    }

    #[test]
    fn test_fixed_delta_and_clamp() {
        let mut clock = Clock::new();
        clock.set_fixed_delta(Some(1.0 / 60.0));
        assert!((clock.tick() - 1.0 / 60.0).abs() < 1e-6);

        clock.set_fixed_delta(Some(5.0));
        assert_eq!(clock.tick(), MAX_DELTA);
    }
}
