//! Frame timing for the game loop.

use std::time::{Duration, Instant};

/// Source of per-tick timing consumed by gameplay code.
pub trait FrameClock {
    /// Milliseconds elapsed since the previous tick.
    fn elapsed_millis(&self) -> f32;
    /// Milliseconds since the clock started.
    fn now_millis(&self) -> u64;
}

/// Manages frame timing and delta time calculation.
#[derive(Debug)]
pub struct Time {
    /// Time when the engine started.
    start_time: Instant,
    /// Time of the last frame.
    last_frame: Instant,
    /// Duration of the last frame.
    delta: Duration,
    /// Frame count since start.
    frame_count: u64,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new time manager.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            last_frame: now,
            delta: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Update timing at the start of a new frame.
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta = now - self.last_frame;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the delta time in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the current FPS (averaged over last frame).
    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }
}

impl FrameClock for Time {
    fn elapsed_millis(&self) -> f32 {
        self.delta.as_secs_f32() * 1000.0
    }

    fn now_millis(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }
}

/// Clock advanced by hand, for deterministic simulation.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock {
    pub step_millis: f32,
    pub now: u64,
}

impl FixedClock {
    pub fn new(step_millis: f32) -> Self {
        Self {
            step_millis,
            now: 0,
        }
    }

    pub fn tick(&mut self) {
        self.now += self.step_millis as u64;
    }
}

impl FrameClock for FixedClock {
    fn elapsed_millis(&self) -> f32 {
        self.step_millis
    }

    fn now_millis(&self) -> u64 {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances_by_step() {
        let mut clock = FixedClock::new(16.0);
        clock.tick();
        clock.tick();
        assert_eq!(clock.now_millis(), 32);
        assert_eq!(clock.elapsed_millis(), 16.0);
    }

    /// A fresh clock reports no elapsed time before the first update.
    #[test]
    fn new_time_has_zero_delta() {
        let time = Time::new();
        assert_eq!(time.elapsed_millis(), 0.0);
        assert_eq!(time.frame_count(), 0);
        assert_eq!(time.fps(), 0.0);
    }

    /// Long frames are reported in full so the simulation keeps real time.
    #[test]
    fn update_reports_long_frames_in_full() {
        let mut time = Time::new();
        let Some(earlier) = time.last_frame.checked_sub(Duration::from_secs(5)) else {
            return;
        };
        time.last_frame = earlier;
        time.update();
        assert_eq!(time.frame_count(), 1);
        assert!(time.elapsed_millis() >= 5000.0);
    }
}
