//! Frame timing and the fixed update step.
//!
//! [`Time`] is updated by the shell at the start of each frame. Game states
//! get the fixed step as `dt` in `update`; [`Time`] is there for anything
//! that wants wall-clock numbers (FPS counters, total elapsed time).
//!
//! [`FixedTimestep`] turns variable frame times into a whole number of
//! fixed steps. Leftover time carries over to the next frame. After a long
//! stall it runs at most `max_steps` steps and drops the rest, so the game
//! slows down instead of spiralling.

use std::time::{Duration, Instant};

/// Frame timing, updated once per frame.
#[derive(Debug, Clone, Copy)]
pub struct Time {
    startup: Instant,
    frame_start: Instant,
    delta: Duration,
    elapsed: Duration,
    frame_count: u64,
}

impl Time {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            startup: now,
            frame_start: now,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Call at the start of each frame to update timing.
    pub(crate) fn update(&mut self) {
        self.update_at(Instant::now());
    }

    fn update_at(&mut self, now: Instant) {
        self.delta = now.saturating_duration_since(self.frame_start);
        self.frame_start = now;
        self.elapsed = now.saturating_duration_since(self.startup);
        self.frame_count += 1;
    }

    /// Duration of the previous frame.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Delta time in seconds.
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Total elapsed time since startup.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Number of frames so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Estimated FPS based on the last frame's delta.
    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates frame time and hands out fixed steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTimestep {
    step: f32,
    max_steps: u32,
    accumulator: f32,
}

impl FixedTimestep {
    /// `step` seconds per update, at most `max_steps` updates per frame
    /// (clamped to at least 1).
    pub fn new(step: f32, max_steps: u32) -> Self {
        Self {
            step,
            max_steps: max_steps.max(1),
            accumulator: 0.0,
        }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Add `frame_time` seconds and return how many fixed steps to run.
    pub fn accumulate(&mut self, frame_time: f32) -> u32 {
        if self.step <= 0.0 {
            return 1;
        }
        self.accumulator += frame_time.max(0.0);
        let due = (self.accumulator / self.step).floor() as u32;
        let steps = due.min(self.max_steps);
        self.accumulator -= steps as f32 * self.step;
        if due > self.max_steps {
            log::debug!("fixed timestep: dropping {} steps", due - self.max_steps);
            self.accumulator = self.accumulator.rem_euclid(self.step);
        }
        steps
    }

    /// Fraction of a step left in the accumulator, in `0.0..1.0`.
    pub fn alpha(&self) -> f32 {
        if self.step <= 0.0 {
            0.0
        } else {
            self.accumulator / self.step
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn time_tracks_delta_and_frames() {
        let mut time = Time::new();
        let start = time.frame_start;
        time.update_at(start + Duration::from_millis(16));
        time.update_at(start + Duration::from_millis(48));
        assert_eq!(time.frame_count(), 2);
        assert_eq!(time.delta(), Duration::from_millis(32));
        assert_eq!(time.elapsed(), Duration::from_millis(48));
        assert!((time.fps() - 31.25).abs() < 0.01);
    }

    #[test]
    fn fps_is_zero_before_first_frame() {
        assert_eq!(Time::new().fps(), 0.0);
    }

    #[test]
    fn carries_leftover_time() {
        let mut fixed = FixedTimestep::new(0.1, 5);
        assert_eq!(fixed.accumulate(0.05), 0);
        assert_eq!(fixed.accumulate(0.07), 1);
        assert!((fixed.alpha() - 0.2).abs() < 1e-3);
    }

    #[test]
    fn several_steps_in_one_frame() {
        let mut fixed = FixedTimestep::new(0.1, 5);
        assert_eq!(fixed.accumulate(0.35), 3);
        assert!((fixed.alpha() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn clamps_after_stall() {
        let mut fixed = FixedTimestep::new(0.1, 3);
        assert_eq!(fixed.accumulate(2.05), 3);
        assert!(fixed.alpha() < 1.0 + EPSILON, "excess time is dropped");
        assert_eq!(fixed.accumulate(0.0), 0);
    }

    #[test]
    fn negative_time_is_ignored() {
        let mut fixed = FixedTimestep::new(0.1, 3);
        assert_eq!(fixed.accumulate(-1.0), 0);
        assert!(fixed.alpha().abs() < EPSILON);
    }
}
