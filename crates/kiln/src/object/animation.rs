//! Sprite-sheet frame stepping.

/// Frame state for a sprite sheet laid out as one horizontal strip.
///
/// The shader receives `currentFrame` and `frameCount` and samples only the
/// matching slice of the texture.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteAnimation {
    frame_count: u32,
    current_frame: u32,
    seconds_per_frame: f32,
    accumulator: f32,
    repeat: bool,
    done: bool,
}

impl SpriteAnimation {
    /// A looping animation. `frame_count` is clamped to at least 1.
    pub fn new(frame_count: u32, seconds_per_frame: f32) -> Self {
        Self {
            frame_count: frame_count.max(1),
            current_frame: 0,
            seconds_per_frame,
            accumulator: 0.0,
            repeat: true,
            done: false,
        }
    }

    /// Builder form of [`set_repeat`](Self::set_repeat).
    pub fn looping(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    /// Advance by `dt` seconds.
    ///
    /// At most one frame is advanced per call; the accumulator resets to
    /// zero on each advance. A non-repeating animation sets `done` when it
    /// wraps back to frame 0. Frames keep cycling afterwards and `done` stays
    /// set until [`reset`](Self::reset).
    pub fn update(&mut self, dt: f32) {
        self.accumulator += dt;
        if self.accumulator >= self.seconds_per_frame {
            self.current_frame += 1;
            if self.current_frame >= self.frame_count && !self.repeat {
                self.done = true;
            }
            self.current_frame %= self.frame_count;
            self.accumulator = 0.0;
        }
    }

    /// Rewind to frame 0 and clear `done`.
    pub fn reset(&mut self) {
        self.current_frame = 0;
        self.accumulator = 0.0;
        self.done = false;
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    pub fn set_seconds_per_frame(&mut self, seconds: f32) {
        self.seconds_per_frame = seconds;
    }

    /// Jump to `frame` (wrapped into range).
    pub fn set_frame(&mut self, frame: u32) {
        self.current_frame = frame % self.frame_count;
        self.accumulator = 0.0;
    }

    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn seconds_per_frame(&self) -> f32 {
        self.seconds_per_frame
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_wraps_then_finishes() {
        let mut anim = SpriteAnimation::new(6, 0.1).looping(false);
        let mut frames = Vec::new();
        for step in 1..=6 {
            anim.update(0.1);
            frames.push(anim.current_frame());
            assert_eq!(anim.is_done(), step == 6, "done flipped at step {step}");
        }
        assert_eq!(frames, vec![1, 2, 3, 4, 5, 0]);
    }

    #[test]
    fn one_shot_keeps_cycling_after_finishing() {
        let mut anim = SpriteAnimation::new(6, 0.1).looping(false);
        for _ in 0..8 {
            anim.update(0.1);
        }
        assert!(anim.is_done());
        assert_eq!(anim.current_frame(), 2);

        for _ in 0..4 {
            anim.update(0.1);
        }
        assert!(anim.is_done(), "done stays set across the next wrap");
        assert_eq!(anim.current_frame(), 0);
    }

    #[test]
    fn repeating_never_finishes() {
        let mut anim = SpriteAnimation::new(6, 0.1);
        for _ in 0..100 {
            anim.update(0.1);
            assert!(!anim.is_done());
        }
        assert_eq!(anim.current_frame(), 100 % 6);
    }

    #[test]
    fn accumulates_small_steps() {
        let mut anim = SpriteAnimation::new(4, 0.5);
        anim.update(0.2);
        anim.update(0.2);
        assert_eq!(anim.current_frame(), 0, "0.4s is not enough for one frame");
        anim.update(0.2);
        assert_eq!(anim.current_frame(), 1);
    }

    #[test]
    fn large_delta_advances_one_frame() {
        let mut anim = SpriteAnimation::new(4, 0.1);
        anim.update(1.0);
        assert_eq!(anim.current_frame(), 1);
    }

    #[test]
    fn reset_rewinds() {
        let mut anim = SpriteAnimation::new(2, 0.1).looping(false);
        anim.update(0.1);
        anim.update(0.1);
        assert!(anim.is_done());
        anim.reset();
        assert!(!anim.is_done());
        assert_eq!(anim.current_frame(), 0);
    }

    #[test]
    fn zero_frames_clamps_to_one() {
        let mut anim = SpriteAnimation::new(0, 0.1);
        anim.update(0.1);
        assert_eq!(anim.frame_count(), 1);
        assert_eq!(anim.current_frame(), 0);
    }
}
