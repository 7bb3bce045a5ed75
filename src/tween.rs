//! Easing curves and wall-clock tweens for show/hide scale animation.

/// Easing curve applied to linear progress in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ease {
    Linear,
    /// Fast start, gentle landing. Used when showing.
    #[default]
    CubicOut,
    /// Gentle start, fast finish. Used when hiding.
    CubicIn,
    CubicInOut,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::CubicOut => 1.0 - (1.0 - t).powi(3),
            Ease::CubicIn => t * t * t,
            Ease::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// A value animated from `from` to `to` over a fixed duration.
///
/// Progress is `elapsed / duration` clamped to `[0, 1]`, so the result does
/// not depend on frame rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub duration: f32,
    pub ease: Ease,
    elapsed: f32,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: f32, ease: Ease) -> Self {
        Self {
            from,
            to,
            duration,
            ease,
            elapsed: 0.0,
        }
    }

    /// Advance by `dt` seconds and return the current value.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed += dt.max(0.0);
        self.value()
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn value(&self) -> f32 {
        let k = self.ease.apply(self.progress());
        self.from + (self.to - self.from) * k
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }
}
