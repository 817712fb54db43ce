//! Time-driven interpolation for scripted transitions
//!
//! A tween is advanced by elapsed time on every tick; nothing blocks or
//! sleeps. Callers poll `value()` while it runs and react when `advance`
//! reports completion.

/// Easing curves used by the scripted sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutSine,
}

impl Easing {
    /// Map linear progress `t` in [0, 1] through the curve
    #[inline]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::InQuad => t * t,
            Easing::OutQuad => t * (2.0 - t),
            Easing::InOutSine => -((std::f64::consts::PI * t).cos() - 1.0) / 2.0,
        }
    }
}

/// A single resumable interpolation from `from` to `to`
#[derive(Debug, Clone)]
pub struct Tween {
    from: f64,
    to: f64,
    /// Seconds left before progress starts moving
    delay: f64,
    /// Linear progress in [0, 1]
    progress: f64,
    /// Progress per second (infinite for zero-length tweens)
    rate: f64,
    easing: Easing,
}

impl Tween {
    pub fn new(from: f64, to: f64, duration: f64) -> Self {
        let rate = if duration > 0.0 {
            1.0 / duration
        } else {
            f64::INFINITY
        };
        Self {
            from,
            to,
            delay: 0.0,
            progress: 0.0,
            rate,
            easing: Easing::Linear,
        }
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Advance by `dt` seconds. Returns true once the tween has completed.
    pub fn advance(&mut self, dt: f64) -> bool {
        if self.is_finished() {
            return true;
        }
        let mut dt = dt.max(0.0);
        if self.delay > 0.0 {
            if dt < self.delay {
                self.delay -= dt;
                return false;
            }
            dt -= self.delay;
            self.delay = 0.0;
        }
        self.progress = if self.rate.is_infinite() {
            1.0
        } else {
            (self.progress + dt * self.rate).min(1.0)
        };
        self.is_finished()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.progress >= 1.0
    }

    /// Whether the delay has elapsed
    #[inline]
    pub fn has_started(&self) -> bool {
        self.delay <= 0.0
    }

    /// Linear progress in [0, 1]
    #[inline]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Eased progress in [0, 1]
    #[inline]
    pub fn eased(&self) -> f64 {
        self.easing.apply(self.progress)
    }

    /// Current interpolated value
    #[inline]
    pub fn value(&self) -> f64 {
        crate::lerp(self.from, self.to, self.eased())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::InQuad, Easing::OutQuad, Easing::InOutSine] {
            assert!(easing.apply(0.0).abs() < 1e-12, "{easing:?}");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-12, "{easing:?}");
        }
        assert!((Easing::InQuad.apply(0.5) - 0.25).abs() < 1e-12);
        assert!((Easing::OutQuad.apply(0.5) - 0.75).abs() < 1e-12);
        assert!((Easing::InOutSine.apply(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_delay_then_progress() {
        let mut tween = Tween::new(3.0, 1.0, 1.0).with_delay(0.5);
        assert!(!tween.advance(0.25));
        assert!(!tween.has_started());
        assert_eq!(tween.value(), 3.0);

        // 0.25 finishes the delay, the remaining 0.25 moves progress
        assert!(!tween.advance(0.5));
        assert!((tween.progress() - 0.25).abs() < 1e-12);
        assert!((tween.value() - 2.5).abs() < 1e-12);

        assert!(tween.advance(10.0));
        assert_eq!(tween.value(), 1.0);
        // Stays finished
        assert!(tween.advance(0.1));
    }

    #[test]
    fn test_zero_duration_completes_when_started() {
        let mut tween = Tween::new(0.0, 1.0, 0.0);
        assert!(tween.advance(0.0));
        assert_eq!(tween.value(), 1.0);
    }

    #[test]
    fn test_negative_dt_is_ignored() {
        let mut tween = Tween::new(0.0, 1.0, 1.0);
        tween.advance(-5.0);
        assert_eq!(tween.progress(), 0.0);
    }
}
