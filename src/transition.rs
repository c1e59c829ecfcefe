// Transition planner: per-property Idle -> Animating -> Idle state machine

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    CubicInOut,
}

impl Easing {
    /// Map normalized time in [0, 1] to progress in [0, 1].
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicInOut => {
                let t = t * 2.0;
                if t <= 1.0 {
                    t * t * t / 2.0
                } else {
                    let t = t - 2.0;
                    (t * t * t + 2.0) / 2.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionState {
    Idle,
    Animating { from: f64, to: f64, elapsed: Duration },
}

/// One animatable scalar. Latest target wins; nothing is queued.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    value: f64,
    state: TransitionState,
    duration: Duration,
    easing: Easing,
}

impl Transition {
    pub fn new(initial: f64, duration: Duration, easing: Easing) -> Self {
        Transition {
            value: initial,
            state: TransitionState::Idle,
            duration,
            easing,
        }
    }

    /// Current rendered value.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, TransitionState::Animating { .. })
    }

    /// Value the property is heading to (or resting at).
    pub fn target(&self) -> f64 {
        match self.state {
            TransitionState::Idle => self.value,
            TransitionState::Animating { to, .. } => to,
        }
    }

    /// Retarget from wherever the value currently is.
    pub fn set_target(&mut self, to: f64) {
        if same(to, self.target()) {
            return;
        }
        if self.duration.is_zero() || !to.is_finite() || !self.value.is_finite() {
            self.value = to;
            self.state = TransitionState::Idle;
            return;
        }
        self.state = TransitionState::Animating {
            from: self.value,
            to,
            elapsed: Duration::ZERO,
        };
    }

    /// Advance the clock and return the new value.
    pub fn tick(&mut self, dt: Duration) -> f64 {
        if let TransitionState::Animating { from, to, elapsed } = self.state {
            let elapsed = elapsed + dt;
            let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
            if t >= 1.0 {
                self.value = to;
                self.state = TransitionState::Idle;
            } else {
                self.value = from + (to - from) * self.easing.apply(t);
                self.state = TransitionState::Animating { from, to, elapsed };
            }
        }
        self.value
    }
}

fn same(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_idle_to_animating_to_idle() {
        let mut transition = Transition::new(0.0, ms(100), Easing::Linear);
        assert!(!transition.is_animating());

        transition.set_target(10.0);
        assert!(transition.is_animating());
        assert_eq!(transition.value(), 0.0);

        assert!((transition.tick(ms(50)) - 5.0).abs() < 1e-9);
        assert_eq!(transition.tick(ms(60)), 10.0);
        assert_eq!(transition.state(), TransitionState::Idle);
    }

    #[test]
    fn test_retarget_is_continuous() {
        let mut transition = Transition::new(0.0, ms(400), Easing::CubicInOut);
        transition.set_target(100.0);
        let before = transition.tick(ms(150));

        transition.set_target(-50.0);
        assert_eq!(transition.value(), before);
        match transition.state() {
            TransitionState::Animating { from, to, elapsed } => {
                assert_eq!(from, before);
                assert_eq!(to, -50.0);
                assert_eq!(elapsed, Duration::ZERO);
            }
            TransitionState::Idle => panic!("Expected Animating"),
        }

        // A tiny step stays close to the retarget point.
        let after = transition.tick(ms(1));
        assert!((after - before).abs() < 1.0);
        transition.tick(ms(400));
        assert_eq!(transition.value(), -50.0);
    }

    #[test]
    fn test_same_target_does_not_restart() {
        let mut transition = Transition::new(0.0, ms(100), Easing::Linear);
        transition.set_target(10.0);
        transition.tick(ms(50));
        transition.set_target(10.0);
        assert_eq!(transition.tick(ms(50)), 10.0);

        transition.set_target(10.0);
        assert!(!transition.is_animating());
    }

    #[test]
    fn test_zero_duration_snaps() {
        let mut transition = Transition::new(1.0, Duration::ZERO, Easing::Linear);
        transition.set_target(2.0);
        assert_eq!(transition.value(), 2.0);
        assert!(!transition.is_animating());
    }

    #[test]
    fn test_cubic_in_out_shape() {
        assert_eq!(Easing::CubicInOut.apply(0.0), 0.0);
        assert_eq!(Easing::CubicInOut.apply(0.5), 0.5);
        assert_eq!(Easing::CubicInOut.apply(1.0), 1.0);
        assert!(Easing::CubicInOut.apply(0.25) < 0.25);
    }
}
