//! Value transitions and keyframe sequences.

use std::{error::Error, fmt, ops};

use crate::easing::EasingStep;
use crate::units::Factor;

/// A type that can be animated by a transition.
///
/// # Trait Alias
///
/// This trait is used like a type alias for traits and is already implemented
/// for all types it applies to. To be transitionable a type must add and subtract
/// to itself and be multipliable by [`Factor`].
pub trait Transitionable:
    Clone + ops::Add<Self, Output = Self> + ops::Sub<Self, Output = Self> + ops::Mul<Factor, Output = Self>
{
}
impl<T> Transitionable for T where
    T: Clone + ops::Add<T, Output = T> + ops::Sub<T, Output = T> + ops::Mul<Factor, Output = T>
{
}

/// Represents a transition from one value to another that can be sampled using [`EasingStep`].
#[derive(Clone, Debug)]
pub struct Transition<T> {
    /// Value sampled at the `0.fct()` step.
    pub start: T,
    /// Value that added to `start` is sampled at the `1.fct()` step.
    pub increment: T,
}
impl<T> Transition<T>
where
    T: Transitionable,
{
    /// New transition.
    pub fn new(from: T, to: T) -> Self {
        let increment = to - from.clone();
        Transition { start: from, increment }
    }

    /// Compute the transition value at the `step`.
    pub fn sample(&self, step: EasingStep) -> T {
        self.start.clone() + self.increment.clone() * step
    }
}

/// Error constructing a keyframe sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyframeError {
    /// The keyframe sequence is empty.
    Empty,
    /// A cue is smaller than the previous cue, sequences must be monotonically non-decreasing.
    ///
    /// The index of the backtracking keyframe is included.
    CueOrder(usize),
}
impl fmt::Display for KeyframeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyframeError::Empty => write!(f, "keyframe sequence cannot be empty"),
            KeyframeError::CueOrder(i) => write!(f, "keyframe cue at index {i} is smaller than the previous cue"),
        }
    }
}
impl Error for KeyframeError {}

/// Represents a transition across multiple keyed values that can be sampled using [`EasingStep`].
///
/// Values between two keys interpolate linearly, the easing curve applies to the
/// full sequence time.
#[derive(Clone, Debug)]
pub struct TransitionKeyed<T> {
    keys: Vec<(Factor, T)>,
}
impl<T> TransitionKeyed<T>
where
    T: Transitionable,
{
    /// New transition.
    ///
    /// Cues must be monotonically non-decreasing, backtracking cues are a configuration
    /// error, not silently corrected.
    pub fn new(keys: Vec<(Factor, T)>) -> Result<Self, KeyframeError> {
        if keys.is_empty() {
            return Err(KeyframeError::Empty);
        }
        for i in 1..keys.len() {
            if keys[i].0 < keys[i - 1].0 {
                return Err(KeyframeError::CueOrder(i));
            }
        }
        Ok(TransitionKeyed { keys })
    }

    /// Keyed values.
    pub fn keys(&self) -> &[(Factor, T)] {
        &self.keys
    }

    /// Compute the transition value at the `step`.
    pub fn sample(&self, step: EasingStep) -> T {
        if let Some(i) = self.keys.iter().position(|(f, _)| *f > step) {
            if i == 0 {
                // step before first
                self.keys[0].1.clone()
            } else {
                let (from_step, from_value) = self.keys[i - 1].clone();
                if from_step == step {
                    // step exact key
                    from_value
                } else {
                    // linear interpolate between steps
                    let (to_step, to_value) = self.keys[i].clone();
                    let step = (step - from_step) / (to_step - from_step);

                    from_value.clone() + (to_value - from_value) * step
                }
            }
        } else {
            // step is after last
            self.keys[self.keys.len() - 1].1.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::FactorUnits;

    #[test]
    fn transition_sample() {
        let t = Transition::new(120.0f64, 0.0);
        assert_eq!(t.sample(0.fct()), 120.0);
        assert_eq!(t.sample(0.5.fct()), 60.0);
        assert_eq!(t.sample(1.fct()), 0.0);
    }

    #[test]
    fn transition_overshoot() {
        // the step factor is f32, the sample is only as precise
        let t = Transition::new(0.0f64, 10.0);
        let s = t.sample(1.2.fct());
        assert!((s - 12.0).abs() < 1e-4, "overshoot sample {s}");
    }

    #[test]
    fn keyed_empty_is_error() {
        assert!(matches!(TransitionKeyed::<f64>::new(vec![]), Err(KeyframeError::Empty)));
    }

    #[test]
    fn keyed_backtracking_cue_is_error() {
        let r = TransitionKeyed::new(vec![(0.fct(), 0.0f64), (0.8.fct(), 1.0), (0.5.fct(), 2.0)]);
        assert!(matches!(r, Err(KeyframeError::CueOrder(2))));
    }

    #[test]
    fn keyed_sample_interpolates() {
        let t = TransitionKeyed::new(vec![(0.fct(), 0.0f64), (0.5.fct(), 10.0), (1.fct(), 0.0)]).unwrap();
        assert_eq!(t.sample(0.fct()), 0.0);
        assert_eq!(t.sample(0.25.fct()), 5.0);
        assert_eq!(t.sample(0.5.fct()), 10.0);
        assert_eq!(t.sample(0.75.fct()), 5.0);
        assert_eq!(t.sample(1.fct()), 0.0);
    }

    #[test]
    fn keyed_sample_clamps_outside_range() {
        let t = TransitionKeyed::new(vec![(0.2.fct(), 1.0f64), (0.8.fct(), 2.0)]).unwrap();
        assert_eq!(t.sample(0.fct()), 1.0);
        assert_eq!(t.sample(1.fct()), 2.0);
    }
}
