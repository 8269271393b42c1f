//! Easing functions and animation time types.

use std::{sync::Arc, time::Duration};

use crate::units::{Factor, FactorUnits};

/// Easing function output.
///
/// Usually in the [0..=1] range, but can overshoot. An easing function converts a [`EasingTime`]
/// into this factor.
pub type EasingStep = Factor;

/// Easing function input.
///
/// An easing function converts this *time* into a [`EasingStep`] factor.
///
/// The time is always in the [0..=1] range, factors outside this range are clamped.
#[derive(Debug, PartialEq, Copy, Clone, PartialOrd)]
pub struct EasingTime(Factor);
impl EasingTime {
    /// New clamped to [0..=1].
    pub fn new(factor: Factor) -> Self {
        EasingTime(factor.clamp_range())
    }

    /// New easing time from total `duration`, `elapsed` time and `time_scale`.
    ///
    /// If `elapsed >= duration * time_scale` the time is at the end.
    pub fn elapsed(duration: Duration, elapsed: Duration, time_scale: Factor) -> Self {
        EasingTime::new((elapsed.as_secs_f32() / (duration * time_scale).as_secs_f32()).fct())
    }

    /// Time at the start of the animation.
    pub fn start() -> Self {
        EasingTime(0.fct())
    }

    /// Time at the end of the animation.
    pub fn end() -> Self {
        EasingTime(1.fct())
    }

    /// If the time represents the start of the animation.
    pub fn is_start(self) -> bool {
        self == Self::start()
    }

    /// If the time represents the end of the animation.
    pub fn is_end(self) -> bool {
        self == Self::end()
    }

    /// Get the time as a [`Factor`].
    pub fn fct(self) -> Factor {
        self.0
    }

    /// Gets the scale value.
    pub fn get(self) -> f32 {
        self.0 .0
    }

    /// Inverted time.
    pub fn reverse(self) -> Self {
        EasingTime(self.0.flip())
    }
}

/// An easing curve, mapping normalized time to normalized progress.
///
/// This is the *leaf* representation consumed by the motion engine, any function
/// in the [`easing`] module can be wrapped into it.
pub type EasingCurve = Arc<dyn Fn(EasingTime) -> EasingStep + Send + Sync>;

/// New [`EasingCurve`] from a function.
pub fn curve(f: impl Fn(EasingTime) -> EasingStep + Send + Sync + 'static) -> EasingCurve {
    Arc::new(f)
}

/// Common easing functions.
pub mod easing {
    use super::{Bezier, EasingStep, EasingTime};
    use crate::units::FactorUnits;
    use std::f32::consts::*;

    /// Simple linear transition, no easing, no acceleration.
    pub fn linear(time: EasingTime) -> EasingStep {
        time.fct()
    }

    /// Quadratic transition (t²).
    pub fn quad(time: EasingTime) -> EasingStep {
        let t = time.get();
        (t * t).fct()
    }

    /// Cubic transition (t³).
    pub fn cubic(time: EasingTime) -> EasingStep {
        let t = time.get();
        (t * t * t).fct()
    }

    /// Fourth power transition (t⁴).
    pub fn quart(time: EasingTime) -> EasingStep {
        let t = time.get();
        (t * t * t * t).fct()
    }

    /// Fifth power transition (t⁵).
    pub fn quint(time: EasingTime) -> EasingStep {
        let t = time.get();
        (t * t * t * t * t).fct()
    }

    /// Sine transition. Slow start, fast end.
    pub fn sine(time: EasingTime) -> EasingStep {
        let t = time.get();
        (1.0 - (FRAC_PI_2 * (1.0 - t)).sin()).fct()
    }

    /// Exponential transition. Very slow start, very fast end.
    pub fn expo(time: EasingTime) -> EasingStep {
        let t = time.get();
        if t == 0.0 {
            0.fct()
        } else {
            2.0_f32.powf(10.0 * (t - 1.0)).fct()
        }
    }

    /// Transition that starts slow then accelerates like a circular arc.
    pub fn circ(time: EasingTime) -> EasingStep {
        let t = time.get();
        (1.0 - (1.0 - t * t).max(0.0).sqrt()).fct()
    }

    /// Transition that goes slightly negative to start then shoots out.
    pub fn back(time: EasingTime) -> EasingStep {
        let t = time.get();
        (t * t * (2.70158 * t - 1.70158)).fct()
    }

    /// Oscillating transition that grows in magnitude, goes negative twice.
    pub fn elastic(time: EasingTime) -> EasingStep {
        let t = time.get();
        let t2 = t * t;
        (t2 * t2 * (t * PI * 4.5).sin()).fct()
    }

    /// Oscillating transition that grows in magnitude, does not go negative.
    pub fn bounce(time: EasingTime) -> EasingStep {
        let t = time.get();
        ((6.0 * (t - 1.0)).exp2() * (t * PI * 3.5).sin().abs()).fct()
    }

    /// Cubic bézier curve, defined by the two middle control points.
    ///
    /// X coordinate is time, Y coordinate is function advancement, nominal range for
    /// both is 0 to 1. The start and end points are always (0, 0) and (1, 1).
    pub fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, time: EasingTime) -> EasingStep {
        let t = time.get() as f64;
        (Bezier::new(x1, y1, x2, y2).solve(t, 0.00001) as f32).fct()
    }

    /// Always `1.fct()`, the completed transition.
    pub fn none(_: EasingTime) -> EasingStep {
        1.fct()
    }
}

/// Applies an easing function in reverse and flipped, the *ease-out* variant.
pub fn ease_out(ease_fn: impl Fn(EasingTime) -> EasingStep, time: EasingTime) -> EasingStep {
    ease_fn(time.reverse()).flip()
}

/// Applies an easing function *ease-in* for the first half then [`ease_out`] for the second half.
pub fn ease_in_out(ease_fn: impl Fn(EasingTime) -> EasingStep, time: EasingTime) -> EasingStep {
    let t = time.get() * 2.0;
    if t < 1.0 {
        (ease_fn(EasingTime::new(t.fct())).0 * 0.5).fct()
    } else {
        (ease_out(ease_fn, EasingTime::new((t - 1.0).fct())).0 * 0.5 + 0.5).fct()
    }
}

/// Common easing functions as an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EasingFn {
    /// [`easing::linear`].
    Linear,
    /// [`easing::sine`].
    Sine,
    /// [`easing::quad`].
    Quad,
    /// [`easing::cubic`].
    Cubic,
    /// [`easing::quart`].
    Quart,
    /// [`easing::quint`].
    Quint,
    /// [`easing::expo`].
    Expo,
    /// [`easing::circ`].
    Circ,
    /// [`easing::back`].
    Back,
    /// [`easing::elastic`].
    Elastic,
    /// [`easing::bounce`].
    Bounce,
}
impl EasingFn {
    /// Gets the [`easing`] function that `self` matches.
    pub fn ease_fn(self) -> fn(EasingTime) -> EasingStep {
        match self {
            EasingFn::Linear => easing::linear,
            EasingFn::Sine => easing::sine,
            EasingFn::Quad => easing::quad,
            EasingFn::Cubic => easing::cubic,
            EasingFn::Quart => easing::quart,
            EasingFn::Quint => easing::quint,
            EasingFn::Expo => easing::expo,
            EasingFn::Circ => easing::circ,
            EasingFn::Back => easing::back,
            EasingFn::Elastic => easing::elastic,
            EasingFn::Bounce => easing::bounce,
        }
    }

    /// Calls the easing function.
    pub fn ease_in(self, time: EasingTime) -> EasingStep {
        (self.ease_fn())(time)
    }

    /// Calls the easing function through [`ease_out`].
    pub fn ease_out(self, time: EasingTime) -> EasingStep {
        ease_out(self.ease_fn(), time)
    }

    /// Calls the easing function through [`ease_in_out`].
    pub fn ease_in_out(self, time: EasingTime) -> EasingStep {
        ease_in_out(self.ease_fn(), time)
    }

    /// New [`EasingCurve`] for the *ease-in* variant.
    pub fn curve_in(self) -> EasingCurve {
        curve(self.ease_fn())
    }

    /// New [`EasingCurve`] for the *ease-out* variant.
    pub fn curve_out(self) -> EasingCurve {
        let f = self.ease_fn();
        curve(move |t| ease_out(f, t))
    }

    /// New [`EasingCurve`] for the *ease-in-out* variant.
    pub fn curve_in_out(self) -> EasingCurve {
        let f = self.ease_fn();
        curve(move |t| ease_in_out(f, t))
    }
}

const NEWTON_METHOD_ITERATIONS: u8 = 8;

/// A unit cubic bézier curve, used for timing functions.
pub struct Bezier {
    ax: f64,
    bx: f64,
    cx: f64,
    ay: f64,
    by: f64,
    cy: f64,
}
impl Bezier {
    /// Create a unit cubic bézier curve from the two middle control points.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Bezier {
        let cx = 3. * x1 as f64;
        let bx = 3. * (x2 as f64 - x1 as f64) - cx;

        let cy = 3. * y1 as f64;
        let by = 3. * (y2 as f64 - y1 as f64) - cy;

        Bezier {
            ax: 1.0 - cx - bx,
            bx,
            cx,
            ay: 1.0 - cy - by,
            by,
            cy,
        }
    }

    fn sample_curve_x(&self, t: f64) -> f64 {
        ((self.ax * t + self.bx) * t + self.cx) * t
    }

    fn sample_curve_y(&self, t: f64) -> f64 {
        ((self.ay * t + self.by) * t + self.cy) * t
    }

    fn sample_curve_derivative_x(&self, t: f64) -> f64 {
        (3.0 * self.ax * t + 2.0 * self.bx) * t + self.cx
    }

    fn solve_curve_x(&self, x: f64, epsilon: f64) -> f64 {
        // fast path, Newton's method
        let mut t = x;
        for _ in 0..NEWTON_METHOD_ITERATIONS {
            let x2 = self.sample_curve_x(t);
            if approx_eq(x2, x, epsilon) {
                return t;
            }
            let dx = self.sample_curve_derivative_x(t);
            if approx_eq(dx, 0.0, 1e-6) {
                break;
            }
            t -= (x2 - x) / dx;
        }

        // slow path, bisection
        let (mut lo, mut hi, mut t) = (0.0, 1.0, x);

        if t < lo {
            return lo;
        }
        if t > hi {
            return hi;
        }

        while lo < hi {
            let x2 = self.sample_curve_x(t);
            if approx_eq(x2, x, epsilon) {
                return t;
            }
            if x > x2 {
                lo = t
            } else {
                hi = t
            }
            t = (hi - lo) / 2.0 + lo
        }

        t
    }

    /// Solve the bézier curve for a given `x` and an `epsilon`, that should be between zero and one.
    pub fn solve(&self, x: f64, epsilon: f64) -> f64 {
        self.sample_curve_y(self.solve_curve_x(x, epsilon))
    }
}

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}
