//! Layout units and factors.

use std::{fmt, ops, time::Duration};

use serde::{Deserialize, Serialize};

/// Epsilon used for [`Factor`] equality.
pub const EPSILON: f32 = 0.00001;

/// Epsilon used for percentage factor equality.
pub const EPSILON_100: f32 = 0.001;

/// Tolerance for comparing the linear components of layout transforms.
///
/// Matrix changes below this delta do not invalidate layout.
pub const TRANSFORM_EPSILON: f64 = 1.0e-4;

/// [`f32`] equality within `epsilon`.
pub fn about_eq(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() <= epsilon
}

/// [`f64`] equality within `epsilon`.
pub fn about_eq_64(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() <= epsilon
}

/// Unit of the layout coordinate space actors are measured and arranged in.
pub struct Layout;

/// Point in the layout space.
pub type LayoutPoint = euclid::Point2D<f64, Layout>;

/// Size in the layout space.
pub type LayoutSize = euclid::Size2D<f64, Layout>;

/// Rectangle in the layout space.
pub type LayoutRect = euclid::Rect<f64, Layout>;

/// Vector in the layout space.
pub type LayoutVector = euclid::Vector2D<f64, Layout>;

/// 2-D affine transform in the layout space.
///
/// The linear components are `m11, m12, m21, m22`, the translation is `m31, m32`.
pub type LayoutTransform = euclid::Transform2D<f64, Layout, Layout>;

/// Multiplication factor in percentage (0%-100%).
///
/// See [`FactorUnits`] for more details.
///
/// # Equality
///
/// Equality is determined using [`about_eq`] with `0.001` epsilon.
#[derive(Copy, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactorPercent(pub f32);
impl FactorPercent {
    /// Clamp factor to [0.0..=100.0] range.
    pub fn clamp_range(self) -> Self {
        FactorPercent(self.0.clamp(0.0, 100.0))
    }

    /// Convert to [`Factor`].
    pub fn fct(self) -> Factor {
        self.into()
    }
}
impl PartialEq for FactorPercent {
    fn eq(&self, other: &Self) -> bool {
        about_eq(self.0, other.0, EPSILON_100)
    }
}
impl ops::Neg for FactorPercent {
    type Output = Self;

    fn neg(self) -> Self {
        FactorPercent(-self.0)
    }
}
impl From<Factor> for FactorPercent {
    fn from(f: Factor) -> Self {
        FactorPercent(f.0 * 100.0)
    }
}
impl fmt::Debug for FactorPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.debug_tuple("FactorPercent").field(&self.0).finish()
        } else {
            write!(f, "{}.pct()", self.0)
        }
    }
}
impl fmt::Display for FactorPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Normalized multiplication factor.
///
/// Values of this type are generally in between `0.0` and `1.0` to indicate a fraction
/// of a unit, but are not clamped to this range, `Factor(2.0)` is a valid value and so
/// are negative values.
///
/// Use the *suffix method* `1.0.fct()` to init a factor, see [`FactorUnits`].
///
/// # Equality
///
/// Equality is determined using [`about_eq`] with `0.00001` epsilon.
#[derive(Copy, Clone, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Factor(pub f32);
impl Factor {
    /// Clamp factor to `[0.0..=1.0]` range.
    pub fn clamp_range(self) -> Self {
        Factor(self.0.clamp(0.0, 1.0))
    }

    /// Returns the maximum of two factors.
    pub fn max(self, other: impl Into<Factor>) -> Factor {
        Factor(self.0.max(other.into().0))
    }

    /// Returns the minimum of two factors.
    pub fn min(self, other: impl Into<Factor>) -> Factor {
        Factor(self.0.min(other.into().0))
    }

    /// Computes the absolute value of self.
    pub fn abs(self) -> Factor {
        Factor(self.0.abs())
    }

    /// Returns `1.fct() - self`.
    pub fn flip(self) -> Factor {
        Factor(1.0 - self.0)
    }

    /// Convert to [`FactorPercent`].
    pub fn pct(self) -> FactorPercent {
        self.into()
    }
}
impl PartialEq for Factor {
    fn eq(&self, other: &Self) -> bool {
        about_eq(self.0, other.0, EPSILON)
    }
}
impl From<FactorPercent> for Factor {
    fn from(p: FactorPercent) -> Self {
        Factor(p.0 / 100.0)
    }
}
impl ops::Add for Factor {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Factor(self.0 + rhs.0)
    }
}
impl ops::AddAssign for Factor {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}
impl ops::Sub for Factor {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Factor(self.0 - rhs.0)
    }
}
impl ops::SubAssign for Factor {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}
impl ops::Mul for Factor {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Factor(self.0 * rhs.0)
    }
}
impl ops::Div for Factor {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Factor(self.0 / rhs.0)
    }
}
impl ops::Neg for Factor {
    type Output = Self;

    fn neg(self) -> Self {
        Factor(-self.0)
    }
}
impl ops::Mul<Factor> for f32 {
    type Output = f32;

    fn mul(self, rhs: Factor) -> f32 {
        self * rhs.0
    }
}
impl ops::Mul<Factor> for f64 {
    type Output = f64;

    fn mul(self, rhs: Factor) -> f64 {
        self * rhs.0 as f64
    }
}
impl ops::Mul<Factor> for Duration {
    type Output = Duration;

    fn mul(self, rhs: Factor) -> Duration {
        self.mul_f32(rhs.0.max(0.0))
    }
}
impl ops::Mul<Factor> for LayoutSize {
    type Output = LayoutSize;

    fn mul(self, rhs: Factor) -> LayoutSize {
        LayoutSize::new(self.width * rhs, self.height * rhs)
    }
}
impl ops::Mul<Factor> for LayoutPoint {
    type Output = LayoutPoint;

    fn mul(self, rhs: Factor) -> LayoutPoint {
        LayoutPoint::new(self.x * rhs, self.y * rhs)
    }
}
impl ops::Mul<Factor> for LayoutVector {
    type Output = LayoutVector;

    fn mul(self, rhs: Factor) -> LayoutVector {
        LayoutVector::new(self.x * rhs, self.y * rhs)
    }
}
impl fmt::Debug for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.debug_tuple("Factor").field(&self.0).finish()
        } else {
            write!(f, "{}.fct()", self.0)
        }
    }
}
impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extension methods for initializing factor units.
///
/// This trait is implemented for [`f32`] and [`u32`] allowing initialization of factors with the suffix syntax.
///
/// # Examples
///
/// ```
/// # use motiva::units::*;
/// let opaque = 1.fct();
/// let half = 50.pct();
/// ```
pub trait FactorUnits {
    /// Normalized factor.
    fn fct(self) -> Factor;

    /// Percentage factor.
    fn pct(self) -> FactorPercent;
}
impl FactorUnits for f32 {
    fn fct(self) -> Factor {
        Factor(self)
    }

    fn pct(self) -> FactorPercent {
        FactorPercent(self)
    }
}
impl FactorUnits for u32 {
    fn fct(self) -> Factor {
        Factor(self as f32)
    }

    fn pct(self) -> FactorPercent {
        FactorPercent(self as f32)
    }
}
impl FactorUnits for i32 {
    fn fct(self) -> Factor {
        Factor(self as f32)
    }

    fn pct(self) -> FactorPercent {
        FactorPercent(self as f32)
    }
}

/// A point relative to a box size, used as the render-transform origin of motions.
///
/// The final point is `(size.width * x, size.height * y)`.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct RelativePoint {
    /// Fraction of the box width.
    pub x: Factor,
    /// Fraction of the box height.
    pub y: Factor,
}
impl RelativePoint {
    /// New from two factors.
    pub fn new(x: impl Into<Factor>, y: impl Into<Factor>) -> Self {
        RelativePoint { x: x.into(), y: y.into() }
    }

    /// Point at the top-left corner.
    pub fn top_left() -> Self {
        Self::new(0.fct(), 0.fct())
    }

    /// Point at the center.
    pub fn center() -> Self {
        Self::new(0.5.fct(), 0.5.fct())
    }

    /// Point at the bottom-right corner.
    pub fn bottom_right() -> Self {
        Self::new(1.fct(), 1.fct())
    }

    /// Point at the center of the top edge.
    pub fn top_center() -> Self {
        Self::new(0.5.fct(), 0.fct())
    }

    /// Point at the center of the bottom edge.
    pub fn bottom_center() -> Self {
        Self::new(0.5.fct(), 1.fct())
    }

    /// Point at the center of the left edge.
    pub fn left_center() -> Self {
        Self::new(0.fct(), 0.5.fct())
    }

    /// Point at the center of the right edge.
    pub fn right_center() -> Self {
        Self::new(1.fct(), 0.5.fct())
    }

    /// Resolves the point for a box of `size`.
    pub fn layout(self, size: LayoutSize) -> LayoutPoint {
        LayoutPoint::new(size.width * self.x, size.height * self.y)
    }
}
impl Default for RelativePoint {
    /// Top-left.
    fn default() -> Self {
        Self::top_left()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_eq_epsilon() {
        assert_eq!(0.5.fct(), Factor(0.5 + EPSILON / 2.0));
        assert_ne!(0.5.fct(), Factor(0.5 + EPSILON * 2.0));
    }

    #[test]
    fn percent_to_factor() {
        assert_eq!(50.pct().fct(), 0.5.fct());
        assert_eq!(Factor::from(FactorPercent(100.0)), 1.fct());
    }

    #[test]
    fn relative_point_layout() {
        let size = LayoutSize::new(200.0, 100.0);
        assert_eq!(RelativePoint::center().layout(size), LayoutPoint::new(100.0, 50.0));
        assert_eq!(RelativePoint::bottom_center().layout(size), LayoutPoint::new(100.0, 100.0));
    }
}
