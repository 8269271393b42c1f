//! Largest pre-transform box solver.
//!
//! Given an available box and the linear components of a 2-D affine transform, computes
//! the largest-area box whose transformed bounding box still fits the available space.
//! Used by [`TransformLayoutHost`] to measure and arrange content under a live transform.
//!
//! [`TransformLayoutHost`]: crate::actor::TransformLayoutHost

use crate::units::{LayoutRect, LayoutSize, LayoutTransform};

/// Determinant below this is treated as a singular (non-invertible) transform.
const SINGULAR_EPSILON: f64 = 1.0e-12;

/// Compute the largest usable size (greatest area) that still fits `available` after
/// applying the linear components of `transform`.
///
/// The translation components are ignored, translation does not change the needed
/// pre-image size. Degenerate inputs produce well-defined degenerate results, this
/// function never errors:
///
/// * A zero available width or height is returned as-is.
/// * A fully unconstrained box returns an infinite size.
/// * A singular transform returns a zero size, nothing fits a crushed space.
pub fn largest_fitting_size(available: LayoutSize, transform: &LayoutTransform) -> LayoutSize {
    let mut bounds = available;

    // constrain infinite axes to the finite one, the flags keep the original intent
    let infinite_width = bounds.width.is_infinite();
    if infinite_width {
        bounds.width = bounds.height;
    }
    let infinite_height = bounds.height.is_infinite();
    if infinite_height {
        bounds.height = bounds.width;
    }

    let a = transform.m11;
    let b = transform.m12;
    let c = transform.m21;
    let d = transform.m22;

    // max transformed width/height from each available bound, these define two
    // constraint lines in the positive (w, h) quadrant
    let max_width_from_width = (bounds.width / a).abs();
    let max_height_from_width = (bounds.width / c).abs();
    let max_width_from_height = (bounds.height / b).abs();
    let max_height_from_height = (bounds.height / d).abs();

    // the point on each constraint line that maximizes area is its midpoint,
    // at most one of the two midpoints satisfies both constraints
    let ideal_width_from_width = max_width_from_width / 2.0;
    let ideal_height_from_width = max_height_from_width / 2.0;
    let ideal_width_from_height = max_width_from_height / 2.0;
    let ideal_height_from_height = max_height_from_height / 2.0;

    let slope_from_width = -(max_height_from_width / max_width_from_width);
    let slope_from_height = -(max_height_from_height / max_width_from_height);

    if bounds.width == 0.0 || bounds.height == 0.0 {
        // empty bounds pass through
        LayoutSize::new(bounds.width, bounds.height)
    } else if infinite_width && infinite_height {
        // completely unconstrained
        LayoutSize::new(f64::INFINITY, f64::INFINITY)
    } else if (a * d - b * c).abs() < SINGULAR_EPSILON {
        // singular transform, nothing fits
        LayoutSize::zero()
    } else if b == 0.0 || c == 0.0 {
        // 0/180 degree cases, constraints fully or partially decouple
        let max_height = if infinite_height { f64::INFINITY } else { max_height_from_height };
        let max_width = if infinite_width { f64::INFINITY } else { max_width_from_width };
        if b == 0.0 && c == 0.0 {
            LayoutSize::new(max_width, max_height)
        } else if b == 0.0 {
            let height = ideal_height_from_width.min(max_height);
            LayoutSize::new(max_width - (c * height / a).abs(), height)
        } else {
            let width = ideal_width_from_height.min(max_width);
            LayoutSize::new(width, max_height - (b * width / d).abs())
        }
    } else if a == 0.0 || d == 0.0 {
        // 90/270 degree cases, same as above with the axes swapped
        let max_width = if infinite_height { f64::INFINITY } else { max_width_from_height };
        let max_height = if infinite_width { f64::INFINITY } else { max_height_from_width };
        if a == 0.0 && d == 0.0 {
            LayoutSize::new(max_width, max_height)
        } else if a == 0.0 {
            let height = ideal_height_from_height.min(max_height);
            LayoutSize::new(max_width - (d * height / b).abs(), height)
        } else {
            let width = ideal_width_from_width.min(max_width);
            LayoutSize::new(width, max_height - (a * width / c).abs())
        }
    } else if ideal_height_from_width <= slope_from_height * ideal_width_from_width + max_height_from_height {
        // width-line midpoint is below the height constraint line
        LayoutSize::new(ideal_width_from_width, ideal_height_from_width)
    } else if ideal_height_from_height <= slope_from_width * ideal_width_from_height + max_height_from_width {
        // height-line midpoint is below the width constraint line
        LayoutSize::new(ideal_width_from_height, ideal_height_from_height)
    } else {
        // neither midpoint is viable, use the intersection of the two constraint lines
        let width = (max_height_from_height - max_height_from_width) / (slope_from_width - slope_from_height);
        LayoutSize::new(width, slope_from_width * width + max_height_from_width)
    }
}

/// Bounding box of `rect` transformed by `transform`.
pub fn transformed_bounds(rect: LayoutRect, transform: &LayoutTransform) -> LayoutRect {
    transform.outer_transformed_rect(&rect)
}

/// Bounding box size of a `(0, 0, size)` rect transformed by `transform`.
pub fn transformed_bounds_size(size: LayoutSize, transform: &LayoutTransform) -> LayoutSize {
    transformed_bounds(LayoutRect::from_size(size), transform).size
}
