//! Ready-made motion specs for the common enter/exit patterns.
//!
//! Every function returns a configured [`MotionSpec`] that can be further adjusted
//! with the spec builder methods before running.

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::easing::EasingFn;
use crate::spec::{FillMode, MotionSpec, MotionTrack, TrackProperty, TrackValue};
use crate::units::{FactorUnits, LayoutTransform, RelativePoint};

/// Edge a [`collapse`]/[`expand`] motion works against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Collapse towards the right edge.
    Left,
    /// Collapse towards the left edge.
    Right,
    /// Collapse towards the bottom edge.
    Top,
    /// Collapse towards the top edge.
    Bottom,
}
impl Direction {
    fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    fn pivot(self) -> RelativePoint {
        match self {
            Direction::Left => RelativePoint::right_center(),
            Direction::Right => RelativePoint::left_center(),
            Direction::Top => RelativePoint::bottom_center(),
            Direction::Bottom => RelativePoint::top_center(),
        }
    }
}

fn opacity(from: f64, to: f64) -> MotionTrack {
    // scalar values always match the opacity property
    MotionTrack::transition(TrackProperty::Opacity, TrackValue::Float(from), TrackValue::Float(to)).unwrap()
}

fn transform(from: LayoutTransform, to: LayoutTransform) -> MotionTrack {
    MotionTrack::transition(
        TrackProperty::Transform,
        TrackValue::Transform(from),
        TrackValue::Transform(to),
    )
    .unwrap()
}

fn scale_x(x: f64) -> LayoutTransform {
    LayoutTransform::scale(x, 1.0)
}

fn scale_y(y: f64) -> LayoutTransform {
    LayoutTransform::scale(1.0, y)
}

fn scale_uniform(s: f64) -> LayoutTransform {
    LayoutTransform::scale(s, s)
}

/// Fade the actor in, opacity `0 → 1`.
pub fn fade_in(duration: Duration) -> MotionSpec {
    MotionSpec::new(duration, EasingFn::Linear.curve_in())
        .with_fill_mode(FillMode::Forward)
        .with_track(opacity(0.0, 1.0))
}

/// Fade the actor out, opacity `1 → 0`.
pub fn fade_out(duration: Duration) -> MotionSpec {
    MotionSpec::new(duration, EasingFn::Linear.curve_in())
        .with_fill_mode(FillMode::Forward)
        .with_track(opacity(1.0, 0.0))
}

/// Collapse the actor towards the `direction` edge, scale to zero plus fade.
pub fn collapse(direction: Direction, duration: Duration) -> MotionSpec {
    let scale = if direction.is_horizontal() {
        transform(scale_x(1.0), scale_x(0.0))
    } else {
        transform(scale_y(1.0), scale_y(0.0))
    };
    MotionSpec::new(duration, EasingFn::Cubic.curve_out())
        .with_origin(direction.pivot())
        .with_track(opacity(1.0, 0.0))
        .with_track(scale)
}

/// Expand the actor from the `direction` edge, reverse of [`collapse`].
pub fn expand(direction: Direction, duration: Duration) -> MotionSpec {
    // a true zero start scale renders nothing, start just above it
    let scale = if direction.is_horizontal() {
        transform(scale_x(0.01), scale_x(1.0))
    } else {
        transform(scale_y(0.01), scale_y(1.0))
    };
    MotionSpec::new(duration, EasingFn::Cubic.curve_in())
        .with_origin(direction.pivot())
        .with_track(opacity(0.0, 1.0))
        .with_track(scale)
}

/// Slide in growing down from the top edge.
pub fn slide_up_in(duration: Duration) -> MotionSpec {
    slide_in(scale_y(0.01), scale_y(1.0), RelativePoint::top_left(), duration)
}

/// Slide out shrinking up into the top edge.
pub fn slide_up_out(duration: Duration) -> MotionSpec {
    slide_out(scale_y(1.0), scale_y(0.0), RelativePoint::top_left(), duration)
}

/// Slide in growing up from the bottom edge.
pub fn slide_down_in(duration: Duration) -> MotionSpec {
    slide_in(scale_y(0.01), scale_y(1.0), RelativePoint::bottom_right(), duration)
}

/// Slide out shrinking down into the bottom edge.
pub fn slide_down_out(duration: Duration) -> MotionSpec {
    slide_out(scale_y(1.0), scale_y(0.8), RelativePoint::bottom_right(), duration)
}

/// Slide in growing right from the left edge.
pub fn slide_left_in(duration: Duration) -> MotionSpec {
    slide_in(scale_x(0.01), scale_x(1.0), RelativePoint::top_left(), duration)
}

/// Slide out shrinking left into the left edge.
pub fn slide_left_out(duration: Duration) -> MotionSpec {
    slide_out(scale_x(1.0), scale_x(0.8), RelativePoint::top_left(), duration)
}

/// Slide in growing left from the right edge.
pub fn slide_right_in(duration: Duration) -> MotionSpec {
    slide_in(scale_x(0.01), scale_x(1.0), RelativePoint::new(1.fct(), 0.fct()), duration)
}

/// Slide out shrinking right into the right edge.
pub fn slide_right_out(duration: Duration) -> MotionSpec {
    slide_out(scale_x(1.0), scale_x(0.8), RelativePoint::new(1.fct(), 0.fct()), duration)
}

fn slide_in(from: LayoutTransform, to: LayoutTransform, pivot: RelativePoint, duration: Duration) -> MotionSpec {
    MotionSpec::new(duration, EasingFn::Cubic.curve_out())
        .with_fill_mode(FillMode::Forward)
        .with_origin(pivot)
        .with_track(opacity(0.0, 1.0))
        .with_track(transform(from, to))
}

fn slide_out(from: LayoutTransform, to: LayoutTransform, pivot: RelativePoint, duration: Duration) -> MotionSpec {
    MotionSpec::new(duration, EasingFn::Cubic.curve_in())
        .with_fill_mode(FillMode::Forward)
        .with_origin(pivot)
        .with_track(opacity(1.0, 0.0))
        .with_track(transform(from, to))
}

/// Zoom the actor in, uniform scale `0.2 → 1` plus fade, centered.
pub fn zoom_in(duration: Duration) -> MotionSpec {
    MotionSpec::new(duration, EasingFn::Circ.curve_out())
        .with_fill_mode(FillMode::Forward)
        .with_origin(RelativePoint::center())
        .with_track(opacity(0.0, 1.0))
        .with_track(transform(scale_uniform(0.2), scale_uniform(1.0)))
}

/// Zoom the actor out, uniform scale `1 → 0.2` plus fade, centered.
pub fn zoom_out(duration: Duration) -> MotionSpec {
    MotionSpec::new(duration, EasingFn::Circ.curve_out())
        .with_fill_mode(FillMode::Forward)
        .with_origin(RelativePoint::center())
        .with_track(opacity(1.0, 0.0))
        .with_track(transform(scale_uniform(1.0), scale_uniform(0.2)))
}

/// Direction and axis of a move motion, the offset magnitude is the actor size.
#[derive(Clone, Copy)]
struct MoveOffset {
    sign: f64,
    vertical: bool,
}
impl MoveOffset {
    fn resolve(self, size: crate::units::LayoutSize) -> LayoutTransform {
        if self.vertical {
            LayoutTransform::translation(0.0, self.sign * size.height)
        } else {
            LayoutTransform::translation(self.sign * size.width, 0.0)
        }
    }
}
const MOVE_UP: MoveOffset = MoveOffset { sign: -1.0, vertical: true };
const MOVE_DOWN: MoveOffset = MoveOffset { sign: 1.0, vertical: true };
const MOVE_LEFT: MoveOffset = MoveOffset { sign: -1.0, vertical: false };
const MOVE_RIGHT: MoveOffset = MoveOffset { sign: 1.0, vertical: false };

/// Move in from above, ends at rest plus fade.
pub fn move_up_in(duration: Duration) -> MotionSpec {
    move_in(MOVE_UP, duration)
}

/// Move out upwards plus fade.
pub fn move_up_out(duration: Duration) -> MotionSpec {
    move_out(MOVE_UP, duration)
}

/// Move in from below, ends at rest plus fade.
pub fn move_down_in(duration: Duration) -> MotionSpec {
    move_in(MOVE_DOWN, duration)
}

/// Move out downwards plus fade.
pub fn move_down_out(duration: Duration) -> MotionSpec {
    move_out(MOVE_DOWN, duration)
}

/// Move in from the left, ends at rest plus fade.
pub fn move_left_in(duration: Duration) -> MotionSpec {
    move_in(MOVE_LEFT, duration)
}

/// Move out to the left plus fade.
pub fn move_left_out(duration: Duration) -> MotionSpec {
    move_out(MOVE_LEFT, duration)
}

/// Move in from the right, ends at rest plus fade.
pub fn move_right_in(duration: Duration) -> MotionSpec {
    move_in(MOVE_RIGHT, duration)
}

/// Move out to the right plus fade.
pub fn move_right_out(duration: Duration) -> MotionSpec {
    move_out(MOVE_RIGHT, duration)
}

fn move_in(offset: MoveOffset, duration: Duration) -> MotionSpec {
    // the start offset depends on the actor size, resolved just before playback
    MotionSpec::new(duration, EasingFn::Quint.curve_out())
        .with_track(opacity(0.0, 1.0))
        .with_track(transform(LayoutTransform::identity(), LayoutTransform::identity()))
        .with_on_pre_build_track(Arc::new(move |track, snapshot| {
            if track.property() == TrackProperty::Transform {
                track.set_start_value(TrackValue::Transform(offset.resolve(snapshot.desired_size)));
            }
        }))
}

fn move_out(offset: MoveOffset, duration: Duration) -> MotionSpec {
    MotionSpec::new(duration, EasingFn::Quint.curve_in())
        .with_track(opacity(1.0, 0.0))
        .with_track(transform(LayoutTransform::identity(), LayoutTransform::identity()))
        .with_on_pre_build_track(Arc::new(move |track, snapshot| {
            if track.property() == TrackProperty::Transform {
                track.set_end_value(TrackValue::Transform(offset.resolve(snapshot.desired_size)));
            }
        }))
}
