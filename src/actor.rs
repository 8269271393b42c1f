//! Transform-aware layout host for animated content.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::orchestrator::CancelToken;
use crate::solver;
use crate::spec::{TrackProperty, TrackValue};
use crate::units::{about_eq_64, LayoutPoint, LayoutRect, LayoutSize, LayoutTransform, RelativePoint, TRANSFORM_EPSILON};

/// Number of decimals the motion transform is rounded to before layout.
///
/// Rounding suppresses floating-point jitter that would otherwise invalidate
/// layout on every animation frame.
const DECIMALS_AFTER_ROUND: i32 = 4;

/// Layout contract implemented by the hosted content.
///
/// This is the standard measure/arrange protocol of the surrounding widget framework,
/// the motion engine only drives it, it does not define it.
pub trait UiElement {
    /// Measure the element for the `available` space, returns the desired size.
    fn measure(&mut self, available: LayoutSize) -> LayoutSize;

    /// Arrange the element inside `final_rect`.
    fn arrange(&mut self, final_rect: LayoutRect);

    /// Last desired size returned by [`measure`], zero if never measured.
    ///
    /// [`measure`]: UiElement::measure
    fn desired_size(&self) -> LayoutSize;
}

/// Shared handle to a [`TransformLayoutHost`].
pub type SharedActor = Arc<Mutex<TransformLayoutHost>>;

/// Read-only view of an actor's current state, handed to spec hooks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorSnapshot {
    /// Actor desired size from the last measure pass.
    pub desired_size: LayoutSize,
    /// Actor position in screen coordinates.
    pub position: LayoutPoint,
    /// Current opacity.
    pub opacity: f64,
}

/// Mutable transform state of one actor, owned exclusively by its [`TransformLayoutHost`].
#[derive(Debug, Clone, Copy)]
pub struct TransformState {
    /// Transform as set by track evaluation.
    pub transform: LayoutTransform,
    /// Transform with the linear components rounded, used for layout.
    pub rounded: LayoutTransform,
    /// If a motion is currently animating this actor.
    pub is_animating: bool,
}

/// Hosts one child element, applies the live motion transform during rendering and
/// answers measure/arrange for the transformed content.
///
/// In *layout* mode (the default) scale is realized by the layout pass itself, the
/// render transform is filtered down to shear/rotation/translation. When
/// `use_render_transform` is set the full transform is applied at render time only
/// and layout is untouched.
pub struct TransformLayoutHost {
    child: Box<dyn UiElement>,

    state: TransformState,
    use_render_transform: bool,
    render_transform_origin: RelativePoint,

    opacity: f64,
    width_override: Option<f64>,
    height_override: Option<f64>,
    visible: bool,
    position: LayoutPoint,

    desired_size: LayoutSize,
    needs_measure: bool,

    active_motion: Option<CancelToken>,
}
impl TransformLayoutHost {
    /// New host wrapping `child`, identity transform, fully opaque, visible.
    pub fn new(child: Box<dyn UiElement>) -> Self {
        TransformLayoutHost {
            child,
            state: TransformState {
                transform: LayoutTransform::identity(),
                rounded: LayoutTransform::identity(),
                is_animating: false,
            },
            use_render_transform: false,
            render_transform_origin: RelativePoint::top_left(),
            opacity: 1.0,
            width_override: None,
            height_override: None,
            visible: true,
            position: LayoutPoint::zero(),
            desired_size: LayoutSize::zero(),
            needs_measure: false,
            active_motion: None,
        }
    }

    /// New host wrapped in the shared handle the orchestrator operates on.
    pub fn new_shared(child: Box<dyn UiElement>) -> SharedActor {
        Arc::new(Mutex::new(Self::new(child)))
    }

    /// Current transform state.
    pub fn transform_state(&self) -> &TransformState {
        &self.state
    }

    /// Set the motion transform.
    ///
    /// The linear components are rounded before layout, a rounded change greater than
    /// the layout tolerance in any linear component invalidates measurement.
    /// Translation-only changes never invalidate.
    pub fn set_transform(&mut self, transform: LayoutTransform) {
        let rounded = round_transform(transform);
        if !linear_about_eq(&rounded, &self.state.rounded) {
            self.needs_measure = true;
        }
        self.state.transform = transform;
        self.state.rounded = rounded;
    }

    /// If the full transform is applied at render time instead of through layout.
    pub fn use_render_transform(&self) -> bool {
        self.use_render_transform
    }

    /// Set the transform application mode.
    pub fn set_use_render_transform(&mut self, enabled: bool) {
        if self.use_render_transform != enabled {
            self.use_render_transform = enabled;
            self.needs_measure = true;
        }
    }

    /// The transform that must be applied when rendering the child.
    ///
    /// In layout mode the scale components are filtered out, layout already realized
    /// them, the pivot defined by the render-transform origin is applied here.
    pub fn render_transform(&self) -> LayoutTransform {
        let m = if self.use_render_transform {
            self.state.rounded
        } else {
            filter_scale(self.state.rounded)
        };
        let pivot = self.render_transform_origin.layout(self.desired_size);
        if pivot == LayoutPoint::zero() {
            m
        } else {
            LayoutTransform::translation(-pivot.x, -pivot.y)
                .then(&m)
                .then_translate(euclid::vec2(pivot.x, pivot.y))
        }
    }

    /// Pivot for transform tracks.
    pub fn render_transform_origin(&self) -> RelativePoint {
        self.render_transform_origin
    }

    /// Set the pivot for transform tracks.
    pub fn set_render_transform_origin(&mut self, origin: RelativePoint) {
        self.render_transform_origin = origin;
    }

    /// Current opacity, `0.0..=1.0`.
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Actor visibility. Scene motions keep the actor invisible until the overlay
    /// surface is confirmed on-screen.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Set actor visibility.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Actor position in screen coordinates, set by the embedder.
    pub fn position(&self) -> LayoutPoint {
        self.position
    }

    /// Set the actor screen position.
    pub fn set_position(&mut self, position: LayoutPoint) {
        self.position = position;
    }

    /// Desired size reported by the last measure pass.
    pub fn desired_size(&self) -> LayoutSize {
        self.desired_size
    }

    /// Snapshot handed to spec hooks.
    pub fn snapshot(&self) -> ActorSnapshot {
        ActorSnapshot {
            desired_size: self.desired_size,
            position: self.position,
            opacity: self.opacity,
        }
    }

    /// Apply a track-evaluated value to the animated property.
    pub fn apply_track(&mut self, property: TrackProperty, value: TrackValue) {
        match (property, value) {
            (TrackProperty::Opacity, TrackValue::Float(o)) => self.opacity = o.clamp(0.0, 1.0),
            (TrackProperty::Width, TrackValue::Float(w)) => {
                self.width_override = Some(w.max(0.0));
                self.needs_measure = true;
            }
            (TrackProperty::Height, TrackValue::Float(h)) => {
                self.height_override = Some(h.max(0.0));
                self.needs_measure = true;
            }
            (TrackProperty::Transform, TrackValue::Transform(t)) => self.set_transform(t),
            (p, v) => tracing::error!("cannot apply {v:?} to `{p}` track"),
        }
    }

    /// Read the current value of an animated property, used to snapshot fill state.
    pub fn track_value(&self, property: TrackProperty) -> TrackValue {
        match property {
            TrackProperty::Opacity => TrackValue::Float(self.opacity),
            TrackProperty::Width => TrackValue::Float(self.width_override.unwrap_or(self.desired_size.width)),
            TrackProperty::Height => TrackValue::Float(self.height_override.unwrap_or(self.desired_size.height)),
            TrackProperty::Transform => TrackValue::Transform(self.state.transform),
        }
    }

    /// Restore a property to a previously snapshotted value, clearing size overrides
    /// that were not set before the motion.
    pub fn restore_track(&mut self, property: TrackProperty, value: TrackValue, had_override: bool) {
        match property {
            TrackProperty::Width if !had_override => {
                self.width_override = None;
                self.needs_measure = true;
            }
            TrackProperty::Height if !had_override => {
                self.height_override = None;
                self.needs_measure = true;
            }
            _ => self.apply_track(property, value),
        }
    }

    /// If a size override is active for `property`.
    pub fn has_override(&self, property: TrackProperty) -> bool {
        match property {
            TrackProperty::Width => self.width_override.is_some(),
            TrackProperty::Height => self.height_override.is_some(),
            _ => false,
        }
    }

    /// Measure the host for the `available` space.
    ///
    /// Without an active layout transform this delegates to normal single-child
    /// measurement, otherwise the child is measured inside the largest box that still
    /// fits `available` after the transform and the host reports the transformed
    /// bounding box of the child's desired size.
    pub fn measure(&mut self, available: LayoutSize) -> LayoutSize {
        if self.is_identity_layout() {
            let desired = self.child.measure(available);
            self.desired_size = self.apply_overrides(desired);
            self.needs_measure = false;
            return self.desired_size;
        }

        let measure_size = solver::largest_fitting_size(available, &self.state.rounded);

        // suppress re-measure of the subtree during animation to avoid layout thrash
        if self.child.desired_size() == LayoutSize::zero() || !self.state.is_animating {
            self.child.measure(measure_size);
        }

        let transformed = solver::transformed_bounds_size(self.child.desired_size(), &self.state.rounded);
        self.desired_size = self.apply_overrides(transformed);
        self.needs_measure = false;
        self.desired_size
    }

    /// Arrange the host inside `final_rect`.
    ///
    /// The child is arranged so the transformed content is centered in the final size.
    pub fn arrange(&mut self, final_rect: LayoutRect) {
        self.position = final_rect.origin;
        let final_size = final_rect.size;

        if self.is_identity_layout() {
            let size = self.apply_overrides(final_size);
            self.child.arrange(LayoutRect::from_size(size));
            return;
        }

        let mut fit = solver::largest_fitting_size(final_size, &self.state.rounded);
        if is_size_smaller(fit, self.child.desired_size()) {
            // some content does not tolerate less space than it asked for
            fit = self.child.desired_size();
        }

        let bounds = solver::transformed_bounds(LayoutRect::from_size(fit), &self.state.rounded);
        let child_rect = LayoutRect::new(
            LayoutPoint::new(
                -bounds.origin.x + (final_size.width - bounds.size.width) / 2.0,
                -bounds.origin.y + (final_size.height - bounds.size.height) / 2.0,
            ),
            fit,
        );
        self.child.arrange(child_rect);
    }

    /// If measurement was invalidated since the last measure pass, clears the flag.
    ///
    /// The embedder polls this to schedule re-layout.
    pub fn take_needs_measure(&mut self) -> bool {
        std::mem::take(&mut self.needs_measure)
    }

    /// Called by the orchestrator strictly before any animated property mutation.
    pub fn notify_motion_pre_start(&mut self) {
        self.state.is_animating = true;
    }

    /// Called by the orchestrator after the last track value is committed.
    pub fn notify_motion_completed(&mut self) {
        self.state.is_animating = false;
        self.needs_measure = true;
    }

    pub(crate) fn replace_active_motion(&mut self, token: Option<CancelToken>) -> Option<CancelToken> {
        std::mem::replace(&mut self.active_motion, token)
    }

    pub(crate) fn is_active_motion(&self, token: &CancelToken) -> bool {
        self.active_motion.as_ref().is_some_and(|t| t.same(token))
    }

    pub(crate) fn clear_active_motion(&mut self, token: &CancelToken) {
        if let Some(active) = &self.active_motion {
            if active.same(token) {
                self.active_motion = None;
            }
        }
    }

    fn is_identity_layout(&self) -> bool {
        self.use_render_transform || linear_about_eq(&self.state.rounded, &LayoutTransform::identity())
    }

    fn apply_overrides(&self, mut size: LayoutSize) -> LayoutSize {
        if let Some(w) = self.width_override {
            size.width = w;
        }
        if let Some(h) = self.height_override {
            size.height = h;
        }
        size
    }
}

/// Rounds the linear components of `transform` to [`DECIMALS_AFTER_ROUND`] decimals.
///
/// The translation components are not rounded, they do not affect layout.
fn round_transform(t: LayoutTransform) -> LayoutTransform {
    let f = 10f64.powi(DECIMALS_AFTER_ROUND);
    let round = |v: f64| (v * f).round() / f;
    LayoutTransform::new(round(t.m11), round(t.m12), round(t.m21), round(t.m22), t.m31, t.m32)
}

/// Forces the scale components to 1, keeping shear and translation.
///
/// Used in layout mode, scale is already realized by measure/arrange.
fn filter_scale(t: LayoutTransform) -> LayoutTransform {
    LayoutTransform::new(1.0, t.m12, t.m21, 1.0, t.m31, t.m32)
}

fn linear_about_eq(a: &LayoutTransform, b: &LayoutTransform) -> bool {
    about_eq_64(a.m11, b.m11, TRANSFORM_EPSILON)
        && about_eq_64(a.m12, b.m12, TRANSFORM_EPSILON)
        && about_eq_64(a.m21, b.m21, TRANSFORM_EPSILON)
        && about_eq_64(a.m22, b.m22, TRANSFORM_EPSILON)
}

fn is_size_smaller(a: LayoutSize, b: LayoutSize) -> bool {
    a.width + TRANSFORM_EPSILON < b.width || a.height + TRANSFORM_EPSILON < b.height
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedChild {
        desired: LayoutSize,
        measured: Option<LayoutSize>,
        arranged: Arc<Mutex<Option<LayoutRect>>>,
    }
    impl FixedChild {
        fn new(width: f64, height: f64) -> Self {
            FixedChild {
                desired: LayoutSize::new(width, height),
                measured: None,
                arranged: Arc::new(Mutex::new(None)),
            }
        }
    }
    impl UiElement for FixedChild {
        fn measure(&mut self, available: LayoutSize) -> LayoutSize {
            self.measured = Some(available);
            self.desired
        }

        fn arrange(&mut self, final_rect: LayoutRect) {
            *self.arranged.lock() = Some(final_rect);
        }

        fn desired_size(&self) -> LayoutSize {
            if self.measured.is_some() {
                self.desired
            } else {
                LayoutSize::zero()
            }
        }
    }

    fn host(w: f64, h: f64) -> TransformLayoutHost {
        TransformLayoutHost::new(Box::new(FixedChild::new(w, h)))
    }

    #[test]
    fn identity_measure_delegates() {
        let mut host = host(100.0, 50.0);
        let desired = host.measure(LayoutSize::new(500.0, 500.0));
        assert_eq!(desired, LayoutSize::new(100.0, 50.0));
    }

    #[test]
    fn scaled_measure_reports_transformed_bounds() {
        let mut host = host(100.0, 50.0);
        host.set_transform(LayoutTransform::scale(0.5, 0.5));
        let desired = host.measure(LayoutSize::new(500.0, 500.0));
        assert_eq!(desired, LayoutSize::new(50.0, 25.0));
    }

    #[test]
    fn transform_invalidation_has_epsilon() {
        let mut host = host(100.0, 50.0);
        host.set_transform(LayoutTransform::scale(0.5, 0.5));
        assert!(host.take_needs_measure());

        // below rounding resolution, no invalidation
        host.set_transform(LayoutTransform::scale(0.500004, 0.5));
        assert!(!host.take_needs_measure());

        host.set_transform(LayoutTransform::scale(0.51, 0.5));
        assert!(host.take_needs_measure());
    }

    #[test]
    fn translation_only_does_not_invalidate() {
        let mut host = host(100.0, 50.0);
        host.set_transform(LayoutTransform::scale(0.5, 0.5));
        host.take_needs_measure();

        host.set_transform(LayoutTransform::scale(0.5, 0.5).then_translate(euclid::vec2(30.0, -12.0)));
        assert!(!host.take_needs_measure());
    }

    #[test]
    fn arrange_gives_child_the_solver_box() {
        let child = FixedChild::new(100.0, 50.0);
        let arranged = child.arranged.clone();
        let mut host = TransformLayoutHost::new(Box::new(child));
        host.set_transform(LayoutTransform::scale(0.5, 0.5));
        host.measure(LayoutSize::new(200.0, 100.0));
        host.arrange(LayoutRect::from_size(LayoutSize::new(200.0, 100.0)));

        // the pre-transform box that scales down into (200, 100)
        assert_eq!(*arranged.lock(), Some(LayoutRect::from_size(LayoutSize::new(400.0, 200.0))));
    }

    #[test]
    fn arrange_centers_oversized_content() {
        // child wants more width than the solver box allows, it keeps its desired
        // size and the transformed bounds are centered in the final space
        let child = FixedChild::new(500.0, 50.0);
        let arranged = child.arranged.clone();
        let mut host = TransformLayoutHost::new(Box::new(child));
        host.set_transform(LayoutTransform::scale(0.5, 0.5));
        host.measure(LayoutSize::new(200.0, 100.0));
        host.arrange(LayoutRect::from_size(LayoutSize::new(200.0, 100.0)));

        assert_eq!(
            *arranged.lock(),
            Some(LayoutRect::new(LayoutPoint::new(-25.0, 37.5), LayoutSize::new(500.0, 50.0)))
        );
    }

    #[test]
    fn measure_suppressed_while_animating() {
        struct CountingChild {
            inner: FixedChild,
            count: Arc<Mutex<usize>>,
        }
        impl UiElement for CountingChild {
            fn measure(&mut self, available: LayoutSize) -> LayoutSize {
                *self.count.lock() += 1;
                self.inner.measure(available)
            }

            fn arrange(&mut self, final_rect: LayoutRect) {
                self.inner.arrange(final_rect);
            }

            fn desired_size(&self) -> LayoutSize {
                self.inner.desired_size()
            }
        }

        let count = Arc::new(Mutex::new(0usize));
        let mut host = TransformLayoutHost::new(Box::new(CountingChild {
            inner: FixedChild::new(100.0, 50.0),
            count: count.clone(),
        }));

        host.set_transform(LayoutTransform::scale(0.5, 0.5));
        host.measure(LayoutSize::new(500.0, 500.0));
        assert_eq!(*count.lock(), 1);

        host.notify_motion_pre_start();
        assert!(host.transform_state().is_animating);

        // child already measured and motion is animating, subtree not re-measured
        host.measure(LayoutSize::new(500.0, 500.0));
        assert_eq!(*count.lock(), 1);

        host.notify_motion_completed();
        host.measure(LayoutSize::new(500.0, 500.0));
        assert_eq!(*count.lock(), 2);
    }

    #[test]
    fn filtered_render_transform_strips_scale() {
        let mut host = host(100.0, 50.0);
        host.set_transform(LayoutTransform::new(0.5, 0.1, 0.2, 0.5, 7.0, 8.0));
        let rt = host.render_transform();
        assert_eq!(rt.m11, 1.0);
        assert_eq!(rt.m22, 1.0);
        assert_eq!(rt.m12, 0.1);
        assert_eq!(rt.m21, 0.2);
        assert_eq!(rt.m31, 7.0);
        assert_eq!(rt.m32, 8.0);

        host.set_use_render_transform(true);
        let rt = host.render_transform();
        assert_eq!(rt.m11, 0.5);
        assert_eq!(rt.m22, 0.5);
    }

    #[test]
    fn size_overrides_apply_and_restore() {
        let mut host = host(100.0, 120.0);
        host.measure(LayoutSize::new(500.0, 500.0));

        let before = host.track_value(TrackProperty::Height);
        assert_eq!(before, TrackValue::Float(120.0));

        host.apply_track(TrackProperty::Height, TrackValue::Float(60.0));
        assert_eq!(host.measure(LayoutSize::new(500.0, 500.0)), LayoutSize::new(100.0, 60.0));

        host.restore_track(TrackProperty::Height, before, false);
        assert_eq!(host.measure(LayoutSize::new(500.0, 500.0)), LayoutSize::new(100.0, 120.0));
    }

    #[test]
    fn opacity_clamped() {
        let mut host = host(10.0, 10.0);
        host.apply_track(TrackProperty::Opacity, TrackValue::Float(1.7));
        assert_eq!(host.opacity(), 1.0);
        host.apply_track(TrackProperty::Opacity, TrackValue::Float(-0.2));
        assert_eq!(host.opacity(), 0.0);
    }
}
