//! Declarative motion definitions.

use std::{error::Error, fmt, ops, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::actor::{ActorSnapshot, TransformLayoutHost};
use crate::easing::{EasingCurve, EasingStep};
use crate::transition::{KeyframeError, Transition, TransitionKeyed};
use crate::units::{Factor, LayoutPoint, LayoutSize, LayoutTransform, RelativePoint};

/// Default overlay teardown grace delay after a scene motion completes.
///
/// The delay lets a final paint land before the surface disappears, avoiding a visible pop.
pub const DEFAULT_SCENE_TEARDOWN_DELAY: Duration = Duration::from_millis(600);

/// Defines what animated values persist after the motion ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillMode {
    /// Values are restored to their pre-motion state on completion.
    #[default]
    None,
    /// End values persist after completion.
    Forward,
    /// Start values apply from pre-start, pre-motion values restored on completion.
    Backward,
    /// Start values apply from pre-start and end values persist.
    Both,
}
impl FillMode {
    /// If end values persist after the motion completes.
    pub fn fills_forward(self) -> bool {
        matches!(self, FillMode::Forward | FillMode::Both)
    }

    /// If start values apply before the first animated frame.
    pub fn fills_backward(self) -> bool {
        matches!(self, FillMode::Backward | FillMode::Both)
    }
}

/// Actor property animated by a [`MotionTrack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackProperty {
    /// Actor opacity, `0.0..=1.0`.
    Opacity,
    /// The actor's 2-D affine motion transform.
    Transform,
    /// Layout width override.
    Width,
    /// Layout height override.
    Height,
}
impl TrackProperty {
    /// If `value` is the kind of value this property animates.
    pub fn accepts(self, value: &TrackValue) -> bool {
        match self {
            TrackProperty::Transform => matches!(value, TrackValue::Transform(_)),
            _ => matches!(value, TrackValue::Float(_)),
        }
    }
}
impl fmt::Display for TrackProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackProperty::Opacity => write!(f, "opacity"),
            TrackProperty::Transform => write!(f, "transform"),
            TrackProperty::Width => write!(f, "width"),
            TrackProperty::Height => write!(f, "height"),
        }
    }
}

/// A value sampled by a [`MotionTrack`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackValue {
    /// Scalar value, for opacity and size tracks.
    Float(f64),
    /// Affine transform value, interpolated componentwise.
    Transform(LayoutTransform),
}
impl TrackValue {
    /// Scalar value, `None` if the value is a transform.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            TrackValue::Float(f) => Some(*f),
            TrackValue::Transform(_) => None,
        }
    }

    /// Transform value, `None` if the value is a scalar.
    pub fn as_transform(&self) -> Option<LayoutTransform> {
        match self {
            TrackValue::Transform(t) => Some(*t),
            TrackValue::Float(_) => None,
        }
    }
}
impl ops::Add for TrackValue {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        match (self, rhs) {
            (TrackValue::Float(a), TrackValue::Float(b)) => TrackValue::Float(a + b),
            (TrackValue::Transform(a), TrackValue::Transform(b)) => TrackValue::Transform(LayoutTransform::new(
                a.m11 + b.m11,
                a.m12 + b.m12,
                a.m21 + b.m21,
                a.m22 + b.m22,
                a.m31 + b.m31,
                a.m32 + b.m32,
            )),
            (a, _) => {
                debug_assert!(false, "mismatched track value kinds");
                a
            }
        }
    }
}
impl ops::Sub for TrackValue {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        match (self, rhs) {
            (TrackValue::Float(a), TrackValue::Float(b)) => TrackValue::Float(a - b),
            (TrackValue::Transform(a), TrackValue::Transform(b)) => TrackValue::Transform(LayoutTransform::new(
                a.m11 - b.m11,
                a.m12 - b.m12,
                a.m21 - b.m21,
                a.m22 - b.m22,
                a.m31 - b.m31,
                a.m32 - b.m32,
            )),
            (a, _) => {
                debug_assert!(false, "mismatched track value kinds");
                a
            }
        }
    }
}
impl ops::Mul<Factor> for TrackValue {
    type Output = Self;

    fn mul(self, rhs: Factor) -> Self {
        match self {
            TrackValue::Float(f) => TrackValue::Float(f * rhs),
            TrackValue::Transform(t) => TrackValue::Transform(LayoutTransform::new(
                t.m11 * rhs,
                t.m12 * rhs,
                t.m21 * rhs,
                t.m22 * rhs,
                t.m31 * rhs,
                t.m32 * rhs,
            )),
        }
    }
}

/// Error constructing a [`MotionSpec`] or [`MotionTrack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecError {
    /// Keyframe sequence rejected.
    Keyframe(KeyframeError),
    /// A track value kind does not match the target property.
    ValueKind(TrackProperty),
}
impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecError::Keyframe(e) => write!(f, "{e}"),
            SpecError::ValueKind(p) => write!(f, "track value kind does not match property `{p}`"),
        }
    }
}
impl Error for SpecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SpecError::Keyframe(e) => Some(e),
            SpecError::ValueKind(_) => None,
        }
    }
}
impl From<KeyframeError> for SpecError {
    fn from(e: KeyframeError) -> Self {
        SpecError::Keyframe(e)
    }
}

/// A single animated property inside a [`MotionSpec`].
#[derive(Clone, Debug)]
pub struct MotionTrack {
    property: TrackProperty,
    playback: TrackPlayback,
}

#[derive(Clone, Debug)]
enum TrackPlayback {
    Transition { start: TrackValue, end: TrackValue },
    Keyframes(Vec<(Factor, TrackValue)>),
}

impl MotionTrack {
    /// New track interpolating continuously from `start` to `end`.
    pub fn transition(property: TrackProperty, start: TrackValue, end: TrackValue) -> Result<Self, SpecError> {
        if !property.accepts(&start) || !property.accepts(&end) {
            return Err(SpecError::ValueKind(property));
        }
        Ok(MotionTrack {
            property,
            playback: TrackPlayback::Transition { start, end },
        })
    }

    /// New track sampling an ordered `(cue, value)` keyframe sequence.
    ///
    /// Cues must be monotonically non-decreasing in the `0..=1` range.
    pub fn keyframes(property: TrackProperty, keys: Vec<(Factor, TrackValue)>) -> Result<Self, SpecError> {
        if keys.iter().any(|(_, v)| !property.accepts(v)) {
            return Err(SpecError::ValueKind(property));
        }
        // validates cue order, the keyed transition itself is rebuilt at start
        TransitionKeyed::new(keys.clone())?;
        Ok(MotionTrack {
            property,
            playback: TrackPlayback::Keyframes(keys),
        })
    }

    /// The animated property.
    pub fn property(&self) -> TrackProperty {
        self.property
    }

    /// Value committed at the `0.fct()` step.
    pub fn start_value(&self) -> TrackValue {
        match &self.playback {
            TrackPlayback::Transition { start, .. } => *start,
            TrackPlayback::Keyframes(k) => k[0].1,
        }
    }

    /// Value committed at the `1.fct()` step.
    pub fn end_value(&self) -> TrackValue {
        match &self.playback {
            TrackPlayback::Transition { end, .. } => *end,
            TrackPlayback::Keyframes(k) => k[k.len() - 1].1,
        }
    }

    /// Replace the start value, used by pre-build hooks to resolve placeholder values.
    ///
    /// The value kind must match the property, mismatches are ignored with an error log.
    pub fn set_start_value(&mut self, value: TrackValue) {
        if !self.property.accepts(&value) {
            tracing::error!("ignored start value of wrong kind for `{}` track", self.property);
            return;
        }
        match &mut self.playback {
            TrackPlayback::Transition { start, .. } => *start = value,
            TrackPlayback::Keyframes(k) => k[0].1 = value,
        }
    }

    /// Replace the end value, see [`set_start_value`] for details.
    ///
    /// [`set_start_value`]: Self::set_start_value
    pub fn set_end_value(&mut self, value: TrackValue) {
        if !self.property.accepts(&value) {
            tracing::error!("ignored end value of wrong kind for `{}` track", self.property);
            return;
        }
        match &mut self.playback {
            TrackPlayback::Transition { end, .. } => *end = value,
            TrackPlayback::Keyframes(k) => {
                let last = k.len() - 1;
                k[last].1 = value;
            }
        }
    }

    pub(crate) fn build(&self) -> BuiltTrack {
        match &self.playback {
            TrackPlayback::Transition { start, end } => BuiltTrack::Continuous(Transition::new(*start, *end)),
            TrackPlayback::Keyframes(k) => {
                // cue order validated at construction
                BuiltTrack::Keyed(TransitionKeyed::new(k.clone()).unwrap())
            }
        }
    }
}

pub(crate) enum BuiltTrack {
    Continuous(Transition<TrackValue>),
    Keyed(TransitionKeyed<TrackValue>),
}
impl BuiltTrack {
    pub fn sample(&self, step: EasingStep) -> TrackValue {
        match self {
            BuiltTrack::Continuous(t) => t.sample(step),
            BuiltTrack::Keyed(t) => t.sample(step),
        }
    }
}

/// Function that derives the overlay surface size from the actor's measured content size.
pub type SceneSizeFn = Arc<dyn Fn(LayoutSize) -> LayoutSize>;

/// Function that derives the overlay surface position from the actor's measured content
/// size and current screen position.
pub type ScenePositionFn = Arc<dyn Fn(LayoutSize, LayoutPoint) -> LayoutPoint>;

/// Hook invoked before the motion starts, may mutate the actor's starting property values.
pub type PreStartHook = Arc<dyn Fn(&mut TransformLayoutHost)>;

/// Hook invoked once per track before playback, resolves track-relative placeholder
/// values against the actor's current measured state. Must be idempotent per run.
pub type PreBuildTrackHook = Arc<dyn Fn(&mut MotionTrack, &ActorSnapshot)>;

/// Declarative description of one motion.
///
/// A spec is inert data plus extension hooks, it is configured before being handed to the
/// [`MotionOrchestrator`] and never mutated afterwards.
///
/// [`MotionOrchestrator`]: crate::orchestrator::MotionOrchestrator
#[derive(Clone)]
pub struct MotionSpec {
    /// Total playback duration.
    pub duration: Duration,
    /// Easing curve applied to every track.
    pub easing: EasingCurve,
    /// What values persist post-animation.
    pub fill_mode: FillMode,
    /// Pivot for transform tracks.
    pub render_transform_origin: RelativePoint,
    /// Grace delay before a scene overlay surface is torn down after completion.
    pub scene_teardown_delay: Duration,

    tracks: Vec<MotionTrack>,
    scene_size: Option<SceneSizeFn>,
    scene_position: Option<ScenePositionFn>,
    on_pre_start: Option<PreStartHook>,
    on_pre_build_track: Option<PreBuildTrackHook>,
}
impl MotionSpec {
    /// New spec with no tracks.
    ///
    /// A spec with zero tracks is a valid no-op motion that completes immediately.
    pub fn new(duration: Duration, easing: EasingCurve) -> Self {
        MotionSpec {
            duration,
            easing,
            fill_mode: FillMode::None,
            render_transform_origin: RelativePoint::top_left(),
            scene_teardown_delay: DEFAULT_SCENE_TEARDOWN_DELAY,
            tracks: vec![],
            scene_size: None,
            scene_position: None,
            on_pre_start: None,
            on_pre_build_track: None,
        }
    }

    /// Add a property track.
    pub fn with_track(mut self, track: MotionTrack) -> Self {
        self.tracks.push(track);
        self
    }

    /// Set the fill behavior.
    pub fn with_fill_mode(mut self, fill_mode: FillMode) -> Self {
        self.fill_mode = fill_mode;
        self
    }

    /// Set the render-transform origin.
    pub fn with_origin(mut self, origin: RelativePoint) -> Self {
        self.render_transform_origin = origin;
        self
    }

    /// Set the scene geometry functions, marking this motion as scene-backed.
    ///
    /// Both functions must be pure functions of the actor geometry.
    pub fn with_scene_fns(mut self, size: SceneSizeFn, position: ScenePositionFn) -> Self {
        self.scene_size = Some(size);
        self.scene_position = Some(position);
        self
    }

    /// Set the overlay teardown grace delay.
    pub fn with_teardown_delay(mut self, delay: Duration) -> Self {
        self.scene_teardown_delay = delay;
        self
    }

    /// Set the pre-start hook.
    pub fn with_on_pre_start(mut self, hook: PreStartHook) -> Self {
        self.on_pre_start = Some(hook);
        self
    }

    /// Set the per-track pre-build hook.
    pub fn with_on_pre_build_track(mut self, hook: PreBuildTrackHook) -> Self {
        self.on_pre_build_track = Some(hook);
        self
    }

    /// The property tracks, in configuration order.
    pub fn tracks(&self) -> &[MotionTrack] {
        &self.tracks
    }

    /// If this motion must render on a scene overlay surface.
    pub fn requires_scene(&self) -> bool {
        self.scene_size.is_some() && self.scene_position.is_some()
    }

    /// Compute the overlay surface size for the measured `content` size.
    pub fn scene_size(&self, content: LayoutSize) -> LayoutSize {
        match &self.scene_size {
            Some(f) => f(content),
            None => content,
        }
    }

    /// Compute the overlay surface position for the measured `content` size and
    /// actor `position`.
    pub fn scene_position(&self, content: LayoutSize, position: LayoutPoint) -> LayoutPoint {
        match &self.scene_position {
            Some(f) => f(content, position),
            None => position,
        }
    }

    pub(crate) fn notify_pre_start(&self, actor: &mut TransformLayoutHost) {
        if let Some(hook) = &self.on_pre_start {
            hook(actor);
        }
    }

    /// Run the pre-build hook over every track.
    pub(crate) fn prepare_tracks(&mut self, snapshot: &ActorSnapshot) {
        if let Some(hook) = self.on_pre_build_track.clone() {
            for track in &mut self.tracks {
                hook(track, snapshot);
            }
        }
    }
}
impl fmt::Debug for MotionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionSpec")
            .field("duration", &self.duration)
            .field("fill_mode", &self.fill_mode)
            .field("render_transform_origin", &self.render_transform_origin)
            .field("tracks", &self.tracks)
            .field("requires_scene", &self.requires_scene())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::{curve, easing};
    use crate::units::FactorUnits;

    #[test]
    fn track_value_kind_checked() {
        let r = MotionTrack::transition(
            TrackProperty::Opacity,
            TrackValue::Float(0.0),
            TrackValue::Transform(LayoutTransform::identity()),
        );
        assert_eq!(r.unwrap_err(), SpecError::ValueKind(TrackProperty::Opacity));
    }

    #[test]
    fn keyframe_cues_checked_at_construction() {
        let r = MotionTrack::keyframes(
            TrackProperty::Height,
            vec![
                (0.fct(), TrackValue::Float(120.0)),
                (0.9.fct(), TrackValue::Float(50.0)),
                (0.4.fct(), TrackValue::Float(0.0)),
            ],
        );
        assert_eq!(r.unwrap_err(), SpecError::Keyframe(KeyframeError::CueOrder(2)));
    }

    #[test]
    fn zero_tracks_is_valid() {
        let spec = MotionSpec::new(Duration::from_millis(200), curve(easing::linear));
        assert!(spec.tracks().is_empty());
        assert!(!spec.requires_scene());
    }

    #[test]
    fn track_endpoint_edits() {
        let mut track =
            MotionTrack::transition(TrackProperty::Height, TrackValue::Float(0.0), TrackValue::Float(1.0)).unwrap();
        track.set_start_value(TrackValue::Float(120.0));
        assert_eq!(track.start_value(), TrackValue::Float(120.0));

        // wrong kind is ignored
        track.set_end_value(TrackValue::Transform(LayoutTransform::identity()));
        assert_eq!(track.end_value(), TrackValue::Float(1.0));
    }

    #[test]
    fn transform_track_samples_componentwise() {
        let track = MotionTrack::transition(
            TrackProperty::Transform,
            TrackValue::Transform(LayoutTransform::scale(1.0, 1.0)),
            TrackValue::Transform(LayoutTransform::scale(0.0, 0.0)),
        )
        .unwrap();
        let built = track.build();
        let half = built.sample(0.5.fct()).as_transform().unwrap();
        assert!((half.m11 - 0.5).abs() < 1e-9);
        assert!((half.m22 - 0.5).abs() < 1e-9);
    }
}
