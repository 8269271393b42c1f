//! Motion playback orchestration.
//!
//! The [`MotionOrchestrator`] takes a [`MotionSpec`] and an actor and drives the run
//! through its phases: pre-start, optional scene setup, one tick of deferral, track
//! playback, completion fan-in and teardown.

use std::{
    cell::{Cell, RefCell},
    error::Error,
    fmt,
    rc::Rc,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use crate::actor::SharedActor;
use crate::easing::EasingTime;
use crate::scene::{OverlayError, OverlayPlatform, SceneOverlay};
use crate::scheduler::{Deadline, UiScheduler};
use crate::spec::{MotionSpec, SpecError, TrackProperty, TrackValue};
use crate::units::FactorUnits;

/// Cancellation flag shared between a motion run and its [`MotionHandle`].
///
/// Cancellation is a request, the run observes it at the next scheduler tick.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);
impl CancelToken {
    /// New token, not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// If cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CancelToken").field(&self.is_cancelled()).finish()
    }
}

/// Error starting a motion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MotionError {
    /// The motion spec is invalid.
    Spec(SpecError),
    /// A scene motion was requested but no overlay platform is configured.
    SceneUnavailable,
    /// The overlay platform failed to provide a surface.
    Overlay(OverlayError),
}
impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::Spec(e) => write!(f, "{e}"),
            MotionError::SceneUnavailable => write!(f, "no overlay platform configured for scene motion"),
            MotionError::Overlay(e) => write!(f, "{e}"),
        }
    }
}
impl Error for MotionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MotionError::Spec(e) => Some(e),
            MotionError::Overlay(e) => Some(e),
            MotionError::SceneUnavailable => None,
        }
    }
}
impl From<SpecError> for MotionError {
    fn from(e: SpecError) -> Self {
        MotionError::Spec(e)
    }
}
impl From<OverlayError> for MotionError {
    fn from(e: OverlayError) -> Self {
        MotionError::Overlay(e)
    }
}

/// Phase of a motion run, observable through the [`MotionHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Not started.
    Idle,
    /// Actor notified, pre-start hooks running.
    PreStart,
    /// Overlay surface being created and shown.
    SceneSetup,
    /// Waiting one scheduler tick before the first animated frame.
    Deferred,
    /// Tracks are animating.
    Running,
    /// All tracks done, committing fill values.
    Completing,
    /// Motion completed, overlay waiting its teardown delay.
    Teardown,
    /// Run finished normally, terminal.
    Done,
    /// Run was cancelled, terminal.
    Cancelled,
}

/// Simple callback.
pub type MotionCallback = Rc<dyn Fn()>;

/// Observer callbacks for one motion run.
///
/// All callbacks run on the UI thread, inside the scheduler tick that produced
/// the event.
#[derive(Clone, Default)]
pub struct MotionEvents {
    /// Called after pre-start hooks, before any frame is produced.
    pub on_about_to_start: Option<MotionCallback>,
    /// Called exactly once when the run completes normally, never after cancellation.
    pub on_completed: Option<MotionCallback>,
    /// Called when a track fails during playback, the run still completes.
    pub on_track_error: Option<Rc<dyn Fn(TrackProperty)>>,
}
impl MotionEvents {
    /// No observers.
    pub fn none() -> Self {
        Self::default()
    }

    /// Set the completion callback.
    pub fn with_on_completed(mut self, f: impl Fn() + 'static) -> Self {
        self.on_completed = Some(Rc::new(f));
        self
    }

    /// Set the about-to-start callback.
    pub fn with_on_about_to_start(mut self, f: impl Fn() + 'static) -> Self {
        self.on_about_to_start = Some(Rc::new(f));
        self
    }

    /// Set the track error callback.
    pub fn with_on_track_error(mut self, f: impl Fn(TrackProperty) + 'static) -> Self {
        self.on_track_error = Some(Rc::new(f));
        self
    }
}

/// Handle to a started motion run.
///
/// Dropping the handle does not cancel the run.
#[derive(Clone)]
pub struct MotionHandle {
    token: CancelToken,
    phase: Rc<Cell<RunPhase>>,
}
impl MotionHandle {
    /// Request cancellation, observed at the next scheduler tick.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// If cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Current run phase.
    pub fn phase(&self) -> RunPhase {
        self.phase.get()
    }

    /// If the run reached a terminal phase.
    pub fn is_finished(&self) -> bool {
        matches!(self.phase(), RunPhase::Done | RunPhase::Cancelled)
    }

    /// The run's cancellation token.
    pub fn token(&self) -> &CancelToken {
        &self.token
    }
}

/// Direction of a motion, exits hide the actor on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MotionDirection {
    Enter,
    Exit,
}

/// Starts and drives motion runs on a [`UiScheduler`].
pub struct MotionOrchestrator {
    scheduler: UiScheduler,
    platform: Option<Box<dyn OverlayPlatform>>,
}
impl MotionOrchestrator {
    /// New orchestrator without scene support, scene motions will error.
    pub fn new(scheduler: UiScheduler) -> Self {
        MotionOrchestrator { scheduler, platform: None }
    }

    /// New orchestrator with overlay scene support.
    pub fn with_platform(scheduler: UiScheduler, platform: Box<dyn OverlayPlatform>) -> Self {
        MotionOrchestrator {
            scheduler,
            platform: Some(platform),
        }
    }

    /// The scheduler runs are driven by.
    pub fn scheduler(&self) -> &UiScheduler {
        &self.scheduler
    }

    /// Run an entrance motion in the actor's own surface.
    ///
    /// A spec configured with scene geometry runs on an overlay surface instead.
    pub fn run_entrance(
        &mut self,
        actor: &SharedActor,
        spec: MotionSpec,
        events: MotionEvents,
    ) -> Result<MotionHandle, MotionError> {
        self.run(actor, spec, MotionDirection::Enter, false, events)
    }

    /// Run an exit motion in the actor's own surface, the actor is hidden on completion.
    pub fn run_exit(
        &mut self,
        actor: &SharedActor,
        spec: MotionSpec,
        events: MotionEvents,
    ) -> Result<MotionHandle, MotionError> {
        self.run(actor, spec, MotionDirection::Exit, false, events)
    }

    /// Run an entrance motion on an ephemeral overlay surface.
    ///
    /// The actor is kept invisible until the surface is confirmed on-screen.
    pub fn run_in_scene_layer(
        &mut self,
        actor: &SharedActor,
        spec: MotionSpec,
        events: MotionEvents,
    ) -> Result<MotionHandle, MotionError> {
        self.run(actor, spec, MotionDirection::Enter, true, events)
    }

    /// Run an exit motion on an ephemeral overlay surface.
    pub fn run_out_of_scene_layer(
        &mut self,
        actor: &SharedActor,
        spec: MotionSpec,
        events: MotionEvents,
    ) -> Result<MotionHandle, MotionError> {
        self.run(actor, spec, MotionDirection::Exit, true, events)
    }

    fn run(
        &mut self,
        actor: &SharedActor,
        spec: MotionSpec,
        direction: MotionDirection,
        scene_layer: bool,
        events: MotionEvents,
    ) -> Result<MotionHandle, MotionError> {
        // specs carrying scene geometry always run on an overlay surface
        let scene = scene_layer || spec.requires_scene();
        if scene && self.platform.is_none() {
            return Err(MotionError::SceneUnavailable);
        }

        let token = CancelToken::new();
        let run = Rc::new(Run {
            scheduler: self.scheduler.clone(),
            actor: actor.clone(),
            spec: RefCell::new(spec),
            token: token.clone(),
            events,
            direction,
            scene: RefCell::new(None),
            phase: Rc::new(Cell::new(RunPhase::Idle)),
            pending_tracks: Cell::new(0),
            finished: Cell::new(false),
            saved: RefCell::new(vec![]),
            start_time: Cell::new(None),
            last_tick: Cell::new(None),
        });

        // a new motion takes over the actor, a previous run is cancelled
        {
            let mut actor = run.actor.lock();
            if let Some(prev) = actor.replace_active_motion(Some(token.clone())) {
                tracing::debug!("cancelling previous motion of actor");
                prev.cancel();
            }

            run.phase.set(RunPhase::PreStart);
            let spec = run.spec.borrow();
            actor.set_render_transform_origin(spec.render_transform_origin);
            actor.notify_motion_pre_start();
            spec.notify_pre_start(&mut actor);
            if scene {
                // stays hidden until the overlay surface is confirmed on-screen
                actor.set_visible(false);
            }
        }
        if let Some(f) = &run.events.on_about_to_start {
            f();
        }

        if scene {
            run.phase.set(RunPhase::SceneSetup);
            let mut overlay = SceneOverlay::new();
            // platform presence checked above
            let platform = self.platform.as_deref_mut().ok_or(MotionError::SceneUnavailable)?;
            if let Err(e) = overlay.create(platform) {
                let mut actor = run.actor.lock();
                actor.notify_motion_completed();
                actor.clear_active_motion(&token);
                run.phase.set(RunPhase::Cancelled);
                return Err(e.into());
            }
            {
                let mut actor = run.actor.lock();
                let spec = run.spec.borrow();
                overlay.prepare_geometry(&spec, &mut actor);
            }
            *run.scene.borrow_mut() = Some(overlay);

            let r = run.clone();
            let mut scene_ref = run.scene.borrow_mut();
            if let Some(overlay) = scene_ref.as_mut() {
                overlay.show(Box::new(move || {
                    if !r.token.is_cancelled() {
                        r.actor.lock().set_visible(true);
                    }
                    Run::defer_start(&r);
                }));
            }
        } else {
            Run::defer_start(&run);
        }

        Ok(MotionHandle {
            token,
            phase: run.phase.clone(),
        })
    }
}
impl fmt::Debug for MotionOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionOrchestrator")
            .field("has_platform", &self.platform.is_some())
            .finish_non_exhaustive()
    }
}

/// State of one run, shared by the scheduler closures.
struct Run {
    scheduler: UiScheduler,
    actor: SharedActor,
    spec: RefCell<MotionSpec>,
    token: CancelToken,
    events: MotionEvents,
    direction: MotionDirection,
    scene: RefCell<Option<SceneOverlay>>,
    phase: Rc<Cell<RunPhase>>,

    /// Tracks still animating, completion fires when this fan-in reaches zero.
    pending_tracks: Cell<usize>,
    /// Single-fire guard over the completion/cancellation edge.
    finished: Cell<bool>,
    /// Pre-motion property values, `(property, value, had_override)`.
    saved: RefCell<Vec<(TrackProperty, TrackValue, bool)>>,
    start_time: Cell<Option<Instant>>,
    /// Time of the latest animation frame, anchors the teardown delay to the
    /// scheduler's timeline.
    last_tick: Cell<Option<Instant>>,
}
impl Run {
    /// Queue the start one full scheduler tick ahead.
    ///
    /// The deferral lets the pre-start state paint before the first animated frame.
    fn defer_start(run: &Rc<Run>) {
        run.phase.set(RunPhase::Deferred);
        let r = run.clone();
        run.scheduler.post(move || r.start_playback());
    }

    fn start_playback(self: &Rc<Run>) {
        if self.token.is_cancelled() {
            self.finish();
            return;
        }
        self.phase.set(RunPhase::Running);

        // resolve placeholder values, snapshot pre-motion state, build the samplers
        let mut built = vec![];
        {
            let mut actor = self.actor.lock();
            let snapshot = actor.snapshot();
            let mut spec = self.spec.borrow_mut();
            spec.prepare_tracks(&snapshot);

            let fills_backward = spec.fill_mode.fills_backward();
            let mut saved = self.saved.borrow_mut();
            for track in spec.tracks() {
                let property = track.property();
                saved.push((property, actor.track_value(property), actor.has_override(property)));
                if fills_backward {
                    actor.apply_track(property, track.start_value());
                }
                built.push((property, track.build()));
            }
        }

        self.pending_tracks.set(built.len());
        if built.is_empty() {
            // a no-op motion completes in the same tick it would have started
            self.finish();
            return;
        }

        let (duration, easing) = {
            let spec = self.spec.borrow();
            (spec.duration, spec.easing.clone())
        };
        for (property, track) in built {
            let r = self.clone();
            let easing = easing.clone();
            self.scheduler
                .animate(move |now| {
                    if r.token.is_cancelled() {
                        r.finish();
                        return false;
                    }

                    r.last_tick.set(Some(now));
                    let start = match r.start_time.get() {
                        Some(s) => s,
                        None => {
                            r.start_time.set(Some(now));
                            now
                        }
                    };
                    let time = if duration.is_zero() {
                        EasingTime::end()
                    } else {
                        EasingTime::elapsed(duration, now - start, 1.fct())
                    };
                    let value = track.sample(easing(time));

                    if !property.accepts(&value) {
                        tracing::error!("track `{property}` produced a value of the wrong kind, dropping track");
                        if let Some(f) = &r.events.on_track_error {
                            f(property);
                        }
                        r.track_done();
                        return false;
                    }
                    r.actor.lock().apply_track(property, value);

                    if time.is_end() {
                        r.track_done();
                        false
                    } else {
                        true
                    }
                })
                .perm();
        }
    }

    /// One track finished, completion fires when the last one lands.
    fn track_done(self: &Rc<Run>) {
        let left = self.pending_tracks.get().saturating_sub(1);
        self.pending_tracks.set(left);
        if left == 0 {
            self.finish();
        }
    }

    /// Terminal edge of the run, fires at most once.
    fn finish(self: &Rc<Run>) {
        if self.finished.replace(true) {
            return;
        }

        if self.token.is_cancelled() {
            {
                let mut actor = self.actor.lock();
                // a newer run may already own the actor, leave its state alone
                if actor.is_active_motion(&self.token) {
                    actor.notify_motion_completed();
                    actor.clear_active_motion(&self.token);
                }
            }
            tracing::debug!("motion cancelled in {:?} phase", self.phase.get());
            self.teardown(true);
            return;
        }

        self.phase.set(RunPhase::Completing);
        {
            let mut actor = self.actor.lock();
            let spec = self.spec.borrow();
            if spec.fill_mode.fills_forward() {
                for track in spec.tracks() {
                    actor.apply_track(track.property(), track.end_value());
                }
            } else {
                // restore pre-motion values, last applied first
                for (property, value, had_override) in self.saved.borrow().iter().rev() {
                    actor.restore_track(*property, *value, *had_override);
                }
            }
            if self.direction == MotionDirection::Exit {
                actor.set_visible(false);
            }
            actor.notify_motion_completed();
            actor.clear_active_motion(&self.token);
        }
        if let Some(f) = &self.events.on_completed {
            f();
        }
        self.teardown(false);
    }

    fn teardown(self: &Rc<Run>, cancelled: bool) {
        let has_scene = self.scene.borrow().is_some();
        if !has_scene {
            self.phase.set(if cancelled { RunPhase::Cancelled } else { RunPhase::Done });
            return;
        }

        if cancelled {
            if let Some(overlay) = self.scene.borrow_mut().as_mut() {
                overlay.dispose();
            }
            self.phase.set(RunPhase::Cancelled);
            return;
        }

        // the surface outlives the motion briefly so the final frame can paint
        self.phase.set(RunPhase::Teardown);
        let delay = self.spec.borrow().scene_teardown_delay;
        let deadline = match self.last_tick.get() {
            Some(t) => Deadline(t + delay),
            None => Deadline::timeout(delay),
        };
        let r = self.clone();
        self.scheduler
            .on_timeout(deadline, move || {
                if let Some(overlay) = r.scene.borrow_mut().as_mut() {
                    overlay.dispose();
                }
                r.phase.set(RunPhase::Done);
            })
            .perm();
    }
}
