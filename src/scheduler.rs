//! Cooperative scheduler that drives motion playback from the UI loop.
//!
//! The embedder calls [`UiScheduler::update`] once per frame with the current time,
//! everything queued here runs inside that call, on the caller's thread.

use std::{
    collections::VecDeque,
    mem,
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

/// Deadline for a timeout, an instant in the scheduler's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Deadline(pub Instant);
impl Deadline {
    /// New deadline `timeout` after `now`.
    pub fn timeout_from(now: Instant, timeout: Duration) -> Self {
        Deadline(now + timeout)
    }

    /// New deadline `timeout` after the current instant.
    pub fn timeout(timeout: Duration) -> Self {
        Self::timeout_from(Instant::now(), timeout)
    }

    /// If the deadline was reached by `now`.
    pub fn has_elapsed(self, now: Instant) -> bool {
        self.0 <= now
    }
}
impl From<Instant> for Deadline {
    fn from(i: Instant) -> Self {
        Deadline(i)
    }
}
impl From<Duration> for Deadline {
    fn from(d: Duration) -> Self {
        Deadline::timeout(d)
    }
}

#[derive(Default)]
struct HandleFlags {
    cancelled: bool,
    perm: bool,
    done: bool,
}
type HandleShared = Arc<Mutex<HandleFlags>>;

macro_rules! schedule_handle {
    ($(#[$meta:meta])* $Handle:ident) => {
        $(#[$meta])*
        ///
        /// Dropping the handle cancels the scheduled work, unless [`perm`] was called.
        ///
        /// [`perm`]: Self::perm
        #[must_use = "dropping the handle cancels the scheduled work"]
        pub struct $Handle(HandleShared);
        impl $Handle {
            /// Drop the handle without cancelling, the work stays scheduled.
            pub fn perm(self) {
                self.0.lock().perm = true;
            }

            /// Cancel the scheduled work, if it did not run already.
            pub fn cancel(self) {
                self.0.lock().cancelled = true;
            }

            /// If the work already ran to completion.
            pub fn is_done(&self) -> bool {
                self.0.lock().done
            }
        }
        impl Drop for $Handle {
            fn drop(&mut self) {
                let mut flags = self.0.lock();
                if !flags.perm && !flags.done {
                    flags.cancelled = true;
                }
            }
        }
    };
}
schedule_handle! {
    /// Handle to a scheduled timeout.
    TimeoutHandle
}
schedule_handle! {
    /// Handle to a running animation closure.
    AnimationHandle
}

struct TimeoutEntry {
    deadline: Deadline,
    action: Option<Box<dyn FnOnce()>>,
    state: HandleShared,
}

struct AnimationEntry {
    animation: Box<dyn FnMut(Instant) -> bool>,
    state: HandleShared,
}

#[derive(Default)]
struct SchedulerData {
    posted: VecDeque<Box<dyn FnOnce()>>,
    timeouts: Vec<TimeoutEntry>,
    animations: Vec<AnimationEntry>,
}

/// Single-thread cooperative scheduler.
///
/// Cloning the scheduler clones a handle to the same queue.
#[derive(Clone, Default)]
pub struct UiScheduler(Arc<Mutex<SchedulerData>>);
impl UiScheduler {
    /// New empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` to run in the next [`update`] call.
    ///
    /// Actions posted from inside an update run in the update after that, a post is
    /// always a full tick of deferral.
    ///
    /// [`update`]: Self::update
    pub fn post(&self, action: impl FnOnce() + 'static) {
        self.0.lock().posted.push_back(Box::new(action));
    }

    /// Schedule `action` to run in the first [`update`] at or after the deadline.
    ///
    /// [`update`]: Self::update
    pub fn on_timeout(&self, deadline: impl Into<Deadline>, action: impl FnOnce() + 'static) -> TimeoutHandle {
        let state = HandleShared::default();
        self.0.lock().timeouts.push(TimeoutEntry {
            deadline: deadline.into(),
            action: Some(Box::new(action)),
            state: state.clone(),
        });
        TimeoutHandle(state)
    }

    /// Register an animation closure, called in every [`update`] with the update time
    /// until it returns `false`.
    ///
    /// [`update`]: Self::update
    pub fn animate(&self, animation: impl FnMut(Instant) -> bool + 'static) -> AnimationHandle {
        let state = HandleShared::default();
        self.0.lock().animations.push(AnimationEntry {
            animation: Box::new(animation),
            state: state.clone(),
        });
        AnimationHandle(state)
    }

    /// If any work is queued or running.
    pub fn has_pending(&self) -> bool {
        let data = self.0.lock();
        !data.posted.is_empty() || !data.timeouts.is_empty() || !data.animations.is_empty()
    }

    /// Run one scheduler tick at time `now`.
    ///
    /// Drains the posted queue, fires elapsed timeouts and steps every animation.
    /// Work scheduled by the running actions lands in the next tick.
    pub fn update(&self, now: Instant) {
        // snapshot all queues before running anything, posted actions register
        // animations and timeouts that must only start in the next tick
        let (posted, mut timeouts, mut animations) = {
            let mut data = self.0.lock();
            (
                mem::take(&mut data.posted),
                mem::take(&mut data.timeouts),
                mem::take(&mut data.animations),
            )
        };

        for action in posted {
            action();
        }

        // elapsed timeouts, cancelled entries are just dropped
        let mut due = Vec::new();
        timeouts.retain_mut(|t| {
            if t.state.lock().cancelled {
                false
            } else if t.deadline.has_elapsed(now) {
                due.push((t.action.take(), t.state.clone()));
                false
            } else {
                true
            }
        });
        for (action, state) in due {
            if let Some(action) = action {
                action();
            }
            state.lock().done = true;
        }

        // animation frame
        animations.retain_mut(|a| {
            if a.state.lock().cancelled {
                return false;
            }
            let retain = (a.animation)(now);
            if !retain {
                a.state.lock().done = true;
            }
            retain
        });

        let mut data = self.0.lock();
        timeouts.append(&mut data.timeouts);
        data.timeouts = timeouts;
        animations.append(&mut data.animations);
        data.animations = animations;
    }
}
