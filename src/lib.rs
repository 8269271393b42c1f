#![warn(missing_docs)]
#![warn(unused_extern_crates)]

//! Motion orchestration for UI toolkits.
//!
//! Drives enter/exit animations of UI elements: declarative [`MotionSpec`]s sample
//! property tracks over an easing curve, a [`TransformLayoutHost`] realizes the live
//! transform through measure/arrange, and the [`MotionOrchestrator`] sequences the run
//! phases, including ephemeral topmost overlay surfaces for motions that must paint
//! outside their owner window.
//!
//! The engine is headless, the embedder provides the layout child, the overlay platform
//! and drives the [`UiScheduler`] from its UI loop.
//!
//! ```
//! use motiva::actor::{TransformLayoutHost, UiElement};
//! use motiva::orchestrator::{MotionEvents, MotionOrchestrator};
//! use motiva::scheduler::UiScheduler;
//! use motiva::units::{LayoutRect, LayoutSize};
//! use motiva::presets;
//! use std::time::{Duration, Instant};
//!
//! struct Label;
//! impl UiElement for Label {
//!     fn measure(&mut self, _: LayoutSize) -> LayoutSize {
//!         LayoutSize::new(80.0, 20.0)
//!     }
//!     fn arrange(&mut self, _: LayoutRect) {}
//!     fn desired_size(&self) -> LayoutSize {
//!         LayoutSize::new(80.0, 20.0)
//!     }
//! }
//!
//! let scheduler = UiScheduler::new();
//! let mut motions = MotionOrchestrator::new(scheduler.clone());
//! let actor = TransformLayoutHost::new_shared(Box::new(Label));
//!
//! let handle = motions
//!     .run_entrance(&actor, presets::fade_in(Duration::from_millis(150)), MotionEvents::none())
//!     .unwrap();
//!
//! // driven by the embedder's UI loop
//! let t0 = Instant::now();
//! for ms in (0..=200u64).step_by(10) {
//!     scheduler.update(t0 + Duration::from_millis(ms));
//! }
//! assert!(handle.is_finished());
//! ```
//!
//! [`MotionSpec`]: crate::spec::MotionSpec
//! [`TransformLayoutHost`]: crate::actor::TransformLayoutHost
//! [`MotionOrchestrator`]: crate::orchestrator::MotionOrchestrator
//! [`UiScheduler`]: crate::scheduler::UiScheduler

pub mod actor;
pub mod easing;
pub mod orchestrator;
pub mod presets;
pub mod scene;
pub mod scheduler;
pub mod solver;
pub mod spec;
pub mod transition;
pub mod units;

/// Common types, re-exported for glob import.
pub mod prelude {
    pub use crate::actor::{ActorSnapshot, SharedActor, TransformLayoutHost, UiElement};
    pub use crate::easing::{curve, easing, EasingCurve, EasingFn, EasingTime};
    pub use crate::orchestrator::{
        CancelToken, MotionError, MotionEvents, MotionHandle, MotionOrchestrator, RunPhase,
    };
    pub use crate::presets::{self, Direction};
    pub use crate::scene::{OverlayError, OverlayPlatform, OverlaySurface};
    pub use crate::scheduler::UiScheduler;
    pub use crate::spec::{FillMode, MotionSpec, MotionTrack, TrackProperty, TrackValue};
    pub use crate::units::{
        FactorUnits, LayoutPoint, LayoutRect, LayoutSize, LayoutTransform, RelativePoint,
    };
}
