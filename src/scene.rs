//! Ephemeral overlay surface hosting scene motions.
//!
//! Scene motions render the actor on a short-lived topmost surface so the animation can
//! paint outside the owner window. The surface exists only for the duration of one
//! motion run plus a teardown grace delay.

use std::{error::Error, fmt};

use crate::actor::TransformLayoutHost;
use crate::spec::MotionSpec;
use crate::units::{LayoutRect, LayoutSize};

/// Error creating an overlay surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayError {
    /// The platform cannot provide topmost overlay surfaces.
    Unsupported,
    /// The platform failed to create the surface.
    Platform(String),
}
impl fmt::Display for OverlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayError::Unsupported => write!(f, "platform does not support overlay surfaces"),
            OverlayError::Platform(e) => write!(f, "platform failed to create overlay surface, {e}"),
        }
    }
}
impl Error for OverlayError {}

/// Provider of overlay surfaces, implemented by the embedder for its windowing backend.
pub trait OverlayPlatform {
    /// Create a new hidden topmost surface.
    fn create_overlay(&mut self) -> Result<Box<dyn OverlaySurface>, OverlayError>;
}

/// One topmost overlay surface.
///
/// All calls are made from the UI thread.
pub trait OverlaySurface {
    /// Set the surface screen geometry.
    fn move_resize(&mut self, rect: LayoutRect);

    /// Request the surface to become visible.
    ///
    /// The `on_open` callback must be invoked once the surface is actually on-screen,
    /// content made visible before that can flash at a stale position.
    fn show(&mut self, on_open: Box<dyn FnOnce()>);

    /// Hide the surface without destroying it.
    fn hide(&mut self);

    /// Destroy the surface, releasing platform resources.
    fn dispose(&mut self);
}

/// Lifecycle stage of a [`SceneOverlay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    /// No surface yet.
    Idle,
    /// Surface created, still hidden.
    Created,
    /// Show requested.
    Shown,
    /// Surface destroyed, terminal.
    Disposed,
}

/// Owns one overlay surface through a single motion run.
///
/// Geometry is computed exactly once per run, the surface does not track the actor
/// afterwards, the motion itself provides all visible movement.
pub struct SceneOverlay {
    surface: Option<Box<dyn OverlaySurface>>,
    state: SceneState,
    geometry: Option<LayoutRect>,
}
impl SceneOverlay {
    /// New overlay with no surface.
    pub fn new() -> Self {
        SceneOverlay {
            surface: None,
            state: SceneState::Idle,
            geometry: None,
        }
    }

    /// Current lifecycle stage.
    pub fn state(&self) -> SceneState {
        self.state
    }

    /// Geometry computed by [`prepare_geometry`], if it ran.
    ///
    /// [`prepare_geometry`]: Self::prepare_geometry
    pub fn geometry(&self) -> Option<LayoutRect> {
        self.geometry
    }

    /// Create the hidden surface.
    pub fn create(&mut self, platform: &mut dyn OverlayPlatform) -> Result<(), OverlayError> {
        debug_assert_eq!(self.state, SceneState::Idle);
        self.surface = Some(platform.create_overlay()?);
        self.state = SceneState::Created;
        Ok(())
    }

    /// Compute the surface geometry from the spec's scene functions and position the
    /// surface. Runs once, repeat calls return the first result.
    ///
    /// If the actor was never measured it is ghost-measured against an unconstrained
    /// box to obtain a content size.
    pub fn prepare_geometry(&mut self, spec: &MotionSpec, actor: &mut TransformLayoutHost) -> LayoutRect {
        if let Some(rect) = self.geometry {
            return rect;
        }

        if actor.desired_size() == LayoutSize::zero() {
            actor.measure(LayoutSize::new(f64::INFINITY, f64::INFINITY));
        }
        let content = actor.desired_size();
        let rect = LayoutRect::new(spec.scene_position(content, actor.position()), spec.scene_size(content));

        if let Some(surface) = &mut self.surface {
            surface.move_resize(rect);
        }
        self.geometry = Some(rect);
        rect
    }

    /// Request the surface to show, `on_open` fires when it is confirmed on-screen.
    ///
    /// If the surface is already shown `on_open` fires immediately. If there is no
    /// surface the callback is dropped, there is nothing to wait for.
    pub fn show(&mut self, on_open: Box<dyn FnOnce()>) {
        match self.state {
            SceneState::Created => {
                if let Some(surface) = &mut self.surface {
                    self.state = SceneState::Shown;
                    surface.show(on_open);
                }
            }
            SceneState::Shown => on_open(),
            SceneState::Idle | SceneState::Disposed => {
                tracing::warn!("show requested on overlay in {:?} state", self.state);
            }
        }
    }

    /// Hide the surface without destroying it.
    pub fn hide(&mut self) {
        if let Some(surface) = &mut self.surface {
            surface.hide();
        }
        if self.state == SceneState::Shown {
            self.state = SceneState::Created;
        }
    }

    /// Destroy the surface. Idempotent, repeat calls are no-ops.
    pub fn dispose(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.hide();
            surface.dispose();
        }
        self.state = SceneState::Disposed;
    }

    /// If the surface was destroyed.
    pub fn is_disposed(&self) -> bool {
        self.state == SceneState::Disposed
    }
}
impl Default for SceneOverlay {
    fn default() -> Self {
        Self::new()
    }
}
