//! # Draw-Side Policy Hooks
//!
//! The draw pass calls into these hooks around each draw group so the
//! application can set up render state (clear buffers before the first
//! group, toggle depth testing for HUD groups, flush the accumulated
//! scene per phase). The hooks are policy, not scheduling contract: the
//! scheduler only guarantees call order, never what a hook does.

use flywheel_core::DrawGroup;

/// Per-draw-group render-state seam.
///
/// Implementations run on the caller thread inside
/// [`Ticker::tick_draw`](crate::Ticker::tick_draw), strictly between the
/// game pass of the current frame and the game pass of the next one.
pub trait DrawHooks: Send {
    /// Called before any entity in `group` is draw-ticked.
    fn begin_group(&mut self, group: DrawGroup, name: &str) {
        let _ = (group, name);
    }

    /// Called after every entity in `group` was draw-ticked, before the
    /// next group begins. The usual place to render the phase's scene.
    fn end_group(&mut self, group: DrawGroup, name: &str) {
        let _ = (group, name);
    }
}

/// Hook implementation that does nothing; the default for headless use
/// and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDrawHooks;

impl DrawHooks for NoDrawHooks {}
