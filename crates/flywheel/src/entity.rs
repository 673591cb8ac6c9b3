//! # The Entity Trait
//!
//! Entities are units of engine state that participate in per-frame
//! game and/or draw ticks. They are owned by the scheduler's arena and
//! addressed through [`EntityHandle`]s; subtypes implement the two tick
//! hooks and receive a context exposing the frame timing plus the
//! scheduler itself, so a tick callback can register children or
//! transfer ownership mid-pass.
//!
//! Tick callbacks must not block and must not panic: a panicking
//! callback unwinds the owning tick thread and takes the whole loop
//! with it. Anything fallible inside a tick should be handled locally
//! and reported through logging.

use flywheel_core::{DrawGroup, EntityHandle};

use crate::scheduler::Scheduler;

/// A schedulable unit of engine state.
///
/// Both hooks default to no-ops so simulation-only and draw-only
/// entities implement exactly one of them.
pub trait Entity: Send {
    /// Name used in contract-violation errors and scheduler logs.
    fn name(&self) -> &str {
        "entity"
    }

    /// Advances simulation state by `tick.seconds`.
    fn tick_game(&mut self, tick: &mut GameTick<'_>) {
        let _ = tick;
    }

    /// Issues rendering work for this frame.
    fn tick_draw(&mut self, tick: &mut DrawTick<'_>) {
        let _ = tick;
    }
}

/// Context handed to [`Entity::tick_game`].
pub struct GameTick<'a> {
    /// Clamped delta time for this pass, in seconds.
    pub seconds: f32,
    /// Frame number of this pass.
    pub frame: u64,
    /// Handle of the entity being ticked.
    pub handle: EntityHandle,
    sched: &'a Scheduler,
}

impl<'a> GameTick<'a> {
    pub(crate) fn new(
        seconds: f32,
        frame: u64,
        handle: EntityHandle,
        sched: &'a Scheduler,
    ) -> Self {
        Self {
            seconds,
            frame,
            handle,
            sched,
        }
    }

    /// The scheduler running this tick; safe to re-enter for
    /// register/ref/unref.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        self.sched
    }
}

/// Context handed to [`Entity::tick_draw`].
pub struct DrawTick<'a> {
    /// Delta time of the matching game pass, in seconds.
    pub seconds: f32,
    /// Frame number of this pass.
    pub frame: u64,
    /// Handle of the entity being ticked.
    pub handle: EntityHandle,
    /// Draw group currently being walked.
    pub group: DrawGroup,
    sched: &'a Scheduler,
}

impl<'a> DrawTick<'a> {
    pub(crate) fn new(
        seconds: f32,
        frame: u64,
        handle: EntityHandle,
        group: DrawGroup,
        sched: &'a Scheduler,
    ) -> Self {
        Self {
            seconds,
            frame,
            handle,
            group,
            sched,
        }
    }

    /// The scheduler running this tick; safe to re-enter for
    /// register/ref/unref.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        self.sched
    }
}
