//! # Flywheel Scheduler
//!
//! A cooperative, priority-grouped, reference-counted entity scheduler
//! driving a game-tick/draw-tick loop across two strictly alternating
//! threads.
//!
//! ## Architecture
//!
//! ```text
//! game thread                       caller thread
//! ───────────                       ─────────────
//! gametick.pop() ◄──────────────┐   Ticker::tick_draw():
//!   escalation / reaper / GC    │     drawtick.pop() ◄──┐
//!   admission                   │     draw pass         │
//!   game tick pass              │     gametick.push ────┘
//! drawtick.push ────────────────┘     frame pacing
//! ```
//!
//! The two threads alternate strictly: the game pass for frame N fully
//! completes before the draw pass for frame N, which fully completes
//! before the game pass for frame N+1. Entity lists need no finer
//! locking than the scheduler's single state mutex; register/ref/unref
//! are safe from any thread, including from inside tick callbacks.
//!
//! ## Lifecycle
//!
//! Entities are registered with one implicit, autoreleased reference.
//! An owner that wants the entity to survive must claim it with
//! [`Scheduler::ref_entity`] before the next garbage-collection pass;
//! otherwise the scheduler drops the implicit reference and the entity
//! is reaped one pass later. Destruction is always deferred by one full
//! pass so entities ticked later in the same pass never observe a
//! half-destroyed neighbor.

pub mod arena;
pub mod config;
pub mod entity;
pub mod hooks;
pub mod profiler;
pub mod queue;
pub mod scheduler;
pub mod ticker;
pub mod timer;

pub use arena::{EntityStatus, SlotState};
pub use config::{ConfigError, TickerConfig};
pub use entity::{DrawTick, Entity, GameTick};
pub use hooks::{DrawHooks, NoDrawHooks};
pub use profiler::{Profiler, Stat};
pub use queue::{Queue, Signal};
pub use scheduler::Scheduler;
pub use ticker::Ticker;
pub use timer::Timer;

// Re-export the data model so downstream crates need a single import.
pub use flywheel_core::{
    DrawGroup, EntityHandle, GameGroup, GroupAssignment, GroupSchedule, TickError, TickPhase,
    TickResult,
};
