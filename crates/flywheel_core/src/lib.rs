//! # Flywheel Core
//!
//! Data model for the Flywheel entity scheduler:
//! - Generational entity handles (stale references are detectable, always)
//! - Tick groups as configuration, not a hardcoded enum
//! - An exhaustive tick-phase state machine
//! - Contract-violation errors that exist in every build configuration
//!
//! ## Architecture Rules
//!
//! 1. **No concurrency here** - this crate is pure data model; the
//!    scheduler crate owns every lock and thread
//! 2. **No silent release-mode behavior** - every contract violation is
//!    a [`TickError`], never a compiled-out assert
//! 3. **Relative order only** - group ids are indices into a schedule;
//!    nothing may depend on their numeric values

pub mod error;
pub mod group;
pub mod handle;
pub mod phase;

pub use error::{TickError, TickResult};
pub use group::{DrawGroup, GameGroup, GroupAssignment, GroupSchedule};
pub use handle::EntityHandle;
pub use phase::TickPhase;
