//! # Scheduler Error Types
//!
//! Every contract violation the scheduler can detect. These exist in
//! all build configurations; there is no compiled-out release path.

use thiserror::Error;

use crate::handle::EntityHandle;
use crate::phase::TickPhase;

/// Errors reported by the scheduler's ownership and sequencing checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TickError {
    /// A null handle was passed where a live entity was required.
    #[error("null entity handle")]
    NullHandle,

    /// The handle's slot is free or has been reused by a newer entity.
    #[error("stale entity handle {0}")]
    StaleHandle(EntityHandle),

    /// `ref` was called on an entity already scheduled for destruction.
    #[error("referencing entity {handle} ({name}) scheduled for destruction")]
    RefWhileDestroying {
        /// The offending handle.
        handle: EntityHandle,
        /// Entity name for locating the call site.
        name: String,
    },

    /// `unref` was called on an entity whose count is already zero.
    #[error("dereferencing unreferenced entity {handle} ({name})")]
    UnrefUnderflow {
        /// The offending handle.
        handle: EntityHandle,
        /// Entity name for locating the call site.
        name: String,
    },

    /// `unref` was called on an autoreleased entity. Autoreleased
    /// entities are owned by the scheduler; claim them with `ref` first.
    #[error("dereferencing autoreleased entity {handle} ({name})")]
    UnrefAutoreleased {
        /// The offending handle.
        handle: EntityHandle,
        /// Entity name for locating the call site.
        name: String,
    },

    /// An illegal tick-phase transition was attempted.
    #[error("illegal tick phase transition {from} -> {to}")]
    PhaseViolation {
        /// Phase the entity was in.
        from: TickPhase,
        /// Phase the scheduler tried to move it to.
        to: TickPhase,
    },

    /// A draw group was named that the schedule does not contain.
    #[error("draw group index {0} out of schedule range")]
    UnknownDrawGroup(u32),

    /// A game group was named that the schedule does not contain.
    #[error("game group index {0} out of schedule range")]
    UnknownGameGroup(u32),
}

/// Result type for scheduler operations.
pub type TickResult<T> = Result<T, TickError>;
