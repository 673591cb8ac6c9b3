//! # Tick Phase State Machine
//!
//! Every scheduled entity carries a [`TickPhase`]. The scheduler drives
//! it through a fixed cycle around each callback:
//!
//! ```text
//! Idle -> PreTickGame -> PostTickGame -> Idle
//! Idle -> PreTickDraw -> PostTickDraw -> Idle
//! ```
//!
//! Any other transition is a sequencing bug (an entity ticked twice in
//! one pass, a draw tick issued mid game tick, ...). The transition
//! table is exhaustive and compiled into every build; whether a
//! violation is fatal is the caller's choice, the machine only reports.

use crate::error::{TickError, TickResult};

/// Where an entity currently stands in the tick cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TickPhase {
    /// Not inside any tick callback.
    #[default]
    Idle,
    /// Game tick callback about to run.
    PreTickGame,
    /// Game tick callback returned.
    PostTickGame,
    /// Draw tick callback about to run.
    PreTickDraw,
    /// Draw tick callback returned.
    PostTickDraw,
}

impl TickPhase {
    /// Returns whether `next` is a legal successor of `self`.
    ///
    /// The match is exhaustive on purpose: adding a phase without
    /// deciding its place in the cycle must not compile.
    #[must_use]
    pub const fn can_advance(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::PreTickGame)
                | (Self::PreTickGame, Self::PostTickGame)
                | (Self::PostTickGame, Self::Idle)
                | (Self::Idle, Self::PreTickDraw)
                | (Self::PreTickDraw, Self::PostTickDraw)
                | (Self::PostTickDraw, Self::Idle)
        )
    }

    /// Advances to `next`, or reports the violated transition.
    ///
    /// # Errors
    ///
    /// [`TickError::PhaseViolation`] when `next` is not a legal
    /// successor of the current phase.
    pub fn advance(self, next: Self) -> TickResult<Self> {
        if self.can_advance(next) {
            Ok(next)
        } else {
            Err(TickError::PhaseViolation { from: self, to: next })
        }
    }

    /// Short name for log lines.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PreTickGame => "pre-tick-game",
            Self::PostTickGame => "post-tick-game",
            Self::PreTickDraw => "pre-tick-draw",
            Self::PostTickDraw => "post-tick-draw",
        }
    }
}

impl std::fmt::Display for TickPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TickPhase; 5] = [
        TickPhase::Idle,
        TickPhase::PreTickGame,
        TickPhase::PostTickGame,
        TickPhase::PreTickDraw,
        TickPhase::PostTickDraw,
    ];

    #[test]
    fn test_game_cycle() {
        let p = TickPhase::Idle;
        let p = p.advance(TickPhase::PreTickGame).unwrap();
        let p = p.advance(TickPhase::PostTickGame).unwrap();
        let p = p.advance(TickPhase::Idle).unwrap();
        assert_eq!(p, TickPhase::Idle);
    }

    #[test]
    fn test_draw_cycle() {
        let p = TickPhase::Idle;
        let p = p.advance(TickPhase::PreTickDraw).unwrap();
        let p = p.advance(TickPhase::PostTickDraw).unwrap();
        assert_eq!(p.advance(TickPhase::Idle).unwrap(), TickPhase::Idle);
    }

    #[test]
    fn test_exactly_six_legal_transitions() {
        let mut legal = 0;
        for from in ALL {
            for to in ALL {
                if from.can_advance(to) {
                    legal += 1;
                }
            }
        }
        assert_eq!(legal, 6);
    }

    #[test]
    fn test_cross_phase_transitions_rejected() {
        // A draw tick cannot start while a game tick is in flight.
        let err = TickPhase::PreTickGame
            .advance(TickPhase::PreTickDraw)
            .unwrap_err();
        assert!(matches!(err, TickError::PhaseViolation { .. }));

        // A second game tick cannot start before returning to idle.
        assert!(TickPhase::PostTickGame
            .advance(TickPhase::PreTickGame)
            .is_err());
    }

    #[test]
    fn test_no_self_loops() {
        for p in ALL {
            assert!(!p.can_advance(p), "{p} must not loop on itself");
        }
    }
}
