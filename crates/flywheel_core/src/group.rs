//! # Tick Groups
//!
//! Groups are ordering buckets within a tick phase: every game pass
//! ticks group 0's entities before group 1's, and so on. The *set* of
//! groups is configuration supplied by the application; only the
//! relative order inside a schedule is contractual. Group ids are plain
//! indices into the schedule and carry no other meaning.

use crate::error::{TickError, TickResult};

/// Ordering bucket within the game tick phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct GameGroup(pub u32);

/// Ordering bucket within the draw tick phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct DrawGroup(pub u32);

/// An entity's placement in the two tick phases.
///
/// `draw` is optional: entities that only advance simulation never
/// appear in any draw list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupAssignment {
    /// Game-pass bucket.
    pub game: GameGroup,
    /// Draw-pass bucket, or `None` for non-drawn entities.
    pub draw: Option<DrawGroup>,
}

/// The ordered group lists for one scheduler instance.
///
/// Fixed at scheduler construction; group ids handed out by the lookup
/// methods stay valid for the scheduler's lifetime.
#[derive(Clone, Debug)]
pub struct GroupSchedule {
    game: Vec<String>,
    draw: Vec<String>,
}

impl GroupSchedule {
    /// Creates a schedule from ordered group name lists.
    ///
    /// # Panics
    ///
    /// Panics if either list is empty or contains duplicate names;
    /// a schedule is startup configuration and a bad one is fatal.
    #[must_use]
    pub fn new<S: Into<String>>(
        game: impl IntoIterator<Item = S>,
        draw: impl IntoIterator<Item = S>,
    ) -> Self {
        let game: Vec<String> = game.into_iter().map(Into::into).collect();
        let draw: Vec<String> = draw.into_iter().map(Into::into).collect();
        assert!(!game.is_empty(), "schedule needs at least one game group");
        assert!(!draw.is_empty(), "schedule needs at least one draw group");
        for list in [&game, &draw] {
            for (i, name) in list.iter().enumerate() {
                assert!(
                    !list[..i].contains(name),
                    "duplicate group name {name:?} in schedule"
                );
            }
        }
        Self { game, draw }
    }

    /// Number of game groups.
    #[inline]
    #[must_use]
    pub fn game_count(&self) -> usize {
        self.game.len()
    }

    /// Number of draw groups.
    #[inline]
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.draw.len()
    }

    /// Looks up a game group by name.
    #[must_use]
    pub fn game_group(&self, name: &str) -> Option<GameGroup> {
        self.game
            .iter()
            .position(|n| n == name)
            .map(|i| GameGroup(i as u32))
    }

    /// Looks up a draw group by name.
    #[must_use]
    pub fn draw_group(&self, name: &str) -> Option<DrawGroup> {
        self.draw
            .iter()
            .position(|n| n == name)
            .map(|i| DrawGroup(i as u32))
    }

    /// Name of a game group, if the id belongs to this schedule.
    #[must_use]
    pub fn game_name(&self, group: GameGroup) -> Option<&str> {
        self.game.get(group.0 as usize).map(String::as_str)
    }

    /// Name of a draw group, if the id belongs to this schedule.
    #[must_use]
    pub fn draw_name(&self, group: DrawGroup) -> Option<&str> {
        self.draw.get(group.0 as usize).map(String::as_str)
    }

    /// Validates an assignment against this schedule.
    ///
    /// # Errors
    ///
    /// [`TickError::UnknownGameGroup`] / [`TickError::UnknownDrawGroup`]
    /// when an id falls outside the schedule.
    pub fn check(&self, groups: GroupAssignment) -> TickResult<()> {
        if groups.game.0 as usize >= self.game.len() {
            return Err(TickError::UnknownGameGroup(groups.game.0));
        }
        if let Some(draw) = groups.draw {
            if draw.0 as usize >= self.draw.len() {
                return Err(TickError::UnknownDrawGroup(draw.0));
            }
        }
        Ok(())
    }

    /// An assignment using each phase's `"default"` group (or, when no
    /// group has that name, the first group of each phase).
    #[must_use]
    pub fn default_assignment(&self) -> GroupAssignment {
        GroupAssignment {
            game: self.game_group("default").unwrap_or(GameGroup(0)),
            draw: Some(self.draw_group("default").unwrap_or(DrawGroup(0))),
        }
    }
}

impl Default for GroupSchedule {
    /// The stock schedule: game passes run before/default/after plus two
    /// trailing cleanup buckets; draw passes run scene setup first and
    /// frame capture last.
    fn default() -> Self {
        Self::new(
            ["before", "default", "after", "after0", "after1"],
            ["before", "camera", "default", "hud", "capture"],
        )
    }
}
