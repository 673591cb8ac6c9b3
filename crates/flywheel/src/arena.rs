//! # Entity Slot Arena
//!
//! Storage for every registered entity: a growable array of slots
//! addressed by generational [`EntityHandle`]s. Each slot carries the
//! entity box plus its full lifecycle metadata, so group lists and the
//! autorelease list are plain vectors of handles with no pointers to
//! chase and no unlink-during-iteration subtleties.
//!
//! Slots are freed in exactly one place, the scheduler's reaper step;
//! freeing bumps the slot generation so stale handles stop resolving
//! instead of aliasing the next occupant.

use flywheel_core::{EntityHandle, GroupAssignment, TickError, TickPhase, TickResult};

use crate::entity::Entity;

/// Lifecycle tag of an occupied slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// Registered, awaiting admission into the group lists.
    Pending,
    /// Admitted; ticked every pass.
    Active,
    /// Marked for removal; skipped by tick passes, freed by the next
    /// reaper step.
    Destroying,
}

/// One occupied slot: the entity box plus lifecycle metadata.
///
/// `entity` is `None` only for the duration of that entity's own tick
/// callback, when the box is temporarily taken out so the callback can
/// re-enter the scheduler.
pub struct Slot {
    /// The entity itself, absent while its callback is running.
    pub entity: Option<Box<dyn Entity>>,
    /// Cached copy of the entity's name, available even while the box
    /// is taken out.
    pub name: String,
    /// Lifecycle tag.
    pub state: SlotState,
    /// Signed reference count; starts at 1 on registration.
    pub ref_count: i32,
    /// Whether the initial reference is still scheduler-owned.
    pub autorelease: bool,
    /// Placement in the two tick phases.
    pub groups: GroupAssignment,
    /// Tick sequencing phase.
    pub phase: TickPhase,
}

/// Read-only snapshot of a slot's lifecycle metadata.
///
/// Consumed by tests and debug overlays; this is the "weak
/// back-reference" through which a destroyed-but-not-yet-freed entity
/// stays observable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityStatus {
    /// Lifecycle tag.
    pub state: SlotState,
    /// Current reference count.
    pub ref_count: i32,
    /// Whether the entity is still autoreleased.
    pub autorelease: bool,
    /// Group placement.
    pub groups: GroupAssignment,
    /// Tick sequencing phase.
    pub phase: TickPhase,
}

struct Entry {
    generation: u32,
    slot: Option<Slot>,
}

/// Generational slot arena.
pub struct EntityArena {
    entries: Vec<Entry>,
    free_list: Vec<usize>,
    live: usize,
}

impl EntityArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Number of occupied slots (registered and not yet reaped).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no entity is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Stores a freshly registered entity, reusing a free slot when one
    /// exists.
    pub fn insert(&mut self, entity: Box<dyn Entity>, groups: GroupAssignment) -> EntityHandle {
        let name = entity.name().to_owned();
        let slot = Slot {
            entity: Some(entity),
            name,
            state: SlotState::Pending,
            ref_count: 1,
            autorelease: true,
            groups,
            phase: TickPhase::Idle,
        };

        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            let entry = &mut self.entries[index];
            entry.slot = Some(slot);
            EntityHandle::new(index as u32, entry.generation)
        } else {
            let index = self.entries.len();
            self.entries.push(Entry {
                generation: 0,
                slot: Some(slot),
            });
            EntityHandle::new(index as u32, 0)
        }
    }

    /// Resolves a handle to its slot.
    ///
    /// # Errors
    ///
    /// [`TickError::NullHandle`] for the null handle,
    /// [`TickError::StaleHandle`] when the slot is free or reused.
    pub fn get(&self, handle: EntityHandle) -> TickResult<&Slot> {
        self.entry(handle)?
            .slot
            .as_ref()
            .ok_or(TickError::StaleHandle(handle))
    }

    /// Mutable variant of [`Self::get`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::get`].
    pub fn get_mut(&mut self, handle: EntityHandle) -> TickResult<&mut Slot> {
        let entry = self.entry_mut(handle)?;
        entry.slot.as_mut().ok_or(TickError::StaleHandle(handle))
    }

    /// Snapshot of a slot's lifecycle metadata, `None` when the handle
    /// no longer resolves.
    #[must_use]
    pub fn status(&self, handle: EntityHandle) -> Option<EntityStatus> {
        self.get(handle).ok().map(|slot| EntityStatus {
            state: slot.state,
            ref_count: slot.ref_count,
            autorelease: slot.autorelease,
            groups: slot.groups,
            phase: slot.phase,
        })
    }

    /// Frees a slot, dropping its entity and bumping the generation.
    ///
    /// Returns the slot's cached name for logging, or `None` when the
    /// handle no longer resolved.
    pub fn remove(&mut self, handle: EntityHandle) -> Option<String> {
        let entry = self.entry_mut(handle).ok()?;
        let slot = entry.slot.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free_list.push(handle.index() as usize);
        self.live -= 1;
        Some(slot.name)
    }

    /// Handles of every occupied slot, in arena order.
    #[must_use]
    pub fn handles(&self) -> Vec<EntityHandle> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.slot.is_some())
            .map(|(i, e)| EntityHandle::new(i as u32, e.generation))
            .collect()
    }

    fn entry(&self, handle: EntityHandle) -> TickResult<&Entry> {
        if handle.is_null() {
            return Err(TickError::NullHandle);
        }
        let entry = self
            .entries
            .get(handle.index() as usize)
            .ok_or(TickError::StaleHandle(handle))?;
        if entry.generation != handle.generation() {
            return Err(TickError::StaleHandle(handle));
        }
        Ok(entry)
    }

    fn entry_mut(&mut self, handle: EntityHandle) -> TickResult<&mut Entry> {
        if handle.is_null() {
            return Err(TickError::NullHandle);
        }
        let entry = self
            .entries
            .get_mut(handle.index() as usize)
            .ok_or(TickError::StaleHandle(handle))?;
        if entry.generation != handle.generation() {
            return Err(TickError::StaleHandle(handle));
        }
        Ok(entry)
    }
}

impl Default for EntityArena {
    fn default() -> Self {
        Self::new()
    }
}
