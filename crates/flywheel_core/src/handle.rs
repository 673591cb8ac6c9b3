//! # Entity Handles
//!
//! The weak name by which everything outside the scheduler refers to an
//! entity. Because entity destruction is deferred and slots get reused,
//! a bare slot index would be unsafe to hold across frames; the handle
//! therefore pairs the slot index with the generation the slot had when
//! the entity was created. A handle held past its entity's destruction
//! simply stops resolving; it can never alias a newer occupant of the
//! same slot.

/// Weak reference to a scheduled entity.
///
/// Packs a slot index and the slot's generation at creation time into
/// one word. Lookups compare the stored generation against the slot's
/// current one, so a recycled slot invalidates every old handle to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct EntityHandle(u64);

impl EntityHandle {
    /// Builds a handle for `index` as it exists at `generation`.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Slot index this handle points at.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Slot generation this handle was created against.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// The handle that refers to nothing.
    pub const NULL: Self = Self(u64::MAX);

    /// Whether this is the null handle. A non-null handle can still be
    /// stale; only a lookup can tell.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for EntityHandle {
    fn default() -> Self {
        Self::NULL
    }
}

impl std::fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "entity(null)")
        } else {
            write!(f, "entity({}v{})", self.index(), self.generation())
        }
    }
}
