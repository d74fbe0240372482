//! Pending entity-id remaps for pooled entities.
//!
//! When a pooled entity is reused under a fresh id, events already queued
//! against the old id must still reach it. The table records `old → new`
//! pairs, collapsing chains so every entry maps an original id to its
//! current one.

use crate::ecs::EntityId;

/// Outcome of [`EntityIdRemapTable::remap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemapOutcome {
    /// The remap undid an earlier one; the entry was erased.
    Cancelled,
    /// An existing entry was pointed at the new id.
    Retargeted,
    /// A new `old → new` entry was recorded.
    Inserted,
    /// `old == new`; nothing changed.
    Unchanged,
}

/// Small list of `(original, current)` id pairs.
///
/// Bounded by the entity pool capacity: at most one entry per pooled slot.
#[derive(Debug, Clone, Default)]
pub struct EntityIdRemapTable {
    entries: Vec<(EntityId, EntityId)>,
    capacity: usize,
}

impl EntityIdRemapTable {
    /// Creates an empty table sized for `capacity` pooled entities.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Records that `old` now lives under `new`.
    pub fn remap(&mut self, old: EntityId, new: EntityId) -> RemapOutcome {
        if old == new {
            return RemapOutcome::Unchanged;
        }

        // `old` is the current id of an earlier remap: extend the chain.
        if let Some(position) = self.entries.iter().position(|(_, current)| *current == old) {
            if self.entries[position].0 == new {
                self.entries.swap_remove(position);
                return RemapOutcome::Cancelled;
            }
            self.entries[position].1 = new;
            return RemapOutcome::Retargeted;
        }

        // `old` was already remapped once and is being remapped again.
        if let Some(entry) = self.entries.iter_mut().find(|(original, _)| *original == old) {
            entry.1 = new;
            return RemapOutcome::Retargeted;
        }

        if self.entries.len() >= self.capacity {
            tracing::error!(
                capacity = self.capacity,
                %old,
                %new,
                "more pending entity remaps than pooled entities"
            );
            debug_assert!(false, "more pending entity remaps than pooled entities");
        }
        self.entries.push((old, new));
        RemapOutcome::Inserted
    }

    /// Resolves `id` and erases the pair it belongs to.
    ///
    /// Returns the pair's current id when `id` appears on either side,
    /// otherwise `id` unchanged.
    pub fn get_and_erase(&mut self, id: EntityId) -> EntityId {
        match self
            .entries
            .iter()
            .position(|(original, current)| *original == id || *current == id)
        {
            Some(position) => self.entries.swap_remove(position).1,
            None => id,
        }
    }

    /// Erases the pair whose current id is `current`, leaving pairs that
    /// merely started from that id alone.
    ///
    /// Returns `true` if a pair was erased.
    pub fn erase_current(&mut self, current: EntityId) -> bool {
        match self.entries.iter().position(|(_, to)| *to == current) {
            Some(position) => {
                self.entries.swap_remove(position);
                true
            }
            None => false,
        }
    }

    /// Current id recorded for `original`, if any.
    #[must_use]
    pub fn target_of(&self, original: EntityId) -> Option<EntityId> {
        self.entries
            .iter()
            .find(|(from, _)| *from == original)
            .map(|(_, to)| *to)
    }

    /// Number of pending pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no remap is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of pairs expected at once.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forgets every pending pair.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates `(original, current)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, EntityId)> + '_ {
        self.entries.iter().copied()
    }
}
