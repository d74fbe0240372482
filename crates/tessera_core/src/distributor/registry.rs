//! Per-entity tracking of registered components and the kinds they want.
//!
//! The registry is the source of truth for "which events does this component
//! currently care about"; teardown walks it, never the subscription tables.

use rustc_hash::FxHashMap;

use crate::ecs::{ComponentHandle, EntityId, EventMask};
use crate::memory::{SaltBuffer, SaltHandle};

/// Upper bound on simultaneously tracked (entity, component) pairs.
pub(crate) const MAX_REGISTRATIONS: usize = u16::MAX as usize + 1;

/// Tracking entry for one (entity, component) pair.
#[derive(Debug)]
pub(crate) struct Registration {
    pub(crate) entity: EntityId,
    pub(crate) component: ComponentHandle,
    pub(crate) events: EventMask,
}

/// Multimap entity → registrations, backed by a salted slot arena.
pub(crate) struct RegistrationRegistry {
    slots: SaltBuffer<Registration>,
    by_entity: FxHashMap<EntityId, Vec<SaltHandle>>,
}

impl RegistrationRegistry {
    pub(crate) fn new() -> Self {
        Self {
            slots: SaltBuffer::new(MAX_REGISTRATIONS),
            by_entity: FxHashMap::default(),
        }
    }

    /// Finds the slot of the (entity, component) pair.
    pub(crate) fn find(&self, entity: EntityId, component: &ComponentHandle) -> Option<SaltHandle> {
        self.by_entity.get(&entity)?.iter().copied().find(|handle| {
            self.slots
                .get(*handle)
                .is_some_and(|registration| registration.component.ptr_eq(component))
        })
    }

    /// Starts tracking the pair. Returns `None` when the arena is full.
    pub(crate) fn insert(&mut self, entity: EntityId, component: ComponentHandle) -> Option<SaltHandle> {
        let handle = self.slots.insert(Registration {
            entity,
            component,
            events: EventMask::EMPTY,
        })?;
        self.by_entity.entry(entity).or_default().push(handle);
        Some(handle)
    }

    /// Stops tracking the pair behind `handle`.
    pub(crate) fn remove(&mut self, handle: SaltHandle) -> Option<Registration> {
        let registration = self.slots.remove(handle)?;
        if let Some(handles) = self.by_entity.get_mut(&registration.entity) {
            handles.retain(|candidate| *candidate != handle);
            if handles.is_empty() {
                self.by_entity.remove(&registration.entity);
            }
        }
        Some(registration)
    }

    pub(crate) fn get(&self, handle: SaltHandle) -> Option<&Registration> {
        self.slots.get(handle)
    }

    pub(crate) fn get_mut(&mut self, handle: SaltHandle) -> Option<&mut Registration> {
        self.slots.get_mut(handle)
    }

    /// Copy of the slots tracked under `entity`, safe to hold across mutation.
    pub(crate) fn handles_for(&self, entity: EntityId) -> Vec<SaltHandle> {
        self.by_entity.get(&entity).cloned().unwrap_or_default()
    }

    /// First slot tracked under `entity`.
    pub(crate) fn first_for(&self, entity: EntityId) -> Option<SaltHandle> {
        self.by_entity.get(&entity)?.first().copied()
    }

    /// Moves every registration from `old` to `new`.
    ///
    /// Returns the moved slots. Registrations already under `new` are kept.
    pub(crate) fn rekey(&mut self, old: EntityId, new: EntityId) -> Vec<SaltHandle> {
        let Some(moved) = self.by_entity.remove(&old) else {
            return Vec::new();
        };
        for handle in &moved {
            if let Some(registration) = self.slots.get_mut(*handle) {
                registration.entity = new;
            }
        }
        self.by_entity
            .entry(new)
            .or_default()
            .extend(moved.iter().copied());
        moved
    }

    /// Drops every registration.
    pub(crate) fn drain(&mut self) -> Vec<Registration> {
        self.by_entity.clear();
        self.slots.drain()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn entity_count(&self) -> usize {
        self.by_entity.len()
    }
}
