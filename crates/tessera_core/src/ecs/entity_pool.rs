//! # Entity Pool
//!
//! Fixed-capacity allocator of salted entity ids. Entities can be parked
//! ("returned to the pool") and later reused under a fresh id; the
//! distributor is told about the id change so queued work keeps reaching
//! the same components.

use super::entity::EntityId;
use super::event::{EntityEvent, EventKind};
use crate::distributor::EventDistributor;
use crate::error::{CoreError, CoreResult};
use crate::memory::{SaltBuffer, SaltHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotState {
    Alive,
    Parked,
}

/// Pool of entity ids backed by a [`SaltBuffer`].
///
/// # Example
///
/// ```rust,ignore
/// let mut pool = EntityPool::new(256);
/// let distributor = EventDistributor::with_pool_capacity(policy, pool.capacity());
///
/// let entity = pool.spawn()?;
/// pool.return_to_pool(entity, &distributor)?;
/// let reused = pool.reuse(entity, &distributor)?;
/// ```
#[derive(Debug)]
pub struct EntityPool {
    slots: SaltBuffer<SlotState>,
    alive_count: usize,
}

impl EntityPool {
    /// Creates a pool holding at most `capacity` entities.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or exceeds 65536.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: SaltBuffer::new(capacity),
            alive_count: 0,
        }
    }

    /// Maximum number of entities (alive plus parked).
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Number of alive (not parked) entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Number of parked entities awaiting reuse.
    #[inline]
    #[must_use]
    pub const fn parked_count(&self) -> usize {
        self.slots.len() - self.alive_count
    }

    /// Allocates a new entity id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PoolExhausted`] when every slot is taken.
    pub fn spawn(&mut self) -> CoreResult<EntityId> {
        let handle = self
            .slots
            .insert(SlotState::Alive)
            .ok_or(CoreError::PoolExhausted {
                capacity: self.capacity(),
            })?;
        self.alive_count += 1;
        Ok(to_entity(handle))
    }

    /// Frees `id` and releases its registrations.
    ///
    /// Returns `false` for stale or unknown ids.
    pub fn despawn(&mut self, id: EntityId, distributor: &EventDistributor) -> bool {
        let handle = to_handle(id);
        let Some(state) = self.slots.get(handle).copied() else {
            return false;
        };

        distributor.on_entity_deleted(id);
        self.slots.remove(handle);
        if state == SlotState::Alive {
            self.alive_count -= 1;
        }
        tracing::debug!(entity = %id, "entity despawned");
        true
    }

    /// Notifies `ReturningToPool` subscribers and parks `id`.
    ///
    /// The event carries the entity id in `n_param[0]`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StaleEntity`] unless `id` is alive.
    pub fn return_to_pool(&mut self, id: EntityId, distributor: &EventDistributor) -> CoreResult<()> {
        if !self.is_alive(id) {
            return Err(CoreError::StaleEntity(id));
        }

        let event = EntityEvent::new(EventKind::ReturningToPool).with_int(0, i64::from(id.raw()));
        distributor.send_event(&event);

        if let Some(state) = self.slots.get_mut(to_handle(id)) {
            *state = SlotState::Parked;
            self.alive_count -= 1;
        }
        tracing::debug!(entity = %id, "entity returned to pool");
        Ok(())
    }

    /// Brings a parked entity back under a fresh id.
    ///
    /// The old id becomes stale and the distributor re-keys the entity's
    /// registrations.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StaleEntity`] unless `old` is parked.
    pub fn reuse(&mut self, old: EntityId, distributor: &EventDistributor) -> CoreResult<EntityId> {
        if !self.is_parked(old) {
            return Err(CoreError::StaleEntity(old));
        }

        self.slots.remove(to_handle(old));
        let handle = self
            .slots
            .insert(SlotState::Alive)
            .ok_or(CoreError::PoolExhausted {
                capacity: self.capacity(),
            })?;
        self.alive_count += 1;

        let new = to_entity(handle);
        distributor.remap_entity_id(old, new);
        Ok(new)
    }

    /// Checks whether `id` is alive.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.slots.get(to_handle(id)) == Some(&SlotState::Alive)
    }

    /// Checks whether `id` is parked.
    #[must_use]
    pub fn is_parked(&self, id: EntityId) -> bool {
        self.slots.get(to_handle(id)) == Some(&SlotState::Parked)
    }
}

#[inline]
fn to_entity(handle: SaltHandle) -> EntityId {
    EntityId::from_handle(handle.index(), handle.salt())
}

#[inline]
fn to_handle(id: EntityId) -> SaltHandle {
    SaltHandle::from_parts(id.index(), id.salt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_until_exhausted() {
        let mut pool = EntityPool::new(2);
        let a = pool.spawn().unwrap();
        let b = pool.spawn().unwrap();
        assert_ne!(a, b);
        assert!(a.is_valid() && b.is_valid());
        assert!(matches!(
            pool.spawn(),
            Err(CoreError::PoolExhausted { capacity: 2 })
        ));
    }

    #[test]
    fn test_despawn_invalidates_id() {
        let distributor = EventDistributor::default();
        let mut pool = EntityPool::new(4);
        let id = pool.spawn().unwrap();

        assert!(pool.despawn(id, &distributor));
        assert!(!pool.is_alive(id));
        assert!(!pool.despawn(id, &distributor));

        let next = pool.spawn().unwrap();
        assert_eq!(next.index(), id.index());
        assert_ne!(next, id);
    }

    #[test]
    fn test_park_and_reuse() {
        let distributor = EventDistributor::default();
        let mut pool = EntityPool::new(4);
        let id = pool.spawn().unwrap();

        pool.return_to_pool(id, &distributor).unwrap();
        assert!(pool.is_parked(id));
        assert_eq!(pool.alive_count(), 0);
        assert_eq!(pool.parked_count(), 1);

        let reused = pool.reuse(id, &distributor).unwrap();
        assert_ne!(reused, id);
        assert!(pool.is_alive(reused));
        assert!(!pool.is_parked(id));
        assert_eq!(distributor.pending_remaps(), vec![(id, reused)]);
    }

    #[test]
    fn test_reuse_requires_parked() {
        let distributor = EventDistributor::default();
        let mut pool = EntityPool::new(4);
        let id = pool.spawn().unwrap();
        assert!(matches!(
            pool.reuse(id, &distributor),
            Err(CoreError::StaleEntity(stale)) if stale == id
        ));
        assert!(pool.return_to_pool(EntityId::INVALID, &distributor).is_err());
    }
}
