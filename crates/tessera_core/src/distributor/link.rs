//! Non-owning back-reference from a component to its distributor.

use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;

use super::event_distributor::{DistributorState, EventDistributor};
use crate::ecs::{EntityId, EventSelector};
use crate::memory::SaltHandle;

/// Handed to a component by [`crate::Component::set_distributor`].
///
/// Holds a weak pointer to the distributor and the salted id of the
/// component's registry slot. Once the component is deregistered (or the
/// distributor dropped) every call through the link is a no-op.
#[derive(Clone)]
pub struct DistributorLink {
    state: Weak<RefCell<DistributorState>>,
    slot: SaltHandle,
    entity: EntityId,
}

impl DistributorLink {
    pub(crate) fn new(
        state: Weak<RefCell<DistributorState>>,
        slot: SaltHandle,
        entity: EntityId,
    ) -> Self {
        Self {
            state,
            slot,
            entity,
        }
    }

    /// Entity the component is tracked under.
    #[inline]
    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        self.entity
    }

    /// Whether the distributor still exists and still tracks this slot.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.distributor()
            .is_some_and(|distributor| distributor.is_slot_live(self.slot))
    }

    /// Enables or disables `selector` for the linked component.
    ///
    /// Returns `false` and logs a warning when the link is stale. This is
    /// not asserted: dispatch walks a snapshot, so a component deregistered
    /// earlier in the same pass still receives the event and may try to
    /// register from its handler.
    pub fn register_event(&self, selector: impl Into<EventSelector>, enable: bool) -> bool {
        let selector = selector.into();
        let registered = self
            .distributor()
            .is_some_and(|distributor| distributor.register_event_for_slot(self.slot, selector, enable));
        if !registered {
            tracing::warn!(
                entity = %self.entity,
                ?selector,
                enable,
                "event registration through a stale distributor link"
            );
        }
        registered
    }

    /// Upgrades to a strong distributor handle.
    #[must_use]
    pub fn distributor(&self) -> Option<EventDistributor> {
        self.state.upgrade().map(EventDistributor::from_state)
    }
}

impl fmt::Debug for DistributorLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributorLink")
            .field("entity", &self.entity)
            .field("slot", &self.slot)
            .field("attached", &(self.state.strong_count() > 0))
            .finish()
    }
}

/// Interior-mutable link storage for component implementations.
///
/// Clones the link out before calling the distributor, so a component may
/// be rebound or unbound while its own registration call is in flight.
#[derive(Default)]
pub struct LinkCell(RefCell<Option<DistributorLink>>);

impl LinkCell {
    /// Empty cell.
    #[must_use]
    pub const fn new() -> Self {
        Self(RefCell::new(None))
    }

    /// Replaces the stored link. Intended for `set_distributor`.
    pub fn set(&self, link: Option<DistributorLink>) {
        *self.0.borrow_mut() = link;
    }

    /// Copy of the stored link.
    #[must_use]
    pub fn get(&self) -> Option<DistributorLink> {
        self.0.borrow().clone()
    }

    /// Whether a link is stored.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.0.borrow().is_some()
    }

    /// Entity of the stored link.
    #[must_use]
    pub fn entity_id(&self) -> Option<EntityId> {
        self.0.borrow().as_ref().map(DistributorLink::entity_id)
    }

    /// Registers through the stored link.
    ///
    /// Without a link this logs a warning and returns `false` instead of
    /// asserting: a component unbound mid-dispatch still sees the rest of
    /// the pass.
    pub fn register_event(&self, selector: impl Into<EventSelector>, enable: bool) -> bool {
        let Some(link) = self.get() else {
            tracing::warn!("event registration on a component without a distributor");
            return false;
        };
        link.register_event(selector, enable)
    }
}

impl fmt::Debug for LinkCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LinkCell").field(&self.get()).finish()
    }
}
