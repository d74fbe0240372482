//! # Event Distributor
//!
//! Owns the subscription tables, the registration registry and the pending
//! remap table, and routes every [`EntityEvent`] to its subscribers in the
//! order the active [`DistributorPolicy`] defines.
//!
//! The distributor is single-threaded. No `RefCell` borrow is held while a
//! component runs, so handlers may call back into any operation here;
//! changes apply from the next dispatch.

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;

use super::link::DistributorLink;
use super::policy::DistributorPolicy;
use super::registry::{Registration, RegistrationRegistry};
use super::remap::EntityIdRemapTable;
use super::subscription::{EventPriorityOrder, Subscription};
use super::table::SubscriptionTables;
use crate::config::DistributorConfig;
use crate::ecs::{
    ComponentHandle, Entity, EntityEvent, EntityId, EventKind, EventMask, EventPriority,
    EventSelector,
};
use crate::error::CoreResult;
use crate::memory::SaltHandle;

/// Default bound on pending remaps, matching the default entity pool.
pub const DEFAULT_POOL_CAPACITY: usize = 256;

/// Default initial capacity of the dispatch scratch buffer.
pub const DEFAULT_SCRATCH_CAPACITY: usize = 64;

/// Snapshot of the distributor's bookkeeping sizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DistributorStats {
    /// Event kinds with at least one subscriber.
    pub tables: usize,
    /// Subscriptions across all tables.
    pub subscriptions: usize,
    /// Tracked (entity, component) pairs.
    pub components: usize,
    /// Pending entity-id remaps.
    pub pending_remaps: usize,
}

pub(crate) struct DistributorState {
    policy: DistributorPolicy,
    tables: SubscriptionTables,
    registry: RegistrationRegistry,
    remaps: EntityIdRemapTable,
    /// Reused across dispatches; taken while a dispatch runs.
    scratch: Vec<Subscription>,
}

impl DistributorState {
    /// Turns one kind on or off for the registration in `slot`.
    fn set_kind(&mut self, slot: SaltHandle, kind: EventKind, enable: bool) -> bool {
        let Some(registration) = self.registry.get_mut(slot) else {
            return false;
        };

        if enable {
            if !registration.events.insert(kind) {
                return false;
            }
            let subscription =
                Subscription::new(registration.entity, registration.component.clone(), slot);
            self.tables.enable(kind, subscription)
        } else {
            if !registration.events.remove(kind) {
                return false;
            }
            let component = registration.component.clone();
            self.tables.disable(kind, &component).is_some()
        }
    }

    fn set_selector(&mut self, slot: SaltHandle, selector: EventSelector, enable: bool) {
        for kind in selector.kinds() {
            self.set_kind(slot, kind, enable);
        }
    }

    /// Id under which `component` is tracked for `entity`.
    ///
    /// Follows a pending remap only when the component actually moved to the
    /// remap target, so a fresh entity reissued under a pooled entity's old
    /// id keeps its own registrations.
    fn resolve_tracked(&self, entity: EntityId, component: &ComponentHandle) -> EntityId {
        match self.remaps.target_of(entity) {
            Some(current) if self.registry.find(current, component).is_some() => current,
            _ => entity,
        }
    }

    /// Removes every subscription of the registration in `slot`.
    fn disable_all(&mut self, slot: SaltHandle) {
        let Some(registration) = self.registry.get_mut(slot) else {
            return;
        };
        let events = mem::replace(&mut registration.events, EventMask::EMPTY);
        let component = registration.component.clone();
        for kind in events.iter() {
            self.tables.disable(kind, &component);
        }
    }
}

/// Routes entity events to subscribed components.
///
/// Cloning yields another handle to the same distributor.
///
/// # Example
///
/// ```rust,ignore
/// let distributor = EventDistributor::new(DistributorPolicy::default());
/// let physics = ComponentHandle::new(Physics::default());
///
/// distributor.register_event(entity, &physics, EventKind::PrePhysicsUpdate, true);
/// distributor.send_event(&EntityEvent::new(EventKind::PrePhysicsUpdate));
/// ```
#[derive(Clone)]
pub struct EventDistributor {
    inner: Rc<RefCell<DistributorState>>,
}

impl EventDistributor {
    /// Creates a distributor sized for the default entity pool.
    #[must_use]
    pub fn new(policy: DistributorPolicy) -> Self {
        Self::with_capacities(policy, DEFAULT_POOL_CAPACITY, DEFAULT_SCRATCH_CAPACITY)
    }

    /// Creates a distributor whose remap table is bounded by `pool_capacity`.
    #[must_use]
    pub fn with_pool_capacity(policy: DistributorPolicy, pool_capacity: usize) -> Self {
        Self::with_capacities(policy, pool_capacity, DEFAULT_SCRATCH_CAPACITY)
    }

    /// Creates a distributor from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns the validation error if `config` is out of range.
    pub fn from_config(config: &DistributorConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self::with_capacities(
            config.policy,
            config.pool.capacity,
            config.dispatch.scratch_capacity,
        ))
    }

    fn with_capacities(
        policy: DistributorPolicy,
        pool_capacity: usize,
        scratch_capacity: usize,
    ) -> Self {
        let state = DistributorState {
            policy,
            tables: SubscriptionTables::new(),
            registry: RegistrationRegistry::new(),
            remaps: EntityIdRemapTable::new(pool_capacity),
            scratch: Vec::with_capacity(scratch_capacity),
        };
        Self {
            inner: Rc::new(RefCell::new(state)),
        }
    }

    pub(crate) fn from_state(inner: Rc<RefCell<DistributorState>>) -> Self {
        Self { inner }
    }

    fn link(&self, slot: SaltHandle, entity: EntityId) -> DistributorLink {
        DistributorLink::new(Rc::downgrade(&self.inner), slot, entity)
    }

    /// Whether both handles refer to the same distributor.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Enables or disables `selector` for `component` on `entity`.
    ///
    /// Enabling on an untracked component starts tracking it and binds its
    /// back-reference. Disabling on an untracked component does nothing. A
    /// component already moved by a pending remap is found under its new id.
    pub fn register_event(
        &self,
        entity: impl Entity,
        component: &ComponentHandle,
        selector: impl Into<EventSelector>,
        enable: bool,
    ) {
        let selector = selector.into();

        let (entity, newly_tracked) = {
            let mut state = self.inner.borrow_mut();
            let entity = state.resolve_tracked(entity.id(), component);
            let (slot, newly_tracked) = match state.registry.find(entity, component) {
                Some(slot) => (slot, false),
                None if !enable => return,
                None => match state.registry.insert(entity, component.clone()) {
                    Some(slot) => (slot, true),
                    None => {
                        tracing::error!(%entity, "component registry full, registration dropped");
                        return;
                    }
                },
            };
            state.set_selector(slot, selector, enable);
            (entity, newly_tracked.then_some(slot))
        };

        tracing::debug!(%entity, ?selector, enable, "event registration");
        if let Some(slot) = newly_tracked {
            component.set_distributor(Some(self.link(slot, entity)));
        }
    }

    /// Link-side registration; `false` when the slot is stale.
    pub(crate) fn register_event_for_slot(
        &self,
        slot: SaltHandle,
        selector: EventSelector,
        enable: bool,
    ) -> bool {
        let mut state = self.inner.borrow_mut();
        if state.registry.get(slot).is_none() {
            return false;
        }
        state.set_selector(slot, selector, enable);
        true
    }

    pub(crate) fn is_slot_live(&self, slot: SaltHandle) -> bool {
        self.inner.borrow().registry.get(slot).is_some()
    }

    /// Toggles `selector` for every component tracked under `entity`.
    ///
    /// Returns how many components were touched.
    pub fn enable_event_for_entity(
        &self,
        entity: EntityId,
        selector: impl Into<EventSelector>,
        enable: bool,
    ) -> usize {
        let selector = selector.into();
        let mut state = self.inner.borrow_mut();
        let slots = state.registry.handles_for(entity);
        for slot in &slots {
            state.set_selector(*slot, selector, enable);
        }
        slots.len()
    }

    /// Starts tracking `component` under `entity` and binds its back-reference.
    ///
    /// Returns `false` if the pair was already tracked, including under the
    /// target of a pending remap of `entity`.
    pub fn register_component(&self, entity: impl Entity, component: &ComponentHandle) -> bool {
        let entity = entity.id();
        let slot = {
            let mut state = self.inner.borrow_mut();
            let tracked = state.resolve_tracked(entity, component);
            if state.registry.find(tracked, component).is_some() {
                return false;
            }
            match state.registry.insert(entity, component.clone()) {
                Some(slot) => slot,
                None => {
                    tracing::error!(%entity, "component registry full, registration dropped");
                    return false;
                }
            }
        };

        tracing::debug!(%entity, component = ?component, "component registered");
        component.set_distributor(Some(self.link(slot, entity)));
        true
    }

    /// Stops tracking `component`: disables every kind it subscribed to and
    /// clears its back-reference.
    ///
    /// `entity` is resolved through the pending remaps first. Once nothing
    /// is left under the resolved id its pending remap is dropped. A pair
    /// that is not tracked is left alone and yields `false`.
    pub fn deregister_component(&self, entity: impl Entity, component: &ComponentHandle) -> bool {
        let removed = {
            let mut state = self.inner.borrow_mut();
            let entity = state.resolve_tracked(entity.id(), component);
            let Some(slot) = state.registry.find(entity, component) else {
                return false;
            };
            state.disable_all(slot);
            let removed = state.registry.remove(slot);
            if state.registry.first_for(entity).is_none() {
                state.remaps.erase_current(entity);
            }
            removed
        };

        match removed {
            Some(registration) => {
                tracing::debug!(entity = %registration.entity, "component deregistered");
                unbind(registration);
                true
            }
            None => false,
        }
    }

    /// Tears down every registration tracked under `entity`.
    ///
    /// The id is taken as given: a pooled entity remapped away from it is
    /// not touched. A pending remap that ends at `entity` is dropped.
    pub fn on_entity_deleted(&self, entity: EntityId) {
        {
            let mut state = self.inner.borrow_mut();
            state.remaps.erase_current(entity);
            for slot in state.registry.handles_for(entity) {
                state.disable_all(slot);
            }
        }

        let mut removed = 0usize;
        loop {
            // Unbinding may re-enter, so the entry list is re-read every step.
            let registration = {
                let mut state = self.inner.borrow_mut();
                let Some(slot) = state.registry.first_for(entity) else {
                    break;
                };
                state.registry.remove(slot)
            };
            let Some(registration) = registration else {
                break;
            };
            unbind(registration);
            removed += 1;
        }

        if removed > 0 {
            tracing::debug!(%entity, components = removed, "entity registrations released");
        }
    }

    /// Moves every registration of `old` to `new` after a pooled reuse.
    ///
    /// Events registered under `old` are disabled; components are rebound
    /// with the new id and re-register what they need.
    pub fn remap_entity_id(&self, old: EntityId, new: EntityId) {
        if old == new {
            return;
        }

        let rebinds: Vec<(SaltHandle, ComponentHandle)> = {
            let mut state = self.inner.borrow_mut();
            for slot in state.registry.handles_for(old) {
                state.disable_all(slot);
            }
            let moved = state.registry.rekey(old, new);
            let outcome = state.remaps.remap(old, new);
            tracing::debug!(%old, %new, ?outcome, components = moved.len(), "entity id remapped");

            moved
                .into_iter()
                .filter_map(|slot| {
                    state
                        .registry
                        .get(slot)
                        .map(|registration| (slot, registration.component.clone()))
                })
                .collect()
        };

        for (slot, component) in rebinds {
            component.set_distributor(Some(self.link(slot, new)));
        }
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    /// Delivers `event` to every subscriber of its kind, in policy order.
    pub fn send_event(&self, event: &EntityEvent) {
        let guard = {
            let mut state = self.inner.borrow_mut();
            if !state.policy.enabled {
                return;
            }
            let policy = state.policy;
            let mut buffer = mem::take(&mut state.scratch);
            if !state.tables.snapshot(event.kind, policy, &mut buffer) {
                state.scratch = buffer;
                return;
            }
            ScratchGuard {
                state: &self.inner,
                buffer,
            }
        };

        tracing::trace!(kind = ?event.kind, subscribers = guard.buffer.len(), "dispatching event");
        for subscription in &guard.buffer {
            subscription.component.process_event(event);
        }
    }

    // -------------------------------------------------------------------------
    // Policy & lifecycle
    // -------------------------------------------------------------------------

    /// Drops every table, registration and pending remap, and unbinds every
    /// tracked component.
    pub fn reset(&self) {
        let drained = {
            let mut state = self.inner.borrow_mut();
            state.tables.clear();
            state.remaps.clear();
            state.registry.drain()
        };
        tracing::debug!(components = drained.len(), "distributor reset");
        for registration in drained {
            unbind(registration);
        }
    }

    /// Active policy.
    #[must_use]
    pub fn policy(&self) -> DistributorPolicy {
        self.inner.borrow().policy
    }

    /// Switches policy. Every table is re-sorted before its next dispatch.
    pub fn set_policy(&self, policy: DistributorPolicy) {
        let mut state = self.inner.borrow_mut();
        if state.policy == policy {
            return;
        }
        state.policy = policy;
        state.tables.mark_all_dirty();
        tracing::debug!(bits = policy.to_bits(), "distributor policy changed");
    }

    /// Whether dispatch is active.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.borrow().policy.enabled
    }

    // -------------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------------

    /// Bookkeeping sizes.
    #[must_use]
    pub fn stats(&self) -> DistributorStats {
        let state = self.inner.borrow();
        DistributorStats {
            tables: state.tables.table_count(),
            subscriptions: state.tables.subscription_count(),
            components: state.registry.len(),
            pending_remaps: state.remaps.len(),
        }
    }

    /// Subscribers of `kind` in the order the next dispatch would use.
    ///
    /// Sorts the table if needed, so component priorities are queried.
    #[must_use]
    pub fn subscribers(&self, kind: EventKind) -> Vec<(EntityId, EventPriority)> {
        let mut state = self.inner.borrow_mut();
        let policy = state.policy;
        if !state.tables.sort_if_needed(kind, policy) {
            return Vec::new();
        }
        let order = EventPriorityOrder::new(kind, policy.order);
        state.tables.get(kind).map_or_else(Vec::new, |table| {
            table
                .iter()
                .map(|subscription| (subscription.entity(), order.priority_of(subscription)))
                .collect()
        })
    }

    /// Whether `component` is tracked under `entity`.
    #[must_use]
    pub fn is_registered(&self, entity: EntityId, component: &ComponentHandle) -> bool {
        self.inner.borrow().registry.find(entity, component).is_some()
    }

    /// Kinds `component` currently subscribes to under `entity`.
    #[must_use]
    pub fn registered_events(&self, entity: EntityId, component: &ComponentHandle) -> EventMask {
        let state = self.inner.borrow();
        state
            .registry
            .find(entity, component)
            .and_then(|slot| state.registry.get(slot))
            .map_or(EventMask::EMPTY, |registration| registration.events)
    }

    /// Pending `(original, current)` remap pairs.
    #[must_use]
    pub fn pending_remaps(&self) -> Vec<(EntityId, EntityId)> {
        self.inner.borrow().remaps.iter().collect()
    }

    /// Capacity of the idle dispatch scratch buffer.
    #[must_use]
    pub fn scratch_capacity(&self) -> usize {
        self.inner.borrow().scratch.capacity()
    }
}

impl Default for EventDistributor {
    fn default() -> Self {
        Self::new(DistributorPolicy::default())
    }
}

impl fmt::Debug for EventDistributor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(state) => f
                .debug_struct("EventDistributor")
                .field("policy", &state.policy)
                .field("tables", &state.tables.table_count())
                .field("components", &state.registry.len())
                .field("entities", &state.registry.entity_count())
                .field("pending_remaps", &state.remaps.len())
                .finish(),
            Err(_) => f.write_str("EventDistributor { <borrowed> }"),
        }
    }
}

/// Clears the back-reference of a registration that left the registry.
fn unbind(registration: Registration) {
    registration.component.set_distributor(None);
}

/// Returns the dispatch buffer to the distributor, also on unwind.
struct ScratchGuard<'a> {
    state: &'a RefCell<DistributorState>,
    buffer: Vec<Subscription>,
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        // Release component handles before touching the state.
        self.buffer.clear();
        if let Ok(mut state) = self.state.try_borrow_mut() {
            if state.scratch.capacity() < self.buffer.capacity() {
                state.scratch = mem::take(&mut self.buffer);
            }
        }
    }
}
