//! Subscriptions and the comparator that orders them for one dispatch pass.

use std::cmp::{Ordering, Reverse};

use super::policy::DispatchOrder;
use crate::ecs::{ComponentHandle, EntityId, EventKind, EventPriority};
use crate::memory::SaltHandle;

/// One (entity, component) pair's interest in an event kind.
///
/// Equality is entity id plus component identity; the registry slot is only
/// carried along as the final ordering key.
#[derive(Clone, Debug)]
pub struct Subscription {
    pub(crate) entity: EntityId,
    pub(crate) component: ComponentHandle,
    pub(crate) slot: SaltHandle,
}

impl Subscription {
    pub(crate) fn new(entity: EntityId, component: ComponentHandle, slot: SaltHandle) -> Self {
        Self {
            entity,
            component,
            slot,
        }
    }

    /// Entity the subscription was registered under.
    #[inline]
    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Subscribed component.
    #[inline]
    #[must_use]
    pub fn component(&self) -> &ComponentHandle {
        &self.component
    }
}

impl PartialEq for Subscription {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity && self.component.ptr_eq(&other.component)
    }
}

impl Eq for Subscription {}

type SortKey = (Reverse<i64>, Reverse<i64>, SaltHandle);

/// Total order over the subscriptions of a single event kind.
///
/// Two levels (priority and entity id, in the order the strategy picks),
/// both descending, then the registry slot ascending so no two distinct
/// subscriptions ever tie.
#[derive(Clone, Copy, Debug)]
pub struct EventPriorityOrder {
    kind: EventKind,
    order: DispatchOrder,
}

impl EventPriorityOrder {
    /// Comparator for `kind` under `order`.
    #[must_use]
    pub const fn new(kind: EventKind, order: DispatchOrder) -> Self {
        Self { kind, order }
    }

    fn key(&self, subscription: &Subscription) -> SortKey {
        let priority = i64::from(subscription.component.event_priority(self.kind).0);
        let entity = i64::from(subscription.entity.raw());
        match self.order {
            DispatchOrder::PriorityFirst => {
                (Reverse(priority), Reverse(entity), subscription.slot)
            }
            DispatchOrder::EntityFirst => (Reverse(entity), Reverse(priority), subscription.slot),
        }
    }

    /// Compares two subscriptions. `Less` is dispatched first.
    #[must_use]
    pub fn compare(&self, a: &Subscription, b: &Subscription) -> Ordering {
        self.key(a).cmp(&self.key(b))
    }

    /// Sorts in place. Each component's priority is queried once.
    pub fn sort(&self, subscriptions: &mut [Subscription]) {
        subscriptions.sort_by_cached_key(|subscription| self.key(subscription));
    }

    /// Priority the comparator sees for `subscription`.
    #[must_use]
    pub fn priority_of(&self, subscription: &Subscription) -> EventPriority {
        subscription.component.event_priority(self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributor::DistributorLink;
    use crate::ecs::{Component, EntityEvent};

    struct Fixed(i32);

    impl Component for Fixed {
        fn process_event(&self, _event: &EntityEvent) {}

        fn event_priority(&self, _kind: EventKind) -> EventPriority {
            EventPriority(self.0)
        }

        fn set_distributor(&self, _link: Option<DistributorLink>) {}
    }

    fn sub(entity: u32, priority: i32, slot: u16) -> Subscription {
        Subscription::new(
            EntityId::from_raw(entity),
            ComponentHandle::new(Fixed(priority)),
            SaltHandle::from_parts(slot, 1),
        )
    }

    #[test]
    fn test_priority_first() {
        let order = EventPriorityOrder::new(EventKind::Timer, DispatchOrder::PriorityFirst);
        let mut subs = vec![sub(1, 10, 0), sub(2, 5, 1), sub(3, 10, 2)];
        order.sort(&mut subs);

        let entities: Vec<u32> = subs.iter().map(|s| s.entity().raw()).collect();
        assert_eq!(entities, vec![3, 1, 2]);
    }

    #[test]
    fn test_entity_first() {
        let order = EventPriorityOrder::new(EventKind::Timer, DispatchOrder::EntityFirst);
        let mut subs = vec![sub(1, 10, 0), sub(2, 5, 1), sub(3, 10, 2)];
        order.sort(&mut subs);

        let entities: Vec<u32> = subs.iter().map(|s| s.entity().raw()).collect();
        assert_eq!(entities, vec![3, 2, 1]);
    }

    #[test]
    fn test_distinct_subscriptions_never_tie() {
        let order = EventPriorityOrder::new(EventKind::Timer, DispatchOrder::PriorityFirst);
        let a = sub(42, 20, 0);
        let b = sub(42, 20, 1);
        assert_eq!(order.compare(&a, &b), Ordering::Less);
        assert_eq!(order.compare(&b, &a), Ordering::Greater);
        assert_eq!(order.compare(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_equality_is_entity_and_identity() {
        let a = sub(1, 0, 0);
        let mut same = a.clone();
        same.slot = SaltHandle::from_parts(9, 9);
        assert_eq!(a, same);

        let other_component = sub(1, 0, 0);
        assert_ne!(a, other_component);
    }
}
