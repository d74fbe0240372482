//! Per-event-kind subscriber lists with lazy re-sorting.

use super::policy::{DistributorPolicy, ResortPolicy};
use super::subscription::{EventPriorityOrder, Subscription};
use crate::ecs::{ComponentHandle, EventKind};

/// Ordered subscribers of one event kind.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionTable {
    subscribers: Vec<Subscription>,
    /// Order is stale and must be recomputed before the next dispatch.
    dirty: bool,
}

impl SubscriptionTable {
    /// Appends `subscription` unless an equal one is present.
    fn add(&mut self, subscription: Subscription) -> bool {
        if self.subscribers.contains(&subscription) {
            return false;
        }
        self.subscribers.push(subscription);
        self.dirty = true;
        true
    }

    /// Removes the first subscription of `component`.
    fn remove(&mut self, component: &ComponentHandle) -> Option<Subscription> {
        let position = self
            .subscribers
            .iter()
            .position(|subscription| subscription.component.ptr_eq(component))?;
        // `remove` keeps the relative order of the rest, so a removal never
        // dirties the table.
        Some(self.subscribers.remove(position))
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, Subscription> {
        self.subscribers.iter()
    }
}

/// One optional table per [`EventKind`], plus the last-sorted marker.
#[derive(Debug)]
pub(crate) struct SubscriptionTables {
    tables: Vec<Option<SubscriptionTable>>,
    /// Kind of the table sorted most recently.
    last_sorted: Option<EventKind>,
}

impl SubscriptionTables {
    pub(crate) fn new() -> Self {
        Self {
            tables: (0..EventKind::COUNT).map(|_| None).collect(),
            last_sorted: None,
        }
    }

    pub(crate) fn get(&self, kind: EventKind) -> Option<&SubscriptionTable> {
        self.tables[kind.index()].as_ref()
    }

    /// Adds a subscription for `kind`, creating the table on first use.
    ///
    /// Returns `false` if the subscription was already present.
    pub(crate) fn enable(&mut self, kind: EventKind, subscription: Subscription) -> bool {
        self.tables[kind.index()]
            .get_or_insert_with(SubscriptionTable::default)
            .add(subscription)
    }

    /// Removes `component` from the `kind` table and frees the table once it
    /// is empty.
    pub(crate) fn disable(
        &mut self,
        kind: EventKind,
        component: &ComponentHandle,
    ) -> Option<Subscription> {
        let slot = &mut self.tables[kind.index()];
        let table = slot.as_mut()?;
        let removed = table.remove(component);
        if table.is_empty() {
            *slot = None;
            if self.last_sorted == Some(kind) {
                self.last_sorted = None;
            }
        }
        removed
    }

    /// Sorts the `kind` table if the policy or its state requires it.
    ///
    /// Returns `false` when there is no table for `kind`.
    pub(crate) fn sort_if_needed(&mut self, kind: EventKind, policy: DistributorPolicy) -> bool {
        let last_sorted = self.last_sorted;
        let Some(table) = self.tables[kind.index()].as_mut() else {
            return false;
        };

        let needs_sort = matches!(policy.resort, ResortPolicy::Always)
            || table.dirty
            || last_sorted != Some(kind);
        if needs_sort {
            EventPriorityOrder::new(kind, policy.order).sort(&mut table.subscribers);
            table.dirty = false;
            self.last_sorted = Some(kind);
            tracing::trace!(?kind, subscribers = table.len(), "subscriber table sorted");
        }
        true
    }

    /// Sorts if needed, then copies the subscriber order into `scratch`.
    ///
    /// Returns `false` (leaving `scratch` untouched) when no table exists.
    pub(crate) fn snapshot(
        &mut self,
        kind: EventKind,
        policy: DistributorPolicy,
        scratch: &mut Vec<Subscription>,
    ) -> bool {
        if !self.sort_if_needed(kind, policy) {
            return false;
        }
        if let Some(table) = self.tables[kind.index()].as_ref() {
            scratch.clear();
            scratch.extend(table.subscribers.iter().cloned());
        }
        true
    }

    /// Invalidates every cached order.
    pub(crate) fn mark_all_dirty(&mut self) {
        for table in self.tables.iter_mut().flatten() {
            table.dirty = true;
        }
        self.last_sorted = None;
    }

    pub(crate) fn clear(&mut self) {
        for table in &mut self.tables {
            *table = None;
        }
        self.last_sorted = None;
    }

    pub(crate) fn table_count(&self) -> usize {
        self.tables.iter().flatten().count()
    }

    pub(crate) fn subscription_count(&self) -> usize {
        self.tables.iter().flatten().map(SubscriptionTable::len).sum()
    }
}
