//! # Component Contract
//!
//! Components are behavior objects attached to an entity. The distributor
//! only needs three things from them: handle an event, report a priority for
//! an event kind, and accept (or drop) a back-reference to the distributor.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

use super::event::{EntityEvent, EventKind, EventPriority};
use crate::distributor::DistributorLink;

/// Capability set every event-receiving component implements.
///
/// All methods take `&self`; components keep mutable state behind interior
/// mutability because the distributor calls them through shared handles.
///
/// # Example
///
/// ```rust,ignore
/// struct Physics {
///     link: LinkCell,
///     steps: Cell<u32>,
/// }
///
/// impl Component for Physics {
///     fn process_event(&self, event: &EntityEvent) {
///         if event.kind == EventKind::PrePhysicsUpdate {
///             self.steps.set(self.steps.get() + 1);
///         }
///     }
///
///     fn event_priority(&self, _kind: EventKind) -> EventPriority {
///         EventPriority::PHYSICS
///     }
///
///     fn set_distributor(&self, link: Option<DistributorLink>) {
///         self.link.set(link);
///     }
/// }
/// ```
pub trait Component {
    /// Handles one event of a kind this component subscribed to.
    ///
    /// May call back into the distributor; changes take effect from the next
    /// dispatch.
    fn process_event(&self, event: &EntityEvent);

    /// Priority of this component for `kind`. Higher is dispatched first.
    ///
    /// Queried while the distributor sorts, so it must not call back into the
    /// distributor.
    fn event_priority(&self, kind: EventKind) -> EventPriority {
        let _ = kind;
        EventPriority::DEFAULT
    }

    /// Stores (`Some`) or clears (`None`) the back-reference used to
    /// self-register future events.
    fn set_distributor(&self, link: Option<DistributorLink>);
}

/// Shared-ownership handle to a component instance.
///
/// Equality and hashing use the identity of the pointed-to component, never
/// its contents.
#[derive(Clone)]
pub struct ComponentHandle(Rc<dyn Component>);

impl ComponentHandle {
    /// Wraps a component in a new handle.
    #[must_use]
    pub fn new<C: Component + 'static>(component: C) -> Self {
        Self(Rc::new(component))
    }

    /// Identity address of the component.
    #[inline]
    #[must_use]
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }

    /// Checks whether both handles point at the same component.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }

    /// Number of strong handles currently keeping the component alive.
    #[inline]
    #[must_use]
    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl<C: Component + 'static> From<Rc<C>> for ComponentHandle {
    fn from(component: Rc<C>) -> Self {
        Self(component)
    }
}

impl From<Rc<dyn Component>> for ComponentHandle {
    fn from(component: Rc<dyn Component>) -> Self {
        Self(component)
    }
}

impl Deref for ComponentHandle {
    type Target = dyn Component;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for ComponentHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ComponentHandle {}

impl Hash for ComponentHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentHandle({:#x})", self.addr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inert;

    impl Component for Inert {
        fn process_event(&self, _event: &EntityEvent) {}

        fn set_distributor(&self, _link: Option<DistributorLink>) {}
    }

    #[test]
    fn test_identity_equality() {
        let a = ComponentHandle::new(Inert);
        let b = ComponentHandle::new(Inert);
        let a2 = a.clone();

        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(a.strong_count(), 2);
    }

    #[test]
    fn test_default_priority() {
        let handle = ComponentHandle::new(Inert);
        assert_eq!(handle.event_priority(EventKind::Timer), EventPriority::DEFAULT);
    }

    #[test]
    fn test_from_rc_keeps_identity() {
        let rc = Rc::new(Inert);
        let handle = ComponentHandle::from(Rc::clone(&rc));
        assert_eq!(handle.addr(), Rc::as_ptr(&rc) as usize);
    }
}
