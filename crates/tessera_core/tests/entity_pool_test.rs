//! Integration test for pooled entity recycling through the distributor.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tessera_core::{
    Component, ComponentHandle, CoreError, DistributorConfig, DistributorLink, EntityEvent,
    EntityId, EntityPool, EventDistributor, EventKind, LinkCell,
};

/// Counts timers and remembers every `ReturningToPool` it saw.
#[derive(Default)]
struct Pooled {
    link: LinkCell,
    timers: Cell<u32>,
    returned: RefCell<Vec<i64>>,
}

impl Component for Pooled {
    fn process_event(&self, event: &EntityEvent) {
        match event.kind {
            EventKind::Timer => self.timers.set(self.timers.get() + 1),
            EventKind::ReturningToPool => self.returned.borrow_mut().push(event.n_param[0]),
            _ => {}
        }
    }

    fn set_distributor(&self, link: Option<DistributorLink>) {
        self.link.set(link);
    }
}

fn setup(capacity: usize) -> (EntityPool, EventDistributor) {
    let config = DistributorConfig::from_toml_str(&format!("[pool]\ncapacity = {capacity}\n"))
        .unwrap();
    let distributor = EventDistributor::from_config(&config).unwrap();
    (EntityPool::new(config.pool.capacity), distributor)
}

#[test]
fn test_return_and_reuse_keeps_component() {
    let (mut pool, distributor) = setup(8);
    let entity = pool.spawn().unwrap();
    let component = Rc::new(Pooled::default());
    let handle = ComponentHandle::from(Rc::clone(&component));

    distributor.register_event(entity, &handle, EventKind::Timer, true);
    distributor.register_event(entity, &handle, EventKind::ReturningToPool, true);

    pool.return_to_pool(entity, &distributor).unwrap();
    assert_eq!(*component.returned.borrow(), vec![i64::from(entity.raw())]);

    let reused = pool.reuse(entity, &distributor).unwrap();
    assert_eq!(reused.index(), entity.index());
    assert_ne!(reused.salt(), entity.salt());
    assert_eq!(component.link.entity_id(), Some(reused));

    // Events were disabled by the remap until the component re-registers.
    distributor.send_event(&EntityEvent::new(EventKind::Timer));
    assert_eq!(component.timers.get(), 0);

    component.link.register_event(EventKind::Timer, true);
    distributor.send_event(&EntityEvent::new(EventKind::Timer));
    assert_eq!(component.timers.get(), 1);

    // Teardown through the stale id still finds the reused entity.
    assert!(distributor.deregister_component(entity, &handle));
    assert_eq!(distributor.stats().components, 0);
}

#[test]
fn test_despawn_releases_registrations() {
    let (mut pool, distributor) = setup(8);
    let entity = pool.spawn().unwrap();
    let component = Rc::new(Pooled::default());
    let handle = ComponentHandle::from(Rc::clone(&component));
    distributor.register_event(entity, &handle, EventKind::Timer, true);

    assert!(pool.despawn(entity, &distributor));
    assert!(!component.link.is_bound());
    distributor.send_event(&EntityEvent::new(EventKind::Timer));
    assert_eq!(component.timers.get(), 0);
    assert_eq!(pool.alive_count(), 0);
}

#[test]
fn test_despawn_after_reuse_drops_pending_remap() {
    let (mut pool, distributor) = setup(4);
    let entity = pool.spawn().unwrap();
    let component = Rc::new(Pooled::default());
    let handle = ComponentHandle::from(Rc::clone(&component));
    distributor.register_component(entity, &handle);

    pool.return_to_pool(entity, &distributor).unwrap();
    let reused = pool.reuse(entity, &distributor).unwrap();
    assert_eq!(distributor.pending_remaps(), vec![(entity, reused)]);

    assert!(pool.despawn(reused, &distributor));
    assert!(distributor.pending_remaps().is_empty());
    assert!(!distributor.is_registered(reused, &handle));
}

#[test]
fn test_many_cycles_stay_bounded() {
    let (mut pool, distributor) = setup(4);
    let mut ids: Vec<EntityId> = (0..4).map(|_| pool.spawn().unwrap()).collect();

    for _ in 0..3 {
        for id in &mut ids {
            pool.return_to_pool(*id, &distributor).unwrap();
            *id = pool.reuse(*id, &distributor).unwrap();
        }
    }

    assert_eq!(pool.alive_count(), 4);
    assert!(distributor.stats().pending_remaps <= pool.capacity());
    assert!(matches!(pool.spawn(), Err(CoreError::PoolExhausted { capacity: 4 })));
}
