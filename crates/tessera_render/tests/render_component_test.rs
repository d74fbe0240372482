//! Integration test for the render component under the event distributor.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use tessera_core::{
    Component, ComponentHandle, DistributorLink, DistributorPolicy, EntityEvent, EntityId,
    EntityPool, EventDistributor, EventKind, EventPriority, XformFlags,
};
use tessera_render::{
    Aabb, DrawSink, GeometryId, InlineExecutor, MaterialId, RenderComponent, RenderFlags,
    RenderMode, RenderPass, SceneRegistrar, Slot, SlotContent, ThreadExecutor, RENDER_EVENTS,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, PartialEq)]
enum SceneOp {
    Register(EntityId, Aabb),
    Unregister(EntityId),
}

#[derive(Default)]
struct RecordingScene {
    ops: RefCell<Vec<SceneOp>>,
}

impl RecordingScene {
    fn take(&self) -> Vec<SceneOp> {
        self.ops.borrow_mut().drain(..).collect()
    }
}

impl SceneRegistrar for RecordingScene {
    fn register(&self, entity: EntityId, bounds: Aabb) {
        self.ops.borrow_mut().push(SceneOp::Register(entity, bounds));
    }

    fn unregister(&self, entity: EntityId) {
        self.ops.borrow_mut().push(SceneOp::Unregister(entity));
    }
}

#[derive(Default)]
struct RenderCounter {
    frames: RefCell<Vec<i64>>,
}

impl Component for RenderCounter {
    fn process_event(&self, event: &EntityEvent) {
        if event.kind == EventKind::Render {
            self.frames.borrow_mut().push(event.n_param[0]);
        }
    }

    fn set_distributor(&self, _link: Option<DistributorLink>) {}
}

fn unit() -> Aabb {
    Aabb::from_min_max([0.0; 3], [1.0; 3])
}

struct Fixture {
    distributor: EventDistributor,
    scene: Rc<RecordingScene>,
    render: Rc<RenderComponent>,
    entity: EntityId,
}

fn fixture() -> Fixture {
    init_tracing();
    let distributor = EventDistributor::new(DistributorPolicy::default());
    let scene = Rc::new(RecordingScene::default());
    let render = Rc::new(RenderComponent::new(scene.clone()));
    render.set_slot(0, Slot::geometry(GeometryId(1), unit()));

    let entity = EntityId::from_raw(42);
    RenderComponent::attach(&render, entity, &distributor);
    scene.take();

    Fixture {
        distributor,
        scene,
        render,
        entity,
    }
}

#[test]
fn test_binding_subscribes_render_events() {
    let f = fixture();
    for kind in RENDER_EVENTS {
        assert_eq!(
            f.distributor.subscribers(kind),
            vec![(f.entity, EventPriority::RENDER)],
            "{kind:?}"
        );
    }
    assert!(f.distributor.subscribers(EventKind::PrePhysicsUpdate).is_empty());
    assert_eq!(f.render.entity_id(), f.entity);
    assert!(f.render.flags().contains(RenderFlags::REGISTERED));
}

#[test]
fn test_hide_and_unhide_toggle_scene_registration() {
    let f = fixture();

    f.distributor.send_event(&EntityEvent::new(EventKind::Hide));
    assert!(f.render.is_hidden());
    assert_eq!(f.scene.take(), vec![SceneOp::Unregister(f.entity)]);

    // Already hidden: no further scene traffic.
    f.distributor.send_event(&EntityEvent::new(EventKind::Invisible));
    assert!(f.scene.take().is_empty());

    f.distributor.send_event(&EntityEvent::new(EventKind::Visible));
    assert!(!f.render.is_hidden());
    assert_eq!(f.scene.take(), vec![SceneOp::Register(f.entity, unit())]);
}

#[test]
fn test_xform_reregisters_unless_suppressed() {
    let f = fixture();
    f.render.set_world_position([3.0, 0.0, 0.0]);

    let suppressed = EntityEvent::new(EventKind::Xform).with_int(0, XformFlags::NOT_REREGISTER);
    f.distributor.send_event(&suppressed);
    assert!(f.scene.take().is_empty());
    assert_eq!(f.render.world_bounds(), unit());

    let moved = EntityEvent::new(EventKind::Xform).with_int(0, XformFlags::POSITION);
    f.distributor.send_event(&moved);
    let expected = unit().translate([3.0, 0.0, 0.0]);
    assert_eq!(f.scene.take(), vec![SceneOp::Register(f.entity, expected)]);
    assert_eq!(f.render.proxy().read().bounds, expected);
    assert_eq!(f.render.slot(0).map(|slot| slot.events_seen()), Some(2));
}

#[test]
fn test_material_anim_timeout_reset() {
    let f = fixture();
    f.render.set_slot(1, Slot::new(SlotContent::Character(5), unit()));

    f.distributor
        .send_event(&EntityEvent::new(EventKind::Material).with_int(0, 77));
    assert_eq!(f.render.custom_material(), Some(MaterialId(77)));
    assert_eq!(f.render.proxy().read().material, Some(MaterialId(77)));

    f.distributor.send_event(&EntityEvent::new(EventKind::AnimEvent));
    assert_eq!(f.render.slot(1).map(|slot| slot.effects_spawned()), Some(1));

    f.distributor.send_event(&EntityEvent::new(EventKind::Hide));
    f.distributor.send_event(&EntityEvent::new(EventKind::AnimEvent));
    assert_eq!(f.render.slot(1).map(|slot| slot.effects_spawned()), Some(1));

    f.distributor.send_event(&EntityEvent::new(EventKind::NotSeenTimeout));
    assert_eq!(f.render.slot(0).map(|slot| slot.resources_loaded()), Some(false));

    f.render.set_silhouette(0xFF00_FF00);
    f.distributor.send_event(&EntityEvent::new(EventKind::Reset));
    assert_eq!(f.render.custom_material(), None);
    assert_eq!(f.render.silhouette(), 0);
}

#[test]
fn test_queued_geometry_applies_on_pre_physics_once() {
    let f = fixture();
    let bigger = Aabb::from_min_max([0.0; 3], [4.0; 3]);

    f.render.queue_slot_geometry_change(0, GeometryId(9), bigger);
    assert_eq!(f.render.queued_geometry_changes(), 1);
    assert_eq!(f.distributor.subscribers(EventKind::PrePhysicsUpdate).len(), 1);

    f.distributor.send_event(&EntityEvent::new(EventKind::PrePhysicsUpdate));
    assert_eq!(f.render.queued_geometry_changes(), 0);
    assert_eq!(
        f.render.slot(0).map(|slot| slot.content),
        Some(SlotContent::Geometry(GeometryId(9)))
    );
    assert_eq!(f.render.world_bounds(), bigger);
    assert!(f.distributor.subscribers(EventKind::PrePhysicsUpdate).is_empty());
}

#[test]
fn test_render_runs_as_job_when_allowed() {
    let f = fixture();
    let sink = Arc::new(DrawSink::new());
    let executor = ThreadExecutor::new();

    let mode = f.render.render(RenderPass { frame: 1, shadow: false }, &executor, &sink);
    assert_eq!(mode, RenderMode::Job);
    assert_eq!(executor.wait(), 1);

    let calls = sink.take();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].entity, f.entity);
    assert_eq!(calls[0].frame, 1);
}

#[test]
fn test_characters_force_inline_and_render_event() {
    let f = fixture();
    f.render.set_slot(1, Slot::new(SlotContent::Character(5), unit()));
    f.render.set_send_render_event(true);

    let counter = Rc::new(RenderCounter::default());
    f.distributor.register_event(
        EntityId::from_raw(7),
        &ComponentHandle::from(counter.clone()),
        EventKind::Render,
        true,
    );

    let sink = Arc::new(DrawSink::new());
    let mode = f.render.render(RenderPass { frame: 4, shadow: false }, &InlineExecutor, &sink);
    assert_eq!(mode, RenderMode::Inline);
    assert_eq!(sink.len(), 2);
    assert_eq!(counter.frames.borrow().as_slice(), &[4]);

    // Hidden components neither draw nor notify.
    f.distributor.send_event(&EntityEvent::new(EventKind::Hide));
    f.render.render(RenderPass::default(), &InlineExecutor, &sink);
    assert_eq!(sink.len(), 2);
    assert_eq!(counter.frames.borrow().len(), 1);
}

#[test]
fn test_pool_reuse_resubscribes_under_new_id() {
    init_tracing();
    let mut pool = EntityPool::new(8);
    let distributor = EventDistributor::with_pool_capacity(DistributorPolicy::default(), 8);
    let scene = Rc::new(RecordingScene::default());
    let render = Rc::new(RenderComponent::new(scene.clone()));
    render.set_slot(0, Slot::geometry(GeometryId(1), unit()));

    let entity = pool.spawn().unwrap();
    RenderComponent::attach(&render, entity, &distributor);
    pool.return_to_pool(entity, &distributor).unwrap();
    scene.take();

    let reused = pool.reuse(entity, &distributor).unwrap();
    assert_eq!(render.entity_id(), reused);
    assert_eq!(
        scene.take(),
        vec![SceneOp::Unregister(entity), SceneOp::Register(reused, unit())]
    );
    assert_eq!(
        distributor.subscribers(EventKind::Hide),
        vec![(reused, EventPriority::RENDER)]
    );

    assert!(pool.despawn(reused, &distributor));
    assert_eq!(render.entity_id(), reused);
    assert!(!render.flags().contains(RenderFlags::REGISTERED));
    assert_eq!(scene.take(), vec![SceneOp::Unregister(reused)]);
}
