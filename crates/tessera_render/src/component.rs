//! # Render Component
//!
//! Event-driven render state of one entity: slots, bounds, visibility and
//! material overrides. Reacts to distributor events and publishes a
//! [`RenderProxy`] snapshot that render jobs draw from.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use parking_lot::RwLock;
use tessera_core::{
    Component, ComponentHandle, DistributorLink, EntityEvent, EntityId, EventDistributor,
    EventKind, EventPriority, LinkCell, XformFlags,
};

use crate::bounds::Aabb;
use crate::flags::RenderFlags;
use crate::job::JobExecutor;
use crate::proxy::{render_job_entry, DrawSink, RenderPass, RenderProxy, SharedProxy, SlotProxy};
use crate::scene::SceneRegistrar;
use crate::slot::{GeometryId, MaterialId, Slot};

/// Events a bound render component always subscribes to.
pub const RENDER_EVENTS: [EventKind; 9] = [
    EventKind::Xform,
    EventKind::Hide,
    EventKind::Unhide,
    EventKind::Invisible,
    EventKind::Visible,
    EventKind::Material,
    EventKind::AnimEvent,
    EventKind::NotSeenTimeout,
    EventKind::Reset,
];

/// Where [`RenderComponent::render`] ran the draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Scheduled on the job executor.
    Job,
    /// Drawn on the calling thread.
    Inline,
}

#[derive(Debug)]
struct QueuedGeometry {
    slot: usize,
    geometry: GeometryId,
    bounds: Aabb,
}

#[derive(Debug)]
struct RenderState {
    entity: EntityId,
    flags: RenderFlags,
    slots: Vec<Option<Slot>>,
    position: [f32; 3],
    bounds: Aabb,
    custom_material: Option<MaterialId>,
    opacity: Option<f32>,
    silhouette: u32,
    queued_geometry: Vec<QueuedGeometry>,
    shader_callbacks: usize,
}

impl RenderState {
    fn new() -> Self {
        Self {
            entity: EntityId::INVALID,
            flags: RenderFlags::BBOX_INVALID | RenderFlags::RECOMPUTE_EXECUTE_AS_JOB,
            slots: Vec::new(),
            position: [0.0; 3],
            bounds: Aabb::empty(),
            custom_material: None,
            opacity: None,
            silhouette: 0,
            queued_geometry: Vec::new(),
            shader_callbacks: 0,
        }
    }

    fn slots_changed(&mut self) {
        self.flags.insert(RenderFlags::RECOMPUTE_EXECUTE_AS_JOB);
    }

    fn recompute_bounds(&mut self) {
        let local = self
            .slots
            .iter()
            .flatten()
            .fold(Aabb::empty(), |bounds, slot| bounds.merge(&slot.local_bounds));
        self.bounds = local.translate(self.position);
        self.flags
            .set(RenderFlags::BBOX_INVALID, !self.bounds.is_valid());
    }

    /// Registers with the scene while visible, unregisters otherwise.
    fn sync_registration(&mut self, scene: &dyn SceneRegistrar) {
        let visible = self.entity.is_valid()
            && !self
                .flags
                .intersects(RenderFlags::HIDDEN | RenderFlags::BBOX_INVALID);
        if visible {
            scene.register(self.entity, self.bounds);
            self.flags.insert(RenderFlags::REGISTERED);
        } else if self.flags.contains(RenderFlags::REGISTERED) {
            scene.unregister(self.entity);
            self.flags.remove(RenderFlags::REGISTERED);
        }
    }

    fn invalidate_bounds(&mut self, scene: &dyn SceneRegistrar) {
        self.recompute_bounds();
        self.sync_registration(scene);
    }

    fn set_hidden(&mut self, hidden: bool, scene: &dyn SceneRegistrar) {
        if self.flags.contains(RenderFlags::HIDDEN) == hidden {
            return;
        }
        self.flags.set(RenderFlags::HIDDEN, hidden);
        self.invalidate_bounds(scene);
        tracing::debug!(entity = %self.entity, hidden, "render visibility changed");
    }

    fn put_slot(&mut self, index: usize, slot: Slot) {
        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index] = Some(slot);
        self.slots_changed();
    }

    fn apply_queued_geometry(&mut self) {
        for change in std::mem::take(&mut self.queued_geometry) {
            // The slot's material override survives a geometry swap.
            let material = self
                .slots
                .get(change.slot)
                .and_then(Option::as_ref)
                .and_then(|slot| slot.material);
            let mut slot = Slot::geometry(change.geometry, change.bounds);
            slot.material = material;
            self.put_slot(change.slot, slot);
        }
    }

    fn render_job_allowed(&self) -> bool {
        !self.slots.iter().flatten().any(Slot::blocks_render_job)
            && !self.flags.contains(RenderFlags::SEND_RENDER_EVENT)
            && self.shader_callbacks == 0
    }

    fn snapshot(&self) -> RenderProxy {
        RenderProxy {
            entity: self.entity,
            flags: self.flags,
            bounds: self.bounds,
            material: self.custom_material,
            opacity: self.opacity.unwrap_or(1.0),
            slots: self
                .slots
                .iter()
                .enumerate()
                .filter_map(|(index, slot)| {
                    slot.as_ref().map(|slot| SlotProxy {
                        index,
                        kind: slot.content.kind(),
                        material: slot.material,
                    })
                })
                .collect(),
        }
    }
}

/// Render component driven by entity events.
///
/// # Example
///
/// ```rust,ignore
/// let render = Rc::new(RenderComponent::new(scene));
/// render.set_slot(0, Slot::geometry(GeometryId(1), bounds));
/// let handle = RenderComponent::attach(&render, entity, &distributor);
///
/// distributor.send_event(&EntityEvent::new(EventKind::Hide));
/// assert!(render.is_hidden());
/// ```
pub struct RenderComponent {
    link: LinkCell,
    state: RefCell<RenderState>,
    proxy: SharedProxy,
    scene: Rc<dyn SceneRegistrar>,
}

impl RenderComponent {
    /// Creates an unbound component registering with `scene`.
    #[must_use]
    pub fn new(scene: Rc<dyn SceneRegistrar>) -> Self {
        Self {
            link: LinkCell::new(),
            state: RefCell::new(RenderState::new()),
            proxy: Arc::new(RwLock::new(RenderProxy::default())),
            scene,
        }
    }

    /// Registers `component` under `entity`. Binding subscribes it to
    /// [`RENDER_EVENTS`].
    pub fn attach(
        component: &Rc<Self>,
        entity: EntityId,
        distributor: &EventDistributor,
    ) -> ComponentHandle {
        let handle = ComponentHandle::from(Rc::clone(component));
        distributor.register_component(entity, &handle);
        handle
    }

    // -------------------------------------------------------------------------
    // Slots
    // -------------------------------------------------------------------------

    /// Places `slot` at `index`, replacing what was there.
    pub fn set_slot(&self, index: usize, slot: Slot) {
        {
            let mut state = self.state.borrow_mut();
            state.put_slot(index, slot);
            state.invalidate_bounds(&*self.scene);
        }
        self.publish();
    }

    /// Frees the slot at `index`.
    pub fn free_slot(&self, index: usize) -> Option<Slot> {
        let freed = {
            let mut state = self.state.borrow_mut();
            let freed = state.slots.get_mut(index).and_then(Option::take)?;
            state.slots_changed();
            state.invalidate_bounds(&*self.scene);
            freed
        };
        self.publish();
        Some(freed)
    }

    /// Copy of the slot at `index`.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<Slot> {
        self.state.borrow().slots.get(index).cloned().flatten()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.state.borrow().slots.iter().flatten().count()
    }

    /// Defers a geometry change to the next `PrePhysicsUpdate`.
    pub fn queue_slot_geometry_change(&self, slot: usize, geometry: GeometryId, bounds: Aabb) {
        self.state.borrow_mut().queued_geometry.push(QueuedGeometry {
            slot,
            geometry,
            bounds,
        });
        self.link.register_event(EventKind::PrePhysicsUpdate, true);
    }

    // -------------------------------------------------------------------------
    // Entity-side state
    // -------------------------------------------------------------------------

    /// Stores the entity position; applied on the next `Xform`.
    pub fn set_world_position(&self, position: [f32; 3]) {
        self.state.borrow_mut().position = position;
    }

    /// Requests a `Render` event after every inline render.
    pub fn set_send_render_event(&self, enable: bool) {
        let mut state = self.state.borrow_mut();
        state.flags.set(RenderFlags::SEND_RENDER_EVENT, enable);
        state.slots_changed();
    }

    /// Installs a shader-parameter callback.
    pub fn install_shader_callback(&self) {
        let mut state = self.state.borrow_mut();
        state.shader_callbacks += 1;
        state.slots_changed();
    }

    /// Removes every shader-parameter callback.
    pub fn clear_shader_callbacks(&self) {
        let mut state = self.state.borrow_mut();
        state.shader_callbacks = 0;
        state.slots_changed();
    }

    /// Overrides opacity until the next `Reset`.
    pub fn set_opacity(&self, opacity: f32) {
        self.state.borrow_mut().opacity = Some(opacity.clamp(0.0, 1.0));
        self.publish();
    }

    /// Sets HUD silhouette parameters until the next `Reset`.
    pub fn set_silhouette(&self, params: u32) {
        self.state.borrow_mut().silhouette = params;
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Entity the component is bound to.
    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        self.state.borrow().entity
    }

    /// Current flags.
    #[must_use]
    pub fn flags(&self) -> RenderFlags {
        self.state.borrow().flags
    }

    /// Whether the component is hidden.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.flags().contains(RenderFlags::HIDDEN)
    }

    /// Entity-wide material override.
    #[must_use]
    pub fn custom_material(&self) -> Option<MaterialId> {
        self.state.borrow().custom_material
    }

    /// Opacity override.
    #[must_use]
    pub fn opacity(&self) -> Option<f32> {
        self.state.borrow().opacity
    }

    /// HUD silhouette parameters.
    #[must_use]
    pub fn silhouette(&self) -> u32 {
        self.state.borrow().silhouette
    }

    /// World-space bounds.
    #[must_use]
    pub fn world_bounds(&self) -> Aabb {
        self.state.borrow().bounds
    }

    /// Geometry changes waiting for `PrePhysicsUpdate`.
    #[must_use]
    pub fn queued_geometry_changes(&self) -> usize {
        self.state.borrow().queued_geometry.len()
    }

    /// Shared proxy render jobs read.
    #[must_use]
    pub fn proxy(&self) -> SharedProxy {
        Arc::clone(&self.proxy)
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    /// Whether [`Self::render`] may hand the draw to a worker job.
    ///
    /// Recomputed lazily after slot or flag changes. Characters, particle
    /// emitters, the send-render-event flag and shader callbacks all force
    /// inline rendering.
    pub fn can_execute_render_as_job(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.flags.contains(RenderFlags::RECOMPUTE_EXECUTE_AS_JOB) {
            let allowed = state.render_job_allowed();
            state.flags.set(RenderFlags::EXECUTE_AS_JOB, allowed);
            state.flags.remove(RenderFlags::RECOMPUTE_EXECUTE_AS_JOB);
        }
        state.flags.contains(RenderFlags::EXECUTE_AS_JOB)
    }

    /// Draws the published proxy into `sink`, on a job when allowed.
    pub fn render(&self, pass: RenderPass, executor: &dyn JobExecutor, sink: &Arc<DrawSink>) -> RenderMode {
        if self.can_execute_render_as_job() {
            let proxy = Arc::clone(&self.proxy);
            let sink = Arc::clone(sink);
            executor.execute(Box::new(move || {
                render_job_entry(&proxy, pass, &sink);
            }));
            return RenderMode::Job;
        }

        render_job_entry(&self.proxy, pass, sink);

        let flags = self.flags();
        let drawable = !flags.intersects(RenderFlags::HIDDEN | RenderFlags::BBOX_INVALID);
        if drawable && flags.contains(RenderFlags::SEND_RENDER_EVENT) {
            if let Some(distributor) = self.link.get().and_then(|link| link.distributor()) {
                let frame = i64::try_from(pass.frame).unwrap_or(i64::MAX);
                distributor.send_event(&EntityEvent::new(EventKind::Render).with_int(0, frame));
            }
        }
        RenderMode::Inline
    }

    fn publish(&self) {
        let snapshot = self.state.borrow().snapshot();
        *self.proxy.write() = snapshot;
    }
}

impl Component for RenderComponent {
    fn process_event(&self, event: &EntityEvent) {
        let geometry_applied = {
            let mut state = self.state.borrow_mut();
            let scene = &*self.scene;
            for slot in state.slots.iter_mut().flatten() {
                slot.on_entity_event(event);
            }

            match event.kind {
                EventKind::Xform => {
                    if event.n_param[0] & XformFlags::NOT_REREGISTER == 0 {
                        state.invalidate_bounds(scene);
                    }
                    false
                }
                EventKind::Hide | EventKind::Invisible => {
                    state.set_hidden(true, scene);
                    false
                }
                EventKind::Unhide | EventKind::Visible => {
                    state.set_hidden(false, scene);
                    false
                }
                EventKind::Material => {
                    state.custom_material = u32::try_from(event.n_param[0])
                        .ok()
                        .filter(|id| *id != 0)
                        .map(MaterialId);
                    false
                }
                EventKind::AnimEvent => {
                    if !state.flags.contains(RenderFlags::HIDDEN) {
                        for slot in state.slots.iter_mut().flatten() {
                            slot.on_anim_event();
                        }
                    }
                    false
                }
                EventKind::NotSeenTimeout => {
                    for slot in state.slots.iter_mut().flatten() {
                        slot.release_resources();
                    }
                    false
                }
                EventKind::Reset => {
                    state.custom_material = None;
                    state.opacity = None;
                    state.silhouette = 0;
                    false
                }
                EventKind::PrePhysicsUpdate => {
                    state.apply_queued_geometry();
                    state.invalidate_bounds(scene);
                    true
                }
                _ => false,
            }
        };

        if geometry_applied {
            self.link.register_event(EventKind::PrePhysicsUpdate, false);
        }
        self.publish();
    }

    fn event_priority(&self, _kind: EventKind) -> EventPriority {
        EventPriority::RENDER
    }

    fn set_distributor(&self, link: Option<DistributorLink>) {
        let Some(link) = link else {
            self.link.set(None);
            let mut state = self.state.borrow_mut();
            if state.flags.contains(RenderFlags::REGISTERED) {
                self.scene.unregister(state.entity);
                state.flags.remove(RenderFlags::REGISTERED);
            }
            drop(state);
            self.publish();
            return;
        };

        let queued = {
            let mut state = self.state.borrow_mut();
            let entity = link.entity_id();
            if state.entity != entity && state.flags.contains(RenderFlags::REGISTERED) {
                self.scene.unregister(state.entity);
                state.flags.remove(RenderFlags::REGISTERED);
            }
            state.entity = entity;
            state.sync_registration(&*self.scene);
            !state.queued_geometry.is_empty()
        };
        self.link.set(Some(link.clone()));

        for kind in RENDER_EVENTS {
            link.register_event(kind, true);
        }
        if queued {
            link.register_event(EventKind::PrePhysicsUpdate, true);
        }
        self.publish();
    }
}

impl fmt::Debug for RenderComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderComponent")
            .field("link", &self.link)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
