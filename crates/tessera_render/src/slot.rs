//! Render slots: the per-entity objects a render component draws.

use tessera_core::{EntityEvent, EventKind};

use crate::bounds::Aabb;

/// Static geometry asset id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryId(pub u32);

/// Material asset id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

/// What a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotContent {
    /// Static mesh.
    Geometry(GeometryId),
    /// Animated character instance.
    Character(u32),
    /// Particle emitter.
    ParticleEmitter(u32),
    /// Light source.
    Light(u32),
}

/// Broad category of a slot, shared with render jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Static mesh.
    Geometry,
    /// Animated character.
    Character,
    /// Particle emitter.
    ParticleEmitter,
    /// Light source.
    Light,
}

impl SlotContent {
    /// Category of the content.
    #[must_use]
    pub const fn kind(&self) -> SlotKind {
        match self {
            Self::Geometry(_) => SlotKind::Geometry,
            Self::Character(_) => SlotKind::Character,
            Self::ParticleEmitter(_) => SlotKind::ParticleEmitter,
            Self::Light(_) => SlotKind::Light,
        }
    }
}

/// One render slot.
#[derive(Debug, Clone)]
pub struct Slot {
    /// Slot content.
    pub content: SlotContent,
    /// Bounds in entity space.
    pub local_bounds: Aabb,
    /// Per-slot material override.
    pub material: Option<MaterialId>,
    events_seen: u32,
    effects_spawned: u32,
    resources_loaded: bool,
}

impl Slot {
    /// Creates a slot with loaded resources.
    #[must_use]
    pub const fn new(content: SlotContent, local_bounds: Aabb) -> Self {
        Self {
            content,
            local_bounds,
            material: None,
            events_seen: 0,
            effects_spawned: 0,
            resources_loaded: true,
        }
    }

    /// Static geometry slot.
    #[must_use]
    pub const fn geometry(geometry: GeometryId, local_bounds: Aabb) -> Self {
        Self::new(SlotContent::Geometry(geometry), local_bounds)
    }

    /// Whether the slot forces inline rendering.
    #[must_use]
    pub const fn blocks_render_job(&self) -> bool {
        matches!(
            self.content,
            SlotContent::Character(_) | SlotContent::ParticleEmitter(_)
        )
    }

    /// Receives every event the owning component gets, before the component
    /// reacts to it.
    pub fn on_entity_event(&mut self, event: &EntityEvent) {
        self.events_seen += 1;
        if event.kind == EventKind::Xform || event.kind == EventKind::Unhide {
            self.resources_loaded = true;
        }
    }

    /// Plays an animation-driven effect on character slots.
    pub fn on_anim_event(&mut self) {
        if matches!(self.content, SlotContent::Character(_)) {
            self.effects_spawned += 1;
        }
    }

    /// Drops streamed render resources after the entity went unseen.
    pub fn release_resources(&mut self) {
        self.resources_loaded = false;
    }

    /// Events received so far.
    #[must_use]
    pub const fn events_seen(&self) -> u32 {
        self.events_seen
    }

    /// Animation effects played so far.
    #[must_use]
    pub const fn effects_spawned(&self) -> u32 {
        self.effects_spawned
    }

    /// Whether render resources are resident.
    #[must_use]
    pub const fn resources_loaded(&self) -> bool {
        self.resources_loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Aabb {
        Aabb::from_min_max([0.0; 3], [1.0; 3])
    }

    #[test]
    fn test_job_blockers() {
        assert!(!Slot::geometry(GeometryId(1), unit()).blocks_render_job());
        assert!(Slot::new(SlotContent::Character(3), unit()).blocks_render_job());
        assert!(Slot::new(SlotContent::ParticleEmitter(3), unit()).blocks_render_job());
        assert!(!Slot::new(SlotContent::Light(3), unit()).blocks_render_job());
    }

    #[test]
    fn test_resources_reload_on_xform() {
        let mut slot = Slot::geometry(GeometryId(1), unit());
        slot.release_resources();
        assert!(!slot.resources_loaded());

        slot.on_entity_event(&EntityEvent::new(EventKind::Xform));
        assert!(slot.resources_loaded());
        assert_eq!(slot.events_seen(), 1);
    }

    #[test]
    fn test_anim_effects_only_on_characters() {
        let mut mesh = Slot::geometry(GeometryId(1), unit());
        let mut character = Slot::new(SlotContent::Character(7), unit());
        mesh.on_anim_event();
        character.on_anim_event();
        assert_eq!(mesh.effects_spawned(), 0);
        assert_eq!(character.effects_spawned(), 1);
    }
}
