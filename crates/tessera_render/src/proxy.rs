//! Render proxy: the thread-safe snapshot render jobs draw from.
//!
//! The component publishes into the proxy after every state change; jobs
//! only ever take the read lock and never touch the distributor.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tessera_core::EntityId;

use crate::bounds::Aabb;
use crate::flags::RenderFlags;
use crate::slot::{MaterialId, SlotKind};

/// Per-frame pass description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderPass {
    /// Frame counter.
    pub frame: u64,
    /// Shadow-map pass; particles are skipped.
    pub shadow: bool,
}

/// Snapshot of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotProxy {
    /// Slot index on the component.
    pub index: usize,
    /// Slot category.
    pub kind: SlotKind,
    /// Slot material override.
    pub material: Option<MaterialId>,
}

/// Snapshot of a render component.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderProxy {
    /// Owning entity.
    pub entity: EntityId,
    /// Component flags at publish time.
    pub flags: RenderFlags,
    /// World-space bounds.
    pub bounds: Aabb,
    /// Entity-wide material override.
    pub material: Option<MaterialId>,
    /// Opacity in `0..=1`.
    pub opacity: f32,
    /// Drawable slots.
    pub slots: Vec<SlotProxy>,
}

impl Default for RenderProxy {
    fn default() -> Self {
        Self {
            entity: EntityId::INVALID,
            flags: RenderFlags::BBOX_INVALID,
            bounds: Aabb::empty(),
            material: None,
            opacity: 1.0,
            slots: Vec::new(),
        }
    }
}

/// Proxy shared between a component and its render jobs.
pub type SharedProxy = Arc<RwLock<RenderProxy>>;

/// One submitted draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    /// Entity drawn.
    pub entity: EntityId,
    /// Slot drawn.
    pub slot: usize,
    /// Resolved material (slot override, then entity override).
    pub material: Option<MaterialId>,
    /// Opacity.
    pub opacity: f32,
    /// Frame the draw belongs to.
    pub frame: u64,
}

/// Thread-safe collector of draw calls.
#[derive(Debug, Default)]
pub struct DrawSink {
    calls: Mutex<Vec<DrawCall>>,
}

impl DrawSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends draws.
    pub fn extend(&self, calls: impl IntoIterator<Item = DrawCall>) {
        self.calls.lock().extend(calls);
    }

    /// Number of collected draws.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    /// Whether nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }

    /// Takes every collected draw.
    #[must_use]
    pub fn take(&self) -> Vec<DrawCall> {
        std::mem::take(&mut *self.calls.lock())
    }
}

/// Draws a proxy snapshot into `sink`. Returns the number of draws.
///
/// Hidden proxies and proxies with invalid bounds draw nothing. Lights are
/// not drawn as geometry.
pub fn render_job_entry(proxy: &RwLock<RenderProxy>, pass: RenderPass, sink: &DrawSink) -> usize {
    let proxy = proxy.read();
    if proxy
        .flags
        .intersects(RenderFlags::HIDDEN | RenderFlags::BBOX_INVALID)
    {
        return 0;
    }

    let draws: Vec<DrawCall> = proxy
        .slots
        .iter()
        .filter(|slot| match slot.kind {
            SlotKind::Light => false,
            SlotKind::ParticleEmitter => !pass.shadow,
            SlotKind::Geometry | SlotKind::Character => true,
        })
        .map(|slot| DrawCall {
            entity: proxy.entity,
            slot: slot.index,
            material: slot.material.or(proxy.material),
            opacity: proxy.opacity,
            frame: pass.frame,
        })
        .collect();

    let count = draws.len();
    sink.extend(draws);
    count
}
