//! Scene registration seam.

use tessera_core::EntityId;

use crate::bounds::Aabb;

/// Spatial structure render components register with while visible.
pub trait SceneRegistrar {
    /// Inserts or moves `entity` with world `bounds`.
    fn register(&self, entity: EntityId, bounds: Aabb);

    /// Removes `entity`.
    fn unregister(&self, entity: EntityId);
}

/// Registrar that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullScene;

impl SceneRegistrar for NullScene {
    fn register(&self, _entity: EntityId, _bounds: Aabb) {}

    fn unregister(&self, _entity: EntityId) {}
}
