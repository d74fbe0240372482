//! # Entities, Events and Components
//!
//! - [`EntityId`]: salted 32-bit id, `0` is invalid
//! - [`EventKind`] / [`EntityEvent`]: closed set of entity events
//! - [`Component`]: behavior attached to an entity, fed by the distributor
//! - [`EntityPool`]: fixed-capacity id allocator with park/reuse

mod component;
mod entity;
mod entity_pool;
mod event;

pub use component::{Component, ComponentHandle};
pub use entity::{Entity, EntityId};
pub use entity_pool::EntityPool;
pub use event::{EntityEvent, EventKind, EventMask, EventPriority, EventSelector, XformFlags};
