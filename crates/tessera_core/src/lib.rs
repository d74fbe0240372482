//! # Tessera Core
//!
//! Entity component event distribution:
//! - components register per entity for typed [`EventKind`]s
//! - events reach subscribers in a deterministic priority order
//! - pooled entities are re-keyed under new ids without losing track
//!
//! ## Architecture Rules
//!
//! 1. **Single-threaded** - the distributor lives on the simulation thread
//! 2. **Re-entrant** - no internal borrow is held while a component runs
//! 3. **Misses are no-ops** - unknown entities and components never error
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_core::{ComponentHandle, EntityEvent, EventDistributor, EventKind};
//!
//! let distributor = EventDistributor::default();
//! distributor.register_event(entity, &component, EventKind::Timer, true);
//! distributor.send_event(&EntityEvent::new(EventKind::Timer));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod distributor;
pub mod ecs;
pub mod error;
pub mod memory;

pub use config::{DispatchConfig, DistributorConfig, PoolConfig};
pub use distributor::{
    DispatchOrder, DistributorLink, DistributorPolicy, DistributorStats, EntityIdRemapTable,
    EventDistributor, EventPriorityOrder, LinkCell, RemapOutcome, ResortPolicy, Subscription,
};
pub use ecs::{
    Component, ComponentHandle, Entity, EntityEvent, EntityId, EntityPool, EventKind, EventMask,
    EventPriority, EventSelector, XformFlags,
};
pub use error::{ConfigError, CoreError, CoreResult};
pub use memory::{SaltBuffer, SaltHandle};
