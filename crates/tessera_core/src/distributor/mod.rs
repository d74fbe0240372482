//! # Component Event Distribution
//!
//! Components subscribe to [`crate::EventKind`]s per entity; the
//! [`EventDistributor`] delivers each event to its subscribers in a
//! deterministic order:
//!
//! - priority first (default): higher [`crate::EventPriority`] first, then
//!   higher entity id
//! - entity first: higher entity id first, then higher priority
//!
//! Pooled entities re-keyed under a new id are tracked by the
//! [`EntityIdRemapTable`] until their old id is resolved.

mod event_distributor;
mod link;
mod policy;
mod registry;
mod remap;
mod subscription;
mod table;

pub use event_distributor::{
    DistributorStats, EventDistributor, DEFAULT_POOL_CAPACITY, DEFAULT_SCRATCH_CAPACITY,
};
pub use link::{DistributorLink, LinkCell};
pub use policy::{DispatchOrder, DistributorPolicy, ResortPolicy};
pub use remap::{EntityIdRemapTable, RemapOutcome};
pub use subscription::{EventPriorityOrder, Subscription};
