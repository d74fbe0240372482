//! # Tessera Render Component
//!
//! Event-driven render state for entities managed by the tessera event
//! distributor:
//! - reacts to transform, visibility, material and animation events
//! - tracks render slots and their bounds
//! - decides per component whether drawing may run on a worker job
//!
//! ## Threading
//!
//! ```text
//! simulation thread                      worker threads
//! ─────────────────                      ──────────────
//! EventDistributor → RenderComponent
//!                        │ publish
//!                        ▼
//!               Arc<RwLock<RenderProxy>> ──read──▶ render_job_entry → DrawSink
//! ```
//!
//! Only the proxy and the draw sink cross threads; render jobs never call
//! back into the distributor.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod bounds;
pub mod component;
pub mod flags;
pub mod job;
pub mod proxy;
pub mod scene;
pub mod slot;

pub use bounds::Aabb;
pub use component::{RenderComponent, RenderMode, RENDER_EVENTS};
pub use flags::RenderFlags;
pub use job::{InlineExecutor, Job, JobExecutor, ThreadExecutor};
pub use proxy::{render_job_entry, DrawCall, DrawSink, RenderPass, RenderProxy, SharedProxy, SlotProxy};
pub use scene::{NullScene, SceneRegistrar};
pub use slot::{GeometryId, MaterialId, Slot, SlotContent, SlotKind};
