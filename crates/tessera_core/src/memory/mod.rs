//! # Memory Management
//!
//! Salted slot storage shared by entity id allocation and the distributor's
//! component registry.
//!
//! ## Design Philosophy
//!
//! - Slots are recycled by index through a free list
//! - Every recycle bumps the slot salt, so stale handles are detected
//! - No raw pointer reuse

mod salt_buffer;

pub use salt_buffer::{SaltBuffer, SaltHandle};
