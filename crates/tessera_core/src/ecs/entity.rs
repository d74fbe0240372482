//! # Entity Identity
//!
//! Entities are opaque 32-bit identifiers built from a salt handle:
//! - Lower 16 bits: slot index in the entity pool
//! - Upper 16 bits: salt, bumped every time the slot is recycled
//!
//! The raw value `0` is reserved as the invalid id.

use std::fmt;

/// Unique identifier for a live entity.
///
/// Not stable across a pool recycle: a pooled entity may be reissued under a
/// different id, in which case the distributor re-keys everything registered
/// under the old one (see [`crate::distributor::EventDistributor::remap_entity_id`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// The invalid / null entity id.
    pub const INVALID: Self = Self(0);

    /// Wraps a raw id value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Builds an id from a salt handle.
    ///
    /// # Arguments
    ///
    /// * `index` - Slot index in the entity pool
    /// * `salt` - Recycle counter of that slot
    #[inline]
    #[must_use]
    pub const fn from_handle(index: u16, salt: u16) -> Self {
        Self(((salt as u32) << 16) | (index as u32))
    }

    /// Returns the raw id value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the slot index portion of the id.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Returns the salt portion of the id.
    #[inline]
    #[must_use]
    pub const fn salt(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Checks that this is not [`EntityId::INVALID`].
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Anything that can report the id of the entity it stands for.
///
/// The distributor only needs the id when tearing an entity down.
pub trait Entity {
    /// Returns the entity's current id.
    fn id(&self) -> EntityId;
}

impl Entity for EntityId {
    fn id(&self) -> EntityId {
        *self
    }
}
