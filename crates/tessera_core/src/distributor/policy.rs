//! Process-wide dispatch policy.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Which key orders the subscribers of one event kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOrder {
    /// Priority descending, then entity id descending.
    #[default]
    PriorityFirst,
    /// Entity id descending, then priority descending. Keeps one entity's
    /// callbacks contiguous.
    EntityFirst,
}

/// When a subscriber list is re-sorted before dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResortPolicy {
    /// Only when the table changed or another kind was sorted last.
    #[default]
    Lazy,
    /// Before every dispatch.
    Always,
}

/// Dispatch policy applied by an [`super::EventDistributor`].
///
/// Mirrors the entity system's update-type console variable, which packs the
/// same three switches into a bitmask (see [`DistributorPolicy::from_bits`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributorPolicy {
    /// Whether dispatch runs at all.
    pub enabled: bool,
    /// Comparator strategy.
    pub order: DispatchOrder,
    /// Re-sort strategy.
    pub resort: ResortPolicy,
}

impl DistributorPolicy {
    /// Bit: distributor enabled.
    pub const ENABLED: u32 = 1;
    /// Bit: entity-first ordering.
    pub const ENTITY_FIRST: u32 = 1 << 1;
    /// Bit: re-sort before every dispatch.
    pub const ALWAYS_RESORT: u32 = 1 << 2;

    const KNOWN_BITS: u32 = Self::ENABLED | Self::ENTITY_FIRST | Self::ALWAYS_RESORT;

    /// Policy with dispatch switched off.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            order: DispatchOrder::PriorityFirst,
            resort: ResortPolicy::Lazy,
        }
    }

    /// Decodes a console-variable bitmask.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPolicyBits`] if unknown bits are set.
    pub fn from_bits(bits: u32) -> CoreResult<Self> {
        if bits & !Self::KNOWN_BITS != 0 {
            return Err(CoreError::InvalidPolicyBits(bits));
        }

        Ok(Self {
            enabled: bits & Self::ENABLED != 0,
            order: if bits & Self::ENTITY_FIRST != 0 {
                DispatchOrder::EntityFirst
            } else {
                DispatchOrder::PriorityFirst
            },
            resort: if bits & Self::ALWAYS_RESORT != 0 {
                ResortPolicy::Always
            } else {
                ResortPolicy::Lazy
            },
        })
    }

    /// Encodes the policy as a console-variable bitmask.
    #[must_use]
    pub const fn to_bits(self) -> u32 {
        let mut bits = 0;
        if self.enabled {
            bits |= Self::ENABLED;
        }
        if matches!(self.order, DispatchOrder::EntityFirst) {
            bits |= Self::ENTITY_FIRST;
        }
        if matches!(self.resort, ResortPolicy::Always) {
            bits |= Self::ALWAYS_RESORT;
        }
        bits
    }

    /// Returns a copy with a different ordering strategy.
    #[must_use]
    pub const fn with_order(mut self, order: DispatchOrder) -> Self {
        self.order = order;
        self
    }

    /// Returns a copy with a different re-sort strategy.
    #[must_use]
    pub const fn with_resort(mut self, resort: ResortPolicy) -> Self {
        self.resort = resort;
        self
    }
}

impl Default for DistributorPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            order: DispatchOrder::PriorityFirst,
            resort: ResortPolicy::Lazy,
        }
    }
}
