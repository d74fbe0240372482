//! Render component state bits.

use std::fmt;

/// Small bitmask of render component state.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RenderFlags(u32);

impl RenderFlags {
    /// No flags.
    pub const EMPTY: Self = Self(0);
    /// Component is hidden and unregistered from the scene.
    pub const HIDDEN: Self = Self(1 << 0);
    /// World bounds are empty or degenerate; nothing is drawn.
    pub const BBOX_INVALID: Self = Self(1 << 1);
    /// Rendering may run on a worker job.
    pub const EXECUTE_AS_JOB: Self = Self(1 << 2);
    /// [`Self::EXECUTE_AS_JOB`] is stale and must be recomputed.
    pub const RECOMPUTE_EXECUTE_AS_JOB: Self = Self(1 << 3);
    /// The entity wants a `Render` event after each inline render.
    pub const SEND_RENDER_EVENT: Self = Self(1 << 4);
    /// Component is currently registered with the scene.
    pub const REGISTERED: Self = Self(1 << 5);

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any bit of `other` is set.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Sets the bits of `other`.
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clears the bits of `other`.
    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Sets or clears the bits of `other`.
    #[inline]
    pub fn set(&mut self, other: Self, value: bool) {
        if value {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

impl std::ops::BitOr for RenderFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for RenderFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(RenderFlags, &str); 6] = [
            (RenderFlags::HIDDEN, "HIDDEN"),
            (RenderFlags::BBOX_INVALID, "BBOX_INVALID"),
            (RenderFlags::EXECUTE_AS_JOB, "EXECUTE_AS_JOB"),
            (RenderFlags::RECOMPUTE_EXECUTE_AS_JOB, "RECOMPUTE_EXECUTE_AS_JOB"),
            (RenderFlags::SEND_RENDER_EVENT, "SEND_RENDER_EVENT"),
            (RenderFlags::REGISTERED, "REGISTERED"),
        ];

        let mut list = f.debug_set();
        for (flag, name) in NAMES {
            if self.contains(flag) {
                list.entry(&format_args!("{name}"));
            }
        }
        list.finish()
    }
}
