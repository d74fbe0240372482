//! Axis-aligned bounding boxes for render slots and entities.

/// Axis-aligned bounding box.
///
/// [`Aabb::empty`] is the identity of [`Aabb::merge`] and is never valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: [f32; 3],
    /// Maximum corner.
    pub max: [f32; 3],
}

impl Aabb {
    /// Inverted box that grows to whatever is merged into it.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            min: [f32::INFINITY; 3],
            max: [f32::NEG_INFINITY; 3],
        }
    }

    /// Creates a box from its corners.
    #[must_use]
    pub const fn from_min_max(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    /// Whether the box is finite and not inverted on any axis.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (0..3).all(|axis| {
            self.min[axis].is_finite()
                && self.max[axis].is_finite()
                && self.min[axis] <= self.max[axis]
        })
    }

    /// Smallest box containing both.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min: std::array::from_fn(|axis| self.min[axis].min(other.min[axis])),
            max: std::array::from_fn(|axis| self.max[axis].max(other.max[axis])),
        }
    }

    /// Box moved by `offset`.
    #[must_use]
    pub fn translate(&self, offset: [f32; 3]) -> Self {
        Self {
            min: std::array::from_fn(|axis| self.min[axis] + offset[axis]),
            max: std::array::from_fn(|axis| self.max[axis] + offset[axis]),
        }
    }

    /// Returns the center of the box.
    #[must_use]
    pub fn center(&self) -> [f32; 3] {
        std::array::from_fn(|axis| (self.min[axis] + self.max[axis]) * 0.5)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}
