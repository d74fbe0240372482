//! # Salt Buffer
//!
//! Slot arena with index recycling and a per-slot salt counter.
//!
//! Every removal bumps the slot's salt, so a handle issued before the removal
//! no longer matches the slot and lookups through it fail instead of reaching
//! whatever was stored there next.

use std::fmt;

/// Handle to a value stored in a [`SaltBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SaltHandle {
    /// Slot index.
    index: u16,
    /// Salt the slot had when the handle was issued.
    salt: u16,
}

impl SaltHandle {
    /// Rebuilds a handle from its parts.
    #[inline]
    #[must_use]
    pub const fn from_parts(index: u16, salt: u16) -> Self {
        Self { index, salt }
    }

    /// Returns the slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u16 {
        self.index
    }

    /// Returns the salt.
    #[inline]
    #[must_use]
    pub const fn salt(self) -> u16 {
        self.salt
    }
}

struct Slot<T> {
    salt: u16,
    value: Option<T>,
}

/// A bounded arena addressed by salted handles.
///
/// Slots are created on demand up to `max_slots`; freed slots are reused
/// most-recently-freed first. Salts start at 1, so no live handle ever has
/// both index and salt equal to zero.
///
/// # Thread Safety
///
/// Not thread-safe. Owned by a single simulation thread.
///
/// # Example
///
/// ```rust,ignore
/// let mut buffer: SaltBuffer<&str> = SaltBuffer::new(16);
///
/// let handle = buffer.insert("render").unwrap();
/// buffer.remove(handle);
///
/// // The slot is recycled under a new salt; the old handle is dead.
/// let reused = buffer.insert("physics").unwrap();
/// assert_eq!(reused.index(), handle.index());
/// assert!(buffer.get(handle).is_none());
/// ```
pub struct SaltBuffer<T> {
    /// Slot storage, grown lazily.
    slots: Vec<Slot<T>>,
    /// Free list - indices of vacated slots.
    free_list: Vec<u16>,
    /// Number of occupied slots.
    len: usize,
    /// Maximum number of slots.
    max_slots: usize,
}

impl<T> SaltBuffer<T> {
    /// Creates an empty buffer that will hold at most `max_slots` values.
    ///
    /// # Panics
    ///
    /// Panics if `max_slots` is zero or does not fit a 16-bit index.
    #[must_use]
    pub fn new(max_slots: usize) -> Self {
        assert!(max_slots > 0, "Capacity must be greater than zero");
        assert!(
            max_slots <= usize::from(u16::MAX) + 1,
            "Capacity cannot exceed a 16-bit index"
        );

        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            max_slots,
        }
    }

    /// Returns the maximum number of values.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.max_slots
    }

    /// Returns the number of stored values.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Checks whether the buffer holds no values.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores a value, returning its handle, or `None` when full.
    pub fn insert(&mut self, value: T) -> Option<SaltHandle> {
        let index = match self.free_list.pop() {
            Some(index) => index,
            None if self.slots.len() < self.max_slots => {
                let index = u16::try_from(self.slots.len()).ok()?;
                self.slots.push(Slot {
                    salt: 1,
                    value: None,
                });
                index
            }
            None => return None,
        };

        let slot = &mut self.slots[usize::from(index)];
        slot.value = Some(value);
        self.len += 1;

        Some(SaltHandle {
            index,
            salt: slot.salt,
        })
    }

    /// Removes the value behind `handle`.
    ///
    /// Returns `None` when the handle is stale or was never issued.
    pub fn remove(&mut self, handle: SaltHandle) -> Option<T> {
        let slot = self.slots.get_mut(usize::from(handle.index))?;
        if slot.salt != handle.salt {
            return None;
        }

        let value = slot.value.take()?;
        slot.salt = next_salt(slot.salt);
        self.free_list.push(handle.index);
        self.len -= 1;

        Some(value)
    }

    /// Gets the value behind `handle` if it is still live.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: SaltHandle) -> Option<&T> {
        let slot = self.slots.get(usize::from(handle.index))?;
        if slot.salt == handle.salt {
            slot.value.as_ref()
        } else {
            None
        }
    }

    /// Gets the value behind `handle` mutably if it is still live.
    #[inline]
    pub fn get_mut(&mut self, handle: SaltHandle) -> Option<&mut T> {
        let slot = self.slots.get_mut(usize::from(handle.index))?;
        if slot.salt == handle.salt {
            slot.value.as_mut()
        } else {
            None
        }
    }

    /// Checks whether `handle` still refers to a live value.
    #[inline]
    #[must_use]
    pub fn contains(&self, handle: SaltHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Removes every value, invalidating all outstanding handles.
    ///
    /// Slot memory is kept for reuse.
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len);
        self.free_list.clear();
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if let Some(value) = slot.value.take() {
                slot.salt = next_salt(slot.salt);
                values.push(value);
            }
            // Indices always fit: slots never grow past a 16-bit index.
            if let Ok(index) = u16::try_from(index) {
                self.free_list.push(index);
            }
        }
        self.len = 0;
        values
    }

    /// Iterates over all live values.
    pub fn iter(&self) -> impl Iterator<Item = (SaltHandle, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let index = u16::try_from(index).ok()?;
            slot.value.as_ref().map(|value| {
                (
                    SaltHandle {
                        index,
                        salt: slot.salt,
                    },
                    value,
                )
            })
        })
    }
}

impl<T> fmt::Debug for SaltBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaltBuffer")
            .field("len", &self.len)
            .field("slots", &self.slots.len())
            .field("max_slots", &self.max_slots)
            .finish()
    }
}

/// Advances a salt, skipping zero.
#[inline]
const fn next_salt(salt: u16) -> u16 {
    match salt.wrapping_add(1) {
        0 => 1,
        next => next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let mut buffer: SaltBuffer<u32> = SaltBuffer::new(10);

        let h1 = buffer.insert(42).unwrap();
        assert_eq!(*buffer.get(h1).unwrap(), 42);
        assert_eq!(buffer.len(), 1);

        assert_eq!(buffer.remove(h1), Some(42));
        assert!(buffer.is_empty());
        assert_eq!(buffer.remove(h1), None);
    }

    #[test]
    fn test_full() {
        let mut buffer: SaltBuffer<u8> = SaltBuffer::new(2);

        let _ = buffer.insert(1).unwrap();
        let _ = buffer.insert(2).unwrap();
        assert!(buffer.insert(3).is_none());
    }

    #[test]
    fn test_reuse_bumps_salt() {
        let mut buffer: SaltBuffer<u32> = SaltBuffer::new(1);

        let h1 = buffer.insert(1).unwrap();
        buffer.remove(h1);

        let h2 = buffer.insert(2).unwrap();
        assert_eq!(h1.index(), h2.index());
        assert_ne!(h1.salt(), h2.salt());
        assert!(buffer.get(h1).is_none());
        assert_eq!(*buffer.get(h2).unwrap(), 2);
    }

    #[test]
    fn test_first_handle_is_never_zero() {
        let mut buffer: SaltBuffer<()> = SaltBuffer::new(4);
        let handle = buffer.insert(()).unwrap();
        assert_eq!(handle.index(), 0);
        assert_eq!(handle.salt(), 1);
    }

    #[test]
    fn test_salt_wraps_past_zero() {
        assert_eq!(next_salt(u16::MAX), 1);
        assert_eq!(next_salt(7), 8);
    }

    #[test]
    fn test_drain_invalidates_handles() {
        let mut buffer: SaltBuffer<u32> = SaltBuffer::new(8);
        let a = buffer.insert(1).unwrap();
        let b = buffer.insert(2).unwrap();

        let mut drained = buffer.drain();
        drained.sort_unstable();
        assert_eq!(drained, vec![1, 2]);
        assert!(buffer.is_empty());
        assert!(!buffer.contains(a));
        assert!(!buffer.contains(b));

        // Slots are handed out again from the lowest index.
        let c = buffer.insert(3).unwrap();
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn test_iter_skips_vacant() {
        let mut buffer: SaltBuffer<u32> = SaltBuffer::new(8);
        let a = buffer.insert(1).unwrap();
        let _ = buffer.insert(2).unwrap();
        buffer.remove(a);

        let values: Vec<u32> = buffer.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![2]);
    }
}
