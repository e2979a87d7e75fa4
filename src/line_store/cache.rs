//! Direct-mapped line cache.
//!
//! Grounded on `original_source/app/teletype.cc` `get_line()` (lines
//! 585-603): a fixed, power-of-two number of slots; a logical line index
//! maps to `lline & (size - 1)`. A slot holding a different, dirty line is
//! packed back before being reused.

use crate::line_store::packed::UnpackedLine;
use crate::time::Timestamp;

#[derive(Debug, Clone)]
pub struct CacheSlot {
    /// Logical line index resident in this slot, if any.
    pub lline: Option<usize>,
    pub dirty: bool,
    pub cells: UnpackedLine,
    pub timestamp: Timestamp,
}

impl Default for CacheSlot {
    fn default() -> Self {
        CacheSlot {
            lline: None,
            dirty: false,
            cells: Vec::new(),
            timestamp: Timestamp::EPOCH,
        }
    }
}

#[derive(Debug)]
pub struct LineCache {
    slots: Vec<CacheSlot>,
    mask: usize,
}

impl LineCache {
    /// `size` must be a power of two, at least 16.
    pub fn new(size: usize) -> Self {
        assert!(size.is_power_of_two() && size >= 16, "cache size must be a power of two >= 16");
        LineCache {
            slots: (0..size).map(|_| CacheSlot::default()).collect(),
            mask: size - 1,
        }
    }

    pub fn slot_index(&self, lline: usize) -> usize {
        lline & self.mask
    }

    pub fn slot(&self, lline: usize) -> &CacheSlot {
        &self.slots[self.slot_index(lline)]
    }

    pub fn slot_mut(&mut self, lline: usize) -> &mut CacheSlot {
        let idx = self.slot_index(lline);
        &mut self.slots[idx]
    }

    /// All slots, for a full flush (`invalidate_cache`).
    pub fn slots_mut(&mut self) -> &mut [CacheSlot] {
        &mut self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}
