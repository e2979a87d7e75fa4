//! Packed scroll-back line storage with a direct-mapped cache and a
//! visible/logical coordinate index.
//!
//! Grounded throughout on `original_source/app/teletype.cc` (`pack`,
//! `unpack`, `get_line`, `count_cells`, `clear_line`, `erase_line`,
//! `clear_all`, `invalidate_cache`, lines 525-702).

pub mod cache;
pub mod offsets;
pub mod packed;

use crate::cell::Cell;
use crate::time::Timestamp;
use cache::LineCache;
use offsets::{wrap_count, LOffset, VOffset};
use packed::{count_scalars, pack, unpack, PackedLine};

/// Descriptor for one logical line's storage.
#[derive(Debug, Clone, Default)]
struct LineDescriptor {
    packed: PackedLine,
    timestamp: Timestamp,
}

/// Default direct-mapped cache size, matching the reference.
pub const DEFAULT_CACHE_SIZE: usize = 128;

pub struct LineStore {
    lines: Vec<LineDescriptor>,
    cache: LineCache,
    voffsets: Vec<VOffset>,
    loffsets: Vec<LOffset>,
    min_line: usize,
}

impl LineStore {
    pub fn new() -> Self {
        Self::with_cache_size(DEFAULT_CACHE_SIZE)
    }

    pub fn with_cache_size(cache_size: usize) -> Self {
        LineStore {
            lines: vec![LineDescriptor::default()],
            cache: LineCache::new(cache_size),
            voffsets: vec![VOffset { lline: 0, col_offset: 0 }],
            loffsets: vec![LOffset { first_vrow: 0, count: 1 }],
            min_line: 0,
        }
    }

    pub fn logical_line_count(&self) -> usize {
        self.lines.len()
    }

    /// Pack the slot's current contents back into line storage if dirty.
    fn writeback(&mut self, slot_idx: usize) {
        let slot = &mut self.cache.slots_mut()[slot_idx];
        if let Some(lline) = slot.lline {
            if slot.dirty {
                let packed = pack(&slot.cells);
                self.lines[lline].packed = packed;
                self.lines[lline].timestamp = slot.timestamp;
                slot.dirty = false;
            }
        }
    }

    /// Returns a cache-resident handle to `lline`'s cells. `edit` marks the
    /// slot dirty so a subsequent eviction packs it back. The returned
    /// slice is valid until the next call to `get_line`/`invalidate_cache`.
    pub fn get_line(&mut self, lline: usize, edit: bool) -> &mut Vec<Cell> {
        assert!(lline < self.lines.len(), "logical line index out of range");
        let slot_idx = self.cache.slot_index(lline);
        let resident = self.cache.slot(slot_idx).lline;
        if resident != Some(lline) {
            self.writeback(slot_idx);
            let unpacked = unpack(&self.lines[lline].packed);
            let slot = &mut self.cache.slots_mut()[slot_idx];
            slot.lline = Some(lline);
            slot.cells = unpacked;
            slot.timestamp = self.lines[lline].timestamp;
            slot.dirty = false;
        }
        let slot = &mut self.cache.slots_mut()[slot_idx];
        if edit {
            slot.dirty = true;
            slot.timestamp = Timestamp::now();
            self.min_line = self.min_line.min(lline);
        }
        &mut slot.cells
    }

    /// Number of Unicode scalars in `lline`, from the cache if resident,
    /// else computed directly from packed text without unpacking cells.
    pub fn count_cells(&self, lline: usize) -> usize {
        assert!(lline < self.lines.len());
        let slot_idx = self.cache.slot_index(lline);
        let slot = self.cache.slot(slot_idx);
        if slot.lline == Some(lline) {
            slot.cells.len()
        } else {
            count_scalars(&self.lines[lline].packed.text)
        }
    }

    pub fn clear_line(&mut self, lline: usize) {
        assert!(lline < self.lines.len());
        self.lines[lline].packed = PackedLine::default();
        let slot_idx = self.cache.slot_index(lline);
        let slot = &mut self.cache.slots_mut()[slot_idx];
        if slot.lline == Some(lline) {
            slot.cells.clear();
            slot.dirty = false;
        }
        self.min_line = self.min_line.min(lline);
    }

    /// Erase `[start, end)` cells of `lline`, following the reference's
    /// exact three-branch ordering (SPEC_FULL §4.1, §9 open question 1):
    /// an end-of-line split is tested, and wins, before a plain truncate.
    pub fn erase_line(&mut self, lline: usize, start: usize, end: usize, cols: usize, tmpl: Cell) {
        assert!(lline < self.lines.len());
        let count = self.count_cells(lline);
        let on_col_boundary = cols != 0 && end % cols == 0;

        if end < count && !on_col_boundary {
            let cells = self.get_line(lline, true);
            for c in cells.iter_mut().take(end.min(cells.len())).skip(start) {
                *c = Cell::blank(&tmpl);
            }
        } else if end < count && on_col_boundary {
            self.invalidate_cache();
            let blank_line = start != 0 && cols != 0 && start % cols == 0;
            let tail: Vec<Cell> = {
                let cells = self.get_line(lline, true);
                let tail = cells.split_off(end.min(cells.len()));
                cells.truncate(start);
                tail
            };
            let n_new = if blank_line { 2 } else { 1 };
            let mut insert_at = lline + 1;
            for _ in 0..(n_new - 1) {
                self.insert_empty_line_after(insert_at - 1);
                insert_at += 1;
            }
            let tail_line_idx = self.insert_empty_line_after(insert_at - 1);
            *self.get_line(tail_line_idx, true) = tail;
        } else if start < count && on_col_boundary {
            let cells = self.get_line(lline, true);
            cells.truncate(start);
        }
    }

    pub fn clear_all(&mut self) {
        self.lines = vec![LineDescriptor::default()];
        self.cache = LineCache::new(self.cache.len());
        self.voffsets = vec![VOffset { lline: 0, col_offset: 0 }];
        self.loffsets = vec![LOffset { first_vrow: 0, count: 1 }];
        self.min_line = 0;
    }

    /// Pack back every dirty slot and mark all slots free. Must be called
    /// before any operation that reorders `lines[]` (insert/remove).
    pub fn invalidate_cache(&mut self) {
        for idx in 0..self.cache.len() {
            self.writeback(idx);
        }
        for slot in self.cache.slots_mut() {
            slot.lline = None;
            slot.dirty = false;
            slot.cells.clear();
        }
    }

    /// Insert a new empty logical line immediately after `lline`. Returns
    /// the new line's index. Caller must have invalidated the cache first
    /// if it holds live slot borrows, since this reorders `lines[]`.
    pub fn insert_empty_line_after(&mut self, lline: usize) -> usize {
        let at = lline + 1;
        self.lines.insert(at.min(self.lines.len()), LineDescriptor::default());
        self.min_line = self.min_line.min(lline);
        at
    }

    /// Insert a new empty logical line at exactly index `at`, shifting
    /// everything from `at` onward down by one. Unlike
    /// [`LineStore::insert_empty_line_after`], the new line's index is
    /// `at` itself rather than `at + 1`.
    pub fn insert_empty_line_at(&mut self, at: usize) -> usize {
        let at = at.min(self.lines.len());
        self.lines.insert(at, LineDescriptor::default());
        self.min_line = self.min_line.min(at);
        at
    }

    /// Remove logical line `lline` entirely.
    pub fn remove_line(&mut self, lline: usize) {
        assert!(lline < self.lines.len());
        if self.lines.len() == 1 {
            self.lines[0] = LineDescriptor::default();
            return;
        }
        self.lines.remove(lline);
        self.min_line = self.min_line.min(lline.saturating_sub(1));
    }

    pub fn push_empty_line(&mut self) -> usize {
        self.lines.push(LineDescriptor::default());
        self.lines.len() - 1
    }

    /// Rebuild `voffsets`/`loffsets` for lines at or after `min_line`,
    /// keeping the prefix untouched.
    pub fn update_offsets(&mut self, vis_cols: usize) {
        if self.min_line == 0 {
            self.voffsets.clear();
            self.loffsets.clear();
        } else {
            let keep_vrows = self
                .loffsets
                .get(..self.min_line)
                .map(|s| s.iter().map(|l| l.count).sum())
                .unwrap_or(0);
            self.voffsets.truncate(keep_vrows);
            self.loffsets.truncate(self.min_line);
        }
        let mut vrow = self.voffsets.len();
        for lline in self.min_line..self.lines.len() {
            let count = self.count_cells(lline);
            let rows = wrap_count(count, vis_cols);
            self.loffsets.push(LOffset { first_vrow: vrow, count: rows });
            for r in 0..rows {
                self.voffsets.push(VOffset {
                    lline,
                    col_offset: r * vis_cols.max(1),
                });
            }
            vrow += rows;
        }
        self.min_line = self.lines.len();
    }

    pub fn visible_row_count(&self) -> usize {
        self.voffsets.len()
    }

    pub fn visible_to_logical(&self, vrow: usize) -> Option<(usize, usize)> {
        self.voffsets.get(vrow).map(|v| (v.lline, v.col_offset))
    }

    pub fn logical_to_visible(&self, lline: usize) -> Option<(usize, usize)> {
        self.loffsets.get(lline).map(|l| (l.first_vrow, l.count))
    }

    pub fn mark_dirty_from(&mut self, lline: usize) {
        self.min_line = self.min_line.min(lline);
    }
}

impl Default for LineStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::StyleFlags;
    use crate::color::{BG_DEFAULT, FG_DEFAULT};

    fn cell(c: char) -> Cell {
        Cell { codepoint: c as u32, flags: StyleFlags::empty(), fg: FG_DEFAULT, bg: BG_DEFAULT }
    }

    fn fill(store: &mut LineStore, lline: usize, text: &str) {
        let cells = store.get_line(lline, true);
        cells.clear();
        cells.extend(text.chars().map(cell));
    }

    #[test]
    fn get_line_round_trips_through_cache_eviction() {
        let mut store = LineStore::with_cache_size(16);
        fill(&mut store, 0, "hello");
        // Force eviction by touching another line mapping to the same slot.
        store.push_empty_line();
        fill(&mut store, 16, "world");
        assert_eq!(store.count_cells(0), 5);
        let line0 = store.get_line(0, false).clone();
        assert_eq!(line0.iter().map(|c| char::from_u32(c.codepoint).unwrap()).collect::<String>(), "hello");
    }

    #[test]
    fn erase_line_overwrite_branch() {
        let mut store = LineStore::with_cache_size(16);
        fill(&mut store, 0, "abcdef");
        store.erase_line(0, 2, 4, 10, Cell::default());
        let line = store.get_line(0, false).clone();
        let s: String = line.iter().map(|c| char::from_u32(c.codepoint).unwrap()).collect();
        assert_eq!(s, "ab  ef");
    }

    #[test]
    fn erase_line_truncate_branch() {
        let mut store = LineStore::with_cache_size(16);
        fill(&mut store, 0, "abcdefghij"); // 10 cells, cols=10
        store.erase_line(0, 2, 10, 10, Cell::default());
        assert_eq!(store.count_cells(0), 2);
    }

    #[test]
    fn erase_line_split_branch_creates_new_line() {
        let mut store = LineStore::with_cache_size(16);
        // 15 cells at cols=10: count_cells=15, end=10 is a column boundary
        // and < count, so this takes the split branch.
        fill(&mut store, 0, "abcdefghijklmno");
        let before = store.logical_line_count();
        store.erase_line(0, 0, 10, 10, Cell::default());
        assert_eq!(store.logical_line_count(), before + 1);
        assert_eq!(store.count_cells(0), 0);
        assert_eq!(store.count_cells(1), 5);
    }

    #[test]
    fn update_offsets_wraps_long_lines() {
        let mut store = LineStore::with_cache_size(16);
        fill(&mut store, 0, &"x".repeat(25));
        store.update_offsets(10);
        assert_eq!(store.logical_to_visible(0), Some((0, 3)));
        assert_eq!(store.visible_to_logical(2), Some((0, 20)));
    }

    #[test]
    fn pack_unpack_round_trip_via_invalidate() {
        let mut store = LineStore::with_cache_size(16);
        fill(&mut store, 0, "round-trip");
        store.invalidate_cache();
        assert_eq!(store.count_cells(0), "round-trip".chars().count());
    }
}
