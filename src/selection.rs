//! Selection span maintained by the host UI in visible coordinates and
//! resolved against [`crate::line_store::LineStore`] into a logical span.
//!
//! Grounded conceptually on the teacher's offscreen-buffer selection
//! handling and on `original_source`'s `tty_cell_ref`/`tty_cell_span`: a
//! selection is a pair of cell references, ordered so the earlier one in
//! reading order comes first.

use crate::line_store::LineStore;

/// A single cell's logical coordinate: which logical line, and the cell
/// offset within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CellRef {
    pub lline: usize,
    pub offset: usize,
}

/// A selection span between two logical cell references, kept in whatever
/// order the drag produced them; use [`Selection::ordered`] to read them
/// start-before-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: CellRef,
    pub head: CellRef,
}

impl Selection {
    pub fn new(anchor: CellRef, head: CellRef) -> Self {
        Selection { anchor, head }
    }

    /// The span with the reading-order-earlier endpoint first.
    pub fn ordered(&self) -> (CellRef, CellRef) {
        if self.anchor <= self.head {
            (self.anchor, self.head)
        } else {
            (self.head, self.anchor)
        }
    }

    /// True iff `cell` falls within `[start, end]` of the ordered span.
    pub fn contains(&self, cell: CellRef) -> bool {
        let (start, end) = self.ordered();
        cell >= start && cell <= end
    }

    /// Build a selection from a visible-row drag, resolving each endpoint
    /// to its logical cell via `store`. Returns `None` if either visible
    /// row is out of range.
    pub fn from_visible(
        store: &LineStore,
        anchor_vrow: usize,
        anchor_col: usize,
        head_vrow: usize,
        head_col: usize,
    ) -> Option<Selection> {
        let (a_lline, a_base) = store.visible_to_logical(anchor_vrow)?;
        let (h_lline, h_base) = store.visible_to_logical(head_vrow)?;
        Some(Selection {
            anchor: CellRef { lline: a_lline, offset: a_base + anchor_col },
            head: CellRef { lline: h_lline, offset: h_base + head_col },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_swaps_reversed_drag() {
        let sel = Selection::new(
            CellRef { lline: 3, offset: 0 },
            CellRef { lline: 1, offset: 0 },
        );
        let (start, end) = sel.ordered();
        assert_eq!(start.lline, 1);
        assert_eq!(end.lline, 3);
    }

    #[test]
    fn contains_checks_ordered_span() {
        let sel = Selection::new(
            CellRef { lline: 0, offset: 2 },
            CellRef { lline: 0, offset: 8 },
        );
        assert!(sel.contains(CellRef { lline: 0, offset: 5 }));
        assert!(!sel.contains(CellRef { lline: 0, offset: 9 }));
    }

    #[test]
    fn from_visible_resolves_through_store() {
        let store = LineStore::new();
        let sel = Selection::from_visible(&store, 0, 0, 0, 2);
        assert!(sel.is_some());
    }
}
