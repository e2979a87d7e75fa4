//! Cell and style-flag representation.
//!
//! Grounded on `original_source/app/teletype.h`'s `tty_cell`/`tty_cell_flag`
//! bitset (bold, faint, italic, underline, double-underline, blink,
//! rapid-blink, inverse, hidden, strikeout, fraktur).

use crate::color::{Argb, BG_DEFAULT, FG_DEFAULT};
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StyleFlags: u16 {
        const BOLD            = 1 << 0;
        const FAINT            = 1 << 1;
        const ITALIC           = 1 << 2;
        const UNDERLINE         = 1 << 3;
        const DOUBLE_UNDERLINE  = 1 << 4;
        const BLINK             = 1 << 5;
        const RAPID_BLINK       = 1 << 6;
        const INVERSE           = 1 << 7;
        const HIDDEN            = 1 << 8;
        const STRIKEOUT         = 1 << 9;
        const FRAKTUR           = 1 << 10;
    }
}

/// A single terminal cell: a Unicode scalar plus style and color.
///
/// In a *packed* line, `codepoint` instead holds a relative byte offset
/// into the line's shared text segment (see `line_store::packed`); the two
/// interpretations never coexist in the same vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub codepoint: u32,
    pub flags: StyleFlags,
    pub fg: Argb,
    pub bg: Argb,
}

impl Cell {
    pub const SPACE: char = ' ';

    pub fn blank(template: &Cell) -> Cell {
        Cell {
            codepoint: Self::SPACE as u32,
            ..*template
        }
    }

    /// True iff this cell's style triple differs from `other`'s — the
    /// admission test for emitting a new packed style-change cell.
    pub fn style_differs(&self, other: &Cell) -> bool {
        self.flags != other.flags || self.fg != other.fg || self.bg != other.bg
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            codepoint: Self::SPACE as u32,
            flags: StyleFlags::empty(),
            fg: FG_DEFAULT,
            bg: BG_DEFAULT,
        }
    }
}
