//! Pack/unpack: the style-delta line representation.
//!
//! Grounded on `original_source/app/teletype.cc` `pack()`/`unpack()`
//! (lines 525-583): a packed line stores one [`Cell`] per *style change*,
//! whose `codepoint` field is repurposed to hold the byte offset into the
//! line's own UTF-8 text blob at which that style starts applying, plus
//! the raw UTF-8 bytes of every scalar in the line.

use crate::cell::Cell;

/// A single line's packed form: style-change cells plus concatenated text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackedLine {
    /// `codepoint` on each entry is a byte offset into `text`, not a
    /// scalar value.
    pub cells: Vec<Cell>,
    pub text: Vec<u8>,
}

/// An unpacked line: one cell per Unicode scalar.
pub type UnpackedLine = Vec<Cell>;

/// Pack an unpacked line into its style-delta form.
///
/// A new packed cell is emitted only when `(flags, fg, bg)` differs from
/// the previous cell (or for the first cell of the line).
pub fn pack(line: &[Cell]) -> PackedLine {
    let mut out = PackedLine::default();
    let mut prev: Option<&Cell> = None;
    let mut buf = [0u8; 4];
    for cell in line {
        let emit = match prev {
            None => true,
            Some(p) => cell.style_differs(p),
        };
        if emit {
            let offset = out.text.len() as u32;
            out.cells.push(Cell {
                codepoint: offset,
                ..*cell
            });
        }
        let ch = char::from_u32(cell.codepoint).unwrap_or('\u{fffd}');
        out.text.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        prev = Some(cell);
    }
    out
}

/// Unpack a style-delta line back into one cell per scalar.
///
/// `unpack(pack(line))` reproduces `line` cell-for-cell.
pub fn unpack(packed: &PackedLine) -> UnpackedLine {
    let mut out = Vec::new();
    let mut cell_iter = packed.cells.iter().peekable();
    let mut current = cell_iter.next();
    let text = &packed.text[..];
    let mut i = 0usize;
    while i < text.len() {
        // Advance to the style-change cell whose offset matches `i`.
        while let Some(next) = cell_iter.peek() {
            if (next.codepoint as usize) <= i {
                current = cell_iter.next();
            } else {
                break;
            }
        }
        let (ch, len) = decode_utf8_scalar(&text[i..]);
        let style = current.copied().unwrap_or_default();
        out.push(Cell {
            codepoint: ch as u32,
            flags: style.flags,
            fg: style.fg,
            bg: style.bg,
        });
        i += len;
    }
    out
}

/// Count the Unicode scalars encoded in `text` without materializing
/// cells. Used by `count_cells` when a line is not cache-resident.
pub fn count_scalars(text: &[u8]) -> usize {
    let mut i = 0usize;
    let mut n = 0usize;
    while i < text.len() {
        let (_, len) = decode_utf8_scalar(&text[i..]);
        i += len;
        n += 1;
    }
    n
}

fn decode_utf8_scalar(bytes: &[u8]) -> (char, usize) {
    match std::str::from_utf8(&bytes[..bytes.len().min(4)]) {
        Ok(s) => {
            let ch = s.chars().next().unwrap_or('\u{fffd}');
            (ch, ch.len_utf8())
        }
        Err(_) => {
            // Find the longest valid prefix; fall back to 1 byte.
            for take in (1..=bytes.len().min(4)).rev() {
                if let Ok(s) = std::str::from_utf8(&bytes[..take]) {
                    if let Some(ch) = s.chars().next() {
                        return (ch, ch.len_utf8());
                    }
                }
            }
            ('\u{fffd}', 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::StyleFlags;
    use crate::color::{sgr_16, FG_DEFAULT};

    fn cell(c: char, fg: u32) -> Cell {
        Cell {
            codepoint: c as u32,
            flags: StyleFlags::empty(),
            fg,
            bg: crate::color::BG_DEFAULT,
        }
    }

    #[test]
    fn round_trip_uniform_style() {
        let line = vec![cell('h', FG_DEFAULT), cell('i', FG_DEFAULT)];
        let packed = pack(&line);
        assert_eq!(packed.cells.len(), 1, "uniform style packs to one cell");
        assert_eq!(unpack(&packed), line);
    }

    #[test]
    fn round_trip_style_change() {
        let line = vec![
            cell('a', FG_DEFAULT),
            cell('b', sgr_16(1)),
            cell('c', sgr_16(1)),
        ];
        let packed = pack(&line);
        assert_eq!(packed.cells.len(), 2);
        assert_eq!(unpack(&packed), line);
    }

    #[test]
    fn round_trip_multibyte() {
        let line = vec![cell('日', FG_DEFAULT), cell('本', sgr_16(2))];
        let packed = pack(&line);
        assert_eq!(unpack(&packed), line);
    }

    #[test]
    fn round_trip_empty_line() {
        let line: Vec<Cell> = vec![];
        let packed = pack(&line);
        assert!(packed.cells.is_empty());
        assert!(unpack(&packed).is_empty());
    }

    #[test]
    fn count_scalars_matches_unpack_len() {
        let line = vec![cell('x', FG_DEFAULT), cell('日', FG_DEFAULT), cell('y', FG_DEFAULT)];
        let packed = pack(&line);
        assert_eq!(count_scalars(&packed.text), unpack(&packed).len());
    }
}
