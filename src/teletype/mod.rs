//! The teletype: cursor, style template, scroll region, flags, and
//! erasure/insert/delete/OSC/CSI dispatch over a [`LineStore`]
//! (SPEC_FULL §3 "Teletype state", §4.3).
//!
//! Grounded on the teacher's `operations/{sgr_ops,dsr_ops,margin_ops}.rs`
//! shim layering (a public-facing struct, private per-concern submodules
//! implementing it) with semantics from `original_source/app/teletype.cc`.

mod charset;
mod csi_ops;
mod motion;
mod sgr;

pub use charset::G0Charset;
pub use motion::Motion;

use crate::cell::Cell;
use crate::flags::TtyFlags;
use crate::line_store::LineStore;
use crate::parser::params::{CsiParams, OscParams};
use crate::parser::state::CsiPrefix;
use crate::parser::{Parser, ParserSink};
use crate::selection::Selection;
use crate::time::Timestamp;

/// The cursor position saved by `ESC 7`/`CSI s` and restored by
/// `ESC 8`/`CSI u`.
#[derive(Debug, Clone, Copy)]
struct SavedCursor {
    line: usize,
    offset: usize,
    overflow: bool,
}

/// Owns the parser, the line store, and all per-session terminal state:
/// cursor, scroll region, flags, style template, and pending reply bytes
/// destined for the PTY's output ring.
pub struct Teletype {
    parser: Parser,
    store: LineStore,
    flags: TtyFlags,
    template: Cell,

    cur_line: usize,
    cur_offset: usize,
    overflow: bool,

    /// 1-based scroll margins; 0 means unset (full screen).
    top_marg: usize,
    bot_marg: usize,

    scr_row: usize,
    scr_col: usize,

    vis_rows: usize,
    vis_cols: usize,
    pix_w: usize,
    pix_h: usize,

    selection: Option<Selection>,
    saved_cursor: Option<SavedCursor>,
    g0: G0Charset,

    /// Reply bytes synthesized by DSR and similar commands, drained by
    /// the host's `IoLoop` into its output ring.
    output: Vec<u8>,
    needs_update: bool,
}

impl Teletype {
    pub fn new(vis_rows: usize, vis_cols: usize) -> Self {
        Self::with_cache_size(vis_rows, vis_cols, crate::line_store::DEFAULT_CACHE_SIZE)
    }

    pub fn with_cache_size(vis_rows: usize, vis_cols: usize, cache_size: usize) -> Self {
        let vis_rows = vis_rows.max(1);
        let vis_cols = vis_cols.max(1);
        let mut store = LineStore::with_cache_size(cache_size);
        for _ in 1..vis_rows {
            store.push_empty_line();
        }
        store.update_offsets(vis_cols);
        Teletype {
            parser: Parser::new(),
            store,
            flags: TtyFlags::default(),
            template: Cell::default(),
            cur_line: 0,
            cur_offset: 0,
            overflow: false,
            top_marg: 0,
            bot_marg: 0,
            scr_row: 0,
            scr_col: 0,
            vis_rows,
            vis_cols,
            pix_w: 0,
            pix_h: 0,
            selection: None,
            saved_cursor: None,
            g0: G0Charset::default(),
            output: Vec::new(),
            needs_update: true,
        }
    }

    /// Feed one PTY byte through the parser. Offsets are rebuilt
    /// incrementally after every byte so that all renderer queries below
    /// stay const (§9 "Visible↔logical index").
    pub fn feed_byte(&mut self, byte: u8) {
        let mut parser = std::mem::take(&mut self.parser);
        parser.feed_byte(byte, self);
        self.parser = parser;
        self.store.update_offsets(self.vis_cols);
        self.needs_update = true;
    }

    pub fn feed_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.feed_byte(b);
        }
    }

    /// Drain reply bytes synthesized by DSR/etc since the last call.
    pub fn drain_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    fn push_reply(&mut self, bytes: &[u8]) {
        self.output.extend_from_slice(bytes);
    }

    // ---- renderer collaborator queries (SPEC_FULL §6.2) ----

    pub fn total_rows(&self) -> usize {
        self.store.visible_row_count().max(self.vis_rows)
    }

    pub fn total_cols(&self) -> usize {
        self.vis_cols
    }

    pub fn visible_rows(&self) -> usize {
        self.vis_rows
    }

    pub fn visible_cols(&self) -> usize {
        self.vis_cols
    }

    pub fn scroll_row(&self) -> usize {
        self.scr_row
    }

    pub fn scroll_col(&self) -> usize {
        self.scr_col
    }

    /// The visible row (viewport-relative) of the top of the screen,
    /// i.e. the first row of scrollback not currently above the viewport.
    pub fn top_row(&self) -> usize {
        let total = self.store.visible_row_count().max(self.vis_rows);
        total - self.vis_rows
    }

    pub fn cursor_row(&self) -> usize {
        self.cursor_vrow().saturating_sub(self.top_row())
    }

    pub fn cursor_col(&self) -> usize {
        self.current_column()
    }

    pub fn cursor_line(&self) -> usize {
        self.cur_line
    }

    pub fn cursor_offset(&self) -> usize {
        self.cur_offset
    }

    pub fn visible_to_logical(&self, vrow: usize) -> Option<(usize, usize)> {
        self.store.visible_to_logical(vrow)
    }

    pub fn logical_line_count(&self) -> usize {
        self.store.logical_line_count()
    }

    /// A cache-resident handle to `lline`'s cells, valid until the next
    /// call to `get_line`. `edit` marks the slot dirty.
    pub fn get_line(&mut self, lline: usize, edit: bool) -> &mut Vec<Cell> {
        self.store.get_line(lline, edit)
    }

    pub fn get_selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn has_flag(&self, flag: TtyFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    // ---- renderer collaborator commands (SPEC_FULL §6.2) ----

    pub fn set_scroll_row(&mut self, row: usize) {
        let max = self.total_rows().saturating_sub(self.vis_rows);
        self.scr_row = row.min(max);
    }

    pub fn set_scroll_col(&mut self, col: usize) {
        self.scr_col = col;
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    /// Resize the viewport. Resets `min_line` to force a full re-index on
    /// the next offset rebuild (SPEC_FULL §5 "Ordering").
    pub fn set_winsize(&mut self, vis_rows: usize, vis_cols: usize, pix_w: usize, pix_h: usize) {
        self.vis_rows = vis_rows.max(1);
        self.vis_cols = vis_cols.max(1);
        self.pix_w = pix_w;
        self.pix_h = pix_h;
        self.store.mark_dirty_from(0);
        self.store.update_offsets(self.vis_cols);
        self.needs_update = true;
    }

    pub fn set_needs_update(&mut self, needs: bool) {
        self.needs_update = needs;
    }

    // ---- internal cursor-coordinate helpers ----

    fn cursor_vrow(&self) -> usize {
        let first_vrow = self.store.logical_to_visible(self.cur_line).map(|(f, _)| f).unwrap_or(0);
        first_vrow + self.cur_offset / self.vis_cols
    }

    fn current_column(&self) -> usize {
        let first_vrow = self.store.logical_to_visible(self.cur_line).map(|(f, _)| f).unwrap_or(0);
        let vrow = self.cursor_vrow();
        let row_in_line = vrow.saturating_sub(first_vrow);
        self.cur_offset.saturating_sub(row_in_line * self.vis_cols)
    }

    fn set_column(&mut self, col: usize) {
        let first_vrow = self.store.logical_to_visible(self.cur_line).map(|(f, _)| f).unwrap_or(0);
        let vrow = self.cursor_vrow();
        let row_in_line = vrow.saturating_sub(first_vrow);
        self.cur_offset = row_in_line * self.vis_cols + col;
    }

    /// Move the cursor to an existing visible row, clamped to the
    /// current extent of the store. Used by plain CSI motions, which
    /// never grow the line store.
    fn set_cursor_vrow_clamped(&mut self, vrow: usize) {
        let max = self.store.visible_row_count().saturating_sub(1);
        let v = vrow.min(max);
        if let Some((lline, _)) = self.store.visible_to_logical(v) {
            self.cur_line = lline;
            self.store.mark_dirty_from(lline);
        }
    }

    fn region_top_vrow(&self) -> usize {
        self.top_row() + self.top_marg.saturating_sub(1)
    }

    fn region_bottom_vrow(&self) -> usize {
        let bot = if self.bot_marg == 0 { self.vis_rows } else { self.bot_marg };
        self.top_row() + bot.saturating_sub(1)
    }

    fn at_scroll_bottom(&self) -> bool {
        self.cursor_vrow() == self.region_bottom_vrow()
    }

    // ---- cursor motion (SPEC_FULL §4.3 "Cursor motion") ----

    /// Apply a CSI-driven motion on one or both axes. Never grows the
    /// line store or scrolls — that is reserved for `line_feed`/
    /// `reverse_index`, which model the `Rel(+1)` scroll prelude.
    pub(crate) fn cursor_motion(&mut self, row: Motion, col: Motion) {
        self.overflow = false;
        if !matches!(row, Motion::None) {
            let old_col = self.current_column();
            let new_vrow = match row {
                Motion::Rel(dv) => (self.cursor_vrow() as i64 + dv).max(0) as usize,
                Motion::Abs(v) => {
                    let top = self.top_row() as i64;
                    let target = (v - 1).clamp(0, self.vis_rows as i64 - 1);
                    (top + target) as usize
                }
                Motion::None => unreachable!(),
            };
            self.set_cursor_vrow_clamped(new_vrow);
            self.set_column(old_col);
        }
        match col {
            Motion::Rel(dv) => {
                self.cur_offset = (self.cur_offset as i64 + dv).max(0) as usize;
            }
            Motion::Abs(v) => {
                let first_vrow =
                    self.store.logical_to_visible(self.cur_line).map(|(f, _)| f).unwrap_or(0);
                let row_base = self.cursor_vrow().saturating_sub(first_vrow) * self.vis_cols;
                let target = (v - 1).clamp(0, self.vis_cols as i64 - 1) as usize;
                self.cur_offset = row_base + target;
            }
            Motion::None => {}
        }
        self.store.mark_dirty_from(self.cur_line);
    }

    fn line_feed(&mut self) {
        if self.at_scroll_bottom() {
            self.scroll_up_one();
        } else {
            self.cur_line += 1;
            if self.cur_line >= self.store.logical_line_count() {
                self.store.push_empty_line();
            }
            self.store.mark_dirty_from(self.cur_line - 1);
        }
        self.overflow = false;
    }

    /// `ESC M`: reverse index. Moves the cursor up one row, scrolling the
    /// region down when already at its top.
    fn reverse_index(&mut self) {
        if self.cursor_vrow() == self.region_top_vrow() {
            self.scroll_down_one();
        } else {
            let col = self.current_column();
            let vrow = self.cursor_vrow().saturating_sub(1);
            self.set_cursor_vrow_clamped(vrow);
            self.set_column(col);
        }
        self.overflow = false;
    }

    /// Scroll the active region up by one line: the top-of-region line is
    /// removed and a blank line appears at the bottom.
    fn scroll_up_one(&mut self) {
        self.store.invalidate_cache();
        let top_vrow = self.region_top_vrow();
        let bot_vrow = self.region_bottom_vrow();
        let top_lline = self.store.visible_to_logical(top_vrow).map(|(l, _)| l).unwrap_or(0);
        let bot_lline =
            self.store.visible_to_logical(bot_vrow).map(|(l, _)| l).unwrap_or(top_lline);
        self.store.remove_line(top_lline);
        // Removing `top_lline` shifts every remaining line up by one, so
        // the old bottom-of-region index `bot_lline` is exactly where the
        // blank belongs to land back on the bottom-of-region row
        // (examples/original_source/app/teletype.cc ~1069-1078: insert at
        // `bloc.lline + 1`, then erase the old top line).
        let new_line = self.store.insert_empty_line_at(bot_lline);
        self.cur_line = new_line;
    }

    /// Scroll the active region down by one line: the bottom-of-region
    /// line is removed and a blank line appears at the top.
    fn scroll_down_one(&mut self) {
        self.store.invalidate_cache();
        let top_vrow = self.region_top_vrow();
        let bot_vrow = self.region_bottom_vrow();
        let top_lline = self.store.visible_to_logical(top_vrow).map(|(l, _)| l).unwrap_or(0);
        let bot_lline =
            self.store.visible_to_logical(bot_vrow).map(|(l, _)| l).unwrap_or(top_lline);
        self.store.remove_line(bot_lline);
        let new_line = self.store.insert_empty_line_at(top_lline);
        self.cur_line = new_line;
    }

    fn backspace(&mut self) {
        let col = self.current_column();
        if col > 0 {
            self.set_column(col - 1);
        }
        self.overflow = false;
    }

    fn tab(&mut self) {
        let col = self.current_column();
        let next = ((col / 8) + 1) * 8;
        self.set_column(next.min(self.vis_cols - 1));
    }

    fn carriage_return(&mut self) {
        self.set_column(0);
        self.overflow = false;
    }

    fn control(&mut self, byte: u8) {
        match byte {
            0x07 => tracing::trace!("BEL (no-op)"),
            0x08 => self.backspace(),
            0x09 => self.tab(),
            0x0A => self.line_feed(),
            0x0D => self.carriage_return(),
            _ => tracing::trace!(byte, "ignored control byte"),
        }
    }

    // ---- bare character write (SPEC_FULL §4.3 "Bare character write") ----

    fn write_bare(&mut self, codepoint: u32) {
        let codepoint = self.g0.translate(codepoint);
        self.try_join_wrap_continuation();
        let tmpl = self.template;
        let cur_offset = self.cur_offset;
        let cur_line = self.cur_line;
        let cells = self.store.get_line(cur_line, true);
        if cells.len() <= cur_offset {
            cells.resize(cur_offset + 1, Cell::blank(&tmpl));
        }
        cells[cur_offset] = Cell { codepoint, flags: tmpl.flags, fg: tmpl.fg, bg: tmpl.bg };
        self.cur_offset += 1;
        self.overflow = self.cur_offset % self.vis_cols == 0;
    }

    /// If the cursor is in pending-wrap state exactly at the end of the
    /// current line's content, and the next logical line exists (e.g.
    /// created by an earlier `erase_line` split), merge it back into the
    /// current line before writing. This is what lets typing past a
    /// split boundary re-flow instead of leaving an orphan line.
    fn try_join_wrap_continuation(&mut self) {
        if !self.overflow {
            return;
        }
        if self.cur_line + 1 >= self.store.logical_line_count() {
            return;
        }
        if self.cur_offset != self.store.count_cells(self.cur_line) {
            return;
        }
        self.store.invalidate_cache();
        let next_cells = self.store.get_line(self.cur_line + 1, false).clone();
        {
            let cells = self.store.get_line(self.cur_line, true);
            cells.extend(next_cells);
        }
        self.store.remove_line(self.cur_line + 1);
        self.overflow = false;
    }

    // ---- escape/cursor-save handling ----

    fn escape_simple(&mut self, byte: u8) {
        match byte {
            b'M' => self.reverse_index(),
            b'7' => self.save_cursor(),
            b'8' => self.restore_cursor(),
            b'=' => self.flags.insert(TtyFlags::ALT_KEYPAD),
            b'>' => self.flags.remove(TtyFlags::ALT_KEYPAD),
            b'c' => self.full_reset(),
            _ => tracing::trace!(byte, "unhandled simple escape"),
        }
    }

    fn save_cursor(&mut self) {
        self.saved_cursor =
            Some(SavedCursor { line: self.cur_line, offset: self.cur_offset, overflow: self.overflow });
    }

    fn restore_cursor(&mut self) {
        if let Some(s) = self.saved_cursor {
            self.cur_line = s.line.min(self.store.logical_line_count().saturating_sub(1));
            self.cur_offset = s.offset;
            self.overflow = s.overflow;
        }
    }

    /// `ESC c` (RIS): full terminal reset.
    fn full_reset(&mut self) {
        self.store.clear_all();
        for _ in 1..self.vis_rows {
            self.store.push_empty_line();
        }
        self.store.update_offsets(self.vis_cols);
        self.flags = TtyFlags::default();
        self.template = Cell::default();
        self.cur_line = 0;
        self.cur_offset = 0;
        self.overflow = false;
        self.top_marg = 0;
        self.bot_marg = 0;
        self.saved_cursor = None;
        self.g0 = G0Charset::default();
    }
}

impl ParserSink for Teletype {
    fn handle_bare(&mut self, codepoint: u32) {
        self.write_bare(codepoint);
    }

    fn handle_control(&mut self, byte: u8) {
        self.control(byte);
    }

    fn handle_csi(&mut self, prefix: CsiPrefix, params: &CsiParams, final_byte: u8) {
        self.dispatch_csi(prefix, params, final_byte);
    }

    fn handle_osc(&mut self, params: &OscParams, string: Option<&str>) {
        self.dispatch_osc(params, string);
    }

    fn handle_escape_simple(&mut self, byte: u8) {
        self.escape_simple(byte);
    }

    fn handle_charset_select(&mut self, intermediate: u8, designator: u8) {
        if intermediate == b'(' {
            self.g0 = G0Charset::from_designator(self.g0, designator);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{sgr_16, FG_DEFAULT};

    fn line_text(tty: &mut Teletype, lline: usize) -> String {
        tty.get_line(lline, false)
            .iter()
            .map(|c| char::from_u32(c.codepoint).unwrap_or(' '))
            .collect()
    }

    #[test]
    fn scenario_bare_text_then_cr_lf() {
        let mut tty = Teletype::new(5, 10);
        tty.feed_bytes(b"hi\r\nworld");
        assert_eq!(line_text(&mut tty, 0).trim_end(), "hi");
        assert_eq!(line_text(&mut tty, 1).trim_end(), "world");
        assert_eq!(tty.cursor_line(), 1);
        assert_eq!(tty.cursor_offset(), 5);
    }

    #[test]
    fn scenario_auto_wrap() {
        let mut tty = Teletype::new(5, 10);
        tty.feed_bytes(b"abcdefghijkl");
        assert_eq!(tty.get_line(0, false).len(), 12);
        assert_eq!(tty.logical_line_count(), 5);
        assert_eq!(tty.visible_to_logical(1), Some((0, 10)));
    }

    #[test]
    fn scenario_erase_to_end() {
        let mut tty = Teletype::new(5, 10);
        tty.feed_bytes(b"abcdef\x1b[3G\x1b[0K");
        assert_eq!(line_text(&mut tty, 0), "ab");
        assert_eq!(tty.cursor_col(), 2);
    }

    #[test]
    fn scenario_sgr_red_then_reset() {
        let mut tty = Teletype::new(5, 10);
        tty.feed_bytes(b"\x1b[31mX\x1b[0mY");
        let line = tty.get_line(0, false).clone();
        assert_eq!(line[0].fg, sgr_16(1));
        assert_eq!(line[1].fg, FG_DEFAULT);
    }

    #[test]
    fn scenario_device_status_report() {
        let mut tty = Teletype::new(5, 10);
        tty.feed_bytes(b"abc\x1b[6n");
        assert_eq!(tty.drain_output(), b"\x1b[1;4R".to_vec());
    }

    #[test]
    fn scenario_scroll_region_with_lf_at_bottom() {
        let mut tty = Teletype::new(5, 10);
        tty.feed_bytes(b"\x1b[1;3r");
        tty.feed_bytes(b"\x1b[3;1H");
        tty.feed_bytes(b"\n\n\n");
        assert_eq!(tty.logical_line_count(), 5);
        assert_eq!(tty.cursor_row(), 2);
    }

    #[test]
    fn csi_cursor_up_down_left_right() {
        let mut tty = Teletype::new(5, 10);
        tty.feed_bytes(b"\x1b[3;3H");
        assert_eq!(tty.cursor_row(), 2);
        assert_eq!(tty.cursor_col(), 2);
        tty.feed_bytes(b"\x1b[A");
        assert_eq!(tty.cursor_row(), 1);
        tty.feed_bytes(b"\x1b[2B");
        assert_eq!(tty.cursor_row(), 3);
        tty.feed_bytes(b"\x1b[2C");
        assert_eq!(tty.cursor_col(), 4);
        tty.feed_bytes(b"\x1b[D");
        assert_eq!(tty.cursor_col(), 3);
    }

    #[test]
    fn insert_and_delete_chars() {
        let mut tty = Teletype::new(5, 10);
        tty.feed_bytes(b"abcdef\x1b[3G\x1b[2@");
        assert_eq!(line_text(&mut tty, 0), "ab  cdef");
        tty.feed_bytes(b"\x1b[2P");
        assert_eq!(line_text(&mut tty, 0), "abcdef");
    }

    #[test]
    fn dec_private_mode_toggles_flag() {
        let mut tty = Teletype::new(5, 10);
        assert!(tty.has_flag(TtyFlags::AUTO_WRAP));
        tty.feed_bytes(b"\x1b[?7l");
        assert!(!tty.has_flag(TtyFlags::AUTO_WRAP));
        tty.feed_bytes(b"\x1b[?7h");
        assert!(tty.has_flag(TtyFlags::AUTO_WRAP));
    }

    #[test]
    fn osc_555_sets_screen_capture_flag() {
        let mut tty = Teletype::new(5, 10);
        assert!(!tty.has_flag(TtyFlags::SCREEN_CAPTURE_REQUEST));
        tty.feed_bytes(b"\x1b]555\x07");
        assert!(tty.has_flag(TtyFlags::SCREEN_CAPTURE_REQUEST));
    }

    #[test]
    fn save_and_restore_cursor() {
        let mut tty = Teletype::new(5, 10);
        tty.feed_bytes(b"\x1b[3;4H\x1b7");
        tty.feed_bytes(b"\x1b[1;1H\x1b8");
        assert_eq!(tty.cursor_row(), 2);
        assert_eq!(tty.cursor_col(), 3);
    }

    #[test]
    fn dec_special_graphics_remaps_bare_writes() {
        let mut tty = Teletype::new(5, 10);
        tty.feed_bytes(b"\x1b(0q\x1b(Bq");
        let line = tty.get_line(0, false).clone();
        assert_eq!(char::from_u32(line[0].codepoint).unwrap(), '\u{2500}');
        assert_eq!(char::from_u32(line[1].codepoint).unwrap(), 'q');
    }

    #[test]
    fn erase_screen_all_clears_visible_rows() {
        let mut tty = Teletype::new(5, 10);
        tty.feed_bytes(b"hello\r\nworld");
        tty.feed_bytes(b"\x1b[2J");
        assert_eq!(tty.get_line(0, false).len(), 0);
        assert_eq!(tty.get_line(1, false).len(), 0);
    }

    #[test]
    fn erase_idempotence() {
        let mut tty = Teletype::new(5, 10);
        tty.feed_bytes(b"hello");
        tty.feed_bytes(b"\x1b[2J");
        let once = tty.get_line(0, false).clone();
        tty.feed_bytes(b"\x1b[2J");
        let twice = tty.get_line(0, false).clone();
        assert_eq!(once, twice);
    }
}
