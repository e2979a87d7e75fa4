//! SGR (Select Graphic Rendition) parameter handling (SPEC_FULL §4.3 "SGR
//! palette").
//!
//! Grounded on the teacher's `sgr_ops.rs` shim (attribute-flag toggling
//! driven by a CSI parameter match) generalized to this crate's cell
//! template (flags + fg + bg) instead of `TuiStyle`.

use crate::cell::{Cell, StyleFlags};
use crate::color::{self, BG_DEFAULT, FG_DEFAULT};
use crate::parser::params::CsiParams;

/// Apply one SGR CSI's worth of parameters to a running style template,
/// consuming multi-parameter forms (`38;5;N`, `38;2;R;G;B`) as they go.
pub fn apply_sgr(template: &mut Cell, params: &CsiParams) {
    if params.is_empty() {
        *template = Cell { codepoint: template.codepoint, flags: StyleFlags::empty(), fg: FG_DEFAULT, bg: BG_DEFAULT };
        return;
    }
    let mut i = 0usize;
    while i < params.len() {
        let p = params[i];
        match p {
            0 => {
                template.flags = StyleFlags::empty();
                template.fg = FG_DEFAULT;
                template.bg = BG_DEFAULT;
            }
            1 => template.flags.insert(StyleFlags::BOLD),
            2 => template.flags.insert(StyleFlags::FAINT),
            3 => template.flags.insert(StyleFlags::ITALIC),
            4 => template.flags.insert(StyleFlags::UNDERLINE),
            5 => template.flags.insert(StyleFlags::BLINK),
            6 => template.flags.insert(StyleFlags::RAPID_BLINK),
            7 => template.flags.insert(StyleFlags::INVERSE),
            8 => template.flags.insert(StyleFlags::HIDDEN),
            9 => template.flags.insert(StyleFlags::STRIKEOUT),
            20 => template.flags.insert(StyleFlags::FRAKTUR),
            21 => template.flags.insert(StyleFlags::DOUBLE_UNDERLINE),
            22 => template.flags.remove(StyleFlags::BOLD | StyleFlags::FAINT),
            23 => template.flags.remove(StyleFlags::ITALIC | StyleFlags::FRAKTUR),
            24 => template.flags.remove(StyleFlags::UNDERLINE | StyleFlags::DOUBLE_UNDERLINE),
            25 => template.flags.remove(StyleFlags::BLINK | StyleFlags::RAPID_BLINK),
            27 => template.flags.remove(StyleFlags::INVERSE),
            28 => template.flags.remove(StyleFlags::HIDDEN),
            29 => template.flags.remove(StyleFlags::STRIKEOUT),
            30..=37 => template.fg = color::sgr_16((p - 30) as u8),
            38 => {
                let (color, consumed) = extended_color(params, i + 1);
                if let Some(c) = color {
                    template.fg = c;
                }
                i += consumed;
            }
            39 => template.fg = FG_DEFAULT,
            40..=47 => template.bg = color::sgr_16((p - 40) as u8),
            48 => {
                let (color, consumed) = extended_color(params, i + 1);
                if let Some(c) = color {
                    template.bg = c;
                }
                i += consumed;
            }
            49 => template.bg = BG_DEFAULT,
            90..=97 => template.fg = color::sgr_16((p - 90 + 8) as u8),
            100..=107 => template.bg = color::sgr_16((p - 100 + 8) as u8),
            _ => tracing::trace!(param = p, "unrecognized SGR parameter"),
        }
        i += 1;
    }
}

/// Parse a `5;N` (256-palette) or `2;R;G;B` (truecolor) extended-color
/// form starting at `params[start]`. Returns the resolved color (if any)
/// and the number of additional parameters consumed beyond the `38`/`48`
/// selector itself.
fn extended_color(params: &CsiParams, start: usize) -> (Option<u32>, usize) {
    match params.get(start) {
        Some(&5) => match params.get(start + 1) {
            Some(&n) => (Some(color::xterm_256(n as u8)), 2),
            None => (None, 1),
        },
        Some(&2) => match (params.get(start + 1), params.get(start + 2), params.get(start + 3)) {
            (Some(&r), Some(&g), Some(&b)) => {
                (Some(color::truecolor(r as u8, g as u8, b as u8)), 4)
            }
            _ => (None, 1),
        },
        _ => (None, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::params::CsiParams;

    fn params(values: &[i64]) -> CsiParams {
        values.iter().copied().collect()
    }

    #[test]
    fn reset_clears_everything() {
        let mut tmpl = Cell { flags: StyleFlags::BOLD, fg: 0x1, bg: 0x2, codepoint: 0 };
        apply_sgr(&mut tmpl, &params(&[0]));
        assert_eq!(tmpl.flags, StyleFlags::empty());
        assert_eq!(tmpl.fg, FG_DEFAULT);
        assert_eq!(tmpl.bg, BG_DEFAULT);
    }

    #[test]
    fn red_foreground_then_reset() {
        let mut tmpl = Cell::default();
        apply_sgr(&mut tmpl, &params(&[31]));
        assert_eq!(tmpl.fg, color::sgr_16(1));
        apply_sgr(&mut tmpl, &params(&[0]));
        assert_eq!(tmpl.fg, FG_DEFAULT);
    }

    #[test]
    fn bold_then_clear_bold_and_faint() {
        let mut tmpl = Cell::default();
        apply_sgr(&mut tmpl, &params(&[1]));
        assert!(tmpl.flags.contains(StyleFlags::BOLD));
        apply_sgr(&mut tmpl, &params(&[22]));
        assert!(!tmpl.flags.contains(StyleFlags::BOLD));
    }

    #[test]
    fn truecolor_foreground() {
        let mut tmpl = Cell::default();
        apply_sgr(&mut tmpl, &params(&[38, 2, 10, 20, 30]));
        assert_eq!(tmpl.fg, color::truecolor(10, 20, 30));
    }

    #[test]
    fn palette_256_background() {
        let mut tmpl = Cell::default();
        apply_sgr(&mut tmpl, &params(&[48, 5, 196]));
        assert_eq!(tmpl.bg, color::xterm_256(196));
    }

    #[test]
    fn bright_fg_via_90_range() {
        let mut tmpl = Cell::default();
        apply_sgr(&mut tmpl, &params(&[91]));
        assert_eq!(tmpl.fg, color::sgr_16(9));
    }
}
