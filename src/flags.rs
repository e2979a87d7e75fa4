//! Terminal mode flags (SPEC_FULL "Teletype state").
//!
//! Grounded on `original_source/app/teletype.h`'s flag bit-set: DEC
//! private modes plus the non-standard `CUTSC` screen-capture request.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TtyFlags: u16 {
        /// DECAWM: auto-wrap at the right margin.
        const AUTO_WRAP          = 1 << 0;
        /// DECTCEM: cursor is visible.
        const CURSOR_ENABLE      = 1 << 1;
        /// DECBKM: backspace key sends DEL instead of BS.
        const BACKARROW_DELETE   = 1 << 2;
        /// DECCKM: application cursor keys.
        const APP_CURSOR_KEYS    = 1 << 3;
        /// XTAS: alternate screen buffer active.
        const ALT_SCREEN         = 1 << 4;
        /// XTSC: alternate-screen cursor was saved on entry.
        const SAVE_CURSOR        = 1 << 5;
        /// XTBP: bracketed-paste mode.
        const BRACKETED_PASTE    = 1 << 6;
        /// ATTBC: blinking cursor.
        const BLINK_CURSOR       = 1 << 7;
        /// XT8BM: eight-bit controls accepted.
        const EIGHT_BIT          = 1 << 8;
        /// DECAKM: application keypad mode.
        const ALT_KEYPAD         = 1 << 9;
        /// CUTSC: host should perform a screen capture on next frame.
        const SCREEN_CAPTURE_REQUEST = 1 << 10;
    }
}

impl Default for TtyFlags {
    fn default() -> Self {
        TtyFlags::AUTO_WRAP | TtyFlags::CURSOR_ENABLE | TtyFlags::BACKARROW_DELETE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let f = TtyFlags::default();
        assert!(f.contains(TtyFlags::AUTO_WRAP));
        assert!(f.contains(TtyFlags::CURSOR_ENABLE));
        assert!(f.contains(TtyFlags::BACKARROW_DELETE));
        assert!(!f.contains(TtyFlags::APP_CURSOR_KEYS));
        assert!(!f.contains(TtyFlags::SCREEN_CAPTURE_REQUEST));
    }
}
