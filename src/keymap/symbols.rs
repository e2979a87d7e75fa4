//! Named symbol tables for the keymap's `flag`/`code`/`mod`/`char`
//! namespaces (SPEC_FULL §4.5 "Symbol namespaces").

use std::str::FromStr;

use strum_macros::{Display, EnumString};

use crate::flags::TtyFlags;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ModSet: u8 {
        const SHIFT     = 1 << 0;
        const CONTROL   = 1 << 1;
        const ALT       = 1 << 2;
        const SUPER     = 1 << 3;
        const CAPSLOCK  = 1 << 4;
        const NUMLOCK   = 1 << 5;
    }
}

pub fn resolve_mod(name: &str) -> Option<ModSet> {
    Some(match name {
        "shift" => ModSet::SHIFT,
        "control" => ModSet::CONTROL,
        "alt" => ModSet::ALT,
        "super" => ModSet::SUPER,
        "capslock" => ModSet::CAPSLOCK,
        "numlock" => ModSet::NUMLOCK,
        _ => return None,
    })
}

/// An escape-sequence introducer in the `code` namespace. The rule
/// grammar's spelling of each variant (`CSI`, `SS2`, `SS3`) is the
/// `strum` serialization, so lexing a `code.*` token is a single
/// `FromStr` call instead of a hand-maintained match arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum CodeKind {
    #[strum(serialize = "CSI")]
    Csi,
    #[strum(serialize = "SS2")]
    Ss2,
    #[strum(serialize = "SS3")]
    Ss3,
}

impl CodeKind {
    pub fn bytes(self) -> &'static [u8] {
        match self {
            CodeKind::Csi => b"\x1b[",
            CodeKind::Ss2 => b"\x1bN",
            CodeKind::Ss3 => b"\x1bO",
        }
    }
}

pub fn resolve_code(name: &str) -> Option<CodeKind> {
    CodeKind::from_str(name).ok()
}

/// Resolve a `char` namespace identifier to its C0 (or DEL/SP) byte
/// value, before any `+N` arithmetic offset is applied.
pub fn resolve_char(name: &str) -> Option<u8> {
    Some(match name {
        "NUL" => 0x00,
        "SOH" => 0x01,
        "STX" => 0x02,
        "ETX" => 0x03,
        "EOT" => 0x04,
        "ENQ" => 0x05,
        "ACK" => 0x06,
        "BEL" => 0x07,
        "BS" => 0x08,
        "HT" => 0x09,
        "LF" => 0x0A,
        "VT" => 0x0B,
        "FF" => 0x0C,
        "CR" => 0x0D,
        "SO" => 0x0E,
        "SI" => 0x0F,
        "DLE" => 0x10,
        "DC1" => 0x11,
        "DC2" => 0x12,
        "DC3" => 0x13,
        "DC4" => 0x14,
        "NAK" => 0x15,
        "SYN" => 0x16,
        "ETB" => 0x17,
        "CAN" => 0x18,
        "EM" => 0x19,
        "SUB" => 0x1A,
        "ESC" => 0x1B,
        "FS" => 0x1C,
        "GS" => 0x1D,
        "RS" => 0x1E,
        "US" => 0x1F,
        "SP" => 0x20,
        "DEL" => 0x7F,
        _ => return None,
    })
}

/// Resolve a `flag` namespace identifier to the corresponding terminal
/// mode flag.
pub fn resolve_flag(name: &str) -> Option<TtyFlags> {
    Some(match name {
        "auto_wrap" => TtyFlags::AUTO_WRAP,
        "cursor_enable" => TtyFlags::CURSOR_ENABLE,
        "backarrow_delete" => TtyFlags::BACKARROW_DELETE,
        "app_cursor_keys" => TtyFlags::APP_CURSOR_KEYS,
        "alt_screen" => TtyFlags::ALT_SCREEN,
        "save_cursor" => TtyFlags::SAVE_CURSOR,
        "bracketed_paste" => TtyFlags::BRACKETED_PASTE,
        "blink_cursor" => TtyFlags::BLINK_CURSOR,
        "eight_bit" => TtyFlags::EIGHT_BIT,
        "alt_keypad" => TtyFlags::ALT_KEYPAD,
        "screen_capture_request" => TtyFlags::SCREEN_CAPTURE_REQUEST,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_symbols() {
        assert_eq!(resolve_mod("control"), Some(ModSet::CONTROL));
        assert_eq!(resolve_code("SS3"), Some(CodeKind::Ss3));
        assert_eq!(resolve_char("SOH"), Some(0x01));
        assert_eq!(resolve_flag("app_cursor_keys"), Some(TtyFlags::APP_CURSOR_KEYS));
    }

    #[test]
    fn unknown_symbols_resolve_to_none() {
        assert_eq!(resolve_mod("bogus"), None);
        assert_eq!(resolve_code("bogus"), None);
        assert_eq!(resolve_char("bogus"), None);
        assert_eq!(resolve_flag("bogus"), None);
    }

    #[test]
    fn code_kind_display_round_trips_through_resolve_code() {
        for kind in [CodeKind::Csi, CodeKind::Ss2, CodeKind::Ss3] {
            assert_eq!(resolve_code(&kind.to_string()), Some(kind));
        }
    }
}
