//! Byte-level escape-sequence parser (SPEC_FULL §4.2).
//!
//! The parser owns no terminal semantics itself; it decodes the byte
//! stream into semantic events and calls back into a [`ParserSink`] (the
//! [`crate::teletype::Teletype`]) to apply them. This separation mirrors
//! the teacher's `Perform` trait / dispatch shim split
//! (`vt_100_ansi_parser/perform.rs`), but the state machine itself is
//! hand-rolled rather than delegated to a tokenizer crate.

pub mod params;
pub mod state;

use params::{CsiParams, OscParams, MAX_CSI_ARGS};
use state::{CsiPrefix, ParserState};

/// Semantic events the parser raises as it decodes bytes. Implemented by
/// [`crate::teletype::Teletype`].
pub trait ParserSink {
    fn handle_bare(&mut self, codepoint: u32);
    fn handle_control(&mut self, byte: u8);
    fn handle_csi(&mut self, prefix: CsiPrefix, params: &CsiParams, final_byte: u8);
    fn handle_osc(&mut self, params: &OscParams, string: Option<&str>);
    /// A simple (argument-less) ESC sequence: `M`, `7`, `8`, `=`, `>`, `c`.
    fn handle_escape_simple(&mut self, byte: u8);
    /// `ESC ( X` / `ESC ) X` etc: `intermediate` is `(`, `)`, `*`, `+`,
    /// `-`, `.`, or `/`; `designator` is the charset byte that follows.
    fn handle_charset_select(&mut self, intermediate: u8, designator: u8);
}

pub struct Parser {
    state: ParserState,
    utf_code: u32,
    csi_prefix: CsiPrefix,
    csi_params: CsiParams,
    csi_acc: i64,
    csi_acc_present: bool,
    osc_params: OscParams,
    osc_acc: i64,
    osc_acc_present: bool,
    osc_string: String,
    charset_intermediate: u8,
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            state: ParserState::Normal,
            utf_code: 0,
            csi_prefix: CsiPrefix::None,
            csi_params: CsiParams::new(),
            csi_acc: 0,
            csi_acc_present: false,
            osc_params: OscParams::new(),
            osc_acc: 0,
            osc_acc_present: false,
            osc_string: String::new(),
            charset_intermediate: 0,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    fn reset_csi(&mut self) {
        self.csi_prefix = CsiPrefix::None;
        self.csi_params.clear();
        self.csi_acc = 0;
        self.csi_acc_present = false;
    }

    fn reset_osc(&mut self) {
        self.osc_params.clear();
        self.osc_acc = 0;
        self.osc_acc_present = false;
        self.osc_string.clear();
    }

    fn push_csi_arg(&mut self) {
        if self.csi_params.len() < MAX_CSI_ARGS {
            self.csi_params.push(self.csi_acc);
        } else {
            tracing::trace!(value = self.csi_acc, "discarding CSI argument past the cap");
        }
        self.csi_acc = 0;
        self.csi_acc_present = false;
    }

    fn push_osc_arg(&mut self) {
        self.osc_params.push(self.osc_acc);
        self.osc_acc = 0;
        self.osc_acc_present = false;
    }

    /// Feed one byte through the state machine, invoking `sink` for any
    /// semantic event it completes.
    pub fn feed_byte(&mut self, byte: u8, sink: &mut impl ParserSink) {
        match self.state {
            ParserState::Normal => self.feed_normal(byte, sink),
            ParserState::Utf4 => {
                if (0x80..=0xBF).contains(&byte) {
                    self.utf_code = (self.utf_code << 6) | (byte as u32 & 0x3F);
                    self.state = ParserState::Utf3;
                } else {
                    tracing::trace!(byte, "invalid utf8 continuation, resetting");
                    self.state = ParserState::Normal;
                    self.feed_normal(byte, sink);
                }
            }
            ParserState::Utf3 => {
                if (0x80..=0xBF).contains(&byte) {
                    self.utf_code = (self.utf_code << 6) | (byte as u32 & 0x3F);
                    self.state = ParserState::Utf2;
                } else {
                    self.state = ParserState::Normal;
                    self.feed_normal(byte, sink);
                }
            }
            ParserState::Utf2 => {
                if (0x80..=0xBF).contains(&byte) {
                    self.utf_code = (self.utf_code << 6) | (byte as u32 & 0x3F);
                    self.state = ParserState::Normal;
                    sink.handle_bare(self.utf_code);
                } else {
                    self.state = ParserState::Normal;
                    self.feed_normal(byte, sink);
                }
            }
            ParserState::Escape => self.feed_escape(byte, sink),
            ParserState::Charset => {
                sink.handle_charset_select(self.charset_intermediate, byte);
                self.state = ParserState::Normal;
            }
            ParserState::Csi0 => self.feed_csi0(byte, sink),
            ParserState::Csi => self.feed_csi(byte, sink),
            ParserState::Osc0 => self.feed_osc0(byte, sink),
            ParserState::Osc => self.feed_osc(byte, sink),
            ParserState::OscString => self.feed_osc_string(byte, sink),
        }
    }

    fn feed_normal(&mut self, byte: u8, sink: &mut impl ParserSink) {
        match byte {
            0xF0..=0xF7 => {
                self.utf_code = (byte & 0x07) as u32;
                self.state = ParserState::Utf4;
            }
            0xE0..=0xEF => {
                self.utf_code = (byte & 0x0F) as u32;
                self.state = ParserState::Utf3;
            }
            0xC0..=0xDF => {
                self.utf_code = (byte & 0x1F) as u32;
                self.state = ParserState::Utf2;
            }
            0xF8..=0xFF => {
                tracing::trace!(byte, "dropping overlong utf8 lead byte");
            }
            0x1B => {
                self.reset_csi();
                self.state = ParserState::Escape;
            }
            0x00..=0x1F => sink.handle_control(byte),
            _ => sink.handle_bare(byte as u32),
        }
    }

    fn feed_escape(&mut self, byte: u8, sink: &mut impl ParserSink) {
        match byte {
            b'[' => self.state = ParserState::Csi0,
            b']' => {
                self.reset_osc();
                self.state = ParserState::Osc0;
            }
            b'(' | b')' | b'*' | b'+' | b'-' | b'.' | b'/' => {
                self.charset_intermediate = byte;
                self.state = ParserState::Charset;
            }
            b'M' | b'7' | b'8' | b'=' | b'>' | b'c' => {
                sink.handle_escape_simple(byte);
                self.state = ParserState::Normal;
            }
            _ => {
                tracing::trace!(byte, "unrecognized ESC final byte");
                self.state = ParserState::Normal;
            }
        }
    }

    fn feed_csi0(&mut self, byte: u8, sink: &mut impl ParserSink) {
        match byte {
            b'?' => {
                self.csi_prefix = CsiPrefix::Dec;
                self.state = ParserState::Csi;
            }
            b'>' => {
                self.csi_prefix = CsiPrefix::Gt;
                self.state = ParserState::Csi;
            }
            b'=' => {
                self.csi_prefix = CsiPrefix::Eq;
                self.state = ParserState::Csi;
            }
            b'0'..=b'9' => {
                self.state = ParserState::Csi;
                self.feed_csi(byte, sink);
            }
            0x40..=0x7E => {
                self.push_csi_arg_if_started();
                sink.handle_csi(self.csi_prefix, &self.csi_params, byte);
                self.state = ParserState::Normal;
            }
            _ => {
                tracing::trace!(byte, state = %self.state, "unexpected byte in CSI introducer");
            }
        }
    }

    fn push_csi_arg_if_started(&mut self) {
        if self.csi_acc_present || !self.csi_params.is_empty() {
            self.push_csi_arg();
        }
    }

    fn feed_csi(&mut self, byte: u8, sink: &mut impl ParserSink) {
        match byte {
            b'0'..=b'9' => {
                self.csi_acc = self.csi_acc * 10 + (byte - b'0') as i64;
                self.csi_acc_present = true;
            }
            b';' => self.push_csi_arg(),
            0x40..=0x7E => {
                self.push_csi_arg_if_started();
                sink.handle_csi(self.csi_prefix, &self.csi_params, byte);
                self.state = ParserState::Normal;
            }
            _ => {
                tracing::trace!(byte, state = %self.state, "unexpected byte in CSI parameters");
            }
        }
    }

    fn feed_osc0(&mut self, byte: u8, sink: &mut impl ParserSink) {
        match byte {
            b'0'..=b'9' => {
                self.state = ParserState::Osc;
                self.feed_osc(byte, sink);
            }
            0x07 => {
                sink.handle_osc(&self.osc_params, None);
                self.state = ParserState::Normal;
            }
            _ => {
                self.state = ParserState::OscString;
                self.feed_osc_string(byte, sink);
            }
        }
    }

    fn feed_osc(&mut self, byte: u8, sink: &mut impl ParserSink) {
        match byte {
            b'0'..=b'9' => {
                self.osc_acc = self.osc_acc * 10 + (byte - b'0') as i64;
                self.osc_acc_present = true;
            }
            b';' => {
                self.push_osc_arg();
                if self.osc_params.as_slice() == [7] {
                    self.state = ParserState::OscString;
                }
            }
            0x07 => {
                if self.osc_acc_present || self.osc_params.is_empty() {
                    self.push_osc_arg();
                }
                sink.handle_osc(&self.osc_params, None);
                self.state = ParserState::Normal;
            }
            _ => {
                // A payload that isn't numeric (e.g. window-title text)
                // starts here; fold the pending arg and switch to raw
                // string capture so we don't lose the rest of the OSC.
                if self.osc_acc_present {
                    self.push_osc_arg();
                }
                self.state = ParserState::OscString;
                self.feed_osc_string(byte, sink);
            }
        }
    }

    fn feed_osc_string(&mut self, byte: u8, sink: &mut impl ParserSink) {
        match byte {
            0x07 => {
                sink.handle_osc(&self.osc_params, Some(&self.osc_string));
                self.state = ParserState::Normal;
            }
            _ => self.osc_string.push(byte as char),
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        bare: RefCell<Vec<u32>>,
        csi: RefCell<Vec<(CsiPrefix, Vec<i64>, u8)>>,
        osc: RefCell<Vec<(Vec<i64>, Option<String>)>>,
        control: RefCell<Vec<u8>>,
    }

    impl ParserSink for Recorder {
        fn handle_bare(&mut self, codepoint: u32) {
            self.bare.borrow_mut().push(codepoint);
        }
        fn handle_control(&mut self, byte: u8) {
            self.control.borrow_mut().push(byte);
        }
        fn handle_csi(&mut self, prefix: CsiPrefix, params: &CsiParams, final_byte: u8) {
            self.csi.borrow_mut().push((prefix, params.to_vec(), final_byte));
        }
        fn handle_osc(&mut self, params: &OscParams, string: Option<&str>) {
            self.osc.borrow_mut().push((params.to_vec(), string.map(String::from)));
        }
        fn handle_escape_simple(&mut self, _byte: u8) {}
        fn handle_charset_select(&mut self, _intermediate: u8, _designator: u8) {}
    }

    fn run(bytes: &[u8]) -> Recorder {
        let mut parser = Parser::new();
        let mut rec = Recorder::default();
        for &b in bytes {
            parser.feed_byte(b, &mut rec);
        }
        rec
    }

    #[test]
    fn decodes_ascii_bare_chars() {
        let rec = run(b"hi");
        assert_eq!(*rec.bare.borrow(), vec![b'h' as u32, b'i' as u32]);
    }

    #[test]
    fn decodes_multibyte_utf8() {
        let rec = run("日".as_bytes());
        assert_eq!(*rec.bare.borrow(), vec!['日' as u32]);
    }

    #[test]
    fn decodes_csi_with_two_args() {
        let rec = run(b"\x1b[3;4H");
        assert_eq!(*rec.csi.borrow(), vec![(CsiPrefix::None, vec![3, 4], b'H')]);
    }

    #[test]
    fn decodes_csi_dec_private() {
        let rec = run(b"\x1b[?25h");
        assert_eq!(*rec.csi.borrow(), vec![(CsiPrefix::Dec, vec![25], b'h')]);
    }

    #[test]
    fn decodes_sgr_reset() {
        let rec = run(b"\x1b[0m");
        assert_eq!(*rec.csi.borrow(), vec![(CsiPrefix::None, vec![0], b'm')]);
    }

    #[test]
    fn decodes_osc_numeric_only() {
        let rec = run(b"\x1b]555\x07");
        assert_eq!(*rec.osc.borrow(), vec![(vec![555], None)]);
    }

    #[test]
    fn decodes_osc_string_payload() {
        let rec = run(b"\x1b]0;my title\x07");
        assert_eq!(*rec.osc.borrow(), vec![(vec![0], Some("my title".to_string()))]);
    }

    #[test]
    fn caps_csi_args_at_five() {
        let rec = run(b"\x1b[1;2;3;4;5;6;7m");
        let (_, args, _) = &rec.csi.borrow()[0];
        assert_eq!(args.len(), 5);
        assert_eq!(args, &vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn control_bytes_go_to_handle_control() {
        let rec = run(b"a\rb\n");
        assert_eq!(*rec.control.borrow(), vec![b'\r', b'\n']);
    }
}
