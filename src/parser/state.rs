//! Named parser states (SPEC_FULL §4.2).
//!
//! A hand-rolled byte state machine, not a delegated tokenizer crate: the
//! exact state set below, including `Csi0`'s "reprocess this byte on a
//! digit" transition, is a first-class, directly testable part of this
//! component.

/// Which introducer byte started the current CSI, distinguishing DEC
/// private modes (`CSI ? ...`) from plain and vendor-prefixed CSIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsiPrefix {
    None,
    /// `CSI ? ...` — DEC private mode set/reset.
    Dec,
    /// `CSI > ...`
    Gt,
    /// `CSI = ...`
    Eq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ParserState {
    Normal,
    Utf2,
    Utf3,
    Utf4,
    Escape,
    Charset,
    Csi0,
    Csi,
    Osc0,
    Osc,
    OscString,
}
