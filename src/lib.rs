//! Teletype core: the PTY byte-stream, ANSI/VT/xterm escape-sequence
//! parser, scroll-back line store, and keymap translator that sit behind
//! a graphical terminal emulator's renderer.
//!
//! This crate owns everything upstream of glyph rasterization and GPU
//! draw-list construction: it turns a PTY's raw byte stream into a
//! queryable grid of styled cells, and turns host key/mouse events into
//! the byte sequences (or copy/paste operations) a shell expects. A
//! rendering collaborator reads [`teletype::Teletype`] through the
//! renderer-facing queries documented on that type; it never reaches
//! into [`line_store`] or [`parser`] directly.
//!
//! ```text
//! PTY fd --[IoLoop]--> Parser --> Teletype --> LineStore
//!                                     ^
//!                                     |
//! host key/mouse events --[Keymap]----+
//! ```
//!
//! Module map, leaves first:
//! - [`cell`] / [`color`]: the `Cell` style/color representation.
//! - [`line_store`]: packed/unpacked line storage, LRU-style cache, and
//!   the visible-row/logical-line coordinate index.
//! - [`parser`]: the byte-level escape-sequence state machine.
//! - [`teletype`]: cursor, scroll region, SGR, erasure, and CSI/OSC
//!   dispatch built on top of `line_store` and `parser`.
//! - [`io_loop`]: the ring-buffered, non-blocking PTY read/write loop.
//! - [`keymap`]: the declarative key-binding rule language.
//! - [`selection`]: visible-span selection resolved to logical
//!   coordinates.
//! - [`pty`]: the PTY process collaborator (fork/exec, resize).
//! - [`logging`]: opt-in `tracing-subscriber` setup for hosts.
//! - [`error`]: typed errors for PTY, keymap, and logging setup.

pub mod cell;
pub mod color;
pub mod error;
pub mod flags;
pub mod io_loop;
pub mod keymap;
pub mod line_store;
pub mod logging;
pub mod parser;
pub mod pty;
pub mod selection;
pub mod teletype;
pub mod time;

pub use cell::{Cell, StyleFlags};
pub use flags::TtyFlags;
pub use io_loop::{IoLoop, IoStatus};
pub use keymap::{Clipboard, KeyPress, Keymap, Translation};
pub use pty::{Pty, WinSize};
pub use selection::{CellRef, Selection};
pub use teletype::Teletype;
