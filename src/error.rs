//! Typed errors for the teletype core.
//!
//! Fallible *construction* (spawning the PTY collaborator, compiling a
//! keymap from disk) is reported through [`miette::Result`] so a host gets
//! a diagnostic-rendered error at startup. Once a [`crate::teletype::Teletype`]
//! is running, malformed escape sequences never raise an error — they are
//! logged and dropped, matching the reference implementation.

use thiserror::Error;

/// Errors raised while spawning or driving the PTY collaborator.
#[derive(Debug, Error)]
pub enum PtyError {
    #[error("failed to spawn child process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed to resize pty: {0}")]
    Resize(#[source] std::io::Error),

    #[error("pty master handle unavailable")]
    NoMaster,

    #[error("non-blocking read/write setup failed: {0}")]
    NonBlocking(#[source] std::io::Error),

    #[error("i/o error on pty fd: {0}")]
    Io(#[source] std::io::Error),
}

/// One failed rule while compiling a keymap file. Unlike protocol errors,
/// these are surfaced to the caller: a rule that fails to compile is
/// skipped, and the offending line/reason is reported so a host can show
/// the user which rule failed.
#[derive(Debug, Error)]
#[error("keymap rule error at line {line}: {reason}")]
pub struct KeymapError {
    pub line: usize,
    pub reason: String,
}

/// Result of compiling a keymap: the rules that did compile, plus any
/// per-rule errors. A keymap with some bad rules is still usable.
#[derive(Debug)]
pub struct KeymapCompileReport<T> {
    pub value: T,
    pub errors: Vec<KeymapError>,
}

/// Errors raised by the logging facade's fallible setup (e.g. creating a
/// rolling file appender in a directory that cannot be created).
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
