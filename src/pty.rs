//! PTY process collaborator (SPEC_FULL §6.1).
//!
//! Grounded on the teacher's `core/pty/common_impl.rs` and
//! `core/pty/pty_core.rs` (`PtyCommandBuilder`, `create_pty_pair`,
//! `spawn_command_in_pty`) but reshaped to the synchronous, non-tokio
//! `exec`/`winsize` contract this crate's single-threaded `IoLoop`
//! drives directly rather than through reader/writer tasks.

use std::path::PathBuf;

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};

use crate::error::PtyError;

/// One axis pair describing a terminal's size in character cells and,
/// where the host can report it, pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinSize {
    pub rows: u16,
    pub cols: u16,
    pub pixel_width: u16,
    pub pixel_height: u16,
}

impl WinSize {
    pub fn new(rows: u16, cols: u16) -> Self {
        WinSize { rows, cols, pixel_width: 0, pixel_height: 0 }
    }

    fn to_pty_size(self) -> PtySize {
        PtySize {
            rows: self.rows,
            cols: self.cols,
            pixel_width: self.pixel_width,
            pixel_height: self.pixel_height,
        }
    }
}

/// Owns the master side of a forked PTY and the child handle, exposing
/// the fd as an opaque, poll-able byte duplex to [`crate::io_loop::IoLoop`].
pub struct Pty {
    master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
    reader: Box<dyn std::io::Read + Send>,
    writer: Box<dyn std::io::Write + Send>,
}

impl Pty {
    /// Fork+exec `path argv...` with the child's controlling terminal
    /// sized to `winsize`. `go_home`, when false, keeps the child's
    /// working directory at the caller's current directory instead of
    /// `$HOME` (the default a bare `CommandBuilder` would otherwise pick
    /// up from the shell's own startup files).
    pub fn exec(
        winsize: WinSize,
        path: &str,
        argv: &[String],
        go_home: bool,
    ) -> Result<Self, PtyError> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(winsize.to_pty_size())
            .map_err(|e| PtyError::Spawn(to_io_error(e)))?;

        let mut cmd = CommandBuilder::new(path);
        cmd.args(argv);
        if !go_home {
            let cwd: PathBuf =
                std::env::current_dir().map_err(PtyError::Spawn)?;
            cmd.cwd(cwd);
        }

        let child =
            pair.slave.spawn_command(cmd).map_err(|e| PtyError::Spawn(to_io_error(e)))?;
        drop(pair.slave);

        let reader = pair.master.try_clone_reader().map_err(|e| PtyError::NonBlocking(to_io_error(e)))?;
        let writer = pair.master.take_writer().map_err(|e| PtyError::NonBlocking(to_io_error(e)))?;

        Ok(Pty { master: pair.master, child, reader, writer })
    }

    /// Resize the child's controlling terminal and send `SIGWINCH` to its
    /// process group (the latter is `portable-pty`'s responsibility on
    /// `resize`, matching the reference's explicit signal send).
    pub fn winsize(&mut self, winsize: WinSize) -> Result<bool, PtyError> {
        self.master
            .resize(winsize.to_pty_size())
            .map(|()| true)
            .map_err(|e| PtyError::Resize(to_io_error(e)))
    }

    pub fn reader(&mut self) -> &mut (dyn std::io::Read + Send) {
        &mut *self.reader
    }

    pub fn writer(&mut self) -> &mut (dyn std::io::Write + Send) {
        &mut *self.writer
    }

    /// True once the child has exited. `IoLoop` treats this the same as
    /// an EOF read: stop polling and let the host close the loop.
    pub fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }

    /// The master fd, for registering readable/writable interest with a
    /// poller. `IoLoop` only ever borrows this to register; all actual
    /// reads/writes go through [`Pty::reader`]/[`Pty::writer`].
    #[cfg(unix)]
    pub fn master_raw_fd(&self) -> Option<std::os::fd::RawFd> {
        self.master.as_raw_fd()
    }
}

fn to_io_error(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_spawns_true_and_reports_clean_exit() {
        let mut pty = Pty::exec(WinSize::new(24, 80), "/bin/sh", &["-c".into(), "exit 0".into()], false)
            .expect("spawn /bin/sh");
        // Give the child a moment to run; has_exited is polled, not blocking.
        for _ in 0..100 {
            if pty.has_exited() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert!(pty.has_exited());
    }
}
