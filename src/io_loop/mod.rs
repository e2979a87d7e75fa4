//! Non-blocking PTY I/O loop: two ring buffers, a single `mio` poll
//! tick, and `proc()` draining the input ring through the byte-level
//! parser (SPEC_FULL §4.4).
//!
//! Grounded in shape on the teacher's `core/pty/common_impl.rs`
//! reader/writer task split, reworked into the spec's single
//! cooperative-scheduling poll tick rather than a tokio task pair — see
//! `DESIGN.md` for why `mio` stands in for the reference's raw
//! `poll(2)`.

pub mod ring;

use std::time::Duration;

use ring::{Ring, DEFAULT_RING_CAPACITY};

use crate::pty::Pty;
use crate::teletype::Teletype;

/// Default poll tick timeout.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(1);

/// Max bytes written to the PTY fd per writable tick, matching the
/// reference's conservative per-tick write cap.
const MAX_WRITE_PER_TICK: usize = 128;

#[cfg(unix)]
mod unix_poll {
    use std::os::fd::RawFd;

    use mio::unix::SourceFd;
    use mio::{Events, Interest, Poll, Token};
    use signal_hook::consts::SIGWINCH;
    use signal_hook_mio::v1_0::Signals;

    const PTY_TOKEN: Token = Token(0);
    const SIGNAL_TOKEN: Token = Token(1);

    pub struct PollSource {
        poll: Poll,
        events: Events,
        signals: Signals,
        pty_fd: RawFd,
    }

    impl PollSource {
        pub fn new(pty_fd: RawFd) -> std::io::Result<Self> {
            let poll = Poll::new()?;
            let mut signals = Signals::new([SIGWINCH])?;
            poll.registry().register(
                &mut SourceFd(&pty_fd),
                PTY_TOKEN,
                Interest::READABLE | Interest::WRITABLE,
            )?;
            poll.registry().register(&mut signals, SIGNAL_TOKEN, Interest::READABLE)?;
            Ok(PollSource { poll, events: Events::with_capacity(8), signals, pty_fd })
        }

        /// Poll once. Returns `(readable, writable, resized)`.
        pub fn tick(&mut self, timeout: std::time::Duration) -> std::io::Result<(bool, bool, bool)> {
            self.events.clear();
            self.poll.poll(&mut self.events, Some(timeout))?;
            let mut readable = false;
            let mut writable = false;
            let mut resized = false;
            for ev in self.events.iter() {
                match ev.token() {
                    PTY_TOKEN => {
                        readable |= ev.is_readable();
                        writable |= ev.is_writable();
                    }
                    SIGNAL_TOKEN => {
                        for _ in self.signals.pending() {
                            resized = true;
                        }
                    }
                    _ => {}
                }
            }
            let _ = self.pty_fd;
            Ok((readable, writable, resized))
        }
    }
}

/// Outcome of one `io()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoStatus {
    /// No new bytes; caller may poll again.
    Idle,
    /// At least one byte moved through a ring.
    Progress,
    /// The PTY fd reported EOF (zero-byte read). Host should close.
    Eof,
    /// A `SIGWINCH` arrived; host should re-query its desired size and
    /// call `Teletype::set_winsize`/`Pty::winsize`.
    Resized,
}

/// Owns the PTY, its two rings, and the poll source. `proc()` drains
/// the input ring through a [`Teletype`]; the host calls `io()` once per
/// loop iteration and `proc()` until it returns 0.
pub struct IoLoop {
    pty: Pty,
    input: Ring,
    output: Ring,
    #[cfg(unix)]
    poller: unix_poll::PollSource,
}

impl IoLoop {
    pub fn new(pty: Pty) -> std::io::Result<Self> {
        Self::with_capacity(pty, DEFAULT_RING_CAPACITY)
    }

    #[cfg(unix)]
    pub fn with_capacity(pty: Pty, capacity: usize) -> std::io::Result<Self> {
        let fd = pty
            .master_raw_fd()
            .ok_or_else(|| std::io::Error::other("pty master has no pollable fd"))?;
        let poller = unix_poll::PollSource::new(fd)?;
        Ok(IoLoop { pty, input: Ring::new(capacity), output: Ring::new(capacity), poller })
    }

    #[cfg(not(unix))]
    pub fn with_capacity(pty: Pty, capacity: usize) -> std::io::Result<Self> {
        Ok(IoLoop { pty, input: Ring::new(capacity), output: Ring::new(capacity) })
    }

    /// Queue bytes (e.g. a keymap translation) for the next writable
    /// tick.
    pub fn write(&mut self, bytes: &[u8]) -> usize {
        self.output.push_back(bytes)
    }

    /// Drain `teletype`'s pending DSR/OSC reply bytes into the output
    /// ring.
    pub fn queue_replies(&mut self, teletype: &mut Teletype) {
        let replies = teletype.drain_output();
        if !replies.is_empty() {
            self.output.push_back(&replies);
        }
    }

    /// One poll tick: write pending output, read available input.
    #[cfg(unix)]
    pub fn io(&mut self, timeout: Duration) -> IoStatus {
        let (readable, writable, resized) = match self.poller.tick(timeout) {
            Ok(r) => r,
            Err(_) => return IoStatus::Idle,
        };
        let mut progress = false;
        if writable && !self.output.is_empty() {
            let chunk = self.output.pop_front(MAX_WRITE_PER_TICK);
            match std::io::Write::write(self.pty.writer(), &chunk) {
                Ok(n) => {
                    if n < chunk.len() {
                        // Short write: put the unwritten remainder back at
                        // the front for the next tick.
                        let remainder = &chunk[n..];
                        let mut restored = Ring::new(self.output.capacity());
                        restored.push_back(remainder);
                        let rest = self.output.pop_front(self.output.len());
                        restored.push_back(&rest);
                        self.output = restored;
                    }
                    progress = true;
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    self.output.push_back(&chunk);
                }
                Err(e) => panic!("pty write failed: {e}"),
            }
        }
        if readable && self.input.free_space() > 0 {
            let len = self.input.contiguous_write_len().min(self.input.free_space());
            if len > 0 {
                let tail = self.input.write_tail_mut();
                match std::io::Read::read(self.pty.reader(), &mut tail[..len]) {
                    Ok(0) => return IoStatus::Eof,
                    Ok(n) => {
                        self.input.commit_write(n);
                        progress = true;
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                    Err(e) => panic!("pty read failed: {e}"),
                }
            }
        }
        if resized {
            return IoStatus::Resized;
        }
        if progress {
            IoStatus::Progress
        } else {
            IoStatus::Idle
        }
    }

    #[cfg(not(unix))]
    pub fn io(&mut self, _timeout: Duration) -> IoStatus {
        IoStatus::Idle
    }

    /// Drain the input ring byte-by-byte through `teletype`. Returns the
    /// number of bytes processed; 0 means no work.
    pub fn proc(&mut self, teletype: &mut Teletype) -> usize {
        let mut n = 0;
        while let Some(byte) = self.input.pop_one() {
            teletype.feed_byte(byte);
            n += 1;
        }
        n
    }

    pub fn resize(&mut self, teletype: &mut Teletype, rows: u16, cols: u16) {
        let _ = self.pty.winsize(crate::pty::WinSize::new(rows, cols));
        teletype.set_winsize(rows as usize, cols as usize, 0, 0);
    }
}
