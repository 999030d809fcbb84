// ABOUTME: Active kitty graphics probe over the controlling terminal device
// ABOUTME: Sends a graphics query plus DA1 and classifies the raw reply within a short deadline

use nix::poll::{PollFd, PollFlags, poll};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

/// Graphics query for a 1x1 RGB image, followed by a primary device attributes request.
pub const PROBE_QUERY: &[u8] = b"\x1b_Gi=31,s=1,v=1,a=q,t=d,f=24;AAAA\x1b\\\x1b[c";

pub const PROBE_TIMEOUT: Duration = Duration::from_millis(150);

const ACK_PATTERNS: [&[u8]; 2] = [b"\x1b_Gi=31;", b"\x1b_Gi=31,"];

static DA1_RESPONSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[\??[0-9;]*c").expect("DA1 pattern is a valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Supported,
    NotSupported,
    Unknown,
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProbeOutcome::Supported => "supported",
            ProbeOutcome::NotSupported => "not-supported",
            ProbeOutcome::Unknown => "unknown",
        })
    }
}

/// Accumulates terminal reply bytes and classifies them.
#[derive(Debug, Default)]
pub struct ReplyScanner {
    buf: Vec<u8>,
    saw_device_attributes: bool,
}

impl ReplyScanner {
    /// Returns `Some(Supported)` as soon as a graphics acknowledgment is seen.
    pub fn feed(&mut self, bytes: &[u8]) -> Option<ProbeOutcome> {
        self.buf.extend_from_slice(bytes);
        if ACK_PATTERNS
            .iter()
            .any(|pat| self.buf.windows(pat.len()).any(|w| w == *pat))
        {
            return Some(ProbeOutcome::Supported);
        }
        if !self.saw_device_attributes && DA1_RESPONSE.is_match(&self.buf) {
            self.saw_device_attributes = true;
        }
        None
    }

    pub fn finish(&self) -> ProbeOutcome {
        if self.saw_device_attributes {
            ProbeOutcome::NotSupported
        } else {
            ProbeOutcome::Unknown
        }
    }
}

/// Byte channel to a terminal with a bounded read wait.
pub trait ProbeTransport: Write {
    /// Reads whatever is available within `timeout`; `Ok(0)` means nothing arrived.
    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;
}

/// Writes the query and scans replies until an acknowledgment or the deadline.
pub fn run_probe<T: ProbeTransport>(transport: &mut T, timeout: Duration) -> ProbeOutcome {
    if transport
        .write_all(PROBE_QUERY)
        .and_then(|_| transport.flush())
        .is_err()
    {
        return ProbeOutcome::Unknown;
    }

    let deadline = Instant::now() + timeout;
    let mut scanner = ReplyScanner::default();
    let mut chunk = [0u8; 256];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match transport.read_timeout(&mut chunk, remaining) {
            Ok(0) => continue,
            Ok(n) => {
                if let Some(outcome) = scanner.feed(&chunk[..n]) {
                    return outcome;
                }
            }
            Err(e) => {
                log::debug!("probe read failed: {}", e);
                break;
            }
        }
    }

    scanner.finish()
}

/// The controlling terminal opened directly, independent of stdin/stdout.
pub struct TtyTransport {
    tty: File,
}

impl TtyTransport {
    pub fn open() -> io::Result<Self> {
        let tty = OpenOptions::new().read(true).write(true).open("/dev/tty")?;
        Ok(Self { tty })
    }
}

impl Write for TtyTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tty.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.tty.flush()
    }
}

impl ProbeTransport for TtyTransport {
    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        let millis = timeout.as_millis().clamp(1, i32::MAX as u128) as i32;
        let ready = {
            let mut fds = [PollFd::new(&self.tty, PollFlags::POLLIN)];
            let n = poll(&mut fds, millis).map_err(io::Error::from)?;
            n > 0
                && fds[0]
                    .revents()
                    .is_some_and(|r| r.intersects(PollFlags::POLLIN | PollFlags::POLLHUP))
        };
        if !ready {
            return Ok(0);
        }
        match self.tty.read(buf)? {
            0 => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "tty closed")),
            n => Ok(n),
        }
    }
}

/// Probes the real terminal. Raw mode is held only for the duration of the
/// round trip so replies are not line-buffered or echoed.
pub fn probe_tty() -> ProbeOutcome {
    let mut transport = match TtyTransport::open() {
        Ok(t) => t,
        Err(e) => {
            log::debug!("cannot open /dev/tty for probe: {}", e);
            return ProbeOutcome::Unknown;
        }
    };

    let was_raw = crossterm::terminal::is_raw_mode_enabled().unwrap_or(false);
    if !was_raw && crossterm::terminal::enable_raw_mode().is_err() {
        return ProbeOutcome::Unknown;
    }

    let outcome = run_probe(&mut transport, PROBE_TIMEOUT);

    if !was_raw {
        leave_raw_mode(crossterm::terminal::disable_raw_mode);
    }
    outcome
}

/// Restores cooked mode after the probe. Returns false if the terminal
/// refused, which leaves it raw for whoever runs next.
fn leave_raw_mode(disable: impl FnOnce() -> io::Result<()>) -> bool {
    match disable() {
        Ok(()) => true,
        Err(e) => {
            log::warn!("failed to leave raw mode after probe: {}", e);
            false
        }
    }
}
