// ABOUTME: Raw stdin key decoding and the background reader thread
// ABOUTME: The reader only produces Key events into a bounded queue and never blocks on it

use nix::poll::{PollFd, PollFlags, poll};
use std::io::{self, BufRead};
use std::os::fd::AsFd;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use tokio::sync::mpsc::{self, error::TrySendError};

/// How often the reader wakes up to check the stop flag.
const STOP_POLL_MS: i32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Esc,
    Up,
    Down,
    CtrlC,
    Unknown,
}

/// Turns one chunk of raw terminal bytes into keys.
///
/// A lone ESC at the end of a chunk is the escape key; `ESC [` starts a CSI
/// sequence of which only the up and down arrows are recognized. Bytes outside
/// the printable ASCII range that are not a known control are dropped.
pub fn decode_keys(bytes: &[u8]) -> Vec<Key> {
    let mut keys = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        i += 1;
        match b {
            0x03 => keys.push(Key::CtrlC),
            b'\r' | b'\n' => keys.push(Key::Enter),
            0x7f | 0x08 => keys.push(Key::Backspace),
            0x1b => {
                if bytes.get(i) == Some(&b'[') {
                    let key = match bytes.get(i + 1) {
                        Some(b'A') => Key::Up,
                        Some(b'B') => Key::Down,
                        _ => Key::Unknown,
                    };
                    i = (i + 2).min(bytes.len());
                    keys.push(key);
                } else {
                    keys.push(Key::Esc);
                }
            }
            0x20..=0x7e => keys.push(Key::Char(b as char)),
            _ => {}
        }
    }
    keys
}

/// Background thread reading stdin until stopped or the stream ends.
pub struct InputReader {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InputReader {
    pub fn spawn(tx: mpsc::Sender<Key>) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("gifgrep-input".to_string())
            .spawn(move || {
                let stdin = io::stdin();
                let mut input = stdin.lock();
                read_loop(&mut input, poll_readable, &tx, &flag);
            })?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("input reader thread panicked");
            }
        }
    }
}

impl Drop for InputReader {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Ready,
    Idle,
    Failed,
}

/// Waits up to `STOP_POLL_MS` for `input` to become readable.
fn poll_readable<F: AsFd>(input: &F) -> Readiness {
    let mut fds = [PollFd::new(input, PollFlags::POLLIN)];
    match poll(&mut fds, STOP_POLL_MS) {
        Ok(n) if n > 0 => Readiness::Ready,
        Ok(_) | Err(nix::errno::Errno::EINTR) => Readiness::Idle,
        Err(e) => {
            log::debug!("input poll failed: {}", e);
            Readiness::Failed
        }
    }
}

/// Decodes keys from `input` into `tx` until stopped, the stream ends or the
/// receiver goes away. A full queue drops the key instead of waiting.
fn read_loop<R: BufRead>(
    input: &mut R,
    mut wait: impl FnMut(&R) -> Readiness,
    tx: &mpsc::Sender<Key>,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::SeqCst) {
        match wait(input) {
            Readiness::Ready => {}
            Readiness::Idle => continue,
            Readiness::Failed => return,
        }

        let chunk = match input.fill_buf() {
            Ok([]) => return,
            Ok(chunk) => chunk,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::debug!("input read failed: {}", e);
                return;
            }
        };
        let keys = decode_keys(chunk);
        let consumed = chunk.len();
        input.consume(consumed);

        for key in keys {
            match tx.try_send(key) {
                Ok(()) => {}
                Err(TrySendError::Full(key)) => log::debug!("input queue full, dropped {:?}", key),
                Err(TrySendError::Closed(_)) => return,
            }
        }
    }
}
