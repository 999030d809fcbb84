// ABOUTME: Raw mode and alternate screen for the lifetime of a session
// ABOUTME: Restores the terminal on drop, so every exit path including panics cleans up

use crossterm::{
    ExecutableCommand, cursor,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, Write};

use crate::image_protocols::{InlineProtocol, renderer_for};

pub struct TerminalGuard {
    protocol: InlineProtocol,
    restored: bool,
}

impl TerminalGuard {
    pub fn enter(protocol: InlineProtocol) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let guard = Self {
            protocol,
            restored: false,
        };
        let mut out = io::stdout();
        out.execute(EnterAlternateScreen)?;
        out.execute(cursor::Hide)?;
        Ok(guard)
    }

    /// Clears uploaded images, shows the cursor and leaves raw mode. Runs once.
    pub fn restore(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;

        let mut out = io::stdout();
        if let Some(renderer) = renderer_for(self.protocol) {
            let _ = renderer.clear_all(&mut out);
        }
        let _ = out.execute(cursor::Show);
        let _ = out.execute(LeaveAlternateScreen);
        let _ = out.flush();
        if let Err(e) = terminal::disable_raw_mode() {
            log::warn!("failed to leave raw mode: {}", e);
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        self.restore();
    }
}
