// ABOUTME: Interactive GIF browser: startup checks, terminal setup and the event loop
// ABOUTME: One task mutates session state; a reader thread feeds keys through a bounded queue

pub mod animation;
pub mod download;
pub mod input;
pub mod layout;
pub mod render;
pub mod session;
pub mod state;
pub mod tagline;
pub mod terminal;

use anyhow::{Context, Result};
use chrono::Utc;
use gifgrep_search::SearchProvider;
use std::future::Future;
use std::io::{self, IsTerminal};
use std::time::Instant;
use thiserror::Error;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::constants::{decode as decode_limits, fetch, timing};
use crate::decode::DecodeOptions;
use crate::image_protocols::{
    InlineProtocol, UnknownProbePolicy, detect_robust, detection::process_env, probe::probe_tty,
    renderer_for,
};
use crate::preview::{HttpFetcher, PreviewCache, PreviewKind};

pub use input::Key;
pub use session::{Collaborators, Session};
pub use state::{Mode, SessionState};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("stdin is not a tty")]
    NotATerminal,

    #[error(
        "gifgrep tui needs inline image support.\n\n\
         Supported terminals:\n  \
         - Kitty (Kitty graphics protocol)\n  \
         - Ghostty (Kitty graphics protocol)\n  \
         - iTerm2 (OSC 1337 inline images)\n\n\
         Detected:\n  \
         TERM_PROGRAM={term_program:?}\n  \
         TERM={term:?}\n\n\
         Tip: You can force detection with GIFGREP_INLINE=kitty|iterm|none"
    )]
    UnsupportedTerminal { term_program: String, term: String },
}

impl SessionError {
    pub fn unsupported(getenv: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| getenv(name).map(|v| v.trim().to_string()).unwrap_or_default();
        SessionError::UnsupportedTerminal {
            term_program: var("TERM_PROGRAM"),
            term: var("TERM"),
        }
    }
}

/// Session settings resolved from config, environment and flags.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub use_color: bool,
    pub animate: bool,
    /// Forces manual frame playback on kitty-style terminals.
    pub software_animation: bool,
    pub max_preview_bytes: u64,
    pub probe_policy: UnknownProbePolicy,
    pub giphy_attribution: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            use_color: true,
            animate: true,
            software_animation: false,
            max_preview_bytes: fetch::MAX_PREVIEW_BYTES,
            probe_policy: UnknownProbePolicy::default(),
            giphy_attribution: false,
        }
    }
}

impl SessionOptions {
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            max_bytes: self.max_preview_bytes,
            max_pixels: decode_limits::MAX_PIXELS,
            max_frames: decode_limits::MAX_FRAMES,
            ..DecodeOptions::default()
        }
    }

    pub fn preview_kind(&self) -> PreviewKind {
        if self.animate {
            PreviewKind::Full
        } else {
            PreviewKind::Thumbnail
        }
    }

    /// Fresh state for a terminal speaking `protocol`.
    pub fn initial_state(&self, protocol: InlineProtocol) -> SessionState {
        let now = Utc::now();
        let tagline = tagline::pick_tagline(now, process_env, tagline::clock_roll(now));
        let software = protocol == InlineProtocol::Kitty && self.software_animation;

        let mut state = SessionState::new(
            protocol,
            PreviewCache::new(self.decode_options()),
            animation::Scheduler::new(software, self.animate),
            tagline,
        );
        state.use_color = self.use_color;
        state.giphy_attribution = self.giphy_attribution;
        state
    }
}

/// Runs the interactive browser until the user quits or a termination
/// signal arrives. Only startup problems are returned as errors.
pub async fn run_session(
    options: SessionOptions,
    search: Box<dyn SearchProvider>,
    initial_query: Option<String>,
) -> Result<()> {
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return Err(SessionError::NotATerminal.into());
    }

    let protocol = detect_robust(process_env, probe_tty, options.probe_policy);
    log::info!("inline protocol: {}", protocol);
    let renderer = renderer_for(protocol).ok_or_else(|| SessionError::unsupported(process_env))?;

    let parts = Collaborators {
        renderer,
        search,
        previews: Box::new(HttpFetcher::new(options.max_preview_bytes)?),
        downloads: Box::new(HttpFetcher::new(fetch::MAX_DOWNLOAD_BYTES)?),
        download_dir: download::default_download_dir()?,
    };
    let state = options.initial_state(protocol);

    let mut guard = terminal::TerminalGuard::enter(protocol).context("Failed to enter raw mode")?;
    let out = io::BufWriter::new(io::stdout());
    let mut session = Session::new(out, state, parts, options.preview_kind());
    if let Ok((cols, rows)) = crossterm::terminal::size() {
        session.resize(rows, cols);
    }

    let result = event_loop(&mut session, initial_query).await;
    guard.restore();
    result
}

async fn event_loop<W: io::Write>(
    session: &mut Session<W>,
    initial_query: Option<String>,
) -> Result<()> {
    let (tx, mut keys) = mpsc::channel(timing::INPUT_QUEUE_CAPACITY);
    let mut reader = input::InputReader::spawn(tx).context("Failed to start input reader")?;
    let mut signals = Signals::install().context("Failed to install signal handlers")?;

    drive(session, &mut keys, initial_query, signals.recv()).await;

    reader.stop();
    log::debug!("session ended");
    Ok(())
}

/// Termination signals, registered once so none is lost between waits.
struct Signals {
    interrupt: Signal,
    terminate: Signal,
    hangup: Signal,
}

impl Signals {
    fn install() -> io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    async fn recv(&mut self) {
        tokio::select! {
            _ = self.interrupt.recv() => log::debug!("interrupted"),
            _ = self.terminate.recv() => log::debug!("terminated"),
            _ = self.hangup.recv() => log::debug!("hung up"),
        }
    }
}

/// Processes keys and ticks until quit, end of input or `shutdown`.
/// Errors after startup end the session; they are logged, not returned.
async fn drive<W: io::Write>(
    session: &mut Session<W>,
    keys: &mut mpsc::Receiver<Key>,
    initial_query: Option<String>,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(timing::TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    if let Err(e) = session.start(initial_query).await {
        log::error!("initial search failed: {:#}", e);
        return;
    }

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            key = keys.recv() => match key {
                Some(key) => match session.handle_key(key).await {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(e) => {
                        log::error!("ending session: {:#}", e);
                        break;
                    }
                },
                None => break,
            },
            _ = ticker.tick() => {}
        }

        if let Ok((cols, rows)) = crossterm::terminal::size() {
            session.resize(rows, cols);
        }
        let now = Instant::now();
        if let Err(e) = session.render_if_dirty(now).and_then(|()| session.tick(now)) {
            log::error!("ending session: {}", e);
            break;
        }
    }
}
