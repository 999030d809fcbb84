// ABOUTME: Terminal capability detection for inline image protocol support
// ABOUTME: Resolves kitty/iTerm/none from the environment, optionally confirmed by a live probe

use std::fmt;

use super::probe::ProbeOutcome;

pub const INLINE_OVERRIDE_VAR: &str = "GIFGREP_INLINE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InlineProtocol {
    #[default]
    None,
    Kitty,
    Iterm,
}

impl InlineProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            InlineProtocol::None => "none",
            InlineProtocol::Kitty => "kitty",
            InlineProtocol::Iterm => "iterm",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, InlineProtocol::None)
    }
}

impl fmt::Display for InlineProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an inconclusive probe (timeout, IO failure) should mean for kitty support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownProbePolicy {
    #[default]
    AssumeSupported,
    AssumeUnsupported,
}

fn var(getenv: &impl Fn(&str) -> Option<String>, name: &str) -> String {
    getenv(name).unwrap_or_default().trim().to_string()
}

/// Static detection from environment variables only. First match wins.
pub fn detect(getenv: impl Fn(&str) -> Option<String>) -> InlineProtocol {
    match var(&getenv, INLINE_OVERRIDE_VAR).to_lowercase().as_str() {
        "" | "auto" => {}
        "kitty" => return InlineProtocol::Kitty,
        "iterm" | "iterm2" => return InlineProtocol::Iterm,
        "none" | "off" | "false" | "0" => return InlineProtocol::None,
        other => {
            log::warn!("{}={} is not recognized; inline images disabled", INLINE_OVERRIDE_VAR, other);
            return InlineProtocol::None;
        }
    }

    if !var(&getenv, "KITTY_WINDOW_ID").is_empty() {
        return InlineProtocol::Kitty;
    }

    let term_program = var(&getenv, "TERM_PROGRAM").to_lowercase();
    if term_program.contains("ghostty") {
        return InlineProtocol::Kitty;
    }
    if term_program.contains("iterm") || !var(&getenv, "ITERM_SESSION_ID").is_empty() {
        return InlineProtocol::Iterm;
    }
    if term_program.contains("apple_terminal") {
        return InlineProtocol::None;
    }

    let term = var(&getenv, "TERM").to_lowercase();
    if term.contains("xterm-kitty") || term.contains("ghostty") {
        return InlineProtocol::Kitty;
    }

    InlineProtocol::None
}

/// Static detection, with a kitty result confirmed by `probe` unless a
/// strong signal makes the round trip unnecessary.
pub fn detect_robust(
    getenv: impl Fn(&str) -> Option<String>,
    probe: impl FnOnce() -> ProbeOutcome,
    policy: UnknownProbePolicy,
) -> InlineProtocol {
    let protocol = detect(&getenv);
    if protocol != InlineProtocol::Kitty {
        return protocol;
    }

    // Ghostty renders kitty graphics but does not answer the query reliably.
    if var(&getenv, "TERM_PROGRAM").to_lowercase().contains("ghostty") {
        log::debug!("ghostty detected, skipping kitty probe");
        return InlineProtocol::Kitty;
    }
    if !var(&getenv, "KITTY_WINDOW_ID").is_empty() {
        log::debug!("KITTY_WINDOW_ID set, skipping kitty probe");
        return InlineProtocol::Kitty;
    }

    let outcome = probe();
    log::debug!("kitty graphics probe: {}", outcome);
    match (outcome, policy) {
        (ProbeOutcome::Supported, _) => InlineProtocol::Kitty,
        (ProbeOutcome::NotSupported, _) => InlineProtocol::None,
        (ProbeOutcome::Unknown, UnknownProbePolicy::AssumeSupported) => InlineProtocol::Kitty,
        (ProbeOutcome::Unknown, UnknownProbePolicy::AssumeUnsupported) => InlineProtocol::None,
    }
}

/// Process-environment lookup used by production callers.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
