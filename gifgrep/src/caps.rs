// ABOUTME: Terminal capability report behind the `caps` command
// ABOUTME: Runs robust detection and records which environment variables it consulted

use anyhow::{Result, anyhow};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::cell::Cell;

use crate::image_protocols::detection::INLINE_OVERRIDE_VAR;
use crate::image_protocols::{InlineProtocol, ProbeOutcome, UnknownProbePolicy, detect_robust};

const CONSULTED: [&str; 5] = [
    INLINE_OVERRIDE_VAR,
    "TERM_PROGRAM",
    "TERM",
    "ITERM_SESSION_ID",
    "KITTY_WINDOW_ID",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapsReport {
    pub detected: String,
    /// Whether the kitty graphics probe was sent to the terminal.
    pub probed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_outcome: Option<String>,
    pub env: Vec<EnvEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvEntry {
    pub name: String,
    pub value: String,
}

impl CapsReport {
    pub fn collect(
        getenv: impl Fn(&str) -> Option<String>,
        probe: impl FnOnce() -> ProbeOutcome,
        policy: UnknownProbePolicy,
    ) -> Self {
        let outcome = Cell::new(None);
        let protocol = detect_robust(
            &getenv,
            || {
                let result = probe();
                outcome.set(Some(result));
                result
            },
            policy,
        );
        let outcome = outcome.get();

        let env = CONSULTED
            .iter()
            .filter_map(|name| {
                getenv(name)
                    .filter(|v| !v.trim().is_empty())
                    .map(|value| EnvEntry {
                        name: name.to_string(),
                        value,
                    })
            })
            .collect();

        Self {
            detected: protocol.as_str().to_string(),
            probed: outcome.is_some(),
            probe_outcome: outcome.map(|o| o.to_string()),
            env,
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        if pretty {
            Ok(serde_json::to_string_pretty(self)?)
        } else {
            Ok(serde_json::to_string(self)?)
        }
    }

    pub fn to_text(&self, use_color: bool) -> String {
        let mut lines = Vec::with_capacity(self.env.len() + 2);
        if use_color {
            if self.detected == InlineProtocol::None.as_str() {
                lines.push(self.detected.yellow().to_string());
            } else {
                lines.push(self.detected.green().to_string());
            }
        } else {
            lines.push(self.detected.clone());
        }
        if let Some(outcome) = &self.probe_outcome {
            lines.push(format!("  probe: {}", outcome));
        }
        for entry in &self.env {
            let line = format!("  {}={}", entry.name, entry.value);
            if use_color {
                lines.push(line.dimmed().to_string());
            } else {
                lines.push(line);
            }
        }
        lines.join("\n")
    }

    /// Fails when detection disagrees with what the caller expected.
    pub fn check_expected(&self, expected: Option<InlineProtocol>) -> Result<()> {
        match expected {
            Some(expected) if expected.as_str() != self.detected => Err(anyhow!(
                "expected {:?}, got {:?}",
                expected.as_str(),
                self.detected
            )),
            _ => Ok(()),
        }
    }
}
