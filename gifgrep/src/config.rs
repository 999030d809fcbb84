// ABOUTME: Configuration file loading, validation, and layered merging for gifgrep
// ABOUTME: Defaults < TOML files < environment < command-line flags

use anyhow::{Context, Result, anyhow};
use gifgrep_search::Source;
use gifgrep_search::constants::limits;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

use crate::constants::{env, fetch};
use crate::tui::SessionOptions;

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct Config {
    #[serde(default, deserialize_with = "validate_source")]
    pub source: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default, deserialize_with = "validate_color")]
    pub color: Option<String>,
    #[serde(default)]
    pub animate: Option<bool>,
    #[serde(default)]
    pub software_animation: Option<bool>,
    #[serde(default)]
    pub max_preview_bytes: Option<u64>,
}

/// When to emit ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorChoice::Auto => "auto",
            ColorChoice::Always => "always",
            ColorChoice::Never => "never",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "auto" => Some(ColorChoice::Auto),
            "always" => Some(ColorChoice::Always),
            "never" => Some(ColorChoice::Never),
            _ => None,
        }
    }

    /// Resolves `auto` against whether the output is a terminal.
    pub fn enabled(&self, is_tty: bool) -> bool {
        match self {
            ColorChoice::Auto => is_tty,
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

impl Config {
    /// Load configuration from the standard locations and the process environment
    pub fn load() -> Result<Self> {
        let paths = Self::get_config_paths();
        let config = Self::load_from_paths(&paths)?;
        let config = config.with_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file paths; later paths override earlier ones.
    /// Missing files are skipped, unreadable or invalid ones are errors.
    pub fn load_from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut config = Config::default();

        for path in paths {
            let path = path.as_ref();
            if !path.is_file() {
                continue;
            }
            log::debug!("loading config from {}", path.display());
            config = config.merge(Self::load_from_file(path)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a single file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse TOML config file: {}",
                path.as_ref().display()
            )
        })?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        Ok(config)
    }

    /// Config file paths in the order they are applied (lowest precedence first)
    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".config").join("gifgrep").join("config.toml"));
        }

        if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(config_home).join("gifgrep").join("config.toml"));
        }

        if let Ok(current_dir) = std::env::current_dir() {
            paths.push(current_dir.join("gifgrep.toml"));
        }

        paths
    }

    /// Merge this config with another, giving precedence to the other config
    pub fn merge(self, other: Config) -> Config {
        Config {
            source: other.source.or(self.source),
            limit: other.limit.or(self.limit),
            color: other.color.or(self.color),
            animate: other.animate.or(self.animate),
            software_animation: other.software_animation.or(self.software_animation),
            max_preview_bytes: other.max_preview_bytes.or(self.max_preview_bytes),
        }
    }

    /// Layer environment variables over file values.
    pub fn with_env(self, getenv: impl Fn(&str) -> Option<String>) -> Config {
        let set = |name: &str| getenv(name).filter(|v| !v.trim().is_empty());

        let overrides = Config {
            source: set(gifgrep_search::constants::env::SOURCE).map(|v| v.trim().to_lowercase()),
            software_animation: set(env::SOFTWARE_ANIM).map(|v| is_truthy(&v)),
            color: set(env::NO_COLOR).map(|_| ColorChoice::Never.as_str().to_string()),
            ..Config::default()
        };
        self.merge(overrides)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(ref source) = self.source {
            source
                .parse::<Source>()
                .map_err(|_| anyhow!("Invalid source '{}'. Must be one of: tenor, giphy", source))?;
        }

        if let Some(limit) = self.limit {
            if !(1..=limits::MAX_LIMIT).contains(&limit) {
                return Err(anyhow!(
                    "Invalid limit {}. Must be between 1 and {}",
                    limit,
                    limits::MAX_LIMIT
                ));
            }
        }

        if let Some(ref color) = self.color {
            if ColorChoice::parse(color).is_none() {
                return Err(anyhow!(
                    "Invalid color '{}'. Must be one of: auto, always, never",
                    color
                ));
            }
        }

        if self.max_preview_bytes == Some(0) {
            return Err(anyhow!("max_preview_bytes must be greater than zero"));
        }

        Ok(())
    }

    pub fn source(&self) -> Result<Source> {
        Ok(gifgrep_search::resolve_source(self.source.as_deref())?)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(limits::DEFAULT_LIMIT)
    }

    pub fn color_choice(&self) -> ColorChoice {
        self.color
            .as_deref()
            .and_then(ColorChoice::parse)
            .unwrap_or_default()
    }

    pub fn animate(&self) -> bool {
        self.animate.unwrap_or(true)
    }

    /// Options for the interactive browser. The session always draws to a
    /// terminal, so `auto` color means on.
    pub fn session_options(&self) -> Result<SessionOptions> {
        Ok(SessionOptions {
            use_color: self.color_choice().enabled(true),
            animate: self.animate(),
            software_animation: self.software_animation.unwrap_or(false),
            max_preview_bytes: self.max_preview_bytes.unwrap_or(fetch::MAX_PREVIEW_BYTES),
            giphy_attribution: self.source()? == Source::Giphy,
            ..SessionOptions::default()
        })
    }
}

/// `1`, `true`, `yes` and `on` (any case) count as enabled.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// Custom deserializer for source validation
fn validate_source<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value: Option<String> = Option::deserialize(deserializer)?;
    match value {
        Some(source) => match source.parse::<Source>() {
            Ok(parsed) => Ok(Some(parsed.as_str().to_string())),
            Err(_) => Err(D::Error::custom(format!(
                "Invalid source '{}'. Must be one of: tenor, giphy",
                source
            ))),
        },
        None => Ok(None),
    }
}

// Custom deserializer for color validation
fn validate_color<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value: Option<String> = Option::deserialize(deserializer)?;
    match value {
        Some(color) => match ColorChoice::parse(&color) {
            Some(choice) => Ok(Some(choice.as_str().to_string())),
            None => Err(D::Error::custom(format!(
                "Invalid color '{}'. Must be one of: auto, always, never",
                color
            ))),
        },
        None => Ok(None),
    }
}
