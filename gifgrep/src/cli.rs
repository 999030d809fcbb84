// ABOUTME: CLI argument definitions for gifgrep
// ABOUTME: Defines the command-line interface structure using clap derive macros

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{ColorChoice, Config};
use crate::image_protocols::InlineProtocol;

#[derive(Parser, Debug)]
#[command(name = "gifgrep")]
#[command(about = "Search GIFs and browse them inline in your terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// GIF provider to search (tenor, giphy)
    #[arg(long, global = true)]
    pub source: Option<String>,

    /// Maximum number of results
    #[arg(short, long, global = true, value_parser = clap::value_parser!(u32).range(1..=50))]
    pub limit: Option<u32>,

    /// When to use colors
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Show a still frame instead of animating previews
    #[arg(long, global = true)]
    pub no_animate: bool,

    /// Enable verbose output for debugging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Search to run when the browser opens
    pub query: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Browse results interactively (the default)
    Tui {
        /// Search to run when the browser opens
        query: Vec<String>,
    },
    /// Search once and print the results
    Search {
        /// Search query
        #[arg(required = true)]
        query: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Pretty print JSON output
        #[arg(long, requires = "json")]
        pretty: bool,
    },
    /// Report which inline image protocol this terminal supports
    Caps {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Exit with an error unless this protocol is detected
        #[arg(long, value_enum)]
        expect: Option<ExpectedProtocol>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExpectedProtocol {
    None,
    Kitty,
    #[value(alias = "iterm2")]
    Iterm,
}

impl From<ExpectedProtocol> for InlineProtocol {
    fn from(value: ExpectedProtocol) -> Self {
        match value {
            ExpectedProtocol::None => InlineProtocol::None,
            ExpectedProtocol::Kitty => InlineProtocol::Kitty,
            ExpectedProtocol::Iterm => InlineProtocol::Iterm,
        }
    }
}

impl Cli {
    /// The subcommand to run; a bare invocation opens the browser.
    pub fn resolved_command(&self) -> Commands {
        match &self.command {
            Some(command) => command.clone(),
            None => Commands::Tui {
                query: self.query.clone(),
            },
        }
    }

    /// Flag values as the highest-precedence config layer.
    pub fn overrides(&self) -> Config {
        Config {
            source: self.source.clone(),
            limit: self.limit,
            color: self.color.map(|c| c.as_str().to_string()),
            animate: self.no_animate.then_some(false),
            ..Config::default()
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self.resolved_command(), Commands::Tui { .. })
    }
}

/// Joins positional words into one query; blank input means no query.
pub fn join_query(words: &[String]) -> Option<String> {
    let query = words.join(" ").trim().to_string();
    if query.is_empty() { None } else { Some(query) }
}
