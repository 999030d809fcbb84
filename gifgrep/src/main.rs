// ABOUTME: Main entry point for the gifgrep application
// ABOUTME: Loads layered config, then runs the browser, a one-shot search or the caps report

use anyhow::Result;
use clap::Parser;
use gifgrep_search::{SearchClient, SearchError, SearchProvider};
use std::io::IsTerminal;

use gifgrep::caps::CapsReport;
use gifgrep::cli::{Cli, Commands, join_query};
use gifgrep::config::Config;
use gifgrep::image_protocols::{UnknownProbePolicy, detection::process_env, probe::probe_tty};
use gifgrep::output::{JsonFormatter, LineFormatter, OutputFormat};
use gifgrep::{logging, tui};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.is_interactive())?;

    let config = Config::load()?.merge(cli.overrides());
    config.validate()?;

    let result = match cli.resolved_command() {
        Commands::Tui { query } => run_tui(&config, join_query(&query)).await,
        Commands::Search {
            query,
            json,
            pretty,
        } => run_search(&config, &query, json, pretty).await,
        Commands::Caps { json, expect } => run_caps(&config, json, expect.map(Into::into)),
    };

    if let Err(e) = &result {
        if let Some(help) = e.downcast_ref::<SearchError>().and_then(|e| e.help_text()) {
            eprintln!("{}", help);
        }
    }
    result
}

fn build_client(config: &Config) -> Result<SearchClient> {
    let client = SearchClient::builder()
        .source(config.source()?)
        .limit(config.limit())
        .build()?;
    log::debug!("searching {} (limit {})", client.source(), client.limit());
    Ok(client)
}

async fn run_tui(config: &Config, initial_query: Option<String>) -> Result<()> {
    let options = config.session_options()?;
    let client = build_client(config)?;
    tui::run_session(options, Box::new(client), initial_query).await
}

async fn run_search(config: &Config, words: &[String], json: bool, pretty: bool) -> Result<()> {
    let Some(query) = join_query(words) else {
        anyhow::bail!("Empty query");
    };
    let client = build_client(config)?;
    let results = client.search(&query).await?;

    if results.is_empty() && !json {
        eprintln!("No results.");
        return Ok(());
    }

    let output = if json {
        JsonFormatter::new(pretty).format_results(&results)?
    } else {
        let use_color = config
            .color_choice()
            .enabled(std::io::stdout().is_terminal());
        LineFormatter::new(use_color).format_results(&results)?
    };
    println!("{}", output);
    Ok(())
}

fn run_caps(
    config: &Config,
    json: bool,
    expect: Option<gifgrep::image_protocols::InlineProtocol>,
) -> Result<()> {
    let report = CapsReport::collect(process_env, probe_tty, UnknownProbePolicy::default());
    if json {
        println!("{}", report.to_json(true)?);
    } else {
        let use_color = config
            .color_choice()
            .enabled(std::io::stdout().is_terminal());
        println!("{}", report.to_text(use_color));
    }
    report.check_expected(expect)
}
