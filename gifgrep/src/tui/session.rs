// ABOUTME: The session engine: key handling, searches, preview loading and downloads
// ABOUTME: Collaborators are injected so the whole flow runs against fakes in tests

use anyhow::Result;
use gifgrep_search::SearchProvider;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use super::download;
use super::input::Key;
use super::render;
use super::state::{Mode, SessionState};
use crate::constants::timing::FLASH;

const LOADING_PREVIEW: &str = "Loading preview...";
use crate::image_protocols::InlineRenderer;
use crate::preview::{PreviewFetcher, PreviewKind};

/// Everything the session talks to outside its own state.
pub struct Collaborators {
    pub renderer: Box<dyn InlineRenderer + Send>,
    pub search: Box<dyn SearchProvider>,
    pub previews: Box<dyn PreviewFetcher>,
    pub downloads: Box<dyn PreviewFetcher>,
    pub download_dir: PathBuf,
}

pub struct Session<W: Write> {
    out: W,
    state: SessionState,
    parts: Collaborators,
    preview_kind: PreviewKind,
}

impl<W: Write> Session<W> {
    /// `preview_kind` selects full animations or first-frame stills.
    pub fn new(out: W, state: SessionState, parts: Collaborators, preview_kind: PreviewKind) -> Self {
        Self {
            out,
            state,
            parts,
            preview_kind,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn renderer(&self) -> &dyn InlineRenderer {
        self.parts.renderer.as_ref()
    }

    pub fn render(&mut self, now: Instant) -> io::Result<()> {
        render::render(&mut self.out, &mut self.state, self.parts.renderer.as_ref(), now)?;
        self.state.render_dirty = false;
        self.out.flush()
    }

    pub fn render_if_dirty(&mut self, now: Instant) -> io::Result<()> {
        if self.state.render_dirty {
            self.render(now)?;
        }
        Ok(())
    }

    pub fn resize(&mut self, rows: u16, cols: u16) {
        if self.state.resize(rows, cols) {
            log::debug!("terminal resized to {}x{}", cols, rows);
        }
    }

    /// Advances manual playback if a frame is due.
    pub fn tick(&mut self, now: Instant) -> io::Result<()> {
        if self
            .state
            .scheduler
            .tick(&mut self.out, self.parts.renderer.as_ref(), now)?
        {
            self.out.flush()?;
        }
        Ok(())
    }

    /// Runs the query given on the command line, if any.
    pub async fn start(&mut self, initial_query: Option<String>) -> Result<()> {
        match initial_query {
            Some(query) if !query.trim().is_empty() => {
                self.state.query = query;
                self.state.mode = Mode::Browse;
                self.submit_query().await
            }
            _ => Ok(()),
        }
    }

    /// Applies one key. Returns true when the session should end.
    pub async fn handle_key(&mut self, key: Key) -> Result<bool> {
        if matches!(key, Key::CtrlC | Key::Char('q')) {
            return Ok(true);
        }
        match self.state.mode {
            Mode::Query => self.handle_query_key(key).await?,
            Mode::Browse => self.handle_browse_key(key).await?,
        }
        Ok(false)
    }

    async fn handle_query_key(&mut self, key: Key) -> Result<()> {
        match key {
            Key::Char(c) => {
                self.state.query.push(c);
                self.state.render_dirty = true;
            }
            Key::Backspace => {
                if self.state.query.pop().is_some() {
                    self.state.render_dirty = true;
                }
            }
            Key::Enter => {
                if self.state.query.trim().is_empty() {
                    self.state.set_status("Empty query");
                } else {
                    self.submit_query().await?;
                }
            }
            Key::Esc => {
                if !self.state.results.is_empty() {
                    self.state.mode = Mode::Browse;
                    self.state.render_dirty = true;
                }
            }
            Key::Up | Key::Down | Key::CtrlC | Key::Unknown => {}
        }
        Ok(())
    }

    async fn handle_browse_key(&mut self, key: Key) -> Result<()> {
        match key {
            Key::Char('/') => self.state.enter_query(None, true),
            Key::Char('d') => self.download_selected().await?,
            Key::Char(c) => self.state.enter_query(Some(c), true),
            Key::Up | Key::Down => {
                if self.state.move_selection(key == Key::Down) {
                    self.load_selected().await?;
                }
            }
            Key::Enter => self.state.enter_query(None, true),
            Key::Esc => self.state.enter_query(None, false),
            Key::Backspace | Key::CtrlC | Key::Unknown => {}
        }
        Ok(())
    }

    /// Shows `status` immediately, before a blocking network call.
    fn show_status_now(&mut self, status: &str) -> io::Result<()> {
        self.state.set_status(status);
        self.render(Instant::now())
    }

    async fn submit_query(&mut self) -> Result<()> {
        self.show_status_now("Searching...")?;

        let query = self.state.query.trim().to_string();
        match self.parts.search.search(&query).await {
            Ok(results) => {
                log::info!("search {:?} returned {} result(s)", query, results.len());
                let count = results.len();
                self.state.set_results(results);
                if count == 0 {
                    self.state.set_status("No results");
                    self.state.scheduler.set_preview(None);
                } else {
                    self.state.set_status(format!("{} results", count));
                    self.load_selected().await?;
                }
            }
            Err(e) => {
                log::warn!("search {:?} failed: {}", query, e);
                self.state.set_status(format!("Search error: {}", e));
            }
        }

        self.state.mode = Mode::Browse;
        self.state.render_dirty = true;
        Ok(())
    }

    /// Binds the selected result's preview, clearing it on any failure.
    /// A cache miss shows a loading line before the fetch starts.
    async fn load_selected(&mut self) -> io::Result<()> {
        let url = match self.state.selected_result() {
            Some(result) if !result.preview_url.is_empty() => result.preview_url.clone(),
            _ => {
                self.state.scheduler.set_preview(None);
                return Ok(());
            }
        };

        let previous_status = if self.state.cache.get(&url, self.preview_kind).is_none() {
            let previous = self.state.status.clone();
            self.show_status_now(LOADING_PREVIEW)?;
            Some(previous)
        } else {
            None
        };

        let loaded = self
            .state
            .cache
            .get_or_load(&url, self.preview_kind, self.parts.previews.as_ref())
            .await;
        match loaded {
            Ok(preview) => {
                self.state.scheduler.set_preview(Some(preview));
                if let Some(previous) = previous_status {
                    self.state.set_status(previous);
                }
            }
            Err(e) => {
                log::warn!("preview failed for {}: {:#}", url, e);
                self.state.scheduler.set_preview(None);
                self.state.set_status(format!("Preview error: {}", e));
            }
        }
        self.state.render_dirty = true;
        Ok(())
    }

    async fn download_selected(&mut self) -> Result<()> {
        let Some(result) = self.state.selected_result().cloned() else {
            self.state.set_status("No selection");
            return Ok(());
        };
        if result.url.is_empty() {
            self.state.set_status("No URL");
            return Ok(());
        }

        self.show_status_now("Downloading...")?;
        let saved = download::save_result(
            self.parts.downloads.as_ref(),
            &result,
            &self.parts.download_dir,
        )
        .await;
        match saved {
            Ok(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.state.flash.show(&format!("Saved {}", name), Instant::now(), FLASH);
                self.state.set_status(format!("Saved {}", path.display()));
            }
            Err(e) => {
                log::warn!("download of {} failed: {:#}", result.url, e);
                self.state.set_status(format!("Download error: {}", e));
            }
        }
        Ok(())
    }
}
