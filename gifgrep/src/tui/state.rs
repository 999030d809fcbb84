// ABOUTME: Mutable session state owned by the event loop
// ABOUTME: Selection, scrolling and mode transitions that need no I/O live here

use gifgrep_search::SearchResult;

use super::animation::Scheduler;
use super::layout::{self, Layout, PreviewDims};
use super::tagline::HeaderFlash;
use crate::constants::ui::QUERY_PROMPT;
use crate::image_protocols::InlineProtocol;
use crate::preview::PreviewCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Query,
    Browse,
}

pub struct SessionState {
    pub mode: Mode,
    pub query: String,
    pub status: String,
    pub results: Vec<SearchResult>,
    pub selected: usize,
    pub scroll: usize,
    pub cache: PreviewCache,
    pub scheduler: Scheduler,
    pub protocol: InlineProtocol,
    pub rows: u16,
    pub cols: u16,
    pub render_dirty: bool,
    pub use_color: bool,
    /// Provider terms require a credit line for Giphy results.
    pub giphy_attribution: bool,
    pub tagline: &'static str,
    pub flash: HeaderFlash,
    /// Whether the previous render used the side-by-side layout.
    pub last_side_by_side: bool,
}

impl SessionState {
    pub fn new(
        protocol: InlineProtocol,
        cache: PreviewCache,
        scheduler: Scheduler,
        tagline: &'static str,
    ) -> Self {
        Self {
            mode: Mode::Query,
            query: String::new(),
            status: QUERY_PROMPT.to_string(),
            results: Vec::new(),
            selected: 0,
            scroll: 0,
            cache,
            scheduler,
            protocol,
            rows: 0,
            cols: 0,
            render_dirty: true,
            use_color: false,
            giphy_attribution: false,
            tagline,
            flash: HeaderFlash::default(),
            last_side_by_side: false,
        }
    }

    pub fn preview_dims(&self) -> Option<PreviewDims> {
        self.scheduler.handle().map(|h| PreviewDims {
            width: h.preview.image.width,
            height: h.preview.image.height,
        })
    }

    pub fn layout(&self) -> Layout {
        layout::build_layout(
            self.rows,
            self.cols,
            self.preview_dims(),
            self.protocol == InlineProtocol::Iterm,
        )
    }

    pub fn selected_result(&self) -> Option<&SearchResult> {
        self.results.get(self.selected)
    }

    /// Keeps the selection inside the visible list window.
    pub fn ensure_visible(&mut self) {
        let height = self.layout().list_height;
        self.scroll = layout::ensure_visible(self.selected, self.scroll, height);
    }

    /// Moves the selection one step; false when already at the edge.
    pub fn move_selection(&mut self, down: bool) -> bool {
        let moved = if down {
            self.selected + 1 < self.results.len()
        } else {
            self.selected > 0
        };
        if !moved {
            return false;
        }
        if down {
            self.selected += 1;
        } else {
            self.selected -= 1;
        }
        self.ensure_visible();
        self.render_dirty = true;
        true
    }

    /// Records a new terminal size. Returns whether it changed.
    pub fn resize(&mut self, rows: u16, cols: u16) -> bool {
        if rows == self.rows && cols == self.cols {
            return false;
        }
        self.rows = rows;
        self.cols = cols;
        self.ensure_visible();
        self.scheduler.mark_dirty();
        self.render_dirty = true;
        true
    }

    /// Switches to query entry, optionally replacing the query with `seed`.
    pub fn enter_query(&mut self, seed: Option<char>, prompt: bool) {
        self.mode = Mode::Query;
        if let Some(c) = seed {
            self.query = c.to_string();
        }
        if prompt {
            self.status = QUERY_PROMPT.to_string();
        }
        self.render_dirty = true;
    }

    pub fn set_results(&mut self, results: Vec<SearchResult>) {
        self.results = results;
        self.selected = 0;
        self.scroll = 0;
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.render_dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodeOptions;

    fn state_with(results: usize, rows: u16) -> SessionState {
        let mut state = SessionState::new(
            InlineProtocol::Kitty,
            PreviewCache::new(DecodeOptions::default()),
            Scheduler::new(false, true),
            "tagline",
        );
        state.resize(rows, 80);
        state.set_results(
            (0..results)
                .map(|i| SearchResult {
                    id: i.to_string(),
                    ..SearchResult::default()
                })
                .collect(),
        );
        state
    }

    fn assert_window(state: &SessionState) {
        let height = usize::from(state.layout().list_height.max(1));
        assert!(state.scroll <= state.selected, "{} > {}", state.scroll, state.selected);
        assert!(state.selected < state.scroll + height);
        assert!(state.selected < state.results.len());
    }

    #[test]
    fn test_scroll_invariant_over_key_sequences() {
        // 10 rows leaves a 6-row list.
        let mut state = state_with(25, 10);
        let pattern = [true, true, true, true, true, true, true, true, false, true];
        for step in 0..200 {
            let down = pattern[step % pattern.len()] ^ (step > 120);
            state.move_selection(down);
            assert_window(&state);
        }
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_selection_stops_at_edges() {
        let mut state = state_with(2, 20);
        assert!(!state.move_selection(false));
        assert!(state.move_selection(true));
        assert!(!state.move_selection(true));
        assert_eq!(state.selected, 1);
    }

    #[test]
    fn test_scroll_follows_selection_down_and_back() {
        let mut state = state_with(30, 10);
        for _ in 0..10 {
            state.move_selection(true);
        }
        assert_eq!(state.selected, 10);
        assert_eq!(state.scroll, 5);
        for _ in 0..8 {
            state.move_selection(false);
        }
        assert_eq!(state.selected, 2);
        assert_eq!(state.scroll, 2);
    }

    #[test]
    fn test_shrinking_terminal_keeps_selection_visible() {
        let mut state = state_with(30, 40);
        for _ in 0..20 {
            state.move_selection(true);
        }
        assert_eq!(state.scroll, 0);
        assert!(state.resize(10, 80));
        assert_window(&state);
        assert!(!state.resize(10, 80));
    }

    #[test]
    fn test_enter_query() {
        let mut state = state_with(3, 20);
        state.mode = Mode::Browse;
        state.query = "cats".to_string();
        state.status = "3 results".to_string();

        state.enter_query(Some('x'), true);
        assert_eq!(state.mode, Mode::Query);
        assert_eq!(state.query, "x");
        assert_eq!(state.status, QUERY_PROMPT);

        state.mode = Mode::Browse;
        state.status = "3 results".to_string();
        state.enter_query(None, false);
        assert_eq!(state.query, "x");
        assert_eq!(state.status, "3 results");
    }
}
