// ABOUTME: Draws the header, result list, preview, status, search and hint rows
// ABOUTME: Lines are built from styled spans and truncated by display width before styling

use crossterm::{QueueableCommand, cursor, style::Print, terminal};
use owo_colors::{OwoColorize, Style, XtermColors};
use std::io::{self, Write};
use std::time::Instant;
use unicode_width::UnicodeWidthChar;

use super::animation::{Placement, clear_rect};
use super::layout::Layout;
use super::state::{Mode, SessionState};
use crate::constants::ui::{APP_NAME, PREVIEW_LABEL};
use crate::image_protocols::{InlineProtocol, InlineRenderer};

const HINTS: &[(&str, &str)] = &[
    ("Enter", "Search"),
    ("/", "Edit"),
    ("Up/Down", "Select"),
    ("d", "Download"),
    ("q", "Quit"),
];
const GIPHY_CREDIT: &str = " \u{b7} Powered by GIPHY";

#[derive(Debug, Clone)]
struct Span {
    text: String,
    style: Style,
}

/// A single screen line made of styled segments.
#[derive(Debug, Clone, Default)]
pub struct Line {
    spans: Vec<Span>,
}

impl Line {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::default().push(text, Style::new())
    }

    pub fn push(mut self, text: impl Into<String>, style: Style) -> Self {
        self.spans.push(Span {
            text: text.into(),
            style,
        });
        self
    }

    pub fn width(&self) -> usize {
        self.spans
            .iter()
            .flat_map(|s| s.text.chars())
            .map(|c| c.width().unwrap_or(0))
            .sum()
    }

    /// Cuts the line to at most `width` display columns.
    pub fn truncate(mut self, width: usize) -> Self {
        let mut used = 0;
        for span in &mut self.spans {
            let mut end = span.text.len();
            for (idx, c) in span.text.char_indices() {
                let w = c.width().unwrap_or(0);
                if used + w > width {
                    end = idx;
                    break;
                }
                used += w;
            }
            span.text.truncate(end);
        }
        self.spans.retain(|s| !s.text.is_empty());
        self
    }

    pub fn to_plain(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn render(&self, use_color: bool) -> String {
        if !use_color {
            return self.to_plain();
        }
        self.spans
            .iter()
            .map(|s| s.text.style(s.style).to_string())
            .collect()
    }
}

fn grey() -> Style {
    Style::new().bright_black()
}

fn accent() -> Style {
    Style::new().bold().cyan()
}

pub fn header_line(tagline: &str, flash: Option<&str>) -> Line {
    let (text, style) = match flash {
        Some(message) => (message, Style::new().yellow()),
        None => (tagline, grey()),
    };
    Line::default()
        .push(APP_NAME, accent())
        .push(format!(" \u{2014} {}", text), style)
}

pub fn list_line(label: &str, selected: bool) -> Line {
    if selected {
        Line::default().push("> ", accent()).push(label, Style::new().bold())
    } else {
        Line::plain(format!("  {}", label))
    }
}

/// "N results" gets a highlighted count; anything else is dimmed.
pub fn status_line(status: &str, giphy_attribution: bool) -> Line {
    let digits = status.bytes().take_while(u8::is_ascii_digit).count();
    let line = if digits > 0 && status[digits..].starts_with(" results") {
        Line::default()
            .push(&status[..digits], accent())
            .push(&status[digits..], grey())
    } else {
        Line::default().push(status, grey())
    };
    if giphy_attribution {
        line.push(GIPHY_CREDIT, grey())
    } else {
        line
    }
}

pub fn search_line(mode: Mode, query: &str, use_color: bool) -> Line {
    if !use_color {
        return Line::plain(format!("[Search] {}", query));
    }
    let pill = Style::new().on_color(XtermColors::from(236));
    match mode {
        Mode::Query => Line::default()
            .push(" Search ", pill.bold().yellow())
            .push(format!(" {}", query), Style::new())
            .push("\u{258d}", Style::new().cyan()),
        Mode::Browse => Line::default()
            .push(" Search ", pill.bright_black())
            .push(format!(" {}", query), Style::new()),
    }
}

/// Key hints centered across the full terminal width.
pub fn hints_line(cols: u16) -> Line {
    let mut line = Line::default();
    for (i, (key, label)) in HINTS.iter().enumerate() {
        if i > 0 {
            line = line.push("  ", Style::new());
        }
        line = line.push(*key, accent()).push(format!(" {}", label), grey());
    }
    let pad = usize::from(cols).saturating_sub(line.width()) / 2;
    let mut centered = Line::plain(" ".repeat(pad));
    centered.spans.extend(line.spans);
    centered
}

/// Writes `line` at a 1-based position, clipped to `width`, erasing the rest
/// of the terminal row.
pub fn write_line_at(
    out: &mut dyn Write,
    row: u16,
    col: u16,
    line: &Line,
    width: u16,
    use_color: bool,
) -> io::Result<()> {
    out.queue(cursor::MoveTo(col.saturating_sub(1), row.saturating_sub(1)))?;
    if width > 0 {
        let text = line.clone().truncate(usize::from(width)).render(use_color);
        out.queue(Print(text))?;
    }
    out.queue(terminal::Clear(terminal::ClearType::UntilNewLine))?;
    Ok(())
}

fn blank_line(out: &mut dyn Write, row: u16, width: u16) -> io::Result<()> {
    write_line_at(out, row, 1, &Line::default(), width, false)
}

/// Redraws the whole screen and brings the preview up to date.
pub fn render(
    out: &mut dyn Write,
    state: &mut SessionState,
    renderer: &dyn InlineRenderer,
    now: Instant,
) -> io::Result<()> {
    if state.rows == 0 || state.cols == 0 {
        return Ok(());
    }
    state.ensure_visible();
    let layout = state.layout();
    let color = state.use_color;

    state.scheduler.release_if_cleared(out, renderer)?;

    let header = header_line(state.tagline, state.flash.current(now));
    write_line_at(out, 1, 1, &header, layout.cols, color)?;

    if !layout.has_content {
        for row in 2..=layout.rows {
            blank_line(out, row, layout.cols)?;
        }
        return Ok(());
    }

    let in_grid = renderer.protocol() == InlineProtocol::Iterm;
    if layout.clear_width > 0 && (!in_grid || !state.last_side_by_side) {
        for row in layout.content_top..=layout.content_bottom {
            blank_line(out, row, layout.clear_width)?;
        }
    }
    state.last_side_by_side = layout.side_by_side;

    draw_list(out, state, &layout)?;
    if in_grid && layout.side_by_side && layout.has_preview() {
        clear_gap_column(out, &layout)?;
    }
    draw_preview(out, state, renderer, &layout, now)?;

    let status = if state.status.is_empty() {
        format!("{} results", state.results.len())
    } else {
        state.status.clone()
    };
    write_line_at(
        out,
        layout.status_row,
        1,
        &status_line(&status, state.giphy_attribution),
        layout.cols,
        color,
    )?;
    write_line_at(
        out,
        layout.search_row,
        1,
        &search_line(state.mode, &state.query, color),
        layout.cols,
        color,
    )?;
    write_line_at(out, layout.hints_row, 1, &hints_line(layout.cols), layout.cols, color)?;

    // Rows no section owns, e.g. after shrinking the terminal.
    for row in 1..=layout.rows {
        let owned = row == 1
            || (layout.content_top..=layout.content_bottom).contains(&row)
            || row == layout.status_row
            || row == layout.search_row
            || row == layout.hints_row;
        if !owned {
            blank_line(out, row, layout.cols)?;
        }
    }
    Ok(())
}

fn draw_list(out: &mut dyn Write, state: &SessionState, layout: &Layout) -> io::Result<()> {
    for i in 0..layout.list_height {
        let row = layout.content_top + i;
        let index = state.scroll + usize::from(i);
        let line = match state.results.get(index) {
            Some(result) => list_line(result.label(), index == state.selected),
            None => Line::default(),
        };
        write_line_at(out, row, layout.list_col, &line, layout.list_width, state.use_color)?;
    }
    Ok(())
}

fn draw_preview(
    out: &mut dyn Write,
    state: &mut SessionState,
    renderer: &dyn InlineRenderer,
    layout: &Layout,
    now: Instant,
) -> io::Result<()> {
    if state.scheduler.handle().is_none() || !layout.has_preview() {
        return Ok(());
    }

    if let Some(label_row) = layout.preview_label_row() {
        let label = Line::default().push(PREVIEW_LABEL, grey());
        write_line_at(out, label_row, 1, &label, layout.cols, state.use_color)?;
        // Grid images are cleared by the scheduler only when it redraws.
        if renderer.protocol() != InlineProtocol::Iterm {
            for row in layout.preview_row..layout.preview_row + layout.preview_rows {
                blank_line(out, row, layout.cols)?;
            }
        }
    }

    let at = Placement {
        row: layout.preview_row,
        col: layout.preview_col,
        cols: layout.preview_cols,
        rows: layout.preview_rows,
    };
    state.scheduler.draw(out, renderer, at, now)
}

/// Blanks the single column between a grid preview and the list.
fn clear_gap_column(out: &mut dyn Write, layout: &Layout) -> io::Result<()> {
    let gap = Placement {
        row: layout.content_top,
        col: layout.preview_cols + 1,
        cols: 1,
        rows: layout.content_height,
    };
    if gap.col > layout.cols {
        return Ok(());
    }
    out.queue(cursor::SavePosition)?;
    clear_rect(out, &gap)?;
    out.queue(cursor::RestorePosition)?;
    Ok(())
}
