// ABOUTME: Pure screen geometry for the session: header, content, preview and footer rows
// ABOUTME: Chooses side-by-side or stacked preview and fits the preview to the image aspect

use crate::constants::layout::{
    CELL_ASPECT, GAP, MIN_LIST_WIDTH, MIN_PREVIEW_COLS, MIN_SIDE_BY_SIDE_COLS,
    MIN_SIDE_BY_SIDE_ROWS, MIN_STACKED_LIST_ROWS, MIN_STACKED_PREVIEW_ROWS,
};

/// Pixel size of the image the preview area has to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewDims {
    pub width: u32,
    pub height: u32,
}

/// Screen geometry. Rows and columns are 1-based; a zero means "absent".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Layout {
    pub rows: u16,
    pub cols: u16,
    pub has_content: bool,
    pub content_top: u16,
    pub content_bottom: u16,
    pub content_height: u16,
    pub search_row: u16,
    pub status_row: u16,
    pub hints_row: u16,
    pub side_by_side: bool,
    pub list_col: u16,
    pub list_width: u16,
    pub list_height: u16,
    pub preview_row: u16,
    pub preview_col: u16,
    pub preview_cols: u16,
    pub preview_rows: u16,
    /// Columns left of the list that belong to the preview area.
    pub clear_width: u16,
}

impl Layout {
    /// Row of the "Preview" label in stacked mode.
    pub fn preview_label_row(&self) -> Option<u16> {
        (!self.side_by_side && self.preview_rows > 0).then_some(self.content_top + self.list_height)
    }

    pub fn has_preview(&self) -> bool {
        self.preview_cols > 0 && self.preview_rows > 0
    }
}

/// `fixed_preview_box` keeps the side-by-side preview at its full budget
/// instead of fitting it to the image, for protocols whose images live in the
/// text grid.
pub fn build_layout(
    rows: u16,
    cols: u16,
    preview: Option<PreviewDims>,
    fixed_preview_box: bool,
) -> Layout {
    let mut layout = Layout {
        rows,
        cols,
        search_row: rows.saturating_sub(2),
        status_row: rows.saturating_sub(1),
        hints_row: rows,
        ..Layout::default()
    };
    if layout.search_row < 2 {
        return layout;
    }

    layout.content_top = 2;
    layout.content_bottom = layout.search_row - 1;
    if layout.content_bottom < layout.content_top {
        return layout;
    }
    layout.content_height = layout.content_bottom - layout.content_top + 1;
    layout.has_content = true;

    let mut side_by_side =
        cols >= MIN_SIDE_BY_SIDE_COLS && rows >= MIN_SIDE_BY_SIDE_ROWS && preview.is_some();
    let budget_cols = cols.saturating_sub(MIN_LIST_WIDTH + GAP);
    if side_by_side && budget_cols < MIN_PREVIEW_COLS {
        side_by_side = false;
    }
    layout.side_by_side = side_by_side;

    let (preview_cols, preview_rows) = match preview {
        None => (0, 0),
        Some(_) if side_by_side && fixed_preview_box => (budget_cols, layout.content_height),
        Some(_) if side_by_side => fit_preview_size(budget_cols, layout.content_height, preview),
        Some(_) => fit_preview_size(cols, stacked_preview_rows(layout.content_height), preview),
    };
    layout.preview_cols = preview_cols;
    layout.preview_rows = preview_rows;

    layout.list_col = 1;
    layout.list_width = cols;
    layout.list_height = layout.content_height;

    if side_by_side && preview_cols > 0 {
        layout.list_col = preview_cols + GAP + 1;
        layout.list_width = (cols + 1).saturating_sub(layout.list_col);
        layout.clear_width = layout.list_col - GAP;
        layout.preview_row =
            layout.content_top + layout.content_height.saturating_sub(preview_rows) / 2;
        layout.preview_col = 1;
    } else if !side_by_side && preview_rows > 0 {
        // One row goes to the "Preview" label.
        layout.list_height = layout.content_height.saturating_sub(preview_rows + 1);
        layout.preview_row = layout.content_top + layout.list_height + 1;
        layout.preview_col = 1;
    }

    layout
}

/// Half the content height, at least 6 rows, leaving 2 rows for the list.
fn stacked_preview_rows(content_height: u16) -> u16 {
    let mut avail = content_height / 2;
    if avail < MIN_STACKED_PREVIEW_ROWS {
        avail = MIN_STACKED_PREVIEW_ROWS.min(content_height);
    }
    avail.min(content_height.saturating_sub(MIN_STACKED_LIST_ROWS))
}

/// Largest cell box inside the budget that keeps the image aspect ratio.
pub fn fit_preview_size(avail_cols: u16, avail_rows: u16, dims: Option<PreviewDims>) -> (u16, u16) {
    if avail_cols == 0 || avail_rows == 0 {
        return (0, 0);
    }
    let Some(dims) = dims.filter(|d| d.width > 0 && d.height > 0) else {
        return (avail_cols, avail_rows);
    };

    let ratio = dims.height as f64 / dims.width as f64;
    let mut cols = avail_cols as f64;
    let mut rows = (cols * CELL_ASPECT * ratio).round();
    if rows > avail_rows as f64 {
        rows = avail_rows as f64;
        cols = (rows / CELL_ASPECT / ratio).round();
    }

    let cols = (cols.max(1.0) as u16).min(avail_cols);
    let rows = (rows.max(1.0) as u16).min(avail_rows);
    (cols, rows)
}

/// Scroll offset keeping `selected` within a window of `list_height` rows.
pub fn ensure_visible(selected: usize, scroll: usize, list_height: u16) -> usize {
    let height = usize::from(list_height.max(1));
    if selected < scroll {
        selected
    } else if selected >= scroll + height {
        selected + 1 - height
    } else {
        scroll
    }
}
