// ABOUTME: Centralized constants for the gifgrep application
// ABOUTME: Contains decode caps, timing, layout thresholds, key hints and env var names

pub const USER_AGENT: &str = "gifgrep";

/// Preview download limits
pub mod fetch {
    use std::time::Duration;

    /// Largest preview body accepted from the network
    pub const MAX_PREVIEW_BYTES: u64 = 8 * 1024 * 1024;

    pub const TIMEOUT: Duration = Duration::from_secs(20);

    /// Ceiling for full-size GIFs saved with the download key
    pub const MAX_DOWNLOAD_BYTES: u64 = 64 * 1024 * 1024;
}

/// Decoder caps applied to previews
pub mod decode {
    use std::time::Duration;

    pub const MAX_PIXELS: u64 = 4096 * 4096;

    /// Frame cap for the full animated preview
    pub const MAX_FRAMES: usize = 300;

    pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);
    pub const MIN_DELAY: Duration = Duration::from_millis(20);
    pub const MAX_DELAY: Duration = Duration::from_secs(10);
}

/// Event loop timing
pub mod timing {
    use std::time::Duration;

    pub const TICK: Duration = Duration::from_millis(10);

    /// How long a header flash replaces the tagline
    pub const FLASH: Duration = Duration::from_secs(3);

    pub const INPUT_QUEUE_CAPACITY: usize = 16;
}

/// Layout thresholds
pub mod layout {
    pub const MIN_SIDE_BY_SIDE_COLS: u16 = 80;
    pub const MIN_SIDE_BY_SIDE_ROWS: u16 = 14;
    pub const MIN_LIST_WIDTH: u16 = 28;
    pub const GAP: u16 = 1;
    pub const MIN_PREVIEW_COLS: u16 = 10;
    pub const MIN_STACKED_PREVIEW_ROWS: u16 = 6;
    pub const MIN_STACKED_LIST_ROWS: u16 = 2;

    /// Terminal cell width divided by cell height
    pub const CELL_ASPECT: f64 = 0.5;
}

/// UI text
pub mod ui {
    pub const APP_NAME: &str = "gifgrep";
    pub const HINTS: &str = "Enter Search  / Edit  Up/Down Select  d Download  q Quit";
    pub const PREVIEW_LABEL: &str = "Preview";
    pub const ITERM_FILE_NAME: &str = "gifgrep.gif";
    pub const DOWNLOAD_NAME_MAX: usize = 80;
    pub const DOWNLOAD_DIR: &str = "Downloads";
    pub const QUERY_PROMPT: &str = "Type a search and press Enter";
}

/// Environment variables consulted by the application
pub mod env {
    pub const SOFTWARE_ANIM: &str = "GIFGREP_SOFTWARE_ANIM";
    pub const TAGLINE_INDEX: &str = "GIFGREP_TAGLINE_INDEX";
    pub const NO_COLOR: &str = "NO_COLOR";
}
