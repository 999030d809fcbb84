// ABOUTME: Preview acquisition: network fetch plus the per-session decoded image cache
// ABOUTME: The session asks here for a DecodedImage whenever the selection changes

pub mod cache;
pub mod fetch;

pub use cache::{CachedPreview, PreviewCache, PreviewKind};
pub use fetch::{HttpFetcher, PreviewFetcher};
