// ABOUTME: Session-lifetime cache of decoded previews keyed by URL and preview kind
// ABOUTME: Fetches and decodes on miss; failures are not cached so a later visit retries

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;

use super::fetch::PreviewFetcher;
use crate::decode::{self, DecodeOptions, DecodedImage};

/// Which decode budget a lookup needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviewKind {
    /// First composited frame only.
    Thumbnail,
    /// Every frame up to the configured frame cap.
    Full,
}

#[derive(Debug, Clone)]
pub struct CachedPreview {
    pub image: Arc<DecodedImage>,
    /// Original bytes, for terminals that render the source file directly.
    pub raw: Arc<[u8]>,
}

pub struct PreviewCache {
    entries: HashMap<(String, PreviewKind), CachedPreview>,
    options: DecodeOptions,
}

impl PreviewCache {
    /// `options.max_frames` applies to full previews; thumbnails always stop at one.
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            entries: HashMap::new(),
            options,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, url: &str, kind: PreviewKind) -> Option<&CachedPreview> {
        self.entries.get(&(url.to_string(), kind))
    }

    fn options_for(&self, kind: PreviewKind) -> DecodeOptions {
        match kind {
            PreviewKind::Thumbnail => DecodeOptions {
                max_frames: 1,
                ..self.options.clone()
            },
            PreviewKind::Full => self.options.clone(),
        }
    }

    pub async fn get_or_load(
        &mut self,
        url: &str,
        kind: PreviewKind,
        fetcher: &dyn PreviewFetcher,
    ) -> Result<CachedPreview> {
        if let Some(hit) = self.get(url, kind) {
            log::debug!("preview cache hit ({:?}): {}", kind, url);
            return Ok(hit.clone());
        }
        log::debug!("preview cache miss ({:?}): {}", kind, url);

        let raw = fetcher.fetch(url).await?;
        let image = decode::decode(&raw, &self.options_for(kind))
            .with_context(|| format!("Failed to decode {}", url))?;

        let entry = CachedPreview {
            image: Arc::new(image),
            raw: raw.into(),
        };
        self.entries
            .insert((url.to_string(), kind), entry.clone());
        Ok(entry)
    }
}
