// ABOUTME: Tenor v1 search response model and mapping into SearchResult
// ABOUTME: Picks the full GIF and tinygif preview from the first media entry

use serde::Deserialize;
use std::collections::HashMap;

use crate::types::SearchResult;

#[derive(Debug, Deserialize)]
pub(crate) struct TenorResponse {
    #[serde(default)]
    results: Vec<TenorItem>,
}

#[derive(Debug, Deserialize)]
struct TenorItem {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content_description: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    media: Vec<HashMap<String, TenorMedia>>,
}

#[derive(Debug, Deserialize)]
struct TenorMedia {
    #[serde(default)]
    url: String,
    #[serde(default)]
    dims: Vec<u32>,
}

impl TenorMedia {
    fn dims(&self) -> (u32, u32) {
        match self.dims.as_slice() {
            [w, h] => (*w, *h),
            _ => (0, 0),
        }
    }
}

pub(crate) fn query_params(query: &str, api_key: &str, limit: u32) -> Vec<(&'static str, String)> {
    vec![
        ("q", query.to_string()),
        ("key", api_key.to_string()),
        ("limit", limit.to_string()),
        ("contentfilter", "low".to_string()),
    ]
}

pub(crate) fn into_results(response: TenorResponse) -> Vec<SearchResult> {
    response
        .results
        .into_iter()
        .filter_map(|item| {
            let title = [&item.title, &item.content_description, &item.id]
                .into_iter()
                .find(|s| !s.is_empty())
                .cloned()
                .unwrap_or_default();

            let media = item.media.first();
            let full = media.and_then(|m| m.get("gif")).filter(|m| !m.url.is_empty());
            let tiny = media
                .and_then(|m| m.get("tinygif"))
                .filter(|m| !m.url.is_empty());

            let (url, (width, height)) = match (full, tiny) {
                (Some(full), _) => (full.url.clone(), full.dims()),
                (None, Some(tiny)) => (tiny.url.clone(), tiny.dims()),
                (None, None) => return None,
            };
            let preview_url = tiny.map(|t| t.url.clone()).unwrap_or_else(|| url.clone());

            Some(SearchResult {
                id: item.id,
                title,
                url,
                preview_url,
                tags: item.tags,
                width,
                height,
            })
        })
        .collect()
}
