// ABOUTME: Giphy v1 search response model and mapping into SearchResult
// ABOUTME: Giphy reports dimensions as strings, parsed leniently to zero

use serde::Deserialize;

use crate::types::SearchResult;

#[derive(Debug, Deserialize)]
pub(crate) struct GiphyResponse {
    #[serde(default)]
    data: Vec<GiphyItem>,
}

#[derive(Debug, Deserialize)]
struct GiphyItem {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    images: GiphyImages,
}

#[derive(Debug, Default, Deserialize)]
struct GiphyImages {
    #[serde(default)]
    original: GiphyRendition,
    #[serde(default)]
    fixed_width_small: GiphyRendition,
    #[serde(default)]
    preview_gif: GiphyRendition,
}

#[derive(Debug, Default, Deserialize)]
struct GiphyRendition {
    #[serde(default)]
    url: String,
    #[serde(default)]
    width: String,
    #[serde(default)]
    height: String,
}

pub(crate) fn query_params(query: &str, api_key: &str, limit: u32) -> Vec<(&'static str, String)> {
    vec![
        ("q", query.to_string()),
        ("api_key", api_key.to_string()),
        ("limit", limit.to_string()),
        ("rating", "g".to_string()),
    ]
}

fn parse_dimension(s: &str) -> u32 {
    s.trim().parse().unwrap_or(0)
}

pub(crate) fn into_results(response: GiphyResponse) -> Vec<SearchResult> {
    response
        .data
        .into_iter()
        .filter(|item| !item.images.original.url.is_empty())
        .map(|item| {
            let images = item.images;
            let url = images.original.url;
            let preview_url = [images.fixed_width_small.url, images.preview_gif.url]
                .into_iter()
                .find(|u| !u.is_empty())
                .unwrap_or_else(|| url.clone());
            let title = if item.title.is_empty() {
                item.id.clone()
            } else {
                item.title
            };

            SearchResult {
                id: item.id,
                title,
                url,
                preview_url,
                tags: Vec::new(),
                width: parse_dimension(&images.original.width),
                height: parse_dimension(&images.original.height),
            }
        })
        .collect()
}
