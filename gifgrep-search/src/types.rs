// ABOUTME: Result model and provider selection shared by every search backend
// ABOUTME: SearchResult is consumed read-only by the interactive browser

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SearchError;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub url: String,
    pub preview_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub width: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub height: u32,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

impl SearchResult {
    /// Label shown in lists: the title, or the id when the title is blank.
    pub fn label(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.id
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Source {
    #[default]
    Tenor,
    Giphy,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Tenor => "tenor",
            Source::Giphy => "giphy",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tenor" => Ok(Source::Tenor),
            "giphy" => Ok(Source::Giphy),
            other => Err(SearchError::UnknownSource(other.to_string())),
        }
    }
}

/// Resolve the provider: an explicit choice wins, then GIFGREP_SOURCE, then Tenor.
pub fn resolve_source(explicit: Option<&str>) -> Result<Source, SearchError> {
    if let Some(value) = explicit.filter(|v| !v.trim().is_empty()) {
        return value.parse();
    }
    match std::env::var(crate::constants::env::SOURCE) {
        Ok(value) if !value.trim().is_empty() => value.parse(),
        _ => Ok(Source::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_source_parsing() {
        assert_eq!("tenor".parse::<Source>().unwrap(), Source::Tenor);
        assert_eq!(" GIPHY ".parse::<Source>().unwrap(), Source::Giphy);
        assert!(matches!(
            "imgur".parse::<Source>(),
            Err(SearchError::UnknownSource(s)) if s == "imgur"
        ));
    }

    #[test]
    fn test_label_falls_back_to_id() {
        let result = SearchResult {
            id: "abc".to_string(),
            title: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(result.label(), "abc");
    }

    #[test]
    #[serial]
    fn test_resolve_source_precedence() {
        unsafe {
            std::env::set_var("GIFGREP_SOURCE", "giphy");
        }
        assert_eq!(resolve_source(None).unwrap(), Source::Giphy);
        assert_eq!(resolve_source(Some("tenor")).unwrap(), Source::Tenor);

        unsafe {
            std::env::remove_var("GIFGREP_SOURCE");
        }
        assert_eq!(resolve_source(None).unwrap(), Source::Tenor);
        assert_eq!(resolve_source(Some("")).unwrap(), Source::Tenor);
    }

    #[test]
    fn test_serialization_skips_empty_fields() {
        let result = SearchResult {
            id: "1".to_string(),
            title: "Cat".to_string(),
            url: "https://example.test/full.gif".to_string(),
            preview_url: "https://example.test/preview.gif".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("tags"));
        assert!(!json.contains("width"));
        assert!(json.contains("\"preview_url\""));
    }
}
