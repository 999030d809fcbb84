// ABOUTME: Output formatting for the one-shot search command
// ABOUTME: Tab-separated title/url lines with optional color, or JSON

use anyhow::Result;
use gifgrep_search::SearchResult;
use owo_colors::OwoColorize;

pub trait OutputFormat {
    fn format_results(&self, results: &[SearchResult]) -> Result<String>;
}

/// One `title<TAB>url` line per result.
pub struct LineFormatter {
    use_color: bool,
}

impl LineFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }
}

impl OutputFormat for LineFormatter {
    fn format_results(&self, results: &[SearchResult]) -> Result<String> {
        let lines: Vec<String> = results
            .iter()
            .map(|result| {
                let title = normalize_title(result);
                if self.use_color {
                    format!("{}\t{}", title.bold(), result.url.cyan())
                } else {
                    format!("{}\t{}", title, result.url)
                }
            })
            .collect();
        Ok(lines.join("\n"))
    }
}

pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormat for JsonFormatter {
    fn format_results(&self, results: &[SearchResult]) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(results)?)
        } else {
            Ok(serde_json::to_string(results)?)
        }
    }
}

/// Title with runs of whitespace collapsed. Falls back to the id, then "untitled".
pub fn normalize_title(result: &SearchResult) -> String {
    let collapse = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
    let title = collapse(&result.title);
    if !title.is_empty() {
        return title;
    }
    let id = collapse(&result.id);
    if !id.is_empty() {
        return id;
    }
    "untitled".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, title: &str, url: &str) -> SearchResult {
        SearchResult {
            id: id.to_string(),
            title: title.to_string(),
            url: url.to_string(),
            preview_url: format!("{}?tiny", url),
            ..SearchResult::default()
        }
    }

    #[test]
    fn test_line_formatter_without_color() {
        let results = vec![
            result("1", "Happy  cat\n", "https://media.example/1.gif"),
            result("2", "", "https://media.example/2.gif"),
        ];
        let output = LineFormatter::new(false).format_results(&results).unwrap();
        assert_eq!(
            output,
            "Happy cat\thttps://media.example/1.gif\n2\thttps://media.example/2.gif"
        );
    }

    #[test]
    fn test_line_formatter_with_color() {
        let results = vec![result("1", "cat", "https://media.example/1.gif")];
        let output = LineFormatter::new(true).format_results(&results).unwrap();
        assert!(output.contains("\x1b[1mcat\x1b[0m"));
        assert!(output.contains("\x1b[36mhttps://media.example/1.gif\x1b[0m"));
    }

    #[test]
    fn test_empty_results() {
        let output = LineFormatter::new(false).format_results(&[]).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_untitled_fallback() {
        assert_eq!(normalize_title(&result(" ", "\t", "u")), "untitled");
    }

    #[test]
    fn test_json_formatter_compact() {
        let results = vec![result("1", "cat", "https://media.example/1.gif")];
        let output = JsonFormatter::new(false).format_results(&results).unwrap();
        assert!(!output.contains('\n'));

        let parsed: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["title"], "cat");
        assert_eq!(parsed[0]["preview_url"], "https://media.example/1.gif?tiny");
    }

    #[test]
    fn test_json_formatter_pretty() {
        let results = vec![
            result("1", "cat", "https://media.example/1.gif"),
            result("2", "dog", "https://media.example/2.gif"),
        ];
        let output = JsonFormatter::new(true).format_results(&results).unwrap();
        assert!(output.contains('\n'));
        let parsed: Vec<SearchResult> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, results);
    }

    #[test]
    fn test_json_formatter_empty() {
        let output = JsonFormatter::new(false).format_results(&[]).unwrap();
        assert_eq!(output, "[]");
    }
}
