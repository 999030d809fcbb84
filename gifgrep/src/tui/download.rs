// ABOUTME: Saves the selected GIF into ~/Downloads under a sanitized, collision-free name
// ABOUTME: Writes through a temp file in the target directory and renames it into place

use anyhow::{Context, Result, anyhow};
use gifgrep_search::SearchResult;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::constants::ui::{DOWNLOAD_DIR, DOWNLOAD_NAME_MAX};
use crate::preview::PreviewFetcher;

const FALLBACK_NAME: &str = "gif";
const MAX_SUFFIX: u32 = 999;

pub fn default_download_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home.join(DOWNLOAD_DIR))
}

/// File name for a result: title, then id, then the URL's last path segment.
pub fn filename_for_result(result: &SearchResult) -> String {
    let mut name = result.title.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        name = result.id.split_whitespace().collect::<Vec<_>>().join(" ");
    }
    if name.is_empty() {
        name = filename_from_url(&result.url);
    }
    if name.is_empty() {
        name = FALLBACK_NAME.to_string();
    }

    let mut name = sanitize_filename(&name);
    if !name.to_ascii_lowercase().ends_with(".gif") {
        name.push_str(".gif");
    }

    if name.len() > DOWNLOAD_NAME_MAX {
        let (base, ext) = split_extension(&name);
        let ext = if ext.len() > 10 { ".gif" } else { ext };
        let keep = DOWNLOAD_NAME_MAX - ext.len();
        name = format!("{}{}", &base[..base.len().min(keep)], ext);
    }
    name
}

fn filename_from_url(raw: &str) -> String {
    reqwest::Url::parse(raw)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .unwrap_or_default()
}

/// Keeps ASCII letters, digits, `.`, `-` and `_`; everything else becomes `_`.
fn sanitize_filename(name: &str) -> String {
    let mapped: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = mapped.trim_matches(|c| matches!(c, '.' | '_' | '-'));
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) => (&name[..dot], &name[dot..]),
        None => (name, ""),
    }
}

/// `dir/filename`, or the first free `base-N.ext` when that already exists.
pub fn unique_file_path(dir: &Path, filename: &str) -> Result<PathBuf> {
    let path = dir.join(filename);
    if !path.try_exists()? {
        return Ok(path);
    }

    let (base, ext) = split_extension(filename);
    let ext = if ext.is_empty() { ".gif" } else { ext };
    for n in 1..=MAX_SUFFIX {
        let candidate = dir.join(format!("{}-{}{}", base, n, ext));
        if !candidate.try_exists()? {
            return Ok(candidate);
        }
    }
    Err(anyhow!("could not pick filename"))
}

/// Downloads `result.url` into `dir` and returns the saved path.
pub async fn save_result(
    fetcher: &dyn PreviewFetcher,
    result: &SearchResult,
    dir: &Path,
) -> Result<PathBuf> {
    if result.url.is_empty() {
        return Err(anyhow!("No URL"));
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let target = unique_file_path(dir, &filename_for_result(result))?;

    let bytes = fetcher.fetch(&result.url).await?;

    // Dropping the temp file on an error path removes it.
    let mut temp = tempfile::Builder::new()
        .prefix("gifgrep-")
        .suffix(".gif")
        .tempfile_in(dir)
        .context("Failed to create temporary file")?;
    temp.write_all(&bytes)?;
    temp.flush()?;
    temp.persist(&target)
        .map_err(|e| anyhow!("Failed to save {}: {}", target.display(), e.error))?;

    log::info!("saved {} ({} bytes)", target.display(), bytes.len());
    Ok(target)
}
