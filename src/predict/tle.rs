use std::path::{Path, PathBuf};

use chrono::Utc;
use sgp4::Elements;

use super::error::PredictError;

const ELEMENT_SET_URL: &str = "https://www.amsat.org/tle/current/nasabare.txt";
const CACHE_FILE_NAME: &str = "nasabare.txt";

/// Elements older than this are refetched before use.
const MAX_ELEMENT_AGE_DAYS: i64 = 14;

/// Resolve a NORAD catalog id to orbital elements from the AMSAT bare-TLE
/// set, using an on-disk cache and falling back to a forced refresh when the
/// cached elements are stale or the satellite is missing.
pub async fn resolve_satellite(norad_id: u32) -> Result<Elements, PredictError> {
    let cache = cache_path();

    if let Some(elements) = load_cached(&cache, norad_id).await? {
        let age_days = (Utc::now().naive_utc() - elements.datetime).num_days().abs();
        if age_days <= MAX_ELEMENT_AGE_DAYS {
            return Ok(elements);
        }
        log::info!(
            "cached elements for {} are {} days old, refreshing",
            norad_id,
            age_days
        );
    }

    refresh_cache(&cache).await?;
    load_cached(&cache, norad_id)
        .await?
        .ok_or(PredictError::SatelliteNotFound(norad_id))
}

/// Human-readable name for log lines, falling back to the catalog number.
pub fn satellite_label(elements: &Elements) -> String {
    elements
        .object_name
        .clone()
        .unwrap_or_else(|| format!("NORAD {}", elements.norad_id))
}

fn cache_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rigtrack")
        .join(CACHE_FILE_NAME)
}

async fn load_cached(cache: &Path, norad_id: u32) -> Result<Option<Elements>, PredictError> {
    let content = match tokio::fs::read_to_string(cache).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(find_in_set(&content, norad_id))
}

async fn refresh_cache(cache: &Path) -> Result<(), PredictError> {
    log::info!("fetching element set from {}", ELEMENT_SET_URL);
    let body = reqwest::get(ELEMENT_SET_URL)
        .await?
        .error_for_status()?
        .text()
        .await?;

    if let Some(dir) = cache.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(cache, &body).await?;
    Ok(())
}

/// Scan a multi-satellite TLE set for one catalog id. Entries that fail to
/// parse are skipped so one bad record cannot poison the whole set.
fn find_in_set(content: &str, norad_id: u32) -> Option<Elements> {
    for (name, line1, line2) in split_entries(content) {
        match Elements::from_tle(name, line1.as_bytes(), line2.as_bytes()) {
            Ok(elements) => {
                if elements.norad_id == u64::from(norad_id) {
                    return Some(elements);
                }
            }
            Err(e) => {
                log::warn!("skipping unparseable element set entry: {}", e);
            }
        }
    }
    None
}

fn split_entries(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut entries = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            entries.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            entries.push((
                Some(lines[i].to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            i += 1;
        }
    }
    entries
}
