//! Source catalog: the static feed list, user toggles, and their merge.
//!
//! The catalog itself is code; only the `enabled` flags are user state,
//! persisted as a JSON file. On load the saved file is merged onto the
//! catalog so that catalog revisions (new sources, fixed URLs, renamed
//! labels) always win structure while user toggles survive.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// A configured feed endpoint with an enable toggle.
///
/// `id` is the stable identity used by the toggle merge and the CLI;
/// it never changes across catalog revisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    /// Display name attached to every item fetched from this source.
    pub name: String,
    /// Origin feed URL, fetched through the proxy.
    pub url: String,
    /// Whether the aggregator polls this source.
    pub enabled: bool,
}

impl Source {
    fn new(id: &str, name: &str, url: &str, enabled: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            url: url.to_string(),
            enabled,
        }
    }
}

/// The built-in source catalog.
pub fn default_sources() -> Vec<Source> {
    vec![
        Source::new(
            "odaily_flash",
            "Odaily Newsflash",
            "https://rss.odaily.news/rss/newsflash",
            true,
        ),
        Source::new(
            "odaily_post",
            "Odaily Posts",
            "https://rss.odaily.news/rss/post",
            true,
        ),
        Source::new(
            "blockbeats_all",
            "BlockBeats All",
            "https://api.theblockbeats.news/v2/rss/all",
            true,
        ),
        Source::new(
            "blockbeats_flash",
            "BlockBeats Newsflash",
            "https://api.theblockbeats.news/v2/rss/newsflash",
            false,
        ),
        Source::new(
            "web30_blockbeats",
            "web30 BlockBeats Posts",
            "https://rss.web30.lol/b2",
            false,
        ),
        Source::new(
            "web30_jinse",
            "web30 Jinse Posts",
            "https://rss.web30.lol/jinse2",
            false,
        ),
    ]
}

/// Saved per-source state. Only `enabled` is honored on merge; any other
/// fields in an older save file are ignored.
#[derive(Debug, Deserialize)]
struct SavedSource {
    id: String,
    enabled: bool,
}

/// Merges saved toggles onto the catalog.
///
/// The catalog defines which sources exist and their name/url; a saved
/// entry with a matching `id` overrides only `enabled`. Saved ids absent
/// from the catalog are dropped; catalog entries absent from the save
/// keep their default flag.
fn merge_saved(mut catalog: Vec<Source>, saved: &[SavedSource]) -> Vec<Source> {
    for source in &mut catalog {
        if let Some(s) = saved.iter().find(|s| s.id == source.id) {
            source.enabled = s.enabled;
        }
    }
    catalog
}

/// Errors from persisting the sources file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write sources file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode sources: {0}")]
    Encode(#[from] serde_json::Error),
}

/// JSON-file persistence for source toggles.
///
/// Reads never fail: a missing, empty, or corrupt file falls back to the
/// default catalog, the same recovery the config loader uses.
#[derive(Debug, Clone)]
pub struct SourceStore {
    path: PathBuf,
}

impl SourceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the catalog with saved toggles applied.
    pub fn load(&self) -> Vec<Source> {
        let catalog = default_sources();

        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no sources file, using defaults");
                return catalog;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "sources file unreadable, using defaults");
                return catalog;
            }
        };

        let merged = match serde_json::from_str::<Vec<SavedSource>>(&content) {
            Ok(saved) if !saved.is_empty() => merge_saved(catalog, &saved),
            Ok(_) => catalog,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "sources file corrupt, using defaults");
                return default_sources();
            }
        };

        for source in &merged {
            if !is_http_url(&source.url) {
                tracing::warn!(source = %source.id, url = %source.url, "source URL is not a valid http(s) URL");
            }
        }

        merged
    }

    /// Writes the full source list, creating parent directories as needed.
    pub fn save(&self, sources: &[Source]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(sources)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

fn is_http_url(s: &str) -> bool {
    Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_catalog_ids_unique_and_urls_valid() {
        let catalog = default_sources();
        let mut ids: Vec<_> = catalog.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
        assert!(catalog.iter().all(|s| is_http_url(&s.url)));
        assert!(catalog.iter().any(|s| s.enabled));
    }

    #[test]
    fn test_merge_overrides_enabled_only() {
        let catalog = default_sources();
        let saved = vec![SavedSource {
            id: "odaily_flash".to_string(),
            enabled: false,
        }];
        let merged = merge_saved(catalog.clone(), &saved);
        let flash = merged.iter().find(|s| s.id == "odaily_flash").unwrap();
        assert!(!flash.enabled);
        // Structure still comes from the catalog
        assert_eq!(flash.name, catalog[0].name);
        assert_eq!(flash.url, catalog[0].url);
    }

    #[test]
    fn test_merge_drops_unknown_saved_ids() {
        let saved = vec![SavedSource {
            id: "retired_source".to_string(),
            enabled: true,
        }];
        let merged = merge_saved(default_sources(), &saved);
        assert!(merged.iter().all(|s| s.id != "retired_source"));
        assert_eq!(merged.len(), default_sources().len());
    }

    #[test]
    fn test_merge_keeps_new_catalog_entries() {
        // A save written before blockbeats_flash existed should not hide it
        let saved = vec![SavedSource {
            id: "odaily_post".to_string(),
            enabled: false,
        }];
        let merged = merge_saved(default_sources(), &saved);
        assert!(merged.iter().any(|s| s.id == "blockbeats_flash"));
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let store = SourceStore::new("/tmp/newsdeck_test_missing_sources.json");
        assert_eq!(store.load(), default_sources());
    }

    #[test]
    fn test_load_corrupt_file_returns_defaults() {
        let dir = std::env::temp_dir().join("newsdeck_sources_corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sources.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = SourceStore::new(&path);
        assert_eq!(store.load(), default_sources());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_then_load_round_trips_toggles() {
        let dir = std::env::temp_dir().join("newsdeck_sources_roundtrip");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sources.json");

        let mut sources = default_sources();
        sources[0].enabled = false;
        sources[4].enabled = true;

        let store = SourceStore::new(&path);
        store.save(&sources).unwrap();
        let loaded = store.load();
        assert!(!loaded[0].enabled);
        assert!(loaded[4].enabled);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_empty_array_returns_defaults() {
        let dir = std::env::temp_dir().join("newsdeck_sources_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sources.json");
        std::fs::write(&path, "[]").unwrap();

        let store = SourceStore::new(&path);
        assert_eq!(store.load(), default_sources());

        std::fs::remove_dir_all(&dir).ok();
    }
}
