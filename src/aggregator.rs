//! Cross-source aggregation: concurrent refresh, dedup, and ordering.
//!
//! Each enabled source is fetched and parsed independently; a failing
//! source contributes zero items and a failure count, never aborting its
//! siblings. The merge happens only after every source has settled, so
//! no state is shared while requests are in flight.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use futures::future::join_all;

use crate::feed::{parse_feed, FetchError, NewsItem, ProxyClient};
use crate::sources::Source;

/// How a refresh cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshStatus {
    /// Every source was disabled; nothing was fetched.
    NoSourcesEnabled,
    /// The cycle ran; per-source outcomes are counted here.
    Completed { ok: usize, failed: usize },
}

/// The merged, deduplicated, sorted result of one refresh cycle.
///
/// Produced fresh on every refresh and replacing the previous one
/// wholesale — nothing carries over between cycles.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// Newest-first items across all sources that answered.
    pub items: Vec<NewsItem>,
    pub status: RefreshStatus,
    /// Wall time of the whole cycle.
    pub elapsed: Duration,
}

impl RefreshOutcome {
    /// The status line shown to the user after a refresh.
    pub fn summary(&self) -> String {
        match self.status {
            RefreshStatus::NoSourcesEnabled => {
                "All sources are disabled. Enable at least one in the source settings.".to_string()
            }
            RefreshStatus::Completed { ok, failed } => {
                let secs = (self.elapsed.as_millis() as f64 / 100.0).round() / 10.0;
                format!(
                    "Done: {ok} ok / {failed} failed • {} items • {secs}s",
                    self.items.len()
                )
            }
        }
    }
}

/// Fetches and parses every enabled source concurrently and merges the
/// results into one [`RefreshOutcome`].
///
/// The join point waits for every per-source task to settle — a timeout
/// or HTTP error on one source never short-circuits the others, and each
/// fetch's deadline is local to it. Results come back in source order,
/// which makes the pre-sort order (and therefore the relative order of
/// undated items after the stable sort) deterministic.
///
/// With no enabled sources the outcome is empty with the distinct
/// [`RefreshStatus::NoSourcesEnabled`] status rather than an error.
pub async fn refresh(client: &ProxyClient, sources: &[Source]) -> RefreshOutcome {
    let started = Instant::now();

    let enabled: Vec<&Source> = sources.iter().filter(|s| s.enabled).collect();
    if enabled.is_empty() {
        tracing::info!("refresh skipped: no sources enabled");
        return RefreshOutcome {
            items: Vec::new(),
            status: RefreshStatus::NoSourcesEnabled,
            elapsed: started.elapsed(),
        };
    }

    tracing::info!(sources = enabled.len(), "refreshing sources");

    let tasks = enabled.iter().map(|source| async move {
        let xml = client.fetch(&source.url).await?;
        Ok::<_, FetchError>(parse_feed(&xml, &source.name))
    });
    let results: Vec<Result<Vec<NewsItem>, FetchError>> = join_all(tasks).await;

    let mut merged: Vec<NewsItem> = Vec::new();
    let mut ok = 0usize;
    let mut failed = 0usize;
    for (source, result) in enabled.iter().zip(results) {
        match result {
            Ok(items) => {
                tracing::debug!(source = %source.id, items = items.len(), "source fetched");
                ok += 1;
                merged.extend(items);
            }
            Err(e) => {
                tracing::warn!(source = %source.id, error = %e, "source failed, continuing without it");
                failed += 1;
            }
        }
    }

    let mut items = dedupe(merged);
    sort_newest_first(&mut items);

    let outcome = RefreshOutcome {
        items,
        status: RefreshStatus::Completed { ok, failed },
        elapsed: started.elapsed(),
    };
    tracing::info!(
        ok = ok,
        failed = failed,
        items = outcome.items.len(),
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "refresh complete"
    );
    outcome
}

/// Removes items sharing an identity key, keeping the first occurrence.
///
/// Identity is the lower-cased link, falling back to the lower-cased
/// title when the link is empty. The fallback is unreachable through the
/// parser, which already drops link-less entries, but stays correct for
/// direct callers.
pub fn dedupe(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let key = if item.link.is_empty() {
            item.title.to_lowercase()
        } else {
            item.link.to_lowercase()
        };
        if seen.insert(key) {
            out.push(item);
        }
    }
    out
}

/// Stable newest-first sort; undated items (key zero) end up last,
/// keeping their relative input order.
fn sort_newest_first(items: &mut [NewsItem]) {
    items.sort_by_key(|item| std::cmp::Reverse(item.sort_key()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn item(title: &str, link: &str, ts: Option<i64>) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            link: link.to_string(),
            published: ts.map(|t| Utc.timestamp_opt(t, 0).unwrap()),
            snippet: String::new(),
            source: "S".to_string(),
        }
    }

    #[test]
    fn test_dedupe_first_occurrence_wins() {
        let items = vec![
            item("From feed A", "http://x/story", Some(100)),
            item("From feed B", "HTTP://X/story", Some(200)),
            item("Other", "http://x/other", Some(300)),
        ];
        let out = dedupe(items);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "From feed A");
        assert_eq!(out[1].title, "Other");
    }

    #[test]
    fn test_dedupe_title_fallback_for_empty_link() {
        let items = vec![
            item("Same Headline", "", None),
            item("same headline", "", None),
        ];
        let out = dedupe(items);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Same Headline");
    }

    #[test]
    fn test_sort_newest_first_with_undated_last() {
        let mut items = vec![
            item("undated-1", "http://x/1", None),
            item("old", "http://x/2", Some(1_000)),
            item("undated-2", "http://x/3", None),
            item("new", "http://x/4", Some(2_000)),
        ];
        sort_newest_first(&mut items);
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        // Undated items sort last and keep their relative order
        assert_eq!(titles, vec!["new", "old", "undated-1", "undated-2"]);
    }

    #[test]
    fn test_summary_completed() {
        let outcome = RefreshOutcome {
            items: vec![item("a", "http://x/a", Some(1))],
            status: RefreshStatus::Completed { ok: 2, failed: 1 },
            elapsed: Duration::from_millis(3_240),
        };
        assert_eq!(outcome.summary(), "Done: 2 ok / 1 failed • 1 items • 3.2s");
    }

    #[test]
    fn test_summary_no_sources() {
        let outcome = RefreshOutcome {
            items: Vec::new(),
            status: RefreshStatus::NoSourcesEnabled,
            elapsed: Duration::ZERO,
        };
        assert!(outcome.summary().contains("disabled"));
    }
}
