//! Application controller: owns all aggregation state.
//!
//! One [`App`] owns the current item set, the active topic, the search
//! text, and the source list. Refreshes replace the item set wholesale;
//! nothing is held at module scope, and every read goes through the
//! controller.

use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::aggregator::{self, RefreshOutcome};
use crate::config::Config;
use crate::feed::{NewsItem, ProxyClient};
use crate::filter::FilterSet;
use crate::sources::{Source, SourceStore};

/// The mutable aggregation state: the merged items plus view selection.
#[derive(Debug)]
pub struct AppState {
    /// Merged, deduplicated, newest-first items from the last refresh.
    pub items: Vec<NewsItem>,
    /// Active topic filter key.
    pub active_filter: String,
    /// Current free-text search.
    pub search: String,
    /// Status line from the last refresh.
    pub status: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            active_filter: "all".to_string(),
            search: String::new(),
            status: String::new(),
        }
    }
}

/// Controller wiring state, sources, filters, and the proxy client.
pub struct App {
    state: AppState,
    sources: Vec<Source>,
    store: SourceStore,
    client: ProxyClient,
    filters: FilterSet,
}

impl App {
    /// Builds the controller from configuration, loading saved source
    /// toggles from `store`.
    pub fn new(config: &Config, store: SourceStore) -> Result<Self> {
        let proxy_base: Url = config
            .proxy_base
            .parse()
            .with_context(|| format!("invalid proxy_base URL: {}", config.proxy_base))?;
        let client = ProxyClient::new(proxy_base, Duration::from_millis(config.fetch_timeout_ms));
        let sources = store.load();

        Ok(Self {
            state: AppState::default(),
            sources,
            store,
            client,
            filters: FilterSet::default(),
        })
    }

    /// Runs one refresh cycle and replaces the current item set.
    ///
    /// Takes `&mut self`, so refreshes are serialized: a second cycle
    /// cannot start through the controller while one is in flight.
    pub async fn refresh(&mut self) -> &AppState {
        let outcome = aggregator::refresh(&self.client, &self.sources).await;
        self.apply(outcome);
        &self.state
    }

    /// Replaces state from a finished refresh cycle.
    pub fn apply(&mut self, outcome: RefreshOutcome) {
        self.state.status = outcome.summary();
        self.state.items = outcome.items;
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Sets the active topic. Unknown keys are kept and simply filter
    /// nothing, matching the engine's behavior.
    pub fn set_filter(&mut self, key: &str) {
        self.state.active_filter = key.to_string();
    }

    pub fn set_search(&mut self, text: &str) {
        self.state.search = text.to_string();
    }

    /// Items passing the active topic and search filters, newest-first.
    pub fn visible(&self) -> Vec<&NewsItem> {
        self.filters
            .select(&self.state.items, &self.state.active_filter, &self.state.search)
    }

    /// Toggles one source by id and persists the whole list.
    pub fn set_source_enabled(&mut self, id: &str, enabled: bool) -> Result<()> {
        let source = self
            .sources
            .iter_mut()
            .find(|s| s.id == id)
            .with_context(|| format!("unknown source id: {id}"))?;
        source.enabled = enabled;
        self.store
            .save(&self.sources)
            .context("failed to persist source toggles")?;
        Ok(())
    }
}
