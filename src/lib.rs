//! newsdeck — a proxy-backed RSS/Atom news aggregator.
//!
//! The pipeline: [`aggregator::refresh`] drives [`feed::ProxyClient`] and
//! [`feed::parse_feed`] for every enabled source concurrently, tolerates
//! per-source failure, deduplicates and sorts the merged set, and
//! [`filter::FilterSet::select`] narrows it for display. [`app::App`]
//! owns all of that state; the binary is a thin printer around it.

pub mod aggregator;
pub mod app;
pub mod config;
pub mod feed;
pub mod filter;
pub mod sources;

pub use aggregator::{dedupe, refresh, RefreshOutcome, RefreshStatus};
pub use app::{App, AppState};
pub use config::{Config, ConfigError};
pub use feed::{clean_snippet, parse_feed, FetchError, NewsItem, ProxyClient};
pub use filter::{FilterDefinition, FilterSet};
pub use sources::{default_sources, Source, SourceStore, StoreError};
