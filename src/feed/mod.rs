//! Feed ingestion: fetching through the proxy and normalizing feed XML.
//!
//! This module covers the per-source half of the pipeline:
//!
//! - **Fetching**: HTTP retrieval through the CORS proxy with a hard
//!   per-request deadline
//! - **Parsing**: structural RSS/Atom detection and mapping into the
//!   common [`NewsItem`] model
//! - **Sanitizing**: HTML/CDATA cleanup of description snippets
//!
//! Cross-source concerns (concurrency, deduplication, ordering) live in
//! [`crate::aggregator`].

mod fetcher;
mod parser;
mod sanitize;

pub use fetcher::{FetchError, ProxyClient, DEFAULT_TIMEOUT};
pub use parser::{parse_feed, NewsItem};
pub use sanitize::clean_snippet;
