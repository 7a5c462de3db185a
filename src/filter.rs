//! Topic filters and free-text search over the merged item set.
//!
//! Filtering never re-sorts: the aggregator hands items over newest-first
//! and the engine preserves that order. Any display cap is the
//! presentation layer's business.

use crate::feed::NewsItem;

/// A named topic filter: keyword-set categorization with OR semantics.
#[derive(Debug, Clone)]
pub struct FilterDefinition {
    /// Short key used by the CLI and saved state (e.g. "btc").
    pub key: String,
    /// Human-readable label.
    pub label: String,
    /// Case-insensitive substring keywords. An empty set matches
    /// everything — that is what makes "all" the identity filter.
    pub keywords: Vec<String>,
}

impl FilterDefinition {
    fn new(key: &str, label: &str, keywords: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// The ordered set of topic filters.
#[derive(Debug, Clone)]
pub struct FilterSet {
    filters: Vec<FilterDefinition>,
}

impl Default for FilterSet {
    /// The built-in topic catalog. Keyword lists mix English and Chinese
    /// terms because the default sources do.
    fn default() -> Self {
        Self {
            filters: vec![
                FilterDefinition::new("all", "All", &[]),
                FilterDefinition::new(
                    "btc",
                    "Bitcoin",
                    &["BTC", "比特币", "Bitcoin", "铭文", "Ordinals"],
                ),
                FilterDefinition::new(
                    "eth",
                    "Ethereum",
                    &["ETH", "以太坊", "Ethereum", "L2", "Layer2", "EIP"],
                ),
                FilterDefinition::new(
                    "alt",
                    "Altcoins & Trends",
                    &[
                        "Solana", "SOL", "Base", "Ton", "TON", "DeFi", "NFT", "GameFi", "空投",
                        "meme", "meme币",
                    ],
                ),
                FilterDefinition::new(
                    "reg",
                    "Regulation & Policy",
                    &[
                        "监管", "政策", "法案", "SEC", "CFTC", "FCA", "MiCA", "合规", "税",
                        "法院", "禁令", "牌照", "执法",
                    ],
                ),
                FilterDefinition::new(
                    "sec",
                    "Security & Hacks",
                    &[
                        "黑客", "攻击", "漏洞", "盗", "被盗", "安全", "诈骗", "钓鱼", "rug",
                        "hack", "exploit",
                    ],
                ),
            ],
        }
    }
}

impl FilterSet {
    /// Looks up a filter by key.
    pub fn get(&self, key: &str) -> Option<&FilterDefinition> {
        self.filters.iter().find(|f| f.key == key)
    }

    /// All filters, in display order.
    pub fn iter(&self) -> impl Iterator<Item = &FilterDefinition> {
        self.filters.iter()
    }

    /// Applies the topic filter, then the search filter, preserving order.
    ///
    /// Topic: an item survives when its title or snippet contains any of
    /// the filter's keywords (case-insensitive substring). A filter with
    /// no keywords — or an unknown `topic_key` — keeps everything.
    ///
    /// Search: the trimmed query, when non-empty, must appear in the
    /// item's title, snippet, or source name (case-insensitive).
    pub fn select<'a>(
        &self,
        items: &'a [NewsItem],
        topic_key: &str,
        search: &str,
    ) -> Vec<&'a NewsItem> {
        let mut out: Vec<&NewsItem> = items.iter().collect();

        if let Some(filter) = self.get(topic_key) {
            if !filter.keywords.is_empty() {
                let keywords: Vec<String> =
                    filter.keywords.iter().map(|k| k.to_lowercase()).collect();
                out.retain(|item| {
                    let hay = format!("{} {}", item.title, item.snippet).to_lowercase();
                    keywords.iter().any(|k| hay.contains(k.as_str()))
                });
            }
        }

        let query = search.trim().to_lowercase();
        if !query.is_empty() {
            out.retain(|item| {
                let hay =
                    format!("{} {} {}", item.title, item.snippet, item.source).to_lowercase();
                hay.contains(&query)
            });
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(title: &str, snippet: &str, source: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            link: format!("http://x/{}", title.to_lowercase()),
            published: None,
            snippet: snippet.to_string(),
            source: source.to_string(),
        }
    }

    fn sample() -> Vec<NewsItem> {
        vec![
            item("Bitcoin rally", "BTC up", "Odaily Newsflash"),
            item("Market recap", "nothing here about btc topics", "BlockBeats All"),
            item("Solana outage", "validators restarting", "Odaily Posts"),
        ]
    }

    #[test]
    fn test_all_filter_is_identity() {
        let set = FilterSet::default();
        let items = sample();
        let out = set.select(&items, "all", "");
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].title, "Bitcoin rally");
        assert_eq!(out[2].title, "Solana outage");
    }

    #[test]
    fn test_topic_matches_case_insensitively_in_snippet() {
        let set = FilterSet::default();
        // "btc" lower-case in the snippet must match the "BTC" keyword
        let items = sample();
        let out = set.select(&items, "btc", "");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "Bitcoin rally");
        assert_eq!(out[1].title, "Market recap");
    }

    #[test]
    fn test_unknown_topic_filters_nothing() {
        let set = FilterSet::default();
        let items = sample();
        assert_eq!(set.select(&items, "no-such-topic", "").len(), 3);
    }

    #[test]
    fn test_search_covers_source_name() {
        let set = FilterSet::default();
        let items = sample();
        let out = set.select(&items, "all", "blockbeats");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Market recap");
    }

    #[test]
    fn test_search_is_trimmed() {
        let set = FilterSet::default();
        let items = sample();
        assert_eq!(set.select(&items, "all", "   ").len(), 3);
        assert_eq!(set.select(&items, "all", "  solana  ").len(), 1);
    }

    #[test]
    fn test_topic_and_search_are_conjunctive() {
        let set = FilterSet::default();
        // Both match the btc topic, only one matches the search text
        let items = sample();
        let out = set.select(&items, "btc", "rally");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Bitcoin rally");
    }

    #[test]
    fn test_order_inherited_from_input() {
        let set = FilterSet::default();
        let items = vec![
            item("B second", "btc", "s"),
            item("A first", "btc", "s"),
        ];
        let out = set.select(&items, "btc", "");
        assert_eq!(out[0].title, "B second");
        assert_eq!(out[1].title, "A first");
    }

    #[test]
    fn test_all_filter_has_no_keywords() {
        let set = FilterSet::default();
        assert!(set.get("all").unwrap().keywords.is_empty());
    }
}
