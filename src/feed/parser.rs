use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::feed::sanitize::clean_snippet;

/// A normalized feed entry, the unit everything downstream works with.
///
/// Items missing a title or link never leave the parser. The struct is
/// immutable after parsing; a refresh replaces the whole set.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    /// Entry headline, non-empty.
    pub title: String,
    /// Absolute URL of the story, non-empty, trimmed. Doubles as the
    /// deduplication identity.
    pub link: String,
    /// Publication instant, `None` when the feed gave no parsable date.
    pub published: Option<DateTime<Utc>>,
    /// Cleaned plain-text snippet, possibly empty, length-bounded.
    pub snippet: String,
    /// Display name of the source that carried the entry.
    pub source: String,
}

impl NewsItem {
    /// Millisecond timestamp used for newest-first ordering.
    ///
    /// Unknown dates normalize to zero so they sort after everything
    /// with a real date.
    pub fn sort_key(&self) -> i64 {
        self.published.map(|dt| dt.timestamp_millis()).unwrap_or(0)
    }

    /// Publication time for display, with a distinct unknown-date state.
    pub fn published_label(&self) -> String {
        match self.published {
            Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
            None => "time unknown".to_string(),
        }
    }
}

/// Raw fields of one `<item>`/`<entry>` element, before normalization.
#[derive(Debug, Default)]
struct RawEntry {
    /// First non-empty text content per child element, keyed by the
    /// qualified tag name (so `content:encoded` is distinct from `content`).
    fields: HashMap<String, String>,
    /// `href` attribute of the first `<link>` child, when present (Atom).
    link_href: Option<String>,
}

impl RawEntry {
    /// First of `names` that has a stored non-empty text, in list order.
    fn first_text(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .find_map(|name| self.fields.get(*name).map(String::as_str))
    }
}

/// The structurally-detected shape of a feed document.
///
/// Real-world feeds mislabel their format and mix namespaces, so the
/// dispatch keys on which repeating element is actually present rather
/// than on any declared feed type. `item` wins when both appear.
#[derive(Debug)]
enum FeedShape {
    Rss(Vec<RawEntry>),
    Atom(Vec<RawEntry>),
    Unrecognized,
}

const RSS_DATE_FIELDS: &[&str] = &["pubDate", "date", "published", "updated"];
const RSS_DESC_FIELDS: &[&str] = &["description", "content:encoded", "summary"];
const ATOM_DATE_FIELDS: &[&str] = &["published", "updated"];
const ATOM_DESC_FIELDS: &[&str] = &["summary", "content"];

/// Parses feed XML into normalized items, attaching `source_name` to each.
///
/// Never fails: a document with no recognizable `item`/`entry` elements,
/// or one that breaks the XML reader partway through, degrades to an
/// empty list with a debug log. Entries lacking a title or link are
/// dropped.
pub fn parse_feed(xml: &str, source_name: &str) -> Vec<NewsItem> {
    let mapped: Vec<NewsItem> = match sniff_shape(xml) {
        FeedShape::Rss(entries) => entries
            .iter()
            .map(|raw| map_rss_item(raw, source_name))
            .collect(),
        FeedShape::Atom(entries) => entries
            .iter()
            .map(|raw| map_atom_entry(raw, source_name))
            .collect(),
        FeedShape::Unrecognized => {
            tracing::debug!(source = source_name, "no item or entry elements in feed");
            Vec::new()
        }
    };

    mapped
        .into_iter()
        .filter(|item| !item.title.is_empty() && !item.link.is_empty())
        .collect()
}

/// One pass over the document, collecting `<item>` and `<entry>` elements
/// into a [`FeedShape`].
fn sniff_shape(xml: &str) -> FeedShape {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut rss_items: Vec<RawEntry> = Vec::new();
    let mut atom_entries: Vec<RawEntry> = Vec::new();

    // Parser cursor: which container we are in, the child element being
    // accumulated, and how deep inside that child we are.
    let mut container: Option<&'static str> = None;
    let mut current = RawEntry::default();
    let mut child_name: Option<String> = None;
    let mut child_text = String::new();
    let mut child_depth: usize = 0;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if container.is_none() && (name == "item" || name == "entry") {
                    container = Some(if name == "item" { "item" } else { "entry" });
                    current = RawEntry::default();
                } else if container.is_some() {
                    if child_name.is_none() {
                        if name == "link" && current.link_href.is_none() {
                            current.link_href = first_href(&e, &reader);
                        }
                        child_name = Some(name);
                        child_text.clear();
                        child_depth = 0;
                    } else {
                        child_depth += 1;
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name();
                if container.is_some() && child_name.is_none() && name.as_ref() == b"link" {
                    if current.link_href.is_none() {
                        current.link_href = first_href(&e, &reader);
                    }
                } else if container.is_none() && matches!(name.as_ref(), b"item" | b"entry") {
                    // Childless element still counts toward format detection
                    if name.as_ref() == b"item" {
                        rss_items.push(RawEntry::default());
                    } else {
                        atom_entries.push(RawEntry::default());
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if child_name.is_some() {
                    match t.unescape() {
                        Ok(text) => child_text.push_str(&text),
                        Err(e) => {
                            tracing::debug!(error = %e, "feed text not decodable");
                            return FeedShape::Unrecognized;
                        }
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if child_name.is_some() {
                    child_text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Ok(Event::End(e)) => {
                if child_name.is_some() {
                    if child_depth > 0 {
                        child_depth -= 1;
                    } else {
                        let name = child_name.take().unwrap_or_default();
                        let trimmed = child_text.trim();
                        if !trimmed.is_empty() {
                            current
                                .fields
                                .entry(name)
                                .or_insert_with(|| trimmed.to_string());
                        }
                    }
                } else if let Some(kind) = container {
                    if e.name().as_ref() == kind.as_bytes() {
                        let raw = std::mem::take(&mut current);
                        if kind == "item" {
                            rss_items.push(raw);
                        } else {
                            atom_entries.push(raw);
                        }
                        container = None;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(error = %e, "feed XML unparsable");
                return FeedShape::Unrecognized;
            }
            Ok(_) => {}
        }
        buf.clear();
    }

    if !rss_items.is_empty() {
        FeedShape::Rss(rss_items)
    } else if !atom_entries.is_empty() {
        FeedShape::Atom(atom_entries)
    } else {
        FeedShape::Unrecognized
    }
}

/// Reads the `href` attribute off a `<link>` element, if present.
fn first_href(e: &quick_xml::events::BytesStart<'_>, reader: &Reader<&[u8]>) -> Option<String> {
    for attr_result in e.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed link attribute");
                continue;
            }
        };
        if attr.key.as_ref() == b"href" {
            return attr
                .decode_and_unescape_value(reader.decoder())
                .ok()
                .map(|v| v.to_string());
        }
    }
    None
}

fn map_rss_item(raw: &RawEntry, source: &str) -> NewsItem {
    NewsItem {
        title: raw.first_text(&["title"]).unwrap_or_default().to_string(),
        link: raw
            .first_text(&["link"])
            .unwrap_or_default()
            .trim()
            .to_string(),
        published: raw.first_text(RSS_DATE_FIELDS).and_then(parse_date),
        snippet: clean_snippet(raw.first_text(RSS_DESC_FIELDS).unwrap_or_default()),
        source: source.to_string(),
    }
}

fn map_atom_entry(raw: &RawEntry, source: &str) -> NewsItem {
    // The href attribute takes precedence over the element's text content
    let link = raw
        .link_href
        .as_deref()
        .or_else(|| raw.first_text(&["link"]))
        .unwrap_or_default()
        .trim()
        .to_string();

    NewsItem {
        title: raw.first_text(&["title"]).unwrap_or_default().to_string(),
        link,
        published: raw.first_text(ATOM_DATE_FIELDS).and_then(parse_date),
        snippet: clean_snippet(raw.first_text(ATOM_DESC_FIELDS).unwrap_or_default()),
        source: source.to_string(),
    }
}

/// Parses the date formats feeds actually use: RFC 2822 (RSS `pubDate`),
/// RFC 3339 (Atom), and a bare-date fallback seen in community mirrors.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|ndt| Utc.from_utc_datetime(&ndt));
    }
    None
}
