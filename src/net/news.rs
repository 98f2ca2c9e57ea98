/// News widget backend: RSS/Atom aggregation.
///
/// Each feed is fetched through a CORS-friendly proxy host, parsed with
/// quick-xml for `item` (RSS) or `entry` (Atom) elements, then the combined
/// list is de-duplicated by case-insensitive title — first occurrence wins,
/// so fetch order decides between same-title articles — sorted newest first
/// and truncated. Results are cached for an hour so a page open doesn't
/// hammer the feeds.

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::state::settings::SettingsStore;

pub const NEWS_CACHE_KEY: &str = "newsCache";

/// Cached headlines stay valid this long (one hour).
pub const CACHE_VALIDITY_MS: i64 = 3_600_000;

/// How many headlines survive aggregation.
pub const MAX_ARTICLES: usize = 15;

/// Relay that strips CORS/referrer restrictions from feed hosts.
const PROXY_PREFIX: &str = "https://api.allorigins.win/raw?url=";

pub const DEFAULT_FEEDS: &[&str] = &[
    "https://feeds.reuters.com/reuters/technologyNews",
    "https://feeds.bloomberg.com/markets/news.rss",
    "https://feeds.cnbc.com/cnbc/world-news",
    "https://feeds.washingtonpost.com/rss/politics",
    "https://feeds.bloomberg.com/technology/news.rss",
    "https://feeds.theguardian.com/world",
    "https://feeds.nytimes.com/services/xml/rss/nyt/Technology.xml",
    "https://feeds.arstechnica.com/arstechnica/feed",
    "https://feeds.theverge.com/feed",
    "https://techcrunch.com/feed/",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub link: String,
    /// Publication time in epoch milliseconds. Articles with an unparsable
    /// date get the fetch time, so they sort near the top once.
    pub published_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsCache {
    pub articles: Vec<NewsArticle>,
    pub fetched_at_ms: i64,
}

impl NewsCache {
    pub fn load(settings: &SettingsStore) -> Option<Self> {
        settings.get(NEWS_CACHE_KEY)
    }

    pub fn store(&self, settings: &mut SettingsStore) {
        settings.set(NEWS_CACHE_KEY, self);
    }

    pub fn is_fresh(&self, now_ms: i64) -> bool {
        now_ms - self.fetched_at_ms < CACHE_VALIDITY_MS
    }
}

/// The proxied fetch URL for a feed.
pub fn proxied_url(feed_url: &str) -> String {
    format!(
        "{PROXY_PREFIX}{}",
        utf8_percent_encode(feed_url, NON_ALPHANUMERIC)
    )
}

/// Parse one RSS or Atom document into articles, in document order.
///
/// Only `title`, `link` and `pubDate`/`published` are read. Atom carries the
/// link in an attribute; RSS carries it as text. Malformed markup ends the
/// parse with whatever was collected so far.
pub fn parse_feed(xml: &str, now_ms: i64) -> Vec<NewsArticle> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    let mut articles = Vec::new();
    let mut buf = Vec::new();

    let mut in_item = false;
    let mut field: Option<Field> = None;
    let mut title = String::new();
    let mut link = String::new();
    let mut published = String::new();

    #[derive(PartialEq)]
    enum Field {
        Title,
        Link,
        Published,
    }

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" | b"entry" => {
                    in_item = true;
                    title.clear();
                    link.clear();
                    published.clear();
                }
                b"title" if in_item => field = Some(Field::Title),
                b"link" if in_item => {
                    // Atom puts the link in an attribute even when the
                    // element is not self-closed; RSS puts it in the text.
                    if let Some(href) = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.as_ref() == b"href")
                    {
                        link = String::from_utf8_lossy(&href.value).into_owned();
                        field = None;
                    } else {
                        field = Some(Field::Link);
                    }
                }
                b"pubDate" | b"published" if in_item => field = Some(Field::Published),
                _ => {}
            },
            Ok(Event::Empty(e)) if in_item && e.name().as_ref() == b"link" => {
                // Atom: <link href="..."/>
                if let Some(href) = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.as_ref() == b"href")
                {
                    link = String::from_utf8_lossy(&href.value).into_owned();
                }
            }
            Ok(Event::Text(t)) => {
                if let Ok(text) = t.unescape() {
                    match field {
                        Some(Field::Title) => title.push_str(&text),
                        Some(Field::Link) => link.push_str(&text),
                        Some(Field::Published) => published.push_str(&text),
                        None => {}
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if field == Some(Field::Title) {
                    title.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"item" | b"entry" => {
                    in_item = false;
                    if !title.trim().is_empty() {
                        articles.push(NewsArticle {
                            title: title.trim().to_string(),
                            link: link.trim().to_string(),
                            published_ms: parse_date(published.trim()).unwrap_or(now_ms),
                        });
                    }
                }
                _ => field = None,
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                eprintln!("⚠️  Feed parse stopped early: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    articles
}

/// RFC 2822 (RSS pubDate) with an RFC 3339 (Atom published) fallback.
fn parse_date(raw: &str) -> Option<i64> {
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Merge per-feed results into the headline list: de-duplicate by
/// case-insensitive title keeping the first occurrence, then newest first,
/// then cap the count.
pub fn aggregate(raw: Vec<NewsArticle>) -> Vec<NewsArticle> {
    let mut seen = std::collections::HashSet::new();
    let mut merged: Vec<NewsArticle> = raw
        .into_iter()
        .filter(|a| seen.insert(a.title.to_lowercase()))
        .collect();
    merged.sort_by(|a, b| b.published_ms.cmp(&a.published_ms));
    merged.truncate(MAX_ARTICLES);
    merged
}

/// Fetch every feed and aggregate. Feeds are fetched one after another so
/// "first occurrence wins" follows the feed list order; a failing feed is
/// skipped with a warning.
pub async fn fetch_all(feeds: &[&str]) -> Vec<NewsArticle> {
    let now_ms = Utc::now().timestamp_millis();
    let mut collected = Vec::new();

    for feed in feeds {
        match fetch_one(feed).await {
            Ok(xml) => collected.extend(parse_feed(&xml, now_ms)),
            Err(e) => eprintln!("⚠️  Feed {feed} failed: {e}"),
        }
    }

    aggregate(collected)
}

async fn fetch_one(feed_url: &str) -> Result<String, String> {
    let response = reqwest::get(proxied_url(feed_url))
        .await
        .map_err(|e| format!("request failed: {e}"))?;
    response
        .text()
        .await
        .map_err(|e| format!("body unreadable: {e}"))
}
