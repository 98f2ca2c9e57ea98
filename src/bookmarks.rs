/// Bookmarks
///
/// A flat ordered list of name/url pairs persisted under the `bookmarks`
/// settings key. URLs are normalized on entry: bare hostnames get an https
/// scheme, protocol-relative URLs get one too, and strings that cannot be a
/// hostname are rejected before anything is persisted.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::state::settings::SettingsStore;

pub const BOOKMARKS_KEY: &str = "bookmarks";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub name: String,
    pub url: String,
}

impl Bookmark {
    fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// The first-run set.
pub fn default_bookmarks() -> Vec<Bookmark> {
    vec![
        Bookmark::new("GitHub", "https://github.com"),
        Bookmark::new("Stack Overflow", "https://stackoverflow.com"),
        Bookmark::new("MDN", "https://developer.mozilla.org"),
        Bookmark::new("DuckDuckGo", "https://duckduckgo.com"),
        Bookmark::new("News", "https://news.ycombinator.com"),
    ]
}

pub fn load(settings: &SettingsStore) -> Vec<Bookmark> {
    settings
        .get::<Vec<Bookmark>>(BOOKMARKS_KEY)
        .unwrap_or_else(default_bookmarks)
}

pub fn save(settings: &mut SettingsStore, bookmarks: &[Bookmark]) {
    settings.set(BOOKMARKS_KEY, &bookmarks);
}

/// Move the bookmark at `from` so it lands at `to`, shifting the rest.
/// Out-of-range indices leave the list untouched.
pub fn reorder(bookmarks: &mut Vec<Bookmark>, from: usize, to: usize) {
    if from >= bookmarks.len() || to >= bookmarks.len() || from == to {
        return;
    }
    let item = bookmarks.remove(from);
    bookmarks.insert(to, item);
}

/// Normalize user-entered URL text.
///
/// - already has a scheme (`foo:`): kept as-is
/// - protocol-relative (`//host/...`): gets `https:`
/// - contains whitespace, or no dot (cannot be a hostname): rejected
/// - otherwise: `https://` is prefixed
pub fn normalize_url(input: &str) -> Option<String> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if has_scheme(s) {
        return Some(s.to_string());
    }
    if let Some(rest) = s.strip_prefix("//") {
        if rest.is_empty() {
            return None;
        }
        return Some(format!("https:{s}"));
    }
    if s.contains(char::is_whitespace) || !s.contains('.') {
        return None;
    }
    Some(format!("https://{s}"))
}

/// Characters escaped when a hostname is embedded in an icon-service URL.
const HOST_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'.').remove(b'-');

/// The hostname of a URL, lowercased, without scheme, port or path.
pub fn host(url: &str) -> Option<String> {
    let rest = url.split_once("://").map_or(url, |(_, tail)| tail);
    let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host = host.split(':').next().unwrap_or(host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}

/// Icon services to try for a host, in order. DuckDuckGo first: Google's
/// endpoint redirects to gstatic for some hosts and that can 404.
pub fn favicon_sources(host: &str) -> [String; 2] {
    let escaped = utf8_percent_encode(host, HOST_ESCAPE);
    [
        format!("https://icons.duckduckgo.com/ip3/{escaped}.ico"),
        format!("https://www.google.com/s2/favicons?sz=64&domain={escaped}"),
    ]
}

/// Whether the string starts with a URI scheme (`alpha (alnum|+|-|.)* :`).
fn has_scheme(s: &str) -> bool {
    let Some(colon) = s.find(':') else {
        return false;
    };
    let prefix = &s[..colon];
    let mut chars = prefix.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_saved() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsStore::open_at(dir.path().join("settings.json"));
        let list = load(&settings);
        assert_eq!(list.len(), 5);
        assert_eq!(list[0].name, "GitHub");
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = SettingsStore::open_at(dir.path().join("settings.json"));
        let list = vec![Bookmark::new("Example", "https://example.com")];
        save(&mut settings, &list);
        assert_eq!(load(&settings), list);
    }

    #[test]
    fn test_reorder() {
        let mut list = default_bookmarks();
        reorder(&mut list, 0, 2);
        assert_eq!(list[2].name, "GitHub");
        assert_eq!(list[0].name, "Stack Overflow");

        // Out-of-range indices are no-ops.
        let before = list.clone();
        reorder(&mut list, 9, 0);
        reorder(&mut list, 0, 9);
        assert_eq!(list, before);
    }

    #[test]
    fn test_normalize_keeps_existing_scheme() {
        assert_eq!(
            normalize_url("https://example.com/a"),
            Some("https://example.com/a".into())
        );
        assert_eq!(
            normalize_url("ftp://files.example.com"),
            Some("ftp://files.example.com".into())
        );
    }

    #[test]
    fn test_normalize_protocol_relative() {
        assert_eq!(
            normalize_url("//cdn.example.com/x.png"),
            Some("https://cdn.example.com/x.png".into())
        );
    }

    #[test]
    fn test_normalize_bare_hostname() {
        assert_eq!(normalize_url("example.com"), Some("https://example.com".into()));
        assert_eq!(
            normalize_url("  example.com/path  "),
            Some("https://example.com/path".into())
        );
    }

    #[test]
    fn test_normalize_rejects_nonsense() {
        assert_eq!(normalize_url(""), None);
        assert_eq!(normalize_url("not a url"), None);
        assert_eq!(normalize_url("localhost"), None); // no dot
        assert_eq!(normalize_url("has space.com"), None);
    }

    #[test]
    fn test_host_extraction() {
        assert_eq!(
            host("https://github.com/rust-lang/rust"),
            Some("github.com".into())
        );
        assert_eq!(host("http://Example.COM:8080/x?y#z"), Some("example.com".into()));
        assert_eq!(host("news.ycombinator.com"), Some("news.ycombinator.com".into()));
        assert_eq!(host(""), None);
    }

    #[test]
    fn test_favicon_sources_try_duckduckgo_then_google() {
        let [first, second] = favicon_sources("github.com");
        assert_eq!(first, "https://icons.duckduckgo.com/ip3/github.com.ico");
        assert_eq!(
            second,
            "https://www.google.com/s2/favicons?sz=64&domain=github.com"
        );
    }
}
