/// Search engine configuration and query building.
///
/// Five presets plus a custom template. Templates carry a `{q}` placeholder;
/// the query is percent-encoded before substitution. A custom template
/// without `{q}` is rejected at save time, and as a belt-and-braces fallback
/// the builder appends the query as a `q=` parameter if a stored template
/// still lacks the placeholder.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::state::settings::SettingsStore;

pub const SEARCH_ENGINE_KEY: &str = "searchEngine";

/// Built-in (engine id, label, template) presets.
pub const PRESETS: &[(&str, &str, &str)] = &[
    ("google", "Google", "https://www.google.com/search?q={q}"),
    ("ddg", "DuckDuckGo", "https://duckduckgo.com/?q={q}"),
    ("bing", "Bing", "https://www.bing.com/search?q={q}"),
    ("startpage", "Startpage", "https://www.startpage.com/sp/search?query={q}"),
    ("brave", "Brave", "https://search.brave.com/search?q={q}"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEngine {
    /// Preset id, or "custom".
    pub engine: String,
    pub template: String,
}

impl Default for SearchEngine {
    fn default() -> Self {
        let (id, _, template) = PRESETS[0];
        Self {
            engine: id.to_string(),
            template: template.to_string(),
        }
    }
}

impl SearchEngine {
    pub fn preset(id: &str) -> Option<Self> {
        PRESETS
            .iter()
            .find(|(pid, _, _)| *pid == id)
            .map(|(pid, _, template)| Self {
                engine: pid.to_string(),
                template: template.to_string(),
            })
    }

    /// A custom engine. The template must contain `{q}`.
    pub fn custom(template: &str) -> Option<Self> {
        let template = template.trim();
        if !template.contains("{q}") {
            return None;
        }
        Some(Self {
            engine: "custom".to_string(),
            template: template.to_string(),
        })
    }

    pub fn load(settings: &SettingsStore) -> Self {
        settings.get(SEARCH_ENGINE_KEY).unwrap_or_default()
    }

    pub fn save(&self, settings: &mut SettingsStore) {
        settings.set(SEARCH_ENGINE_KEY, self);
    }

    /// Build the URL for a query.
    pub fn query_url(&self, query: &str) -> String {
        let encoded = utf8_percent_encode(query.trim(), NON_ALPHANUMERIC).to_string();
        if self.template.contains("{q}") {
            self.template.replace("{q}", &encoded)
        } else if self.template.contains('?') {
            format!("{}&q={}", self.template, encoded)
        } else {
            format!("{}?q={}", self.template, encoded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_first_preset() {
        let engine = SearchEngine::default();
        assert_eq!(engine.engine, "google");
    }

    #[test]
    fn test_preset_lookup() {
        let ddg = SearchEngine::preset("ddg").unwrap();
        assert_eq!(ddg.template, "https://duckduckgo.com/?q={q}");
        assert!(SearchEngine::preset("altavista").is_none());
    }

    #[test]
    fn test_query_is_percent_encoded() {
        let engine = SearchEngine::preset("google").unwrap();
        let url = engine.query_url("rust iced tutorial");
        assert_eq!(
            url,
            "https://www.google.com/search?q=rust%20iced%20tutorial"
        );

        let url = engine.query_url("a&b=c");
        assert!(!url.contains("a&b"), "separator leaked into {url}");
    }

    #[test]
    fn test_custom_requires_placeholder() {
        assert!(SearchEngine::custom("https://example.com/find?x={q}").is_some());
        assert!(SearchEngine::custom("https://example.com/find").is_none());
    }

    #[test]
    fn test_template_without_placeholder_appends_query_param() {
        // A stored config can predate validation; the builder still works.
        let engine = SearchEngine {
            engine: "custom".into(),
            template: "https://example.com/search".into(),
        };
        assert_eq!(engine.query_url("hi"), "https://example.com/search?q=hi");

        let engine = SearchEngine {
            engine: "custom".into(),
            template: "https://example.com/search?lang=en".into(),
        };
        assert_eq!(
            engine.query_url("hi"),
            "https://example.com/search?lang=en&q=hi"
        );
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = SettingsStore::open_at(dir.path().join("settings.json"));
        let engine = SearchEngine::custom("https://example.com/?s={q}").unwrap();
        engine.save(&mut settings);
        assert_eq!(SearchEngine::load(&settings), engine);
    }
}
