/// Theme variables and the theme applicator
///
/// A theme is six named CSS-compatible color strings. Two provenances
/// exist: "derived" sets produced by the palette extractor and "curated"
/// sets (a fixed named palette, optionally patched by custom per-variable
/// edits). Exactly one source is authoritative at a time — last writer
/// wins, no merging.
///
/// The applicator writes a set into the active style scope (everything the
/// UI renders reads colors from there) and optionally persists it so it
/// survives restart.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::color;
use crate::state::settings::SettingsStore;

/// Settings key for the palette-derived theme.
pub const DERIVED_THEME_KEY: &str = "derivedTheme";
/// Settings key for user-edited variable overrides.
pub const CUSTOM_THEME_KEY: &str = "customTheme";
/// Settings key for the selected named palette.
pub const SELECTED_THEME_KEY: &str = "selectedTheme";

/// The named set of color values applied to the UI.
///
/// Serialized field names keep the original `--var` spelling so exported
/// settings files stay interchangeable with the browser edition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeVariables {
    #[serde(rename = "--bg")]
    pub background: String,
    #[serde(rename = "--fg")]
    pub foreground: String,
    #[serde(rename = "--accent")]
    pub accent: String,
    #[serde(rename = "--secondary")]
    pub secondary: String,
    #[serde(rename = "--bookmark-bg")]
    pub bookmark_bg: String,
    #[serde(rename = "--bookmark-hover-bg")]
    pub bookmark_hover_bg: String,
}

impl ThemeVariables {
    /// Look up a variable by its `--name` spelling. Used when applying
    /// custom overrides key-by-key.
    pub fn set_var(&mut self, name: &str, value: &str) {
        match name {
            "--bg" => self.background = value.to_string(),
            "--fg" => self.foreground = value.to_string(),
            "--accent" => self.accent = value.to_string(),
            "--secondary" => self.secondary = value.to_string(),
            "--bookmark-bg" => self.bookmark_bg = value.to_string(),
            "--bookmark-hover-bg" => self.bookmark_hover_bg = value.to_string(),
            _ => {} // unknown variables are ignored
        }
    }
}

/// Built-in curated palettes (name, variables), in menu order.
pub fn named_palettes() -> Vec<(&'static str, ThemeVariables)> {
    fn vars(bg: &str, fg: &str, accent: &str, secondary: &str, tile: (u8, u8, u8)) -> ThemeVariables {
        ThemeVariables {
            background: bg.to_string(),
            foreground: fg.to_string(),
            accent: accent.to_string(),
            secondary: secondary.to_string(),
            bookmark_bg: color::rgba_string(tile, 0.08),
            bookmark_hover_bg: color::rgba_string(tile, 0.18),
        }
    }

    vec![
        ("gruvbox", vars("#282828", "#ebdbb2", "#d79921", "#504945", (235, 219, 178))),
        ("darkOcean", vars("#0f2027", "#a7c7e7", "#00bcd4", "#1c3b50", (167, 199, 231))),
        ("solarized", vars("#002b36", "#839496", "#b58900", "#073642", (131, 148, 150))),
        ("catppuccinMocha", vars("#1e1e2e", "#cdd6f4", "#f5c2e7", "#313244", (205, 214, 244))),
        ("catppuccinLatte", vars("#fbf1c7", "#575268", "#d7827e", "#f2d5cf", (87, 82, 104))),
        ("catppuccinFrappe", vars("#303446", "#c6d0f5", "#f2cdcd", "#5b6078", (198, 208, 245))),
    ]
}

/// Find a curated palette by name.
pub fn named_palette(name: &str) -> Option<ThemeVariables> {
    named_palettes()
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v)
}

/// The active style scope: whatever set was applied last.
#[derive(Debug, Clone)]
pub struct StyleScope {
    active: ThemeVariables,
}

impl Default for StyleScope {
    fn default() -> Self {
        Self {
            // gruvbox is the first-run default, as in the stylesheet.
            active: named_palettes().remove(0).1,
        }
    }
}

impl StyleScope {
    /// Rebuild the scope from persisted settings.
    ///
    /// Precedence (last writer wins at runtime; at startup we replay in
    /// write-plausibility order): selected named palette, then custom
    /// per-variable overrides, then — only while auto-theme is on — the
    /// persisted derived set.
    pub fn load(settings: &SettingsStore, auto_theme: bool) -> Self {
        let mut scope = Self::default();

        if let Some(name) = settings.get::<String>(SELECTED_THEME_KEY) {
            if let Some(vars) = named_palette(&name) {
                scope.active = vars;
            }
        }

        if let Some(overrides) = settings.get::<BTreeMap<String, String>>(CUSTOM_THEME_KEY) {
            for (name, value) in &overrides {
                scope.active.set_var(name, value);
            }
        }

        if auto_theme {
            if let Some(derived) = settings.get::<ThemeVariables>(DERIVED_THEME_KEY) {
                scope.active = derived;
            }
        }

        scope
    }

    /// Apply a variable set to the scope, optionally persisting it under
    /// the derived-theme key.
    ///
    /// Color strings are not validated here: a malformed value renders as
    /// the neutral fallback downstream instead of crashing.
    pub fn apply(&mut self, vars: ThemeVariables, persist: bool, settings: &mut SettingsStore) {
        if persist {
            settings.set(DERIVED_THEME_KEY, &vars);
        }
        self.active = vars;
    }

    /// Apply a curated named palette and remember the selection.
    pub fn apply_named(&mut self, name: &str, settings: &mut SettingsStore) -> bool {
        match named_palette(name) {
            Some(vars) => {
                settings.set(SELECTED_THEME_KEY, &name);
                self.active = vars;
                true
            }
            None => false,
        }
    }

    /// Patch a single variable and persist it with the other custom edits.
    pub fn apply_custom(&mut self, var: &str, value: &str, settings: &mut SettingsStore) {
        self.active.set_var(var, value);
        let mut overrides: BTreeMap<String, String> =
            settings.get(CUSTOM_THEME_KEY).unwrap_or_default();
        overrides.insert(var.to_string(), value.to_string());
        settings.set(CUSTOM_THEME_KEY, &overrides);
    }

    pub fn variables(&self) -> &ThemeVariables {
        &self.active
    }

    /// Parsed background color, neutral dark gray if malformed.
    pub fn background_rgb(&self) -> color::Rgb {
        color::parse(&self.active.background).unwrap_or((40, 40, 40))
    }

    /// Parsed foreground color, light parchment if malformed.
    pub fn foreground_rgb(&self) -> color::Rgb {
        color::parse(&self.active.foreground).unwrap_or((235, 219, 178))
    }

    pub fn accent_rgb(&self) -> color::Rgb {
        color::parse(&self.active.accent).unwrap_or((215, 153, 33))
    }

    pub fn secondary_rgb(&self) -> color::Rgb {
        color::parse(&self.active.secondary).unwrap_or((80, 73, 69))
    }

    /// Project the scope into an iced theme so every rendered surface
    /// picks the colors up immediately.
    pub fn iced_theme(&self) -> iced::Theme {
        iced::Theme::custom(
            "startpage".to_string(),
            iced::theme::Palette {
                background: color::to_iced(self.background_rgb()),
                text: color::to_iced(self.foreground_rgb()),
                primary: color::to_iced(self.accent_rgb()),
                success: color::to_iced(self.secondary_rgb()),
                danger: iced::Color::from_rgb8(204, 36, 29),
            },
        )
    }
}
