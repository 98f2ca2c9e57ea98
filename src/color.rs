/// Color utilities
///
/// Small, pure helpers shared by the palette extractor and the theme
/// applicator:
/// - WCAG relative luminance (used to pick a readable foreground)
/// - per-color saturation (used to pick the accent)
/// - CSS-compatible color string formatting and parsing

/// An 8-bit RGB triple.
pub type Rgb = (u8, u8, u8);

/// Compute WCAG relative luminance from an RGB triple.
///
/// Each channel is normalized to [0, 1]; values at or below 0.03928 map
/// linearly (`c / 12.92`), the rest are gamma-corrected
/// (`((c + 0.055) / 1.055)^2.4`). The result is the weighted sum
/// `0.2126 R + 0.7152 G + 0.0722 B`, in [0, 1].
///
/// Source: WCAG 2.x relative luminance definition.
pub fn luminance(r: u8, g: u8, b: u8) -> f64 {
    fn channel(v: u8) -> f64 {
        let c = v as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }

    0.2126 * channel(r) + 0.7152 * channel(g) + 0.0722 * channel(b)
}

/// Saturation heuristic used for accent selection:
/// `(max - min) / max`, or 0 when max is 0 (pure black).
pub fn saturation(r: u8, g: u8, b: u8) -> f64 {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max == 0 {
        0.0
    } else {
        (max - min) as f64 / max as f64
    }
}

/// Format as a `#rrggbb` hex string.
pub fn hex(rgb: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.0, rgb.1, rgb.2)
}

/// Format as a CSS `rgb(r, g, b)` string.
pub fn rgb_string(rgb: Rgb) -> String {
    format!("rgb({}, {}, {})", rgb.0, rgb.1, rgb.2)
}

/// Format as a CSS `rgba(r, g, b, a)` string. Alpha is in [0, 1].
pub fn rgba_string(rgb: Rgb, alpha: f64) -> String {
    format!("rgba({}, {}, {}, {})", rgb.0, rgb.1, rgb.2, alpha)
}

/// Parse a CSS-style color string back into an RGB triple.
///
/// Accepts `#rgb`, `#rrggbb`, `rgb(...)` and `rgba(...)` (alpha ignored).
/// Returns None for anything else — callers are expected to fall back to a
/// neutral color rather than fail, since theme variables are not validated
/// when written.
pub fn parse(input: &str) -> Option<Rgb> {
    let s = input.trim();

    if let Some(hex) = s.strip_prefix('#') {
        return match hex.len() {
            3 => {
                let mut it = hex.chars();
                let r = it.next()?.to_digit(16)? as u8;
                let g = it.next()?.to_digit(16)? as u8;
                let b = it.next()?.to_digit(16)? as u8;
                Some((r << 4 | r, g << 4 | g, b << 4 | b))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some((r, g, b))
            }
            _ => None,
        };
    }

    if s.starts_with("rgb(") || s.starts_with("rgba(") {
        let inner = s.split_once('(')?.1.strip_suffix(')')?;
        let mut parts = inner.split(',').map(str::trim);
        let r: u8 = parts.next()?.parse().ok()?;
        let g: u8 = parts.next()?.parse().ok()?;
        let b: u8 = parts.next()?.parse().ok()?;
        return Some((r, g, b));
    }

    None
}

/// Convert a parsed triple into an iced color.
pub fn to_iced(rgb: Rgb) -> iced::Color {
    iced::Color::from_rgb8(rgb.0, rgb.1, rgb.2)
}
