/// Palette extraction
///
/// The auto-theming core: given a decoded background image, derive a set of
/// theme variables whose foreground stays legible against the image that
/// inspired them.
///
/// Pipeline:
/// 1. Downscale to at most 200×200 so the scan never touches more than
///    40,000 samples regardless of source resolution
/// 2. Bucket every sufficiently opaque pixel into a 12-bit color key
///    (top 4 bits of each channel)
/// 3. Rank buckets by frequency, reconstruct the top 6 as representative
///    RGB colors
/// 4. Derive primary / foreground / accent / secondary from those
///
/// The extractor is pure over the provided pixels; persisting or rendering
/// the result is the caller's job.

use image::DynamicImage;
use std::collections::HashMap;
use thiserror::Error;

use crate::color;
use crate::theme::ThemeVariables;

/// Upper bound for each dimension of the working raster.
pub const MAX_SAMPLE_DIM: u32 = 200;

/// Minimum alpha for a pixel to count as opaque. Pixels below this are
/// skipped as likely transparency or antialiased edge noise.
pub const MIN_OPAQUE_ALPHA: u8 = 125;

/// How many top-ranked buckets feed the accent search.
const TOP_BUCKETS: usize = 6;

/// Ways an extraction attempt can fail.
///
/// All of these resolve the surrounding auto-theme attempt to a silent
/// no-op: the previously active theme stays untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The source refused pixel read-back (e.g. an HTTP host answering
    /// 401/403). Terminal for that source; retrying cannot help.
    #[error("source refused pixel access")]
    TaintedSource,

    /// The image bytes could not be fetched or decoded.
    #[error("image failed to load or decode")]
    LoadFailed,

    /// No eligible (opaque) pixels were found, e.g. a fully transparent
    /// image.
    #[error("image contained no opaque pixels")]
    NoData,
}

/// Decode raw bytes and extract a theme from them.
///
/// Decode failure maps to `LoadFailed`; everything past decode is handled
/// by [`extract`].
pub fn extract_from_bytes(bytes: &[u8]) -> Result<ThemeVariables, ExtractionError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| {
        eprintln!("⚠️  Background decode failed: {e}");
        ExtractionError::LoadFailed
    })?;
    extract(&decoded)
}

/// Extract a theme-variable set from a decoded image.
pub fn extract(source: &DynamicImage) -> Result<ThemeVariables, ExtractionError> {
    let width = source.width().min(MAX_SAMPLE_DIM);
    let height = source.height().min(MAX_SAMPLE_DIM);
    if width == 0 || height == 0 {
        return Err(ExtractionError::NoData);
    }

    // Nearest-neighbor is plenty here: we only want a frequency profile,
    // not a pretty picture.
    let raster = source
        .resize_exact(width, height, image::imageops::FilterType::Nearest)
        .to_rgba8();

    let top = rank_buckets(raster.pixels().map(|p| (p[0], p[1], p[2], p[3])))?;

    let primary = top[0];
    let foreground = if color::luminance(primary.0, primary.1, primary.2) > 0.5 {
        "#111111"
    } else {
        "#ffffff"
    };

    let accent = pick_accent(&top);
    let secondary = (
        blend_toward_neutral(primary.0),
        blend_toward_neutral(primary.1),
        blend_toward_neutral(primary.2),
    );

    Ok(ThemeVariables {
        background: color::rgb_string(primary),
        foreground: foreground.to_string(),
        accent: color::rgb_string(accent),
        secondary: color::rgb_string(secondary),
        bookmark_bg: color::rgba_string(primary, 0.08),
        bookmark_hover_bg: color::rgba_string(primary, 0.18),
    })
}

/// Build the transient frequency map and return the top buckets as
/// reconstructed RGB triples, most frequent first.
fn rank_buckets(
    pixels: impl Iterator<Item = (u8, u8, u8, u8)>,
) -> Result<Vec<color::Rgb>, ExtractionError> {
    // key -> (count, first-seen order). First-seen order makes the ranking
    // deterministic when two buckets tie on frequency.
    let mut counts: HashMap<u16, (u32, u32)> = HashMap::new();
    let mut order = 0u32;

    for (r, g, b, a) in pixels {
        if a < MIN_OPAQUE_ALPHA {
            continue;
        }
        let key = bucket_key(r, g, b);
        counts
            .entry(key)
            .and_modify(|e| e.0 += 1)
            .or_insert_with(|| {
                order += 1;
                (1, order)
            });
    }

    if counts.is_empty() {
        return Err(ExtractionError::NoData);
    }

    let mut ranked: Vec<(u16, (u32, u32))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked.truncate(TOP_BUCKETS);

    Ok(ranked.into_iter().map(|(key, _)| bucket_rgb(key)).collect())
}

/// Quantize an RGB triple into its 12-bit bucket key (4 bits per channel).
fn bucket_key(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 >> 4) << 8) | ((g as u16 >> 4) << 4) | (b as u16 >> 4)
}

/// Expand a bucket key back into a representative RGB triple by
/// replicating each 4-bit value into both nibbles. This lands mid-bucket
/// rather than at the bucket floor.
fn bucket_rgb(key: u16) -> color::Rgb {
    let r = ((key >> 8) & 0xF) as u8;
    let g = ((key >> 4) & 0xF) as u8;
    let b = (key & 0xF) as u8;
    (r << 4 | r, g << 4 | g, b << 4 | b)
}

/// Choose the accent: the most saturated of the top-ranked colors.
/// When nothing has positive saturation (grayscale image) fall back to the
/// second-ranked color so the accent differs from the background, or the
/// primary when there is only one.
fn pick_accent(top: &[color::Rgb]) -> color::Rgb {
    let mut best: Option<(usize, f64)> = None;
    for (i, &(r, g, b)) in top.iter().enumerate() {
        let s = color::saturation(r, g, b);
        if s > 0.0 && best.map_or(true, |(_, bs)| s > bs) {
            best = Some((i, s));
        }
    }

    match best {
        Some((i, _)) => top[i],
        None if top.len() >= 2 => top[1],
        None => top[0],
    }
}

/// Blend a primary channel toward a lighter neutral for the secondary
/// surface color.
fn blend_toward_neutral(channel: u8) -> u8 {
    (channel as f64 * 0.7 + 40.0).round().min(255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(width: u32, height: u32, px: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(px)))
    }

    #[test]
    fn test_solid_color_primary_within_quantization_tolerance() {
        let vars = extract(&solid(64, 64, [200, 50, 50, 255])).unwrap();
        let (r, g, b) = color::parse(&vars.background).unwrap();
        assert!((r as i32 - 200).abs() <= 8, "r was {r}");
        assert!((g as i32 - 50).abs() <= 8, "g was {g}");
        assert!((b as i32 - 50).abs() <= 8, "b was {b}");
        // (200, 50, 50) is a dark red: luminance ≤ 0.5, so white text.
        assert_eq!(vars.foreground, "#ffffff");
    }

    #[test]
    fn test_light_background_gets_dark_foreground() {
        let vars = extract(&solid(16, 16, [240, 240, 240, 255])).unwrap();
        assert_eq!(vars.foreground, "#111111");
    }

    #[test]
    fn test_fully_transparent_image_is_no_data() {
        let err = extract(&solid(32, 32, [90, 90, 90, 0])).unwrap_err();
        assert_eq!(err, ExtractionError::NoData);
    }

    #[test]
    fn test_translucent_pixels_below_threshold_are_skipped() {
        let err = extract(&solid(8, 8, [90, 90, 90, 124])).unwrap_err();
        assert_eq!(err, ExtractionError::NoData);

        let ok = extract(&solid(8, 8, [90, 90, 90, 125]));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_dominant_color_wins_over_minority() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 200, 255]));
        // A 3x3 patch of red should not displace the blue primary.
        for y in 0..3 {
            for x in 0..3 {
                img.put_pixel(x, y, Rgba([200, 0, 0, 255]));
            }
        }
        let vars = extract(&DynamicImage::ImageRgba8(img)).unwrap();
        let (r, _, b) = color::parse(&vars.background).unwrap();
        assert!(b > r, "expected blue primary, got {}", vars.background);
    }

    #[test]
    fn test_accent_prefers_saturated_minority() {
        // Mostly gray with a saturated red region: the accent should be the
        // red even though gray dominates.
        let mut img = RgbaImage::from_pixel(20, 20, Rgba([128, 128, 128, 255]));
        for y in 0..6 {
            for x in 0..6 {
                img.put_pixel(x, y, Rgba([220, 30, 30, 255]));
            }
        }
        let vars = extract(&DynamicImage::ImageRgba8(img)).unwrap();
        let (r, g, b) = color::parse(&vars.accent).unwrap();
        assert!(r > g && r > b, "expected red accent, got {}", vars.accent);
    }

    #[test]
    fn test_grayscale_image_accent_falls_back_to_second_bucket() {
        let mut img = RgbaImage::from_pixel(20, 20, Rgba([64, 64, 64, 255]));
        for y in 0..5 {
            for x in 0..20 {
                img.put_pixel(x, y, Rgba([192, 192, 192, 255]));
            }
        }
        let vars = extract(&DynamicImage::ImageRgba8(img)).unwrap();
        // No positive saturation anywhere; accent must be the second-ranked
        // bucket (the lighter gray), not the primary.
        let accent = color::parse(&vars.accent).unwrap();
        let primary = color::parse(&vars.background).unwrap();
        assert_ne!(accent, primary);
    }

    #[test]
    fn test_secondary_is_lightened_blend() {
        let vars = extract(&solid(8, 8, [100, 100, 100, 255])).unwrap();
        let (r, g, b) = color::parse(&vars.secondary).unwrap();
        let primary = color::parse(&vars.background).unwrap();
        let expect = |c: u8| (c as f64 * 0.7 + 40.0).round() as u8;
        assert_eq!((r, g, b), (expect(primary.0), expect(primary.1), expect(primary.2)));
    }

    #[test]
    fn test_bookmark_surfaces_are_translucent_primary() {
        let vars = extract(&solid(8, 8, [10, 20, 30, 255])).unwrap();
        assert!(vars.bookmark_bg.starts_with("rgba("));
        assert!(vars.bookmark_bg.ends_with("0.08)"));
        assert!(vars.bookmark_hover_bg.ends_with("0.18)"));
    }

    #[test]
    fn test_bucket_round_trip_replicates_nibbles() {
        assert_eq!(bucket_rgb(bucket_key(0xF0, 0x08, 0x77)), (0xFF, 0x00, 0x77));
    }

    #[test]
    fn test_invalid_bytes_are_load_failed() {
        let err = extract_from_bytes(b"definitely not an image").unwrap_err();
        assert_eq!(err, ExtractionError::LoadFailed);
    }

    #[test]
    fn test_large_image_is_downsampled_not_rejected() {
        // 1000x600 source must still extract fine (bounded scan).
        let vars = extract(&solid(1000, 600, [30, 60, 90, 255])).unwrap();
        assert!(color::parse(&vars.background).is_some());
    }
}
