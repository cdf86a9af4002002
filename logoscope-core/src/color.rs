// Brand colors from icon bytes

use crate::error::{CoreError, Result};
use async_trait::async_trait;
use image::GenericImageView;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Raw extractor output. The secondary color may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair {
    pub primary: String,
    pub secondary: Option<String>,
}

#[async_trait]
pub trait ColorExtractor: Send + Sync {
    async fn extract(&self, bytes: &[u8]) -> Result<ColorPair>;
}

/// Primary and secondary brand colors as uppercase `#RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandColors {
    pub primary: String,
    pub secondary: String,
}

impl BrandColors {
    /// Fill a missing secondary with black on light primaries and white on
    /// dark ones.
    pub fn from_pair(pair: ColorPair) -> Result<Self> {
        let rgb = parse_hex(&pair.primary)?;
        let primary = to_hex(rgb);

        let secondary = match pair.secondary {
            Some(s) => to_hex(parse_hex(&s)?),
            None if perceived_lightness(rgb) >= 0.5 => "#000000".to_string(),
            None => "#FFFFFF".to_string(),
        };

        Ok(Self { primary, secondary })
    }
}

/// Parse `#RGB` or `#RRGGBB` (leading `#` optional).
pub fn parse_hex(value: &str) -> Result<(u8, u8, u8)> {
    let hex = value.trim().trim_start_matches('#');
    let invalid = || CoreError::Color(format!("invalid hex color {:?}", value));

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    match hex.len() {
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|d| d * 17);
            Ok((
                digit(0).map_err(|_| invalid())?,
                digit(1).map_err(|_| invalid())?,
                digit(2).map_err(|_| invalid())?,
            ))
        }
        6 => {
            let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
            Ok((
                byte(0).map_err(|_| invalid())?,
                byte(2).map_err(|_| invalid())?,
                byte(4).map_err(|_| invalid())?,
            ))
        }
        _ => Err(invalid()),
    }
}

pub fn to_hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

/// Relative luminance in `0.0..=1.0` (sRGB, Rec. 709 weights).
pub fn perceived_lightness((r, g, b): (u8, u8, u8)) -> f64 {
    let linear = |c: u8| {
        let c = c as f64 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
}

/// Frequency-bucket extractor over decoded raster icons.
///
/// Pixels are quantized to 4 bits per channel; fully or mostly transparent
/// pixels are ignored. The secondary is the most common bucket far enough
/// from the primary.
pub struct PaletteExtractor {
    min_distance: u32,
}

impl PaletteExtractor {
    pub fn new() -> Self {
        Self { min_distance: 64 }
    }

    pub fn with_min_distance(mut self, min_distance: u32) -> Self {
        self.min_distance = min_distance;
        self
    }

    fn dominant(&self, bytes: &[u8]) -> Result<ColorPair> {
        let image = image::load_from_memory(bytes).map_err(|e| CoreError::Color(e.to_string()))?;
        let (width, height) = image.dimensions();
        debug!("Decoded {}x{} icon for color extraction", width, height);

        let mut buckets: HashMap<(u8, u8, u8), (u64, [u64; 3])> = HashMap::new();
        for pixel in image.to_rgba8().pixels() {
            let [r, g, b, a] = pixel.0;
            if a < 128 {
                continue;
            }
            let entry = buckets.entry((r >> 4, g >> 4, b >> 4)).or_default();
            entry.0 += 1;
            entry.1[0] += r as u64;
            entry.1[1] += g as u64;
            entry.1[2] += b as u64;
        }

        // Mean color per bucket, most frequent first
        let mut ranked: Vec<(u64, (u8, u8, u8))> = buckets
            .into_values()
            .map(|(n, sum)| (n, ((sum[0] / n) as u8, (sum[1] / n) as u8, (sum[2] / n) as u8)))
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let Some(&(_, primary)) = ranked.first() else {
            return Err(CoreError::Color("image has no opaque pixels".into()));
        };
        let secondary = ranked
            .iter()
            .skip(1)
            .map(|&(_, rgb)| rgb)
            .find(|&rgb| distance(primary, rgb) >= self.min_distance);

        Ok(ColorPair {
            primary: to_hex(primary),
            secondary: secondary.map(to_hex),
        })
    }
}

impl Default for PaletteExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn distance(a: (u8, u8, u8), b: (u8, u8, u8)) -> u32 {
    let d = |x: u8, y: u8| (x as i32 - y as i32).unsigned_abs();
    d(a.0, b.0) + d(a.1, b.1) + d(a.2, b.2)
}

#[async_trait]
impl ColorExtractor for PaletteExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<ColorPair> {
        self.dominant(bytes)
    }
}

/// Download icon bytes for color extraction.
pub async fn fetch_icon(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(pixels: &[(u32, Rgba<u8>)]) -> Vec<u8> {
        let total: u32 = pixels.iter().map(|(n, _)| n).sum();
        let mut img = RgbaImage::new(total, 1);
        let mut x = 0;
        for (n, color) in pixels {
            for _ in 0..*n {
                img.put_pixel(x, 0, *color);
                x += 1;
            }
        }
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(parse_hex("#FF8800").unwrap(), (255, 136, 0));
        assert_eq!(parse_hex("fff").unwrap(), (255, 255, 255));
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GGGGGG").is_err());
    }

    #[test]
    fn test_missing_secondary_follows_lightness() {
        let light = BrandColors::from_pair(ColorPair {
            primary: "#ffe000".into(),
            secondary: None,
        })
        .unwrap();
        assert_eq!(light.primary, "#FFE000");
        assert_eq!(light.secondary, "#000000");

        let dark = BrandColors::from_pair(ColorPair {
            primary: "#102040".into(),
            secondary: None,
        })
        .unwrap();
        assert_eq!(dark.secondary, "#FFFFFF");
    }

    #[test]
    fn test_explicit_secondary_is_kept() {
        let colors = BrandColors::from_pair(ColorPair {
            primary: "#000".into(),
            secondary: Some("#abcdef".into()),
        })
        .unwrap();
        assert_eq!(colors.secondary, "#ABCDEF");
    }

    #[test]
    fn test_lightness_bounds() {
        assert!(perceived_lightness((255, 255, 255)) > 0.99);
        assert!(perceived_lightness((0, 0, 0)) < 0.01);
    }

    #[tokio::test]
    async fn test_palette_extractor_picks_dominant_and_distinct() {
        let bytes = png(&[
            (10, Rgba([200, 20, 20, 255])),
            (6, Rgba([205, 22, 18, 255])),
            (4, Rgba([250, 250, 250, 255])),
            (30, Rgba([0, 0, 0, 0])),
        ]);

        let pair = PaletteExtractor::new().extract(&bytes).await.unwrap();
        assert_eq!(parse_hex(&pair.primary).unwrap().0 >> 4, 200 >> 4);
        assert_eq!(pair.secondary.as_deref(), Some("#FAFAFA"));
    }

    #[tokio::test]
    async fn test_min_distance_controls_secondary() {
        let bytes = png(&[(10, Rgba([200, 20, 20, 255])), (4, Rgba([120, 20, 20, 255]))]);

        let pair = PaletteExtractor::new().extract(&bytes).await.unwrap();
        assert_eq!(pair.primary, "#C81414");
        assert_eq!(pair.secondary.as_deref(), Some("#781414"));

        let strict = PaletteExtractor::new().with_min_distance(100);
        let pair = strict.extract(&bytes).await.unwrap();
        assert_eq!(pair.secondary, None);
    }

    #[tokio::test]
    async fn test_palette_extractor_rejects_garbage() {
        let err = PaletteExtractor::new().extract(b"not an image").await.unwrap_err();
        assert!(matches!(err, CoreError::Color(_)));
    }
}
