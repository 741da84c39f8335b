use std::str::FromStr;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::chart::Color;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSS colour → Color32
// ---------------------------------------------------------------------------

/// Resolve a CSS colour name (`"orange"`) or hex code (`"#ffa500"`).
pub fn parse_css_color(css: &str) -> Option<Color32> {
    let css = css.trim();
    let rgb: Srgb<u8> = if css.starts_with('#') {
        Srgb::from_str(css).ok()?
    } else {
        palette::named::from_str(&css.to_ascii_lowercase())?
    };
    Some(Color32::from_rgb(rgb.red, rgb.green, rgb.blue))
}

/// On-screen colours for a list of trace colours.
///
/// Colours the renderer cannot parse get a generated hue instead, so every
/// trace stays visible and distinguishable.
pub fn screen_colors(colors: &[&Color]) -> Vec<Color32> {
    let fallback = generate_palette(colors.len());
    colors
        .iter()
        .zip(fallback)
        .map(|(color, generated)| {
            parse_css_color(color.as_str()).unwrap_or_else(|| {
                log::warn!("Unknown colour '{color}', using a generated one");
                generated
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let colors = generate_palette(5);
        assert_eq!(colors.len(), 5);
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn names_and_hex_codes_resolve() {
        assert_eq!(parse_css_color("blue"), Some(Color32::from_rgb(0, 0, 255)));
        assert_eq!(parse_css_color("Orange"), Some(Color32::from_rgb(255, 165, 0)));
        assert_eq!(parse_css_color("#1f77b4"), Some(Color32::from_rgb(0x1f, 0x77, 0xb4)));
        assert_eq!(parse_css_color("not-a-colour"), None);
    }

    #[test]
    fn unknown_colours_fall_back_to_generated() {
        let red = Color::new("red");
        let bogus = Color::new("bogus");
        let resolved = screen_colors(&[&red, &bogus]);
        assert_eq!(resolved[0], Color32::from_rgb(255, 0, 0));
        assert_eq!(resolved[1], generate_palette(2)[1]);
    }
}
