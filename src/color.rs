use std::collections::BTreeMap;

use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            RGBColor(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// `#rrggbb` form for HTML.
pub fn to_hex(color: RGBColor) -> String {
    format!("#{:02x}{:02x}{:02x}", color.0, color.1, color.2)
}

// ---------------------------------------------------------------------------
// Color mapping: series name → RGBColor
// ---------------------------------------------------------------------------

/// Assigns each series (by region name) a distinct colour, in chart order.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, RGBColor>,
    order: Vec<String>,
    default_color: RGBColor,
}

impl ColorMap {
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut order: Vec<String> = Vec::new();
        for name in names {
            if !order.iter().any(|n| n == name) {
                order.push(name.to_string());
            }
        }
        let palette = generate_palette(order.len());
        let mapping = order.iter().cloned().zip(palette).collect();

        ColorMap {
            mapping,
            order,
            default_color: RGBColor(128, 128, 128),
        }
    }

    /// Look up the colour for a given series.
    pub fn color_for(&self, name: &str) -> RGBColor {
        self.mapping
            .get(name)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Legend entries (series name → colour) in chart order.
    pub fn legend_entries(&self) -> Vec<(String, RGBColor)> {
        self.order
            .iter()
            .map(|name| (name.clone(), self.color_for(name)))
            .collect()
    }
}
