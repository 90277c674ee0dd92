use palette::{Hsl, IntoColor, Srgb};

/// An 8-bit sRGB colour, converted to each backend's colour type at draw time.
pub type Rgb = Srgb<u8>;

/// Colour used when a figure has a single unlabelled series (cornflower blue).
pub const DEFAULT_COLOR: Rgb = Srgb::new(100, 149, 237);

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            rgb.into_format()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_palette_size_and_distinct() {
        assert!(generate_palette(0).is_empty());
        let colors = generate_palette(7);
        assert_eq!(colors.len(), 7);
        let unique: BTreeSet<(u8, u8, u8)> = colors.iter().map(|c| (c.red, c.green, c.blue)).collect();
        assert_eq!(unique.len(), 7);
    }
}
