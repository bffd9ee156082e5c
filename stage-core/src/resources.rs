//! Measurement capability used by component layout.
//!
//! Layout never touches fonts or image decoders directly. It asks a
//! [`ResourceProvider`] for text metrics, natural image sizes and the family
//! name inside a font file, so hosts with a real text stack can plug it in.

use std::collections::HashMap;

use crate::geometry::Size;

/// Text metrics and asset lookups needed by layout and paint.
pub trait ResourceProvider {
    /// Advance width and line height of `text` in the given font.
    fn measure_text(&self, text: &str, family: &str, pixel_size: i32) -> Size;

    /// Natural pixel size of the image at `path`, if it can be read.
    fn image_size(&self, path: &str) -> Option<Size>;

    /// Family name of the font file at `path`, if it can be registered.
    fn resolve_font_family(&self, path: &str) -> Option<String>;
}

/// Average glyph advance is `px * 3 / 5`.
const ADVANCE_NUM: f64 = 3.0;

/// Line height is `px * 6 / 5`, rounded up.
const LINE_NUM: f64 = 6.0;

const METRIC_DEN: f64 = 5.0;

/// Headless provider with approximate metrics.
///
/// Text is measured with a fixed average advance per character. Image sizes
/// come from registered entries first, then (with the `images` feature) from
/// the file header on disk. Fonts resolve only when registered.
#[derive(Debug, Clone, Default)]
pub struct DefaultResources {
    images: HashMap<String, Size>,
    fonts: HashMap<String, String>,
}

impl DefaultResources {
    /// Create a provider with no registered assets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the natural size of an image path.
    pub fn register_image(&mut self, path: impl Into<String>, size: Size) {
        self.images.insert(path.into(), size);
    }

    /// Register the family name contained in a font file.
    pub fn register_font(&mut self, path: impl Into<String>, family: impl Into<String>) {
        self.fonts.insert(path.into(), family.into());
    }

    #[cfg(feature = "images")]
    fn read_image_size(path: &str) -> Option<Size> {
        match image::image_dimensions(path) {
            Ok((w, h)) => Some(Size::new(f64::from(w), f64::from(h))),
            Err(e) => {
                tracing::debug!("Cannot read image size for {}: {}", path, e);
                None
            }
        }
    }

    #[cfg(not(feature = "images"))]
    fn read_image_size(_path: &str) -> Option<Size> {
        None
    }
}

impl ResourceProvider for DefaultResources {
    fn measure_text(&self, text: &str, _family: &str, pixel_size: i32) -> Size {
        let px = f64::from(pixel_size.max(1));
        #[allow(clippy::cast_precision_loss)]
        let glyphs = text.chars().count() as f64;
        Size::new(
            glyphs * px * ADVANCE_NUM / METRIC_DEN,
            (px * LINE_NUM / METRIC_DEN).ceil(),
        )
    }

    fn image_size(&self, path: &str) -> Option<Size> {
        if path.is_empty() {
            return None;
        }
        self.images
            .get(path)
            .copied()
            .or_else(|| Self::read_image_size(path))
    }

    fn resolve_font_family(&self, path: &str) -> Option<String> {
        self.fonts.get(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_text_scales_with_length() {
        let res = DefaultResources::new();
        let one = res.measure_text("A", "Inter", 20);
        let four = res.measure_text("ABCD", "Inter", 20);
        assert!((one.width - 12.0).abs() < f64::EPSILON);
        assert!((four.width - 48.0).abs() < f64::EPSILON);
        assert!((four.height - 24.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_text_keeps_line_height() {
        let size = DefaultResources::new().measure_text("", "Inter", 24);
        assert!(size.width.abs() < f64::EPSILON);
        assert!(size.height > 0.0);
    }

    #[test]
    fn test_registered_image_wins() {
        let mut res = DefaultResources::new();
        res.register_image("skin.png", Size::new(64.0, 32.0));
        assert_eq!(res.image_size("skin.png"), Some(Size::new(64.0, 32.0)));
        assert_eq!(res.image_size(""), None);
        assert_eq!(res.image_size("/definitely/missing.png"), None);
    }

    #[test]
    fn test_font_resolution_requires_registration() {
        let mut res = DefaultResources::new();
        assert_eq!(res.resolve_font_family("a.ttf"), None);
        res.register_font("a.ttf", "Roboto");
        assert_eq!(res.resolve_font_family("a.ttf").as_deref(), Some("Roboto"));
    }
}
