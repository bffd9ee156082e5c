//! Text component.

use serde_json::{Map, Value};

use super::{fields, replace, DEFAULT_FONT_FAMILY, DEFAULT_PIXEL_SIZE};
use crate::anchor::AnchorFlags;
use crate::color::Color;
use crate::geometry::Rect;
use crate::layout::LayoutPass;
use crate::paint::{Painter, TextAlign, TextRun};
use crate::resources::ResourceProvider;

/// A run of text sized to its measured extent.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    text: String,
    font_family: String,
    pixel_size: i32,
    color: Color,
    font_path: String,
    asset_path: String,
    alignment: AnchorFlags,
}

impl Default for Text {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            pixel_size: DEFAULT_PIXEL_SIZE,
            color: Color::WHITE,
            font_path: String::new(),
            asset_path: String::new(),
            alignment: AnchorFlags::TOP_LEFT,
        }
    }
}

impl Text {
    /// Content.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Set the content; returns whether it changed.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        replace(&mut self.text, text.into())
    }

    /// Font family name.
    #[must_use]
    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    /// Set the font family; returns whether it changed.
    pub fn set_font_family(&mut self, family: impl Into<String>) -> bool {
        replace(&mut self.font_family, family.into())
    }

    /// Font pixel size.
    #[must_use]
    pub fn pixel_size(&self) -> i32 {
        self.pixel_size
    }

    /// Set the pixel size; non-positive sizes fall back to the default.
    pub fn set_pixel_size(&mut self, pixel_size: i32) -> bool {
        let v = if pixel_size > 0 {
            pixel_size
        } else {
            DEFAULT_PIXEL_SIZE
        };
        replace(&mut self.pixel_size, v)
    }

    /// Text colour.
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Set the colour; returns whether it changed.
    pub fn set_color(&mut self, color: Color) -> bool {
        replace(&mut self.color, color)
    }

    /// Font file whose family overrides [`font_family`](Self::font_family)
    /// when it resolves.
    #[must_use]
    pub fn font_path(&self) -> &str {
        &self.font_path
    }

    /// Set the font file; returns whether it changed.
    pub fn set_font_path(&mut self, path: impl Into<String>) -> bool {
        replace(&mut self.font_path, path.into())
    }

    /// Project asset path this text was created from.
    #[must_use]
    pub fn asset_path(&self) -> &str {
        &self.asset_path
    }

    /// Set the asset path; returns whether it changed.
    pub fn set_asset_path(&mut self, path: impl Into<String>) -> bool {
        replace(&mut self.asset_path, path.into())
    }

    /// Placement of the text inside its rectangle.
    #[must_use]
    pub fn alignment(&self) -> AnchorFlags {
        self.alignment
    }

    /// Set the alignment, resolving conflicts toward the newly set bits.
    pub fn set_alignment(&mut self, alignment: AnchorFlags) -> bool {
        let sanitized = alignment.sanitize_against(self.alignment);
        replace(&mut self.alignment, sanitized)
    }

    /// The family actually used: the font file's family when it resolves.
    #[must_use]
    pub fn effective_family(&self, resources: &dyn ResourceProvider) -> String {
        effective_family(&self.font_family, &self.font_path, resources)
    }

    pub(crate) fn update(&self, pass: &mut LayoutPass<'_>) {
        let family = self.effective_family(pass.resources);
        let size = pass
            .resources
            .measure_text(&self.text, &family, self.pixel_size);
        pass.rect = Rect::from_size(size);
    }

    pub(crate) fn paint(
        &self,
        painter: &mut dyn Painter,
        rect: Rect,
        selected: bool,
        resources: &dyn ResourceProvider,
    ) -> bool {
        let run = TextRun {
            text: self.text.clone(),
            family: self.effective_family(resources),
            pixel_size: self.pixel_size,
            color: self.color,
            align: TextAlign::from_flags(self.alignment),
        };
        painter.draw_text(rect, &run);
        if selected {
            painter.stroke_selection(rect, 0.0);
        }
        true
    }

    pub(crate) fn write_json(&self, out: &mut Map<String, Value>) {
        out.insert("text".into(), Value::from(self.text.as_str()));
        out.insert("fontFamily".into(), Value::from(self.font_family.as_str()));
        out.insert("pixelSize".into(), Value::from(self.pixel_size));
        out.insert("color".into(), Value::from(self.color.to_hex_argb()));
        out.insert("fontPath".into(), Value::from(self.font_path.as_str()));
        out.insert("assetPath".into(), Value::from(self.asset_path.as_str()));
        out.insert("alignment".into(), Value::from(self.alignment.to_json_bits()));
    }

    pub(crate) fn read_json(&mut self, object: &Map<String, Value>) {
        let d = Self::default();
        self.set_text(fields::string(object, "text", &d.text));
        self.set_font_family(fields::string(object, "fontFamily", &d.font_family));
        self.set_pixel_size(fields::int32(object, "pixelSize", d.pixel_size));
        self.set_color(fields::color(object, "color", d.color));
        self.set_font_path(fields::string(object, "fontPath", ""));
        self.set_asset_path(fields::string(object, "assetPath", ""));
        self.alignment = fields::flags(object, "alignment", d.alignment).sanitize();
    }
}

/// Family from `font_path` when the provider resolves it, else `family`.
pub(crate) fn effective_family(
    family: &str,
    font_path: &str,
    resources: &dyn ResourceProvider,
) -> String {
    if font_path.is_empty() {
        return family.to_string();
    }
    resources
        .resolve_font_family(font_path)
        .unwrap_or_else(|| family.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{DisplayList, DrawCommand, HorizontalAlign};
    use crate::resources::DefaultResources;
    use serde_json::json;

    #[test]
    fn test_update_measures_content() {
        let res = DefaultResources::new();
        let mut text = Text::default();
        text.set_text("Hello");
        text.set_pixel_size(20);
        let mut pass = LayoutPass::new(Rect::new(0.0, 0.0, 800.0, 600.0), &res);
        text.update(&mut pass);
        assert_eq!(pass.rect.size(), res.measure_text("Hello", "Inter", 20));
    }

    #[test]
    fn test_font_path_overrides_family_when_resolved() {
        let mut res = DefaultResources::new();
        let mut text = Text::default();
        text.set_font_path("fonts/brand.ttf");
        assert_eq!(text.effective_family(&res), "Inter");
        res.register_font("fonts/brand.ttf", "Brand Sans");
        assert_eq!(text.effective_family(&res), "Brand Sans");
    }

    #[test]
    fn test_paint_maps_alignment() {
        let res = DefaultResources::new();
        let mut text = Text::default();
        text.set_alignment(AnchorFlags::RIGHT | AnchorFlags::TOP);
        let mut list = DisplayList::new();
        assert!(text.paint(&mut list, Rect::new(0.0, 0.0, 50.0, 20.0), false, &res));
        match &list.commands[0] {
            DrawCommand::Text { run, .. } => assert_eq!(run.align.horizontal, HorizontalAlign::End),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_pixel_size_falls_back() {
        let mut text = Text::default();
        text.set_pixel_size(30);
        assert!(text.set_pixel_size(-2));
        assert_eq!(text.pixel_size(), DEFAULT_PIXEL_SIZE);
    }

    #[test]
    fn test_read_json_defaults_and_values() {
        let mut text = Text::default();
        if let Value::Object(map) = json!({ "text": "Hi", "pixelSize": 32, "color": "oops", "alignment": 48 }) {
            text.read_json(&map);
        }
        assert_eq!(text.text(), "Hi");
        assert_eq!(text.pixel_size(), 32);
        assert_eq!(text.color(), Color::WHITE);
        assert_eq!(text.font_family(), "Inter");
        assert_eq!(text.alignment(), AnchorFlags::CENTER_X | AnchorFlags::CENTER_Y);
    }
}
