//! Button component.

use serde_json::{Map, Value};

use super::text::effective_family;
use super::{fields, replace, DEFAULT_FONT_FAMILY, DEFAULT_PIXEL_SIZE};
use crate::color::Color;
use crate::geometry::{Rect, Size};
use crate::layout::LayoutPass;
use crate::paint::{
    nine_slice_patches, ImageSource, Insets, Painter, TextAlign, TextRun, BUTTON_RADIUS,
};
use crate::resources::ResourceProvider;

/// Horizontal padding added around the measured label.
pub const LABEL_PADDING_X: f64 = 40.0;

/// Vertical padding added around the measured label.
pub const LABEL_PADDING_Y: f64 = 20.0;

/// Default nine-slice inset on every side.
pub const DEFAULT_SLICE: i32 = 6;

/// A labelled button drawn with a nine-slice skin.
#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    text: String,
    background_color: Color,
    text_color: Color,
    font_family: String,
    pixel_size: i32,
    font_path: String,
    asset_path: String,
    image_path: String,
    slice_left: i32,
    slice_top: i32,
    slice_right: i32,
    slice_bottom: i32,
}

impl Default for Button {
    fn default() -> Self {
        Self {
            text: "Button".to_string(),
            background_color: Color::rgb(40, 40, 40),
            text_color: Color::WHITE,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            pixel_size: DEFAULT_PIXEL_SIZE,
            font_path: String::new(),
            asset_path: String::new(),
            image_path: String::new(),
            slice_left: DEFAULT_SLICE,
            slice_top: DEFAULT_SLICE,
            slice_right: DEFAULT_SLICE,
            slice_bottom: DEFAULT_SLICE,
        }
    }
}

impl Button {
    /// Label.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Set the label; returns whether it changed.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        replace(&mut self.text, text.into())
    }

    /// Fill colour of the generated skin.
    #[must_use]
    pub fn background_color(&self) -> Color {
        self.background_color
    }

    /// Set the skin colour; returns whether it changed.
    pub fn set_background_color(&mut self, color: Color) -> bool {
        replace(&mut self.background_color, color)
    }

    /// Label colour.
    #[must_use]
    pub fn text_color(&self) -> Color {
        self.text_color
    }

    /// Set the label colour; returns whether it changed.
    pub fn set_text_color(&mut self, color: Color) -> bool {
        replace(&mut self.text_color, color)
    }

    /// Label font family.
    #[must_use]
    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    /// Set the label font family; returns whether it changed.
    pub fn set_font_family(&mut self, family: impl Into<String>) -> bool {
        replace(&mut self.font_family, family.into())
    }

    /// Label pixel size.
    #[must_use]
    pub fn pixel_size(&self) -> i32 {
        self.pixel_size
    }

    /// Set the label pixel size; non-positive sizes fall back to the default.
    pub fn set_pixel_size(&mut self, pixel_size: i32) -> bool {
        let v = if pixel_size > 0 {
            pixel_size
        } else {
            DEFAULT_PIXEL_SIZE
        };
        replace(&mut self.pixel_size, v)
    }

    /// Label font file.
    #[must_use]
    pub fn font_path(&self) -> &str {
        &self.font_path
    }

    /// Set the label font file; returns whether it changed.
    pub fn set_font_path(&mut self, path: impl Into<String>) -> bool {
        replace(&mut self.font_path, path.into())
    }

    /// Project asset path.
    #[must_use]
    pub fn asset_path(&self) -> &str {
        &self.asset_path
    }

    /// Set the asset path; returns whether it changed.
    pub fn set_asset_path(&mut self, path: impl Into<String>) -> bool {
        replace(&mut self.asset_path, path.into())
    }

    /// Custom skin image; empty means the generated skin.
    #[must_use]
    pub fn image_path(&self) -> &str {
        &self.image_path
    }

    /// Set the custom skin; returns whether it changed.
    pub fn set_image_path(&mut self, path: impl Into<String>) -> bool {
        replace(&mut self.image_path, path.into())
    }

    /// Nine-slice insets as `[left, top, right, bottom]`.
    #[must_use]
    pub fn slices(&self) -> [i32; 4] {
        [
            self.slice_left,
            self.slice_top,
            self.slice_right,
            self.slice_bottom,
        ]
    }

    /// Set the left inset, clamped to zero.
    pub fn set_slice_left(&mut self, v: i32) -> bool {
        replace(&mut self.slice_left, v.max(0))
    }

    /// Set the top inset, clamped to zero.
    pub fn set_slice_top(&mut self, v: i32) -> bool {
        replace(&mut self.slice_top, v.max(0))
    }

    /// Set the right inset, clamped to zero.
    pub fn set_slice_right(&mut self, v: i32) -> bool {
        replace(&mut self.slice_right, v.max(0))
    }

    /// Set the bottom inset, clamped to zero.
    pub fn set_slice_bottom(&mut self, v: i32) -> bool {
        replace(&mut self.slice_bottom, v.max(0))
    }

    fn insets(&self) -> Insets {
        Insets {
            left: f64::from(self.slice_left),
            top: f64::from(self.slice_top),
            right: f64::from(self.slice_right),
            bottom: f64::from(self.slice_bottom),
        }
    }

    /// Size of the generated skin: large enough for the insets plus a
    /// stretchable middle.
    #[must_use]
    pub fn default_skin_size(&self) -> Size {
        let i = self.insets();
        Size::new(
            (i.left + i.right + 24.0).max(48.0),
            (i.top + i.bottom + 16.0).max(32.0),
        )
    }

    /// The skin to draw and its pixel size.
    #[must_use]
    pub fn skin(&self, resources: &dyn ResourceProvider) -> (ImageSource, Size) {
        if let Some(size) = resources.image_size(&self.image_path) {
            let source = ImageSource::File {
                path: self.image_path.clone(),
            };
            return (source, size);
        }
        let size = self.default_skin_size();
        let source = ImageSource::GeneratedSkin {
            background: self.background_color,
            size,
            radius: BUTTON_RADIUS,
        };
        (source, size)
    }

    pub(crate) fn update(&self, pass: &mut LayoutPass<'_>) {
        let family = effective_family(&self.font_family, &self.font_path, pass.resources);
        let label = pass
            .resources
            .measure_text(&self.text, &family, self.pixel_size);
        pass.rect = Rect::from_size(Size::new(
            label.width + LABEL_PADDING_X,
            label.height + LABEL_PADDING_Y,
        ));
    }

    pub(crate) fn paint(
        &self,
        painter: &mut dyn Painter,
        rect: Rect,
        selected: bool,
        resources: &dyn ResourceProvider,
    ) -> bool {
        let (skin, skin_size) = self.skin(resources);
        for patch in nine_slice_patches(rect, skin_size, self.insets()) {
            painter.draw_image(&skin, Some(patch.src), patch.dst, Color::WHITE);
        }

        let run = TextRun {
            text: self.text.clone(),
            family: effective_family(&self.font_family, &self.font_path, resources),
            pixel_size: self.pixel_size,
            color: self.text_color,
            align: TextAlign::CENTER,
        };
        painter.draw_text(rect, &run);

        if selected {
            painter.stroke_selection(rect, BUTTON_RADIUS);
        }
        true
    }

    pub(crate) fn write_json(&self, out: &mut Map<String, Value>) {
        out.insert("text".into(), Value::from(self.text.as_str()));
        out.insert(
            "backgroundColor".into(),
            Value::from(self.background_color.to_hex_argb()),
        );
        out.insert("textColor".into(), Value::from(self.text_color.to_hex_argb()));
        out.insert("fontFamily".into(), Value::from(self.font_family.as_str()));
        out.insert("pixelSize".into(), Value::from(self.pixel_size));
        out.insert("fontPath".into(), Value::from(self.font_path.as_str()));
        out.insert("assetPath".into(), Value::from(self.asset_path.as_str()));
        out.insert("imagePath".into(), Value::from(self.image_path.as_str()));
        out.insert("sliceLeft".into(), Value::from(self.slice_left));
        out.insert("sliceTop".into(), Value::from(self.slice_top));
        out.insert("sliceRight".into(), Value::from(self.slice_right));
        out.insert("sliceBottom".into(), Value::from(self.slice_bottom));
    }

    pub(crate) fn read_json(&mut self, object: &Map<String, Value>) {
        let d = Self::default();
        self.set_text(fields::string(object, "text", &d.text));
        self.set_background_color(fields::color(object, "backgroundColor", d.background_color));
        self.set_text_color(fields::color(object, "textColor", d.text_color));
        self.set_font_family(fields::string(object, "fontFamily", &d.font_family));
        self.set_pixel_size(fields::int32(object, "pixelSize", d.pixel_size));
        self.set_font_path(fields::string(object, "fontPath", ""));
        self.set_asset_path(fields::string(object, "assetPath", ""));
        self.set_image_path(fields::string(object, "imagePath", ""));
        self.set_slice_left(fields::int32(object, "sliceLeft", DEFAULT_SLICE));
        self.set_slice_top(fields::int32(object, "sliceTop", DEFAULT_SLICE));
        self.set_slice_right(fields::int32(object, "sliceRight", DEFAULT_SLICE));
        self.set_slice_bottom(fields::int32(object, "sliceBottom", DEFAULT_SLICE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{DisplayList, DrawCommand};
    use crate::resources::DefaultResources;
    use serde_json::json;

    #[test]
    fn test_update_pads_label() {
        let res = DefaultResources::new();
        let button = Button::default();
        let mut pass = LayoutPass::new(Rect::new(0.0, 0.0, 800.0, 600.0), &res);
        button.update(&mut pass);
        let label = res.measure_text("Button", "Inter", DEFAULT_PIXEL_SIZE);
        assert!((pass.rect.width - (label.width + 40.0)).abs() < f64::EPSILON);
        assert!((pass.rect.height - (label.height + 20.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_skin_size() {
        let mut button = Button::default();
        assert_eq!(button.default_skin_size(), Size::new(48.0, 32.0));
        button.set_slice_left(20);
        button.set_slice_right(20);
        assert_eq!(button.default_skin_size(), Size::new(64.0, 32.0));
    }

    #[test]
    fn test_slices_clamp_to_zero() {
        let mut button = Button::default();
        assert!(button.set_slice_top(-5));
        assert_eq!(button.slices(), [6, 0, 6, 6]);
        assert!(!button.set_slice_top(-1));
    }

    #[test]
    fn test_paint_generated_skin_then_label() {
        let res = DefaultResources::new();
        let button = Button::default();
        let mut list = DisplayList::new();
        assert!(button.paint(&mut list, Rect::new(0.0, 0.0, 120.0, 48.0), true, &res));
        // Nine patches, the label, the outline.
        assert_eq!(list.len(), 11);
        assert!(matches!(
            &list.commands[0],
            DrawCommand::Image { image: ImageSource::GeneratedSkin { .. }, .. }
        ));
        assert!(matches!(list.commands[9], DrawCommand::Text { .. }));
        assert!(matches!(
            list.commands[10],
            DrawCommand::Selection { radius, .. } if (radius - BUTTON_RADIUS).abs() < f64::EPSILON
        ));
    }

    #[test]
    fn test_custom_skin_used_when_resolvable() {
        let mut res = DefaultResources::new();
        res.register_image("skin.png", Size::new(30.0, 30.0));
        let mut button = Button::default();
        button.set_image_path("skin.png");
        let (source, size) = button.skin(&res);
        assert_eq!(source, ImageSource::File { path: "skin.png".into() });
        assert_eq!(size, Size::new(30.0, 30.0));
    }

    #[test]
    fn test_read_json_clamps_and_defaults() {
        let mut button = Button::default();
        if let Value::Object(map) = json!({ "sliceLeft": -3, "sliceTop": 2.0, "text": 5 }) {
            button.read_json(&map);
        }
        assert_eq!(button.slices(), [0, 2, 6, 6]);
        assert_eq!(button.text(), "Button");
        assert_eq!(button.background_color(), Color::rgb(40, 40, 40));
    }
}
