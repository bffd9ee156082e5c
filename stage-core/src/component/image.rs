//! Image component.

use serde_json::{Map, Value};

use super::{fields, replace};
use crate::color::Color;
use crate::geometry::Rect;
use crate::layout::LayoutPass;
use crate::paint::{ImageSource, Painter};
use crate::resources::ResourceProvider;

/// A bitmap drawn at its natural size unless the transform overrides it.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    image_path: String,
    tint: Color,
    asset_path: String,
}

impl Default for Image {
    fn default() -> Self {
        Self {
            image_path: String::new(),
            tint: Color::WHITE,
            asset_path: String::new(),
        }
    }
}

impl Image {
    /// Source file path.
    #[must_use]
    pub fn image_path(&self) -> &str {
        &self.image_path
    }

    /// Set the source path; returns whether it changed.
    pub fn set_image_path(&mut self, path: impl Into<String>) -> bool {
        replace(&mut self.image_path, path.into())
    }

    /// Colour multiplied into the image.
    #[must_use]
    pub fn tint(&self) -> Color {
        self.tint
    }

    /// Set the tint; returns whether it changed.
    pub fn set_tint(&mut self, tint: Color) -> bool {
        replace(&mut self.tint, tint)
    }

    /// Project asset path this image was picked from.
    #[must_use]
    pub fn asset_path(&self) -> &str {
        &self.asset_path
    }

    /// Set the asset path; returns whether it changed.
    pub fn set_asset_path(&mut self, path: impl Into<String>) -> bool {
        replace(&mut self.asset_path, path.into())
    }

    pub(crate) fn update(&self, pass: &mut LayoutPass<'_>) {
        if let Some(size) = pass.resources.image_size(&self.image_path) {
            pass.rect = Rect::from_size(size);
        }
    }

    pub(crate) fn paint(
        &self,
        painter: &mut dyn Painter,
        rect: Rect,
        selected: bool,
        resources: &dyn ResourceProvider,
    ) -> bool {
        if resources.image_size(&self.image_path).is_none() {
            return false;
        }
        let source = ImageSource::File {
            path: self.image_path.clone(),
        };
        painter.draw_image(&source, None, rect, self.tint);
        if selected {
            painter.stroke_selection(rect, 0.0);
        }
        true
    }

    pub(crate) fn write_json(&self, out: &mut Map<String, Value>) {
        out.insert("imagePath".into(), Value::from(self.image_path.as_str()));
        out.insert("tint".into(), Value::from(self.tint.to_hex_argb()));
        out.insert("assetPath".into(), Value::from(self.asset_path.as_str()));
    }

    pub(crate) fn read_json(&mut self, object: &Map<String, Value>) {
        self.set_image_path(fields::string(object, "imagePath", ""));
        self.set_tint(fields::color(object, "tint", Color::WHITE));
        self.set_asset_path(fields::string(object, "assetPath", ""));
    }
}
