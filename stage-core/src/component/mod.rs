//! Components: the data records attached to entities.
//!
//! The set of kinds is closed. Each kind contributes to layout through
//! [`Component::update`], to drawing through [`Component::paint`], and has a
//! tolerant JSON form where missing or malformed fields take defaults.

mod button;
mod image;
pub mod registry;
mod text;
mod transform;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::anchor::AnchorFlags;
use crate::color::Color;
use crate::geometry::Rect;
use crate::layout::LayoutPass;
use crate::paint::Painter;
use crate::resources::ResourceProvider;

pub use button::Button;
pub use self::image::Image;
pub use registry::{ComponentFactory, ComponentRegistry};
pub use text::Text;
pub use transform::Transform;

/// Default font family for text-bearing components.
pub const DEFAULT_FONT_FAMILY: &str = "Inter";

/// Default font pixel size for text-bearing components.
pub const DEFAULT_PIXEL_SIZE: i32 = 24;

/// Numbers at or beyond this magnitude are treated as corrupt on load.
pub const MAX_JSON_MAGNITUDE: f64 = 1e7;

/// Discriminator for the component kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Position, rotation, size override, anchors and stretch.
    Transform,
    /// A bitmap.
    Image,
    /// A run of text.
    Text,
    /// A labelled nine-slice button.
    Button,
}

impl ComponentKind {
    /// Every kind, in registry order.
    pub const ALL: [Self; 4] = [Self::Transform, Self::Image, Self::Text, Self::Button];

    /// Name used in JSON and by the registry.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Transform => "Transform",
            Self::Image => "Image",
            Self::Text => "Text",
            Self::Button => "Button",
        }
    }

    /// Look a kind up by its JSON name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Layout order; content kinds measure before the transform places.
    #[must_use]
    pub const fn update_order(self) -> i32 {
        match self {
            Self::Transform => 1,
            Self::Image | Self::Text | Self::Button => 0,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A component attached to an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    /// See [`Transform`].
    Transform(Transform),
    /// See [`Image`].
    Image(Image),
    /// See [`Text`].
    Text(Text),
    /// See [`Button`].
    Button(Button),
}

impl Component {
    /// A component of `kind` with default fields.
    #[must_use]
    pub fn new(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Transform => Self::Transform(Transform::default()),
            ComponentKind::Image => Self::Image(Image::default()),
            ComponentKind::Text => Self::Text(Text::default()),
            ComponentKind::Button => Self::Button(Button::default()),
        }
    }

    /// This component's kind.
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Transform(_) => ComponentKind::Transform,
            Self::Image(_) => ComponentKind::Image,
            Self::Text(_) => ComponentKind::Text,
            Self::Button(_) => ComponentKind::Button,
        }
    }

    /// Contribute to the layout pass.
    pub fn update(&self, pass: &mut LayoutPass<'_>) {
        match self {
            Self::Transform(c) => c.update(pass),
            Self::Image(c) => c.update(pass),
            Self::Text(c) => c.update(pass),
            Self::Button(c) => c.update(pass),
        }
    }

    /// Draw into `rect`; returns whether anything was drawn.
    pub fn paint(
        &self,
        painter: &mut dyn Painter,
        rect: Rect,
        selected: bool,
        resources: &dyn ResourceProvider,
    ) -> bool {
        match self {
            Self::Transform(_) => false,
            Self::Image(c) => c.paint(painter, rect, selected, resources),
            Self::Text(c) => c.paint(painter, rect, selected, resources),
            Self::Button(c) => c.paint(painter, rect, selected, resources),
        }
    }

    /// JSON object including the `kind` discriminator.
    #[must_use]
    pub fn to_json(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("kind".into(), Value::from(self.kind().name()));
        match self {
            Self::Transform(c) => c.write_json(&mut out),
            Self::Image(c) => c.write_json(&mut out),
            Self::Text(c) => c.write_json(&mut out),
            Self::Button(c) => c.write_json(&mut out),
        }
        out
    }

    /// Overwrite fields from a JSON object, using defaults for anything
    /// missing or malformed.
    pub fn read_json(&mut self, object: &Map<String, Value>) {
        match self {
            Self::Transform(c) => c.read_json(object),
            Self::Image(c) => c.read_json(object),
            Self::Text(c) => c.read_json(object),
            Self::Button(c) => c.read_json(object),
        }
    }
}

/// Typed access to one variant of [`Component`].
pub trait ComponentType: Clone + PartialEq + Default + Into<Component> {
    /// The variant's kind.
    const KIND: ComponentKind;

    /// Borrow the variant out of a component.
    fn from_component(component: &Component) -> Option<&Self>;

    /// Mutably borrow the variant out of a component.
    fn from_component_mut(component: &mut Component) -> Option<&mut Self>;
}

impl ComponentType for Transform {
    const KIND: ComponentKind = ComponentKind::Transform;

    fn from_component(component: &Component) -> Option<&Self> {
        match component {
            Component::Transform(c) => Some(c),
            _ => None,
        }
    }

    fn from_component_mut(component: &mut Component) -> Option<&mut Self> {
        match component {
            Component::Transform(c) => Some(c),
            _ => None,
        }
    }
}

impl ComponentType for Image {
    const KIND: ComponentKind = ComponentKind::Image;

    fn from_component(component: &Component) -> Option<&Self> {
        match component {
            Component::Image(c) => Some(c),
            _ => None,
        }
    }

    fn from_component_mut(component: &mut Component) -> Option<&mut Self> {
        match component {
            Component::Image(c) => Some(c),
            _ => None,
        }
    }
}

impl ComponentType for Text {
    const KIND: ComponentKind = ComponentKind::Text;

    fn from_component(component: &Component) -> Option<&Self> {
        match component {
            Component::Text(c) => Some(c),
            _ => None,
        }
    }

    fn from_component_mut(component: &mut Component) -> Option<&mut Self> {
        match component {
            Component::Text(c) => Some(c),
            _ => None,
        }
    }
}

impl ComponentType for Button {
    const KIND: ComponentKind = ComponentKind::Button;

    fn from_component(component: &Component) -> Option<&Self> {
        match component {
            Component::Button(c) => Some(c),
            _ => None,
        }
    }

    fn from_component_mut(component: &mut Component) -> Option<&mut Self> {
        match component {
            Component::Button(c) => Some(c),
            _ => None,
        }
    }
}

impl From<Transform> for Component {
    fn from(c: Transform) -> Self {
        Self::Transform(c)
    }
}

impl From<Image> for Component {
    fn from(c: Image) -> Self {
        Self::Image(c)
    }
}

impl From<Text> for Component {
    fn from(c: Text) -> Self {
        Self::Text(c)
    }
}

impl From<Button> for Component {
    fn from(c: Button) -> Self {
        Self::Button(c)
    }
}

/// Set `*slot` to `value` when different; returns whether it changed.
pub(crate) fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// Tolerant readers for component JSON fields.
pub(crate) mod fields {
    use serde_json::{Map, Value};

    use super::{AnchorFlags, Color, MAX_JSON_MAGNITUDE};

    /// A finite number below [`MAX_JSON_MAGNITUDE`], else `default`.
    pub fn number(object: &Map<String, Value>, key: &str, default: f64) -> f64 {
        match object.get(key).and_then(Value::as_f64) {
            Some(v) if v.is_finite() && v.abs() < MAX_JSON_MAGNITUDE => v,
            Some(v) => {
                tracing::warn!("Replacing out-of-range {} = {} with {}", key, v, default);
                default
            }
            None => default,
        }
    }

    /// An integer (integral floats accepted), else `default`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn int(object: &Map<String, Value>, key: &str, default: i64) -> i64 {
        let Some(value) = object.get(key) else {
            return default;
        };
        if let Some(v) = value.as_i64() {
            return v;
        }
        match value.as_f64() {
            Some(v) if v.fract().abs() < f64::EPSILON && v.abs() < MAX_JSON_MAGNITUDE => v as i64,
            _ => {
                tracing::warn!("Field {} is not an integer, using {}", key, default);
                default
            }
        }
    }

    /// An `i32` clamped into range, else `default`.
    pub fn int32(object: &Map<String, Value>, key: &str, default: i32) -> i32 {
        let v = int(object, key, i64::from(default));
        i32::try_from(v).unwrap_or(default)
    }

    /// A string, else `default`.
    pub fn string(object: &Map<String, Value>, key: &str, default: &str) -> String {
        object
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    /// A colour string, else `default`.
    pub fn color(object: &Map<String, Value>, key: &str, default: Color) -> Color {
        object
            .get(key)
            .and_then(Value::as_str)
            .map_or(default, |s| Color::parse_or(s, default))
    }

    /// Flag bits, unknown bits dropped, else `default`.
    pub fn flags(object: &Map<String, Value>, key: &str, default: AnchorFlags) -> AnchorFlags {
        if object.contains_key(key) {
            AnchorFlags::from_bits_lossy(int(object, key, default.to_json_bits()))
        } else {
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ComponentKind::ALL {
            assert_eq!(ComponentKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ComponentKind::from_name("Sprite"), None);
    }

    #[test]
    fn test_update_order_puts_transform_last() {
        assert!(ComponentKind::Transform.update_order() > ComponentKind::Text.update_order());
        assert_eq!(ComponentKind::Image.update_order(), ComponentKind::Button.update_order());
    }

    #[test]
    fn test_to_json_carries_kind() {
        let json = Component::new(ComponentKind::Text).to_json();
        assert_eq!(json.get("kind"), Some(&Value::from("Text")));
    }

    #[test]
    fn test_typed_access() {
        let mut c = Component::new(ComponentKind::Button);
        assert!(Button::from_component(&c).is_some());
        assert!(Text::from_component(&c).is_none());
        if let Some(b) = Button::from_component_mut(&mut c) {
            b.set_text("Go");
        }
        assert_eq!(Button::from_component(&c).map(Button::text), Some("Go"));
    }

    #[test]
    fn test_number_reader_sanitizes() {
        let obj = object(json!({ "a": 3.5, "b": 2e7, "c": "x" }));
        assert!((fields::number(&obj, "a", 0.0) - 3.5).abs() < f64::EPSILON);
        assert!(fields::number(&obj, "b", 0.0).abs() < f64::EPSILON);
        assert!((fields::number(&obj, "c", 1.0) - 1.0).abs() < f64::EPSILON);
        assert!((fields::number(&obj, "missing", 4.0) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_int_reader_accepts_integral_floats() {
        let obj = object(json!({ "a": 12.0, "b": 12.5, "c": true }));
        assert_eq!(fields::int(&obj, "a", 0), 12);
        assert_eq!(fields::int(&obj, "b", 7), 7);
        assert_eq!(fields::int(&obj, "c", 7), 7);
    }

    #[test]
    fn test_color_and_flag_readers() {
        let obj = object(json!({ "c": "#80FF0000", "bad": "nope", "f": 17 }));
        assert_eq!(fields::color(&obj, "c", Color::WHITE), Color::argb(128, 255, 0, 0));
        assert_eq!(fields::color(&obj, "bad", Color::WHITE), Color::WHITE);
        assert_eq!(
            fields::flags(&obj, "f", AnchorFlags::TOP_LEFT),
            AnchorFlags::LEFT | AnchorFlags::CENTER_X
        );
        assert_eq!(fields::flags(&obj, "g", AnchorFlags::TOP_LEFT), AnchorFlags::TOP_LEFT);
    }
}
