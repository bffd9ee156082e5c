//! Transform component.

use serde_json::{Map, Value};

use super::{fields, replace};
use crate::anchor::AnchorFlags;
use crate::geometry::{Point, Size};
use crate::layout::{resolve_placement, LayoutPass};

/// Placement of an entity inside its parent.
///
/// Every non-root entity has one; it is added automatically when the
/// entity's proxy is created.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    position: Point,
    rotation_degrees: f64,
    scale: Size,
    anchors: AnchorFlags,
    stretch: AnchorFlags,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            rotation_degrees: 0.0,
            scale: Size::new(0.0, 0.0),
            anchors: AnchorFlags::TOP_LEFT,
            stretch: AnchorFlags::empty(),
        }
    }
}

impl Transform {
    /// Offset from the anchored edges of the parent.
    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    /// Set the offset; returns whether it changed. Non-finite values are
    /// ignored.
    pub fn set_position(&mut self, position: Point) -> bool {
        if !position.is_finite() {
            tracing::warn!("Ignoring non-finite position {position:?}");
            return false;
        }
        replace(&mut self.position, position)
    }

    /// Rotation in degrees, clockwise on screen.
    #[must_use]
    pub fn rotation_degrees(&self) -> f64 {
        self.rotation_degrees
    }

    /// Set the rotation; returns whether it changed. Non-finite values are
    /// ignored.
    pub fn set_rotation_degrees(&mut self, degrees: f64) -> bool {
        if !degrees.is_finite() {
            tracing::warn!("Ignoring non-finite rotation {degrees}");
            return false;
        }
        replace(&mut self.rotation_degrees, degrees)
    }

    /// Per-axis size override. A positive value is the absolute target
    /// dimension on that axis; zero or less keeps the content size.
    #[must_use]
    pub fn scale(&self) -> Size {
        self.scale
    }

    /// Set the size override; returns whether it changed. Non-finite values
    /// are ignored.
    pub fn set_scale(&mut self, scale: Size) -> bool {
        if !scale.is_finite() {
            tracing::warn!("Ignoring non-finite size override {scale:?}");
            return false;
        }
        replace(&mut self.scale, scale)
    }

    /// Which parent edges the position is measured from.
    #[must_use]
    pub fn anchors(&self) -> AnchorFlags {
        self.anchors
    }

    /// Set the anchors, resolving conflicts toward the newly set bits.
    pub fn set_anchors(&mut self, anchors: AnchorFlags) -> bool {
        let sanitized = anchors.sanitize_against(self.anchors);
        replace(&mut self.anchors, sanitized)
    }

    /// Axes that fill the parent (LEFT|RIGHT, TOP|BOTTOM).
    #[must_use]
    pub fn stretch(&self) -> AnchorFlags {
        self.stretch
    }

    /// Set the stretch flags; returns whether they changed.
    pub fn set_stretch(&mut self, stretch: AnchorFlags) -> bool {
        replace(&mut self.stretch, stretch)
    }

    pub(crate) fn update(&self, pass: &mut LayoutPass<'_>) {
        let placement = resolve_placement(self, pass.rect.size(), pass.parent);
        pass.rect = placement.local_rect;
        pass.placement = Some(placement);
    }

    pub(crate) fn write_json(&self, out: &mut Map<String, Value>) {
        out.insert("x".into(), Value::from(self.position.x));
        out.insert("y".into(), Value::from(self.position.y));
        out.insert("rotationDegrees".into(), Value::from(self.rotation_degrees));
        out.insert("scaleX".into(), Value::from(self.scale.width));
        out.insert("scaleY".into(), Value::from(self.scale.height));
        out.insert("anchors".into(), Value::from(self.anchors.to_json_bits()));
        out.insert("stretch".into(), Value::from(self.stretch.to_json_bits()));
    }

    pub(crate) fn read_json(&mut self, object: &Map<String, Value>) {
        let d = Self::default();
        self.set_position(Point::new(
            fields::number(object, "x", d.position.x),
            fields::number(object, "y", d.position.y),
        ));
        self.set_rotation_degrees(fields::number(object, "rotationDegrees", d.rotation_degrees));
        self.set_scale(Size::new(
            fields::number(object, "scaleX", d.scale.width),
            fields::number(object, "scaleY", d.scale.height),
        ));
        // Loaded anchors replace rather than edit, so plain sanitize applies.
        self.anchors = fields::flags(object, "anchors", d.anchors).sanitize();
        self.set_stretch(fields::flags(object, "stretch", d.stretch));
    }
}
