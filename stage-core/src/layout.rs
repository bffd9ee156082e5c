//! Anchor/stretch layout and its inverse.
//!
//! Layout runs per entity, parent first. Content components propose a size
//! into a [`LayoutPass`]; the [`Transform`] then resolves the final size and
//! the proxy position inside the parent rectangle.
//!
//! ```text
//! size:  content ─▶ positive scale overrides ─▶ stretch overrides ─▶ clamp
//! x:     stretched ? pos.x
//!        : RIGHT    ? parent.w - w - pos.x
//!        : CENTER_X ? (parent.w - w) / 2 + pos.x
//!        : pos.x
//! ```
//!
//! The vertical axis mirrors the horizontal one with TOP/BOTTOM/CENTER_Y.

use serde::{Deserialize, Serialize};

use crate::anchor::AnchorFlags;
use crate::component::Transform;
use crate::geometry::{Point, Rect, Size};
use crate::resources::ResourceProvider;

/// Candidate content size every refresh starts from.
pub const DEFAULT_CONTENT_SIZE: Size = Size::new(100.0, 50.0);

/// Smallest width or height a laid-out entity can have.
pub const MIN_EXTENT: f64 = 0.0001;

/// Resolved geometry of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Local rectangle, always at the origin.
    pub local_rect: Rect,
    /// Proxy position in the parent's local coordinates.
    pub position: Point,
    /// Rotation in degrees.
    pub rotation: f64,
}

/// Mutable state threaded through the components of one entity.
pub struct LayoutPass<'a> {
    /// Candidate local rectangle; content components replace it.
    pub rect: Rect,
    /// The parent's local rectangle.
    pub parent: Rect,
    /// Measurement capability.
    pub resources: &'a dyn ResourceProvider,
    /// Set by the transform.
    pub placement: Option<Placement>,
}

impl<'a> LayoutPass<'a> {
    /// Start a pass with the default candidate rectangle.
    #[must_use]
    pub fn new(parent: Rect, resources: &'a dyn ResourceProvider) -> Self {
        Self {
            rect: Rect::from_size(DEFAULT_CONTENT_SIZE),
            parent,
            resources,
            placement: None,
        }
    }

    /// The resolved placement, or the candidate rectangle at the parent's
    /// top-left when no transform ran.
    #[must_use]
    pub fn finish(self) -> Placement {
        self.placement.unwrap_or(Placement {
            local_rect: self.rect,
            position: self.parent.top_left(),
            rotation: 0.0,
        })
    }
}

/// Resolve the final size from the content size.
#[must_use]
pub fn resolve_size(transform: &Transform, content: Size, parent: Rect) -> Size {
    let scale = transform.scale();
    let stretch = transform.stretch();
    let pos = transform.position();

    let mut width = if scale.width > 0.0 { scale.width } else { content.width };
    let mut height = if scale.height > 0.0 { scale.height } else { content.height };

    if stretch.stretches_horizontally() {
        width = parent.width - pos.x * 2.0;
    }
    if stretch.stretches_vertically() {
        height = parent.height - pos.y * 2.0;
    }

    Size::new(width.max(MIN_EXTENT), height.max(MIN_EXTENT))
}

/// How one axis maps a position offset to a parent-relative coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisRule {
    Start,
    End,
    Center,
}

impl AxisRule {
    fn pick(stretched: bool, anchors: AnchorFlags, end: AnchorFlags, center: AnchorFlags) -> Self {
        if stretched {
            Self::Start
        } else if anchors.contains(end) {
            Self::End
        } else if anchors.contains(center) {
            Self::Center
        } else {
            Self::Start
        }
    }

    fn place(self, offset: f64, extent: f64, parent_extent: f64) -> f64 {
        match self {
            Self::Start => offset,
            Self::End => parent_extent - extent - offset,
            Self::Center => (parent_extent - extent) * 0.5 + offset,
        }
    }

    fn invert(self, local: f64, extent: f64, parent_extent: f64) -> f64 {
        match self {
            Self::Start => local,
            Self::End => parent_extent - extent - local,
            Self::Center => local - (parent_extent - extent) * 0.5,
        }
    }
}

fn axis_rules(transform: &Transform) -> (AxisRule, AxisRule) {
    let anchors = transform.anchors();
    let stretch = transform.stretch();
    (
        AxisRule::pick(
            stretch.stretches_horizontally(),
            anchors,
            AnchorFlags::RIGHT,
            AnchorFlags::CENTER_X,
        ),
        AxisRule::pick(
            stretch.stretches_vertically(),
            anchors,
            AnchorFlags::BOTTOM,
            AnchorFlags::CENTER_Y,
        ),
    )
}

/// Resolve size and position of an entity inside `parent`.
#[must_use]
pub fn resolve_placement(transform: &Transform, content: Size, parent: Rect) -> Placement {
    let size = resolve_size(transform, content, parent);
    let pos = transform.position();
    let (h, v) = axis_rules(transform);

    let x = h.place(pos.x, size.width, parent.width);
    let y = v.place(pos.y, size.height, parent.height);

    Placement {
        local_rect: Rect::from_size(size),
        position: parent.top_left() + Point::new(x, y),
        rotation: transform.rotation_degrees(),
    }
}

/// Recover the transform position that places a proxy of `size` at
/// `position` inside `parent`. Exact inverse of [`resolve_placement`].
#[must_use]
pub fn invert_position(transform: &Transform, position: Point, size: Size, parent: Rect) -> Point {
    let local = position - parent.top_left();
    let (h, v) = axis_rules(transform);
    Point::new(
        h.invert(local.x, size.width, parent.width),
        v.invert(local.y, size.height, parent.height),
    )
}

/// Size override to store after a resize gesture produced `size`.
///
/// Stretched axes keep their previous override since their size comes from
/// the parent.
#[must_use]
pub fn scale_for_resize(transform: &Transform, size: Size) -> Size {
    let stretch = transform.stretch();
    let previous = transform.scale();
    Size::new(
        if stretch.stretches_horizontally() {
            previous.width
        } else {
            size.width.max(MIN_EXTENT)
        },
        if stretch.stretches_vertically() {
            previous.height
        } else {
            size.height.max(MIN_EXTENT)
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PARENT: Rect = Rect::new(0.0, 0.0, 400.0, 300.0);

    fn transform(pos: Point, anchors: AnchorFlags, stretch: AnchorFlags) -> Transform {
        let mut t = Transform::default();
        t.set_position(pos);
        t.set_anchors(anchors);
        t.set_stretch(stretch);
        t
    }

    #[test]
    fn test_right_anchor() {
        let t = transform(Point::new(10.0, 10.0), AnchorFlags::RIGHT, AnchorFlags::empty());
        let p = resolve_placement(&t, Size::new(50.0, 20.0), PARENT);
        assert!((p.position.x - 340.0).abs() < f64::EPSILON);
        assert!((p.position.y - 10.0).abs() < f64::EPSILON);
        assert_eq!(p.local_rect, Rect::new(0.0, 0.0, 50.0, 20.0));
    }

    #[test]
    fn test_horizontal_stretch() {
        let t = transform(
            Point::new(20.0, 0.0),
            AnchorFlags::TOP_LEFT,
            AnchorFlags::LEFT | AnchorFlags::RIGHT,
        );
        let p = resolve_placement(&t, Size::new(50.0, 20.0), PARENT);
        assert!((p.local_rect.width - 360.0).abs() < f64::EPSILON);
        assert!((p.position.x - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stretched_axis_ignores_anchor() {
        let t = transform(
            Point::new(20.0, 0.0),
            AnchorFlags::RIGHT | AnchorFlags::TOP,
            AnchorFlags::LEFT | AnchorFlags::RIGHT,
        );
        let p = resolve_placement(&t, Size::new(50.0, 20.0), PARENT);
        assert!((p.position.x - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_centre_anchor_and_parent_offset() {
        let t = transform(
            Point::new(5.0, -5.0),
            AnchorFlags::CENTER_X | AnchorFlags::CENTER_Y,
            AnchorFlags::empty(),
        );
        let parent = Rect::new(100.0, 50.0, 200.0, 100.0);
        let p = resolve_placement(&t, Size::new(40.0, 20.0), parent);
        assert!((p.position.x - 185.0).abs() < f64::EPSILON);
        assert!((p.position.y - 85.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scale_overrides_and_stretch_wins() {
        let mut t = transform(
            Point::new(10.0, 10.0),
            AnchorFlags::TOP_LEFT,
            AnchorFlags::TOP | AnchorFlags::BOTTOM,
        );
        t.set_scale(Size::new(80.0, 999.0));
        let size = resolve_size(&t, Size::new(50.0, 20.0), PARENT);
        assert!((size.width - 80.0).abs() < f64::EPSILON);
        assert!((size.height - 280.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_size_is_clamped() {
        let t = transform(
            Point::new(300.0, 0.0),
            AnchorFlags::TOP_LEFT,
            AnchorFlags::LEFT | AnchorFlags::RIGHT,
        );
        let size = resolve_size(&t, Size::new(0.0, 0.0), PARENT);
        assert!((size.width - MIN_EXTENT).abs() < f64::EPSILON);
        assert!((size.height - MIN_EXTENT).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resize_keeps_stretched_override() {
        let mut t = transform(Point::ZERO, AnchorFlags::TOP_LEFT, AnchorFlags::LEFT | AnchorFlags::RIGHT);
        t.set_scale(Size::new(7.0, 0.0));
        let s = scale_for_resize(&t, Size::new(300.0, 40.0));
        assert!((s.width - 7.0).abs() < f64::EPSILON);
        assert!((s.height - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pass_without_transform_uses_candidate() {
        let res = crate::resources::DefaultResources::new();
        let pass = LayoutPass::new(Rect::new(3.0, 4.0, 10.0, 10.0), &res);
        let p = pass.finish();
        assert_eq!(p.local_rect.size(), DEFAULT_CONTENT_SIZE);
        assert_eq!(p.position, Point::new(3.0, 4.0));
    }

    fn anchors_strategy() -> impl Strategy<Value = AnchorFlags> {
        (0u32..64).prop_map(AnchorFlags::from_bits_truncate)
    }

    proptest! {
        #[test]
        fn prop_inverse_recovers_position(
            x in -500.0f64..500.0,
            y in -500.0f64..500.0,
            w in 1.0f64..300.0,
            h in 1.0f64..300.0,
            anchors in anchors_strategy(),
            stretch in anchors_strategy(),
        ) {
            let t = transform(Point::new(x, y), anchors, stretch);
            let parent = Rect::new(13.0, -7.0, 640.0, 480.0);
            let placed = resolve_placement(&t, Size::new(w, h), parent);
            let back = invert_position(&t, placed.position, placed.local_rect.size(), parent);
            prop_assert!((back.x - x).abs() < 1e-6);
            prop_assert!((back.y - y).abs() < 1e-6);
        }
    }
}
