//! Plain 2D geometry in canvas units.

use serde::{Deserialize, Serialize};

/// A point or offset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.width.is_finite() && self.height.is_finite()
    }
}

/// An axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Create a rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle at the origin with the given size.
    #[must_use]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Top-left corner.
    #[must_use]
    pub const fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Width and height.
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether the rectangle has no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Whether `p` lies inside the rectangle (edges inclusive).
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// Rotation followed by translation, the only transforms proxies carry.
///
/// Maps a point `p` to `R(p) + t`, where `R` rotates clockwise on screen by
/// the stored angle (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    /// Cosine of the rotation.
    pub cos: f64,
    /// Sine of the rotation.
    pub sin: f64,
    /// Translation applied after rotation.
    pub translation: Point,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        cos: 1.0,
        sin: 0.0,
        translation: Point::ZERO,
    };

    /// Rotate by `degrees` about the origin, then translate to `origin`.
    #[must_use]
    pub fn placement(origin: Point, degrees: f64) -> Self {
        let radians = degrees.to_radians();
        Self {
            cos: radians.cos(),
            sin: radians.sin(),
            translation: origin,
        }
    }

    /// Map a point through the transform.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.cos * p.x - self.sin * p.y + self.translation.x,
            self.sin * p.x + self.cos * p.y + self.translation.y,
        )
    }

    /// Map a point back through the transform.
    #[must_use]
    pub fn invert(&self, p: Point) -> Point {
        let d = p - self.translation;
        Point::new(self.cos * d.x + self.sin * d.y, -self.sin * d.x + self.cos * d.y)
    }

    /// Composition that applies `self` first and `outer` second.
    #[must_use]
    pub fn then(&self, outer: &Self) -> Self {
        Self {
            cos: outer.cos * self.cos - outer.sin * self.sin,
            sin: outer.sin * self.cos + outer.cos * self.sin,
            translation: outer.apply(self.translation),
        }
    }

    /// Rotation angle in degrees.
    #[must_use]
    pub fn rotation_degrees(&self) -> f64 {
        self.sin.atan2(self.cos).to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
    }

    #[test]
    fn test_rect_contains_edges() {
        let r = Rect::new(10.0, 10.0, 20.0, 5.0);
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(30.0, 15.0)));
        assert!(!r.contains(Point::new(30.1, 12.0)));
    }

    #[test]
    fn test_affine_rotates_clockwise_on_screen() {
        let a = Affine::placement(Point::ZERO, 90.0);
        assert!(approx(a.apply(Point::new(1.0, 0.0)), Point::new(0.0, 1.0)));
    }

    #[test]
    fn test_affine_invert_round_trips() {
        let a = Affine::placement(Point::new(40.0, -7.0), 33.0);
        let p = Point::new(12.5, 3.25);
        assert!(approx(a.invert(a.apply(p)), p));
    }

    #[test]
    fn test_affine_then_composes_child_into_parent() {
        let parent = Affine::placement(Point::new(100.0, 0.0), 90.0);
        let child = Affine::placement(Point::new(10.0, 0.0), 0.0);
        let world = child.then(&parent);
        // Child origin sits 10 units along the parent's rotated x axis.
        assert!(approx(world.apply(Point::ZERO), Point::new(100.0, 10.0)));
        assert!((world.rotation_degrees() - 90.0).abs() < 1e-6);
    }
}
