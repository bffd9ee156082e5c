//! Drawing capability, a recording painter and nine-slice geometry.
//!
//! Components describe what to draw through [`Painter`]; pixels are the
//! host's business. [`DisplayList`] records the calls so headless hosts and
//! tests can inspect them.

use serde::{Deserialize, Serialize};

use crate::anchor::AnchorFlags;
use crate::color::Color;
use crate::geometry::{Affine, Rect, Size};

/// Placeholder fill for entities without a drawing component.
pub const PLACEHOLDER_COLOR: Color = Color::rgb(80, 80, 80);

/// Selection outline colour.
pub const SELECTION_COLOR: Color = Color::rgb(0, 180, 255);

/// Selection outline width.
pub const SELECTION_WIDTH: f64 = 2.0;

/// Corner radius used by buttons and their selection outline.
pub const BUTTON_RADIUS: f64 = 6.0;

/// An image the painter should draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ImageSource {
    /// An image file on disk.
    File {
        /// Path to the file.
        path: String,
    },
    /// The generated default button skin: a rounded rectangle.
    GeneratedSkin {
        /// Fill colour.
        background: Color,
        /// Skin image size.
        size: Size,
        /// Corner radius.
        radius: f64,
    },
}

/// Horizontal text placement inside a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlign {
    /// Left.
    Start,
    /// Centre.
    Center,
    /// Right.
    End,
}

/// Vertical text placement inside a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlign {
    /// Top.
    Top,
    /// Middle.
    Middle,
    /// Bottom.
    Bottom,
}

/// Text alignment in both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAlign {
    /// Horizontal placement.
    pub horizontal: HorizontalAlign,
    /// Vertical placement.
    pub vertical: VerticalAlign,
}

impl TextAlign {
    /// Centred on both axes.
    pub const CENTER: Self = Self {
        horizontal: HorizontalAlign::Center,
        vertical: VerticalAlign::Middle,
    };

    /// Map alignment flags; RIGHT and BOTTOM take precedence over the centres.
    #[must_use]
    pub fn from_flags(flags: AnchorFlags) -> Self {
        let horizontal = if flags.contains(AnchorFlags::RIGHT) {
            HorizontalAlign::End
        } else if flags.contains(AnchorFlags::CENTER_X) {
            HorizontalAlign::Center
        } else {
            HorizontalAlign::Start
        };
        let vertical = if flags.contains(AnchorFlags::BOTTOM) {
            VerticalAlign::Bottom
        } else if flags.contains(AnchorFlags::CENTER_Y) {
            VerticalAlign::Middle
        } else {
            VerticalAlign::Top
        };
        Self {
            horizontal,
            vertical,
        }
    }
}

/// A run of text to draw, clipped to its rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Content.
    pub text: String,
    /// Font family.
    pub family: String,
    /// Font pixel size.
    pub pixel_size: i32,
    /// Text colour.
    pub color: Color,
    /// Placement inside the rectangle.
    pub align: TextAlign,
}

/// The opaque drawing capability.
///
/// All rectangles are in the local coordinates set by the last
/// [`set_transform`](Painter::set_transform).
pub trait Painter {
    /// Replace the local-to-canvas transform.
    fn set_transform(&mut self, transform: Affine);

    /// Fill a (possibly rounded) rectangle.
    fn fill_rect(&mut self, rect: Rect, color: Color, radius: f64);

    /// Draw `src` of an image (or the whole image when `None`) into `dst`.
    fn draw_image(&mut self, image: &ImageSource, src: Option<Rect>, dst: Rect, tint: Color);

    /// Draw a text run clipped to `rect`.
    fn draw_text(&mut self, rect: Rect, run: &TextRun);

    /// Draw the dashed selection outline.
    fn stroke_selection(&mut self, rect: Rect, radius: f64);
}

/// One recorded painter call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    /// `set_transform`.
    Transform {
        /// New transform.
        transform: Affine,
    },
    /// `fill_rect`.
    Fill {
        /// Target rectangle.
        rect: Rect,
        /// Fill colour.
        color: Color,
        /// Corner radius.
        radius: f64,
    },
    /// `draw_image`.
    Image {
        /// Image to draw.
        image: ImageSource,
        /// Source sub-rectangle.
        src: Option<Rect>,
        /// Destination rectangle.
        dst: Rect,
        /// Tint colour.
        tint: Color,
    },
    /// `draw_text`.
    Text {
        /// Clip rectangle.
        rect: Rect,
        /// Run to draw.
        run: TextRun,
    },
    /// `stroke_selection`.
    Selection {
        /// Outline rectangle.
        rect: Rect,
        /// Corner radius.
        radius: f64,
        /// Outline colour.
        color: Color,
        /// Outline width.
        width: f64,
    },
}

/// A painter that records every call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayList {
    /// Recorded commands in call order.
    pub commands: Vec<DrawCommand>,
}

impl DisplayList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn push(&mut self, command: DrawCommand) {
        tracing::trace!(?command, "draw");
        self.commands.push(command);
    }
}

impl Painter for DisplayList {
    fn set_transform(&mut self, transform: Affine) {
        self.push(DrawCommand::Transform { transform });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color, radius: f64) {
        self.push(DrawCommand::Fill {
            rect,
            color,
            radius,
        });
    }

    fn draw_image(&mut self, image: &ImageSource, src: Option<Rect>, dst: Rect, tint: Color) {
        self.push(DrawCommand::Image {
            image: image.clone(),
            src,
            dst,
            tint,
        });
    }

    fn draw_text(&mut self, rect: Rect, run: &TextRun) {
        self.push(DrawCommand::Text {
            rect,
            run: run.clone(),
        });
    }

    fn stroke_selection(&mut self, rect: Rect, radius: f64) {
        self.push(DrawCommand::Selection {
            rect,
            radius,
            color: SELECTION_COLOR,
            width: SELECTION_WIDTH,
        });
    }
}

/// Nine-slice border insets in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Insets {
    /// Left border.
    pub left: f64,
    /// Top border.
    pub top: f64,
    /// Right border.
    pub right: f64,
    /// Bottom border.
    pub bottom: f64,
}

impl Insets {
    /// Same inset on every side.
    #[must_use]
    pub const fn uniform(v: f64) -> Self {
        Self {
            left: v,
            top: v,
            right: v,
            bottom: v,
        }
    }
}

/// A source/destination rectangle pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// Region of the source image.
    pub src: Rect,
    /// Region of the destination.
    pub dst: Rect,
}

/// Split `dest` into nine-slice patches for an image of `image` size.
///
/// Returns nothing for an empty destination or image, a single stretched
/// patch when the source middle would be empty, and otherwise nine patches
/// in row-major order with destination corners limited to half the
/// destination size.
#[must_use]
pub fn nine_slice_patches(dest: Rect, image: Size, insets: Insets) -> Vec<Patch> {
    if dest.is_empty() || image.width <= 0.0 || image.height <= 0.0 {
        return Vec::new();
    }

    let Insets {
        left: l,
        top: t,
        right: r,
        bottom: b,
    } = insets;
    let mid_w = image.width - l - r;
    let mid_h = image.height - t - b;

    if mid_w <= 0.0 || mid_h <= 0.0 {
        return vec![Patch {
            src: Rect::from_size(image),
            dst: dest,
        }];
    }

    let dl = l.min(dest.width * 0.5);
    let dt = t.min(dest.height * 0.5);
    let dr = r.min(dest.width - dl);
    let db = b.min(dest.height - dt);
    let dw = (dest.width - dl - dr).max(0.0);
    let dh = (dest.height - dt - db).max(0.0);

    let src_cols = [(0.0, l), (l, mid_w), (l + mid_w, r)];
    let src_rows = [(0.0, t), (t, mid_h), (t + mid_h, b)];
    let dst_cols = [(dest.x, dl), (dest.x + dl, dw), (dest.x + dl + dw, dr)];
    let dst_rows = [(dest.y, dt), (dest.y + dt, dh), (dest.y + dt + dh, db)];

    let mut patches = Vec::with_capacity(9);
    for (&(sy, sh), &(dy, row_h)) in src_rows.iter().zip(&dst_rows) {
        for (&(sx, sw), &(dx, col_w)) in src_cols.iter().zip(&dst_cols) {
            patches.push(Patch {
                src: Rect::new(sx, sy, sw, sh),
                dst: Rect::new(dx, dy, col_w, row_h),
            });
        }
    }
    patches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nine_slice_row_major_layout() {
        let patches = nine_slice_patches(
            Rect::new(10.0, 20.0, 100.0, 40.0),
            Size::new(30.0, 30.0),
            Insets::uniform(6.0),
        );
        assert_eq!(patches.len(), 9);
        assert_eq!(patches[0].dst, Rect::new(10.0, 20.0, 6.0, 6.0));
        assert_eq!(patches[4].src, Rect::new(6.0, 6.0, 18.0, 18.0));
        assert_eq!(patches[4].dst, Rect::new(16.0, 26.0, 88.0, 28.0));
        assert_eq!(patches[8].dst, Rect::new(104.0, 54.0, 6.0, 6.0));
    }

    #[test]
    fn test_nine_slice_limits_corners_to_half_destination() {
        let patches = nine_slice_patches(
            Rect::new(0.0, 0.0, 10.0, 8.0),
            Size::new(40.0, 40.0),
            Insets::uniform(12.0),
        );
        assert_eq!(patches.len(), 9);
        // dl = min(12, 5) = 5, dr = min(12, 10 - 5) = 5, middle collapses.
        assert_eq!(patches[0].dst, Rect::new(0.0, 0.0, 5.0, 4.0));
        assert!(patches[4].dst.width.abs() < f64::EPSILON);
        assert!((patches[2].dst.x - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_nine_slice_stretches_when_middle_is_empty() {
        let dest = Rect::new(0.0, 0.0, 50.0, 50.0);
        let patches = nine_slice_patches(dest, Size::new(10.0, 10.0), Insets::uniform(6.0));
        assert_eq!(
            patches,
            vec![Patch {
                src: Rect::new(0.0, 0.0, 10.0, 10.0),
                dst: dest
            }]
        );
    }

    #[test]
    fn test_nine_slice_empty_destination() {
        let patches = nine_slice_patches(Rect::default(), Size::new(10.0, 10.0), Insets::default());
        assert!(patches.is_empty());
    }

    #[test]
    fn test_text_align_from_flags() {
        let align = TextAlign::from_flags(AnchorFlags::RIGHT | AnchorFlags::CENTER_Y);
        assert_eq!(align.horizontal, HorizontalAlign::End);
        assert_eq!(align.vertical, VerticalAlign::Middle);
        assert_eq!(
            TextAlign::from_flags(AnchorFlags::empty()),
            TextAlign {
                horizontal: HorizontalAlign::Start,
                vertical: VerticalAlign::Top
            }
        );
    }

    #[test]
    fn test_display_list_records_selection_style() {
        let mut list = DisplayList::new();
        list.stroke_selection(Rect::new(0.0, 0.0, 5.0, 5.0), BUTTON_RADIUS);
        assert_eq!(list.len(), 1);
        let json = serde_json::to_value(&list).expect("serialize");
        assert_eq!(json["commands"][0]["op"], "selection");
        assert_eq!(json["commands"][0]["color"], "#FF00B4FF");
    }
}
