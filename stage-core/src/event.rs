//! Direct-manipulation gestures applied to visual proxies.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::geometry::{Point, Size};

/// A gesture performed on one proxy.
///
/// Coordinates are in the parent proxy's local space, the same space the
/// proxy position lives in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gesture", content = "data")]
pub enum Manipulation {
    /// Drop the proxy at a new position.
    Move {
        /// New X position.
        x: f64,
        /// New Y position.
        y: f64,
    },

    /// Drag the proxy by an offset from where it is.
    Drag {
        /// Horizontal offset.
        delta_x: f64,
        /// Vertical offset.
        delta_y: f64,
    },

    /// Set the proxy rotation.
    Rotate {
        /// Rotation in degrees.
        degrees: f64,
    },

    /// Resize the proxy.
    Resize {
        /// New width.
        width: f64,
        /// New height.
        height: f64,
    },
}

impl Manipulation {
    /// Target position for positional gestures given the current one.
    #[must_use]
    pub fn target_position(&self, current: Point) -> Option<Point> {
        match self {
            Self::Move { x, y } => Some(Point::new(*x, *y)),
            Self::Drag { delta_x, delta_y } => {
                Some(current + Point::new(*delta_x, *delta_y))
            }
            Self::Rotate { .. } | Self::Resize { .. } => None,
        }
    }

    /// Target size for a resize gesture.
    #[must_use]
    pub fn target_size(&self) -> Option<Size> {
        match self {
            Self::Resize { width, height } => Some(Size::new(*width, *height)),
            _ => None,
        }
    }
}

/// A gesture addressed to an entity, as hosts deliver them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManipulationEvent {
    /// Target entity.
    pub entity: EntityId,
    /// The gesture.
    pub manipulation: Manipulation,
}
