//! # Stage Core
//!
//! Scene model and layout engine for a visual UI layout editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  SceneDocument                   │
//! ├────────────────────────┬─────────────────────────┤
//! │  SceneTree             │  VisualLayer            │
//! │  - Entities (by id)    │  - One proxy per entity │
//! │  - Components          │  - Coalesced refresh    │
//! │  - Change events  ───▶ │  - Feedback guard       │
//! ├────────────────────────┴─────────────────────────┤
//! │  Layout: content size ─▶ Transform ─▶ Placement  │
//! ├──────────────────────────────────────────────────┤
//! │  Editor: clipboard, snapshot history, persist    │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Edits go to the tree; the document drains its events, schedules proxy
//! refreshes and runs them in [`SceneDocument::run_pending`]. Gestures on a
//! proxy flow back into the entity's [`Transform`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod anchor;
pub mod color;
pub mod component;
pub mod document;
pub mod editor;
pub mod entity;
pub mod error;
pub mod event;
pub mod geometry;
pub mod history;
pub mod layout;
pub mod paint;
pub mod persist;
pub mod resources;
pub mod schema;
pub mod tree;
pub mod visual;

pub use anchor::AnchorFlags;
pub use color::Color;
pub use component::{
    Button, Component, ComponentKind, ComponentRegistry, ComponentType, Image, Text, Transform,
};
pub use document::{DocumentConfig, EntityGeometry, SceneDocument};
pub use editor::{ClipboardPayload, Editor, ENTITY_MIME};
pub use entity::{Entity, EntityId};
pub use error::{StageError, StageResult};
pub use event::{Manipulation, ManipulationEvent};
pub use geometry::{Affine, Point, Rect, Size};
pub use history::{History, Snapshot};
pub use layout::Placement;
pub use paint::{DisplayList, DrawCommand, Painter};
pub use resources::{DefaultResources, ResourceProvider};
pub use schema::{IdPolicy, NodeDocument};
pub use tree::{SceneTree, StructureChange, TreeEvent};
pub use visual::{SyncStats, VisualLayer, VisualProxy};

/// Stage core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
