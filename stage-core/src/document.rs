//! Scene document: the tree, its proxies and the sync between them.
//!
//! Every edit goes through the document so the tree's change events are
//! drained into the [`VisualLayer`] straight away. Layout itself is deferred:
//! edits only queue refreshes, and [`SceneDocument::run_pending`] runs them
//! top-down as one event-loop turn.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::{registry, Component, ComponentKind, ComponentType, Transform};
use crate::entity::{Entity, EntityId};
use crate::error::{StageError, StageResult};
use crate::event::{Manipulation, ManipulationEvent};
use crate::geometry::{Affine, Point, Rect, Size};
use crate::layout::{invert_position, scale_for_resize, LayoutPass};
use crate::paint::{Painter, PLACEHOLDER_COLOR};
use crate::resources::{DefaultResources, ResourceProvider};
use crate::schema::{IdPolicy, NodeDocument};
use crate::tree::{SceneTree, StructureChange, TreeEvent};
use crate::visual::{ProxySignal, SignalKind, SyncStats, VisualLayer, VisualProxy};

/// Default canvas width.
pub const DEFAULT_CANVAS_WIDTH: f64 = 1920.0;

/// Default canvas height.
pub const DEFAULT_CANVAS_HEIGHT: f64 = 1080.0;

/// Default undo depth.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Document settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Canvas rectangle; children of the root are laid out inside it.
    pub canvas: Rect,
    /// Name given to the root of new documents.
    pub root_name: String,
    /// Maximum number of undo steps kept.
    pub history_limit: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            canvas: Rect::new(0.0, 0.0, DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT),
            root_name: "Root".to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Resolved geometry of one entity, for reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityGeometry {
    /// Entity id.
    pub id: EntityId,
    /// Entity name.
    pub name: String,
    /// Parent id.
    pub parent: Option<EntityId>,
    /// Local rectangle.
    pub local_rect: Rect,
    /// Position in the parent's coordinates.
    pub position: Point,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Stacking order.
    pub z: usize,
    /// Local origin mapped to canvas coordinates.
    pub canvas_origin: Point,
}

/// A scene: root entity, one proxy per entity, and sync state.
pub struct SceneDocument {
    tree: SceneTree,
    visuals: VisualLayer,
    config: DocumentConfig,
    resources: Box<dyn ResourceProvider>,
}

impl std::fmt::Debug for SceneDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneDocument")
            .field("tree", &self.tree)
            .field("visuals", &self.visuals)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneDocument {
    /// An empty document with default settings and headless resources.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    /// An empty document with the given settings.
    #[must_use]
    pub fn with_config(config: DocumentConfig) -> Self {
        Self::with_resources(config, Box::new(DefaultResources::new()))
    }

    /// An empty document using a host-supplied resource provider.
    #[must_use]
    pub fn with_resources(config: DocumentConfig, resources: Box<dyn ResourceProvider>) -> Self {
        let tree = SceneTree::new(config.root_name.clone());
        let mut doc = Self {
            tree,
            visuals: VisualLayer::new(),
            config,
            resources,
        };
        doc.rebuild_visuals();
        doc
    }

    /// The entity tree.
    #[must_use]
    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    /// The root entity.
    #[must_use]
    pub fn root(&self) -> EntityId {
        self.tree.root()
    }

    /// Document settings.
    #[must_use]
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// The measurement capability.
    #[must_use]
    pub fn resources(&self) -> &dyn ResourceProvider {
        self.resources.as_ref()
    }

    /// The proxy side table.
    #[must_use]
    pub fn visuals(&self) -> &VisualLayer {
        &self.visuals
    }

    /// The proxy for `id`.
    #[must_use]
    pub fn proxy(&self, id: EntityId) -> Option<&VisualProxy> {
        self.visuals.get(id)
    }

    /// Sync counters.
    #[must_use]
    pub fn stats(&self) -> SyncStats {
        self.visuals.stats()
    }

    /// Number of entities, root included.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.tree.len()
    }

    /// Whether entities and proxies are in one-to-one correspondence.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.visuals.len() == self.tree.len()
            && self
                .tree
                .pre_order()
                .iter()
                .all(|id| self.visuals.contains(*id))
    }

    // ---------------------------------------------------------------------
    // Element creation and editing
    // ---------------------------------------------------------------------

    /// Create a child with a transform and a component of `kind`.
    ///
    /// `parent` defaults to the root. Text elements start with the content
    /// "Text"; buttons with the label "Button".
    ///
    /// # Errors
    ///
    /// Returns an error if the parent is not found.
    pub fn create_element(
        &mut self,
        kind: ComponentKind,
        name: &str,
        parent: Option<EntityId>,
    ) -> StageResult<EntityId> {
        let parent = parent.unwrap_or_else(|| self.tree.root());
        let id = self.tree.add_child(parent, name)?;
        self.tree.add_component::<Transform>(id)?;
        let mut component = Component::new(kind);
        if let Component::Text(text) = &mut component {
            text.set_text("Text");
        }
        self.tree.attach(id, component)?;
        self.sync();
        Ok(id)
    }

    /// Create an image element.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent is not found.
    pub fn create_image_element(&mut self, name: &str, parent: Option<EntityId>) -> StageResult<EntityId> {
        self.create_element(ComponentKind::Image, name, parent)
    }

    /// Create a text element.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent is not found.
    pub fn create_text_element(&mut self, name: &str, parent: Option<EntityId>) -> StageResult<EntityId> {
        self.create_element(ComponentKind::Text, name, parent)
    }

    /// Create a button element.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent is not found.
    pub fn create_button_element(&mut self, name: &str, parent: Option<EntityId>) -> StageResult<EntityId> {
        self.create_element(ComponentKind::Button, name, parent)
    }

    /// Remove an element, its subtree and their proxies.
    ///
    /// # Errors
    ///
    /// Returns an error for the root or an unknown id.
    pub fn delete_element(&mut self, id: EntityId) -> StageResult<Vec<EntityId>> {
        let removed = self.tree.remove_subtree(id)?;
        self.sync();
        Ok(removed)
    }

    /// Rename an entity; returns whether the name changed.
    pub fn rename(&mut self, id: EntityId, name: &str) -> bool {
        let changed = self.tree.rename(id, name);
        self.sync();
        changed
    }

    /// Move `id` under `new_parent`; see [`SceneTree::reparent`].
    pub fn reparent(&mut self, id: EntityId, new_parent: EntityId, index: Option<usize>) -> bool {
        let moved = self.tree.reparent(id, new_parent, index);
        self.sync();
        moved
    }

    /// Attach a default `T` unless one is attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found.
    pub fn add_component<T: ComponentType>(&mut self, id: EntityId) -> StageResult<()> {
        self.tree.add_component::<T>(id)?;
        self.sync();
        Ok(())
    }

    /// The component of type `T` on `id`.
    #[must_use]
    pub fn component<T: ComponentType>(&self, id: EntityId) -> Option<&T> {
        self.tree.component::<T>(id)
    }

    /// Edit a component; a refresh is queued only if a field changed.
    pub fn update_component<T, R>(&mut self, id: EntityId, edit: impl FnOnce(&mut T) -> R) -> Option<R>
    where
        T: ComponentType,
    {
        let result = self.tree.update_component::<T, R>(id, edit);
        self.sync();
        result
    }

    // ---------------------------------------------------------------------
    // JSON
    // ---------------------------------------------------------------------

    /// The whole tree as pretty-printed UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export_json(&self) -> StageResult<Vec<u8>> {
        self.root_node()?.to_pretty_json()
    }

    /// The whole tree as a node document.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is missing, which indicates a bug.
    pub fn root_node(&self) -> StageResult<NodeDocument> {
        self.node(self.tree.root())
    }

    /// `id` and its subtree as a node document.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found.
    pub fn node(&self, id: EntityId) -> StageResult<NodeDocument> {
        NodeDocument::from_tree(&self.tree, id)
            .ok_or_else(|| StageError::EntityNotFound(id.to_string()))
    }

    /// Replace the whole document with the tree in `bytes`.
    ///
    /// The new tree is built completely before it is swapped in, so on error
    /// the document is unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not JSON or not a node object.
    pub fn load_json(&mut self, bytes: &[u8]) -> StageResult<()> {
        let node = NodeDocument::from_slice(bytes)?;
        let root_id = node.parsed_id().unwrap_or_else(|| {
            tracing::warn!("Root id {:?} is not a UUID, assigning a fresh one", node.id);
            EntityId::new()
        });
        let mut tree = SceneTree::with_root(root_id, node.name.clone());
        attach_components(&mut tree, root_id, &node.components)?;
        for child in &node.children {
            build_subtree(&mut tree, root_id, child, None, IdPolicy::Preserve)?;
        }

        self.tree = tree;
        self.rebuild_visuals();
        tracing::info!("Loaded scene with {} entities", self.tree.len());
        Ok(())
    }

    /// Instantiate one node object under `parent` (root when `None`).
    ///
    /// # Errors
    ///
    /// Returns an error if `object` is not a node object or the parent is
    /// not found.
    pub fn create_element_from_json(
        &mut self,
        object: &Value,
        parent: Option<EntityId>,
        policy: IdPolicy,
    ) -> StageResult<EntityId> {
        let node = NodeDocument::from_value(object)?;
        self.instantiate(&node, parent, None, policy)
    }

    /// Instantiate a node document under `parent` at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent is not found.
    pub fn instantiate(
        &mut self,
        node: &NodeDocument,
        parent: Option<EntityId>,
        index: Option<usize>,
        policy: IdPolicy,
    ) -> StageResult<EntityId> {
        let parent = parent.unwrap_or_else(|| self.tree.root());
        if !self.tree.contains(parent) {
            return Err(StageError::EntityNotFound(parent.to_string()));
        }
        let id = build_subtree(&mut self.tree, parent, node, index, policy)?;
        self.sync();
        Ok(id)
    }

    // ---------------------------------------------------------------------
    // Sync
    // ---------------------------------------------------------------------

    fn ensure_proxy(&mut self, id: EntityId) {
        self.visuals.insert(id);
        if id == self.tree.root() {
            self.visuals.pin_to_canvas(id, self.config.canvas);
            return;
        }
        if let Err(e) = self.tree.add_component::<Transform>(id) {
            tracing::warn!("Cannot attach transform to {}: {}", id, e);
        }
        self.visuals.schedule(id);
    }

    fn rebuild_visuals(&mut self) {
        self.tree.drain_events();
        self.visuals.clear();
        let order = self.tree.pre_order();
        for id in &order {
            self.ensure_proxy(*id);
        }
        self.tree.drain_events();
        self.visuals.restack(&order);
    }

    /// Drain tree events into the visual layer.
    fn sync(&mut self) {
        let root = self.tree.root();
        let mut restack = false;
        while let Some(event) = self.tree.pop_event() {
            match event {
                TreeEvent::Structure(StructureChange::ChildAdded { child, .. }) => {
                    self.ensure_proxy(child);
                    restack = true;
                }
                TreeEvent::Structure(
                    StructureChange::Reparented { id, .. } | StructureChange::Reordered { id, .. },
                ) => {
                    self.visuals.schedule(id);
                    restack = true;
                }
                TreeEvent::Structure(StructureChange::Removed { ids }) => {
                    for id in ids {
                        self.visuals.remove(id);
                    }
                    restack = true;
                }
                TreeEvent::Structure(StructureChange::Renamed { .. }) => {}
                TreeEvent::ComponentChanged { id, .. } | TreeEvent::ComponentListChanged { id, .. } => {
                    if id != root {
                        self.visuals.schedule(id);
                    }
                }
            }
        }
        if restack {
            self.visuals.restack(&self.tree.pre_order());
        }
    }

    /// Whether refreshes are queued.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.visuals.has_pending()
    }

    /// Run one event-loop turn: refresh every queued proxy top-down, along
    /// with the descendants of each refreshed proxy. Returns the number of
    /// proxies refreshed.
    pub fn run_pending(&mut self) -> usize {
        self.sync();
        if !self.visuals.has_pending() {
            return 0;
        }
        let dirty: HashSet<EntityId> = self.visuals.take_pending().into_iter().collect();
        let root = self.tree.root();

        let mut refreshed = 0;
        let mut stack = vec![(root, false)];
        while let Some((id, ancestor_refreshed)) = stack.pop() {
            let refresh = id != root && (ancestor_refreshed || dirty.contains(&id));
            if refresh {
                self.refresh(id);
                refreshed += 1;
            }
            if let Some(entity) = self.tree.get(id) {
                stack.extend(entity.children().iter().rev().map(|c| (*c, refresh)));
            }
        }
        tracing::debug!("Refreshed {} proxies for {} scheduled", refreshed, dirty.len());
        refreshed
    }

    fn parent_rect(&self, id: EntityId) -> Rect {
        self.tree
            .get(id)
            .and_then(Entity::parent)
            .and_then(|p| self.visuals.get(p))
            .map_or(self.config.canvas, VisualProxy::local_rect)
    }

    fn refresh(&mut self, id: EntityId) {
        let parent = self.parent_rect(id);
        let Some(entity) = self.tree.get(id) else {
            return;
        };
        self.visuals.begin_refresh(id);

        let mut components: Vec<&Component> = entity.components().iter().collect();
        components.sort_by_key(|c| c.kind().update_order());

        let mut pass = LayoutPass::new(parent, self.resources.as_ref());
        for component in components {
            component.update(&mut pass);
        }
        let placement = pass.finish();
        self.visuals.apply_placement(id, &placement);
    }

    // ---------------------------------------------------------------------
    // Direct manipulation
    // ---------------------------------------------------------------------

    /// Drop a proxy at `position` (parent coordinates) and write the
    /// transform back. Returns whether the model changed.
    ///
    /// The root proxy stays pinned to the canvas and ignores gestures.
    pub fn move_proxy(&mut self, id: EntityId, position: Point) -> bool {
        let signal = self
            .gesture_target(id)
            .and_then(|p| p.set_position(position));
        self.deliver(signal)
    }

    /// Rotate a proxy and write the rotation back.
    pub fn rotate_proxy(&mut self, id: EntityId, degrees: f64) -> bool {
        let signal = self.gesture_target(id).and_then(|p| p.set_rotation(degrees));
        self.deliver(signal)
    }

    /// Resize a proxy and write the size override back on every axis that
    /// is not stretched.
    pub fn resize_proxy(&mut self, id: EntityId, size: Size) -> bool {
        let signal = self.gesture_target(id).and_then(|p| p.set_size(size));
        self.deliver(signal)
    }

    /// Apply a gesture to a proxy.
    pub fn apply_manipulation(&mut self, id: EntityId, manipulation: &Manipulation) -> bool {
        let Some(current) = self.gesture_target(id).map(|p| p.position()) else {
            return false;
        };
        if let Some(target) = manipulation.target_position(current) {
            return self.move_proxy(id, target);
        }
        if let Some(size) = manipulation.target_size() {
            return self.resize_proxy(id, size);
        }
        match manipulation {
            Manipulation::Rotate { degrees } => self.rotate_proxy(id, *degrees),
            Manipulation::Move { .. } | Manipulation::Drag { .. } | Manipulation::Resize { .. } => {
                false
            }
        }
    }

    /// Apply a gesture delivered by a host.
    pub fn apply_event(&mut self, event: &ManipulationEvent) -> bool {
        tracing::trace!("Gesture on {}: {:?}", event.entity, event.manipulation);
        self.apply_manipulation(event.entity, &event.manipulation)
    }

    /// Proxy a gesture may touch: any live proxy except the root's.
    fn gesture_target(&mut self, id: EntityId) -> Option<&mut VisualProxy> {
        if id == self.tree.root() {
            tracing::debug!("Ignoring gesture on the root proxy");
            return None;
        }
        self.visuals.get_mut(id)
    }

    fn deliver(&mut self, signal: Option<ProxySignal>) -> bool {
        let Some(signal) = signal.and_then(|s| self.visuals.route(s)) else {
            return false;
        };
        let id = signal.entity;
        if id == self.tree.root() {
            return false;
        }
        let Some(proxy) = self.visuals.get(id) else {
            return false;
        };
        let position = proxy.position();
        let rotation = proxy.rotation();
        let size = proxy.local_rect().size();
        let parent = self.parent_rect(id);

        let written = match signal.kind {
            SignalKind::Position => self.tree.update_component::<Transform, _>(id, |t| {
                let p = invert_position(t, position, size, parent);
                t.set_position(p)
            }),
            SignalKind::Rotation => self
                .tree
                .update_component::<Transform, _>(id, |t| t.set_rotation_degrees(rotation)),
            SignalKind::Size => self.tree.update_component::<Transform, _>(id, |t| {
                let scale = scale_for_resize(t, size);
                t.set_scale(scale)
            }),
        }
        .unwrap_or(false);

        if written {
            self.visuals.record_gesture_write();
        }
        self.sync();
        written
    }

    // ---------------------------------------------------------------------
    // Selection, hit testing, painting
    // ---------------------------------------------------------------------

    /// Select exactly one entity, or none.
    pub fn set_selected(&mut self, id: Option<EntityId>) {
        self.visuals.set_selected(id);
    }

    /// The selected entity.
    #[must_use]
    pub fn selected(&self) -> Option<EntityId> {
        self.visuals.selected()
    }

    /// Local-to-canvas transform of a proxy.
    #[must_use]
    pub fn canvas_transform(&self, id: EntityId) -> Option<Affine> {
        let mut transform = self.visuals.get(id)?.local_transform();
        let mut cursor = self.tree.get(id)?.parent();
        while let Some(parent) = cursor {
            if let Some(proxy) = self.visuals.get(parent) {
                transform = transform.then(&proxy.local_transform());
            }
            cursor = self.tree.get(parent).and_then(Entity::parent);
        }
        Some(transform)
    }

    /// The top-most entity whose proxy contains the canvas point `p`.
    #[must_use]
    pub fn hit_test(&self, p: Point) -> Option<EntityId> {
        let root = self.tree.root();
        self.visuals
            .iter()
            .filter(|proxy| proxy.entity() != root)
            .filter(|proxy| {
                self.canvas_transform(proxy.entity())
                    .is_some_and(|t| proxy.local_rect().contains(t.invert(p)))
            })
            .max_by_key(|proxy| proxy.z())
            .map(VisualProxy::entity)
    }

    /// Paint every non-root proxy in z order.
    pub fn paint(&self, painter: &mut dyn Painter) {
        let root = self.tree.root();
        for id in self.tree.pre_order() {
            if id == root {
                continue;
            }
            let (Some(entity), Some(proxy)) = (self.tree.get(id), self.visuals.get(id)) else {
                continue;
            };
            let Some(transform) = self.canvas_transform(id) else {
                continue;
            };
            painter.set_transform(transform);

            let rect = proxy.local_rect();
            let selected = proxy.is_selected();
            let mut drew = false;
            for component in entity.components() {
                drew |= component.paint(painter, rect, selected, self.resources.as_ref());
            }
            if !drew {
                painter.fill_rect(rect, PLACEHOLDER_COLOR, 0.0);
                if selected {
                    painter.stroke_selection(rect, 0.0);
                }
            }
        }
    }

    /// Resolved geometry of every non-root entity in pre-order.
    #[must_use]
    pub fn geometry_report(&self) -> Vec<EntityGeometry> {
        let root = self.tree.root();
        self.tree
            .pre_order()
            .into_iter()
            .filter(|id| *id != root)
            .filter_map(|id| {
                let entity = self.tree.get(id)?;
                let proxy = self.visuals.get(id)?;
                let transform = self.canvas_transform(id)?;
                Some(EntityGeometry {
                    id,
                    name: entity.name().to_string(),
                    parent: entity.parent(),
                    local_rect: proxy.local_rect(),
                    position: proxy.position(),
                    rotation: proxy.rotation(),
                    z: proxy.z(),
                    canvas_origin: transform.apply(Point::ZERO),
                })
            })
            .collect()
    }
}

/// Attach every recognised component object to `id`.
fn attach_components(
    tree: &mut SceneTree,
    id: EntityId,
    components: &[serde_json::Map<String, Value>],
) -> StageResult<()> {
    let registry = registry::global();
    for object in components {
        let kind = object.get("kind").and_then(Value::as_str).unwrap_or_default();
        let Some(mut component) = registry.create(kind) else {
            tracing::warn!("Skipping unknown component kind {:?} on {}", kind, id);
            continue;
        };
        component.read_json(object);
        tree.attach(id, component)?;
    }
    Ok(())
}

/// Build `node` and its subtree under `parent`.
fn build_subtree(
    tree: &mut SceneTree,
    parent: EntityId,
    node: &NodeDocument,
    index: Option<usize>,
    policy: IdPolicy,
) -> StageResult<EntityId> {
    let id = match policy {
        IdPolicy::Fresh => EntityId::new(),
        IdPolicy::Preserve => match node.parsed_id() {
            Some(id) if !tree.contains(id) => id,
            _ => {
                tracing::debug!("Assigning fresh id in place of {:?}", node.id);
                EntityId::new()
            }
        },
    };
    tree.insert_child(parent, id, node.name.clone(), index)?;
    attach_components(tree, id, &node.components)?;
    for child in &node.children {
        build_subtree(tree, id, child, None, policy)?;
    }
    Ok(id)
}
