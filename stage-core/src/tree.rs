//! Scene tree: entity storage, structure edits and change events.

use std::collections::{HashMap, VecDeque};

use crate::component::{Component, ComponentKind, ComponentType};
use crate::entity::{Entity, EntityId};
use crate::error::{StageError, StageResult};

/// A structural edit that completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureChange {
    /// A child was created under `parent`.
    ChildAdded {
        /// The parent.
        parent: EntityId,
        /// The new child.
        child: EntityId,
    },
    /// An entity moved to a different parent.
    Reparented {
        /// The moved entity.
        id: EntityId,
        /// Previous parent.
        old_parent: EntityId,
        /// New parent.
        new_parent: EntityId,
    },
    /// An entity moved among its siblings.
    Reordered {
        /// The parent whose child order changed.
        parent: EntityId,
        /// The moved entity.
        id: EntityId,
    },
    /// An entity was renamed.
    Renamed {
        /// The renamed entity.
        id: EntityId,
    },
    /// A subtree was removed.
    Removed {
        /// Removed entities, subtree root first.
        ids: Vec<EntityId>,
    },
}

/// Change notification queued by the tree and drained by its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    /// Tree structure or naming changed.
    Structure(StructureChange),
    /// A field of an attached component changed value.
    ComponentChanged {
        /// Owning entity.
        id: EntityId,
        /// Which component.
        kind: ComponentKind,
    },
    /// A component was attached.
    ComponentListChanged {
        /// Owning entity.
        id: EntityId,
        /// The attached kind.
        kind: ComponentKind,
    },
}

/// Strict tree of entities with an explicit event queue.
#[derive(Debug, Clone)]
pub struct SceneTree {
    entities: HashMap<EntityId, Entity>,
    root: EntityId,
    events: VecDeque<TreeEvent>,
}

impl SceneTree {
    /// Create a tree holding only a root named `root_name`.
    #[must_use]
    pub fn new(root_name: impl Into<String>) -> Self {
        Self::with_root(EntityId::new(), root_name)
    }

    /// Create a tree whose root has a known id.
    #[must_use]
    pub fn with_root(root: EntityId, root_name: impl Into<String>) -> Self {
        let mut entities = HashMap::new();
        entities.insert(root, Entity::new(root, root_name, None));
        Self {
            entities,
            root,
            events: VecDeque::new(),
        }
    }

    /// The root entity id.
    #[must_use]
    pub fn root(&self) -> EntityId {
        self.root
    }

    /// Look up an entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Whether `id` is in the tree.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of entities, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Always false: the root cannot be removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn entity_mut(&mut self, id: EntityId) -> StageResult<&mut Entity> {
        self.entities
            .get_mut(&id)
            .ok_or_else(|| StageError::EntityNotFound(id.to_string()))
    }

    /// Create a child with a fresh id, appended to `parent`'s children.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent is not found.
    pub fn add_child(&mut self, parent: EntityId, name: impl Into<String>) -> StageResult<EntityId> {
        self.insert_child(parent, EntityId::new(), name, None)
    }

    /// Create a child with a given id at `index` (appended when `None` or
    /// past the end).
    ///
    /// # Errors
    ///
    /// Returns an error if the parent is not found or `id` is already used.
    pub fn insert_child(
        &mut self,
        parent: EntityId,
        id: EntityId,
        name: impl Into<String>,
        index: Option<usize>,
    ) -> StageResult<EntityId> {
        if self.entities.contains_key(&id) {
            return Err(StageError::InvalidOperation(format!(
                "entity id {id} already exists"
            )));
        }
        let siblings = &mut self.entity_mut(parent)?.children;
        let at = index.map_or(siblings.len(), |i| i.min(siblings.len()));
        siblings.insert(at, id);
        self.entities.insert(id, Entity::new(id, name, Some(parent)));
        tracing::debug!("Added entity {} under {}", id, parent);
        self.events
            .push_back(TreeEvent::Structure(StructureChange::ChildAdded {
                parent,
                child: id,
            }));
        Ok(id)
    }

    /// Attach a default `T` unless one is already attached, and return it.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found.
    pub fn add_component<T: ComponentType>(&mut self, id: EntityId) -> StageResult<&T> {
        let entity = self.entity_mut(id)?;
        if !entity.has_component(T::KIND) {
            entity.components.push(T::default().into());
            self.events.push_back(TreeEvent::ComponentListChanged { id, kind: T::KIND });
        }
        self.entities
            .get(&id)
            .and_then(Entity::component::<T>)
            .ok_or_else(|| StageError::EntityNotFound(id.to_string()))
    }

    /// Attach `component`, or overwrite the fields of the attached component
    /// of the same kind. Returns whether it was newly attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found.
    pub fn attach(&mut self, id: EntityId, component: Component) -> StageResult<bool> {
        let kind = component.kind();
        let entity = self.entity_mut(id)?;
        if let Some(existing) = entity.components.iter_mut().find(|c| c.kind() == kind) {
            if *existing != component {
                *existing = component;
                self.events.push_back(TreeEvent::ComponentChanged { id, kind });
            }
            return Ok(false);
        }
        entity.components.push(component);
        self.events.push_back(TreeEvent::ComponentListChanged { id, kind });
        Ok(true)
    }

    /// The component of type `T` on `id`.
    #[must_use]
    pub fn component<T: ComponentType>(&self, id: EntityId) -> Option<&T> {
        self.entities.get(&id)?.component::<T>()
    }

    /// Edit the component of type `T` on `id`.
    ///
    /// A change event is queued only if the component's value differs after
    /// `edit` ran. Returns `None` when the entity or component is missing.
    pub fn update_component<T, R>(&mut self, id: EntityId, edit: impl FnOnce(&mut T) -> R) -> Option<R>
    where
        T: ComponentType,
    {
        let component = self.entities.get_mut(&id)?.component_mut::<T>()?;
        let before = component.clone();
        let result = edit(component);
        if *component != before {
            tracing::trace!("{} changed on {}", T::KIND, id);
            self.events
                .push_back(TreeEvent::ComponentChanged { id, kind: T::KIND });
        }
        Some(result)
    }

    /// Rename an entity; returns whether the name changed.
    pub fn rename(&mut self, id: EntityId, name: impl Into<String>) -> bool {
        let name = name.into();
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        if entity.name == name {
            return false;
        }
        entity.name = name;
        self.events
            .push_back(TreeEvent::Structure(StructureChange::Renamed { id }));
        true
    }

    /// Position of `id` among its siblings.
    #[must_use]
    pub fn index_in_parent(&self, id: EntityId) -> Option<usize> {
        let parent = self.entities.get(&id)?.parent?;
        self.entities
            .get(&parent)?
            .children
            .iter()
            .position(|c| *c == id)
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    #[must_use]
    pub fn is_self_or_ancestor(&self, ancestor: EntityId, id: EntityId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.entities.get(&current).and_then(|e| e.parent);
        }
        false
    }

    /// Move `id` under `new_parent`.
    ///
    /// For a same-parent move, `index` is the desired position before the
    /// entity is taken out: it is decremented when past the current index and
    /// clamped. `None` moves to the end. Returns `false` for unknown ids, the
    /// root, cycles and moves that change nothing.
    pub fn reparent(&mut self, id: EntityId, new_parent: EntityId, index: Option<usize>) -> bool {
        if id == self.root || id == new_parent || !self.contains(new_parent) {
            return false;
        }
        let Some(old_parent) = self.entities.get(&id).and_then(|e| e.parent) else {
            return false;
        };
        if self.is_self_or_ancestor(id, new_parent) {
            tracing::debug!("Rejected reparenting {} into its own subtree", id);
            return false;
        }

        if old_parent == new_parent {
            return self.reorder(id, old_parent, index);
        }

        if let Some(old) = self.entities.get_mut(&old_parent) {
            old.children.retain(|c| *c != id);
        }
        if let Some(parent) = self.entities.get_mut(&new_parent) {
            let at = index.map_or(parent.children.len(), |i| i.min(parent.children.len()));
            parent.children.insert(at, id);
        }
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.parent = Some(new_parent);
        }
        tracing::debug!("Reparented {} from {} to {}", id, old_parent, new_parent);
        self.events
            .push_back(TreeEvent::Structure(StructureChange::Reparented {
                id,
                old_parent,
                new_parent,
            }));
        true
    }

    fn reorder(&mut self, id: EntityId, parent: EntityId, index: Option<usize>) -> bool {
        let Some(siblings) = self.entities.get_mut(&parent).map(|p| &mut p.children) else {
            return false;
        };
        let Some(current) = siblings.iter().position(|c| *c == id) else {
            return false;
        };
        let last = siblings.len() - 1;
        let target = match index {
            None => last,
            Some(i) if i > current => (i - 1).min(last),
            Some(i) => i.min(last),
        };
        if target == current {
            return false;
        }
        siblings.remove(current);
        siblings.insert(target, id);
        self.events
            .push_back(TreeEvent::Structure(StructureChange::Reordered { parent, id }));
        true
    }

    /// Remove `id` and its whole subtree; returns the removed ids, subtree
    /// root first.
    ///
    /// # Errors
    ///
    /// Returns an error for the root or an unknown id.
    pub fn remove_subtree(&mut self, id: EntityId) -> StageResult<Vec<EntityId>> {
        if id == self.root {
            return Err(StageError::InvalidOperation(
                "the root entity cannot be removed".into(),
            ));
        }
        let parent = self
            .entities
            .get(&id)
            .ok_or_else(|| StageError::EntityNotFound(id.to_string()))?
            .parent;

        let ids = self.subtree(id);
        if let Some(parent) = parent.and_then(|p| self.entities.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }
        for removed in &ids {
            self.entities.remove(removed);
        }
        tracing::debug!("Removed {} entities rooted at {}", ids.len(), id);
        self.events
            .push_back(TreeEvent::Structure(StructureChange::Removed { ids: ids.clone() }));
        Ok(ids)
    }

    /// `id` and its descendants in pre-order.
    #[must_use]
    pub fn subtree(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(entity) = self.entities.get(&current) else {
                continue;
            };
            out.push(current);
            stack.extend(entity.children.iter().rev());
        }
        out
    }

    /// Every entity in pre-order, root first.
    #[must_use]
    pub fn pre_order(&self) -> Vec<EntityId> {
        self.subtree(self.root)
    }

    /// Take the oldest queued event.
    pub fn pop_event(&mut self) -> Option<TreeEvent> {
        self.events.pop_front()
    }

    /// Take all queued events.
    pub fn drain_events(&mut self) -> Vec<TreeEvent> {
        self.events.drain(..).collect()
    }

    /// Whether events are waiting.
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}
