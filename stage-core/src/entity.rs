//! Entities - the named, identified nodes of the scene tree.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::component::{Component, ComponentKind, ComponentType};

/// Unique identifier for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Create a new unique entity ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = uuid::Error;

    /// Accepts hyphenated UUIDs with or without braces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// A node in the scene tree.
///
/// Entities are owned by [`SceneTree`](crate::SceneTree); structural fields
/// are only changed through it so that change events stay accurate.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub(crate) id: EntityId,
    pub(crate) name: String,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
    pub(crate) components: Vec<Component>,
}

impl Entity {
    pub(crate) fn new(id: EntityId, name: impl Into<String>, parent: Option<EntityId>) -> Self {
        Self {
            id,
            name: name.into(),
            parent,
            children: Vec::new(),
            components: Vec::new(),
        }
    }

    /// Identifier.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Display name; not required to be unique.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent entity, `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Children in z and serialization order.
    #[must_use]
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    /// Attached components in attach order.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Whether a component of `kind` is attached.
    #[must_use]
    pub fn has_component(&self, kind: ComponentKind) -> bool {
        self.components.iter().any(|c| c.kind() == kind)
    }

    /// The attached component of type `T`.
    #[must_use]
    pub fn component<T: ComponentType>(&self) -> Option<&T> {
        self.components.iter().find_map(T::from_component)
    }

    pub(crate) fn component_mut<T: ComponentType>(&mut self) -> Option<&mut T> {
        self.components.iter_mut().find_map(T::from_component_mut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Text, Transform};

    #[test]
    fn test_entity_id_parse_and_display() {
        let id = EntityId::new();
        let parsed: EntityId = id.to_string().parse().expect("valid uuid");
        assert_eq!(parsed, id);
        let braced: EntityId = format!("{{{id}}}").parse().expect("braced uuid");
        assert_eq!(braced, id);
        assert!("not-a-uuid".parse::<EntityId>().is_err());
    }

    #[test]
    fn test_component_lookup_by_type() {
        let mut e = Entity::new(EntityId::new(), "Title", None);
        e.components.push(Component::from(Text::default()));
        assert!(e.component::<Text>().is_some());
        assert!(e.component::<Transform>().is_none());
        assert!(e.has_component(ComponentKind::Text));
    }
}
