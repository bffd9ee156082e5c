//! Serialized form of scene nodes, shared by files, snapshots and the
//! clipboard.
//!
//! ```json
//! { "id": "<uuid>", "name": "Title",
//!   "components": [ { "kind": "Transform", "x": 100.0, ... } ],
//!   "children": [ ... ] }
//! ```
//!
//! Reading is tolerant: a node must be an object, but wrongly typed fields
//! fall back to defaults and malformed component entries are skipped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::EntityId;
use crate::error::{StageError, StageResult};
use crate::tree::SceneTree;

/// How ids found in a node document are treated when it is instantiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPolicy {
    /// Keep document ids; missing, invalid or already used ids get fresh ones.
    #[default]
    Preserve,
    /// Always assign fresh ids (paste, duplicate).
    Fresh,
}

/// One entity and its subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    /// Entity identifier as a UUID string.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Component objects, each with a `kind` field.
    #[serde(default)]
    pub components: Vec<Map<String, Value>>,
    /// Child nodes in order.
    #[serde(default)]
    pub children: Vec<NodeDocument>,
}

impl NodeDocument {
    /// Capture `id` and its subtree from a tree.
    #[must_use]
    pub fn from_tree(tree: &SceneTree, id: EntityId) -> Option<Self> {
        let entity = tree.get(id)?;
        Some(Self {
            id: entity.id().to_string(),
            name: entity.name().to_string(),
            components: entity.components().iter().map(|c| c.to_json()).collect(),
            children: entity
                .children()
                .iter()
                .filter_map(|child| Self::from_tree(tree, *child))
                .collect(),
        })
    }

    /// Read a node from parsed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if this value or any child is not an object.
    pub fn from_value(value: &Value) -> StageResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| StageError::InvalidDocument("node is not a JSON object".into()))?;

        let id = object
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let name = object
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let components = match object.get("components") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(map.clone()),
                    other => {
                        tracing::warn!("Skipping component entry that is not an object: {}", other);
                        None
                    }
                })
                .collect(),
            Some(other) => {
                tracing::warn!("Ignoring non-array components field on {:?}: {}", name, other);
                Vec::new()
            }
            None => Vec::new(),
        };

        let children = match object.get("children") {
            Some(Value::Array(items)) => items
                .iter()
                .map(Self::from_value)
                .collect::<StageResult<Vec<_>>>()?,
            Some(other) => {
                tracing::warn!("Ignoring non-array children field on {:?}: {}", name, other);
                Vec::new()
            }
            None => Vec::new(),
        };

        Ok(Self {
            id,
            name,
            components,
            children,
        })
    }

    /// Parse a node from UTF-8 JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not JSON or not a node object.
    pub fn from_slice(bytes: &[u8]) -> StageResult<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(&value)
    }

    /// Pretty-printed UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_pretty_json(&self) -> StageResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// The document id, if it is a valid UUID.
    #[must_use]
    pub fn parsed_id(&self) -> Option<EntityId> {
        self.id.parse().ok()
    }

    /// Number of nodes in this subtree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }
}
