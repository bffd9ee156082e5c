//! Editing session: a document with undo history and a clipboard.
//!
//! Paste, cut, duplicate and delete are recorded as undo steps. Property
//! edits made through [`Editor::document_mut`] are not.

use serde::{Deserialize, Serialize};

use crate::document::SceneDocument;
use crate::entity::EntityId;
use crate::error::{StageError, StageResult};
use crate::history::{History, Snapshot};
use crate::schema::{IdPolicy, NodeDocument};

/// MIME type of entity clipboard and drag payloads.
pub const ENTITY_MIME: &str = "application/x-stage-entity";

/// A copied entity subtree, as placed on the clipboard or dragged in the
/// hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardPayload {
    /// Always [`ENTITY_MIME`].
    pub mime: String,
    /// The entity the payload was taken from.
    pub source_id: EntityId,
    /// The serialized subtree.
    pub node: NodeDocument,
}

impl ClipboardPayload {
    /// Capture `id` and its subtree.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found.
    pub fn capture(document: &SceneDocument, id: EntityId) -> StageResult<Self> {
        Ok(Self {
            mime: ENTITY_MIME.to_string(),
            source_id: id,
            node: document.node(id)?,
        })
    }

    /// JSON encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> StageResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a payload, rejecting foreign MIME types.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or a foreign MIME type.
    pub fn from_bytes(bytes: &[u8]) -> StageResult<Self> {
        let payload: Self = serde_json::from_slice(bytes)?;
        if payload.mime != ENTITY_MIME {
            return Err(StageError::InvalidDocument(format!(
                "unexpected payload type {:?}",
                payload.mime
            )));
        }
        Ok(payload)
    }
}

/// A document plus undo history and clipboard.
#[derive(Debug)]
pub struct Editor {
    document: SceneDocument,
    history: History,
    clipboard: Option<ClipboardPayload>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(SceneDocument::new())
    }
}

impl Editor {
    /// Wrap a document; the history depth comes from its configuration.
    #[must_use]
    pub fn new(document: SceneDocument) -> Self {
        let history = History::new(document.config().history_limit);
        Self {
            document,
            history,
            clipboard: None,
        }
    }

    /// The document.
    #[must_use]
    pub fn document(&self) -> &SceneDocument {
        &self.document
    }

    /// The document, for edits that are not recorded.
    pub fn document_mut(&mut self) -> &mut SceneDocument {
        &mut self.document
    }

    /// The undo history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The clipboard contents.
    #[must_use]
    pub fn clipboard(&self) -> Option<&ClipboardPayload> {
        self.clipboard.as_ref()
    }

    /// Copy `id` and its subtree to the clipboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found.
    pub fn copy(&mut self, id: EntityId) -> StageResult<()> {
        self.clipboard = Some(ClipboardPayload::capture(&self.document, id)?);
        Ok(())
    }

    /// Copy `id` to the clipboard, then delete it.
    ///
    /// # Errors
    ///
    /// Returns an error for the root or an unknown id; the clipboard is left
    /// unchanged in that case.
    pub fn cut(&mut self, id: EntityId) -> StageResult<()> {
        if id == self.document.root() {
            return Err(StageError::InvalidOperation(
                "the root entity cannot be cut".into(),
            ));
        }
        let payload = ClipboardPayload::capture(&self.document, id)?;
        self.record("Cut", |doc| doc.delete_element(id))?;
        self.clipboard = Some(payload);
        Ok(())
    }

    /// Instantiate the clipboard under `parent` (root when `None`) with
    /// fresh ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipboard is empty or the parent is not found.
    pub fn paste(&mut self, parent: Option<EntityId>) -> StageResult<EntityId> {
        let node = self
            .clipboard
            .as_ref()
            .map(|payload| payload.node.clone())
            .ok_or_else(|| StageError::InvalidOperation("the clipboard is empty".into()))?;
        self.record("Paste", |doc| doc.instantiate(&node, parent, None, IdPolicy::Fresh))
    }

    /// Copy `id` with fresh ids and insert it right after the source.
    ///
    /// # Errors
    ///
    /// Returns an error for the root or an unknown id.
    pub fn duplicate(&mut self, id: EntityId) -> StageResult<EntityId> {
        let tree = self.document.tree();
        let parent = tree
            .get(id)
            .ok_or_else(|| StageError::EntityNotFound(id.to_string()))?
            .parent()
            .ok_or_else(|| StageError::InvalidOperation("the root entity cannot be duplicated".into()))?;
        let index = tree.index_in_parent(id).map(|i| i + 1);
        let node = self.document.node(id)?;
        self.record("Duplicate", |doc| {
            doc.instantiate(&node, Some(parent), index, IdPolicy::Fresh)
        })
    }

    /// Delete `id` and its subtree.
    ///
    /// # Errors
    ///
    /// Returns an error for the root or an unknown id.
    pub fn delete(&mut self, id: EntityId) -> StageResult<Vec<EntityId>> {
        self.record("Delete", |doc| doc.delete_element(id))
    }

    /// Revert the last recorded action.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot fails to load.
    pub fn undo(&mut self) -> StageResult<bool> {
        self.history.undo(&mut self.document)
    }

    /// Re-apply the last reverted action.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot fails to load.
    pub fn redo(&mut self) -> StageResult<bool> {
        self.history.redo(&mut self.document)
    }

    /// Handle a hierarchy drop: move the payload's source entity under
    /// `target` at `index` (end when `None`). Returns whether it moved.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be decoded.
    pub fn drop_payload(
        &mut self,
        bytes: &[u8],
        target: EntityId,
        index: Option<usize>,
    ) -> StageResult<bool> {
        let payload = ClipboardPayload::from_bytes(bytes)?;
        Ok(self.document.reparent(payload.source_id, target, index))
    }

    fn record<T>(
        &mut self,
        label: &str,
        action: impl FnOnce(&mut SceneDocument) -> StageResult<T>,
    ) -> StageResult<T> {
        let before = self.document.export_json()?;
        let result = action(&mut self.document)?;
        let after = self.document.export_json()?;
        self.history.record(Snapshot {
            label: label.to_string(),
            before,
            after,
        });
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Text;

    fn editor_with_two() -> (Editor, EntityId, EntityId) {
        let mut editor = Editor::default();
        let a = editor.document_mut().create_text_element("A", None).expect("create");
        let b = editor.document_mut().create_button_element("B", None).expect("create");
        (editor, a, b)
    }

    fn child_names(editor: &Editor) -> Vec<String> {
        let doc = editor.document();
        doc.tree()
            .get(doc.root())
            .map(|root| {
                root.children()
                    .iter()
                    .filter_map(|c| doc.tree().get(*c))
                    .map(|e| e.name().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_duplicate_inserts_after_source() {
        let (mut editor, a, _) = editor_with_two();
        let copy = editor.duplicate(a).expect("duplicate");
        assert_ne!(copy, a);
        assert_eq!(child_names(&editor), vec!["A", "A", "B"]);
        assert_eq!(editor.history().undo_label(), Some("Duplicate"));
        assert!(editor.duplicate(editor.document().root()).is_err());
    }

    #[test]
    fn test_cut_then_paste_restores_content_with_new_id() {
        let (mut editor, a, _) = editor_with_two();
        editor
            .document_mut()
            .update_component::<Text, _>(a, |t| t.set_text("Hello"));
        editor.cut(a).expect("cut");
        assert_eq!(child_names(&editor), vec!["B"]);
        assert_eq!(editor.clipboard().map(|c| c.source_id), Some(a));

        let pasted = editor.paste(None).expect("paste");
        assert_ne!(pasted, a);
        assert_eq!(
            editor.document().component::<Text>(pasted).map(Text::text),
            Some("Hello")
        );
        assert_eq!(editor.history().undo_len(), 2);
    }

    #[test]
    fn test_paste_without_clipboard_fails() {
        let mut editor = Editor::default();
        assert!(matches!(editor.paste(None), Err(StageError::InvalidOperation(_))));
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn test_failed_action_records_nothing() {
        let mut editor = Editor::default();
        assert!(editor.delete(EntityId::new()).is_err());
        assert!(editor.cut(editor.document().root()).is_err());
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn test_delete_undo_redo() {
        let (mut editor, a, _) = editor_with_two();
        editor.delete(a).expect("delete");
        assert!(editor.undo().expect("undo"));
        assert!(editor.document().tree().contains(a));
        assert!(editor.redo().expect("redo"));
        assert!(!editor.document().tree().contains(a));
    }

    #[test]
    fn test_drop_payload_reparents_source() {
        let (mut editor, a, b) = editor_with_two();
        let bytes = ClipboardPayload::capture(editor.document(), a)
            .and_then(|p| p.to_bytes())
            .expect("payload");
        assert!(editor.drop_payload(&bytes, b, None).expect("drop"));
        assert_eq!(editor.document().tree().get(a).and_then(|e| e.parent()), Some(b));
        // Dropping an ancestor onto its descendant is refused.
        let bytes = ClipboardPayload::capture(editor.document(), b)
            .and_then(|p| p.to_bytes())
            .expect("payload");
        assert!(!editor.drop_payload(&bytes, a, None).expect("drop"));
    }

    #[test]
    fn test_payload_rejects_foreign_mime() {
        let (editor, a, _) = editor_with_two();
        let mut payload = ClipboardPayload::capture(editor.document(), a).expect("capture");
        payload.mime = "text/plain".into();
        let bytes = serde_json::to_vec(&payload).expect("serialize");
        assert!(matches!(
            ClipboardPayload::from_bytes(&bytes),
            Err(StageError::InvalidDocument(_))
        ));
        assert!(ClipboardPayload::from_bytes(b"{}").is_err());
    }
}
