//! Whole-document snapshot undo/redo.
//!
//! Each undoable action stores the exported document before and after it ran.
//! Undo reloads "before", redo reloads "after". Selection is not part of the
//! snapshot and is lost on either.

use std::collections::VecDeque;

use crate::document::SceneDocument;
use crate::error::StageResult;

/// Exported document bytes around one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Short description of the action, e.g. "Duplicate".
    pub label: String,
    /// Document before the action.
    pub before: Vec<u8>,
    /// Document after the action.
    pub after: Vec<u8>,
}

/// Bounded undo and redo stacks.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    limit: usize,
}

impl History {
    /// Empty history keeping at most `limit` undo steps.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
        }
    }

    /// Push a completed action. Clears the redo stack and drops the oldest
    /// step past the limit.
    pub fn record(&mut self, snapshot: Snapshot) {
        self.redo.clear();
        if self.limit == 0 {
            return;
        }
        tracing::debug!("Recorded undo step {:?}", snapshot.label);
        self.undo.push_back(snapshot);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }

    /// Restore the document from before the last action.
    ///
    /// Returns `false` when there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot no longer loads; the step stays on
    /// the undo stack.
    pub fn undo(&mut self, document: &mut SceneDocument) -> StageResult<bool> {
        let Some(step) = self.undo.pop_back() else {
            return Ok(false);
        };
        if let Err(e) = document.load_json(&step.before) {
            self.undo.push_back(step);
            return Err(e);
        }
        tracing::debug!("Undid {:?}", step.label);
        self.redo.push(step);
        Ok(true)
    }

    /// Re-apply the last undone action.
    ///
    /// Returns `false` when there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot no longer loads; the step stays on
    /// the redo stack.
    pub fn redo(&mut self, document: &mut SceneDocument) -> StageResult<bool> {
        let Some(step) = self.redo.pop() else {
            return Ok(false);
        };
        if let Err(e) = document.load_json(&step.after) {
            self.redo.push(step);
            return Err(e);
        }
        tracing::debug!("Redid {:?}", step.label);
        self.undo.push_back(step);
        Ok(true)
    }

    /// Whether an undo step is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether a redo step is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Label of the step `undo` would revert.
    #[must_use]
    pub fn undo_label(&self) -> Option<&str> {
        self.undo.back().map(|s| s.label.as_str())
    }

    /// Label of the step `redo` would re-apply.
    #[must_use]
    pub fn redo_label(&self) -> Option<&str> {
        self.redo.last().map(|s| s.label.as_str())
    }

    /// Number of undo steps.
    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Drop every step.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
