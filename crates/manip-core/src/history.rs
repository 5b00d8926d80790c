//! Undo history for transform edits
//!
//! A gizmo drag commits one [`Transaction`] covering every selected object.
//! Undo writes the `before` matrices back, redo the `after` matrices.

use glam::Mat4;

use crate::constants::history::DEFAULT_LIMIT;
use crate::scene::{ObjectId, TransformStore};

/// One object's transform before and after an edit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformChange {
    pub object: ObjectId,
    pub before: Mat4,
    pub after: Mat4,
}

/// A reversible group of transform changes applied as one step
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub label: String,
    pub changes: Vec<TransformChange>,
}

impl Transaction {
    pub fn new(label: impl Into<String>, changes: Vec<TransformChange>) -> Self {
        Self {
            label: label.into(),
            changes,
        }
    }

    /// Write every `before` matrix
    pub fn revert(&self, store: &mut impl TransformStore) {
        for change in &self.changes {
            if !store.set_transform(change.object, change.before) {
                tracing::warn!(object = %change.object, "Undo target no longer exists");
            }
        }
    }

    /// Write every `after` matrix
    pub fn apply(&self, store: &mut impl TransformStore) {
        for change in &self.changes {
            if !store.set_transform(change.object, change.after) {
                tracing::warn!(object = %change.object, "Redo target no longer exists");
            }
        }
    }
}

/// Receiver of committed, reversible edits
pub trait UndoSink {
    fn commit(&mut self, transaction: Transaction);
}

/// Bounded undo/redo stacks
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<Transaction>,
    redo_stack: Vec<Transaction>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(DEFAULT_LIMIT)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// History keeping at most `limit` undo steps (at least one)
    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Undo the most recent transaction. Returns its label.
    pub fn undo(&mut self, store: &mut impl TransformStore) -> Option<&str> {
        let transaction = self.undo_stack.pop()?;
        transaction.revert(store);
        tracing::debug!(label = %transaction.label, "Undo");
        self.redo_stack.push(transaction);
        self.redo_stack.last().map(|t| t.label.as_str())
    }

    /// Redo the most recently undone transaction. Returns its label.
    pub fn redo(&mut self, store: &mut impl TransformStore) -> Option<&str> {
        let transaction = self.redo_stack.pop()?;
        transaction.apply(store);
        tracing::debug!(label = %transaction.label, "Redo");
        self.undo_stack.push(transaction);
        self.undo_stack.last().map(|t| t.label.as_str())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undoable steps
    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    /// Most recent undoable transaction
    pub fn last(&self) -> Option<&Transaction> {
        self.undo_stack.last()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl UndoSink for History {
    fn commit(&mut self, transaction: Transaction) {
        tracing::debug!(
            label = %transaction.label,
            objects = transaction.changes.len(),
            "Commit transaction"
        );
        self.redo_stack.clear();
        self.undo_stack.push(transaction);
        if self.undo_stack.len() > self.limit {
            let overflow = self.undo_stack.len() - self.limit;
            self.undo_stack.drain(..overflow);
        }
    }
}
