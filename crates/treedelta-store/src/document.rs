//! Versioned documents.
//!
//! A [`VersionedDocument`] is a flattened item sequence plus an append-only
//! arena of committed structural deltas. Every structural mutation edits the
//! item vector and records exactly one [`Delta`]; outstanding pointers
//! replay deltas from their own arena index to stay valid. Content updates
//! ([`VersionedDocument::replace_item`]) shift nothing and record nothing.
//!
//! Delta coordinates: a delta's paths and flat positions describe the
//! document *after* the mutation, with move sources in pre-move and move
//! destinations in post-removal coordinates. Translation is total over
//! paths and positions that still exist; a deleted node translates to
//! `None`.

use thiserror::Error;
use tracing::debug;

use treedelta_core::Item;

use crate::path::TreePath;

/// Structural failure crossing the document boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("no node at path {0}")]
    PathNotFound(TreePath),
}

/// One committed structural change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    /// A run of `len` items now occupies `at` / `at_pos`.
    Insert {
        at: TreePath,
        at_pos: usize,
        len: usize,
    },
    /// The subtree that was at `at` / `at_pos` is gone.
    Delete {
        at: TreePath,
        at_pos: usize,
        len: usize,
    },
    /// The subtree at `from` / `from_pos` now lives at `to` / `to_pos`,
    /// where the destination is expressed as if the source were already
    /// removed.
    Move {
        from: TreePath,
        from_pos: usize,
        len: usize,
        to: TreePath,
        to_pos: usize,
    },
}

impl Delta {
    /// Translates a path across this delta. `None` means the addressed node
    /// was deleted.
    pub fn translate_path(&self, path: &TreePath) -> Option<TreePath> {
        match self {
            Delta::Insert { at, .. } => {
                Some(shift_in(path, at).unwrap_or_else(|| path.clone()))
            }
            Delta::Delete { at, .. } => {
                if path.is_descendant_self(at) {
                    return None;
                }
                Some(shift_out(path, at).unwrap_or_else(|| path.clone()))
            }
            Delta::Move { from, to, .. } => {
                if path.is_descendant_self(from) {
                    return Some(path.replace_ancestor(from, to));
                }
                let shifted = shift_out(path, from).unwrap_or_else(|| path.clone());
                Some(shift_in(&shifted, to).unwrap_or(shifted))
            }
        }
    }

    /// Translates a flat item position across this delta. `None` means the
    /// position fell inside a deleted run.
    pub fn translate_pos(&self, pos: usize) -> Option<usize> {
        match self {
            Delta::Insert { at_pos, len, .. } => {
                Some(if pos >= *at_pos { pos + len } else { pos })
            }
            Delta::Delete { at_pos, len, .. } => {
                if pos >= at_pos + len {
                    Some(pos - len)
                } else if pos >= *at_pos {
                    None
                } else {
                    Some(pos)
                }
            }
            Delta::Move {
                from_pos,
                len,
                to_pos,
                ..
            } => {
                if pos >= *from_pos && pos < from_pos + len {
                    return Some(to_pos + (pos - from_pos));
                }
                let p = if pos >= from_pos + len { pos - len } else { pos };
                Some(if p >= *to_pos { p + len } else { p })
            }
        }
    }
}

/// Shift for a run appearing at `at`: paths at or after that slot under the
/// same parent move one ordinal up.
fn shift_in(path: &TreePath, at: &TreePath) -> Option<TreePath> {
    let d = at.depth() - 1;
    let steps = path.steps();
    if path.depth() > d && steps[..d] == at.steps()[..d] && steps[d] >= at.last_step() {
        let mut steps = steps.to_vec();
        steps[d] += 1;
        return Some(TreePath::from_steps(steps));
    }
    None
}

/// Shift for a run vanishing from `at`: paths strictly after that slot under
/// the same parent move one ordinal down.
fn shift_out(path: &TreePath, at: &TreePath) -> Option<TreePath> {
    let d = at.depth() - 1;
    let steps = path.steps();
    if path.depth() > d && steps[..d] == at.steps()[..d] && steps[d] > at.last_step() {
        let mut steps = steps.to_vec();
        steps[d] -= 1;
        return Some(TreePath::from_steps(steps));
    }
    None
}

/// Flattened document with an append-only version history.
#[derive(Debug, Clone)]
pub struct VersionedDocument {
    items: Vec<Item>,
    deltas: Vec<Delta>,
}

impl VersionedDocument {
    /// Wraps a flattened item sequence. The sequence must be balanced, with
    /// the root item first.
    pub fn new(items: Vec<Item>) -> VersionedDocument {
        VersionedDocument {
            items,
            deltas: Vec::new(),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Number of committed deltas; a cursor with this index is caught up.
    pub fn version(&self) -> usize {
        self.deltas.len()
    }

    pub fn delta(&self, index: usize) -> &Delta {
        &self.deltas[index]
    }

    /// Flat position of the node addressed by `path`.
    pub fn pos_of(&self, path: &TreePath) -> Option<usize> {
        if self.items.is_empty() {
            return None;
        }
        let mut pos = 0;
        for &step in path.steps() {
            if !self.items[pos].is_start() {
                return None;
            }
            let mut child = pos + 1;
            let mut remaining = step;
            loop {
                if child >= self.items.len() || self.items[child].is_end() {
                    return None;
                }
                if remaining == 0 {
                    break;
                }
                child += self.subtree_len(child);
                remaining -= 1;
            }
            pos = child;
        }
        Some(pos)
    }

    /// Flat length of the subtree starting at `pos` (1 for text).
    pub fn subtree_len(&self, pos: usize) -> usize {
        match &self.items[pos] {
            Item::Text(_) | Item::End(_) => 1,
            Item::Start(_) => {
                let mut depth = 0usize;
                let mut i = pos;
                loop {
                    match &self.items[i] {
                        Item::Start(_) => depth += 1,
                        Item::End(_) => {
                            depth -= 1;
                            if depth == 0 {
                                return i - pos + 1;
                            }
                        }
                        Item::Text(_) => {}
                    }
                    i += 1;
                }
            }
        }
    }

    /// Replaces one item in place. A content update, not a structural
    /// change: nothing shifts and no delta is recorded.
    pub fn replace_item(&mut self, pos: usize, item: Item) {
        self.items[pos] = item;
    }

    /// Inserts a balanced run as the next sibling of the node at `path`.
    ///
    /// Panics when `path` is the root; the root has no siblings.
    pub fn insert_after(&mut self, path: &TreePath, items: Vec<Item>) -> Result<(), DocumentError> {
        assert!(!path.is_root(), "cannot insert a sibling of the root");
        let pos = self.resolve(path)?;
        let at_pos = pos + self.subtree_len(pos);
        let len = items.len();
        self.items.splice(at_pos..at_pos, items);
        let at = path.next();
        debug!(at = %at, at_pos, len, "commit insert");
        self.deltas.push(Delta::Insert { at, at_pos, len });
        Ok(())
    }

    /// Inserts a balanced run as the first child of the element at `path`.
    ///
    /// Panics when the addressed node is not an element.
    pub fn insert_first_child(
        &mut self,
        path: &TreePath,
        items: Vec<Item>,
    ) -> Result<(), DocumentError> {
        let pos = self.resolve(path)?;
        assert!(
            self.items[pos].is_start(),
            "only elements take children, found non-element at {path}"
        );
        let at_pos = pos + 1;
        let len = items.len();
        self.items.splice(at_pos..at_pos, items);
        let at = path.down();
        debug!(at = %at, at_pos, len, "commit insert");
        self.deltas.push(Delta::Insert { at, at_pos, len });
        Ok(())
    }

    /// Deletes the subtree at `path`, returning the removed run.
    pub fn delete(&mut self, path: &TreePath) -> Result<Vec<Item>, DocumentError> {
        let pos = self.resolve(path)?;
        let len = self.subtree_len(pos);
        let removed = self.items.drain(pos..pos + len).collect();
        debug!(at = %path, at_pos = pos, len, "commit delete");
        self.deltas.push(Delta::Delete {
            at: path.clone(),
            at_pos: pos,
            len,
        });
        Ok(removed)
    }

    /// Moves the subtree at `from` to be the next sibling of `target`.
    ///
    /// Panics when `from` is the root or `target` lies inside the moved
    /// subtree.
    pub fn move_after(&mut self, from: &TreePath, target: &TreePath) -> Result<(), DocumentError> {
        assert!(!from.is_root(), "cannot move the root");
        assert!(
            !target.is_descendant_self(from),
            "cannot move {from} after its own descendant {target}"
        );
        let from_pos = self.resolve(from)?;
        let len = self.subtree_len(from_pos);
        let target_pos = self.resolve(target)?;
        let target_len = self.subtree_len(target_pos);

        let removal = Delta::Delete {
            at: from.clone(),
            at_pos: from_pos,
            len,
        };
        let to = removal
            .translate_path(target)
            .expect("target is outside the moved subtree")
            .next();
        let target_pos_after = removal
            .translate_pos(target_pos)
            .expect("target is outside the moved subtree");
        // The target subtree itself shrinks when the source comes out of it.
        let target_len_after = if from_pos >= target_pos && from_pos < target_pos + target_len {
            target_len - len
        } else {
            target_len
        };
        let to_pos = target_pos_after + target_len_after;

        self.shift_items(from_pos, len, to_pos);
        debug!(from = %from, to = %to, from_pos, to_pos, len, "commit move");
        self.deltas.push(Delta::Move {
            from: from.clone(),
            from_pos,
            len,
            to,
            to_pos,
        });
        Ok(())
    }

    /// Moves the subtree at `from` to be the first child of the element at
    /// `parent`.
    ///
    /// Panics when `from` is the root, `parent` lies inside the moved
    /// subtree, or the addressed parent is not an element.
    pub fn move_first_child(
        &mut self,
        from: &TreePath,
        parent: &TreePath,
    ) -> Result<(), DocumentError> {
        assert!(!from.is_root(), "cannot move the root");
        assert!(
            !parent.is_descendant_self(from),
            "cannot move {from} under its own descendant {parent}"
        );
        let from_pos = self.resolve(from)?;
        let len = self.subtree_len(from_pos);
        let parent_pos = self.resolve(parent)?;
        assert!(
            self.items[parent_pos].is_start(),
            "only elements take children, found non-element at {parent}"
        );

        let removal = Delta::Delete {
            at: from.clone(),
            at_pos: from_pos,
            len,
        };
        let to = removal
            .translate_path(parent)
            .expect("parent is outside the moved subtree")
            .down();
        let to_pos = removal
            .translate_pos(parent_pos)
            .expect("parent is outside the moved subtree")
            + 1;

        self.shift_items(from_pos, len, to_pos);
        debug!(from = %from, to = %to, from_pos, to_pos, len, "commit move");
        self.deltas.push(Delta::Move {
            from: from.clone(),
            from_pos,
            len,
            to,
            to_pos,
        });
        Ok(())
    }

    fn resolve(&self, path: &TreePath) -> Result<usize, DocumentError> {
        self.pos_of(path)
            .ok_or_else(|| DocumentError::PathNotFound(path.clone()))
    }

    /// Relocates `len` items starting at `from_pos` so the run begins at
    /// `to_pos` in post-removal coordinates. In place, no temporary buffer.
    fn shift_items(&mut self, from_pos: usize, len: usize, to_pos: usize) {
        if to_pos >= from_pos {
            self.items[from_pos..to_pos + len].rotate_left(len);
        } else {
            self.items[to_pos..from_pos + len].rotate_right(len);
        }
    }
}
