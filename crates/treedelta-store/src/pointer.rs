//! Lazily-rebasing document cursors.
//!
//! A [`VersionedPointer`] binds a tree path and a flat position at some
//! point in a document's history. Before every read or mutation it rebases:
//! it replays the deltas committed since its own arena index, translating
//! path and position through each. A pointer whose bound node is deleted
//! becomes permanently invalid.
//!
//! Mutations issued through a pointer commit through the document (so a
//! delta is recorded for everyone) and then rebase the issuing cursor
//! immediately, consuming the self-appended delta.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, trace};

use treedelta_core::Item;

use crate::document::{DocumentError, VersionedDocument};
use crate::path::TreePath;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("pointer is no longer valid")]
    Invalid,
    #[error("pointers belong to different documents")]
    CrossDocument,
}

/// Cursor into a [`VersionedDocument`] that survives later structural edits.
pub struct VersionedPointer {
    doc: Rc<RefCell<VersionedDocument>>,
    path: Option<TreePath>,
    pos: usize,
    version: usize,
}

impl VersionedPointer {
    /// Binds a pointer to the node at `path`, caught up with the document's
    /// current version.
    pub fn at(
        doc: &Rc<RefCell<VersionedDocument>>,
        path: TreePath,
    ) -> Result<VersionedPointer, DocumentError> {
        let (pos, version) = {
            let d = doc.borrow();
            let pos = d
                .pos_of(&path)
                .ok_or_else(|| DocumentError::PathNotFound(path.clone()))?;
            (pos, d.version())
        };
        Ok(VersionedPointer {
            doc: Rc::clone(doc),
            path: Some(path),
            pos,
            version,
        })
    }

    /// Replays deltas committed since this pointer last looked.
    fn rebase(&mut self) {
        let doc = self.doc.borrow();
        if self.path.is_none() {
            // Permanently invalid; nothing left to track.
            self.version = doc.version();
            return;
        }
        while self.version < doc.version() {
            let delta = doc.delta(self.version);
            let path = self.path.as_ref().expect("invalid pointers exit above");
            match delta.translate_path(path) {
                Some(new_path) => {
                    let new_pos = delta
                        .translate_pos(self.pos)
                        .expect("position tracks a live path");
                    trace!(old = %path, new = %new_path, "rebase step");
                    self.path = Some(new_path);
                    self.pos = new_pos;
                }
                None => {
                    debug!(path = %path, "pointer invalidated by delete");
                    self.path = None;
                    self.version = doc.version();
                    return;
                }
            }
            self.version += 1;
        }
    }

    pub fn is_valid(&mut self) -> bool {
        self.rebase();
        self.path.is_some()
    }

    /// Current path of the bound node.
    pub fn path(&mut self) -> Result<TreePath, PointerError> {
        self.rebase();
        self.path.clone().ok_or(PointerError::Invalid)
    }

    /// The item the pointer is bound to.
    pub fn get(&mut self) -> Result<Item, PointerError> {
        self.rebase();
        if self.path.is_none() {
            return Err(PointerError::Invalid);
        }
        Ok(self.doc.borrow().items()[self.pos].clone())
    }

    /// Replaces the bound item in place. A content update; no delta is
    /// recorded and no other pointer moves.
    pub fn set(&mut self, item: Item) -> Result<(), PointerError> {
        self.rebase();
        if self.path.is_none() {
            return Err(PointerError::Invalid);
        }
        self.doc.borrow_mut().replace_item(self.pos, item);
        Ok(())
    }

    /// Inserts a balanced run as the next sibling of the bound node.
    pub fn insert_after(&mut self, items: Vec<Item>) -> Result<(), PointerError> {
        let path = self.path()?;
        self.doc
            .borrow_mut()
            .insert_after(&path, items)
            .expect("rebased path resolves");
        self.rebase();
        Ok(())
    }

    /// Inserts a balanced run as the first child of the bound element.
    pub fn insert_first_child(&mut self, items: Vec<Item>) -> Result<(), PointerError> {
        let path = self.path()?;
        self.doc
            .borrow_mut()
            .insert_first_child(&path, items)
            .expect("rebased path resolves");
        self.rebase();
        Ok(())
    }

    /// Deletes the bound subtree, returning the removed run. The pointer
    /// follows its node into deletion and is invalid afterwards.
    pub fn delete(&mut self) -> Result<Vec<Item>, PointerError> {
        let path = self.path()?;
        let removed = self
            .doc
            .borrow_mut()
            .delete(&path)
            .expect("rebased path resolves");
        self.rebase();
        Ok(removed)
    }

    /// Moves the bound subtree to be the next sibling of `target`'s node.
    ///
    /// Both pointers must belong to the same document; a cross-document
    /// move is rejected before any mutation. Moving a node after itself is
    /// a no-op.
    pub fn move_after(&mut self, target: &mut VersionedPointer) -> Result<(), PointerError> {
        if !Rc::ptr_eq(&self.doc, &target.doc) {
            return Err(PointerError::CrossDocument);
        }
        let from = self.path()?;
        let to = target.path()?;
        if from == to {
            return Ok(());
        }
        self.doc
            .borrow_mut()
            .move_after(&from, &to)
            .expect("rebased paths resolve");
        self.rebase();
        target.rebase();
        Ok(())
    }

    /// Moves the bound subtree to be the first child of `target`'s element.
    ///
    /// Both pointers must belong to the same document; a cross-document
    /// move is rejected before any mutation.
    pub fn move_first_child(&mut self, target: &mut VersionedPointer) -> Result<(), PointerError> {
        if !Rc::ptr_eq(&self.doc, &target.doc) {
            return Err(PointerError::CrossDocument);
        }
        let from = self.path()?;
        let parent = target.path()?;
        self.doc
            .borrow_mut()
            .move_first_child(&from, &parent)
            .expect("rebased paths resolve");
        self.rebase();
        target.rebase();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(steps: &[u32]) -> TreePath {
        TreePath::from_steps(steps)
    }

    fn handle() -> Rc<RefCell<VersionedDocument>> {
        Rc::new(RefCell::new(VersionedDocument::new(vec![
            Item::start_with_id("root", "r1"),
            Item::start("a"),
            Item::end("a"),
            Item::start("b"),
            Item::end("b"),
            Item::end("root"),
        ])))
    }

    #[test]
    fn pointer_follows_node_across_sibling_insert() {
        let doc = handle();
        let mut ptr = VersionedPointer::at(&doc, p(&[0])).unwrap();
        doc.borrow_mut()
            .insert_first_child(&TreePath::root(), vec![Item::start("z"), Item::end("z")])
            .unwrap();
        // The bound node shifted but its identity did not.
        assert_eq!(ptr.get().unwrap(), Item::start("a"));
        assert_eq!(ptr.path().unwrap(), p(&[1]));
        // A fresh pointer observes the new sibling order.
        let mut fresh = VersionedPointer::at(&doc, p(&[0])).unwrap();
        assert_eq!(fresh.get().unwrap(), Item::start("z"));
    }

    #[test]
    fn pointer_invalidates_permanently_on_delete() {
        let doc = handle();
        let mut ptr = VersionedPointer::at(&doc, p(&[0])).unwrap();
        doc.borrow_mut().delete(&p(&[0])).unwrap();
        assert_eq!(ptr.get(), Err(PointerError::Invalid));
        // Later activity does not resurrect it.
        doc.borrow_mut()
            .insert_first_child(&TreePath::root(), vec![Item::start("z"), Item::end("z")])
            .unwrap();
        assert!(!ptr.is_valid());
        assert_eq!(ptr.path(), Err(PointerError::Invalid));
    }

    #[test]
    fn pointer_catches_up_across_many_deltas_lazily() {
        let doc = handle();
        let mut ptr = VersionedPointer::at(&doc, p(&[1])).unwrap();
        for _ in 0..3 {
            doc.borrow_mut()
                .insert_first_child(&TreePath::root(), vec![Item::text("pad")])
                .unwrap();
        }
        doc.borrow_mut().delete(&p(&[0])).unwrap();
        assert_eq!(ptr.get().unwrap(), Item::start("b"));
        assert_eq!(ptr.path().unwrap(), p(&[3]));
    }

    #[test]
    fn mutation_through_pointer_keeps_cursor_consistent() {
        let doc = handle();
        let mut ptr = VersionedPointer::at(&doc, p(&[0])).unwrap();
        ptr.insert_after(vec![Item::start("z"), Item::end("z")])
            .unwrap();
        assert_eq!(ptr.path().unwrap(), p(&[0]));
        assert_eq!(ptr.get().unwrap(), Item::start("a"));
        assert_eq!(doc.borrow().items()[3], Item::start("z"));
    }

    #[test]
    fn delete_through_pointer_returns_run_and_invalidates() {
        let doc = handle();
        let mut ptr = VersionedPointer::at(&doc, p(&[0])).unwrap();
        let removed = ptr.delete().unwrap();
        assert_eq!(removed, vec![Item::start("a"), Item::end("a")]);
        assert_eq!(ptr.get(), Err(PointerError::Invalid));
    }

    #[test]
    fn move_between_documents_is_rejected_before_mutation() {
        let doc_a = handle();
        let doc_b = handle();
        let mut src = VersionedPointer::at(&doc_a, p(&[0])).unwrap();
        let mut dst = VersionedPointer::at(&doc_b, p(&[1])).unwrap();
        assert_eq!(src.move_after(&mut dst), Err(PointerError::CrossDocument));
        assert_eq!(doc_a.borrow().version(), 0);
        assert_eq!(doc_b.borrow().version(), 0);
    }

    #[test]
    fn sibling_move_through_pointers_updates_both_cursors() {
        let doc = handle();
        let mut src = VersionedPointer::at(&doc, p(&[0])).unwrap();
        let mut dst = VersionedPointer::at(&doc, p(&[1])).unwrap();
        src.move_after(&mut dst).unwrap();
        assert_eq!(src.path().unwrap(), p(&[1]));
        assert_eq!(dst.path().unwrap(), p(&[0]));
        assert_eq!(src.get().unwrap(), Item::start("a"));
        assert_eq!(dst.get().unwrap(), Item::start("b"));
    }

    #[test]
    fn move_first_child_through_pointers_nests_the_node() {
        let doc = handle();
        let mut src = VersionedPointer::at(&doc, p(&[1])).unwrap();
        let mut dst = VersionedPointer::at(&doc, p(&[0])).unwrap();
        src.move_first_child(&mut dst).unwrap();
        assert_eq!(src.path().unwrap(), p(&[0, 0]));
        assert_eq!(dst.path().unwrap(), p(&[0]));
        assert_eq!(src.get().unwrap(), Item::start("b"));
    }

    #[test]
    fn content_update_through_pointer_moves_no_other_cursor() {
        let doc = handle();
        let mut a = VersionedPointer::at(&doc, p(&[0])).unwrap();
        let mut b = VersionedPointer::at(&doc, p(&[1])).unwrap();
        a.set(Item::start("renamed")).unwrap();
        assert_eq!(doc.borrow().version(), 0);
        assert_eq!(b.path().unwrap(), p(&[1]));
        assert_eq!(a.get().unwrap(), Item::start("renamed"));
    }
}
