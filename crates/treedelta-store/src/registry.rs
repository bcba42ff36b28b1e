//! Store-identifier registry.
//!
//! Maps external store identifiers to shared document handles. An explicit
//! object passed by reference, not process-global state; persistence of the
//! mapping is out of scope.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::document::VersionedDocument;

/// Shared handle to a registered document.
pub type DocumentHandle = Rc<RefCell<VersionedDocument>>;

#[derive(Default)]
pub struct TreeRegistry {
    docs: IndexMap<String, DocumentHandle>,
}

impl TreeRegistry {
    pub fn new() -> TreeRegistry {
        TreeRegistry::default()
    }

    /// Returns the document registered under `id`, creating it with `init`
    /// on first open.
    pub fn open_or_create<F>(&mut self, id: &str, init: F) -> DocumentHandle
    where
        F: FnOnce() -> VersionedDocument,
    {
        if let Some(doc) = self.docs.get(id) {
            return Rc::clone(doc);
        }
        debug!(id, "registry: creating document");
        let doc = Rc::new(RefCell::new(init()));
        self.docs.insert(id.to_owned(), Rc::clone(&doc));
        doc
    }

    /// Returns the document registered under `id`, if any.
    pub fn open(&self, id: &str) -> Option<DocumentHandle> {
        self.docs.get(id).map(Rc::clone)
    }

    /// Evicts one registration. Outstanding handles stay usable; the
    /// identifier just no longer resolves. Returns whether anything was
    /// registered.
    pub fn close(&mut self, id: &str) -> bool {
        let evicted = self.docs.shift_remove(id).is_some();
        if evicted {
            debug!(id, "registry: closed document");
        }
        evicted
    }

    /// Evicts every registration.
    pub fn clear(&mut self) {
        debug!(count = self.docs.len(), "registry: clearing");
        self.docs.clear();
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treedelta_core::Item;

    fn empty_doc() -> VersionedDocument {
        VersionedDocument::new(vec![Item::start("root"), Item::end("root")])
    }

    #[test]
    fn open_or_create_registers_once_and_shares_the_handle() {
        let mut reg = TreeRegistry::new();
        let first = reg.open_or_create("store/a", empty_doc);
        let second = reg.open_or_create("store/a", || unreachable!("already registered"));
        assert!(Rc::ptr_eq(&first, &second));
        assert!(Rc::ptr_eq(&first, &reg.open("store/a").unwrap()));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn open_does_not_create() {
        let reg = TreeRegistry::new();
        assert!(reg.open("store/missing").is_none());
    }

    #[test]
    fn close_evicts_but_outstanding_handles_survive() {
        let mut reg = TreeRegistry::new();
        let doc = reg.open_or_create("store/a", empty_doc);
        assert!(reg.close("store/a"));
        assert!(!reg.close("store/a"));
        assert!(reg.open("store/a").is_none());
        assert_eq!(doc.borrow().items().len(), 2);
    }

    #[test]
    fn clear_empties_the_registry() {
        let mut reg = TreeRegistry::new();
        reg.open_or_create("store/a", empty_doc);
        reg.open_or_create("store/b", empty_doc);
        reg.clear();
        assert!(reg.is_empty());
    }
}
