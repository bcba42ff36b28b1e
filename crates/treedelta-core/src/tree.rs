//! Identifier-addressable ordered trees.
//!
//! A [`KeyedTree`] is a rooted tree of keyed nodes with random access by
//! [`Key`]. Sibling order is semantically significant and preserved by every
//! operation. Structural invariants hold at every return from a mutator:
//! each non-root node has exactly one parent, there are no cycles, every
//! reachable key is indexed exactly once, and no child reference dangles.

use indexmap::IndexMap;
use thiserror::Error;

use crate::key::Key;

/// The single checked failure kind crossing the tree boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("node not found: {0:?}")]
    NodeNotFound(Key),
}

/// Sibling position for inserts and moves.
///
/// [`InsertPosition::Last`] ("append as last child") is the documented
/// tie-break used whenever no explicit position is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Last,
    At(usize),
}

#[derive(Debug, Clone)]
struct NodeEntry<T> {
    content: T,
    parent: Option<Key>,
    children: Vec<Key>,
}

/// Read access shared by concrete trees and overlays.
pub trait AddressableTree<T> {
    fn root_key(&self) -> &Key;
    fn get(&self, key: &Key) -> Option<&T>;
    fn contains(&self, key: &Key) -> bool;
    /// `Ok(None)` for the root; `NodeNotFound` if `key` is absent.
    fn parent(&self, key: &Key) -> Result<Option<&Key>, TreeError>;
    /// Ordered child keys; `NodeNotFound` if `key` is absent.
    fn children(&self, key: &Key) -> Result<&[Key], TreeError>;
}

/// Ordered tree with an addressable key index.
#[derive(Debug, Clone)]
pub struct KeyedTree<T> {
    root: Key,
    index: IndexMap<Key, NodeEntry<T>>,
}

impl<T> KeyedTree<T> {
    pub fn new(root_key: Key, root_content: T) -> KeyedTree<T> {
        let mut index = IndexMap::new();
        index.insert(
            root_key.clone(),
            NodeEntry {
                content: root_content,
                parent: None,
                children: Vec::new(),
            },
        );
        KeyedTree {
            root: root_key,
            index,
        }
    }

    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.index.keys()
    }

    pub fn get_mut(&mut self, key: &Key) -> Option<&mut T> {
        self.index.get_mut(key).map(|e| &mut e.content)
    }

    /// Inserts `key` under `parent` at `pos`.
    ///
    /// Inserting an already-present key is a usage error and panics.
    pub fn insert(
        &mut self,
        parent: &Key,
        pos: InsertPosition,
        key: Key,
        content: T,
    ) -> Result<(), TreeError> {
        assert!(
            !self.index.contains_key(&key),
            "key already in tree: {key:?}"
        );
        let entry = self
            .index
            .get_mut(parent)
            .ok_or_else(|| TreeError::NodeNotFound(parent.clone()))?;
        match pos {
            InsertPosition::Last => entry.children.push(key.clone()),
            InsertPosition::At(i) => {
                let i = i.min(entry.children.len());
                entry.children.insert(i, key.clone());
            }
        }
        self.index.insert(
            key,
            NodeEntry {
                content,
                parent: Some(parent.clone()),
                children: Vec::new(),
            },
        );
        Ok(())
    }

    /// Replaces the content of an existing node.
    pub fn update(&mut self, key: &Key, content: T) -> Result<(), TreeError> {
        let entry = self
            .index
            .get_mut(key)
            .ok_or_else(|| TreeError::NodeNotFound(key.clone()))?;
        entry.content = content;
        Ok(())
    }

    /// Moves `key` (with its subtree) under `new_parent` at `pos`.
    ///
    /// Moving the root, or moving a node into its own subtree, is a usage
    /// error and panics.
    pub fn move_node(
        &mut self,
        key: &Key,
        new_parent: &Key,
        pos: InsertPosition,
    ) -> Result<(), TreeError> {
        if !self.index.contains_key(key) {
            return Err(TreeError::NodeNotFound(key.clone()));
        }
        if !self.index.contains_key(new_parent) {
            return Err(TreeError::NodeNotFound(new_parent.clone()));
        }
        assert!(*key != self.root, "cannot move the root node");
        assert!(
            !self.is_descendant(new_parent, key) && new_parent != key,
            "cannot move {key:?} into its own subtree"
        );
        self.detach(key);
        let entry = self
            .index
            .get_mut(new_parent)
            .expect("presence checked above");
        match pos {
            InsertPosition::Last => entry.children.push(key.clone()),
            InsertPosition::At(i) => {
                let i = i.min(entry.children.len());
                entry.children.insert(i, key.clone());
            }
        }
        self.index
            .get_mut(key)
            .expect("presence checked above")
            .parent = Some(new_parent.clone());
        Ok(())
    }

    /// Deletes `key` and its entire subtree.
    ///
    /// Deleting the root is a usage error and panics.
    pub fn delete(&mut self, key: &Key) -> Result<(), TreeError> {
        if !self.index.contains_key(key) {
            return Err(TreeError::NodeNotFound(key.clone()));
        }
        assert!(*key != self.root, "cannot delete the root node");
        self.detach(key);
        let mut stack = vec![key.clone()];
        while let Some(k) = stack.pop() {
            if let Some(entry) = self.index.shift_remove(&k) {
                stack.extend(entry.children);
            }
        }
        Ok(())
    }

    /// Reorders the children of `parent` so that the keys in `order` come
    /// first, in the given order; children not named keep their relative
    /// order after them.
    ///
    /// Every key in `order` must currently be a child of `parent` (usage
    /// error otherwise).
    pub fn reorder_children(&mut self, parent: &Key, order: &[Key]) -> Result<(), TreeError> {
        let entry = self
            .index
            .get_mut(parent)
            .ok_or_else(|| TreeError::NodeNotFound(parent.clone()))?;
        for k in order {
            assert!(
                entry.children.contains(k),
                "{k:?} is not a child of {parent:?}"
            );
        }
        let mut rest: Vec<Key> = entry
            .children
            .iter()
            .filter(|&k| !order.contains(k))
            .cloned()
            .collect();
        let mut children = order.to_vec();
        children.append(&mut rest);
        entry.children = children;
        Ok(())
    }

    /// True if `key` is a strict descendant of `ancestor`.
    pub fn is_descendant(&self, key: &Key, ancestor: &Key) -> bool {
        let mut cur = match self.index.get(key) {
            Some(e) => e.parent.as_ref(),
            None => return false,
        };
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self
                .index
                .get(p)
                .expect("parent links stay inside the index")
                .parent
                .as_ref();
        }
        false
    }

    fn detach(&mut self, key: &Key) {
        let parent = self
            .index
            .get(key)
            .expect("caller checked presence")
            .parent
            .clone()
            .expect("non-root node has a parent");
        let siblings = &mut self
            .index
            .get_mut(&parent)
            .expect("parent links stay inside the index")
            .children;
        siblings.retain(|k| k != key);
    }
}

impl<T> AddressableTree<T> for KeyedTree<T> {
    fn root_key(&self) -> &Key {
        &self.root
    }

    fn get(&self, key: &Key) -> Option<&T> {
        self.index.get(key).map(|e| &e.content)
    }

    fn contains(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    fn parent(&self, key: &Key) -> Result<Option<&Key>, TreeError> {
        self.index
            .get(key)
            .map(|e| e.parent.as_ref())
            .ok_or_else(|| TreeError::NodeNotFound(key.clone()))
    }

    fn children(&self, key: &Key) -> Result<&[Key], TreeError> {
        self.index
            .get(key)
            .map(|e| e.children.as_slice())
            .ok_or_else(|| TreeError::NodeNotFound(key.clone()))
    }
}
