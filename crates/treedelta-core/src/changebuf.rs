//! Change buffers: overlay trees committed onto a base tree.
//!
//! A [`ChangeBuffer`] describes a desired target state as a whole tree. It
//! is built per edit transaction, applied once, and discarded. Apply deduces
//! the edit operations (update, insert, move, delete) that reshape the base
//! into the overlay:
//!
//! 1. the overlay is traversed top-down, so a node's parent is always
//!    materialized before the node itself;
//! 2. keys present in both trees are updated in place (content and sibling
//!    position);
//! 3. keys only in the overlay are inserted under their parent;
//! 4. keys only in the base are deleted with their subtrees, but only after
//!    every surviving insert/update/move has been resolved, so a node moving
//!    out of a doomed subtree is rescued rather than dropped.
//!
//! Apply is transactional: it runs against a clone of the base and swaps the
//! clone in only on success, so a failed apply leaves the base untouched.

use indexmap::IndexSet;
use tracing::{debug, trace};

use crate::key::Key;
use crate::tree::{AddressableTree, InsertPosition, KeyedTree, TreeError};

/// Overlay tree describing a target state for one edit transaction.
#[derive(Debug, Clone)]
pub struct ChangeBuffer<T> {
    overlay: KeyedTree<T>,
}

impl<T: Clone> ChangeBuffer<T> {
    /// Wraps an already-built overlay tree.
    pub fn new(overlay: KeyedTree<T>) -> ChangeBuffer<T> {
        ChangeBuffer { overlay }
    }

    /// Starts a buffer identical to the base; mutate the overlay from there.
    pub fn from_base(base: &KeyedTree<T>) -> ChangeBuffer<T> {
        ChangeBuffer {
            overlay: base.clone(),
        }
    }

    pub fn overlay(&self) -> &KeyedTree<T> {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut KeyedTree<T> {
        &mut self.overlay
    }

    /// Commits the overlay onto `base`, consuming the buffer.
    pub fn apply(self, base: &mut KeyedTree<T>) -> Result<(), TreeError> {
        let mut work = base.clone();
        apply_overlay(&self.overlay, &mut work)?;
        *base = work;
        Ok(())
    }
}

/// Reshapes `target` in place to match `overlay`.
///
/// On failure `target` may be partially mutated; [`ChangeBuffer::apply`]
/// wraps this with the clone-then-swap transaction.
pub fn apply_overlay<T: Clone>(
    overlay: &KeyedTree<T>,
    target: &mut KeyedTree<T>,
) -> Result<(), TreeError> {
    if overlay.root_key() != target.root_key() {
        return Err(TreeError::NodeNotFound(overlay.root_key().clone()));
    }
    let mut del_roots: IndexSet<Key> = IndexSet::new();
    reconcile(overlay, target, overlay.root_key(), &mut del_roots)?;
    // Deletions resolve last; everything still in the set is really gone.
    for key in del_roots {
        if target.contains(&key) {
            debug!(key = %key, "apply: deleting subtree");
            target.delete(&key)?;
        }
    }
    Ok(())
}

fn reconcile<T: Clone>(
    overlay: &KeyedTree<T>,
    target: &mut KeyedTree<T>,
    key: &Key,
    del_roots: &mut IndexSet<Key>,
) -> Result<(), TreeError> {
    let content = overlay
        .get(key)
        .expect("reconcile walks overlay keys")
        .clone();
    target.update(key, content)?;

    let overlay_children: Vec<Key> = overlay.children(key)?.to_vec();

    // Target children missing from the overlay child list are tentative
    // deletes; a later move-here elsewhere in the pass may rescue them.
    for c in target.children(key)?.to_vec() {
        if !overlay_children.contains(&c) {
            trace!(key = %c, "apply: tentative delete");
            del_roots.insert(c);
        }
    }

    for c in &overlay_children {
        if target.contains(c) {
            let current_parent = target.parent(c)?.cloned();
            if current_parent.as_ref() != Some(key) {
                if del_roots.shift_remove(c) {
                    trace!(key = %c, "apply: rescued from tentative delete");
                }
                debug!(key = %c, parent = %key, "apply: move here");
                target.move_node(c, key, InsertPosition::Last)?;
            }
        } else {
            let content = overlay
                .get(c)
                .expect("child listed by overlay")
                .clone();
            debug!(key = %c, parent = %key, "apply: insert");
            target.insert(key, InsertPosition::Last, c.clone(), content)?;
        }
    }

    // Sibling order is authoritative from the overlay.
    target.reorder_children(key, &overlay_children)?;

    for c in &overlay_children {
        reconcile(overlay, target, c, del_roots)?;
    }
    Ok(())
}
