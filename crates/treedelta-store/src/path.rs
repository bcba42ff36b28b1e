//! Dewey-style tree paths.
//!
//! A [`TreePath`] addresses a node by the ordinals of the children taken
//! from the document root: `/` is the root itself, `/0/1` the second child
//! of the root's first child. Both elements and text nodes count as
//! children. Paths are the coordinate system the version chain translates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordinal path from the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreePath(Vec<u32>);

impl TreePath {
    /// The document root.
    pub fn root() -> TreePath {
        TreePath(Vec::new())
    }

    pub fn from_steps(steps: impl Into<Vec<u32>>) -> TreePath {
        TreePath(steps.into())
    }

    pub fn steps(&self) -> &[u32] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Ordinal under the immediate parent. Panics for the root.
    pub fn last_step(&self) -> u32 {
        *self.0.last().expect("root path has no parent ordinal")
    }

    /// Immediate parent. Panics for the root.
    pub fn up(&self) -> TreePath {
        assert!(!self.is_root(), "cannot go up from the root path");
        TreePath(self.0[..self.0.len() - 1].to_vec())
    }

    pub fn child(&self, step: u32) -> TreePath {
        let mut steps = self.0.clone();
        steps.push(step);
        TreePath(steps)
    }

    /// First-child path.
    pub fn down(&self) -> TreePath {
        self.child(0)
    }

    /// Next sibling. Panics for the root.
    pub fn next(&self) -> TreePath {
        assert!(!self.is_root(), "root path has no siblings");
        let mut steps = self.0.clone();
        *steps.last_mut().expect("checked non-root") += 1;
        TreePath(steps)
    }

    /// Previous sibling. Panics for the root or a first child.
    pub fn prev(&self) -> TreePath {
        assert!(!self.is_root(), "root path has no siblings");
        let mut steps = self.0.clone();
        let last = steps.last_mut().expect("checked non-root");
        assert!(*last > 0, "first child has no previous sibling");
        *last -= 1;
        TreePath(steps)
    }

    /// True if `self` lies strictly inside the subtree rooted at `ancestor`.
    pub fn is_descendant(&self, ancestor: &TreePath) -> bool {
        self.depth() > ancestor.depth() && self.0[..ancestor.depth()] == ancestor.0[..]
    }

    pub fn is_descendant_self(&self, ancestor: &TreePath) -> bool {
        self == ancestor || self.is_descendant(ancestor)
    }

    /// True if `self` and `other` share a parent and `self` comes later.
    pub fn follows_sibling(&self, other: &TreePath) -> bool {
        !other.is_root()
            && self.depth() == other.depth()
            && self.0[..self.depth() - 1] == other.0[..other.depth() - 1]
            && self.last_step() > other.last_step()
    }

    /// Rewrites the leading `old` prefix to `new`. Panics unless `old` is an
    /// ancestor of `self` or `self` itself.
    pub fn replace_ancestor(&self, old: &TreePath, new: &TreePath) -> TreePath {
        assert!(
            self.is_descendant_self(old),
            "{old} is not an ancestor of {self}"
        );
        let mut steps = new.0.clone();
        steps.extend_from_slice(&self.0[old.depth()..]);
        TreePath(steps)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }
        for step in &self.0 {
            write!(f, "/{step}")?;
        }
        Ok(())
    }
}
