//! treedelta-store - Versioned documents and lazily-rebasing pointers.
//!
//! Wraps a flattened document in an append-only version history
//! ([`VersionedDocument`]) so that outstanding cursors
//! ([`VersionedPointer`]) stay bound to their nodes across later structural
//! edits. Documents are shared by store identifier through an explicit
//! [`TreeRegistry`].
//!
//! Nothing here is internally synchronized; callers serialize access to a
//! shared document.

pub mod document;
pub mod path;
pub mod pointer;
pub mod registry;

pub use document::{Delta, DocumentError, VersionedDocument};
pub use path::TreePath;
pub use pointer::{PointerError, VersionedPointer};
pub use registry::{DocumentHandle, TreeRegistry};
