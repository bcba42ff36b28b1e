//! treedelta-core - Identifier-addressable tree model.
//!
//! The core model behind treedelta: documents cross in as flattened item
//! sequences ([`Item`]), are built into keyed trees ([`KeyedTree`]) whose
//! nodes are addressed by stable identifiers ([`Key`]), and are edited
//! through transactional overlay commits ([`ChangeBuffer`]).
//!
//! Keying and identification policy is pluggable through
//! [`KeyIdentificationModel`]; the standard policy reads and writes string
//! keys in `id` attributes.

pub mod changebuf;
pub mod item;
pub mod key;
pub mod model;
pub mod tree;

pub use changebuf::{apply_overlay, ChangeBuffer};
pub use item::{
    tree_from_items, tree_to_items, EndTag, Item, ItemSource, ItemTarget, NodeContent,
    SliceSource, StartTag, StreamError,
};
pub use key::{Key, KeyError};
pub use model::{
    IdAttributeIdentification, IdentificationModel, KeyIdentificationModel, KeyModel,
    StringKeyModel, TransientKeyModel,
};
pub use tree::{AddressableTree, InsertPosition, KeyedTree, TreeError};
