//! Flattened document items and the stream boundary.
//!
//! A document crosses into the core as an ordered sequence of [`Item`]s
//! (element start, element end, text). Concrete parsing and serialization
//! live outside the core; only the sequence shape is fixed here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::key::{Key, KeyError};
use crate::model::KeyIdentificationModel;
use crate::tree::{AddressableTree, InsertPosition, KeyedTree};

/// Element start marker with its ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartTag {
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

impl StartTag {
    pub fn new(name: impl Into<String>) -> StartTag {
        StartTag {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute, replacing an existing one of the same name.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.attributes.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.attributes.push((name, value));
        }
    }
}

/// Element end marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndTag {
    pub name: String,
}

impl EndTag {
    pub fn new(name: impl Into<String>) -> EndTag {
        EndTag { name: name.into() }
    }
}

/// One item of a flattened document sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Item {
    Start(StartTag),
    End(EndTag),
    Text(String),
}

impl Item {
    /// Start item without attributes.
    pub fn start(name: impl Into<String>) -> Item {
        Item::Start(StartTag::new(name))
    }

    /// Start item carrying an `id` attribute.
    pub fn start_with_id(name: impl Into<String>, id: impl Into<String>) -> Item {
        let mut tag = StartTag::new(name);
        tag.set_attribute("id", id);
        Item::Start(tag)
    }

    pub fn end(name: impl Into<String>) -> Item {
        Item::End(EndTag::new(name))
    }

    pub fn text(text: impl Into<String>) -> Item {
        Item::Text(text.into())
    }

    pub fn is_start(&self) -> bool {
        matches!(self, Item::Start(_))
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Item::End(_))
    }
}

/// Pull side of the item stream boundary.
pub trait ItemSource {
    fn next_item(&mut self) -> Option<Item>;
}

/// Push side of the item stream boundary.
pub trait ItemTarget {
    fn append(&mut self, item: Item);
}

impl ItemTarget for Vec<Item> {
    fn append(&mut self, item: Item) {
        self.push(item);
    }
}

/// [`ItemSource`] over a borrowed slice.
#[derive(Debug)]
pub struct SliceSource<'a> {
    items: &'a [Item],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(items: &'a [Item]) -> SliceSource<'a> {
        SliceSource { items, pos: 0 }
    }
}

impl ItemSource for SliceSource<'_> {
    fn next_item(&mut self) -> Option<Item> {
        let item = self.items.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }
}

/// Content payload of a tree node built from an item stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeContent {
    Element(StartTag),
    Text(String),
}

/// Error for malformed item streams crossing into the tree model.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("unbalanced item stream")]
    Unbalanced,
    #[error("item stream does not start with an element")]
    NoRootElement,
    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Builds a keyed tree from a flattened item sequence.
///
/// Element identity comes from the identification model; elements and text
/// without an encoded identifier get fresh transient keys.
pub fn tree_from_items(
    source: &mut dyn ItemSource,
    kim: &KeyIdentificationModel,
) -> Result<KeyedTree<NodeContent>, StreamError> {
    let first = source.next_item().ok_or(StreamError::NoRootElement)?;
    let root_tag = match first {
        Item::Start(tag) => tag,
        _ => return Err(StreamError::NoRootElement),
    };
    let root_key = kim
        .identify(&Item::Start(root_tag.clone()))?
        .unwrap_or_else(Key::transient);
    let mut tree = KeyedTree::new(root_key.clone(), NodeContent::Element(root_tag));
    let mut stack = vec![root_key];

    while let Some(item) = source.next_item() {
        match item {
            Item::Start(tag) => {
                let key = kim
                    .identify(&Item::Start(tag.clone()))?
                    .unwrap_or_else(Key::transient);
                let parent = stack.last().ok_or(StreamError::Unbalanced)?.clone();
                tree.insert(
                    &parent,
                    InsertPosition::Last,
                    key.clone(),
                    NodeContent::Element(tag),
                )
                .expect("parent came off the build stack");
                stack.push(key);
            }
            Item::End(_) => {
                stack.pop().ok_or(StreamError::Unbalanced)?;
            }
            Item::Text(text) => {
                let parent = stack.last().ok_or(StreamError::Unbalanced)?.clone();
                tree.insert(
                    &parent,
                    InsertPosition::Last,
                    Key::transient(),
                    NodeContent::Text(text),
                )
                .expect("parent came off the build stack");
            }
        }
    }
    if !stack.is_empty() {
        return Err(StreamError::Unbalanced);
    }
    Ok(tree)
}

/// Flattens a keyed tree back into an item sequence.
///
/// Nodes with persistent keys are tagged through the identification model so
/// the identifier survives the round trip; transient keys are identity-only
/// and deliberately leave no trace in the output.
pub fn tree_to_items(
    tree: &KeyedTree<NodeContent>,
    kim: &KeyIdentificationModel,
    target: &mut dyn ItemTarget,
) {
    emit_subtree(tree, tree.root_key().clone(), kim, target);
}

fn emit_subtree(
    tree: &KeyedTree<NodeContent>,
    key: Key,
    kim: &KeyIdentificationModel,
    target: &mut dyn ItemTarget,
) {
    let content = tree.get(&key).expect("traversal stays inside the tree");
    match content {
        NodeContent::Element(tag) => {
            let start = Item::Start(tag.clone());
            let start = if key.is_persistent() {
                kim.tag(start, &key)
            } else {
                start
            };
            target.append(start);
            let children: Vec<Key> = tree
                .children(&key)
                .expect("traversal stays inside the tree")
                .to_vec();
            for child in children {
                emit_subtree(tree, child, kim, target);
            }
            target.append(Item::End(EndTag::new(tag.name.clone())));
        }
        NodeContent::Text(text) => target.append(Item::Text(text.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::KeyIdentificationModel;

    fn doc() -> Vec<Item> {
        vec![
            Item::start_with_id("root", "r1"),
            Item::start("a"),
            Item::text("hello"),
            Item::end("a"),
            Item::start_with_id("b", "b1"),
            Item::end("b"),
            Item::end("root"),
        ]
    }

    #[test]
    fn builds_tree_and_round_trips_identified_elements() {
        let kim = KeyIdentificationModel::id_attribute_string_keys();
        let items = doc();
        let tree = tree_from_items(&mut SliceSource::new(&items), &kim).unwrap();

        let r1 = Key::persistent("r1");
        assert!(tree.contains(&r1));
        assert_eq!(tree.children(&r1).unwrap().len(), 2);

        let mut out = Vec::new();
        tree_to_items(&tree, &kim, &mut out);
        // Unidentified elements come back without ids, identified ones keep
        // theirs; the shape is otherwise unchanged.
        assert_eq!(out.len(), items.len());
        assert_eq!(out[0], items[0]);
        assert_eq!(out[4], items[4]);
    }

    #[test]
    fn unbalanced_stream_is_rejected() {
        let kim = KeyIdentificationModel::id_attribute_string_keys();
        let items = vec![Item::start("root"), Item::start("a"), Item::end("a")];
        let err = tree_from_items(&mut SliceSource::new(&items), &kim);
        assert!(matches!(err, Err(StreamError::Unbalanced)));
    }

    #[test]
    fn text_before_any_element_is_rejected() {
        let kim = KeyIdentificationModel::id_attribute_string_keys();
        let items = vec![Item::text("stray")];
        let err = tree_from_items(&mut SliceSource::new(&items), &kim);
        assert!(matches!(err, Err(StreamError::NoRootElement)));
    }
}
