//! Building trees from item streams and committing overlay edits.

use treedelta_core::{
    tree_from_items, tree_to_items, AddressableTree, ChangeBuffer, InsertPosition, Item, Key,
    KeyIdentificationModel, KeyedTree, NodeContent, SliceSource,
};

fn kim() -> KeyIdentificationModel {
    KeyIdentificationModel::id_attribute_string_keys()
}

fn build(items: &[Item]) -> KeyedTree<NodeContent> {
    tree_from_items(&mut SliceSource::new(items), &kim()).unwrap()
}

#[test]
fn overlay_with_new_sibling_commits_with_documented_tie_break() {
    // Base: root R with one child A. Overlay: R with children [A, B].
    let mut base = build(&[
        Item::start_with_id("r", "R"),
        Item::start_with_id("a", "A"),
        Item::end("a"),
        Item::end("r"),
    ]);

    let mut buf = ChangeBuffer::from_base(&base);
    buf.overlay_mut()
        .insert(
            &Key::persistent("R"),
            InsertPosition::Last,
            Key::persistent("B"),
            NodeContent::Element(treedelta_core::StartTag::new("b")),
        )
        .unwrap();
    buf.apply(&mut base).unwrap();

    // B appended as last child, A untouched.
    assert_eq!(
        base.children(&Key::persistent("R")).unwrap(),
        &[Key::persistent("A"), Key::persistent("B")]
    );
    assert_eq!(
        base.parent(&Key::persistent("B")).unwrap(),
        Some(&Key::persistent("R"))
    );
}

#[test]
fn edited_tree_serializes_back_through_the_model() {
    let items = vec![
        Item::start_with_id("r", "R"),
        Item::start_with_id("a", "A"),
        Item::text("hello"),
        Item::end("a"),
        Item::end("r"),
    ];
    let mut tree = build(&items);

    let mut buf = ChangeBuffer::from_base(&tree);
    buf.overlay_mut().delete(&Key::persistent("A")).unwrap();
    buf.apply(&mut tree).unwrap();

    let mut out: Vec<Item> = Vec::new();
    tree_to_items(&tree, &kim(), &mut out);
    assert_eq!(out, vec![Item::start_with_id("r", "R"), Item::end("r")]);
}

#[test]
fn streamed_tree_keeps_sibling_order_end_to_end() {
    let items = vec![
        Item::start_with_id("r", "R"),
        Item::start_with_id("a", "A"),
        Item::end("a"),
        Item::text("mid"),
        Item::start_with_id("b", "B"),
        Item::end("b"),
        Item::end("r"),
    ];
    let tree = build(&items);
    let children = tree.children(&Key::persistent("R")).unwrap();
    assert_eq!(children.len(), 3);
    assert_eq!(children[0], Key::persistent("A"));
    assert!(children[1].is_transient());
    assert_eq!(children[2], Key::persistent("B"));

    let mut out: Vec<Item> = Vec::new();
    tree_to_items(&tree, &kim(), &mut out);
    assert_eq!(out, items);
}
