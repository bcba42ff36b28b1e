//! Round-trip and end-to-end properties of the diff pipeline.

use proptest::prelude::*;

use treedelta_core::{Item, KeyIdentificationModel};
use treedelta_diff::{align, apply_segments, ByIdEncoder, DiffOp, Segment};

proptest! {
    #[test]
    fn align_round_trips_arbitrary_sequences(
        base in prop::collection::vec(0u8..4, 0..24),
        dst in prop::collection::vec(0u8..4, 0..24),
    ) {
        let segments = align(&base, &dst);
        prop_assert_eq!(apply_segments(&base, &segments), dst);
    }

    #[test]
    fn segment_lists_are_contiguous(
        base in prop::collection::vec(0u8..4, 0..24),
        dst in prop::collection::vec(0u8..4, 0..24),
    ) {
        let mut next = 0;
        for seg in align(&base, &dst) {
            prop_assert_eq!(seg.dst_pos(), next);
            next += seg.dst_len();
        }
        prop_assert_eq!(next, dst.len());
    }
}

fn doc(second_child: &str) -> Vec<Item> {
    vec![
        Item::start_with_id("root", "r1"),
        Item::start("a"),
        Item::text("hello"),
        Item::end("a"),
        Item::start(second_child),
        Item::end(second_child),
        Item::end("root"),
    ]
}

#[test]
fn aligned_documents_encode_with_stable_references() {
    let base = doc("b");
    let dst = doc("c");
    let segments = align(&base, &dst);
    assert_eq!(apply_segments(&base, &segments), dst);

    let kim = KeyIdentificationModel::id_attribute_string_keys();
    let ops = ByIdEncoder::new(&base, &kim).encode(&segments).unwrap();
    // The leading run is copied by reference to the identified root.
    assert!(matches!(&ops[0], DiffOp::CopyRef { target, .. }
        if target.to_string() == "r1"));
    // Every copy or update resolved to a reference without failing.
    assert_eq!(ops.len(), segments.len());
}

#[test]
fn renamed_element_becomes_update_against_ancestor_reference() {
    let base = doc("b");
    let mut dst = doc("b");
    dst[2] = Item::text("goodbye");
    let segments = align(&base, &dst);
    assert!(segments.iter().any(|s| matches!(
        s,
        Segment::Update { offset: 2, len: 1, .. }
    )));

    let kim = KeyIdentificationModel::id_attribute_string_keys();
    let ops = ByIdEncoder::new(&base, &kim).encode(&segments).unwrap();
    assert!(ops.iter().any(|op| matches!(op, DiffOp::UpdateRef { target, .. }
        if target.to_string() == "r1.0")));
}
