//! Diff segments between two ordered sequences.

use serde::{Deserialize, Serialize};

/// One contiguous diff operation against a base sequence.
///
/// A segment list partitions the destination sequence contiguously in
/// strictly increasing `dst_pos`; base runs absent from the list are
/// implicitly deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment<T> {
    /// A run copied verbatim from the base.
    Copy {
        offset: usize,
        len: usize,
        dst_pos: usize,
    },
    /// A run that exists only in the destination.
    Insert { items: Vec<T>, dst_pos: usize },
    /// An equal-length base run replaced in place.
    Update {
        offset: usize,
        len: usize,
        items: Vec<T>,
        dst_pos: usize,
    },
}

impl<T> Segment<T> {
    pub fn dst_pos(&self) -> usize {
        match self {
            Segment::Copy { dst_pos, .. }
            | Segment::Insert { dst_pos, .. }
            | Segment::Update { dst_pos, .. } => *dst_pos,
        }
    }

    /// Number of destination items this segment produces.
    pub fn dst_len(&self) -> usize {
        match self {
            Segment::Copy { len, .. } => *len,
            Segment::Insert { items, .. } | Segment::Update { items, .. } => items.len(),
        }
    }
}

/// Reconstructs the destination sequence from the base and a segment list.
pub fn apply_segments<T: Clone>(base: &[T], segments: &[Segment<T>]) -> Vec<T> {
    let mut out = Vec::new();
    for seg in segments {
        debug_assert_eq!(seg.dst_pos(), out.len(), "segment list must be contiguous");
        match seg {
            Segment::Copy { offset, len, .. } => {
                out.extend_from_slice(&base[*offset..*offset + *len]);
            }
            Segment::Insert { items, .. } | Segment::Update { items, .. } => {
                out.extend_from_slice(items);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_reconstructs_from_mixed_segments() {
        let base = vec!['a', 'b', 'c', 'd'];
        let segments = vec![
            Segment::Copy {
                offset: 0,
                len: 2,
                dst_pos: 0,
            },
            Segment::Insert {
                items: vec!['x'],
                dst_pos: 2,
            },
            Segment::Update {
                offset: 3,
                len: 1,
                items: vec!['z'],
                dst_pos: 3,
            },
        ];
        assert_eq!(apply_segments(&base, &segments), vec!['a', 'b', 'x', 'z']);
    }

    #[test]
    fn empty_segment_list_yields_empty_destination() {
        let base = vec![1, 2, 3];
        assert_eq!(apply_segments::<i32>(&base, &[]), Vec::<i32>::new());
    }
}
