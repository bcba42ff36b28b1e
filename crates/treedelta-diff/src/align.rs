//! Deterministic sequence alignment.
//!
//! Myers' O(ND) greedy shortest-edit-script search over item equality.
//! Matching runs become COPY segments; a paired delete/insert gap of equal
//! length collapses into one UPDATE; remaining destination-only gaps become
//! INSERTs and base-only gaps are implicit deletes. The standard diagonal
//! preference makes the output deterministic and favors maximal copied
//! length at the earliest base offset.

use crate::segment::Segment;

/// Aligns `dst` against `base` into a contiguous segment list.
///
/// Total over all inputs, including empty sequences: an empty destination
/// yields an empty list, an empty base yields a single INSERT, and identical
/// sequences yield a single COPY.
pub fn align<T: PartialEq + Clone>(base: &[T], dst: &[T]) -> Vec<Segment<T>> {
    if dst.is_empty() {
        return Vec::new();
    }
    if base.is_empty() {
        return vec![Segment::Insert {
            items: dst.to_vec(),
            dst_pos: 0,
        }];
    }

    let matches = myers_matches(base, dst);
    let mut segments = Vec::new();
    let mut bi = 0;
    let mut di = 0;
    let mut mi = 0;
    while mi < matches.len() {
        let (mb, md) = matches[mi];
        if mb > bi || md > di {
            push_gap(&mut segments, dst, bi, mb, di, md);
        }
        let mut len = 1;
        while mi + len < matches.len() && matches[mi + len] == (mb + len, md + len) {
            len += 1;
        }
        segments.push(Segment::Copy {
            offset: mb,
            len,
            dst_pos: md,
        });
        bi = mb + len;
        di = md + len;
        mi += len;
    }
    if bi < base.len() || di < dst.len() {
        push_gap(&mut segments, dst, bi, base.len(), di, dst.len());
    }
    segments
}

/// Emits the segment for one non-matching gap, if any destination items are
/// involved. An equal-length gap on both sides is an UPDATE; a pure base gap
/// is an implicit delete and emits nothing.
fn push_gap<T: Clone>(
    segments: &mut Vec<Segment<T>>,
    dst: &[T],
    b0: usize,
    b1: usize,
    d0: usize,
    d1: usize,
) {
    let deleted = b1 - b0;
    let inserted = d1 - d0;
    if inserted == 0 {
        return;
    }
    if deleted == inserted {
        segments.push(Segment::Update {
            offset: b0,
            len: deleted,
            items: dst[d0..d1].to_vec(),
            dst_pos: d0,
        });
    } else {
        segments.push(Segment::Insert {
            items: dst[d0..d1].to_vec(),
            dst_pos: d0,
        });
    }
}

/// Matched index pairs of the Myers LCS, in increasing order on both sides.
///
/// Callers guarantee both slices are non-empty.
fn myers_matches<T: PartialEq>(a: &[T], b: &[T]) -> Vec<(usize, usize)> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max = n + m;
    let mut v = vec![0isize; 2 * max as usize + 1];
    let mut trace: Vec<Vec<isize>> = Vec::new();

    'search: for d in 0..=max {
        trace.push(v.clone());
        let mut k = -d;
        while k <= d {
            let i = (k + max) as usize;
            let mut x = if k == -d || (k != d && v[i - 1] < v[i + 1]) {
                v[i + 1]
            } else {
                v[i - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[i] = x;
            if x >= n && y >= m {
                break 'search;
            }
            k += 2;
        }
    }

    let mut matches = Vec::new();
    let mut x = n;
    let mut y = m;
    for (d, v) in trace.iter().enumerate().rev() {
        let d = d as isize;
        let k = x - y;
        let i = (k + max) as usize;
        let prev_k = if k == -d || (k != d && v[i - 1] < v[i + 1]) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v[(prev_k + max) as usize];
        let prev_y = prev_x - prev_k;
        while x > prev_x && y > prev_y {
            matches.push(((x - 1) as usize, (y - 1) as usize));
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            x = prev_x;
            y = prev_y;
        }
    }
    matches.reverse();
    matches
}
