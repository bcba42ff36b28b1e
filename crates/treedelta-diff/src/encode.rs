//! By-id delta encoding.
//!
//! Rewrites position-based segments into references that survive
//! re-serialization of the base document: each COPY/UPDATE start position is
//! resolved to the element's own identifier, or to the nearest identified
//! ancestor plus a sibling ordinal, by scanning the flattened base sequence
//! backward while tracking nesting depth. Encoding never fails on a
//! partially-identified document; references with no identified ancestor get
//! a clearly-marked placeholder.

use std::fmt;

use serde::de::{Deserializer, Error as DeError};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use tracing::debug;

use treedelta_core::{Item, Key, KeyError, KeyIdentificationModel};

use crate::segment::Segment;

const UNKNOWN_ID_PREFIX: &str = "UNKNOWN_ID+";

/// A stable reference into the base sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseRef {
    /// The referenced element carries its own identifier.
    Own(Key),
    /// `ordinal`-th child (in tree order, zero-based) of the nearest
    /// identified ancestor. Rendered `<id>.<ordinal>`.
    Child { ancestor: Key, ordinal: usize },
    /// No identified ancestor encloses the position; the payload is the
    /// offset within the originating segment. Portable only against the
    /// exact same base serialization.
    Unknown(usize),
}

impl fmt::Display for BaseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseRef::Own(key) => write!(f, "{}", key.serialized()),
            BaseRef::Child { ancestor, ordinal } => {
                write!(f, "{}.{ordinal}", ancestor.serialized())
            }
            BaseRef::Unknown(offset) => write!(f, "{UNKNOWN_ID_PREFIX}{offset}"),
        }
    }
}

impl Serialize for BaseRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BaseRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if let Some(rest) = s.strip_prefix(UNKNOWN_ID_PREFIX) {
            let offset = rest
                .parse()
                .map_err(|_| D::Error::custom("malformed placeholder reference"))?;
            return Ok(BaseRef::Unknown(offset));
        }
        if let Some((id, ordinal)) = s.rsplit_once('.') {
            if !id.is_empty() && !ordinal.is_empty() && ordinal.bytes().all(|b| b.is_ascii_digit())
            {
                let ordinal = ordinal
                    .parse()
                    .map_err(|_| D::Error::custom("ordinal out of range"))?;
                return Ok(BaseRef::Child {
                    ancestor: Key::persistent(id),
                    ordinal,
                });
            }
        }
        if s.is_empty() {
            return Err(D::Error::custom("empty base reference"));
        }
        Ok(BaseRef::Own(Key::persistent(s)))
    }
}

/// One record of an encoded delta. Concrete framing is external; these are
/// serde-serializable as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DiffOp<T> {
    CopyRef { target: BaseRef, len: usize },
    InsertLiteral { items: Vec<T> },
    UpdateRef { target: BaseRef, len: usize, items: Vec<T> },
}

/// Encodes segment lists against a flattened base sequence.
pub struct ByIdEncoder<'a> {
    base: &'a [Item],
    kim: &'a KeyIdentificationModel,
}

impl<'a> ByIdEncoder<'a> {
    pub fn new(base: &'a [Item], kim: &'a KeyIdentificationModel) -> ByIdEncoder<'a> {
        ByIdEncoder { base, kim }
    }

    /// Rewrites a segment list into by-id records.
    pub fn encode(&self, segments: &[Segment<Item>]) -> Result<Vec<DiffOp<Item>>, KeyError> {
        segments
            .iter()
            .map(|seg| match seg {
                Segment::Copy { len, dst_pos, .. } => Ok(DiffOp::CopyRef {
                    target: self.base_ref_target(*dst_pos, seg)?,
                    len: *len,
                }),
                Segment::Insert { items, .. } => Ok(DiffOp::InsertLiteral {
                    items: items.clone(),
                }),
                Segment::Update {
                    len,
                    items,
                    dst_pos,
                    ..
                } => Ok(DiffOp::UpdateRef {
                    target: self.base_ref_target(*dst_pos, seg)?,
                    len: *len,
                    items: items.clone(),
                }),
            })
            .collect()
    }

    /// Resolves the base position addressed by `dst_pos` within a COPY or
    /// UPDATE segment to a stable reference.
    ///
    /// The backward scan tracks nesting depth (end markers push, start
    /// markers pop) and counts completed siblings at depth zero; an
    /// identified start tag reached at depth zero is the ancestor, and the
    /// sibling count is the zero-based child ordinal under it. Passing an
    /// unidentified start tag climbs one level and restarts the count among
    /// that element's own siblings.
    ///
    /// # Panics
    ///
    /// Panics if `segment` is an INSERT; literal runs have no base position.
    pub fn base_ref_target(
        &self,
        dst_pos: usize,
        segment: &Segment<Item>,
    ) -> Result<BaseRef, KeyError> {
        let (offset, seg_dst) = match segment {
            Segment::Copy {
                offset, dst_pos, ..
            }
            | Segment::Update {
                offset, dst_pos, ..
            } => (*offset, *dst_pos),
            Segment::Insert { .. } => panic!("insert segments carry no base reference"),
        };
        let within = dst_pos - seg_dst;
        let pos = offset + within;

        if let item @ Item::Start(_) = &self.base[pos] {
            if let Some(key) = self.kim.identify(item)? {
                return Ok(BaseRef::Own(key));
            }
        }

        let mut depth: usize = if self.base[pos].is_end() { 1 } else { 0 };
        let mut count = 0usize;
        let mut i = pos;
        while i > 0 {
            i -= 1;
            match &self.base[i] {
                Item::End(_) => {
                    if depth == 0 {
                        count += 1;
                    }
                    depth += 1;
                }
                item @ Item::Start(_) => {
                    if depth > 0 {
                        depth -= 1;
                    } else if let Some(key) = self.kim.identify(item)? {
                        return Ok(BaseRef::Child {
                            ancestor: key,
                            ordinal: count,
                        });
                    } else {
                        count = 0;
                    }
                }
                Item::Text(_) => {
                    if depth == 0 {
                        count += 1;
                    }
                }
            }
        }
        debug!(pos, "no identified ancestor, emitting placeholder");
        Ok(BaseRef::Unknown(within))
    }
}
