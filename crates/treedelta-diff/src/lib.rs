//! treedelta-diff - Sequence alignment and by-id delta encoding.
//!
//! Turns two flattened item sequences into a compact segment list
//! ([`align`]) and rewrites the position-based segments into stable by-id
//! references ([`ByIdEncoder`]) that stay valid across re-serializations of
//! the base document.

pub mod align;
pub mod encode;
pub mod segment;

pub use align::align;
pub use encode::{BaseRef, ByIdEncoder, DiffOp};
pub use segment::{apply_segments, Segment};
