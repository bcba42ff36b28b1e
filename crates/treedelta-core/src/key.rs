//! Stable node identifiers.
//!
//! A [`Key`] names a tree node. Persistent keys are serializable and survive
//! re-serialization of the document; transient keys are identity-only values
//! minted for freshly created nodes and are valid only inside one process.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::{Deserializer, Error as DeError};
use serde::ser::{Error as SerError, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

static NEXT_TRANSIENT: AtomicU64 = AtomicU64::new(1);

/// Error produced by key construction in a [`KeyModel`](crate::model::KeyModel).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("cannot make key from content: {0}")]
    InvalidContent(String),
}

/// A stable node identifier.
///
/// Sibling order, parenthood and addressability all hang off keys, so a key
/// must never change identity while its node is in a tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Serializable, comparable key derived from node content.
    Persistent(String),
    /// In-memory identity. Never valid in a persisted representation.
    Transient(u64),
}

impl Key {
    /// Creates a persistent key from its serialized form.
    pub fn persistent(id: impl Into<String>) -> Key {
        Key::Persistent(id.into())
    }

    /// Mints a fresh transient key, unique within this process.
    pub fn transient() -> Key {
        Key::Transient(NEXT_TRANSIENT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Key::Transient(_))
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, Key::Persistent(_))
    }

    /// Returns the serialized text of a persistent key.
    ///
    /// # Panics
    ///
    /// Panics for transient keys. A transient key reaching a context that
    /// needs its textual form is a programming defect, not a recoverable
    /// condition; it must fail loudly rather than leak a bogus identifier
    /// into external state.
    pub fn serialized(&self) -> &str {
        match self {
            Key::Persistent(s) => s,
            Key::Transient(n) => panic!("tried to serialize transient key t-{n}"),
        }
    }
}

impl fmt::Display for Key {
    /// Diagnostic form. Transient keys render as `t-<n>`; use
    /// [`Key::serialized`] for anything that leaves the process.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Persistent(s) => f.write_str(s),
            Key::Transient(n) => write!(f, "t-{n}"),
        }
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Key::Persistent(s) => serializer.serialize_str(s),
            Key::Transient(_) => Err(S::Error::custom(
                "transient key escaped into a serialized representation",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Err(D::Error::custom("empty key"));
        }
        Ok(Key::Persistent(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_keys_are_unique() {
        let a = Key::transient();
        let b = Key::transient();
        assert_ne!(a, b);
    }

    #[test]
    fn persistent_keys_compare_by_value() {
        assert_eq!(Key::persistent("a"), Key::persistent("a"));
        assert_ne!(Key::persistent("a"), Key::persistent("b"));
    }

    #[test]
    #[should_panic(expected = "transient key")]
    fn serializing_transient_key_panics() {
        let _ = Key::transient().serialized();
    }

    #[test]
    fn serde_refuses_transient_keys() {
        assert!(serde_json::to_string(&Key::transient()).is_err());
        assert_eq!(
            serde_json::to_string(&Key::persistent("r1")).unwrap(),
            "\"r1\""
        );
    }
}
