//! Pluggable key and identification policies.
//!
//! Two independent capabilities, composed into one value so callers never
//! need to know which concrete policy is active: a [`KeyModel`] turns raw
//! content into a [`Key`], and an [`IdentificationModel`] extracts a key
//! from an already-encoded item or tags an item with one for persistence.

use crate::item::Item;
use crate::key::{Key, KeyError};

/// Converts raw content into a canonical key for a freshly created node.
pub trait KeyModel {
    fn make_key(&self, raw: &str) -> Result<Key, KeyError>;
}

/// Extracts keys from encoded items and tags items with keys.
///
/// The key model to use is passed in, so one identification policy can be
/// combined with different keying policies.
pub trait IdentificationModel {
    /// Extracts the key encoded in `item`, if any.
    fn identify(&self, item: &Item, model: &dyn KeyModel) -> Result<Option<Key>, KeyError>;

    /// Returns `item` tagged so that `identify` recovers `key` from it.
    fn tag(&self, item: Item, key: &Key, model: &dyn KeyModel) -> Item;
}

/// Composed key + identification policy.
pub struct KeyIdentificationModel {
    km: Box<dyn KeyModel>,
    im: Box<dyn IdentificationModel>,
}

impl KeyIdentificationModel {
    pub fn new(km: Box<dyn KeyModel>, im: Box<dyn IdentificationModel>) -> KeyIdentificationModel {
        KeyIdentificationModel { km, im }
    }

    /// String keys encoded in `id` attributes. The standard policy.
    pub fn id_attribute_string_keys() -> KeyIdentificationModel {
        KeyIdentificationModel::new(
            Box::new(StringKeyModel),
            Box::new(IdAttributeIdentification),
        )
    }

    pub fn make_key(&self, raw: &str) -> Result<Key, KeyError> {
        self.km.make_key(raw)
    }

    /// Identify `item` using this model's own key model.
    pub fn identify(&self, item: &Item) -> Result<Option<Key>, KeyError> {
        self.im.identify(item, self.km.as_ref())
    }

    /// Tag `item` using this model's own key model.
    pub fn tag(&self, item: Item, key: &Key) -> Item {
        self.im.tag(item, key, self.km.as_ref())
    }
}

/// Persistent string keys taken verbatim from content.
pub struct StringKeyModel;

impl KeyModel for StringKeyModel {
    fn make_key(&self, raw: &str) -> Result<Key, KeyError> {
        if raw.is_empty() {
            return Err(KeyError::InvalidContent("empty key text".to_owned()));
        }
        Ok(Key::persistent(raw))
    }
}

/// Identity-only keys; every call mints a fresh one.
pub struct TransientKeyModel;

impl KeyModel for TransientKeyModel {
    fn make_key(&self, _raw: &str) -> Result<Key, KeyError> {
        Ok(Key::transient())
    }
}

/// Keys carried in the `id` attribute of start tags.
pub struct IdAttributeIdentification;

impl IdentificationModel for IdAttributeIdentification {
    fn identify(&self, item: &Item, model: &dyn KeyModel) -> Result<Option<Key>, KeyError> {
        match item {
            Item::Start(tag) => match tag.attribute("id") {
                Some(value) => model.make_key(value).map(Some),
                None => Ok(None),
            },
            _ => Ok(None),
        }
    }

    fn tag(&self, item: Item, key: &Key, _model: &dyn KeyModel) -> Item {
        match item {
            Item::Start(mut tag) => {
                tag.set_attribute("id", key.serialized());
                Item::Start(tag)
            }
            other => other,
        }
    }
}
