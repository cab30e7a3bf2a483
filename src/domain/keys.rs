//! Attribute keys and the node-kind capability interface.
//!
//! Every node kind declares an ordered list of keys. Copying, archiving and
//! describing are written once against that list, so a kind that adds fields
//! only has to declare them here. A field missing from `extension_keys` is
//! silently excluded from copy, archive and describe.

use std::fmt;

use crate::domain::error::{NodeError, NodeResult};
use crate::domain::value::AttributeValue;

pub const TITLE_KEY: &str = "title";
pub const PROPERTIES_KEY: &str = "properties";
pub const CHILDREN_KEY: &str = "children";
pub const IS_LEAF_KEY: &str = "isLeaf";

/// Where a key's value lives.
#[derive(Clone, Copy)]
enum KeySlot {
    /// Plain value with its reset default
    Value(fn() -> AttributeValue),
    /// The ordered children sequence, handled structurally
    Children,
}

/// Named attribute subject to generic copy, archive and describe handling.
#[derive(Clone, Copy)]
pub struct AttributeKey {
    name: &'static str,
    slot: KeySlot,
}

impl AttributeKey {
    /// Value key with the default used on reset and on missing archive entries.
    pub const fn value(name: &'static str, default: fn() -> AttributeValue) -> Self {
        Self {
            name,
            slot: KeySlot::Value(default),
        }
    }

    const fn children(name: &'static str) -> Self {
        Self {
            name,
            slot: KeySlot::Children,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_children(&self) -> bool {
        matches!(self.slot, KeySlot::Children)
    }

    /// Default value, `None` for the children key.
    pub fn default_value(&self) -> Option<AttributeValue> {
        match self.slot {
            KeySlot::Value(default) => Some(default()),
            KeySlot::Children => None,
        }
    }
}

impl PartialEq for AttributeKey {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.is_children() == other.is_children()
    }
}

impl Eq for AttributeKey {}

impl fmt::Debug for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AttributeKey").field(&self.name).finish()
    }
}

pub const TITLE: AttributeKey = AttributeKey::value(TITLE_KEY, AttributeValue::empty_text);
pub const PROPERTIES: AttributeKey = AttributeKey::value(PROPERTIES_KEY, AttributeValue::empty_map);
pub const CHILDREN: AttributeKey = AttributeKey::children(CHILDREN_KEY);
pub const IS_LEAF: AttributeKey = AttributeKey::value(IS_LEAF_KEY, AttributeValue::no);

/// Keys every kind starts with, in archive order.
pub const BASE_MUTABLE_KEYS: [AttributeKey; 4] = [TITLE, PROPERTIES, CHILDREN, IS_LEAF];

/// Base keys shown by `describe`; children are controlled by the describe flag.
pub const BASE_DESCRIBABLE_KEYS: [AttributeKey; 3] = [TITLE, PROPERTIES, IS_LEAF];

/// Capability interface implemented by every node kind.
///
/// A kind is the payload attached to each node; the shared tree mechanics
/// stay in [`Node`](crate::domain::arena::Node). Implementors declare their
/// own keys in `extension_keys` and expose them through `attribute` and
/// `set_attribute`. `mutable_keys` and `describable_keys` prepend the base
/// keys; overriding them must keep the base keys first.
pub trait NodeKind: Clone + Default + fmt::Debug {
    /// Name written into archives and descriptions.
    const KIND_NAME: &'static str;

    /// Keys added by this kind, in order.
    fn extension_keys() -> Vec<AttributeKey> {
        Vec::new()
    }

    /// Names of extension keys left out of human-readable descriptions.
    fn undescribed_keys() -> &'static [&'static str] {
        &[]
    }

    fn mutable_keys() -> Vec<AttributeKey> {
        BASE_MUTABLE_KEYS
            .iter()
            .copied()
            .chain(Self::extension_keys())
            .collect()
    }

    fn describable_keys() -> Vec<AttributeKey> {
        let hidden = Self::undescribed_keys();
        BASE_DESCRIBABLE_KEYS
            .iter()
            .copied()
            .chain(
                Self::extension_keys()
                    .into_iter()
                    .filter(|k| !hidden.contains(&k.name())),
            )
            .collect()
    }

    /// Current value of an extension key.
    fn attribute(&self, _name: &str) -> Option<AttributeValue> {
        None
    }

    /// Store a value under an extension key.
    fn set_attribute(&mut self, name: &str, _value: AttributeValue) -> NodeResult<()> {
        Err(NodeError::UnknownAttribute(name.to_string()))
    }
}

/// Kind without extension attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlainKind;

impl NodeKind for PlainKind {
    const KIND_NAME: &'static str = "Node";
}

/// Look up a key by name in a kind's mutable key list.
pub fn find_key<K: NodeKind>(name: &str) -> Option<AttributeKey> {
    K::mutable_keys().into_iter().find(|k| k.name() == name)
}
