//! Conversion to and from a primitive-only interchange form.
//!
//! Each node maps to a JSON object:
//!
//! ```text
//! { "title": string, "properties": { ... }?, "isLeaf": bool, "children": [ node, ... ] }
//! ```
//!
//! `properties` is written when non-empty, or when the node was decoded from
//! a dictionary that carried the key. Property values must be strings,
//! numbers, booleans, arrays or objects; timestamps and non-finite floats have
//! no primitive form and are handled per [`CodecStrictness`].
//!
//! Encoding and decoding walk the tree with explicit stacks, but
//! `serde_json::Value` itself drops and compares recursively. Trees deeper
//! than a few tens of thousands of levels can overflow the thread stack once
//! the encoded value is dropped; use [`NodeArena::archive`] for those.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::{instrument, warn};

use crate::domain::arena::{NodeArena, NodeId};
use crate::domain::error::{NodeError, NodeResult};
use crate::domain::keys::{NodeKind, CHILDREN_KEY, IS_LEAF_KEY, PROPERTIES_KEY, TITLE_KEY};
use crate::domain::value::{AttributeValue, Properties};

/// What to do with a property value that has no primitive form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecStrictness {
    /// Fail with an encoding error
    #[default]
    Strict,
    /// Leave the value out
    Lenient,
}

fn to_primitive(
    key: &str,
    value: &AttributeValue,
    strictness: CodecStrictness,
) -> NodeResult<Option<Value>> {
    let primitive = match value {
        AttributeValue::Text(s) => Some(Value::String(s.clone())),
        AttributeValue::Integer(i) => Some(Value::Number((*i).into())),
        AttributeValue::Unsigned(u) => Some(Value::Number((*u).into())),
        AttributeValue::Float(x) => Number::from_f64(*x).map(Value::Number),
        AttributeValue::Bool(b) => Some(Value::Bool(*b)),
        AttributeValue::Timestamp(_) => None,
        AttributeValue::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if let Some(v) = to_primitive(key, item, strictness)? {
                    out.push(v);
                }
            }
            Some(Value::Array(out))
        }
        AttributeValue::Map(map) => Some(Value::Object(properties_to_object(map, strictness)?)),
    };

    match (primitive, strictness) {
        (Some(v), _) => Ok(Some(v)),
        (None, CodecStrictness::Strict) => Err(NodeError::encoding(format!(
            "property '{}' holds a {} value with no primitive form",
            key,
            value.type_name()
        ))),
        (None, CodecStrictness::Lenient) => {
            warn!("omitting property '{}': {} has no primitive form", key, value.type_name());
            Ok(None)
        }
    }
}

fn properties_to_object(
    properties: &Properties,
    strictness: CodecStrictness,
) -> NodeResult<Map<String, Value>> {
    let mut object = Map::new();
    for (key, value) in properties {
        if let Some(v) = to_primitive(key, value, strictness)? {
            object.insert(key.clone(), v);
        }
    }
    Ok(object)
}

fn from_primitive(key: &str, value: &Value) -> NodeResult<AttributeValue> {
    match value {
        Value::String(s) => Ok(AttributeValue::Text(s.clone())),
        Value::Bool(b) => Ok(AttributeValue::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(AttributeValue::Integer(i))
            } else if let Some(u) = n.as_u64() {
                Ok(AttributeValue::Unsigned(u))
            } else {
                n.as_f64()
                    .map(AttributeValue::Float)
                    .ok_or_else(|| NodeError::encoding(format!("property '{}': bad number", key)))
            }
        }
        Value::Array(items) => items
            .iter()
            .map(|item| from_primitive(key, item))
            .collect::<NodeResult<Vec<_>>>()
            .map(AttributeValue::List),
        Value::Object(object) => object_to_properties(object).map(AttributeValue::Map),
        Value::Null => Err(NodeError::encoding(format!(
            "property '{}': null is not a primitive value",
            key
        ))),
    }
}

fn object_to_properties(object: &Map<String, Value>) -> NodeResult<Properties> {
    object
        .iter()
        .map(|(k, v)| Ok((k.clone(), from_primitive(k, v)?)))
        .collect()
}

/// Required node fields, checked before anything is created.
struct NodeFields<'a> {
    title: &'a str,
    is_leaf: bool,
    /// `None` when the key was absent
    properties: Option<Properties>,
    children: &'a [Value],
}

fn read_fields(dict: &Value) -> NodeResult<NodeFields<'_>> {
    let object = dict
        .as_object()
        .ok_or_else(|| NodeError::encoding("node must be an object"))?;
    let title = object
        .get(TITLE_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| NodeError::encoding("missing or non-string 'title'"))?;
    let is_leaf = object
        .get(IS_LEAF_KEY)
        .and_then(Value::as_bool)
        .ok_or_else(|| NodeError::encoding("missing or non-bool 'isLeaf'"))?;
    let children = object
        .get(CHILDREN_KEY)
        .and_then(Value::as_array)
        .ok_or_else(|| NodeError::encoding("missing or non-array 'children'"))?;
    let properties = match object.get(PROPERTIES_KEY) {
        None => None,
        Some(Value::Object(map)) => Some(object_to_properties(map)?),
        Some(_) => return Err(NodeError::encoding("'properties' must be an object")),
    };
    if is_leaf && !children.is_empty() {
        return Err(NodeError::encoding(format!(
            "leaf '{}' cannot hold children",
            title
        )));
    }
    Ok(NodeFields {
        title,
        is_leaf,
        properties,
        children,
    })
}

impl<K: NodeKind> NodeArena<K> {
    /// Interchange form of the subtree at `id`, failing on values without a
    /// primitive form.
    pub fn dictionary_representation(&self, id: NodeId) -> NodeResult<Value> {
        self.dictionary_representation_with(id, CodecStrictness::Strict)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn dictionary_representation_with(
        &self,
        id: NodeId,
        strictness: CodecStrictness,
    ) -> NodeResult<Value> {
        self.node(id)?;
        let mut built: HashMap<NodeId, Value> = HashMap::new();
        for (nid, node) in self.iter_postorder(id) {
            let children: Vec<Value> = node
                .children()
                .iter()
                .filter_map(|c| built.remove(c))
                .collect();

            let mut object = Map::new();
            object.insert(TITLE_KEY.into(), Value::String(node.title().to_string()));
            let properties = properties_to_object(node.properties(), strictness)?;
            if !properties.is_empty() || node.properties_declared {
                object.insert(PROPERTIES_KEY.into(), Value::Object(properties));
            }
            object.insert(IS_LEAF_KEY.into(), Value::Bool(node.is_leaf()));
            object.insert(CHILDREN_KEY.into(), Value::Array(children));
            built.insert(nid, Value::Object(object));
        }
        built
            .remove(&id)
            .ok_or_else(|| NodeError::encoding("root missing from encoded subtree"))
    }

    /// Build a new root from its interchange form.
    ///
    /// Fails with [`NodeError::EncodingError`] when a required field is
    /// missing or of the wrong primitive kind; nothing is left in the arena
    /// on failure.
    #[instrument(level = "debug", skip(self, dict))]
    pub fn from_dictionary(&mut self, dict: &Value) -> NodeResult<NodeId> {
        let mut root = None;
        let result = self.decode_dictionary(dict, &mut root);
        if result.is_err() {
            if let Some(root) = root {
                let _ = self.remove_subtree(root);
            }
        }
        result
    }

    fn decode_dictionary(&mut self, dict: &Value, root: &mut Option<NodeId>) -> NodeResult<NodeId> {
        let mut stack: Vec<(&Value, Option<NodeId>)> = vec![(dict, None)];
        while let Some((value, parent)) = stack.pop() {
            let fields = read_fields(value)?;
            let id = if fields.is_leaf {
                self.new_leaf()
            } else {
                self.new_group()
            };
            match parent {
                Some(parent) => self.add_child(parent, id)?,
                None => *root = Some(id),
            }
            self.set_title(id, fields.title)?;
            if let Some(properties) = fields.properties {
                self.set_properties(id, properties)?;
                self.node_mut(id)?.properties_declared = true;
            }
            for child in fields.children.iter().rev() {
                stack.push((child, Some(id)));
            }
        }
        root.ok_or_else(|| NodeError::encoding("empty dictionary"))
    }
}
