//! Generic routines driven by a kind's key list: attribute access, deep
//! copy, structural equality and human-readable descriptions.
//!
//! None of these know about concrete kinds. They iterate
//! [`NodeKind::mutable_keys`] or [`NodeKind::describable_keys`] and move
//! values through [`NodeArena::attribute`] / [`NodeArena::set_attribute`].

use std::collections::HashSet;
use std::fmt::Write as _;

use tracing::{debug, instrument};

use crate::domain::arena::{NodeArena, NodeId};
use crate::domain::error::{NodeError, NodeResult};
use crate::domain::keys::{find_key, NodeKind, CHILDREN_KEY, IS_LEAF_KEY, PROPERTIES_KEY, TITLE_KEY};
use crate::domain::value::{describe_value, AttributeValue, Locale};

/// One node flattened into key/value pairs, children as record positions.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct KeyedRecord {
    pub(crate) values: Vec<(String, AttributeValue)>,
    pub(crate) children: Vec<usize>,
}

/// Options for [`NodeArena::describe`].
#[derive(Debug, Clone, PartialEq)]
pub struct DescribeOptions {
    /// Locale for the locale-aware stringifier; generic text when absent
    pub locale: Option<Locale>,
    /// Starting depth; each level is `indent_width` spaces
    pub indent: usize,
    pub indent_width: usize,
    /// Include the subtree
    pub children: bool,
}

impl Default for DescribeOptions {
    fn default() -> Self {
        Self {
            locale: None,
            indent: 0,
            indent_width: 4,
            children: true,
        }
    }
}

fn type_error(key: &str, expected: &'static str) -> NodeError {
    NodeError::AttributeType {
        key: key.to_string(),
        expected,
    }
}

impl<K: NodeKind> NodeArena<K> {
    /// Value stored under `name`.
    ///
    /// `name` must be one of the kind's mutable keys. The children key has no
    /// value form; use [`children`](Self::children).
    pub fn attribute(&self, id: NodeId, name: &str) -> NodeResult<AttributeValue> {
        let node = self.node(id)?;
        let key = find_key::<K>(name).ok_or_else(|| NodeError::UnknownAttribute(name.into()))?;
        if key.is_children() {
            return Err(type_error(name, "node list"));
        }
        match name {
            TITLE_KEY => Ok(AttributeValue::Text(node.title().to_string())),
            PROPERTIES_KEY => Ok(AttributeValue::Map(node.properties().clone())),
            IS_LEAF_KEY => Ok(AttributeValue::Bool(node.is_leaf())),
            _ => node
                .kind()
                .attribute(name)
                .ok_or_else(|| NodeError::UnknownAttribute(name.into())),
        }
    }

    /// Store `value` under `name`, checking the base keys' value types.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: AttributeValue) -> NodeResult<()> {
        self.node(id)?;
        let key = find_key::<K>(name).ok_or_else(|| NodeError::UnknownAttribute(name.into()))?;
        if key.is_children() {
            return Err(type_error(name, "node list"));
        }
        match (name, value) {
            (TITLE_KEY, AttributeValue::Text(title)) => self.set_title(id, title),
            (TITLE_KEY, _) => Err(type_error(name, "text")),
            (PROPERTIES_KEY, AttributeValue::Map(map)) => self.set_properties(id, map),
            (PROPERTIES_KEY, _) => Err(type_error(name, "map")),
            (IS_LEAF_KEY, AttributeValue::Bool(flag)) => self.set_is_leaf(id, flag),
            (IS_LEAF_KEY, _) => Err(type_error(name, "bool")),
            (_, value) => self.kind_mut(id)?.set_attribute(name, value),
        }
    }

    /// Put `name` back to the default from its key table.
    ///
    /// Resetting the children key detaches every child.
    #[instrument(level = "trace", skip(self))]
    pub fn reset_attribute(&mut self, id: NodeId, name: &str) -> NodeResult<()> {
        let key = find_key::<K>(name).ok_or_else(|| NodeError::UnknownAttribute(name.into()))?;
        match key.default_value() {
            Some(default) => self.set_attribute(id, name, default),
            None => self.set_children(id, Vec::new()),
        }
    }

    /// Flatten the subtree at `id` into pre-order records over `mutable_keys`.
    pub(crate) fn keyed_records(&self, id: NodeId) -> NodeResult<Vec<KeyedRecord>> {
        self.node(id)?;
        let keys: Vec<_> = K::mutable_keys()
            .into_iter()
            .filter(|k| !k.is_children())
            .collect();

        let mut order = Vec::new();
        let mut positions = std::collections::HashMap::new();
        for (nid, _) in self.iter_subtree(id) {
            positions.insert(nid, order.len());
            order.push(nid);
        }

        let mut claimed = HashSet::new();
        let mut records = Vec::with_capacity(order.len());
        for (pos, &nid) in order.iter().enumerate() {
            let mut values = Vec::with_capacity(keys.len());
            for key in &keys {
                values.push((key.name().to_string(), self.attribute(nid, key.name())?));
            }
            let children = self
                .children(nid)?
                .iter()
                .filter_map(|c| positions.get(c).copied())
                .filter(|&p| p > pos && claimed.insert(p))
                .collect();
            records.push(KeyedRecord { values, children });
        }
        Ok(records)
    }

    /// Create nodes from records; record 0 becomes the returned root.
    ///
    /// Keys absent from a record take their key-table default, unknown keys
    /// are skipped. Nothing is left behind in the arena on failure.
    pub(crate) fn build_from_records(&mut self, records: &[KeyedRecord]) -> NodeResult<NodeId> {
        validate_links(records)?;
        let mut created = Vec::with_capacity(records.len());
        let result = self.build_nodes(records, &mut created);
        if result.is_err() {
            for id in created {
                let _ = self.remove_subtree(id);
            }
        }
        result
    }

    fn build_nodes(&mut self, records: &[KeyedRecord], created: &mut Vec<NodeId>) -> NodeResult<NodeId> {
        let keys = K::mutable_keys();
        for record in records {
            let id = self.new_group();
            created.push(id);
            for key in keys.iter().filter(|k| !k.is_children()) {
                let value = record
                    .values
                    .iter()
                    .find(|(name, _)| name == key.name())
                    .map(|(_, v)| v.clone());
                match (value, key.default_value()) {
                    (Some(v), _) => self.set_attribute(id, key.name(), v)?,
                    (None, Some(default)) => self.set_attribute(id, key.name(), default)?,
                    (None, None) => {}
                }
            }
            for (name, _) in &record.values {
                if find_key::<K>(name).is_none() {
                    debug!("skipping unknown key '{}' for kind {}", name, K::KIND_NAME);
                }
            }
        }

        for (pos, record) in records.iter().enumerate() {
            let parent = created[pos];
            for &child in &record.children {
                self.add_child(parent, created[child])?;
            }
        }
        Ok(created[0])
    }

    /// Independent copy of the subtree at `id`, as a new root.
    ///
    /// Only values reachable through `mutable_keys` are carried over.
    #[instrument(level = "debug", skip(self))]
    pub fn deep_copy(&mut self, id: NodeId) -> NodeResult<NodeId> {
        let records = self.keyed_records(id)?;
        self.build_from_records(&records)
    }

    /// Copy the subtree at `id` into another arena.
    pub fn copy_subtree_to(&self, id: NodeId, dest: &mut NodeArena<K>) -> NodeResult<NodeId> {
        let records = self.keyed_records(id)?;
        dest.build_from_records(&records)
    }

    /// Structural deep equality over `mutable_keys` of two subtrees.
    pub fn subtree_eq(&self, a: NodeId, other: &NodeArena<K>, b: NodeId) -> NodeResult<bool> {
        Ok(self.keyed_records(a)? == other.keyed_records(b)?)
    }

    /// Multi-line dump of the node and, with the default options, its subtree.
    pub fn description(&self, id: NodeId) -> NodeResult<String> {
        self.describe(id, &DescribeOptions::default())
    }

    /// Indented dump of `describable_keys`, one key per line.
    #[instrument(level = "trace", skip(self, options))]
    pub fn describe(&self, id: NodeId, options: &DescribeOptions) -> NodeResult<String> {
        enum Frame {
            Open(NodeId, usize),
            Close(usize),
        }

        self.node(id)?;
        let keys = K::describable_keys();
        let locale = options.locale.as_ref();
        let pad = |level: usize| " ".repeat(level * options.indent_width);

        let mut out = String::new();
        let mut visited = HashSet::new();
        let mut stack = vec![Frame::Open(id, options.indent)];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Open(nid, level) => {
                    if !visited.insert(nid) || !self.contains(nid) {
                        continue;
                    }
                    let _ = writeln!(out, "{}{} {{", pad(level), K::KIND_NAME);
                    for key in &keys {
                        let value = self.attribute(nid, key.name())?;
                        let _ = writeln!(
                            out,
                            "{}{} = {};",
                            pad(level + 1),
                            key.name(),
                            describe_value(&value, locale)
                        );
                    }
                    let children = self.children(nid)?;
                    if !options.children {
                        let _ = writeln!(out, "{}}}", pad(level));
                    } else if children.is_empty() {
                        let _ = writeln!(out, "{}{} = ();", pad(level + 1), CHILDREN_KEY);
                        let _ = writeln!(out, "{}}}", pad(level));
                    } else {
                        let _ = writeln!(out, "{}{} = (", pad(level + 1), CHILDREN_KEY);
                        stack.push(Frame::Close(level));
                        for &child in children.iter().rev() {
                            stack.push(Frame::Open(child, level + 2));
                        }
                    }
                }
                Frame::Close(level) => {
                    let _ = writeln!(out, "{});", pad(level + 1));
                    let _ = writeln!(out, "{}}}", pad(level));
                }
            }
        }
        Ok(out)
    }
}

/// Child references must point forward, stay in range and be claimed once,
/// and every record but the first must be claimed.
fn validate_links(records: &[KeyedRecord]) -> NodeResult<()> {
    if records.is_empty() {
        return Err(NodeError::encoding("no records"));
    }
    let mut claimed = vec![false; records.len()];
    for (pos, record) in records.iter().enumerate() {
        for &child in &record.children {
            if child <= pos || child >= records.len() {
                return Err(NodeError::encoding(format!(
                    "record {} references invalid child record {}",
                    pos, child
                )));
            }
            if std::mem::replace(&mut claimed[child], true) {
                return Err(NodeError::encoding(format!(
                    "record {} is referenced more than once",
                    child
                )));
            }
        }
    }
    if let Some(orphan) = claimed.iter().skip(1).position(|c| !c) {
        return Err(NodeError::encoding(format!(
            "record {} is not referenced by any parent",
            orphan + 1
        )));
    }
    Ok(())
}
