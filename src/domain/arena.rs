use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::{instrument, warn};

use crate::domain::error::{NodeError, NodeResult};
use crate::domain::keys::{NodeKind, PlainKind};
use crate::domain::value::{AttributeValue, Properties};

/// Stable handle to a node inside a [`NodeArena`].
///
/// Handles are generational: once a node is removed its id never resolves
/// again, even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{}.{}", slot, generation)
    }
}

/// Tree node in the arena-based hierarchy.
#[derive(Debug, Clone)]
pub struct Node<K = PlainKind> {
    title: String,
    properties: Properties,
    /// Decoded from a dictionary carrying `properties`, so it is written back
    /// even when empty
    pub(crate) properties_declared: bool,
    pub(crate) children: Vec<NodeId>,
    is_leaf: bool,
    /// Index of parent node in the arena, None for root nodes
    pub(crate) parent: Option<NodeId>,
    kind: K,
    /// Creation order, tie-break for `compare`
    seq: u64,
}

impl<K> Node<K> {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn count_of_children(&self) -> usize {
        self.children.len()
    }

    /// Sort order for siblings.
    ///
    /// Titles compare case-insensitively (Unicode lowercase) first, then
    /// case-sensitively, then by creation order, so no two distinct nodes of
    /// one arena compare equal.
    pub fn compare(&self, other: &Node<K>) -> Ordering {
        self.title
            .to_lowercase()
            .cmp(&other.title.to_lowercase())
            .then_with(|| self.title.cmp(&other.title))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Arena storage for one forest of nodes.
///
/// Any node without a parent is a root. Detached nodes stay alive until
/// [`NodeArena::remove_subtree`] frees them.
#[derive(Debug, Clone)]
pub struct NodeArena<K = PlainKind> {
    arena: Arena<Node<K>>,
    next_seq: u64,
}

impl<K: NodeKind> Default for NodeArena<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: NodeKind> NodeArena<K> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            next_seq: 0,
        }
    }

    /// Group node with empty title, properties and children.
    pub fn new_group(&mut self) -> NodeId {
        self.new_group_with(K::default())
    }

    /// Leaf node with empty title and properties.
    pub fn new_leaf(&mut self) -> NodeId {
        self.new_leaf_with(K::default())
    }

    pub fn new_group_with(&mut self, kind: K) -> NodeId {
        self.insert_node(kind, false)
    }

    pub fn new_leaf_with(&mut self, kind: K) -> NodeId {
        self.insert_node(kind, true)
    }

    #[instrument(level = "trace", skip(self))]
    fn insert_node(&mut self, kind: K, is_leaf: bool) -> NodeId {
        let seq = self.next_seq;
        self.next_seq += 1;
        NodeId(self.arena.insert(Node {
            title: String::new(),
            properties: Properties::new(),
            properties_declared: false,
            children: Vec::new(),
            is_leaf,
            parent: None,
            kind,
            seq,
        }))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<K>> {
        self.arena.get(id.0)
    }

    pub fn node(&self, id: NodeId) -> NodeResult<&Node<K>> {
        self.arena.get(id.0).ok_or(NodeError::UnknownNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> NodeResult<&mut Node<K>> {
        self.arena.get_mut(id.0).ok_or(NodeError::UnknownNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Nodes without a parent, in creation order.
    pub fn roots(&self) -> Vec<NodeId> {
        let mut roots: Vec<(u64, NodeId)> = self
            .arena
            .iter()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(idx, n)| (n.seq, NodeId(idx)))
            .collect();
        roots.sort();
        roots.into_iter().map(|(_, id)| id).collect()
    }

    // ------------------------------------------------------------------
    // accessors
    // ------------------------------------------------------------------

    pub fn title(&self, id: NodeId) -> NodeResult<&str> {
        Ok(self.node(id)?.title())
    }

    pub fn set_title(&mut self, id: NodeId, title: impl Into<String>) -> NodeResult<()> {
        self.node_mut(id)?.title = title.into();
        Ok(())
    }

    pub fn properties(&self, id: NodeId) -> NodeResult<&Properties> {
        Ok(self.node(id)?.properties())
    }

    pub fn set_properties(&mut self, id: NodeId, properties: Properties) -> NodeResult<()> {
        self.node_mut(id)?.properties = properties;
        Ok(())
    }

    pub fn set_property(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> NodeResult<()> {
        self.node_mut(id)?
            .properties
            .insert(key.into(), value.into());
        Ok(())
    }

    pub fn remove_property(&mut self, id: NodeId, key: &str) -> NodeResult<Option<AttributeValue>> {
        Ok(self.node_mut(id)?.properties.remove(key))
    }

    pub fn is_leaf(&self, id: NodeId) -> NodeResult<bool> {
        Ok(self.node(id)?.is_leaf())
    }

    /// Flip the leaf flag. A node holding children cannot become a leaf.
    #[instrument(level = "trace", skip(self))]
    pub fn set_is_leaf(&mut self, id: NodeId, is_leaf: bool) -> NodeResult<()> {
        let node = self.node_mut(id)?;
        if is_leaf && !node.children.is_empty() {
            return Err(NodeError::LeafWithChildren(id));
        }
        node.is_leaf = is_leaf;
        Ok(())
    }

    pub fn parent(&self, id: NodeId) -> NodeResult<Option<NodeId>> {
        Ok(self.node(id)?.parent())
    }

    pub fn children(&self, id: NodeId) -> NodeResult<&[NodeId]> {
        Ok(self.node(id)?.children())
    }

    pub fn count_of_children(&self, id: NodeId) -> NodeResult<usize> {
        Ok(self.node(id)?.count_of_children())
    }

    pub fn kind(&self, id: NodeId) -> NodeResult<&K> {
        Ok(self.node(id)?.kind())
    }

    pub fn kind_mut(&mut self, id: NodeId) -> NodeResult<&mut K> {
        Ok(&mut self.node_mut(id)?.kind)
    }

    /// See [`Node::compare`].
    pub fn compare(&self, a: NodeId, b: NodeId) -> NodeResult<Ordering> {
        Ok(self.node(a)?.compare(self.node(b)?))
    }

    /// Stable sort of a children sequence by [`Node::compare`].
    #[instrument(level = "debug", skip(self))]
    pub fn sort_children(&mut self, parent: NodeId) -> NodeResult<()> {
        let mut children = self.node(parent)?.children.clone();
        for &child in &children {
            self.node(child)?;
        }
        children.sort_by(|a, b| match (self.get(*a), self.get(*b)) {
            (Some(x), Some(y)) => x.compare(y),
            _ => Ordering::Equal,
        });
        self.node_mut(parent)?.children = children;
        Ok(())
    }

    // ------------------------------------------------------------------
    // traversal
    // ------------------------------------------------------------------

    /// Pre-order walk over `id` and everything below it via children lists.
    pub fn iter_subtree(&self, id: NodeId) -> SubtreeIterator<'_, K> {
        SubtreeIterator::new(self, id)
    }

    /// Post-order walk over `id` and everything below it.
    pub fn iter_postorder(&self, id: NodeId) -> PostOrderIterator<'_, K> {
        PostOrderIterator::new(self, id)
    }

    /// Unlink `id` from its parent's children list and clear its parent.
    ///
    /// Returns the former parent and position when the node was listed there.
    pub(crate) fn detach(&mut self, id: NodeId) -> NodeResult<Option<(NodeId, usize)>> {
        let parent = match self.node_mut(id)?.parent.take() {
            Some(parent) => parent,
            None => return Ok(None),
        };
        let Some(parent_node) = self.arena.get_mut(parent.0) else {
            return Ok(None);
        };
        let position = parent_node.children.iter().position(|&c| c == id);
        if let Some(pos) = position {
            parent_node.children.remove(pos);
        }
        Ok(position.map(|pos| (parent, pos)))
    }

    /// Free `id` and every node reachable through its children lists.
    ///
    /// The node is detached from its parent first. Returns the number of
    /// nodes freed.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_subtree(&mut self, id: NodeId) -> NodeResult<usize> {
        self.detach(id)?;
        let doomed: Vec<NodeId> = self.iter_subtree(id).map(|(nid, _)| nid).collect();
        for nid in &doomed {
            self.arena.remove(nid.0);
        }
        Ok(doomed.len())
    }
}

/// Pre-order iterator with an explicit stack.
///
/// A node reached twice (possible only after an unchecked bulk replace) is
/// skipped instead of walked again.
pub struct SubtreeIterator<'a, K> {
    arena: &'a NodeArena<K>,
    stack: Vec<NodeId>,
    visited: HashSet<NodeId>,
}

impl<'a, K: NodeKind> SubtreeIterator<'a, K> {
    fn new(arena: &'a NodeArena<K>, start: NodeId) -> Self {
        Self {
            arena,
            stack: vec![start],
            visited: HashSet::new(),
        }
    }
}

impl<'a, K: NodeKind> Iterator for SubtreeIterator<'a, K> {
    type Item = (NodeId, &'a Node<K>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if !self.visited.insert(current) {
                warn!("node {} reached twice, children lists form a cycle", current);
                continue;
            }
            if let Some(node) = self.arena.get(current) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a, K> {
    arena: &'a NodeArena<K>,
    stack: Vec<(NodeId, bool)>,
    visited: HashSet<NodeId>,
}

impl<'a, K: NodeKind> PostOrderIterator<'a, K> {
    fn new(arena: &'a NodeArena<K>, start: NodeId) -> Self {
        Self {
            arena,
            stack: vec![(start, false)],
            visited: HashSet::new(),
        }
    }
}

impl<'a, K: NodeKind> Iterator for PostOrderIterator<'a, K> {
    type Item = (NodeId, &'a Node<K>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, expanded)) = self.stack.pop() {
            let Some(node) = self.arena.get(current) else {
                continue;
            };
            if expanded {
                return Some((current, node));
            }
            if !self.visited.insert(current) {
                warn!("node {} reached twice, children lists form a cycle", current);
                continue;
            }
            self.stack.push((current, true));
            for &child in node.children.iter().rev() {
                self.stack.push((child, false));
            }
        }
        None
    }
}
