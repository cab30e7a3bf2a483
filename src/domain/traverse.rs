//! Read-only queries over the tree: descendants, filters, ancestor chains,
//! pre-order successors and index paths.

use std::collections::HashSet;
use std::fmt;

use itertools::Itertools;
use tracing::instrument;

use crate::domain::arena::{NodeArena, NodeId};
use crate::domain::error::{NodeError, NodeResult};
use crate::domain::keys::NodeKind;

/// Indices locating a node in a forest: position among the roots, then
/// position in each successive children list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct IndexPath(Vec<usize>);

impl IndexPath {
    pub fn indexes(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<usize>> for IndexPath {
    fn from(indexes: Vec<usize>) -> Self {
        Self(indexes)
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join("."))
    }
}

impl<K: NodeKind> NodeArena<K> {
    /// Every node strictly below `id`, in pre-order.
    #[instrument(level = "trace", skip(self))]
    pub fn descendants(&self, id: NodeId) -> NodeResult<Vec<NodeId>> {
        self.node(id)?;
        Ok(self.iter_subtree(id).skip(1).map(|(nid, _)| nid).collect())
    }

    /// Leaf nodes among [`descendants`](Self::descendants), same order.
    pub fn all_child_leafs(&self, id: NodeId) -> NodeResult<Vec<NodeId>> {
        self.node(id)?;
        Ok(self
            .iter_subtree(id)
            .skip(1)
            .filter(|(_, node)| node.is_leaf())
            .map(|(nid, _)| nid)
            .collect())
    }

    /// Immediate children that are groups.
    pub fn group_children(&self, id: NodeId) -> NodeResult<Vec<NodeId>> {
        Ok(self
            .children(id)?
            .iter()
            .copied()
            .filter(|&c| self.get(c).is_some_and(|n| !n.is_leaf()))
            .collect())
    }

    /// Parent chain of `id`, nearest first.
    ///
    /// Fails with [`NodeError::CycleDetected`] when the chain loops back on
    /// itself instead of ending at a root.
    pub fn ancestors(&self, id: NodeId) -> NodeResult<Vec<NodeId>> {
        let mut seen = HashSet::from([id]);
        let mut chain = Vec::new();
        let mut current = id;
        while let Some(parent) = self.node(current)?.parent() {
            if !seen.insert(parent) {
                return Err(NodeError::CycleDetected(parent));
            }
            chain.push(parent);
            current = parent;
        }
        Ok(chain)
    }

    /// Topmost node of the parent chain; `id` itself when it is a root.
    #[instrument(level = "trace", skip(self))]
    pub fn root_ancestor(&self, id: NodeId) -> NodeResult<NodeId> {
        Ok(self.ancestors(id)?.last().copied().unwrap_or(id))
    }

    /// Node right after `id` in its parent's children.
    pub fn next_sibling(&self, id: NodeId) -> NodeResult<Option<NodeId>> {
        let Some(parent) = self.parent(id)? else {
            return Ok(None);
        };
        let siblings = self.children(parent)?;
        Ok(siblings
            .iter()
            .position(|&c| c == id)
            .and_then(|pos| siblings.get(pos + 1).copied()))
    }

    /// Pre-order successor of `id` in its whole tree.
    ///
    /// First child if there is one, otherwise the next sibling of the nearest
    /// node on the path up to the root that has one.
    #[instrument(level = "trace", skip(self))]
    pub fn next_node(&self, id: NodeId) -> NodeResult<Option<NodeId>> {
        if let Some(&first) = self.children(id)?.first() {
            return Ok(Some(first));
        }
        for candidate in std::iter::once(id).chain(self.ancestors(id)?) {
            if let Some(sibling) = self.next_sibling(candidate)? {
                return Ok(Some(sibling));
            }
        }
        Ok(None)
    }

    /// Locate `id` in the forest `roots` through children lists.
    ///
    /// `Ok(None)` when `id` is not reachable from `roots`.
    #[instrument(level = "debug", skip(self))]
    pub fn index_path_in(&self, id: NodeId, roots: &[NodeId]) -> NodeResult<Option<IndexPath>> {
        self.node(id)?;
        for (i, &root) in roots.iter().enumerate() {
            if root == id {
                return Ok(Some(IndexPath(vec![i])));
            }

            let mut path = vec![i];
            let mut frames: Vec<(NodeId, usize)> = vec![(root, 0)];
            let mut visited = HashSet::from([root]);
            while let Some(&(node, next)) = frames.last() {
                let children = self.get(node).map(|n| n.children()).unwrap_or(&[]);
                if next >= children.len() {
                    frames.pop();
                    path.pop();
                    continue;
                }
                if let Some(top) = frames.last_mut() {
                    top.1 += 1;
                }

                let child = children[next];
                if child == id {
                    path.push(next);
                    return Ok(Some(IndexPath(path)));
                }
                if visited.insert(child) {
                    frames.push((child, 0));
                    path.push(next);
                }
            }
        }
        Ok(None)
    }
}
