//! Containment checks for drag-and-drop reparenting.
//!
//! Before a move completes, the drop target must not be one of the dragged
//! nodes or lie inside one of them:
//!
//! ```ignore
//! if arena.is_descendant_of_or_one_of_nodes(target, &dragged)? {
//!     // reject the drop
//! }
//! ```
//!
//! [`NodeArena::move_nodes`] performs that check itself.

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::domain::arena::{NodeArena, NodeId};
use crate::domain::error::{NodeError, NodeResult};
use crate::domain::keys::NodeKind;

impl<K: NodeKind> NodeArena<K> {
    /// True when some node of `nodes` is on the parent chain of `id`.
    pub fn is_descendant_of_nodes(&self, id: NodeId, nodes: &[NodeId]) -> NodeResult<bool> {
        Ok(self.ancestors(id)?.iter().any(|a| nodes.contains(a)))
    }

    /// True when `id` is one of `nodes` or sits anywhere in their subtrees.
    ///
    /// Walks the children lists, not parent links: during a multi-node drag
    /// the parent links may lag behind while children lists stay accurate.
    #[instrument(level = "debug", skip(self))]
    pub fn is_descendant_of_or_one_of_nodes(
        &self,
        id: NodeId,
        nodes: &[NodeId],
    ) -> NodeResult<bool> {
        self.node(id)?;
        if nodes.contains(&id) {
            return Ok(true);
        }
        Ok(nodes
            .iter()
            .any(|&n| self.iter_subtree(n).any(|(nid, _)| nid == id)))
    }

    /// Reparent `nodes` under `new_parent`, placing them in order from `index`.
    ///
    /// Duplicates and nodes lying inside another dragged node are dropped
    /// from the selection; they travel with their dragged ancestor.
    ///
    /// Rejected with [`NodeError::InvalidDrop`] when `new_parent` is one of
    /// `nodes` or inside one of them. `index` counts positions in the target
    /// list after the moved nodes have been taken out of it.
    #[instrument(level = "debug", skip(self))]
    pub fn move_nodes(
        &mut self,
        nodes: &[NodeId],
        new_parent: NodeId,
        index: usize,
    ) -> NodeResult<()> {
        if self.is_descendant_of_or_one_of_nodes(new_parent, nodes)? {
            return Err(NodeError::InvalidDrop(new_parent));
        }
        let mut moving = Vec::with_capacity(nodes.len());
        for n in nodes.iter().copied().unique() {
            if !self.is_descendant_of_nodes(n, nodes)? {
                moving.push(n);
            }
        }
        let nodes = moving.as_slice();
        if self.is_leaf(new_parent)? && !nodes.is_empty() {
            return Err(NodeError::LeafCannotHaveChildren(new_parent));
        }

        let staying = self
            .children(new_parent)?
            .iter()
            .filter(|c| !nodes.contains(c))
            .count();
        if index > staying {
            return Err(NodeError::IndexOutOfRange {
                index,
                len: staying,
            });
        }

        for &n in nodes {
            self.detach(n)?;
        }
        for (offset, &n) in nodes.iter().enumerate() {
            debug!("moving {} to {} at {}", n, new_parent, index + offset);
            self.insert_child(new_parent, n, index + offset)?;
        }
        Ok(())
    }
}
