//! Ordered children mutation.
//!
//! Every primitive here keeps parent links consistent: an inserted child
//! points at its new parent, a removed child points nowhere. Inserting a node
//! that already has a parent moves it. The one exception is
//! [`NodeArena::replace_children`].

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::domain::arena::{NodeArena, NodeId};
use crate::domain::error::{NodeError, NodeResult};
use crate::domain::keys::NodeKind;

impl<K: NodeKind> NodeArena<K> {
    fn ensure_group(&self, parent: NodeId) -> NodeResult<()> {
        if self.node(parent)?.is_leaf() {
            return Err(NodeError::LeafCannotHaveChildren(parent));
        }
        Ok(())
    }

    /// Length of `parent`'s children once `child` is taken out of it.
    fn len_without(&self, parent: NodeId, child: NodeId) -> NodeResult<usize> {
        let listed = self.parent(child)? == Some(parent)
            && self.children(parent)?.contains(&child);
        Ok(self.count_of_children(parent)? - usize::from(listed))
    }

    /// Append `child` to the end of `parent`'s children.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> NodeResult<()> {
        let at = self.len_without(parent, child)?;
        self.insert_child(parent, child, at)
    }

    /// Insert `child` at `index` (`index == count` appends).
    ///
    /// When `child` already sits in `parent`, `index` refers to the list with
    /// `child` taken out.
    #[instrument(level = "debug", skip(self))]
    pub fn insert_child(&mut self, parent: NodeId, child: NodeId, index: usize) -> NodeResult<()> {
        self.ensure_group(parent)?;
        let len = self.len_without(parent, child)?;
        if index > len {
            return Err(NodeError::IndexOutOfRange { index, len });
        }

        self.detach(child)?;
        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Child at `index`.
    pub fn child_at(&self, parent: NodeId, index: usize) -> NodeResult<NodeId> {
        let children = self.children(parent)?;
        children
            .get(index)
            .copied()
            .ok_or(NodeError::IndexOutOfRange {
                index,
                len: children.len(),
            })
    }

    /// Remove and return the child at `index`; its parent is cleared.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> NodeResult<NodeId> {
        let removed = self.child_at(parent, index)?;
        self.node_mut(parent)?.children.remove(index);
        if let Ok(node) = self.node_mut(removed) {
            node.parent = None;
        }
        Ok(removed)
    }

    /// Put `with` at `index`, returning the child it displaced.
    ///
    /// The displaced child is detached. If `with` was a child of `parent`
    /// elsewhere, it is moved and the list shrinks by one.
    #[instrument(level = "debug", skip(self))]
    pub fn replace_child_at(
        &mut self,
        parent: NodeId,
        index: usize,
        with: NodeId,
    ) -> NodeResult<NodeId> {
        self.ensure_group(parent)?;
        let old = self.child_at(parent, index)?;
        self.node(with)?;
        if old == with {
            return Ok(old);
        }

        self.node_mut(parent)?.children[index] = with;
        if let Ok(node) = self.node_mut(old) {
            node.parent = None;
        }

        if let Some(former) = self.node_mut(with)?.parent.take() {
            if let Ok(former_node) = self.node_mut(former) {
                // drop the stale entry, keeping the freshly placed one
                let stale = former_node
                    .children
                    .iter()
                    .enumerate()
                    .position(|(i, &c)| c == with && !(former == parent && i == index));
                if let Some(pos) = stale {
                    former_node.children.remove(pos);
                }
            }
        }
        self.node_mut(with)?.parent = Some(parent);
        Ok(old)
    }

    /// Replace all children, fixing up parent links on both sides.
    ///
    /// Former children not in `children` are detached; new children are moved
    /// out of their previous parents. A node listed twice is rejected with
    /// [`NodeError::DuplicateChild`].
    #[instrument(level = "debug", skip(self))]
    pub fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) -> NodeResult<()> {
        if !children.is_empty() {
            self.ensure_group(parent)?;
        }
        if let Some(&dup) = children.iter().duplicates().next() {
            return Err(NodeError::DuplicateChild(dup));
        }
        for &child in &children {
            self.node(child)?;
        }

        let former = std::mem::take(&mut self.node_mut(parent)?.children);
        for old in former {
            if let Ok(node) = self.node_mut(old) {
                if node.parent == Some(parent) {
                    node.parent = None;
                }
            }
        }
        for &child in &children {
            self.detach(child)?;
        }
        for &child in &children {
            self.node_mut(child)?.parent = Some(parent);
        }
        self.node_mut(parent)?.children = children;
        Ok(())
    }

    /// Swap in a whole children sequence WITHOUT touching any parent link.
    ///
    /// # Invariants
    ///
    /// This is a bulk escape hatch. Neither the new children nor the former
    /// ones are updated: new children keep whatever `parent` they had, former
    /// children still point at `parent`. The caller owns the repair. Until it
    /// happens, parent-chain queries such as
    /// [`root_ancestor`](NodeArena::root_ancestor) may see an inconsistent or
    /// cyclic chain and report [`NodeError::CycleDetected`].
    ///
    /// Only the leaf rule is checked: a leaf cannot take a non-empty list.
    #[instrument(level = "debug", skip(self))]
    pub fn replace_children(&mut self, parent: NodeId, children: Vec<NodeId>) -> NodeResult<()> {
        if !children.is_empty() {
            self.ensure_group(parent)?;
        }
        self.node_mut(parent)?.children = children;
        Ok(())
    }

    /// Remove the first occurrence of `target` anywhere below `root`.
    ///
    /// The search walks the children lists in pre-order. Returns whether the
    /// node was found; its parent is cleared when it was.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_from_subtree(&mut self, root: NodeId, target: NodeId) -> NodeResult<bool> {
        self.node(root)?;
        let holder = self.iter_subtree(root).find_map(|(id, node)| {
            node.children()
                .iter()
                .position(|&c| c == target)
                .map(|pos| (id, pos))
        });

        match holder {
            Some((holder, pos)) => {
                debug!("removing {} from {} at {}", target, holder, pos);
                self.remove_child_at(holder, pos)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
