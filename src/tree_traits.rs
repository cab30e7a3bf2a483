/*
Outline rendering of a subtree as a `termtree::Tree`, e.g. for logs and debugging:

Root
├── A
│   ├── L1
│   └── L2
└── B

Built bottom-up from a post-order walk, so deep trees need no recursion.
 */
use std::collections::HashMap;

use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::{Node, NodeArena, NodeId};
use crate::domain::error::NodeResult;
use crate::domain::keys::NodeKind;

pub trait TreeNodeConvert {
    fn to_tree_string(&self, id: NodeId) -> NodeResult<Tree<String>>;
}

fn label<K>(node: &Node<K>) -> String {
    match (node.title().is_empty(), node.is_leaf()) {
        (true, true) => "(untitled leaf)".to_string(),
        (true, false) => "(untitled group)".to_string(),
        (false, _) => node.title().to_string(),
    }
}

impl<K: NodeKind> TreeNodeConvert for NodeArena<K> {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self, id: NodeId) -> NodeResult<Tree<String>> {
        self.node(id)?;
        let mut built: HashMap<NodeId, Tree<String>> = HashMap::new();
        for (nid, node) in self.iter_postorder(id) {
            let leaves: Vec<_> = node
                .children()
                .iter()
                .filter_map(|c| built.remove(c))
                .collect();
            built.insert(nid, Tree::new(label(node)).with_leaves(leaves));
        }
        Ok(built
            .remove(&id)
            .unwrap_or_else(|| Tree::new("Empty tree".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_small_tree_when_rendering_then_lists_titles_in_order() {
        let mut arena: NodeArena = NodeArena::new();
        let root = arena.new_group();
        let a = arena.new_group();
        let leaf = arena.new_leaf();
        arena.set_title(root, "Root").unwrap();
        arena.set_title(a, "A").unwrap();
        arena.add_child(root, a).unwrap();
        arena.add_child(a, leaf).unwrap();

        let rendered = arena.to_tree_string(root).unwrap().to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Root");
        assert!(lines[1].ends_with("A"));
        assert!(lines[2].ends_with("(untitled leaf)"));
    }
}
