//! outliner: generic hierarchical node model for outline and browser views
//!
//! Nodes live in a [`NodeArena`]; parents and children refer to each other
//! through [`NodeId`] handles. Node kinds extend the model by declaring
//! attribute keys through [`NodeKind`], and copying, archiving and describing
//! pick up the new keys without further code.
//!
//! ```
//! use outliner::{NodeArena, PlainKind};
//!
//! let mut arena: NodeArena<PlainKind> = NodeArena::new();
//! let root = arena.new_group();
//! let leaf = arena.new_leaf();
//! arena.set_title(leaf, "notes").unwrap();
//! arena.add_child(root, leaf).unwrap();
//! assert_eq!(arena.descendants(root).unwrap(), vec![leaf]);
//! ```

pub mod config;
pub mod domain;
pub mod tree_traits;
pub mod util;

pub use domain::{
    AttributeKey, AttributeValue, CodecStrictness, DescribeOptions, IndexPath, Locale, Node,
    NodeArena, NodeError, NodeId, NodeKind, NodeResult, PlainKind, Properties,
};
