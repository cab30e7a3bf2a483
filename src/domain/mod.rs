//! Domain layer: the node model and its tree algorithms
//!
//! This layer is independent of external concerns (no I/O, no config loading).

pub mod arena;
pub mod archive;
pub mod codec;
pub mod dragdrop;
pub mod error;
pub mod keyed;
pub mod keys;
pub mod mutate;
pub mod traverse;
pub mod value;

pub use arena::{Node, NodeArena, NodeId, PostOrderIterator, SubtreeIterator};
pub use archive::{Archive, ArchiveField, ArchiveRecord, ArchiveValue};
pub use codec::CodecStrictness;
pub use error::{NodeError, NodeResult};
pub use keyed::DescribeOptions;
pub use keys::{AttributeKey, NodeKind, PlainKind};
pub use traverse::IndexPath;
pub use value::{describe_value, AttributeValue, Locale, LocaleDescribe, Properties};
