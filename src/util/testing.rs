use std::sync::Once;

use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::{NodeArena, NodeId, NodeKind};

static TEST_SETUP: Once = Once::new();

/// Install the test logging subscriber once per process.
///
/// Honors `RUST_LOG`; defaults to `debug` for this crate.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("outliner=debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Titled nodes forming `Root{A{L1, L2}, B}` (A, B groups; L1, L2 leaves).
#[derive(Debug, Clone, Copy)]
pub struct SampleTree {
    pub root: NodeId,
    pub a: NodeId,
    pub l1: NodeId,
    pub l2: NodeId,
    pub b: NodeId,
}

impl SampleTree {
    pub fn build<K: NodeKind>(arena: &mut NodeArena<K>) -> Self {
        let root = arena.new_group();
        let a = arena.new_group();
        let l1 = arena.new_leaf();
        let l2 = arena.new_leaf();
        let b = arena.new_group();
        for (id, title) in [(root, "Root"), (a, "A"), (l1, "L1"), (l2, "L2"), (b, "B")] {
            arena
                .set_title(id, title)
                .expect("fresh node accepts a title");
        }
        for (parent, child) in [(root, a), (a, l1), (a, l2), (root, b)] {
            arena
                .add_child(parent, child)
                .expect("sample tree links groups only");
        }
        Self { root, a, l1, l2, b }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_setup() {
        init_test_setup();
    }

    #[test]
    fn given_sample_tree_when_built_then_has_five_nodes() {
        let mut arena: NodeArena = NodeArena::new();
        let tree = SampleTree::build(&mut arena);
        assert_eq!(arena.len(), 5);
        assert_eq!(arena.children(tree.a).unwrap(), &[tree.l1, tree.l2]);
    }
}
