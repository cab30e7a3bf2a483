//! ExtensibleKeySet: derived kinds, deep copy and descriptions.

use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};

use outliner::util::testing::{self, SampleTree};
use outliner::{
    AttributeKey, AttributeValue, DescribeOptions, Locale, NodeArena, NodeError, NodeKind,
    NodeResult,
};

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

/// Browser bookmark: a node kind adding a url, a rating and a cached favicon.
#[derive(Debug, Clone, Default, PartialEq)]
struct Bookmark {
    url: String,
    rating: f64,
    favicon: String,
}

impl NodeKind for Bookmark {
    const KIND_NAME: &'static str = "Bookmark";

    fn extension_keys() -> Vec<AttributeKey> {
        vec![
            AttributeKey::value("url", AttributeValue::empty_text),
            AttributeKey::value("rating", AttributeValue::zero_float),
            AttributeKey::value("favicon", AttributeValue::empty_text),
        ]
    }

    fn undescribed_keys() -> &'static [&'static str] {
        &["favicon"]
    }

    fn attribute(&self, name: &str) -> Option<AttributeValue> {
        match name {
            "url" => Some(AttributeValue::Text(self.url.clone())),
            "rating" => Some(AttributeValue::Float(self.rating)),
            "favicon" => Some(AttributeValue::Text(self.favicon.clone())),
            _ => None,
        }
    }

    fn set_attribute(&mut self, name: &str, value: AttributeValue) -> NodeResult<()> {
        let wrong_type = |expected| NodeError::AttributeType {
            key: name.to_string(),
            expected,
        };
        match (name, value) {
            ("url", AttributeValue::Text(url)) => self.url = url,
            ("rating", AttributeValue::Float(rating)) => self.rating = rating,
            ("favicon", AttributeValue::Text(favicon)) => self.favicon = favicon,
            ("url" | "favicon", _) => return Err(wrong_type("text")),
            ("rating", _) => return Err(wrong_type("float")),
            _ => return Err(NodeError::UnknownAttribute(name.to_string())),
        }
        Ok(())
    }
}

#[fixture]
fn bookmarks() -> (NodeArena<Bookmark>, SampleTree) {
    let mut arena = NodeArena::new();
    let tree = SampleTree::build(&mut arena);
    arena
        .set_attribute(tree.l1, "url", "https://example.org".into())
        .unwrap();
    arena.set_attribute(tree.l1, "rating", 4.5.into()).unwrap();
    arena.set_attribute(tree.l1, "favicon", "ico".into()).unwrap();
    (arena, tree)
}

// ============================================================
// Key lists
// ============================================================

#[rstest]
fn given_derived_kind_when_listing_keys_then_base_keys_lead() {
    let names = |keys: Vec<AttributeKey>| keys.iter().map(|k| k.name()).collect::<Vec<_>>();

    assert_eq!(
        names(Bookmark::mutable_keys()),
        vec!["title", "properties", "children", "isLeaf", "url", "rating", "favicon"]
    );
    assert_eq!(
        names(Bookmark::describable_keys()),
        vec!["title", "properties", "isLeaf", "url", "rating"]
    );
}

#[rstest]
fn given_extension_value_when_read_then_round_trips(bookmarks: (NodeArena<Bookmark>, SampleTree)) {
    let (arena, tree) = bookmarks;

    assert_eq!(
        arena.attribute(tree.l1, "url").unwrap(),
        AttributeValue::from("https://example.org")
    );
    assert_eq!(arena.kind(tree.l1).unwrap().rating, 4.5);
    assert_eq!(arena.attribute(tree.l1, "isLeaf").unwrap(), AttributeValue::Bool(true));
    assert_eq!(
        arena.attribute(tree.l1, "color"),
        Err(NodeError::UnknownAttribute("color".into()))
    );
}

#[rstest]
fn given_wrong_value_type_when_setting_extension_then_rejected(
    bookmarks: (NodeArena<Bookmark>, SampleTree),
) {
    let (mut arena, tree) = bookmarks;

    let result = arena.set_attribute(tree.l1, "rating", "high".into());

    assert_eq!(
        result,
        Err(NodeError::AttributeType {
            key: "rating".into(),
            expected: "float"
        })
    );
    assert_eq!(arena.kind(tree.l1).unwrap().rating, 4.5);
}

#[rstest]
fn given_set_values_when_reset_then_key_defaults_return(
    bookmarks: (NodeArena<Bookmark>, SampleTree),
) {
    let (mut arena, tree) = bookmarks;

    arena.reset_attribute(tree.l1, "url").unwrap();
    arena.reset_attribute(tree.l1, "title").unwrap();
    arena.reset_attribute(tree.a, "children").unwrap();

    assert_eq!(arena.kind(tree.l1).unwrap().url, "");
    assert_eq!(arena.title(tree.l1).unwrap(), "");
    assert!(arena.children(tree.a).unwrap().is_empty());
    assert_eq!(arena.parent(tree.l2).unwrap(), None);
}

// ============================================================
// Deep copy
// ============================================================

#[rstest]
fn given_subtree_when_deep_copied_then_equal_and_independent(
    bookmarks: (NodeArena<Bookmark>, SampleTree),
) {
    let (mut arena, tree) = bookmarks;

    let copy = arena.deep_copy(tree.a).unwrap();

    assert_ne!(copy, tree.a);
    assert_eq!(arena.parent(copy).unwrap(), None);
    assert!(arena.subtree_eq(tree.a, &arena, copy).unwrap());

    let copied_leaf = arena.child_at(copy, 0).unwrap();
    assert_eq!(arena.kind(copied_leaf).unwrap().favicon, "ico");
    arena
        .set_attribute(copied_leaf, "url", "https://changed.example".into())
        .unwrap();

    assert_eq!(arena.kind(tree.l1).unwrap().url, "https://example.org");
    assert!(!arena.subtree_eq(tree.a, &arena, copy).unwrap());
}

#[rstest]
fn given_subtree_when_copied_to_other_arena_then_structure_matches(
    bookmarks: (NodeArena<Bookmark>, SampleTree),
) {
    let (arena, tree) = bookmarks;
    let mut other = NodeArena::new();

    let copy = arena.copy_subtree_to(tree.root, &mut other).unwrap();

    assert_eq!(other.len(), 5);
    assert_eq!(other.descendants(copy).unwrap().len(), 4);
    assert!(arena.subtree_eq(tree.root, &other, copy).unwrap());
}

// ============================================================
// Describe
// ============================================================

#[rstest]
fn given_leaf_when_described_then_lists_describable_keys(
    bookmarks: (NodeArena<Bookmark>, SampleTree),
) {
    let (arena, tree) = bookmarks;

    let text = arena.description(tree.l1).unwrap();

    let expected = "\
Bookmark {
    title = L1;
    properties = {};
    isLeaf = YES;
    url = https://example.org;
    rating = 4.5;
    children = ();
}
";
    assert_eq!(text, expected);
}

#[rstest]
fn given_locale_when_describing_then_values_follow_locale(
    bookmarks: (NodeArena<Bookmark>, SampleTree),
) {
    let (mut arena, tree) = bookmarks;
    let when = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap();
    arena.set_property(tree.l1, "added", when).unwrap();
    let options = DescribeOptions {
        locale: Some(Locale {
            decimal_separator: ",".into(),
            date_format: "%d.%m.%Y".into(),
        }),
        indent_width: 2,
        children: false,
        ..DescribeOptions::default()
    };

    let text = arena.describe(tree.l1, &options).unwrap();

    assert!(text.contains("  rating = 4,5;\n"), "{text}");
    assert!(text.contains("  properties = {added = 09.03.2024;};\n"), "{text}");
    assert!(!text.contains("children"), "{text}");
}

#[rstest]
fn given_group_when_described_then_children_nest_two_levels_deeper(
    bookmarks: (NodeArena<Bookmark>, SampleTree),
) {
    let (arena, tree) = bookmarks;

    let text = arena.description(tree.a).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "Bookmark {");
    assert!(lines.contains(&"    children = ("));
    assert!(lines.contains(&"        Bookmark {"));
    assert!(lines.contains(&"            title = L2;"));
    assert_eq!(lines[lines.len() - 2], "    );");
    assert_eq!(lines[lines.len() - 1], "}");
}
