//! Leaf normalization: turn draft trees into [`DocumentItem`]s.

use deepwiki_shared::DocumentItem;

use crate::forest::DraftItem;

/// Convert a draft forest, marking items without children as leaves.
///
/// Order and identity of items are untouched.
pub fn normalize(forest: Vec<DraftItem>) -> Vec<DocumentItem> {
    forest.into_iter().map(normalize_item).collect()
}

fn normalize_item(draft: DraftItem) -> DocumentItem {
    let DraftItem { item, children } = draft;
    DocumentItem::new(item.id, item.title, item.path, normalize(children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::ExtractedItem;
    use deepwiki_shared::Node;

    fn draft(path: &str, children: Vec<DraftItem>) -> DraftItem {
        DraftItem {
            item: ExtractedItem::from_link(path, "t"),
            children,
        }
    }

    #[test]
    fn empty_children_become_leaves() {
        let out = normalize(vec![draft("/1-a", vec![])]);
        assert_eq!(out[0].node, Node::Leaf);
    }

    #[test]
    fn nested_leaves_are_normalized() {
        let out = normalize(vec![draft(
            "/1-a",
            vec![draft("/1.1-b", vec![draft("/1.1.1-c", vec![])]), draft("/1.2-d", vec![])],
        )]);

        let one = &out[0];
        assert_eq!(one.children().len(), 2);
        assert_eq!(one.children()[0].children()[0].id, "1.1.1");
        assert!(one.children()[0].children()[0].is_leaf());
        assert_eq!(one.children()[1].node, Node::Leaf);
    }

    #[test]
    fn no_empty_children_in_serialized_output() {
        let out = normalize(vec![draft("/1-a", vec![draft("/1.1-b", vec![])])]);
        let json = serde_json::to_string(&out).unwrap();
        assert!(!json.contains("\"children\":[]"));
        assert_eq!(json.matches("children").count(), 1);
    }
}
