//! Forest assembly: re-link flat outline items by id prefix.
//!
//! The id lookup lives only for the duration of [`assemble`]. Items are placed
//! in three steps:
//! 1. items without an id are filtered out ([`ExtractedItem::has_id`])
//! 2. earlier occurrences of a duplicated id are filtered out (the lookup keeps the last)
//! 3. single-segment ids become roots, the rest attach to their parent id or are dropped

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::items::ExtractedItem;

/// An item plus its linked children, before leaf normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftItem {
    /// The extracted link.
    pub item: ExtractedItem,
    /// Linked children in document order; may be empty.
    pub children: Vec<DraftItem>,
}

/// The id one level up: `"1.2.3"` → `"1.2"`. `None` for a single segment.
pub fn parent_id(id: &str) -> Option<&str> {
    id.rsplit_once('.').map(|(parent, _)| parent)
}

/// Where an item ends up after linking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Root,
    ChildOf(usize),
}

/// Link `items` into an ordered forest.
///
/// Roots and every sibling list keep the relative order of `items`. An item
/// whose parent id has no owner is dropped, along with anything below it.
pub fn assemble(items: Vec<ExtractedItem>) -> Vec<DraftItem> {
    let Linked { roots, children, .. } = link(&items);

    let mut slots: Vec<Option<ExtractedItem>> = items.into_iter().map(Some).collect();
    roots
        .into_iter()
        .filter_map(|index| materialize(&mut slots, &children, index))
        .collect()
}

/// Index-level result of linking.
struct Linked {
    roots: Vec<usize>,
    children: Vec<Vec<usize>>,
    /// Items dropped because their parent id has no owner.
    dangling: usize,
}

/// Compute root indices and per-item child indices.
fn link(items: &[ExtractedItem]) -> Linked {
    let lookup: HashMap<&str, usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.has_id())
        .map(|(index, item)| (item.id.as_str(), index))
        .collect();

    let mut roots = Vec::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
    let mut dangling = 0usize;

    let is_owner = |index: usize, item: &ExtractedItem| lookup.get(item.id.as_str()) == Some(&index);

    for (index, item) in items.iter().enumerate() {
        if !item.has_id() {
            continue;
        }
        if !is_owner(index, item) {
            warn!(id = %item.id, path = %item.path, "duplicate outline id, keeping the later link");
            continue;
        }

        let placement = match parent_id(&item.id) {
            None => Some(Placement::Root),
            Some(parent) => lookup.get(parent).copied().map(Placement::ChildOf),
        };

        match placement {
            Some(Placement::Root) => roots.push(index),
            Some(Placement::ChildOf(parent)) => children[parent].push(index),
            None => {
                debug!(id = %item.id, "parent id not found, dropping item");
                dangling += 1;
            }
        }
    }

    if dangling > 0 {
        warn!(dangling, "outline items without a parent were dropped");
    }
    debug!(
        items = items.len(),
        roots = roots.len(),
        dangling,
        "outline items linked"
    );

    Linked {
        roots,
        children,
        dangling,
    }
}

/// Move the item at `index` and its linked descendants out of `slots`.
fn materialize(
    slots: &mut [Option<ExtractedItem>],
    children: &[Vec<usize>],
    index: usize,
) -> Option<DraftItem> {
    let item = slots[index].take()?;
    let kids = children[index]
        .iter()
        .filter_map(|&child| materialize(slots, children, child))
        .collect();

    Some(DraftItem {
        item,
        children: kids,
    })
}
