use std::collections::HashSet;

use crate::scene::item::{Item, ItemId};

/// Ordered collection of items presented to the renderer, back to front.
#[derive(Debug, Default, Clone)]
pub struct SceneGraph {
    items: Vec<Item>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current items in draw order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append `items` so they draw on top.
    ///
    /// Any current item overlapping the family of an added item is restructured first, so a
    /// sub-member of an existing group is never drawn twice.
    pub fn add(&mut self, items: &[Item]) {
        if items.is_empty() {
            return;
        }
        let to_remove: HashSet<ItemId> = items.iter().flat_map(|m| m.family_ids()).collect();
        self.items = restructured(&self.items, &to_remove);

        let mut present: HashSet<ItemId> = self.items.iter().map(Item::id).collect();
        for item in items {
            if present.insert(item.id()) {
                self.items.push(item.clone());
            }
        }
    }

    /// Remove `items`. A group containing a removed descendant is replaced in place by its
    /// surviving descendants.
    pub fn remove(&mut self, items: &[Item]) {
        if items.is_empty() {
            return;
        }
        let to_remove: HashSet<ItemId> = items.iter().map(Item::id).collect();
        self.items = restructured(&self.items, &to_remove);
    }

    pub fn bring_to_front(&mut self, items: &[Item]) {
        self.add(items);
    }

    pub fn bring_to_back(&mut self, items: &[Item]) {
        self.remove(items);
        let mut seen = HashSet::new();
        let mut front: Vec<Item> = items
            .iter()
            .filter(|m| seen.insert(m.id()))
            .cloned()
            .collect();
        front.append(&mut self.items);
        self.items = front;
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Items that are not already nested under another current item.
    pub fn top_level(&self) -> Vec<Item> {
        let families: Vec<HashSet<ItemId>> = self.items.iter().map(Item::family_ids).collect();
        self.items
            .iter()
            .filter(|m| {
                let id = m.id();
                families.iter().filter(|f| f.contains(&id)).count() == 1
            })
            .cloned()
            .collect()
    }

    /// Every item reachable from the list, flattened in draw order without repeats.
    pub fn family_members(&self) -> Vec<Item> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for item in &self.items {
            for member in item.family() {
                if seen.insert(member.id()) {
                    out.push(member);
                }
            }
        }
        out
    }

    /// `true` if `item` is listed or nested under a listed item.
    pub fn contains(&self, item: &Item) -> bool {
        let id = item.id();
        self.items.iter().any(|m| m.family_ids().contains(&id))
    }
}

fn restructured(list: &[Item], to_remove: &HashSet<ItemId>) -> Vec<Item> {
    let mut out = Vec::with_capacity(list.len());
    splice_safe(list, to_remove, &mut out);
    out
}

fn splice_safe(list: &[Item], to_remove: &HashSet<ItemId>, out: &mut Vec<Item>) {
    for item in list {
        if to_remove.contains(&item.id()) {
            continue;
        }
        let overlap: HashSet<ItemId> = item
            .family_ids()
            .intersection(to_remove)
            .copied()
            .collect();
        if overlap.is_empty() {
            out.push(item.clone());
        } else {
            splice_safe(&item.children(), &overlap, out);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/graph.rs"]
mod tests;
