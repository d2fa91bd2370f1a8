use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::{Rgba8, Transform2D, Vec2};
use crate::foundation::error::{WeaveError, WeaveResult};

static NEXT_ITEM_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an [`Item`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(pub u64);

/// Geometry drawn for an item. Groups usually carry [`Shape::None`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Nothing is drawn for this node itself.
    None,
    /// Axis-aligned rectangle centred on the item origin.
    Rect { width: f64, height: f64 },
    /// Ellipse centred on the item origin.
    Ellipse { rx: f64, ry: f64 },
}

/// Render state owned by one item.
///
/// States are absolute: a group's children are positioned in scene space, and family-wide
/// operations (shift, scale, ...) touch every member.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ItemState {
    pub shape: Shape,
    pub transform: Transform2D,
    pub fill: Rgba8,
    pub opacity: f64,
}

impl Default for ItemState {
    fn default() -> Self {
        Self {
            shape: Shape::None,
            transform: Transform2D::default(),
            fill: Rgba8::WHITE,
            opacity: 1.0,
        }
    }
}

impl ItemState {
    pub fn position(&self) -> Vec2 {
        self.transform.translate
    }
}

type TimedFn = Box<dyn FnMut(&mut ItemState, f64)>;
type FollowFn = Box<dyn FnMut(&mut ItemState, &ItemState)>;

/// Per-step callback owned by an item.
pub enum Updater {
    /// Driven by elapsed time; receives the step's `dt` in seconds.
    Timed(TimedFn),
    /// Driven by another item's state, read fresh on every step.
    Follow { source: Item, apply: FollowFn },
}

impl Updater {
    pub fn timed(f: impl FnMut(&mut ItemState, f64) + 'static) -> Self {
        Self::Timed(Box::new(f))
    }

    pub fn follow(source: &Item, f: impl FnMut(&mut ItemState, &ItemState) + 'static) -> Self {
        Self::Follow {
            source: source.clone(),
            apply: Box::new(f),
        }
    }

    pub fn is_time_based(&self) -> bool {
        matches!(self, Self::Timed(_))
    }
}

impl std::fmt::Debug for Updater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timed(_) => f.write_str("Updater::Timed"),
            Self::Follow { source, .. } => write!(f, "Updater::Follow({:?})", source.id()),
        }
    }
}

struct ItemNode {
    id: ItemId,
    name: String,
    state: ItemState,
    children: Vec<Item>,
    updaters: Vec<Updater>,
}

/// Shared handle to one node of the visual tree.
///
/// Cloning the handle does not copy the node; equality and hashing follow identity.
#[derive(Clone)]
pub struct Item(Rc<RefCell<ItemNode>>);

impl Item {
    pub fn new(name: impl Into<String>, state: ItemState) -> Self {
        let id = ItemId(NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed));
        Self(Rc::new(RefCell::new(ItemNode {
            id,
            name: name.into(),
            state,
            children: Vec::new(),
            updaters: Vec::new(),
        })))
    }

    pub fn rect(name: impl Into<String>, width: f64, height: f64, fill: Rgba8) -> Self {
        Self::new(
            name,
            ItemState {
                shape: Shape::Rect { width, height },
                fill,
                ..ItemState::default()
            },
        )
    }

    pub fn ellipse(name: impl Into<String>, rx: f64, ry: f64, fill: Rgba8) -> Self {
        Self::new(
            name,
            ItemState {
                shape: Shape::Ellipse { rx, ry },
                fill,
                ..ItemState::default()
            },
        )
    }

    /// Build a group node owning `children` in the given order.
    pub fn group(name: impl Into<String>, children: &[Item]) -> Self {
        let group = Self::new(name, ItemState::default());
        {
            let mut node = group.0.borrow_mut();
            for child in children {
                if !node.children.contains(child) {
                    node.children.push(child.clone());
                }
            }
        }
        group
    }

    pub fn id(&self) -> ItemId {
        self.0.borrow().id
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    pub fn state(&self) -> ItemState {
        self.0.borrow().state
    }

    pub fn set_state(&self, state: ItemState) {
        self.0.borrow_mut().state = state;
    }

    pub fn update_state(&self, f: impl FnOnce(&mut ItemState)) {
        f(&mut self.0.borrow_mut().state);
    }

    /// Move this item and all of its descendants by `delta`.
    pub fn shift(&self, delta: Vec2) {
        for member in self.family() {
            member.update_state(|s| s.transform.translate += delta);
        }
    }

    /// Place this item's origin at `pos`, carrying its descendants along.
    pub fn move_to(&self, pos: Vec2) {
        let delta = pos - self.state().position();
        self.shift(delta);
    }

    /// Append `child` to this item's children.
    ///
    /// Fails when `child` is this item or one of its ancestors.
    pub fn add(&self, child: &Item) -> WeaveResult<()> {
        if child.family_ids().contains(&self.id()) {
            return Err(WeaveError::invalid_argument(format!(
                "cannot add '{}' under '{}': it would create a cycle",
                child.name(),
                self.name()
            )));
        }
        let mut node = self.0.borrow_mut();
        if !node.children.contains(child) {
            node.children.push(child.clone());
        }
        Ok(())
    }

    pub fn remove_child(&self, child: &Item) {
        self.0.borrow_mut().children.retain(|c| c != child);
    }

    pub fn children(&self) -> Vec<Item> {
        self.0.borrow().children.clone()
    }

    /// This item followed by all descendants, pre-order, without repeats.
    pub fn family(&self) -> Vec<Item> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        collect_family(self, &mut out, &mut seen);
        out
    }

    pub fn family_ids(&self) -> HashSet<ItemId> {
        self.family().iter().map(Item::id).collect()
    }

    pub fn add_updater(&self, updater: Updater) {
        self.0.borrow_mut().updaters.push(updater);
    }

    pub fn clear_updaters(&self) {
        self.0.borrow_mut().updaters.clear();
    }

    pub fn updater_count(&self) -> usize {
        self.0.borrow().updaters.len()
    }

    pub fn has_updaters(&self) -> bool {
        self.updater_count() > 0
    }

    pub fn has_time_based_updater(&self) -> bool {
        self.0.borrow().updaters.iter().any(Updater::is_time_based)
    }

    /// Run this item's updaters in registration order, then recurse into children.
    pub fn update(&self, dt: f64) {
        // Updaters are moved out while running so a `Follow` updater may read any item,
        // including this one.
        let mut updaters = std::mem::take(&mut self.0.borrow_mut().updaters);
        for updater in &mut updaters {
            match updater {
                Updater::Timed(f) => {
                    let mut state = self.state();
                    f(&mut state, dt);
                    self.set_state(state);
                }
                Updater::Follow { source, apply } => {
                    let src = source.state();
                    let mut state = self.state();
                    apply(&mut state, &src);
                    self.set_state(state);
                }
            }
        }
        {
            let mut node = self.0.borrow_mut();
            // Keep anything registered while the updaters were running.
            updaters.append(&mut node.updaters);
            node.updaters = updaters;
        }
        for child in self.children() {
            child.update(dt);
        }
    }
}

fn collect_family(item: &Item, out: &mut Vec<Item>, seen: &mut HashSet<ItemId>) {
    if !seen.insert(item.id()) {
        return;
    }
    out.push(item.clone());
    for child in item.children() {
        collect_family(&child, out, seen);
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Item {}

impl std::hash::Hash for Item {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl std::fmt::Debug for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let node = self.0.borrow();
        f.debug_struct("Item")
            .field("id", &node.id.0)
            .field("name", &node.name)
            .field("children", &node.children.len())
            .field("updaters", &node.updaters.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/item.rs"]
mod tests;
