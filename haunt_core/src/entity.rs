use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{ItemKind, Position};

/// Holds the state of the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub position: Position,
    pub level: usize,
    pub flashlight: bool,
    pub color: String,
}

impl Player {
    pub fn new(position: Position) -> Self {
        Player {
            position,
            level: 0,
            flashlight: true,
            color: "cyan".to_string(),
        }
    }

    /// Flips the flashlight and returns the new state.
    pub fn toggle_flashlight(&mut self) -> bool {
        self.flashlight = !self.flashlight;
        self.flashlight
    }
}

/// Holds the state of the ghost. Its position is never collision-checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pursuer {
    pub position: Position,
    pub level: usize,
    pub active: bool,
}

impl Pursuer {
    pub fn dormant(position: Position) -> Self {
        Pursuer {
            position,
            level: 0,
            active: false,
        }
    }

    /// True when the ghost is awake on `level` and standing on `position`.
    pub fn catches(&self, level: usize, position: Position) -> bool {
        self.active && self.level == level && self.position == position
    }
}

/// Set of collected items. Picking up a duplicate is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    items: BTreeSet<ItemKind>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `item`, returning `false` if it was already held.
    pub fn insert(&mut self, item: ItemKind) -> bool {
        self.items.insert(item)
    }

    pub fn contains(&self, item: ItemKind) -> bool {
        self.items.contains(&item)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ItemKind> + '_ {
        self.items.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<ItemKind> {
        self.iter().collect()
    }
}
