use serde::{Deserialize, Serialize};

pub mod config;
pub mod entity;
pub mod event;
pub mod game;
pub mod interaction;
pub mod level;
pub mod map;
pub mod pursuer;
pub mod session;

/// Represents a 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// Returns the neighbouring position one step in `direction`.
    ///
    /// Returns `None` if the step would leave the non-negative coordinate space.
    pub fn step(self, direction: Direction) -> Option<Position> {
        let (dx, dy) = direction.delta();
        Some(Position {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }
}

/// A unit step along one axis. Diagonals are never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Returns the `(dx, dy)` offset of this direction. `y` grows downwards.
    #[inline]
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Represents items that can lie on the floor or sit in the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Key,
}

impl ItemKind {
    /// Display name used in notifications and the inventory list.
    pub fn name(self) -> &'static str {
        match self {
            ItemKind::Key => "Key",
        }
    }
}

/// The item that opens locked doors.
pub const UNLOCKING_ITEM: ItemKind = ItemKind::Key;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_one_cell() {
        let p = Position::new(3, 3);
        assert_eq!(p.step(Direction::Up), Some(Position::new(3, 2)));
        assert_eq!(p.step(Direction::Down), Some(Position::new(3, 4)));
        assert_eq!(p.step(Direction::Left), Some(Position::new(2, 3)));
        assert_eq!(p.step(Direction::Right), Some(Position::new(4, 3)));
    }

    #[test]
    fn step_below_zero_is_none() {
        let origin = Position::new(0, 0);
        assert_eq!(origin.step(Direction::Up), None);
        assert_eq!(origin.step(Direction::Left), None);
    }
}
