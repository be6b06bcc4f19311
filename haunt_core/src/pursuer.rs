use crate::{
    Position,
    level::{Level, Tile},
};

/// Trait defining how the ghost picks its next cell.
pub trait PursuitStrategy {
    /// Returns where the pursuer at `from` moves this tick when chasing
    /// `target` across `level`. Returning `from` means it stays put.
    fn next_position(&mut self, from: Position, target: Position, level: &Level) -> Position;
}

/// Greedy single-axis chase.
///
/// Closes the larger of the two axis gaps by one cell. When the gaps are equal
/// the y axis is chosen. There is no pathfinding, so the ghost happily walks
/// into dead ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GreedyChase {
    /// When set, a step into a wall or off the floor is skipped. Off by default:
    /// the ghost drifts through walls.
    pub respect_walls: bool,
}

impl GreedyChase {
    pub fn new(respect_walls: bool) -> Self {
        GreedyChase { respect_walls }
    }

    /// The step the chase rule asks for, ignoring the floor entirely.
    ///
    /// The larger gap is closed first and a tie moves along y. A ghost
    /// already on the target cell gets `(0, 0)` from the tie branch and
    /// stays where it is, so a player who walks onto it is caught on the
    /// next check instead of having the ghost step away.
    pub fn step_toward(from: Position, target: Position) -> Position {
        let dx = target.x as isize - from.x as isize;
        let dy = target.y as isize - from.y as isize;

        let (sx, sy) = if dx.abs() > dy.abs() {
            (dx.signum(), 0)
        } else {
            (0, dy.signum())
        };

        // Moving toward a non-negative target can never underflow.
        match (from.x.checked_add_signed(sx), from.y.checked_add_signed(sy)) {
            (Some(x), Some(y)) => Position::new(x, y),
            _ => from,
        }
    }
}

impl PursuitStrategy for GreedyChase {
    fn next_position(&mut self, from: Position, target: Position, level: &Level) -> Position {
        let next = Self::step_toward(from, target);
        if self.respect_walls {
            match level.tile_at(next) {
                Ok(Tile::Wall) | Err(_) => return from,
                Ok(Tile::Empty | Tile::Door { .. } | Tile::Item(_)) => {}
            }
        }
        next
    }
}
