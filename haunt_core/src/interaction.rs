use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Direction, ItemKind, UNLOCKING_ITEM,
    entity::{Inventory, Player},
    level::{Level, Tile},
    map::GridError,
};

/// Represents the outcome of a proposed player move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// The player stepped onto an empty cell or an open door.
    Moved,
    /// The player stepped onto an item and picked it up.
    PickedUp(ItemKind),
    /// The player opened a locked door with the key and stepped through.
    Unlocked,
    /// A locked door is in the way and the key is missing.
    Locked,
    /// A wall or the edge of the floor is in the way.
    Blocked,
}

impl MoveOutcome {
    pub fn moved(self) -> bool {
        matches!(
            self,
            MoveOutcome::Moved | MoveOutcome::PickedUp(_) | MoveOutcome::Unlocked
        )
    }
}

/// Resolves one step of the player against the floor.
///
/// State is only touched once the branch is known to succeed, so a `Locked`
/// or `Blocked` outcome leaves player, inventory and floor unchanged.
pub fn resolve_move(
    level: &mut Level,
    player: &mut Player,
    inventory: &mut Inventory,
    direction: Direction,
) -> Result<MoveOutcome, GridError> {
    let Some(target) = player.position.step(direction) else {
        return Ok(MoveOutcome::Blocked);
    };
    let Ok(tile) = level.tile_at(target) else {
        return Ok(MoveOutcome::Blocked);
    };

    let outcome = match tile {
        Tile::Wall => MoveOutcome::Blocked,
        Tile::Empty | Tile::Door { locked: false } => {
            player.position = target;
            MoveOutcome::Moved
        }
        Tile::Item(kind) => {
            level.set_tile(target, Tile::Empty)?;
            inventory.insert(kind);
            player.position = target;
            MoveOutcome::PickedUp(kind)
        }
        Tile::Door { locked: true } => {
            if inventory.contains(UNLOCKING_ITEM) {
                level.set_tile(target, Tile::Empty)?;
                player.position = target;
                MoveOutcome::Unlocked
            } else {
                MoveOutcome::Locked
            }
        }
    };

    debug!(?direction, ?target, ?tile, ?outcome, "resolved player move");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Position, level::Building};

    struct Fixture {
        level: Level,
        player: Player,
        inventory: Inventory,
    }

    impl Fixture {
        fn at(x: usize, y: usize) -> Self {
            let building = Building::builtin().unwrap();
            Fixture {
                level: building.floors[0].clone(),
                player: Player::new(Position::new(x, y)),
                inventory: Inventory::new(),
            }
        }

        fn step(&mut self, direction: Direction) -> MoveOutcome {
            resolve_move(
                &mut self.level,
                &mut self.player,
                &mut self.inventory,
                direction,
            )
            .unwrap()
        }
    }

    #[test]
    fn walls_block_in_every_direction() {
        let building = Building::builtin().unwrap();
        let ground = &building.floors[0];
        for (pos, tile) in ground.tiles().enumerate() {
            if *tile == Tile::Wall {
                continue;
            }
            for dir in Direction::ALL {
                let Some(target) = pos.step(dir) else { continue };
                if ground.tile_at(target) != Ok(Tile::Wall) {
                    continue;
                }
                let mut fx = Fixture::at(pos.x, pos.y);
                let before = fx.inventory.clone();
                assert_eq!(fx.step(dir), MoveOutcome::Blocked);
                assert_eq!(fx.player.position, pos);
                assert_eq!(fx.inventory, before);
            }
        }
    }

    #[test]
    fn leaving_the_grid_is_blocked() {
        let mut fx = Fixture::at(0, 0);
        assert_eq!(fx.step(Direction::Up), MoveOutcome::Blocked);
        assert_eq!(fx.step(Direction::Left), MoveOutcome::Blocked);
        assert_eq!(fx.player.position, Position::new(0, 0));

        let mut fx = Fixture::at(15, 6);
        assert_eq!(fx.step(Direction::Right), MoveOutcome::Blocked);
        assert_eq!(fx.step(Direction::Down), MoveOutcome::Blocked);
    }

    #[test]
    fn picking_up_an_item_clears_the_tile() {
        let mut fx = Fixture::at(13, 1);
        assert_eq!(fx.step(Direction::Right), MoveOutcome::PickedUp(ItemKind::Key));
        assert_eq!(fx.player.position, Position::new(14, 1));
        assert_eq!(fx.level.tile_at(Position::new(14, 1)), Ok(Tile::Empty));
        assert_eq!(fx.inventory.to_vec(), vec![ItemKind::Key]);

        assert_eq!(fx.step(Direction::Left), MoveOutcome::Moved);
        assert_eq!(fx.step(Direction::Right), MoveOutcome::Moved);
        assert_eq!(fx.inventory.len(), 1);
    }

    #[test]
    fn locked_door_without_key_changes_nothing() {
        let mut fx = Fixture::at(14, 5);
        assert_eq!(fx.step(Direction::Left), MoveOutcome::Locked);
        assert_eq!(fx.player.position, Position::new(14, 5));
        assert_eq!(
            fx.level.tile_at(Position::new(13, 5)),
            Ok(Tile::Door { locked: true })
        );
        assert!(fx.inventory.is_empty());
    }

    #[test]
    fn key_opens_door_for_good() {
        let mut fx = Fixture::at(14, 5);
        fx.inventory.insert(ItemKind::Key);
        assert_eq!(fx.step(Direction::Left), MoveOutcome::Unlocked);
        assert_eq!(fx.player.position, Position::new(13, 5));
        assert_eq!(fx.level.tile_at(Position::new(13, 5)), Ok(Tile::Empty));
        // the key is kept
        assert!(fx.inventory.contains(ItemKind::Key));

        fx.inventory.clear();
        assert_eq!(fx.step(Direction::Left), MoveOutcome::Moved);
        assert_eq!(fx.step(Direction::Right), MoveOutcome::Moved);
        assert_eq!(fx.player.position, Position::new(13, 5));
    }

    #[test]
    fn open_door_is_passable() {
        let mut level = Level::from_rows(vec![vec![
            Tile::Empty,
            Tile::Door { locked: false },
        ]])
        .unwrap();
        let mut player = Player::new(Position::new(0, 0));
        let mut inventory = Inventory::new();
        let outcome =
            resolve_move(&mut level, &mut player, &mut inventory, Direction::Right).unwrap();
        assert_eq!(outcome, MoveOutcome::Moved);
        assert_eq!(player.position, Position::new(1, 0));
    }
}
