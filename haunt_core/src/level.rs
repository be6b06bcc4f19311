use serde::{Deserialize, Serialize};

use crate::{
    ItemKind, Position,
    map::{Grid, GridError},
};

/// Represents the contents of one cell of a floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Empty,
    Wall,
    Door {
        locked: bool,
    },
    Item(ItemKind),
}

/// A lookup fell outside the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("({}, {}) is outside the level", position.x, position.y)]
pub struct OutOfBounds {
    pub position: Position,
}

/// One floor of the building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    tiles: Grid<Tile>,
}

impl Level {
    pub fn new(tiles: Grid<Tile>) -> Self {
        Level { tiles }
    }

    pub fn from_rows(rows: Vec<Vec<Tile>>) -> Result<Self, GridError> {
        Grid::from_rows(rows).map(Level::new)
    }

    pub fn width(&self) -> usize {
        self.tiles.width()
    }

    pub fn height(&self) -> usize {
        self.tiles.height()
    }

    /// Looks up the tile at `pos`. The bounds check always comes first.
    pub fn tile_at(&self, pos: Position) -> Result<Tile, OutOfBounds> {
        self.tiles
            .get(pos)
            .copied()
            .ok_or(OutOfBounds { position: pos })
    }

    /// Overwrites the tile at `pos`. Only the interaction engine opens doors
    /// and clears items through this.
    pub fn set_tile(&mut self, pos: Position, tile: Tile) -> Result<(), GridError> {
        self.tiles.set(pos, tile)
    }

    pub fn tiles(&self) -> &Grid<Tile> {
        &self.tiles
    }
}

/// Errors raised while loading or checking a building.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LevelError {
    #[error("Map string contains no floors")]
    NoFloors,
    #[error("Floor {floor} is malformed: {source}")]
    Grid {
        floor: usize,
        #[source]
        source: GridError,
    },
    #[error("Unknown map code '{token}' on floor {floor} at position ({x}, {y})")]
    UnknownToken {
        token: String,
        floor: usize,
        x: usize,
        y: usize,
    },
    #[error("Multiple '{marker}' markers found")]
    DuplicateMarker { marker: &'static str },
    #[error("No '{marker}' marker found on floor 0")]
    MissingMarker { marker: &'static str },
    #[error("'{marker}' marker found on floor {floor}; it is only allowed on floor 0")]
    MarkerOffEntryFloor { marker: &'static str, floor: usize },
    #[error(
        "Floor {floor} is {found_width}x{found_height}, expected {width}x{height} like floor 0"
    )]
    FloorSizeMismatch {
        floor: usize,
        width: usize,
        height: usize,
        found_width: usize,
        found_height: usize,
    },
    #[error("Entry ({x}, {y}) is outside floor 0 or inside a wall")]
    BadEntry { x: usize, y: usize },
    #[error("Pursuer spawn ({x}, {y}) is outside floor 0")]
    BadSpawn { x: usize, y: usize },
}

const ENTRY_MARKER: &str = "ST";
const SPAWN_MARKER: &str = "GH";
const FLOOR_SEPARATOR: &str = "--";

/// The static floor templates plus the fixed spawn points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub floors: Vec<Level>,
    /// Where the player starts, on floor 0.
    pub entry: Position,
    /// Where the pursuer waits before it is activated.
    pub pursuer_spawn: Position,
}

impl Building {
    /// The two-floor house shipped with the game.
    pub fn builtin() -> Result<Self, LevelError> {
        load_building_from_string(BUILTIN_FLOORS)
    }

    pub fn floor_count(&self) -> usize {
        self.floors.len()
    }

    /// Checks the invariants a session relies on: at least one floor, every
    /// floor the size of floor 0, the entry on a walkable cell of floor 0 and
    /// the spawn inside floor 0.
    pub fn validate(&self) -> Result<(), LevelError> {
        let ground = self.floors.first().ok_or(LevelError::NoFloors)?;
        let (width, height) = (ground.width(), ground.height());

        for (floor, level) in self.floors.iter().enumerate().skip(1) {
            if (level.width(), level.height()) != (width, height) {
                return Err(LevelError::FloorSizeMismatch {
                    floor,
                    width,
                    height,
                    found_width: level.width(),
                    found_height: level.height(),
                });
            }
        }

        match ground.tile_at(self.entry) {
            Ok(Tile::Wall) | Err(_) => {
                return Err(LevelError::BadEntry {
                    x: self.entry.x,
                    y: self.entry.y,
                });
            }
            Ok(Tile::Empty | Tile::Door { .. } | Tile::Item(_)) => {}
        }
        if ground.tile_at(self.pursuer_spawn).is_err() {
            return Err(LevelError::BadSpawn {
                x: self.pursuer_spawn.x,
                y: self.pursuer_spawn.y,
            });
        }
        Ok(())
    }
}

/// Loads a building from its text representation.
///
/// Each line is a row of whitespace-separated two-letter codes, and floors are
/// separated by a line containing only `--`. Floor 0 must contain exactly one
/// `ST` (player entry) and one `GH` (pursuer spawn); both are empty tiles.
pub fn load_building_from_string(map_string: &str) -> Result<Building, LevelError> {
    let mut sections: Vec<Vec<&str>> = vec![Vec::new()];
    for line in map_string.lines().map(str::trim) {
        if line == FLOOR_SEPARATOR {
            sections.push(Vec::new());
        } else if !line.is_empty() {
            if let Some(section) = sections.last_mut() {
                section.push(line);
            }
        }
    }
    sections.retain(|s| !s.is_empty());
    if sections.is_empty() {
        return Err(LevelError::NoFloors);
    }

    let mut entry: Option<Position> = None;
    let mut spawn: Option<Position> = None;
    let mut floors = Vec::with_capacity(sections.len());

    for (floor, lines) in sections.iter().enumerate() {
        let mut rows = Vec::with_capacity(lines.len());
        for (y, line) in lines.iter().enumerate() {
            let mut row = Vec::new();
            for (x, token) in line.split_whitespace().enumerate() {
                let pos = Position::new(x, y);
                let tile = match token {
                    "FL" => Tile::Empty,
                    "WL" => Tile::Wall,
                    "DL" => Tile::Door { locked: true },
                    "DO" => Tile::Door { locked: false },
                    "KY" => Tile::Item(ItemKind::Key),
                    ENTRY_MARKER => {
                        place_marker(&mut entry, ENTRY_MARKER, floor, pos)?;
                        Tile::Empty
                    }
                    SPAWN_MARKER => {
                        place_marker(&mut spawn, SPAWN_MARKER, floor, pos)?;
                        Tile::Empty
                    }
                    unknown => {
                        return Err(LevelError::UnknownToken {
                            token: unknown.to_string(),
                            floor,
                            x,
                            y,
                        });
                    }
                };
                row.push(tile);
            }
            rows.push(row);
        }
        let level = Level::from_rows(rows).map_err(|source| LevelError::Grid { floor, source })?;
        floors.push(level);
    }

    let building = Building {
        floors,
        entry: entry.ok_or(LevelError::MissingMarker {
            marker: ENTRY_MARKER,
        })?,
        pursuer_spawn: spawn.ok_or(LevelError::MissingMarker {
            marker: SPAWN_MARKER,
        })?,
    };
    building.validate()?;
    Ok(building)
}

fn place_marker(
    slot: &mut Option<Position>,
    marker: &'static str,
    floor: usize,
    pos: Position,
) -> Result<(), LevelError> {
    if floor != 0 {
        return Err(LevelError::MarkerOffEntryFloor { marker, floor });
    }
    if slot.is_some() {
        return Err(LevelError::DuplicateMarker { marker });
    }
    *slot = Some(pos);
    Ok(())
}

/// Floor 0 is the entry hall, floor 1 the upstairs.
pub const BUILTIN_FLOORS: &str = "
WL WL WL WL WL WL WL WL WL WL WL WL WL WL WL WL
WL ST FL FL FL FL FL FL FL FL FL FL FL FL KY WL
WL FL WL WL FL WL WL WL FL WL WL WL FL WL FL WL
WL FL WL FL FL FL FL WL FL FL FL WL FL WL FL WL
WL FL WL FL WL WL FL WL WL WL FL WL FL WL FL WL
WL FL FL FL FL FL FL FL FL WL FL FL FL DL GH WL
WL WL WL WL WL WL WL WL WL WL WL WL WL WL WL WL
--
WL WL WL WL WL WL WL WL WL WL WL WL WL WL WL WL
WL FL FL FL FL FL FL FL FL FL FL FL FL KY FL WL
WL FL WL WL FL WL WL WL FL WL WL WL FL WL FL WL
WL FL WL FL FL FL FL WL FL FL FL WL FL WL FL WL
WL FL WL FL WL WL FL WL WL WL FL WL FL WL FL WL
WL FL FL FL FL FL FL FL FL WL FL FL FL DL FL WL
WL WL WL WL WL WL WL WL WL WL WL WL WL WL WL WL
";
