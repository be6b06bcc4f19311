use std::mem;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    Direction, Position,
    config::{ConfigError, GameConfig},
    level::{LevelError, Tile},
    entity::{Inventory, Player, Pursuer},
    event::{Cue, GameEvent},
    interaction::{MoveOutcome, resolve_move},
    level::{Building, Level},
    pursuer::{GreedyChase, PursuitStrategy},
};

/// Story notes that may turn up with an item.
pub const NOTES: [&str; 3] = [
    "The house is alive. Trust nothing.",
    "Keys open more than doors...",
    "He is always watching. Run if you hear the whispers.",
];

pub const MSG_UNLOCKED: &str = "You used a key to open the door!";
pub const MSG_LOCKED: &str = "The door is locked. Find a key!";
pub const MSG_CAUGHT: &str = "The ghost caught you! Game Over.";
pub const MSG_ESCAPED: &str = "You escaped the house! Congratulations!";
pub const MSG_ASCEND: &str = "You ascend to the next floor...";
pub const MSG_WAY_UP_BLOCKED: &str = "Something blocks the way up.";

/// Reasons a session cannot be started.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("invalid game config: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid building: {0}")]
    Building(#[from] LevelError),
}

/// Where the play-through stands after the last event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Playing,
    LevelCleared,
    /// The ghost got the player; the session has already been reset.
    Caught,
    /// The player left the top floor; the session has already been reset.
    Escaped,
}

/// The complete mutable state of one play-through.
///
/// Floors are copied from the building's templates when the session is
/// created. Opened doors and collected items stay that way across `reset`.
pub struct GameSession {
    floors: Vec<Level>,
    entry: Position,
    pursuer_spawn: Position,
    player: Player,
    pursuer: Pursuer,
    inventory: Inventory,
    phase: Phase,
    chase: Box<dyn PursuitStrategy>,
    rng: StdRng,
    config: GameConfig,
    events: Vec<GameEvent>,
}

impl GameSession {
    pub fn new(building: Building, config: GameConfig) -> Result<Self, SessionError> {
        let chase = GreedyChase::new(config.pursuer_respects_walls);
        Self::with_strategy(building, config, Box::new(chase))
    }

    /// Creates a session with a custom ghost movement rule.
    pub fn with_strategy(
        building: Building,
        config: GameConfig,
        chase: Box<dyn PursuitStrategy>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        building.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let Building {
            floors,
            entry,
            pursuer_spawn,
        } = building;

        Ok(GameSession {
            floors,
            entry,
            pursuer_spawn,
            player: Player::new(entry),
            pursuer: Pursuer::dormant(pursuer_spawn),
            inventory: Inventory::new(),
            phase: Phase::Playing,
            chase,
            rng,
            config,
            events: Vec::new(),
        })
    }

    pub fn current_level(&self) -> usize {
        self.player.level
    }

    /// The floor the player is on.
    pub fn level(&self) -> &Level {
        &self.floors[self.player.level]
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn pursuer(&self) -> &Pursuer {
        &self.pursuer
    }

    /// Direct access to the ghost, for scripted scenarios.
    pub fn pursuer_mut(&mut self) -> &mut Pursuer {
        &mut self.pursuer
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Takes every presentation event queued since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        mem::take(&mut self.events)
    }

    fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Marks the start of a new event; clears a terminal phase from the last one.
    pub(crate) fn begin_event(&mut self) {
        self.phase = Phase::Playing;
    }

    /// Tries to move the player one cell.
    pub fn attempt_move(&mut self, direction: Direction) -> MoveOutcome {
        let level = &mut self.floors[self.player.level];
        let outcome =
            match resolve_move(level, &mut self.player, &mut self.inventory, direction) {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(%err, "tile update failed, treating move as blocked");
                    MoveOutcome::Blocked
                }
            };

        match outcome {
            MoveOutcome::PickedUp(kind) => {
                info!(item = kind.name(), position = ?self.player.position, "item picked up");
                self.emit(GameEvent::InventoryChanged(self.inventory.to_vec()));
                self.emit(GameEvent::notify(format!(
                    "You picked up a {}!",
                    kind.name().to_lowercase()
                )));
                self.roll_note();
            }
            MoveOutcome::Unlocked => {
                info!(position = ?self.player.position, "door unlocked");
                self.emit(GameEvent::notify(MSG_UNLOCKED));
            }
            MoveOutcome::Locked => self.emit(GameEvent::notify(MSG_LOCKED)),
            MoveOutcome::Moved | MoveOutcome::Blocked => {}
        }
        outcome
    }

    fn roll_note(&mut self) {
        if self.rng.random_bool(self.config.note_chance) {
            let note = NOTES[self.rng.random_range(0..NOTES.len())];
            debug!(note, "story note revealed");
            self.emit(GameEvent::notify(format!("You found a note:\n\n{note}")));
        }
    }

    pub fn toggle_flashlight(&mut self) -> bool {
        let on = self.player.toggle_flashlight();
        debug!(on, "flashlight toggled");
        on
    }

    /// Moves the ghost one step toward the player.
    ///
    /// Does nothing while the ghost is dormant or on another floor. Returns
    /// whether the ghost moved.
    pub fn pursuer_tick(&mut self) -> bool {
        if !self.pursuer.active || self.pursuer.level != self.player.level {
            return false;
        }
        let from = self.pursuer.position;
        let level = &self.floors[self.pursuer.level];
        let next = self
            .chase
            .next_position(from, self.player.position, level);
        self.pursuer.position = next;
        debug!(?from, to = ?next, "pursuer stepped");
        next != from
    }

    /// Rolls for a jump scare. No game state changes either way.
    pub fn roll_scare(&mut self) -> bool {
        let scared = self.rng.random_bool(self.config.scare_chance);
        if scared {
            debug!("jump scare");
            self.emit(GameEvent::Cue(Cue::Scare));
        }
        scared
    }

    /// Wakes the ghost on whatever floor the player is on right now.
    pub fn activate_pursuer(&mut self) {
        self.pursuer.active = true;
        self.pursuer.level = self.player.level;
        info!(level = self.pursuer.level, position = ?self.pursuer.position, "pursuer activated");
        self.emit(GameEvent::Cue(Cue::GhostAwakens));
    }

    /// Resets the session if the ghost shares the player's cell.
    pub fn check_caught(&mut self) -> Phase {
        if self
            .pursuer
            .catches(self.player.level, self.player.position)
        {
            info!(level = self.player.level, position = ?self.player.position, "player caught");
            self.emit(GameEvent::notify(MSG_CAUGHT));
            self.reset();
            self.phase = Phase::Caught;
        }
        self.phase
    }

    /// Sends the player up one floor, or out of the house from the top floor.
    ///
    /// The player keeps their coordinates on the new floor. If that cell is a
    /// wall up there the player stays where they are.
    pub fn advance_level(&mut self) -> Phase {
        let next = self.player.level + 1;
        if next >= self.floors.len() {
            info!("player escaped");
            self.emit(GameEvent::notify(MSG_ESCAPED));
            self.reset();
            self.phase = Phase::Escaped;
        } else if matches!(
            self.floors[next].tile_at(self.player.position),
            Ok(Tile::Wall) | Err(_)
        ) {
            info!(level = next, position = ?self.player.position, "way up blocked");
            self.emit(GameEvent::notify(MSG_WAY_UP_BLOCKED));
        } else {
            info!(level = next, "level cleared");
            self.player.level = next;
            self.emit(GameEvent::notify(MSG_ASCEND));
            self.phase = Phase::LevelCleared;
        }
        self.phase
    }

    /// Returns to the starting state: entry cell on floor 0, empty inventory,
    /// dormant ghost back at its spawn. Floor changes are kept.
    pub fn reset(&mut self) {
        self.player.position = self.entry;
        self.player.level = 0;
        self.inventory.clear();
        self.pursuer = Pursuer::dormant(self.pursuer_spawn);
        self.emit(GameEvent::InventoryChanged(Vec::new()));
        info!("session reset");
    }
}
