//! Signals the core sends to whatever draws the game and plays its sounds.

use serde::{Deserialize, Serialize};

use crate::{
    ItemKind,
    entity::{Player, Pursuer},
    level::Level,
};

/// Sound (and accompanying visual) cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    /// The ghost has woken up.
    GhostAwakens,
    /// A jump scare: a flash of "AHHH!" and a scream.
    Scare,
}

/// Events emitted during a step. The presentation layer consumes these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Notify(String),
    Cue(Cue),
    InventoryChanged(Vec<ItemKind>),
}

impl GameEvent {
    pub fn notify(message: impl Into<String>) -> Self {
        GameEvent::Notify(message.into())
    }

    /// Hands the event to the matching presenter method.
    pub fn deliver(self, presenter: &mut dyn Presenter) {
        match self {
            GameEvent::Notify(message) => presenter.notify(&message),
            GameEvent::Cue(cue) => presenter.play_cue(cue),
            GameEvent::InventoryChanged(items) => presenter.update_inventory_display(&items),
        }
    }
}

/// Trait implemented by front-ends.
pub trait Presenter {
    /// Redraw the current floor with both entities on it.
    fn render_frame(&mut self, level: &Level, player: &Player, pursuer: &Pursuer);

    /// Show a message: alerts, story notes, locked-door and game-over texts.
    fn notify(&mut self, message: &str);

    fn play_cue(&mut self, cue: Cue);

    fn update_inventory_display(&mut self, items: &[ItemKind]);
}
