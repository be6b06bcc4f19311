//! Event sequencing: every input and timer firing goes through one
//! `dispatch` call and runs to completion before the next.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Direction,
    event::Presenter,
    session::{GameSession, Phase},
};

/// Player commands, decoupled from physical keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Move(Direction),
    ToggleFlashlight,
}

/// Everything that can mutate a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopEvent {
    Input(Command),
    /// The recurring, input-independent ghost step.
    PursuerTick,
    /// The one-shot ghost wake-up.
    ActivatePursuer,
    /// External trigger to go up a floor.
    AdvanceLevel,
}

/// Deterministic schedule for the one-shot activation and the recurring tick.
///
/// Driven by elapsed time deltas, so the caller owns the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timers {
    activation_delay: Duration,
    tick_period: Duration,
    elapsed: Duration,
    activation_at: Option<Duration>,
    next_tick: Duration,
}

impl Timers {
    pub fn new(activation_delay: Duration, tick_period: Duration) -> Self {
        Timers {
            activation_delay,
            tick_period,
            elapsed: Duration::ZERO,
            activation_at: Some(activation_delay),
            next_tick: tick_period,
        }
    }

    /// Arms the activation again, `activation_delay` from now. The recurring
    /// tick keeps its phase.
    pub fn rearm(&mut self) {
        self.activation_at = Some(self.elapsed + self.activation_delay);
    }

    /// Moves the clock forward by `dt` and returns the events that fell due,
    /// in firing order. An activation due at the same instant as a tick comes
    /// first.
    pub fn advance(&mut self, dt: Duration) -> Vec<LoopEvent> {
        self.elapsed += dt;
        let mut due: Vec<(Duration, LoopEvent)> = Vec::new();

        if let Some(at) = self.activation_at {
            if at <= self.elapsed {
                due.push((at, LoopEvent::ActivatePursuer));
                self.activation_at = None;
            }
        }
        if !self.tick_period.is_zero() {
            while self.next_tick <= self.elapsed {
                due.push((self.next_tick, LoopEvent::PursuerTick));
                self.next_tick += self.tick_period;
            }
        }

        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, event)| event).collect()
    }
}

/// Owns the session and its presenter and drives them in order:
/// resolve input, step the ghost, roll for a scare, check for a catch,
/// flush notifications, redraw.
pub struct GameLoop<P: Presenter> {
    session: GameSession,
    presenter: P,
    timers: Timers,
}

impl<P: Presenter> GameLoop<P> {
    pub fn new(session: GameSession, presenter: P) -> Self {
        let config = session.config();
        let timers = Timers::new(config.activation_delay(), config.tick_period());
        GameLoop {
            session,
            presenter,
            timers,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut GameSession {
        &mut self.session
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Draws the opening frame.
    pub fn start(&mut self) {
        self.presenter
            .update_inventory_display(&self.session.inventory().to_vec());
        self.flush();
    }

    /// Processes one event to completion.
    pub fn dispatch(&mut self, event: LoopEvent) -> Phase {
        debug!(?event, "dispatch");
        self.session.begin_event();

        let phase = match event {
            LoopEvent::Input(command) => {
                match command {
                    Command::Move(direction) => {
                        self.session.attempt_move(direction);
                    }
                    Command::ToggleFlashlight => {
                        self.session.toggle_flashlight();
                    }
                }
                self.session.pursuer_tick();
                self.session.roll_scare();
                self.session.check_caught()
            }
            LoopEvent::PursuerTick => {
                self.session.pursuer_tick();
                self.session.check_caught()
            }
            LoopEvent::ActivatePursuer => {
                self.session.activate_pursuer();
                self.session.check_caught()
            }
            LoopEvent::AdvanceLevel => self.session.advance_level(),
        };

        if matches!(phase, Phase::Caught | Phase::Escaped) {
            self.timers.rearm();
        }
        self.flush();
        phase
    }

    /// Advances the timers by `dt` and dispatches whatever fell due.
    ///
    /// Returns the last terminal phase reached, or `Playing`.
    pub fn advance_time(&mut self, dt: Duration) -> Phase {
        let mut result = Phase::Playing;
        for event in self.timers.advance(dt) {
            let phase = self.dispatch(event);
            if phase != Phase::Playing {
                result = phase;
            }
        }
        result
    }

    fn flush(&mut self) {
        for event in self.session.drain_events() {
            event.deliver(&mut self.presenter);
        }
        self.presenter.render_frame(
            self.session.level(),
            self.session.player(),
            self.session.pursuer(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ItemKind, Position,
        config::GameConfig,
        entity::{Player, Pursuer},
        event::Cue,
        level::{Building, Level},
        session::MSG_CAUGHT,
    };

    #[derive(Default)]
    struct Recorder {
        frames: usize,
        messages: Vec<String>,
        cues: Vec<Cue>,
        inventory: Vec<ItemKind>,
        last_pursuer: Option<Position>,
    }

    impl Presenter for Recorder {
        fn render_frame(&mut self, _level: &Level, _player: &Player, pursuer: &Pursuer) {
            self.frames += 1;
            self.last_pursuer = Some(pursuer.position);
        }

        fn notify(&mut self, message: &str) {
            self.messages.push(message.to_string());
        }

        fn play_cue(&mut self, cue: Cue) {
            self.cues.push(cue);
        }

        fn update_inventory_display(&mut self, items: &[ItemKind]) {
            self.inventory = items.to_vec();
        }
    }

    fn game() -> GameLoop<Recorder> {
        let config = GameConfig {
            note_chance: 0.0,
            scare_chance: 0.0,
            seed: Some(1),
            ..GameConfig::default()
        };
        let session = GameSession::new(Building::builtin().unwrap(), config).unwrap();
        GameLoop::new(session, Recorder::default())
    }

    fn walk(game: &mut GameLoop<Recorder>, direction: Direction, times: usize) {
        for _ in 0..times {
            game.dispatch(LoopEvent::Input(Command::Move(direction)));
        }
    }

    #[test]
    fn timers_fire_activation_once() {
        let mut timers = Timers::new(Duration::from_secs(15), Duration::from_secs(1));
        let early = timers.advance(Duration::from_millis(14_500));
        assert_eq!(early.len(), 14);
        assert!(early.iter().all(|e| *e == LoopEvent::PursuerTick));

        let due = timers.advance(Duration::from_millis(500));
        assert_eq!(due, vec![LoopEvent::ActivatePursuer, LoopEvent::PursuerTick]);

        let later = timers.advance(Duration::from_secs(30));
        assert!(!later.contains(&LoopEvent::ActivatePursuer));
        assert_eq!(later.len(), 30);
    }

    #[test]
    fn rearm_schedules_from_now() {
        let mut timers = Timers::new(Duration::from_secs(2), Duration::from_secs(10));
        assert_eq!(
            timers.advance(Duration::from_secs(3)),
            vec![LoopEvent::ActivatePursuer]
        );
        timers.rearm();
        assert!(timers.advance(Duration::from_secs(1)).is_empty());
        assert_eq!(
            timers.advance(Duration::from_secs(1)),
            vec![LoopEvent::ActivatePursuer]
        );
    }

    #[test]
    fn every_input_redraws() {
        let mut game = game();
        game.start();
        walk(&mut game, Direction::Right, 3);
        game.dispatch(LoopEvent::Input(Command::ToggleFlashlight));
        assert_eq!(game.presenter().frames, 5);
        assert!(!game.session().player().flashlight);
    }

    #[test]
    fn ghost_steps_after_each_move() {
        let mut game = game();
        game.dispatch(LoopEvent::ActivatePursuer);
        assert_eq!(game.presenter().cues, vec![Cue::GhostAwakens]);

        walk(&mut game, Direction::Right, 1);
        // player (2, 1), ghost (14, 5) -> (13, 5)
        assert_eq!(game.session().pursuer().position, Position::new(13, 5));
        assert_eq!(game.presenter().last_pursuer, Some(Position::new(13, 5)));
    }

    #[test]
    fn catch_is_checked_after_the_ghost_moves() {
        let mut game = game();
        game.dispatch(LoopEvent::ActivatePursuer);
        game.session_mut().pursuer_mut().position = Position::new(3, 1);

        let phase = game.dispatch(LoopEvent::Input(Command::Move(Direction::Right)));
        assert_eq!(phase, Phase::Caught);
        assert_eq!(game.session().player().position, Position::new(1, 1));
        assert!(!game.session().pursuer().active);
        assert!(game.presenter().messages.contains(&MSG_CAUGHT.to_string()));
        assert!(game.presenter().inventory.is_empty());
    }

    #[test]
    fn timer_tick_can_catch_without_input() {
        let mut game = game();
        game.dispatch(LoopEvent::ActivatePursuer);
        game.session_mut().pursuer_mut().position = Position::new(1, 2);
        assert_eq!(game.dispatch(LoopEvent::PursuerTick), Phase::Caught);
    }

    #[test]
    fn input_and_timer_ticks_both_move_the_ghost() {
        let mut game = game();
        game.dispatch(LoopEvent::ActivatePursuer);
        walk(&mut game, Direction::Down, 1);
        game.dispatch(LoopEvent::PursuerTick);
        // two steps along x from (14, 5)
        assert_eq!(game.session().pursuer().position, Position::new(12, 5));
    }

    #[test]
    fn advance_time_wakes_the_ghost() {
        let mut game = game();
        assert_eq!(game.advance_time(Duration::from_secs(14)), Phase::Playing);
        assert!(!game.session().pursuer().active);
        game.advance_time(Duration::from_secs(1));
        assert!(game.session().pursuer().active);
        // the tick at 15s ran after activation
        assert_eq!(game.session().pursuer().position, Position::new(13, 5));
    }

    #[test]
    fn caught_rearms_activation() {
        let mut game = game();
        game.advance_time(Duration::from_secs(15));
        game.session_mut().pursuer_mut().position = Position::new(1, 2);
        assert_eq!(game.advance_time(Duration::from_secs(1)), Phase::Caught);
        assert!(!game.session().pursuer().active);

        game.advance_time(Duration::from_secs(14));
        assert!(!game.session().pursuer().active);
        game.advance_time(Duration::from_secs(1));
        assert!(game.session().pursuer().active);
    }

    #[test]
    fn escape_through_advance_level() {
        let mut game = game();
        assert_eq!(game.dispatch(LoopEvent::AdvanceLevel), Phase::LevelCleared);
        assert_eq!(game.session().current_level(), 1);
        assert_eq!(game.dispatch(LoopEvent::AdvanceLevel), Phase::Escaped);
        assert_eq!(game.session().current_level(), 0);
        assert_eq!(game.session().player().position, Position::new(1, 1));
        // next event starts a fresh phase
        walk(&mut game, Direction::Right, 1);
        assert_eq!(game.session().phase(), Phase::Playing);
    }
}
