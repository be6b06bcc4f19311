use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Invalid tunables.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a probability in [0, 1], got {value}")]
    BadProbability { name: &'static str, value: f64 },
    #[error("tick_period_ms must be greater than zero")]
    ZeroTickPeriod,
}

/// Runtime-tunable parameters of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Delay from session start until the ghost wakes up.
    pub activation_delay_ms: u64,
    /// Period of the ghost's independent tick.
    pub tick_period_ms: u64,
    /// Chance that picking up an item also reveals a story note.
    pub note_chance: f64,
    /// Chance that any player input triggers a jump scare.
    pub scare_chance: f64,
    /// Seed for note and scare rolls. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Stop the ghost from stepping into walls or off the floor.
    pub pursuer_respects_walls: bool,
}

impl GameConfig {
    pub const DEFAULT_ACTIVATION_DELAY_MS: u64 = 15_000;
    pub const DEFAULT_TICK_PERIOD_MS: u64 = 1_000;
    pub const DEFAULT_NOTE_CHANCE: f64 = 0.5;
    pub const DEFAULT_SCARE_CHANCE: f64 = 0.02;

    pub fn activation_delay(&self) -> Duration {
        Duration::from_millis(self.activation_delay_ms)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("note_chance", self.note_chance),
            ("scare_chance", self.scare_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::BadProbability { name, value });
            }
        }
        if self.tick_period_ms == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            activation_delay_ms: Self::DEFAULT_ACTIVATION_DELAY_MS,
            tick_period_ms: Self::DEFAULT_TICK_PERIOD_MS,
            note_chance: Self::DEFAULT_NOTE_CHANCE,
            scare_chance: Self::DEFAULT_SCARE_CHANCE,
            seed: None,
            pursuer_respects_walls: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = GameConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.activation_delay(), Duration::from_secs(15));
        assert_eq!(config.tick_period(), Duration::from_secs(1));
    }

    #[test]
    fn rejects_out_of_range_chances() {
        let config = GameConfig {
            scare_chance: 1.5,
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::BadProbability {
                name: "scare_chance",
                value: 1.5
            })
        );

        let config = GameConfig {
            note_chance: f64::NAN,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_tick_period() {
        let config = GameConfig {
            tick_period_ms: 0,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTickPeriod));
    }
}
