use std::time::Duration;

use bravo_common::env::{try_load, try_load_millis};
use bravo_common::{ConfigError, Ticket};
use serde::{Deserialize, Serialize};

/// Pacing of a draw. Defaults mirror the live raffle show.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct RaffleConfig {
    /// First countdown value; the countdown ticks down to 1.
    pub countdown_from: u8,
    pub countdown_interval: Duration,
    /// Per-character pacing of the name and ticket-number reveals.
    pub reveal_per_char: Duration,
    pub name_reveal_base: Duration,
    pub ticket_reveal_base: Duration,
    pub phone_reveal: Duration,
    pub contact_reveal: Duration,
    /// How long confetti stays up once celebrating.
    pub confetti: Duration,
    /// Whole celebration, confetti included, before the session resets.
    pub celebration: Duration,
    /// Interval between decrypt-effect frames.
    pub scramble_frame: Duration,
}

impl Default for RaffleConfig {
    fn default() -> Self {
        Self {
            countdown_from: 3,
            countdown_interval: Duration::from_millis(1000),
            reveal_per_char: Duration::from_millis(80),
            name_reveal_base: Duration::from_millis(600),
            ticket_reveal_base: Duration::from_millis(400),
            phone_reveal: Duration::from_millis(1200),
            contact_reveal: Duration::from_millis(1200),
            confetti: Duration::from_millis(3500),
            celebration: Duration::from_millis(5000),
            scramble_frame: Duration::from_millis(160),
        }
    }
}

impl RaffleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let d = Self::default();
        let config = Self {
            countdown_from: try_load("RAFFLE_COUNTDOWN_FROM", d.countdown_from)?,
            countdown_interval: try_load_millis("RAFFLE_COUNTDOWN_MS", d.countdown_interval)?,
            reveal_per_char: try_load_millis("RAFFLE_REVEAL_PER_CHAR_MS", d.reveal_per_char)?,
            name_reveal_base: try_load_millis("RAFFLE_NAME_REVEAL_MS", d.name_reveal_base)?,
            ticket_reveal_base: try_load_millis("RAFFLE_TICKET_REVEAL_MS", d.ticket_reveal_base)?,
            phone_reveal: try_load_millis("RAFFLE_PHONE_REVEAL_MS", d.phone_reveal)?,
            contact_reveal: try_load_millis("RAFFLE_CONTACT_REVEAL_MS", d.contact_reveal)?,
            confetti: try_load_millis("RAFFLE_CONFETTI_MS", d.confetti)?,
            celebration: try_load_millis("RAFFLE_CELEBRATION_MS", d.celebration)?,
            scramble_frame: try_load_millis("RAFFLE_SCRAMBLE_FRAME_MS", d.scramble_frame)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.countdown_from == 0 {
            return Err(ConfigError::Invalid {
                key: "countdown_from".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.celebration < self.confetti {
            return Err(ConfigError::Invalid {
                key: "celebration".to_string(),
                reason: "must not be shorter than confetti".to_string(),
            });
        }
        Ok(())
    }

    /// Time the winner's name is on screen before the ticket number shows.
    pub fn name_reveal(&self, winner: &Ticket) -> Duration {
        self.reveal_per_char * winner.holder_name.chars().count() as u32 + self.name_reveal_base
    }

    /// Time the ticket number is on screen before the phone shows.
    pub fn ticket_reveal(&self, winner: &Ticket) -> Duration {
        self.reveal_per_char * winner.ticket_number.char_len() as u32 + self.ticket_reveal_base
    }

    /// Celebration time left once the confetti is hidden.
    pub fn after_confetti(&self) -> Duration {
        self.celebration.saturating_sub(self.confetti)
    }
}
