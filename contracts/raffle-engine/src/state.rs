use std::fmt;

use bravo_common::{mask_email, mask_name, mask_national_id, Ticket};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Number of progressive disclosure steps during the reveal.
pub const REVEAL_STAGES: u8 = 4;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum Phase {
    Idle,
    CountingDown { remaining: u8 },
    Selecting,
    Revealing { stage: u8 },
    Celebrating { confetti: bool },
}

impl Phase {
    pub fn is_idle(&self) -> bool {
        matches!(self, Phase::Idle)
    }

    pub fn countdown(&self) -> Option<u8> {
        match self {
            Phase::CountingDown { remaining } => Some(*remaining),
            _ => None,
        }
    }

    /// Reveal stage visible in this phase, 0 before a winner is known.
    pub fn stage(&self) -> u8 {
        match self {
            Phase::Revealing { stage } => *stage,
            Phase::Celebrating { .. } => REVEAL_STAGES,
            _ => 0,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::CountingDown { remaining } => write!(f, "counting_down({remaining})"),
            Phase::Selecting => write!(f, "selecting"),
            Phase::Revealing { stage } => write!(f, "revealing({stage})"),
            Phase::Celebrating { confetti } => write!(f, "celebrating(confetti={confetti})"),
        }
    }
}

/// The winner's data in its displayable, masked form.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
pub struct WinnerCard {
    pub name: String,
    pub ticket_number: String,
    pub phone: String,
    pub email: String,
    pub national_id: String,
}

impl WinnerCard {
    pub fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            name: mask_name(&ticket.holder_name),
            ticket_number: ticket.ticket_number.to_string(),
            phone: ticket.phone.clone(),
            email: mask_email(&ticket.email),
            national_id: mask_national_id(&ticket.national_id),
        }
    }

    /// Fields exposed at `stage`: name, then ticket, then phone, then email
    /// and national ID together.
    pub fn revealed(&self, stage: u8) -> RevealedWinner {
        let show = |from: u8, value: &String| (stage >= from).then(|| value.clone());
        RevealedWinner {
            name: show(1, &self.name),
            ticket_number: show(2, &self.ticket_number),
            phone: show(3, &self.phone),
            email: show(4, &self.email),
            national_id: show(4, &self.national_id),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct RevealedWinner {
    pub name: Option<String>,
    pub ticket_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub national_id: Option<String>,
}

/// One draw, from `start` until it completes or is cancelled.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub draw_id: u64,
    pub phase: Phase,
    /// Validated entries captured at start; never re-fetched.
    pub pool: Vec<Ticket>,
    pub pool_digest: [u8; 32],
    pub seed: [u8; 32],
    pub winner_index: Option<usize>,
    pub card: Option<WinnerCard>,
}

impl Session {
    pub fn winner(&self) -> Option<&Ticket> {
        self.winner_index.and_then(|i| self.pool.get(i))
    }

    pub fn snapshot(&self) -> PhaseSnapshot {
        let stage = self.phase.stage();
        PhaseSnapshot {
            draw_id: self.draw_id,
            phase: self.phase,
            countdown: self.phase.countdown(),
            stage,
            winner: self
                .card
                .as_ref()
                .filter(|_| !self.phase.is_idle())
                .map(|card| card.revealed(stage)),
        }
    }
}

/// What an observer sees after each transition.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
pub struct PhaseSnapshot {
    pub draw_id: u64,
    pub phase: Phase,
    pub countdown: Option<u8>,
    pub stage: u8,
    pub winner: Option<RevealedWinner>,
}
