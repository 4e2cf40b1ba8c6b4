use std::fmt;

use bravo_common::Ticket;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::{Phase, PhaseSnapshot};

/// Inputs to the transition function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    /// Operator starts a draw.
    Start,
    /// The pending delay for the current phase ran out.
    Elapsed,
    /// The random pick for a `Selecting` phase.
    Picked { index: usize },
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Start => write!(f, "start"),
            Input::Elapsed => write!(f, "elapsed"),
            Input::Picked { index } => write!(f, "picked({index})"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Sound {
    Suspense,
    Win,
}

/// Presentation cues. The engine never renders; it tells the UI when.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    EnterFullscreen,
    ExitFullscreen,
    PlaySound(Sound),
    StopSound(Sound),
    ShowConfetti,
    HideConfetti,
}

/// Published when a draw starts, before anyone knows the winner.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
pub struct DrawReceipt {
    pub draw_id: u64,
    pub pool_size: usize,
    /// Hex pool fingerprint over the ordered ticket numbers.
    pub pool_digest: String,
    /// Hex commitment to the draw seed.
    pub seed_commit: String,
}

/// Published once the winner is picked; carries everything needed to
/// re-derive the pick with `randomness::verify_draw`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct DrawOutcome {
    pub draw_id: u64,
    pub winner: Ticket,
    pub winner_index: usize,
    pub pool_size: usize,
    pub pool_digest: String,
    pub seed: String,
    pub seed_commit: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum RaffleEvent {
    Started(DrawReceipt),
    PhaseChanged(PhaseSnapshot),
    Effect { draw_id: u64, effect: Effect },
    WinnerDrawn(DrawOutcome),
    Cancelled { draw_id: u64, phase: Phase },
}

impl RaffleEvent {
    pub fn draw_id(&self) -> u64 {
        match self {
            RaffleEvent::Started(receipt) => receipt.draw_id,
            RaffleEvent::PhaseChanged(snapshot) => snapshot.draw_id,
            RaffleEvent::Effect { draw_id, .. } => *draw_id,
            RaffleEvent::WinnerDrawn(outcome) => outcome.draw_id,
            RaffleEvent::Cancelled { draw_id, .. } => *draw_id,
        }
    }

    pub fn phase(&self) -> Option<Phase> {
        match self {
            RaffleEvent::PhaseChanged(snapshot) => Some(snapshot.phase),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RaffleEvent::Started(_) => "raffle_started",
            RaffleEvent::PhaseChanged(_) => "raffle_phase_changed",
            RaffleEvent::Effect { .. } => "raffle_effect",
            RaffleEvent::WinnerDrawn(_) => "raffle_winner_drawn",
            RaffleEvent::Cancelled { .. } => "raffle_cancelled",
        }
    }
}
