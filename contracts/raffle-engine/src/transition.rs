//! The raffle as a pure function: `(phase, input) -> (phase', effects, wait)`.
//!
//! Nothing here touches timers, randomness or observers. The engine feeds the
//! inputs and schedules `wait`; tests can walk the whole show by hand.

use std::time::Duration;

use bravo_common::Ticket;

use crate::config::RaffleConfig;
use crate::error::RaffleError;
use crate::msg::{Effect, Input, Sound};
use crate::state::{Phase, REVEAL_STAGES};

/// Read-only view of the session the transition may consult.
pub struct StepContext<'a> {
    pub config: &'a RaffleConfig,
    pub pool: &'a [Ticket],
    pub winner: Option<&'a Ticket>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub phase: Phase,
    pub effects: Vec<Effect>,
    /// Delay before the next `Elapsed`/`Picked` input; `None` once idle.
    pub wait: Option<Duration>,
}

impl Transition {
    fn to(phase: Phase, wait: Duration) -> Self {
        Self {
            phase,
            effects: Vec::new(),
            wait: Some(wait),
        }
    }

    fn with(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

pub fn step(phase: Phase, input: Input, ctx: &StepContext) -> Result<Transition, RaffleError> {
    let config = ctx.config;

    match (phase, input) {
        (Phase::Idle, Input::Start) => {
            if ctx.pool.is_empty() {
                return Err(RaffleError::EmptyPool);
            }
            Ok(Transition::to(
                Phase::CountingDown {
                    remaining: config.countdown_from,
                },
                config.countdown_interval,
            )
            .with(Effect::EnterFullscreen)
            .with(Effect::PlaySound(Sound::Suspense)))
        }

        (Phase::CountingDown { remaining }, Input::Elapsed) if remaining > 1 => Ok(Transition::to(
            Phase::CountingDown {
                remaining: remaining - 1,
            },
            config.countdown_interval,
        )),

        // The pick happens on the next turn of the loop so that observers see
        // `Selecting` on its own.
        (Phase::CountingDown { .. }, Input::Elapsed) => {
            Ok(Transition::to(Phase::Selecting, Duration::ZERO)
                .with(Effect::StopSound(Sound::Suspense)))
        }

        (Phase::Selecting, Input::Picked { index }) => {
            let winner = ctx.pool.get(index).ok_or(RaffleError::PickOutOfRange {
                index,
                pool_size: ctx.pool.len(),
            })?;
            Ok(Transition::to(
                Phase::Revealing { stage: 1 },
                config.name_reveal(winner),
            ))
        }

        (Phase::Revealing { stage }, Input::Elapsed) if stage < REVEAL_STAGES => {
            let winner = ctx.winner.ok_or_else(|| invalid(phase, input))?;
            let next = stage + 1;
            let wait = match next {
                2 => config.ticket_reveal(winner),
                3 => config.phone_reveal,
                _ => config.contact_reveal,
            };
            Ok(Transition::to(Phase::Revealing { stage: next }, wait))
        }

        (Phase::Revealing { .. }, Input::Elapsed) => Ok(Transition::to(
            Phase::Celebrating { confetti: true },
            config.confetti,
        )
        .with(Effect::ShowConfetti)
        .with(Effect::PlaySound(Sound::Win))),

        (Phase::Celebrating { confetti: true }, Input::Elapsed) => Ok(Transition::to(
            Phase::Celebrating { confetti: false },
            config.after_confetti(),
        )
        .with(Effect::HideConfetti)),

        (Phase::Celebrating { confetti: false }, Input::Elapsed) => Ok(Transition {
            phase: Phase::Idle,
            effects: vec![Effect::ExitFullscreen],
            wait: None,
        }),

        _ => Err(invalid(phase, input)),
    }
}

fn invalid(phase: Phase, input: Input) -> RaffleError {
    RaffleError::InvalidTransition {
        phase: phase.to_string(),
        input: input.to_string(),
    }
}
