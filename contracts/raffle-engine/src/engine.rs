use std::time::Duration;

use bravo_common::digest::pool_digest;
use bravo_common::{seed_commitment, Ticket};
use tracing::{debug, info, warn};

use crate::config::RaffleConfig;
use crate::error::RaffleError;
use crate::msg::{DrawOutcome, DrawReceipt, Input, RaffleEvent};
use crate::randomness::{winner_index, EntropySource};
use crate::scheduler::{ManualScheduler, Scheduler, TimerId};
use crate::state::{Phase, Session, WinnerCard};
use crate::transition::{step, StepContext, Transition};

pub trait RaffleObserver {
    fn on_event(&mut self, event: &RaffleEvent);
}

impl<F: FnMut(&RaffleEvent)> RaffleObserver for F {
    fn on_event(&mut self, event: &RaffleEvent) {
        self(event)
    }
}

/// Owns the single raffle session and drives it through [`step`].
///
/// Every delay goes through the scheduler; whoever owns the scheduler's clock
/// calls [`RaffleEngine::fire`] when a timer expires.
pub struct RaffleEngine<S: Scheduler> {
    config: RaffleConfig,
    scheduler: S,
    entropy: Box<dyn EntropySource>,
    observers: Vec<Box<dyn RaffleObserver>>,
    session: Option<Session>,
    pending: Option<TimerId>,
    next_draw_id: u64,
    last_outcome: Option<DrawOutcome>,
}

impl<S: Scheduler> RaffleEngine<S> {
    pub fn new(config: RaffleConfig, scheduler: S, entropy: impl EntropySource + 'static) -> Self {
        Self {
            config,
            scheduler,
            entropy: Box::new(entropy),
            observers: Vec::new(),
            session: None,
            pending: None,
            next_draw_id: 1,
            last_outcome: None,
        }
    }

    pub fn with_observer(mut self, observer: impl RaffleObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn add_observer(&mut self, observer: impl RaffleObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn config(&self) -> &RaffleConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn phase(&self) -> Phase {
        self.session.as_ref().map_or(Phase::Idle, |s| s.phase)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Outcome of the most recent draw that reached a winner.
    pub fn last_outcome(&self) -> Option<&DrawOutcome> {
        self.last_outcome.as_ref()
    }

    /// Starts a draw over the validated entries in `entries`.
    ///
    /// The pool is captured here; later changes to the ticket store do not
    /// reach this session.
    pub fn start<I>(&mut self, entries: I) -> Result<DrawReceipt, RaffleError>
    where
        I: IntoIterator<Item = Ticket>,
    {
        if let Some(session) = &self.session {
            warn!(draw_id = session.draw_id, "start rejected, draw in progress");
            return Err(RaffleError::SessionInProgress {
                draw_id: session.draw_id,
            });
        }

        let pool: Vec<Ticket> = entries.into_iter().filter(|t| t.validated).collect();
        let transition = step(
            Phase::Idle,
            Input::Start,
            &StepContext {
                config: &self.config,
                pool: &pool,
                winner: None,
            },
        )?;

        let seed = self.entropy.next_seed();
        let digest = pool_digest(pool.iter().map(|t| &t.ticket_number));
        let draw_id = self.next_draw_id;
        self.next_draw_id += 1;

        let receipt = DrawReceipt {
            draw_id,
            pool_size: pool.len(),
            pool_digest: hex::encode(digest),
            seed_commit: hex::encode(seed_commitment(&seed)),
        };
        info!(
            draw_id,
            pool_size = receipt.pool_size,
            seed_commit = %receipt.seed_commit,
            "raffle started"
        );

        self.session = Some(Session {
            draw_id,
            phase: Phase::Idle,
            pool,
            pool_digest: digest,
            seed,
            winner_index: None,
            card: None,
        });
        self.emit(RaffleEvent::Started(receipt.clone()));
        self.apply(transition);

        Ok(receipt)
    }

    /// Handles an expired timer. Timers that are not the pending one, such
    /// as those left over from a cancelled draw, are ignored.
    pub fn fire(&mut self, timer: TimerId) -> Result<(), RaffleError> {
        if self.pending != Some(timer) {
            debug!(timer = timer.0, "ignoring stale timer");
            return Ok(());
        }
        self.pending = None;

        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };

        let input = match session.phase {
            Phase::Selecting => Input::Picked {
                index: winner_index(&session.seed, &session.pool_digest, session.pool.len())
                    .ok_or(RaffleError::EmptyPool)?,
            },
            _ => Input::Elapsed,
        };

        let result = step(
            session.phase,
            input,
            &StepContext {
                config: &self.config,
                pool: &session.pool,
                winner: session.winner(),
            },
        );

        let transition = match result {
            Ok(transition) => transition,
            Err(err) => {
                warn!(%err, "raffle transition failed, aborting draw");
                self.cancel();
                return Err(err);
            }
        };

        if let Input::Picked { index } = input {
            self.record_winner(index);
        }
        self.apply(transition);
        Ok(())
    }

    /// Aborts the current draw. Returns whether there was one.
    ///
    /// The pending timer is cancelled and no transition follows; only a
    /// `Cancelled` event is emitted.
    pub fn cancel(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        if let Some(timer) = self.pending.take() {
            self.scheduler.cancel(timer);
        }

        info!(draw_id = session.draw_id, phase = %session.phase, "raffle cancelled");
        self.emit(RaffleEvent::Cancelled {
            draw_id: session.draw_id,
            phase: session.phase,
        });
        true
    }

    fn record_winner(&mut self, index: usize) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.winner_index = Some(index);

        let Some(winner) = session.winner().cloned() else {
            return;
        };
        session.card = Some(WinnerCard::from_ticket(&winner));

        let outcome = DrawOutcome {
            draw_id: session.draw_id,
            winner_index: index,
            pool_size: session.pool.len(),
            pool_digest: hex::encode(session.pool_digest),
            seed: hex::encode(session.seed),
            seed_commit: hex::encode(seed_commitment(&session.seed)),
            winner,
        };
        info!(
            draw_id = outcome.draw_id,
            ticket_number = %outcome.winner.ticket_number,
            winner_index = index,
            "raffle winner drawn"
        );

        self.last_outcome = Some(outcome.clone());
        self.emit(RaffleEvent::WinnerDrawn(outcome));
    }

    fn apply(&mut self, transition: Transition) {
        let Transition {
            phase,
            effects,
            wait,
        } = transition;

        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.phase = phase;
        let draw_id = session.draw_id;
        let snapshot = session.snapshot();

        debug!(draw_id, %phase, "raffle phase changed");
        self.emit(RaffleEvent::PhaseChanged(snapshot));
        for effect in effects {
            self.emit(RaffleEvent::Effect { draw_id, effect });
        }

        match wait {
            Some(delay) if !phase.is_idle() => {
                self.pending = Some(self.scheduler.schedule(delay));
            }
            _ => {
                info!(draw_id, "raffle finished");
                self.session = None;
                self.pending = None;
            }
        }
    }

    fn emit(&mut self, event: RaffleEvent) {
        for observer in self.observers.iter_mut() {
            observer.on_event(&event);
        }
    }
}

impl RaffleEngine<ManualScheduler> {
    /// Moves the virtual clock forward, firing every timer that falls due,
    /// including timers scheduled along the way.
    pub fn advance(&mut self, by: Duration) -> Result<(), RaffleError> {
        let until = self.scheduler.now() + by;
        while let Some(timer) = self.scheduler.pop_due(until) {
            self.fire(timer)?;
        }
        self.scheduler.set_now(until);
        Ok(())
    }

    /// Fires timers until the current draw is over.
    pub fn run_to_completion(&mut self) -> Result<(), RaffleError> {
        while self.session.is_some() {
            match self.scheduler.pop_next() {
                Some(timer) => self.fire(timer)?,
                None => break,
            }
        }
        Ok(())
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }
}
