//! Timer abstraction the engine schedules its phase delays through.
//!
//! [`ManualScheduler`] keeps a virtual clock and is advanced explicitly.
//! [`TokioScheduler`] backs each timer with a `tokio::time::sleep` task and
//! reports expiries over a channel that the pump drains.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

pub trait Scheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId;
    /// Cancelling an unknown or already fired timer is a no-op.
    fn cancel(&mut self, id: TimerId);
}

#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<(Duration, u64), TimerId>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Removes the earliest timer due at or before `until`, moving the clock
    /// to its deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<TimerId> {
        let key = *self.timers.keys().next()?;
        if key.0 > until {
            return None;
        }
        self.now = self.now.max(key.0);
        self.timers.remove(&key)
    }

    /// Removes the earliest timer whatever its deadline.
    pub fn pop_next(&mut self) -> Option<TimerId> {
        let deadline = self.next_deadline()?;
        self.pop_due(deadline)
    }

    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.insert((self.now + delay, id.0), id);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.timers.retain(|_, timer| *timer != id);
    }
}

/// Must be used from inside a tokio runtime.
#[derive(Debug)]
pub struct TokioScheduler {
    next_id: u64,
    fired: UnboundedSender<TimerId>,
    tasks: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new() -> (Self, UnboundedReceiver<TimerId>) {
        let (fired, receiver) = unbounded_channel();
        let scheduler = Self {
            next_id: 0,
            fired,
            tasks: HashMap::new(),
        };
        (scheduler, receiver)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        self.tasks.retain(|_, task| !task.is_finished());

        let id = TimerId(self.next_id);
        self.next_id += 1;

        let fired = self.fired.clone();
        let task = tokio::spawn(async move {
            sleep(delay).await;
            // The receiver is gone once the pump has stopped.
            let _ = fired.send(id);
        });
        self.tasks.insert(id, task);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(task) = self.tasks.remove(&id) {
            debug!(timer = id.0, "aborting timer");
            task.abort();
        }
    }
}
