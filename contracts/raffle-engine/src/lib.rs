pub mod config;
pub mod engine;
pub mod error;
pub mod msg;
pub mod pump;
pub mod randomness;
pub mod reveal;
pub mod scheduler;
pub mod state;
pub mod transition;

pub use crate::config::RaffleConfig;
pub use crate::engine::{RaffleEngine, RaffleObserver};
pub use crate::error::{RaffleError, VerifyError};
pub use crate::msg::{DrawOutcome, DrawReceipt, Effect, RaffleEvent, Sound};
pub use crate::randomness::{verify_draw, EntropySource, OsEntropy, SeededEntropy};
pub use crate::scheduler::{ManualScheduler, Scheduler, TimerId, TokioScheduler};
pub use crate::state::{Phase, PhaseSnapshot, RevealedWinner, WinnerCard};
