//! Runs one live draw over a JSON array of tickets and logs every event.
//!
//! ```text
//! RUST_LOG=info raffle-draw tickets.json
//! ```

use std::env;
use std::fs;

use anyhow::{bail, Context};
use bravo_common::Ticket;
use raffle_engine::pump::{drive, shutdown_signal};
use raffle_engine::reveal::decrypt;
use raffle_engine::{
    OsEntropy, Phase, PhaseSnapshot, RaffleConfig, RaffleEngine, RaffleEvent, TokioScheduler,
};
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let Some(path) = env::args().nth(1) else {
        bail!("usage: raffle-draw <tickets.json>");
    };
    let raw = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let tickets: Vec<Ticket> =
        serde_json::from_str(&raw).with_context(|| format!("parsing tickets from {path}"))?;
    info!(path = %path, loaded = tickets.len(), "tickets loaded");

    let config = RaffleConfig::from_env().context("loading raffle config")?;
    let (scheduler, mut fired) = TokioScheduler::new();
    let mut engine = RaffleEngine::new(config, scheduler, OsEntropy).with_observer(
        |event: &RaffleEvent| {
            match serde_json::to_string(event) {
                Ok(json) => info!(event = event.name(), draw_id = event.draw_id(), %json),
                Err(err) => error!(%err, "failed to serialize raffle event"),
            }
            if let RaffleEvent::PhaseChanged(snapshot) = event {
                for text in newly_revealed(snapshot) {
                    for frame in decrypt(text, rand::thread_rng()) {
                        debug!(%frame, "reveal");
                    }
                }
            }
        },
    );

    let receipt = engine.start(tickets)?;
    info!(
        draw_id = receipt.draw_id,
        pool_size = receipt.pool_size,
        pool_digest = %receipt.pool_digest,
        seed_commit = %receipt.seed_commit,
        "commitment published"
    );

    drive(&mut engine, &mut fired, shutdown_signal()).await?;

    match engine.last_outcome() {
        Some(outcome) => {
            println!("{}", serde_json::to_string_pretty(outcome)?);
            Ok(())
        }
        None => bail!("draw {} was cancelled before a winner was drawn", receipt.draw_id),
    }
}

/// The fields that became visible with this snapshot's reveal stage.
fn newly_revealed(snapshot: &PhaseSnapshot) -> Vec<&str> {
    let Some(winner) = snapshot.winner.as_ref() else {
        return Vec::new();
    };
    let fields = match snapshot.phase {
        Phase::Revealing { stage: 1 } => vec![&winner.name],
        Phase::Revealing { stage: 2 } => vec![&winner.ticket_number],
        Phase::Revealing { stage: 3 } => vec![&winner.phone],
        Phase::Revealing { stage: 4 } => vec![&winner.email, &winner.national_id],
        _ => Vec::new(),
    };
    fields.into_iter().filter_map(|f| f.as_deref()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use raffle_engine::RevealedWinner;

    fn snapshot(stage: u8) -> PhaseSnapshot {
        let show = |from: u8, value: &str| (stage >= from).then(|| value.to_string());
        PhaseSnapshot {
            draw_id: 1,
            phase: Phase::Revealing { stage },
            countdown: None,
            stage,
            winner: Some(RevealedWinner {
                name: show(1, "Maria S."),
                ticket_number: show(2, "482913"),
                phone: show(3, "11988887777"),
                email: show(4, "m***@bravo.bet"),
                national_id: show(4, "529.***.***-25"),
            }),
        }
    }

    #[test]
    fn test_newly_revealed_per_stage() {
        assert_eq!(newly_revealed(&snapshot(1)), vec!["Maria S."]);
        assert_eq!(newly_revealed(&snapshot(3)), vec!["11988887777"]);
        assert_eq!(
            newly_revealed(&snapshot(4)),
            vec!["m***@bravo.bet", "529.***.***-25"]
        );
    }

    #[test]
    fn test_nothing_revealed_outside_reveal() {
        let mut idle = snapshot(4);
        idle.phase = Phase::Celebrating { confetti: true };
        assert!(newly_revealed(&idle).is_empty());
        idle.winner = None;
        idle.phase = Phase::Revealing { stage: 4 };
        assert!(newly_revealed(&idle).is_empty());
    }
}
