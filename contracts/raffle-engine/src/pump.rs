use std::future::Future;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::engine::RaffleEngine;
use crate::error::RaffleError;
use crate::scheduler::{TimerId, TokioScheduler};

/// Feeds expired timers into `engine` until the running draw is over.
///
/// If `shutdown` resolves first the draw is cancelled. Returns immediately
/// when no draw is active.
pub async fn drive<F>(
    engine: &mut RaffleEngine<TokioScheduler>,
    fired: &mut UnboundedReceiver<TimerId>,
    shutdown: F,
) -> Result<(), RaffleError>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    while engine.is_active() {
        tokio::select! {
            timer = fired.recv() => match timer {
                Some(timer) => engine.fire(timer)?,
                None => {
                    warn!("timer channel closed, cancelling draw");
                    engine.cancel();
                }
            },
            _ = &mut shutdown => {
                info!("shutdown requested, cancelling draw");
                engine.cancel();
            }
        }
    }
    Ok(())
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal");
            }
            Err(err) => {
                warn!(%err, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use bravo_common::Ticket;
    use chrono::Utc;
    use tokio::time::{sleep, Instant};

    use super::*;
    use crate::config::RaffleConfig;
    use crate::msg::RaffleEvent;
    use crate::randomness::SeededEntropy;
    use crate::state::Phase;

    fn pool() -> Vec<Ticket> {
        ["100001", "100002"]
            .into_iter()
            .map(|number| Ticket {
                ticket_number: number.into(),
                holder_name: "Ana Lima".to_string(),
                phone: "11987654321".to_string(),
                email: "ana@bravo.bet".to_string(),
                national_id: "52998224725".to_string(),
                validated: true,
                created_at: Utc::now(),
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_runs_full_draw() {
        let (scheduler, mut fired) = TokioScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let mut engine = RaffleEngine::new(
            RaffleConfig::default(),
            scheduler,
            SeededEntropy::new(b"pump"),
        )
        .with_observer(move |event: &RaffleEvent| sink.borrow_mut().push(event.clone()));

        let started = Instant::now();
        engine.start(pool()).unwrap();
        drive(&mut engine, &mut fired, std::future::pending()).await.unwrap();

        // "Ana Lima" and a six digit ticket.
        let expected = 3000 + (8 * 80 + 600) + (6 * 80 + 400) + 1200 + 1200 + 5000;
        assert_eq!(started.elapsed(), Duration::from_millis(expected));
        assert!(!engine.is_active());
        assert_eq!(
            log.borrow().iter().filter_map(RaffleEvent::phase).last(),
            Some(Phase::Idle)
        );
        assert!(engine.last_outcome().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_cancels_on_shutdown() {
        let (scheduler, mut fired) = TokioScheduler::new();
        let mut engine = RaffleEngine::new(
            RaffleConfig::default(),
            scheduler,
            SeededEntropy::new(b"pump"),
        );

        engine.start(pool()).unwrap();
        drive(&mut engine, &mut fired, sleep(Duration::from_millis(1500)))
            .await
            .unwrap();

        assert!(!engine.is_active());
        assert!(engine.last_outcome().is_none());
        // The aborted countdown timer never reaches the channel.
        sleep(Duration::from_secs(10)).await;
        assert!(fired.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_drive_without_draw_returns() {
        let (scheduler, mut fired) = TokioScheduler::new();
        let mut engine = RaffleEngine::new(
            RaffleConfig::default(),
            scheduler,
            SeededEntropy::new(b"pump"),
        );
        drive(&mut engine, &mut fired, std::future::pending()).await.unwrap();
    }
}
