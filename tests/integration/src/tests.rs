//! Integration tests for the Bravo funnel.
//!
//! Tickets are issued and validated through the lead desk, then drawn by the
//! raffle engine. Draws run on the virtual `ManualScheduler` except for the
//! tokio pump tests, which run with paused time.
//!
//! Run:
//! ```bash
//! cargo test -p bravo-integration-tests
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use bravo_common::{validate_cpf, Experience, MemorySink, Ticket, TicketNumber};
use lead_desk::msg::{LeadsResponse, TicketResponse, TicketsResponse};
use lead_desk::{
    DeskConfig, DeskError, Env, ExecuteMsg, InMemoryAuth, LeadDesk, LeadFilter, MessageInfo,
    QueryMsg, StaticLocator, SubmissionForm,
};
use raffle_engine::pump::drive;
use raffle_engine::{
    verify_draw, Effect, ManualScheduler, Phase, RaffleConfig, RaffleEngine, RaffleError,
    RaffleEvent, SeededEntropy, TokioScheduler,
};

// ─── Helpers ───

/// Valid CPFs, one per participant.
const CPFS: [&str; 5] = [
    "529.982.247-25",
    "111.444.777-35",
    "123.456.789-09",
    "935.411.347-80",
    "390.533.447-05",
];

type Log = Rc<RefCell<Vec<RaffleEvent>>>;

fn setup_desk(sink: Arc<MemorySink>) -> (LeadDesk, MessageInfo) {
    let mut desk = LeadDesk::new(
        DeskConfig::default(),
        InMemoryAuth::new().with_user("admin@bravo.bet", "s3nha"),
        StaticLocator::new(),
    )
    .with_sink(sink)
    .with_rng_seed(2025);
    let session = desk.login("admin@bravo.bet", "s3nha").unwrap();
    (desk, MessageInfo::with_token(session.token))
}

fn issue(desk: &mut LeadDesk, i: usize) -> String {
    let res = desk
        .execute(
            &Env::now(),
            &MessageInfo::anonymous(),
            ExecuteMsg::IssueTicket {
                holder_name: format!("Participante {i} Silva"),
                phone: format!("1198888000{i}"),
                email: format!("p{i}@bravo.bet"),
                cpf: CPFS[i].to_string(),
            },
        )
        .unwrap();
    res.attribute("ticket_number").unwrap().to_string()
}

fn validate(desk: &mut LeadDesk, admin: &MessageInfo, number: &str) {
    desk.execute(
        &Env::now(),
        admin,
        ExecuteMsg::ValidateTicket {
            ticket_number: number.to_string(),
        },
    )
    .unwrap();
}

fn setup_engine() -> (RaffleEngine<ManualScheduler>, Log) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    let engine = RaffleEngine::new(
        RaffleConfig::default(),
        ManualScheduler::new(),
        SeededEntropy::new(b"integration"),
    )
    .with_observer(move |event: &RaffleEvent| sink.borrow_mut().push(event.clone()));
    (engine, log)
}

fn numbers(tickets: &[Ticket]) -> Vec<TicketNumber> {
    tickets.iter().map(|t| t.ticket_number.clone()).collect()
}

// ─── Tests ───

#[test]
fn test_test_vectors_are_valid_cpfs() {
    assert!(CPFS.iter().all(|cpf| validate_cpf(cpf)));
}

#[test]
fn test_issue_validate_and_draw() {
    let sink = Arc::new(MemorySink::new());
    let (mut desk, admin) = setup_desk(sink.clone());

    let issued: Vec<String> = (0..5).map(|i| issue(&mut desk, i)).collect();
    for number in &issued[..3] {
        validate(&mut desk, &admin, number);
    }

    let pool = desk.raffle_pool(&admin).unwrap();
    assert_eq!(pool.len(), 3);

    let (mut engine, log) = setup_engine();
    let receipt = engine.start(pool.clone()).unwrap();
    assert_eq!(receipt.pool_size, 3);
    engine.run_to_completion().unwrap();

    let outcome = engine.last_outcome().cloned().unwrap();
    assert!(issued[..3].contains(&outcome.winner.ticket_number.to_string()));
    assert_eq!(outcome.seed_commit, receipt.seed_commit);
    assert_eq!(
        verify_draw(
            &outcome.seed,
            &outcome.seed_commit,
            &numbers(&pool),
            outcome.winner_index
        ),
        Ok(())
    );

    // Effects bracket the show: fullscreen in at start, out at the end.
    let effects: Vec<Effect> = log
        .borrow()
        .iter()
        .filter_map(|e| match e {
            RaffleEvent::Effect { effect, .. } => Some(*effect),
            _ => None,
        })
        .collect();
    assert_eq!(effects.first(), Some(&Effect::EnterFullscreen));
    assert_eq!(effects.last(), Some(&Effect::ExitFullscreen));

    let tracked = sink.names();
    assert_eq!(tracked.iter().filter(|n| *n == "ticket_issued").count(), 5);
    assert_eq!(tracked.iter().filter(|n| *n == "ticket_validated").count(), 3);
}

#[test]
fn test_unvalidated_tickets_never_win() {
    let (mut desk, admin) = setup_desk(Arc::new(MemorySink::new()));
    let issued: Vec<String> = (0..5).map(|i| issue(&mut desk, i)).collect();
    validate(&mut desk, &admin, &issued[4]);

    // Every issued ticket is handed to the engine; only the validated one can win.
    let everything: Vec<Ticket> = (0..5)
        .map(|i| {
            let res: TicketResponse = serde_json::from_value(
                desk.query(
                    &Env::now(),
                    &MessageInfo::anonymous(),
                    QueryMsg::FindTicket {
                        cpf: Some(CPFS[i].to_string()),
                        email: None,
                        phone: None,
                    },
                )
                .unwrap(),
            )
            .unwrap();
            res.ticket.unwrap()
        })
        .collect();
    assert_eq!(everything.len(), 5);
    assert_eq!(everything.iter().filter(|t| t.validated).count(), 1);

    let (mut engine, _log) = setup_engine();
    for _ in 0..20 {
        let receipt = engine.start(everything.clone()).unwrap();
        assert_eq!(receipt.pool_size, 1);
        engine.run_to_completion().unwrap();
        let winner = engine.last_outcome().map(|o| o.winner.ticket_number.to_string());
        assert_eq!(winner.as_deref(), Some(issued[4].as_str()));
    }
}

#[test]
fn test_empty_pool_and_second_start() {
    let (mut desk, admin) = setup_desk(Arc::new(MemorySink::new()));
    issue(&mut desk, 0);

    let (mut engine, log) = setup_engine();
    let err = engine.start(desk.raffle_pool(&admin).unwrap()).unwrap_err();
    assert_eq!(err, RaffleError::EmptyPool);
    assert!(log.borrow().is_empty());

    let number = issue(&mut desk, 1);
    validate(&mut desk, &admin, &number);
    engine.start(desk.raffle_pool(&admin).unwrap()).unwrap();
    let err = engine.start(desk.raffle_pool(&admin).unwrap()).unwrap_err();
    assert!(matches!(err, RaffleError::SessionInProgress { .. }));
}

#[test]
fn test_validation_during_draw_does_not_join_pool() {
    let (mut desk, admin) = setup_desk(Arc::new(MemorySink::new()));
    let first = issue(&mut desk, 0);
    let late = issue(&mut desk, 1);
    validate(&mut desk, &admin, &first);

    let (mut engine, _log) = setup_engine();
    engine.start(desk.raffle_pool(&admin).unwrap()).unwrap();
    engine.advance(Duration::from_millis(1500)).unwrap();

    validate(&mut desk, &admin, &late);
    assert_eq!(desk.raffle_pool(&admin).unwrap().len(), 2);

    engine.run_to_completion().unwrap();
    let outcome = engine.last_outcome().unwrap();
    assert_eq!(outcome.pool_size, 1);
    assert_eq!(outcome.winner.ticket_number.to_string(), first);
}

#[test]
fn test_reveal_shows_masked_winner() {
    let (mut desk, admin) = setup_desk(Arc::new(MemorySink::new()));
    let number = issue(&mut desk, 0);
    validate(&mut desk, &admin, &number);

    let (mut engine, log) = setup_engine();
    engine.start(desk.raffle_pool(&admin).unwrap()).unwrap();
    engine.run_to_completion().unwrap();

    let full = log
        .borrow()
        .iter()
        .find_map(|e| match e {
            RaffleEvent::PhaseChanged(s) if s.phase == (Phase::Revealing { stage: 4 }) => {
                s.winner.clone()
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(full.name.as_deref(), Some("Participante 0."));
    assert_eq!(full.ticket_number.as_deref(), Some(number.as_str()));
    assert_eq!(full.email.as_deref(), Some("p***@bravo.bet"));
    assert_eq!(full.national_id.as_deref(), Some("529.***.***-25"));
}

#[test]
fn test_cancel_then_restart() {
    let (mut desk, admin) = setup_desk(Arc::new(MemorySink::new()));
    for i in 0..3 {
        let number = issue(&mut desk, i);
        validate(&mut desk, &admin, &number);
    }
    let pool = desk.raffle_pool(&admin).unwrap();

    let (mut engine, log) = setup_engine();
    engine.start(pool.clone()).unwrap();
    engine.advance(Duration::from_millis(4000)).unwrap();
    assert!(matches!(engine.phase(), Phase::Revealing { .. }));
    assert!(engine.cancel());

    let before = log.borrow().len();
    let receipt = engine.start(pool).unwrap();
    assert_eq!(receipt.draw_id, 2);
    engine.run_to_completion().unwrap();
    assert!(log.borrow()[before..].iter().all(|e| e.draw_id() == 2));
    assert_eq!(engine.last_outcome().map(|o| o.draw_id), Some(2));
}

#[test]
fn test_lead_dashboard_flow() {
    let sink = Arc::new(MemorySink::new());
    let (mut desk, admin) = setup_desk(sink.clone());
    let env = Env::now();

    for (name, experience) in [
        ("Ana Lima", Experience::Yes),
        ("Bruno Costa", Experience::No),
        ("Carla Dias", Experience::Yes),
    ] {
        desk.execute(
            &env,
            &MessageInfo::anonymous(),
            ExecuteMsg::SubmitForm {
                form: SubmissionForm {
                    name: name.to_string(),
                    phone: "11988887777".to_string(),
                    email: format!("{}@x.com", name.split(' ').next().unwrap_or("lead")),
                    experience,
                    monthly_revenue: None,
                    traffic_source: None,
                    cpf: None,
                },
                ip_address: Some("187.10.2.3".to_string()),
            },
        )
        .unwrap();
    }
    assert_eq!(sink.names().iter().filter(|n| *n == "conversion").count(), 3);

    let only_yes = LeadFilter {
        experience: Some(Experience::Yes),
        ..LeadFilter::default()
    };
    let res: LeadsResponse = serde_json::from_value(
        desk.query(&env, &admin, QueryMsg::Leads { filter: only_yes })
            .unwrap(),
    )
    .unwrap();
    assert_eq!(res.counts.yes, 2);
    assert_eq!(res.counts.total, 2);

    let id = res.leads[0].id;
    desk.execute(&env, &admin, ExecuteMsg::SetContacted { id, contacted: true })
        .unwrap();
    desk.execute(&env, &admin, ExecuteMsg::DeleteLead { id }).unwrap();
    let err = desk
        .execute(&env, &admin, ExecuteMsg::DeleteLead { id })
        .unwrap_err();
    assert!(matches!(err, DeskError::NotFound { .. }));

    let res: LeadsResponse = serde_json::from_value(
        desk.query(
            &env,
            &admin,
            QueryMsg::Leads {
                filter: LeadFilter::default(),
            },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(res.leads.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_tokio_draw_over_desk_pool() {
    let (mut desk, admin) = setup_desk(Arc::new(MemorySink::new()));
    for i in 0..4 {
        let number = issue(&mut desk, i);
        validate(&mut desk, &admin, &number);
    }
    let pool = desk.raffle_pool(&admin).unwrap();

    let (scheduler, mut fired) = TokioScheduler::new();
    let mut engine = RaffleEngine::new(
        RaffleConfig::default(),
        scheduler,
        SeededEntropy::new(b"integration"),
    );
    engine.start(pool.clone()).unwrap();
    drive(&mut engine, &mut fired, std::future::pending())
        .await
        .unwrap();

    let outcome = engine.last_outcome().cloned().unwrap();
    assert_eq!(
        verify_draw(
            &outcome.seed,
            &outcome.seed_commit,
            &numbers(&pool),
            outcome.winner_index
        ),
        Ok(())
    );
    assert!(!engine.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_tokio_draw_cancelled_by_shutdown() {
    let (mut desk, admin) = setup_desk(Arc::new(MemorySink::new()));
    let number = issue(&mut desk, 0);
    validate(&mut desk, &admin, &number);

    let (scheduler, mut fired) = TokioScheduler::new();
    let mut engine = RaffleEngine::new(
        RaffleConfig::default(),
        scheduler,
        SeededEntropy::new(b"integration"),
    );
    engine.start(desk.raffle_pool(&admin).unwrap()).unwrap();
    drive(
        &mut engine,
        &mut fired,
        tokio::time::sleep(Duration::from_millis(3500)),
    )
    .await
    .unwrap();

    // 3.5s in: the winner was drawn at 3s but the show never finished.
    assert!(!engine.is_active());
    assert!(engine.last_outcome().is_some());
    assert_eq!(engine.phase(), Phase::Idle);
}
