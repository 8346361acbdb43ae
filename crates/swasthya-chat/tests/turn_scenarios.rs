//! End-to-end turn-taking scenarios across catalog, scheduler and turn manager.

use std::sync::Arc;
use std::time::Duration;

use swasthya_chat::catalog::{BUILTIN_ENTRIES, FEVER_ENTRY};
use swasthya_chat::{
    FixedIndex, ManualScheduler, ReplyScheduler, ResponseCatalog, SeededRandom, TokioScheduler,
    TurnManager, DEFAULT_REPLY_DELAY,
};
use swasthya_core::types::Origin;
use swasthya_core::ChatEvent;

// =============================================================================
// Helpers
// =============================================================================

fn manual_session(pick: usize) -> (Arc<ManualScheduler>, TurnManager) {
    let scheduler = Arc::new(ManualScheduler::new());
    let dyn_scheduler: Arc<dyn ReplyScheduler> = scheduler.clone();
    let turns = TurnManager::new(
        Arc::new(ResponseCatalog::builtin()),
        Arc::new(FixedIndex(pick)),
        dyn_scheduler,
    );
    (scheduler, turns)
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn high_fever_scenario() {
    let (scheduler, mut turns) = manual_session(0);

    turns.submit_user_text("I have a high fever");
    let conv = turns.conversation();
    assert_eq!(conv.len(), 1);
    assert_eq!(conv[0].text, "I have a high fever");
    assert_eq!(conv[0].origin, Origin::User);

    scheduler.advance(DEFAULT_REPLY_DELAY);
    let conv = turns.conversation();
    assert_eq!(conv.len(), 2);
    assert_eq!(conv[1].origin, Origin::Assistant);
    assert_eq!(conv[1].text, BUILTIN_ENTRIES[FEVER_ENTRY]);
}

#[test]
fn all_spaces_scenario() {
    let (scheduler, mut turns) = manual_session(0);
    turns.submit_user_text("   ");
    scheduler.advance(Duration::from_secs(60));
    assert!(turns.conversation().is_empty());
}

#[test]
fn each_submission_gets_exactly_one_reply() {
    let (scheduler, mut turns) = manual_session(3);
    let inputs = ["hello", "fever?", "  vaccine ", "stomach", "what now"];
    for text in inputs {
        turns.submit_user_text(text);
    }
    assert_eq!(turns.conversation().len(), inputs.len());
    assert_eq!(turns.pending_replies(), inputs.len());

    scheduler.advance(DEFAULT_REPLY_DELAY);
    let conv = turns.conversation();
    assert_eq!(conv.len(), inputs.len() * 2);

    let users = conv.iter().filter(|m| m.origin == Origin::User).count();
    let assistants = conv.iter().filter(|m| m.origin == Origin::Assistant).count();
    assert_eq!(users, inputs.len());
    assert_eq!(assistants, inputs.len());

    let catalog = ResponseCatalog::builtin();
    for reply in conv.iter().filter(|m| m.origin == Origin::Assistant) {
        assert!(catalog.entries().contains(&reply.text));
    }
}

#[test]
fn replies_arrive_in_submission_order() {
    let (scheduler, mut turns) = manual_session(0);
    turns.submit_user_text("fever");
    scheduler.advance(Duration::from_millis(500));
    turns.submit_user_text("vaccine");
    scheduler.advance(Duration::from_millis(1000));

    // Only the first reply is due so far.
    let conv = turns.conversation();
    assert_eq!(conv.len(), 3);
    assert_eq!(conv[2].text, BUILTIN_ENTRIES[FEVER_ENTRY]);

    scheduler.advance(Duration::from_millis(500));
    let conv = turns.conversation();
    assert_eq!(conv.len(), 4);
    assert_eq!(conv[3].text, BUILTIN_ENTRIES[1]);
}

#[test]
fn ids_strictly_increase_per_origin() {
    let scheduler = Arc::new(ManualScheduler::new());
    let dyn_scheduler: Arc<dyn ReplyScheduler> = scheduler.clone();
    let mut turns = TurnManager::new(
        Arc::new(ResponseCatalog::builtin()),
        Arc::new(SeededRandom::new(11)),
        dyn_scheduler,
    );
    for i in 0..20 {
        turns.submit_user_text(&format!("question {i}"));
        scheduler.advance(Duration::from_millis(400));
    }
    scheduler.advance(Duration::from_secs(5));

    let conv = turns.conversation();
    for origin in [Origin::User, Origin::Assistant] {
        let ids: Vec<_> = conv.iter().filter(|m| m.origin == origin).map(|m| m.id).collect();
        assert_eq!(ids.len(), 20);
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "{origin:?} ids not increasing");
    }

    // Every assistant message is preceded by at least one user message.
    let first_user = conv.iter().position(|m| m.origin == Origin::User).unwrap();
    let first_assistant = conv.iter().position(|m| m.origin == Origin::Assistant).unwrap();
    assert!(first_user < first_assistant);
}

#[tokio::test(start_paused = true)]
async fn tokio_scheduler_delivers_reply_event() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut turns = TurnManager::new(
        Arc::new(ResponseCatalog::builtin()),
        Arc::new(FixedIndex(0)),
        Arc::new(TokioScheduler::current()),
    )
    .with_reply_delay(Duration::from_millis(1500))
    .with_events(tx);

    turns.submit_user_text("I have a high fever");
    let first = rx.recv().await.unwrap();
    assert!(matches!(first, ChatEvent::MessageAppended { ref message, .. } if message.origin == Origin::User));

    let second = rx.recv().await.unwrap();
    match second {
        ChatEvent::MessageAppended { message, .. } => {
            assert_eq!(message.origin, Origin::Assistant);
            assert_eq!(message.text, BUILTIN_ENTRIES[FEVER_ENTRY]);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn closing_session_discards_pending_reply() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut turns = TurnManager::new(
        Arc::new(ResponseCatalog::builtin()),
        Arc::new(FixedIndex(0)),
        Arc::new(TokioScheduler::current()),
    )
    .with_events(tx.clone());

    turns.submit_user_text("fever");
    assert_eq!(turns.close(), 1);
    drop(tx);

    tokio::time::sleep(Duration::from_secs(3)).await;
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert_eq!(events.len(), 2);
    assert!(matches!(events[1], ChatEvent::SessionClosed { cancelled_replies: 1, .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn close_racing_reply_never_delivers_after_teardown() {
    for _ in 0..200 {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut turns = TurnManager::new(
            Arc::new(ResponseCatalog::builtin()),
            Arc::new(FixedIndex(0)),
            Arc::new(TokioScheduler::current()),
        )
        .with_reply_delay(Duration::ZERO)
        .with_events(tx);

        turns.submit_user_text("fever");
        tokio::task::yield_now().await;
        let cancelled = turns.close();

        // Let any reply task that escaped cancellation finish.
        tokio::time::sleep(Duration::from_millis(5)).await;

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        let closed_at = events
            .iter()
            .position(|e| matches!(e, ChatEvent::SessionClosed { .. }))
            .expect("session closed event");
        assert_eq!(closed_at, events.len() - 1);

        let replies = events
            .iter()
            .filter(|e| matches!(e, ChatEvent::MessageAppended { message, .. } if message.origin == Origin::Assistant))
            .count();
        assert!(replies <= 1);
        if cancelled == 1 {
            assert_eq!(replies, 0);
        }
    }
}
