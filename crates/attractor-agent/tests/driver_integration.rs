//! Conversation driver behavior against a scripted backend.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use attractor_agent::{ConversationDriver, DriverState};
use attractor_core::{AttractorError, Message, Role, Speaker};
use attractor_session::{RunOutcome, StopReason, TurnRecord};
use common::{conversation, ScriptedBackend};
use parking_lot::Mutex;
use std::sync::Arc;

// --- Turn budget ---

#[tokio::test]
async fn test_philosophy_scenario_runs_to_budget() {
    let (client, requests) = ScriptedBackend::client(vec![
        Ok("Consciousness may be the universe noticing itself.".to_string()),
        Ok("Or a useful story the brain tells.".to_string()),
        Ok("Perhaps both at once.".to_string()),
    ]);
    let mut driver =
        ConversationDriver::initialize(client, conversation(4, &["goodbye"])).unwrap();

    let transcript = driver.run().await.unwrap();

    assert_eq!(transcript.len(), 4);
    let speakers: Vec<Speaker> = transcript.turns().iter().map(|t| t.speaker).collect();
    assert_eq!(speakers, vec![Speaker::A, Speaker::B, Speaker::A, Speaker::B]);
    let indices: Vec<u32> = transcript.turns().iter().map(|t| t.turn_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    assert_eq!(transcript.turns()[0].text, "Hello, what is consciousness?");
    assert_eq!(transcript.turns()[3].text, "Perhaps both at once.");

    // The opener is scripted, so only three requests were made.
    assert_eq!(requests.lock().len(), 3);
    assert!(matches!(
        transcript.outcome(),
        Some(RunOutcome::Stopped {
            reason: StopReason::MaxTurns,
            ..
        })
    ));
    assert_eq!(driver.state(), &DriverState::Stopped(StopReason::MaxTurns));
}

#[tokio::test]
async fn test_indices_contiguous_and_within_budget() {
    for max_turns in [1, 2, 7, 12] {
        let (client, _) = ScriptedBackend::client(vec![]);
        let mut driver =
            ConversationDriver::initialize(client, conversation(max_turns, &[])).unwrap();
        let transcript = driver.run().await.unwrap();

        assert_eq!(transcript.len(), max_turns as usize);
        for (i, turn) in transcript.turns().iter().enumerate() {
            assert_eq!(turn.turn_index as usize, i);
        }
    }
}

#[tokio::test]
async fn test_zero_turns_rejected_before_any_request() {
    let (client, requests) = ScriptedBackend::client(vec![]);
    let err = ConversationDriver::initialize(client, conversation(0, &[]))
        .err()
        .unwrap();
    assert!(matches!(err, AttractorError::Config(_)));
    assert!(requests.lock().is_empty());
}

#[tokio::test]
async fn test_run_twice_is_rejected() {
    let (client, _) = ScriptedBackend::client(vec![]);
    let mut driver = ConversationDriver::initialize(client, conversation(2, &[])).unwrap();
    driver.run().await.unwrap();
    assert!(matches!(
        driver.run().await,
        Err(AttractorError::Config(_))
    ));
}

// --- Stop phrases ---

#[tokio::test]
async fn test_stop_phrase_ends_run_inclusive() {
    let (client, requests) = ScriptedBackend::client(vec![
        Ok("Let us keep going.".to_string()),
        Ok("I think we should End Our Conversation here.".to_string()),
        Ok("never requested".to_string()),
    ]);
    let mut driver = ConversationDriver::initialize(
        client,
        conversation(10, &["goodbye", "end our conversation"]),
    )
    .unwrap();

    let transcript = driver.run().await.unwrap();

    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript.last().unwrap().speaker, Speaker::A);
    assert_eq!(requests.lock().len(), 2);
    assert_eq!(
        driver.state(),
        &DriverState::Stopped(StopReason::StopPhrase {
            phrase: "end our conversation".to_string()
        })
    );
}

#[tokio::test]
async fn test_opener_is_not_checked_for_stop_phrases() {
    let (client, requests) = ScriptedBackend::client(vec![]);
    let mut config = conversation(3, &["hello"]);
    config.opening_message = "Hello.".to_string();
    let mut driver = ConversationDriver::initialize(client, config).unwrap();

    let transcript = driver.run().await.unwrap();
    assert_eq!(transcript.len(), 3);
    assert_eq!(requests.lock().len(), 2);
}

// --- Alternation invariant ---

#[tokio::test]
async fn test_histories_mirror_after_every_step() {
    let (client, _) = ScriptedBackend::client(vec![]);
    let mut driver = ConversationDriver::initialize(client, conversation(6, &[])).unwrap();

    let (a, b) = driver.participants();
    assert!(a.mirrors(b));

    driver.open().unwrap();
    let mut speaker = Speaker::B;
    for _ in 0..4 {
        driver.step(speaker).await.unwrap();
        let (a, b) = driver.participants();
        assert!(a.mirrors(b));
        assert!(b.mirrors(a));
        speaker = speaker.other();
    }
}

// --- Manual stepping ---

#[tokio::test]
async fn test_manual_steps_record_and_advance() {
    let (client, requests) = ScriptedBackend::client(vec![
        Ok("B one".to_string()),
        Ok("A two".to_string()),
    ]);
    let mut driver = ConversationDriver::initialize(client, conversation(3, &[])).unwrap();

    driver.open().unwrap();
    assert_eq!(driver.state(), &DriverState::AwaitingB);
    driver.step(Speaker::B).await.unwrap();
    assert_eq!(driver.state(), &DriverState::AwaitingA);
    driver.step(Speaker::A).await.unwrap();
    assert_eq!(driver.state(), &DriverState::Stopped(StopReason::MaxTurns));

    let transcript = driver.transcript();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript.turns()[2].text, "A two");
    // Histories hold the system prompt plus one message per recorded turn.
    let (a, b) = driver.participants();
    assert_eq!(a.history().len(), transcript.len() + 1);
    assert_eq!(b.history().len(), transcript.len() + 1);
    assert_eq!(requests.lock().len(), 2);
}

#[tokio::test]
async fn test_step_after_stop_is_rejected() {
    let (client, requests) = ScriptedBackend::client(vec![]);
    let mut driver = ConversationDriver::initialize(client, conversation(2, &[])).unwrap();
    driver.run().await.unwrap();
    assert_eq!(requests.lock().len(), 1);

    for speaker in Speaker::BOTH {
        let err = driver.step(speaker).await.unwrap_err();
        assert!(matches!(err, AttractorError::Config(_)));
    }

    assert_eq!(requests.lock().len(), 1);
    assert_eq!(driver.transcript().len(), 2);
    let (a, b) = driver.participants();
    assert_eq!(a.history().len(), 3);
    assert!(a.mirrors(b));
}

#[tokio::test]
async fn test_step_out_of_turn_is_rejected() {
    let (client, requests) = ScriptedBackend::client(vec![]);
    let mut driver = ConversationDriver::initialize(client, conversation(10, &[])).unwrap();
    driver.open().unwrap();

    // B answers the opener; B again would break the alternation.
    driver.step(Speaker::B).await.unwrap();
    let err = driver.step(Speaker::B).await.unwrap_err();
    assert!(matches!(err, AttractorError::Config(_)));

    assert_eq!(requests.lock().len(), 1);
    assert_eq!(driver.transcript().len(), 2);
    assert_eq!(driver.state(), &DriverState::AwaitingA);
    let (a, b) = driver.participants();
    assert!(a.mirrors(b));
}

#[tokio::test]
async fn test_run_resumes_after_manual_steps() {
    let (client, requests) = ScriptedBackend::client(vec![]);
    let mut driver = ConversationDriver::initialize(client, conversation(5, &[])).unwrap();
    driver.open().unwrap();
    driver.step(Speaker::B).await.unwrap();

    let transcript = driver.run().await.unwrap();
    assert_eq!(transcript.len(), 5);
    let indices: Vec<u32> = transcript.turns().iter().map(|t| t.turn_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(requests.lock().len(), 4);
}

#[tokio::test]
async fn test_each_side_sees_first_person_history() {
    let (client, requests) = ScriptedBackend::client(vec![
        Ok("B speaks".to_string()),
        Ok("A speaks".to_string()),
    ]);
    let mut driver = ConversationDriver::initialize(client, conversation(3, &[])).unwrap();
    driver.run().await.unwrap();

    let requests = requests.lock();
    // B answers the opener: it sees A's line as user input.
    assert_eq!(
        requests[0],
        vec![
            Message::system("Discuss philosophy."),
            Message::user("Hello, what is consciousness?"),
        ]
    );
    // A then sees its own opener as assistant output and B's line as user input.
    assert_eq!(
        requests[1],
        vec![
            Message::system("Discuss philosophy."),
            Message::assistant("Hello, what is consciousness?"),
            Message::user("B speaks"),
        ]
    );

    let (a, b) = driver.participants();
    assert_eq!(a.history().last().unwrap().role(), Role::Assistant);
    assert_eq!(b.history().last().unwrap().role(), Role::User);
    assert!(a.mirrors(b));
}

// --- Failures ---

#[tokio::test]
async fn test_transport_fault_on_third_turn() {
    let (client, requests) = ScriptedBackend::client(vec![
        Ok("First reply.".to_string()),
        Err(AttractorError::Transport("connection reset".to_string())),
    ]);
    let mut driver = ConversationDriver::initialize(client, conversation(10, &[])).unwrap();

    let err = driver.run().await.unwrap_err();
    assert!(matches!(err, AttractorError::Transport(_)));
    assert_eq!(requests.lock().len(), 2);

    let transcript = driver.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript.turns()[0].turn_index, 0);
    assert_eq!(transcript.turns()[1].turn_index, 1);
    assert!(transcript.outcome().is_none());

    // No transition and no partial turn on failure.
    assert_eq!(driver.state(), &DriverState::AwaitingA);
    let (a, b) = driver.participants();
    assert_eq!(a.history().len(), 3);
    assert!(a.mirrors(b));
}

#[tokio::test]
async fn test_blank_reply_is_empty_reply_error() {
    let (client, _) = ScriptedBackend::client(vec![Ok("  \n\t ".to_string())]);
    let mut driver = ConversationDriver::initialize(client, conversation(5, &[])).unwrap();

    let err = driver.run().await.unwrap_err();
    assert!(matches!(
        err,
        AttractorError::EmptyReply {
            speaker: Speaker::B
        }
    ));
    assert_eq!(driver.transcript().len(), 1);
    let (a, b) = driver.participants();
    assert_eq!(b.history().len(), 2);
    assert!(a.mirrors(b));
}

// --- Turn hook ---

#[tokio::test]
async fn test_turn_hook_sees_every_turn() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    let (client, _) = ScriptedBackend::client(vec![]);
    let mut driver = ConversationDriver::initialize(client, conversation(4, &[]))
        .unwrap()
        .on_turn(Box::new(move |record: &TurnRecord| {
            sink.lock().push((record.turn_index, record.speaker));
        }));
    driver.run().await.unwrap();

    assert_eq!(
        *seen.lock(),
        vec![
            (0, Speaker::A),
            (1, Speaker::B),
            (2, Speaker::A),
            (3, Speaker::B)
        ]
    );
}
