mod support;

use std::time::Duration;

use samchat_core::orchestrator::{wait_for_shutdown, FAREWELL_MESSAGE, WELCOME_MESSAGE};
use samchat_core::{CompletionOrder, GenerationError, SessionState, Side, Speaker};
use support::Harness;

#[tokio::test]
async fn welcome_turn_opens_the_session_and_is_spoken() {
    let mut harness = Harness::new(CompletionOrder::Arrival);

    let log = harness.orchestrator.log();
    assert_eq!(log.len(), 1);
    assert_eq!(log.turns()[0].speaker, Speaker::Bot);
    assert_eq!(log.turns()[0].sequence, 0);
    assert_eq!(harness.next_spoken().await, WELCOME_MESSAGE);
    assert_eq!(harness.orchestrator.state(), SessionState::Idle);
}

#[tokio::test]
async fn submission_renders_immediately_then_reply_is_appended_and_spoken() {
    let mut harness = Harness::new(CompletionOrder::Arrival);
    assert_eq!(harness.next_spoken().await, WELCOME_MESSAGE);
    let reply = harness.generator.expect_call();

    let sequence = harness.orchestrator.submit("  what is rust?  ").unwrap();

    assert_eq!(sequence, 1);
    assert_eq!(harness.texts(), vec![WELCOME_MESSAGE, "what is rust?"]);
    let bubbles = harness.orchestrator.view().bubbles();
    assert_eq!(bubbles.len(), 2);
    assert_eq!(bubbles[1].layout.geometry.side, Side::Right);
    assert_eq!(
        harness.orchestrator.state(),
        SessionState::AwaitingGeneration { outstanding: 1 }
    );

    reply.send(Ok("A systems language.\n".to_string())).unwrap();
    harness.pump().await;

    let last = harness.orchestrator.log().last().unwrap().clone();
    assert_eq!(last.speaker, Speaker::Bot);
    assert_eq!(last.text, "A systems language.");
    assert_eq!(last.sequence, 2);
    assert_eq!(
        harness.orchestrator.view().bubbles()[2].layout.geometry.side,
        Side::Left
    );
    assert!(harness.orchestrator.view().is_at_bottom());
    assert_eq!(harness.orchestrator.state(), SessionState::Idle);
    assert_eq!(harness.next_spoken().await, "A systems language.");
}

#[tokio::test]
async fn prompt_carries_full_history() {
    let mut harness = Harness::new(CompletionOrder::Arrival);
    let first = harness.generator.expect_call();
    harness.orchestrator.submit("hi");
    first.send(Ok("hello".to_string())).unwrap();
    harness.pump().await;

    let second = harness.generator.expect_call();
    harness.orchestrator.submit("how are you?");
    second.send(Ok("fine".to_string())).unwrap();
    harness.pump().await;

    let prompts = harness.generator.prompts();
    assert_eq!(prompts[0], format!("Bot: {}\nUser: hi\nBot:", WELCOME_MESSAGE));
    assert_eq!(
        prompts[1],
        format!(
            "Bot: {}\nUser: hi\nBot: hello\nUser: how are you?\nBot:",
            WELCOME_MESSAGE
        )
    );
}

#[tokio::test]
async fn generation_failure_becomes_one_apologetic_turn() {
    let mut harness = Harness::new(CompletionOrder::Arrival);
    let reply = harness.generator.expect_call();
    harness.orchestrator.submit("hello?");

    reply
        .send(Err(GenerationError::Api {
            provider: "Gemini",
            status: 429,
            message: "quota exceeded".to_string(),
        }))
        .unwrap();
    harness.pump().await;

    let turns = harness.orchestrator.log().turns();
    assert_eq!(turns.len(), 3);
    let bot_turns_after_user: Vec<_> = turns[2..].iter().filter(|t| t.speaker == Speaker::Bot).collect();
    assert_eq!(bot_turns_after_user.len(), 1);
    assert!(bot_turns_after_user[0].text.contains("quota exceeded"));
    assert!(bot_turns_after_user[0].text.starts_with("Sorry"));
    assert_eq!(harness.orchestrator.state(), SessionState::Idle);

    // the session keeps working afterwards
    let next = harness.generator.expect_call();
    assert_eq!(harness.orchestrator.submit("again"), Some(3));
    next.send(Ok("ok now".to_string())).unwrap();
    harness.pump().await;
    assert_eq!(harness.orchestrator.log().last().unwrap().text, "ok now");
}

#[tokio::test]
async fn blank_input_is_ignored() {
    let mut harness = Harness::new(CompletionOrder::Arrival);

    assert_eq!(harness.orchestrator.submit(""), None);
    assert_eq!(harness.orchestrator.submit(" \n\t "), None);
    assert_eq!(harness.orchestrator.log().len(), 1);
    assert!(harness.generator.prompts().is_empty());
    assert_eq!(harness.orchestrator.state(), SessionState::Idle);
    assert_eq!(harness.next_spoken().await, WELCOME_MESSAGE);
}

#[tokio::test]
async fn overlapping_submissions_append_in_arrival_order() {
    let mut harness = Harness::new(CompletionOrder::Arrival);
    let first = harness.generator.expect_call();
    let second = harness.generator.expect_call();

    let u1 = harness.orchestrator.submit("first question").unwrap();
    let u2 = harness.orchestrator.submit("second question").unwrap();
    assert_eq!(
        harness.orchestrator.state(),
        SessionState::AwaitingGeneration { outstanding: 2 }
    );

    // Spawned tasks poll their oneshot in call order, so the second prompt
    // reserved the second slot.
    second.send(Ok("second answer".to_string())).unwrap();
    harness.pump().await;
    first.send(Ok("first answer".to_string())).unwrap();
    harness.pump().await;

    assert_eq!(
        harness.texts(),
        vec![
            WELCOME_MESSAGE,
            "first question",
            "second question",
            "second answer",
            "first answer"
        ]
    );

    let log = harness.orchestrator.log();
    let b2 = log.turns().iter().find(|t| t.text == "second answer").unwrap();
    let b1 = log.turns().iter().find(|t| t.text == "first answer").unwrap();
    assert!(b1.sequence > u1);
    assert!(b2.sequence > u2);
    let sequences: Vec<u64> = log.turns().iter().map(|t| t.sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2, 3, 4]);
    assert_eq!(harness.orchestrator.state(), SessionState::Idle);
}

#[tokio::test]
async fn submission_order_holds_early_replies() {
    let mut harness = Harness::new(CompletionOrder::Submission);
    let first = harness.generator.expect_call();
    let second = harness.generator.expect_call();

    harness.orchestrator.submit("first question");
    harness.orchestrator.submit("second question");

    second.send(Ok("second answer".to_string())).unwrap();
    harness.pump().await;
    assert_eq!(harness.orchestrator.log().len(), 3);
    assert_eq!(
        harness.orchestrator.state(),
        SessionState::AwaitingGeneration { outstanding: 2 }
    );

    first.send(Ok("first answer".to_string())).unwrap();
    harness.pump().await;

    assert_eq!(
        harness.texts(),
        vec![
            WELCOME_MESSAGE,
            "first question",
            "second question",
            "first answer",
            "second answer"
        ]
    );
    assert_eq!(harness.orchestrator.state(), SessionState::Idle);

    assert_eq!(harness.next_spoken().await, WELCOME_MESSAGE);
    assert_eq!(harness.next_spoken().await, "first answer");
    assert_eq!(harness.next_spoken().await, "second answer");
}

#[tokio::test(start_paused = true)]
async fn end_chat_appends_one_farewell_and_closes_after_delay() {
    let mut harness = Harness::new(CompletionOrder::Arrival);
    for i in 0..3 {
        let reply = harness.generator.expect_call();
        harness.orchestrator.submit(&format!("question {}", i));
        reply.send(Ok(format!("answer {}", i))).unwrap();
        harness.pump().await;
    }
    let before = harness.orchestrator.log().len();
    let started = tokio::time::Instant::now();

    let deadline = harness.orchestrator.end_chat().unwrap();
    assert_eq!(deadline - started, Duration::from_millis(2000));
    assert!(harness.orchestrator.end_chat().is_none());

    let log = harness.orchestrator.log();
    assert_eq!(log.len(), before + 1);
    let farewells = log.turns().iter().filter(|t| t.text == FAREWELL_MESSAGE).count();
    assert_eq!(farewells, 1);
    assert_eq!(
        harness.orchestrator.state(),
        SessionState::Closing { deadline }
    );
    assert_eq!(harness.orchestrator.submit("still there?"), None);

    wait_for_shutdown(harness.orchestrator.shutdown_deadline()).await;
    assert!(tokio::time::Instant::now() >= started + Duration::from_millis(2000));
}

#[tokio::test]
async fn farewell_is_spoken_after_pending_speech() {
    let mut harness = Harness::new(CompletionOrder::Arrival);
    harness.orchestrator.end_chat();

    assert_eq!(harness.next_spoken().await, WELCOME_MESSAGE);
    assert_eq!(harness.next_spoken().await, FAREWELL_MESSAGE);
}

#[tokio::test]
async fn reply_arriving_after_end_chat_is_discarded() {
    let mut harness = Harness::new(CompletionOrder::Arrival);
    let reply = harness.generator.expect_call();
    harness.orchestrator.submit("are you there?");
    harness.orchestrator.end_chat();

    reply.send(Ok("too late".to_string())).unwrap();
    harness.pump().await;

    assert_eq!(harness.orchestrator.log().last().unwrap().text, FAREWELL_MESSAGE);
    assert!(!harness.texts().iter().any(|t| t == "too late"));
}

#[tokio::test]
async fn dropping_session_with_work_in_flight_is_safe() {
    let harness = Harness::new(CompletionOrder::Arrival);
    let Harness {
        mut orchestrator,
        generator,
        ..
    } = harness;
    let reply = generator.expect_call();
    orchestrator.submit("anyone?");

    // Let the generation task start and take its reply slot
    while generator.prompts().is_empty() {
        tokio::task::yield_now().await;
    }
    drop(orchestrator);

    // The aborted task dropped its receiver, so nobody can take the reply
    for _ in 0..10 {
        if reply.is_closed() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(reply.send(Ok("nobody listening".to_string())).is_err());
}

#[tokio::test]
async fn blank_reply_becomes_an_apology() {
    let mut harness = Harness::new(CompletionOrder::Arrival);
    let reply = harness.generator.expect_call();
    harness.orchestrator.submit("say nothing");

    reply.send(Ok("  \n ".to_string())).unwrap();
    harness.pump().await;

    let last = harness.orchestrator.log().last().unwrap().clone();
    assert_eq!(last.speaker, Speaker::Bot);
    assert!(last.text.starts_with("Sorry, I encountered an error:"));
    assert!(last.text.contains("empty reply"));
    assert_eq!(harness.next_spoken().await, WELCOME_MESSAGE);
    assert_eq!(harness.next_spoken().await, last.text);
}
