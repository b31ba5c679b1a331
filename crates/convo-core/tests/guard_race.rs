//! Entrega duplicada y guard de reentrancia: exactamente un avance.

use std::sync::Arc;

use convo_adapters::{LocalFileRetrieval, MemoryChatChannel, TemplateStepGenerator};
use convo_core::{AnswerStore, ChatEvent, DialogEngine, EventOutcome, InMemoryAnswerStore, InMemoryProcessRepository,
                 InMemorySessionStore, ProcessRepository, SessionStore};
use convo_domain::{ProcessDefinition, Step, StepType};

type Engine = DialogEngine<InMemorySessionStore, InMemoryAnswerStore, InMemoryProcessRepository>;

const USER: i64 = 99;

fn engine_with_channel() -> (Engine, Arc<MemoryChatChannel>) {
    let channel = Arc::new(MemoryChatChannel::new());
    let engine = DialogEngine::in_memory().build(Box::new(channel.clone()),
                                                 Box::new(LocalFileRetrieval::new("/tmp/convo")),
                                                 Box::new(TemplateStepGenerator::new()));
    (engine, channel)
}

fn two_step_process() -> ProcessDefinition {
    let mut p = ProcessDefinition::new("Quick", "", "author").expect("process");
    p.push_step(Step::new(StepType::TextInput, "Name").expect("step"));
    p.push_step(Step::new(StepType::Final, "Confirm").expect("step"));
    p
}

#[tokio::test]
async fn duplicate_events_produce_exactly_one_advance() {
    let (engine, _channel) = engine_with_channel();
    let process = two_step_process();
    let pid = process.id;
    engine.processes().save(process);

    engine.begin_process(USER, pid).await.expect("begin");

    // el mismo mensaje entregado dos veces, procesado concurrentemente
    let ev = ChatEvent::text(USER, "Alice");
    let (a, b) = tokio::join!(engine.handle_event(ev.clone()), engine.handle_event(ev));
    let a = a.expect("first delivery");
    let b = b.expect("second delivery");

    let advanced = [a, b].iter().filter(|o| **o == EventOutcome::Advanced).count();
    assert_eq!(advanced, 1, "outcomes: {a:?} / {b:?}");
    assert_eq!(engine.sessions().get_or_create(USER).current_step_index, 1);

    let record = engine.answers().load(USER, pid).expect("record");
    assert_eq!(record.answers.len(), 1, "single answer entry");
}

#[tokio::test]
async fn guard_blocks_a_second_transition_in_flight() {
    let (engine, _channel) = engine_with_channel();
    let process = two_step_process();
    let pid = process.id;
    engine.processes().save(process);

    engine.begin_process(USER, pid).await.expect("begin");

    // simula una transición en vuelo tomando el guard a mano
    assert!(engine.sessions().set_guard(USER));
    let err = engine.advance(USER).await.expect_err("guard held");
    assert_eq!(err, convo_core::EngineError::StateConflict);

    engine.sessions().release_guard(USER);
    // con el guard libre el avance sale normal
    let out = engine.advance(USER).await.expect("advance");
    assert_eq!(out, EventOutcome::Advanced);
}

#[tokio::test]
async fn busy_click_gets_a_message_not_a_crash() {
    let (engine, channel) = engine_with_channel();
    let process = two_step_process();
    let pid = process.id;
    engine.processes().save(process);

    engine.begin_process(USER, pid).await.expect("begin");
    assert!(engine.sessions().set_guard(USER), "simulate in-flight transition");

    let out = engine.handle_event(ChatEvent::text(USER, "Alice")).await.expect("busy path");
    assert_eq!(out, EventOutcome::Busy);
    assert!(channel.last_to(USER).unwrap().text.contains("Still processing"));
    engine.sessions().release_guard(USER);
}
