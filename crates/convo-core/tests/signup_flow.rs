//! Escenario de punta a punta: proceso "Signup" de tres pasos.

use std::sync::Arc;

use convo_adapters::{LocalFileRetrieval, MemoryChatChannel, TemplateStepGenerator};
use convo_core::{AnswerStore, ChatEvent, DialogEngine, EventOutcome, InMemoryAnswerStore, InMemoryProcessRepository,
                 InMemorySessionStore, ProcessRepository, SessionStore};
use convo_domain::{ProcessDefinition, Step, StepType};

type Engine = DialogEngine<InMemorySessionStore, InMemoryAnswerStore, InMemoryProcessRepository>;

const USER: i64 = 42;

fn engine_with_channel() -> (Engine, Arc<MemoryChatChannel>) {
    let channel = Arc::new(MemoryChatChannel::new());
    let engine = DialogEngine::in_memory().build(Box::new(channel.clone()),
                                                 Box::new(LocalFileRetrieval::new("/tmp/convo")),
                                                 Box::new(TemplateStepGenerator::new()));
    (engine, channel)
}

fn signup_process() -> ProcessDefinition {
    let mut p = ProcessDefinition::new("Signup", "basic signup", "author").expect("process");
    p.push_step(Step::new(StepType::TextInput, "Name").expect("step"));
    p.push_step(Step::new(StepType::YesNo, "Subscribe?").expect("step"));
    p.push_step(Step::new(StepType::Final, "Confirm your signup").expect("step"));
    p
}

#[tokio::test]
async fn signup_runs_to_completion() {
    let (engine, channel) = engine_with_channel();
    let process = signup_process();
    let pid = process.id;
    engine.processes().save(process);

    engine.begin_process(USER, pid).await.expect("begin");
    assert_eq!(channel.last_to(USER).expect("first prompt").text, "Name");
    assert!(engine.router().has_pending(USER));

    // "Alice" -> index 1, cache {0: Alice}
    let out = engine.handle_event(ChatEvent::text(USER, "Alice")).await.expect("text");
    assert_eq!(out, EventOutcome::Advanced);
    let session = engine.sessions().get_or_create(USER);
    assert_eq!(session.current_step_index, 1);
    assert_eq!(session.cached_answer(0), Some("Alice"));

    // Yes -> index 2
    let out = engine.handle_event(ChatEvent::button(USER, "yes")).await.expect("yes");
    assert_eq!(out, EventOutcome::Advanced);
    let session = engine.sessions().get_or_create(USER);
    assert_eq!(session.current_step_index, 2);
    assert_eq!(session.cached_answer(1), Some("Yes"));

    // Confirm -> Complete
    let out = engine.handle_event(ChatEvent::button(USER, "confirm")).await.expect("confirm");
    assert_eq!(out, EventOutcome::Completed);

    let record = engine.answers().load(USER, pid).expect("record");
    assert!(record.completed_at.is_some());
    assert_eq!(record.answers.len(), 2);
    assert_eq!(record.entry(0).unwrap().answer, "Alice");
    assert_eq!(record.entry(1).unwrap().answer, "Yes");
    assert_eq!(record.entry(0).unwrap().step_prompt.as_deref(), Some("Name"));

    let last = channel.last_to(USER).expect("completion message");
    assert!(last.text.contains("2 answers recorded"), "got: {}", last.text);
    assert_eq!(last.buttons.len(), 1, "finish action offered");
}

#[tokio::test]
async fn completion_is_emitted_exactly_once() {
    let (engine, channel) = engine_with_channel();
    let process = signup_process();
    let pid = process.id;
    engine.processes().save(process);

    engine.begin_process(USER, pid).await.expect("begin");
    engine.handle_event(ChatEvent::text(USER, "Alice")).await.expect("text");
    engine.handle_event(ChatEvent::button(USER, "yes")).await.expect("yes");
    engine.handle_event(ChatEvent::button(USER, "confirm")).await.expect("confirm");

    let stamped = engine.answers().load(USER, pid).unwrap().completed_at;
    assert!(stamped.is_some());

    // un avance repetido con el cursor ya al final no re-dispara el cierre
    let out = engine.advance(USER).await.expect("repeat advance");
    assert_eq!(out, EventOutcome::Completed);
    assert_eq!(engine.answers().load(USER, pid).unwrap().completed_at, stamped);

    let completions = channel.sent_to(USER)
                             .iter()
                             .filter(|m| m.text.contains("Process complete"))
                             .count();
    assert_eq!(completions, 1, "completion sub-flow must run once");
}

#[tokio::test]
async fn duplicate_confirm_click_is_ignored() {
    let (engine, _channel) = engine_with_channel();
    let process = signup_process();
    let pid = process.id;
    engine.processes().save(process);

    engine.begin_process(USER, pid).await.expect("begin");
    engine.handle_event(ChatEvent::text(USER, "Alice")).await.expect("text");
    engine.handle_event(ChatEvent::button(USER, "yes")).await.expect("yes");
    engine.handle_event(ChatEvent::button(USER, "confirm")).await.expect("confirm");

    // el listener ya fue desarmado por la primera confirmación
    let out = engine.handle_event(ChatEvent::button(USER, "confirm")).await.expect("dup");
    assert_eq!(out, EventOutcome::Ignored);
}

#[tokio::test]
async fn resaving_an_answer_overwrites_in_place() {
    let (engine, _channel) = engine_with_channel();
    let process = signup_process();
    let pid = process.id;
    engine.processes().save(process);

    engine.begin_process(USER, pid).await.expect("begin");
    engine.handle_event(ChatEvent::text(USER, "Alice")).await.expect("text");

    // el host retrocede y el usuario corrige su respuesta
    engine.retreat(USER).await.expect("retreat");
    engine.handle_event(ChatEvent::text(USER, "Alicia")).await.expect("text 2");

    let record = engine.answers().load(USER, pid).expect("record");
    assert_eq!(record.answers.len(), 1, "no duplicate step_index entries");
    assert_eq!(record.entry(0).unwrap().answer, "Alicia");
}

#[tokio::test]
async fn session_reset_keeps_durable_answers() {
    let (engine, _channel) = engine_with_channel();
    let process = signup_process();
    let pid = process.id;
    engine.processes().save(process);

    engine.begin_process(USER, pid).await.expect("begin");
    engine.handle_event(ChatEvent::text(USER, "Alice")).await.expect("text");
    engine.abandon(USER).await.expect("abandon");

    let session = engine.sessions().get_or_create(USER);
    assert_eq!(session.process_id, None);
    assert!(session.answers.is_empty(), "transient cache cleared");
    assert!(!engine.router().has_pending(USER), "capture detached on abandon");

    let record = engine.answers().load(USER, pid).expect("record survives reset");
    assert_eq!(record.entry(0).unwrap().answer, "Alice");
}
