//! Selección múltiple: toggles que re-guardan el valor conjunto y avance
//! explícito con Listo.

use std::sync::Arc;

use convo_adapters::{LocalFileRetrieval, MemoryChatChannel, TemplateStepGenerator};
use convo_core::{AnswerStore, ChatEvent, DialogEngine, EventOutcome, InMemoryAnswerStore, InMemoryProcessRepository,
                 InMemorySessionStore, ProcessRepository, SessionStore};
use convo_domain::{ProcessDefinition, Step, StepType, StepValidation};

type Engine = DialogEngine<InMemorySessionStore, InMemoryAnswerStore, InMemoryProcessRepository>;

const USER: i64 = 11;

fn engine_with_channel() -> (Engine, Arc<MemoryChatChannel>) {
    let channel = Arc::new(MemoryChatChannel::new());
    let engine = DialogEngine::in_memory().build(Box::new(channel.clone()),
                                                 Box::new(LocalFileRetrieval::new("/tmp/convo")),
                                                 Box::new(TemplateStepGenerator::new()));
    (engine, channel)
}

fn choice_process(required: bool) -> ProcessDefinition {
    let mut p = ProcessDefinition::new("Preferences", "", "author").expect("process");
    p.push_step(Step::new(StepType::Choice, "Pick your colors").expect("step")
                                                               .with_options(vec!["Red".into(), "Green".into(), "Blue".into()])
                                                               .with_validation(StepValidation { required,
                                                                                                 regex: None,
                                                                                                 file_types: vec![] }));
    p.push_step(Step::new(StepType::Final, "Confirm").expect("step"));
    p
}

#[tokio::test]
async fn toggles_resave_the_joined_selection() {
    let (engine, _channel) = engine_with_channel();
    let process = choice_process(false);
    let pid = process.id;
    engine.processes().save(process);

    engine.begin_process(USER, pid).await.expect("begin");

    let out = engine.handle_event(ChatEvent::button(USER, "opt:0")).await.expect("red");
    assert_eq!(out, EventOutcome::SelectionToggled);
    assert_eq!(engine.answers().load(USER, pid).unwrap().entry(0).unwrap().answer, "Red");

    engine.handle_event(ChatEvent::button(USER, "opt:2")).await.expect("blue");
    assert_eq!(engine.answers().load(USER, pid).unwrap().entry(0).unwrap().answer, "Red; Blue");

    // segundo click sobre Red la saca de la selección
    engine.handle_event(ChatEvent::button(USER, "opt:0")).await.expect("untoggle red");
    assert_eq!(engine.answers().load(USER, pid).unwrap().entry(0).unwrap().answer, "Blue");

    // el cursor no se movió durante los toggles
    assert_eq!(engine.sessions().get_or_create(USER).current_step_index, 0);

    let out = engine.handle_event(ChatEvent::button(USER, "done")).await.expect("done");
    assert_eq!(out, EventOutcome::Advanced);
    assert_eq!(engine.sessions().get_or_create(USER).current_step_index, 1);
}

#[tokio::test]
async fn done_with_empty_required_selection_is_rejected() {
    let (engine, channel) = engine_with_channel();
    let process = choice_process(true);
    let pid = process.id;
    engine.processes().save(process);

    engine.begin_process(USER, pid).await.expect("begin");
    let out = engine.handle_event(ChatEvent::button(USER, "done")).await.expect("early done");
    assert_eq!(out, EventOutcome::RetrySameStep);
    assert_eq!(engine.sessions().get_or_create(USER).current_step_index, 0);
    assert!(channel.last_to(USER).unwrap().text.contains("at least one option"));

    engine.handle_event(ChatEvent::button(USER, "opt:1")).await.expect("green");
    let out = engine.handle_event(ChatEvent::button(USER, "done")).await.expect("done");
    assert_eq!(out, EventOutcome::Advanced);
    assert_eq!(engine.answers().load(USER, pid).unwrap().entry(0).unwrap().answer, "Green");
}

#[tokio::test]
async fn toggle_after_done_is_impossible() {
    let (engine, _channel) = engine_with_channel();
    let process = choice_process(false);
    let pid = process.id;
    engine.processes().save(process);

    engine.begin_process(USER, pid).await.expect("begin");
    engine.handle_event(ChatEvent::button(USER, "opt:0")).await.expect("red");
    engine.handle_event(ChatEvent::button(USER, "done")).await.expect("done");

    // la captura vigente es la confirmación del paso Final; un click de
    // opción rezagado no la consume ni toca la respuesta guardada
    let out = engine.handle_event(ChatEvent::button(USER, "opt:2")).await.expect("stale toggle");
    assert_eq!(out, EventOutcome::Rejected);
    assert_eq!(engine.answers().load(USER, pid).unwrap().entry(0).unwrap().answer, "Red");
}

#[tokio::test]
async fn render_marks_selected_options() {
    let (engine, channel) = engine_with_channel();
    let process = choice_process(false);
    let pid = process.id;
    engine.processes().save(process);

    engine.begin_process(USER, pid).await.expect("begin");
    engine.handle_event(ChatEvent::button(USER, "opt:1")).await.expect("green");

    let last = channel.last_to(USER).expect("re-render");
    let labels: Vec<String> = last.buttons.iter().flatten().map(|b| b.label.clone()).collect();
    assert!(labels.iter().any(|l| l == "✓ Green"), "labels: {labels:?}");
    assert!(labels.iter().any(|l| l == "Red"), "unselected stays plain");
}
