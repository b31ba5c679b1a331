//! Recorrido de punta a punta a través de la fachada del crate raíz.

use std::sync::Arc;

use convoflow_rust::adapters::{LocalFileRetrieval, MemoryChatChannel, TemplateStepGenerator};
use convoflow_rust::domain::{ProcessDefinition, Step, StepType};
use convoflow_rust::engine::{AnswerStore, ChatEvent, DialogEngine, EventOutcome, ProcessRepository};

#[tokio::test]
async fn mixed_step_types_run_end_to_end() {
    const USER: i64 = 77;
    let channel = Arc::new(MemoryChatChannel::new());
    let engine = DialogEngine::in_memory().build(Box::new(channel.clone()),
                                                 Box::new(LocalFileRetrieval::new("/tmp/convo")),
                                                 Box::new(TemplateStepGenerator::new()));

    let mut process = ProcessDefinition::new("Full tour", "every capture shape", "author").expect("process");
    process.push_step(Step::new(StepType::Info, "Welcome to the tour").expect("step"));
    process.push_step(Step::new(StepType::TextInput, "Your name?").expect("step"));
    process.push_step(Step::new(StepType::Choice, "Pick interests").expect("step")
                                                                   .with_options(vec!["Art".into(), "Tech".into()]));
    process.push_step(Step::new(StepType::YesNo, "Receive updates?").expect("step"));
    process.push_step(Step::new(StepType::Final, "Confirm everything").expect("step"));
    let pid = process.id;
    engine.processes().save(process);

    engine.begin_process(USER, pid).await.expect("begin");

    assert_eq!(engine.handle_event(ChatEvent::button(USER, "next")).await.expect("info"),
               EventOutcome::Advanced);
    assert_eq!(engine.handle_event(ChatEvent::text(USER, "Alice")).await.expect("name"),
               EventOutcome::Advanced);
    assert_eq!(engine.handle_event(ChatEvent::button(USER, "opt:1")).await.expect("tech"),
               EventOutcome::SelectionToggled);
    assert_eq!(engine.handle_event(ChatEvent::button(USER, "done")).await.expect("done"),
               EventOutcome::Advanced);
    assert_eq!(engine.handle_event(ChatEvent::button(USER, "no")).await.expect("updates"),
               EventOutcome::Advanced);
    assert_eq!(engine.handle_event(ChatEvent::button(USER, "confirm")).await.expect("confirm"),
               EventOutcome::Completed);

    let record = engine.answers().load(USER, pid).expect("record");
    // Info no deja respuesta: quedan texto, choice y sí/no
    assert_eq!(record.answers.len(), 3);
    assert_eq!(record.entry(1).unwrap().answer, "Alice");
    assert_eq!(record.entry(2).unwrap().answer, "Tech");
    assert_eq!(record.entry(3).unwrap().answer, "No");
    assert!(record.completed_at.is_some());
}
