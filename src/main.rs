//! Corridas de validación del motor conversacional contra stores en
//! memoria. Cada función ejecuta un escenario completo y corta el proceso
//! con un assert si algo no cumple el contrato; sirven como smoke-check
//! rápido sin depender de Postgres (ver feature `pg_demo` para esa ruta).

use std::sync::Arc;

use convoflow_rust::adapters::{LocalFileRetrieval, MemoryChatChannel, TemplateStepGenerator};
use convoflow_rust::domain::{ProcessDefinition, Step, StepType, StepValidation};
use convoflow_rust::engine::{idle_ttl_from_env, AnswerStore, ChatEvent, DialogEngine, EventOutcome, HeaderPatch,
                             ProcessRepository, SessionStore};

const USER: i64 = 1;

fn build_engine() -> (DialogEngine<convoflow_rust::engine::InMemorySessionStore,
                                   convoflow_rust::engine::InMemoryAnswerStore,
                                   convoflow_rust::engine::InMemoryProcessRepository>,
                      Arc<MemoryChatChannel>) {
    let channel = Arc::new(MemoryChatChannel::new());
    let engine = DialogEngine::in_memory().idle_ttl(idle_ttl_from_env())
                                          .build(Box::new(channel.clone()),
                                                 Box::new(LocalFileRetrieval::new("/tmp/convo")),
                                                 Box::new(TemplateStepGenerator::new()));
    (engine, channel)
}

fn signup_process() -> ProcessDefinition {
    let mut p = ProcessDefinition::new("Signup", "quick signup", "validator").expect("process");
    p.push_step(Step::new(StepType::TextInput, "Name").expect("step"));
    p.push_step(Step::new(StepType::YesNo, "Subscribe?").expect("step"));
    p.push_step(Step::new(StepType::Final, "Confirm").expect("step"));
    p
}

/// Escenario 1: Signup completo (texto -> sí/no -> confirmación).
async fn run_signup_validation() {
    let (engine, channel) = build_engine();
    let process = signup_process();
    let pid = process.id;
    engine.processes().save(process);

    engine.begin_process(USER, pid).await.expect("begin");
    let out = engine.handle_event(ChatEvent::text(USER, "Alice")).await.expect("name");
    assert_eq!(out, EventOutcome::Advanced, "signup: name must advance");
    let out = engine.handle_event(ChatEvent::button(USER, "yes")).await.expect("subscribe");
    assert_eq!(out, EventOutcome::Advanced, "signup: yes must advance");
    let out = engine.handle_event(ChatEvent::button(USER, "confirm")).await.expect("confirm");
    assert_eq!(out, EventOutcome::Completed, "signup: confirm must complete");

    let record = engine.answers().load(USER, pid).expect("answer record");
    assert_eq!(record.answers.len(), 2);
    assert!(record.completed_at.is_some());
    assert!(channel.sent_to(USER).iter().any(|m| m.text.contains("Process complete")));
    println!("[OK] signup flow: 2 answers recorded, completion emitted once");
}

/// Escenario 2: retreat en el primer paso es no-op; duplicados no doble-avanzan.
async fn run_navigation_validation() {
    let (engine, _channel) = build_engine();
    let process = signup_process();
    let pid = process.id;
    engine.processes().save(process);

    engine.begin_process(USER, pid).await.expect("begin");
    let out = engine.retreat(USER).await.expect("retreat at 0");
    assert_eq!(out, EventOutcome::AtFirstStep);
    assert_eq!(engine.sessions().get_or_create(USER).current_step_index, 0);

    let ev = ChatEvent::text(USER, "Alice");
    let (a, b) = tokio::join!(engine.handle_event(ev.clone()), engine.handle_event(ev));
    let advanced = [a.expect("dup 1"), b.expect("dup 2")].iter()
                                                         .filter(|o| **o == EventOutcome::Advanced)
                                                         .count();
    assert_eq!(advanced, 1, "duplicate delivery must advance exactly once");
    println!("[OK] navigation: retreat clamped, duplicate delivery advanced once");
}

/// Escenario 3: upload con extensión inválida re-pregunta sin avanzar.
async fn run_upload_validation() {
    let (engine, _channel) = build_engine();
    let mut process = ProcessDefinition::new("Docs", "", "validator").expect("process");
    process.push_step(Step::new(StepType::FileUpload, "Send your CV").expect("step")
                                                                     .with_validation(StepValidation { required: true,
                                                                                                       regex: None,
                                                                                                       file_types: vec!["pdf".into()] }));
    process.push_step(Step::new(StepType::Final, "Confirm").expect("step"));
    let pid = process.id;
    engine.processes().save(process);

    engine.begin_process(USER, pid).await.expect("begin");
    let out = engine.handle_event(ChatEvent::file(USER, "f1", "photo.png")).await.expect("png");
    assert_eq!(out, EventOutcome::RetrySameStep);
    assert_eq!(engine.sessions().get_or_create(USER).current_step_index, 0);
    let out = engine.handle_event(ChatEvent::file(USER, "f2", "cv.pdf")).await.expect("pdf");
    assert_eq!(out, EventOutcome::Advanced);
    println!("[OK] upload: wrong extension rejected, valid retry advanced");
}

/// Escenario 4: editor estructural (swap + splice + patch + regeneración).
async fn run_editor_validation() {
    let (engine, _channel) = build_engine();
    let mut process = ProcessDefinition::new("Survey", "", "validator").expect("process");
    for prompt in ["q1", "q2", "q3", "q4"] {
        process.push_step(Step::new(StepType::TextInput, prompt).expect("step"));
    }
    let pid = process.id;
    let third = process.steps[2].step_id;
    engine.processes().save(process);

    let updated = engine.editor().move_step_up(pid, third).expect("move up");
    assert_eq!(updated.steps[1].prompt, "q3");
    assert!(updated.sequence_is_contiguous());

    let inserted = Step::new(StepType::YesNo, "inserted").expect("step");
    let updated = engine.editor().insert_step_after(pid, 0, inserted).expect("insert");
    assert_eq!(updated.steps[1].prompt, "inserted");
    assert!(updated.sequence_is_contiguous());

    let updated = engine.editor()
                        .edit_header(pid, HeaderPatch { title: Some("Renamed".into()),
                                                        description: None,
                                                        image_url: None })
                        .expect("patch");
    assert_eq!(updated.title, "Renamed");

    let regenerated = engine.editor()
                            .regenerate_with_ai(pid, "Fresh", "from scratch")
                            .await
                            .expect("regenerate");
    assert!(regenerated.sequence_is_contiguous());
    assert!(regenerated.len() > 0);
    println!("[OK] editor: swaps, splices and regeneration keep sequence contiguous");
}

/// Demo opcional contra Postgres (requiere DATABASE_URL).
#[cfg(feature = "pg_demo")]
async fn run_pg_demo() {
    use convoflow_rust::persistence::{build_dev_pool_from_env, PgAnswerStore, PgProcessRepository, PgSessionStore,
                                      PoolProvider};

    if std::env::var("DATABASE_URL").is_err() {
        println!("[skip] pg demo: DATABASE_URL not set");
        return;
    }
    let pool = build_dev_pool_from_env().expect("pg pool");
    let sessions = PgSessionStore::new(PoolProvider { pool: pool.clone() });
    let answers = PgAnswerStore::new(PoolProvider { pool: pool.clone() });
    let processes = PgProcessRepository::new(PoolProvider { pool });

    let channel = Arc::new(MemoryChatChannel::new());
    let engine = DialogEngine::builder(sessions, answers, processes)
        .build(Box::new(channel.clone()),
               Box::new(LocalFileRetrieval::new("/tmp/convo")),
               Box::new(TemplateStepGenerator::new()));

    let process = signup_process();
    let pid = process.id;
    engine.processes().save(process);
    engine.begin_process(USER, pid).await.expect("begin");
    engine.handle_event(ChatEvent::text(USER, "Alice")).await.expect("name");
    engine.handle_event(ChatEvent::button(USER, "yes")).await.expect("subscribe");
    engine.handle_event(ChatEvent::button(USER, "confirm")).await.expect("confirm");
    assert!(engine.answers().load(USER, pid).expect("record").completed_at.is_some());
    println!("[OK] pg demo: signup flow persisted through Postgres stores");
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    run_signup_validation().await;
    run_navigation_validation().await;
    run_upload_validation().await;
    run_editor_validation().await;

    #[cfg(feature = "pg_demo")]
    run_pg_demo().await;

    println!("all validations passed");
}
