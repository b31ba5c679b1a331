//! Paridad Postgres vs. memoria (requiere DATABASE_URL válido en entorno).

use convo_core::store::{AnswerStore, ProcessRepository, SessionStore};
use convo_domain::{AnswerEntry, AnswerRecord, ProcessDefinition, ResetMode, Step, StepType};
use convo_persistence::{build_dev_pool_from_env, PgAnswerStore, PgProcessRepository, PgSessionStore, PoolProvider};
use uuid::Uuid;

fn unique_user() -> i64 {
    // id único por corrida para no chocar con datos previos
    (Uuid::new_v4().as_u128() as i64).abs()
}

fn provider() -> PoolProvider {
    let pool = build_dev_pool_from_env().expect("dev pool");
    PoolProvider { pool }
}

#[test]
fn guard_cas_wins_exactly_once() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set - skipping PG integration test");
        return;
    }
    let store = PgSessionStore::new(provider());
    let user = unique_user();

    assert!(store.set_guard(user), "first acquisition wins");
    assert!(!store.set_guard(user), "second acquisition must lose");
    store.release_guard(user);
    assert!(store.set_guard(user), "reacquire after release");
    store.release_guard(user);
}

#[test]
fn session_roundtrip_and_reset() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set - skipping PG integration test");
        return;
    }
    let store = PgSessionStore::new(provider());
    let user = unique_user();
    let pid = Uuid::new_v4();

    let mut s = store.get_or_create(user);
    s.process_id = Some(pid);
    s.current_step_index = 2;
    s.cache_answer(0, "hola");
    store.save(s);

    let loaded = store.get_or_create(user);
    assert_eq!(loaded.process_id, Some(pid));
    assert_eq!(loaded.current_step_index, 2);
    assert_eq!(loaded.cached_answer(0), Some("hola"));

    let after = store.reset(user, ResetMode::Answer(pid));
    assert_eq!(after.process_id, Some(pid));
    assert_eq!(after.current_step_index, 0);
    assert!(after.answers.is_empty());
}

#[test]
fn answer_record_upsert_keeps_single_row() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set - skipping PG integration test");
        return;
    }
    let store = PgAnswerStore::new(provider());
    let user = unique_user();
    let pid = Uuid::new_v4();

    let mut record = AnswerRecord::new(user, pid);
    record.upsert(AnswerEntry { step_index: 0,
                                step_id: None,
                                step_prompt: Some("Name?".into()),
                                step_description: None,
                                answer: "Alice".into() });
    store.save(record.clone());

    record.upsert(AnswerEntry { step_index: 0,
                                step_id: None,
                                step_prompt: Some("Name?".into()),
                                step_description: None,
                                answer: "Bob".into() });
    store.save(record);

    let loaded = store.load(user, pid).expect("record");
    assert_eq!(loaded.answers.len(), 1, "upsert replaced in place");
    assert_eq!(loaded.entry(0).unwrap().answer, "Bob");

    assert_eq!(store.discard_for_process(pid), 1);
    assert!(store.load(user, pid).is_none());
}

#[test]
fn process_roundtrip_and_published_listing() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set - skipping PG integration test");
        return;
    }
    let repo = PgProcessRepository::new(provider());

    let mut p = ProcessDefinition::new(format!("Parity {}", Uuid::new_v4()), "", "tester").expect("process");
    p.push_step(Step::new(StepType::TextInput, "q1").expect("step"));
    p.published = true;
    let pid = p.id;
    repo.save(p.clone());

    let loaded = repo.get(pid).expect("stored process");
    assert_eq!(loaded, p);
    assert!(loaded.sequence_is_contiguous());

    let published = repo.list_published();
    assert!(published.iter().any(|x| x.id == pid), "published listing includes it");

    // el upsert reemplaza el documento completo
    let mut edited = loaded;
    edited.published = false;
    repo.save(edited);
    assert!(!repo.get(pid).expect("still there").published);
}
