//! Builder del `DialogEngine`.

use chrono::Duration;

use crate::constants::DEFAULT_IDLE_TTL_SECS;
use crate::providers::{ChatChannel, FileRetrieval, StepGenerator};
use crate::router::CaptureRouter;
use crate::store::{AnswerStore, InMemoryAnswerStore, InMemoryProcessRepository, InMemorySessionStore,
                   ProcessRepository, SessionStore};

use super::core::DialogEngine;

pub struct EngineBuilder<S, A, P>
    where S: SessionStore,
          A: AnswerStore,
          P: ProcessRepository
{
    sessions: S,
    answers: A,
    processes: P,
    idle_ttl: Duration,
}

impl<S, A, P> DialogEngine<S, A, P>
    where S: SessionStore,
          A: AnswerStore,
          P: ProcessRepository
{
    /// Builder con stores explícitos (Postgres u otros).
    pub fn builder(sessions: S, answers: A, processes: P) -> EngineBuilder<S, A, P> {
        EngineBuilder { sessions,
                        answers,
                        processes,
                        idle_ttl: Duration::seconds(DEFAULT_IDLE_TTL_SECS) }
    }
}

impl DialogEngine<InMemorySessionStore, InMemoryAnswerStore, InMemoryProcessRepository> {
    /// Builder con stores en memoria (tests y demos).
    pub fn in_memory() -> EngineBuilder<InMemorySessionStore, InMemoryAnswerStore, InMemoryProcessRepository> {
        DialogEngine::builder(InMemorySessionStore::new(),
                              InMemoryAnswerStore::new(),
                              InMemoryProcessRepository::new())
    }
}

impl<S, A, P> EngineBuilder<S, A, P>
    where S: SessionStore,
          A: AnswerStore,
          P: ProcessRepository
{
    pub fn idle_ttl(mut self, ttl: Duration) -> Self {
        self.idle_ttl = ttl;
        self
    }

    pub fn build(self,
                 channel: Box<dyn ChatChannel>,
                 files: Box<dyn FileRetrieval>,
                 generator: Box<dyn StepGenerator>)
                 -> DialogEngine<S, A, P> {
        DialogEngine { sessions: self.sessions,
                       answers: self.answers,
                       processes: self.processes,
                       router: CaptureRouter::new(),
                       channel,
                       files,
                       generator,
                       idle_ttl: self.idle_ttl }
    }
}
