//! `AnswerStore`: documentos de respuesta durables por `(user_id, process_id)`.

use convo_domain::AnswerRecord;
use dashmap::DashMap;
use uuid::Uuid;

pub trait AnswerStore: Send + Sync {
    fn load(&self, user_id: i64, process_id: Uuid) -> Option<AnswerRecord>;

    /// Upsert del documento completo.
    fn save(&self, record: AnswerRecord);

    fn discard(&self, user_id: i64, process_id: Uuid);

    /// Descarta todos los registros de un proceso (usado por la
    /// regeneración por IA, que invalida los índices viejos). Devuelve la
    /// cantidad descartada.
    fn discard_for_process(&self, process_id: Uuid) -> usize;
}

#[derive(Default)]
pub struct InMemoryAnswerStore {
    inner: DashMap<(i64, Uuid), AnswerRecord>,
}

impl InMemoryAnswerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnswerStore for InMemoryAnswerStore {
    fn load(&self, user_id: i64, process_id: Uuid) -> Option<AnswerRecord> {
        self.inner.get(&(user_id, process_id)).map(|r| r.value().clone())
    }

    fn save(&self, record: AnswerRecord) {
        self.inner.insert((record.user_id, record.process_id), record);
    }

    fn discard(&self, user_id: i64, process_id: Uuid) {
        self.inner.remove(&(user_id, process_id));
    }

    fn discard_for_process(&self, process_id: Uuid) -> usize {
        let keys: Vec<(i64, Uuid)> = self.inner
                                         .iter()
                                         .filter(|e| e.key().1 == process_id)
                                         .map(|e| *e.key())
                                         .collect();
        let n = keys.len();
        for k in keys {
            self.inner.remove(&k);
        }
        n
    }
}
