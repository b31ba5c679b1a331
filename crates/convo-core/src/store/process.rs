//! `ProcessRepository`: definiciones de proceso como documento completo.
//!
//! Los steps no son direccionables por separado en la capa de
//! almacenamiento: toda mutación estructural persiste el documento entero.
//! Nunca hay borrado implícito.

use convo_domain::ProcessDefinition;
use dashmap::DashMap;
use uuid::Uuid;

pub trait ProcessRepository: Send + Sync {
    fn get(&self, id: Uuid) -> Option<ProcessDefinition>;

    /// Upsert del documento completo.
    fn save(&self, process: ProcessDefinition);

    fn list_published(&self) -> Vec<ProcessDefinition>;
}

#[derive(Default)]
pub struct InMemoryProcessRepository {
    inner: DashMap<Uuid, ProcessDefinition>,
}

impl InMemoryProcessRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProcessRepository for InMemoryProcessRepository {
    fn get(&self, id: Uuid) -> Option<ProcessDefinition> {
        self.inner.get(&id).map(|p| p.value().clone())
    }

    fn save(&self, process: ProcessDefinition) {
        self.inner.insert(process.id, process);
    }

    fn list_published(&self) -> Vec<ProcessDefinition> {
        let mut out: Vec<ProcessDefinition> = self.inner
                                                  .iter()
                                                  .filter(|e| e.value().published)
                                                  .map(|e| e.value().clone())
                                                  .collect();
        out.sort_by(|a, b| a.title.cmp(&b.title));
        out
    }
}
