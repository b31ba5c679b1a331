//! `AnswerRecord`: respuestas durables de un usuario para un proceso.
//!
//! - Clave de upsert: `(user_id, process_id)`; un documento autocontenido,
//!   sin joins.
//! - Nunca hay dos entradas con el mismo `step_index`: re-guardar reemplaza
//!   in place.
//! - Sobrevive a resets de sesión; sólo `regenerate_with_ai` lo descarta
//!   (explícitamente, vía `AnswerStore::discard_for_process`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::process::ProcessDefinition;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub step_index: usize,
    /// Identificador estable del step respondido. Registros antiguos pueden
    /// no tenerlo; el backfill perezoso lo completa al siguiente guardado.
    #[serde(default)]
    pub step_id: Option<Uuid>,
    #[serde(default)]
    pub step_prompt: Option<String>,
    #[serde(default)]
    pub step_description: Option<String>,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub user_id: i64,
    pub process_id: Uuid,
    #[serde(default)]
    pub answers: Vec<AnswerEntry>,
    /// Latch de completitud: se estampa una sola vez al confirmar el paso
    /// Final; llamadas repetidas no lo re-emiten.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl AnswerRecord {
    pub fn new(user_id: i64, process_id: Uuid) -> Self {
        Self { user_id,
               process_id,
               answers: Vec::new(),
               completed_at: None }
    }

    /// Reemplaza la entrada con el mismo `step_index` o agrega una nueva.
    pub fn upsert(&mut self, entry: AnswerEntry) {
        match self.answers
                  .iter_mut()
                  .find(|a| a.step_index == entry.step_index)
        {
            Some(existing) => *existing = entry,
            None => self.answers.push(entry),
        }
    }

    pub fn entry(&self, step_index: usize) -> Option<&AnswerEntry> {
        self.answers.iter().find(|a| a.step_index == step_index)
    }

    /// Migración perezosa: completa `step_id`/`step_prompt`/`step_description`
    /// en entradas antiguas que no los traen, tomándolos de la definición
    /// vigente. Se ejecuta en cada guardado (auto-sanado de registros
    /// previos al snapshot de prompts).
    pub fn backfill_snapshots(&mut self, process: &ProcessDefinition) {
        for entry in self.answers.iter_mut() {
            if entry.step_prompt.is_some() && entry.step_description.is_some() && entry.step_id.is_some() {
                continue;
            }
            if let Ok(step) = process.get_step(entry.step_index) {
                if entry.step_id.is_none() {
                    entry.step_id = Some(step.step_id);
                }
                if entry.step_prompt.is_none() {
                    entry.step_prompt = Some(step.prompt.clone());
                }
                if entry.step_description.is_none() {
                    entry.step_description = Some(step.description.clone());
                }
            }
        }
    }
}
