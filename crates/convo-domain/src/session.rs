//! `SessionState`: progreso vivo de un usuario dentro de un proceso.
//!
//! - Una sesión por `user_id`, a lo sumo un proceso activo a la vez.
//! - `current_step_index` sólo lo cambia el Navigator (0..=len; == len
//!   significa "completo").
//! - `is_processing_step` es el guard de reentrancia; su escritura atómica
//!   (compare-and-set) es responsabilidad del `SessionStore`, no de este
//!   tipo.
//! - Se crea perezosamente en la primera interacción y se resetea (no se
//!   borra) cuando arranca una operación lógica nueva.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cache transitoria de respuestas: última escritura gana por índice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedAnswer {
    pub step_index: usize,
    pub value: String,
}

/// Turno de conversación para pasos asistidos por IA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: String,
    pub content: String,
}

/// Operación lógica que inicia tras un reset de sesión.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// El autor va a crear un proceso nuevo.
    Create,
    /// El autor edita un proceso existente; fija `process_id` de inmediato.
    Edit(Uuid),
    /// El usuario empieza a responder un proceso.
    Answer(Uuid),
    /// Abandono explícito o por TTL: sesión queda sin proceso activo.
    Abandon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub user_id: i64,
    pub process_id: Option<Uuid>,
    pub current_step_index: usize,
    #[serde(default)]
    pub answers: Vec<CachedAnswer>,
    #[serde(default)]
    pub is_processing_step: bool,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
    #[serde(default = "default_language")]
    pub system_language: String,
    /// Hash de la definición al iniciar la sesión; detecta ediciones del
    /// autor a mitad de sesión (ver ProcessEditor).
    #[serde(default)]
    pub definition_hash: Option<String>,
    pub last_activity: DateTime<Utc>,
}

fn default_language() -> String {
    "en".to_string()
}

impl SessionState {
    pub fn new(user_id: i64) -> Self {
        Self { user_id,
               process_id: None,
               current_step_index: 0,
               answers: Vec::new(),
               is_processing_step: false,
               conversation_history: Vec::new(),
               system_language: default_language(),
               definition_hash: None,
               last_activity: Utc::now() }
    }

    /// Limpia el progreso independientemente del modo y aplica la
    /// inicialización específica. Preserva `user_id` y `system_language`;
    /// los AnswerRecords durables no se tocan.
    pub fn reset(&mut self, mode: ResetMode) {
        self.process_id = None;
        self.current_step_index = 0;
        self.answers.clear();
        self.is_processing_step = false;
        self.conversation_history.clear();
        self.definition_hash = None;
        self.last_activity = Utc::now();
        match mode {
            ResetMode::Create | ResetMode::Abandon => {}
            ResetMode::Edit(pid) | ResetMode::Answer(pid) => self.process_id = Some(pid),
        }
    }

    /// Upsert en la cache transitoria (última escritura gana).
    pub fn cache_answer(&mut self, step_index: usize, value: impl Into<String>) {
        let value = value.into();
        match self.answers.iter_mut().find(|a| a.step_index == step_index) {
            Some(existing) => existing.value = value,
            None => self.answers.push(CachedAnswer { step_index, value }),
        }
    }

    pub fn cached_answer(&self, step_index: usize) -> Option<&str> {
        self.answers
            .iter()
            .find(|a| a.step_index == step_index)
            .map(|a| a.value.as_str())
    }

    pub fn push_turn(&mut self, role: impl Into<String>, content: impl Into<String>) {
        self.conversation_history.push(ConversationTurn { role: role.into(),
                                                          content: content.into() });
    }

    /// Marca actividad (alimenta el barrido por TTL de inactividad).
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_progress_for_every_mode() {
        for mode in [ResetMode::Create, ResetMode::Abandon] {
            let mut s = SessionState::new(7);
            s.process_id = Some(Uuid::new_v4());
            s.current_step_index = 3;
            s.cache_answer(0, "x");
            s.is_processing_step = true;
            s.push_turn("user", "hola");
            s.reset(mode);
            assert_eq!(s.process_id, None);
            assert_eq!(s.current_step_index, 0);
            assert!(s.answers.is_empty());
            assert!(!s.is_processing_step);
            assert!(s.conversation_history.is_empty());
        }
    }

    #[test]
    fn edit_and_answer_modes_set_process_immediately() {
        let pid = Uuid::new_v4();
        let mut s = SessionState::new(7);
        s.reset(ResetMode::Edit(pid));
        assert_eq!(s.process_id, Some(pid));
        s.reset(ResetMode::Answer(pid));
        assert_eq!(s.process_id, Some(pid));
        assert_eq!(s.current_step_index, 0);
    }

    #[test]
    fn cache_answer_is_latest_write_wins() {
        let mut s = SessionState::new(1);
        s.cache_answer(2, "first");
        s.cache_answer(2, "second");
        assert_eq!(s.answers.len(), 1);
        assert_eq!(s.cached_answer(2), Some("second"));
    }
}
