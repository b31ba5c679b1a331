//! Navigator: avance/retroceso del cursor y sub-flujo de completitud.
//!
//! Invariantes que custodia:
//! - `current_step_index` nunca baja de 0 ni supera `len(steps)`.
//! - El avance toma el guard de reentrancia (compare-and-set) y lo libera
//!   SIEMPRE a la salida, con éxito o con error: dos eventos duplicados en
//!   vuelo producen exactamente un avance.
//! - La completitud se emite una sola vez (latch `completed_at` en el
//!   registro durable); llamadas repetidas no re-disparan el cierre.

use chrono::Utc;
use convo_domain::{ProcessDefinition, SessionState, Step, StepType};

use crate::constants::{CB_FINISH, DEFAULT_NUM_QUESTIONS};
use crate::errors::EngineError;
use crate::event::{Button, OutboundMessage};
use crate::messages;
use crate::router::PendingCapture;
use crate::store::{AnswerStore, ProcessRepository, SessionStore};

use super::core::{DialogEngine, EventOutcome};

impl<S, A, P> DialogEngine<S, A, P>
    where S: SessionStore,
          A: AnswerStore,
          P: ProcessRepository
{
    /// Avanza el cursor y presenta el paso siguiente (o cierra el flujo).
    /// Falla rápido con `StateConflict` si ya hay una transición en vuelo.
    pub async fn advance(&self, user_id: i64) -> Result<EventOutcome, EngineError> {
        if !self.sessions.set_guard(user_id) {
            return Err(EngineError::StateConflict);
        }
        let result = self.advance_inner(user_id).await;
        self.sessions.release_guard(user_id);
        result
    }

    async fn advance_inner(&self, user_id: i64) -> Result<EventOutcome, EngineError> {
        let mut session = self.sessions.get_or_create(user_id);
        let pid = session.process_id.ok_or(EngineError::StateConflict)?;
        let process = self.processes
                          .get(pid)
                          .ok_or_else(|| EngineError::NotFound(format!("process {pid}")))?;

        if session.current_step_index >= process.len() {
            // ya completo: el latch decide si hay algo que emitir
            return self.complete_flow(&process, &mut session).await;
        }
        session.current_step_index += 1;
        session.touch();
        self.sessions.save(session.clone());
        self.present_from(&process, &mut session).await
    }

    /// Retrocede un paso; en el índice 0 es un no-op informativo.
    pub async fn retreat(&self, user_id: i64) -> Result<EventOutcome, EngineError> {
        if !self.sessions.set_guard(user_id) {
            return Err(EngineError::StateConflict);
        }
        let result = self.retreat_inner(user_id).await;
        self.sessions.release_guard(user_id);
        result
    }

    async fn retreat_inner(&self, user_id: i64) -> Result<EventOutcome, EngineError> {
        let mut session = self.sessions.get_or_create(user_id);
        let pid = session.process_id.ok_or(EngineError::StateConflict)?;
        let process = self.processes
                          .get(pid)
                          .ok_or_else(|| EngineError::NotFound(format!("process {pid}")))?;

        if session.current_step_index == 0 {
            self.send_text(user_id, messages::already_first_step(&session.system_language)).await?;
            // el click consumió la captura del paso vigente: re-presentar
            self.present_from(&process, &mut session).await?;
            return Ok(EventOutcome::AtFirstStep);
        }
        session.current_step_index -= 1;
        session.touch();
        self.sessions.save(session.clone());
        match self.present_from(&process, &mut session).await? {
            EventOutcome::Completed => Ok(EventOutcome::Completed),
            _ => Ok(EventOutcome::Retreated),
        }
    }

    /// Presenta el paso en el cursor actual, avanzando automáticamente a
    /// través de pasos `GenerateQuestions` (sin captura) mientras se sigue
    /// sosteniendo el guard. Devuelve `Completed` si el cursor llegó al
    /// final.
    pub(crate) async fn present_from(&self,
                                     process: &ProcessDefinition,
                                     session: &mut SessionState)
                                     -> Result<EventOutcome, EngineError> {
        loop {
            let index = session.current_step_index;
            if index >= process.len() {
                return self.complete_flow(process, session).await;
            }
            let step = process.get_step(index)?.clone();

            if step.step_type == StepType::GenerateQuestions {
                self.run_generate_questions(session, &step).await?;
                session.current_step_index += 1;
                self.sessions.save(session.clone());
                continue;
            }

            self.render_step(session, &step).await?;
            if let Some(kind) = Self::capture_kind_for(&step) {
                self.router
                    .arm(session.user_id, PendingCapture::new(process.id, index, kind));
            }
            return Ok(EventOutcome::Advanced);
        }
    }

    /// Paso asistido por IA: genera preguntas de seguimiento, las fusiona
    /// al historial de conversación y se las muestra al usuario. No arma
    /// captura; el caller avanza el cursor.
    async fn run_generate_questions(&self, session: &mut SessionState, step: &Step) -> Result<(), EngineError> {
        let n = step.metadata.num_questions.unwrap_or(DEFAULT_NUM_QUESTIONS);
        session.push_turn("user", step.prompt.clone());
        let questions = self.generator.generate_questions(&session.conversation_history, n).await?;
        for q in &questions {
            session.push_turn("assistant", q.clone());
        }
        let mut text = step.prompt.clone();
        for (i, q) in questions.iter().enumerate() {
            text.push_str(&format!("\n{}. {q}", i + 1));
        }
        self.send_text(session.user_id, text).await
    }

    /// Sub-flujo de cierre. Idempotente: estampa `completed_at` y emite el
    /// mensaje final sólo la primera vez.
    pub(crate) async fn complete_flow(&self,
                                      process: &ProcessDefinition,
                                      session: &mut SessionState)
                                      -> Result<EventOutcome, EngineError> {
        let user_id = session.user_id;
        let lang = session.system_language.clone();
        let mut record = self.answers
                             .load(user_id, process.id)
                             .unwrap_or_else(|| convo_domain::AnswerRecord::new(user_id, process.id));

        if record.completed_at.is_some() {
            self.send_text(user_id, messages::already_completed(&lang)).await?;
            return Ok(EventOutcome::Completed);
        }

        record.backfill_snapshots(process);
        record.completed_at = Some(Utc::now());
        let answered = record.answers.len();
        self.answers.save(record);
        self.sessions.save(session.clone());

        let msg = OutboundMessage::text(messages::completed(&lang, answered))
            .with_button_row(vec![Button::new(messages::btn_finish(&lang), CB_FINISH)]);
        self.channel.send_prompt(user_id, msg).await?;
        Ok(EventOutcome::Completed)
    }
}
