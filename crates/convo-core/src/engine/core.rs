//! Núcleo del `DialogEngine`: la frontera de eventos y el dispatcher
//! polimórfico de pasos.
//!
//! Responsable de:
//! - Recibir cada evento entrante y entregarlo (vía `CaptureRouter`) a la
//!   única captura armada de ese usuario, si existe y el tipo calza.
//! - Presentar cada paso según su variante y armar el listener one-shot
//!   correspondiente.
//! - Persistir respuestas (`save_answer`) en cache de sesión + registro
//!   durable, con backfill perezoso de snapshots.
//! - Convertir todo error recuperable en un mensaje de chat sin tumbar la
//!   tarea por usuario.

use convo_domain::{AnswerEntry, AnswerRecord, ResetMode, SessionState, Step, StepType};
use indexmap::IndexSet;
use regex::Regex;
use uuid::Uuid;

use crate::constants::{ANSWER_NO, ANSWER_YES, CB_CONFIRM, CB_DONE, CB_NEXT, CB_NO, CB_OPT_PREFIX, CB_PREV, CB_YES,
                       CHOICE_JOIN};
use crate::errors::EngineError;
use crate::event::{Button, ChatEvent, ChatEventKind, FileRef, OutboundMessage};
use crate::hashing;
use crate::messages;
use crate::providers::{ChatChannel, FileRetrieval, StepGenerator};
use crate::router::{CaptureKind, CaptureRouter, PendingCapture};
use crate::store::{AnswerStore, ProcessRepository, SessionStore};

use super::editor::ProcessEditor;

/// Resultado observable de procesar un evento (para hosts y tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Sin captura armada para ese usuario; el host decide qué hacer.
    Ignored,
    /// Evento incompatible con la captura armada; se envió un hint y la
    /// captura sigue viva.
    Rejected,
    /// Validación fallida: mismo paso re-armado, sin avance.
    RetrySameStep,
    /// Toggle de selección múltiple aplicado; la captura sigue armada.
    SelectionToggled,
    /// Respuesta capturada y cursor avanzado.
    Advanced,
    /// Retrocedió un paso.
    Retreated,
    /// Retreat en el índice 0: no-op informativo.
    AtFirstStep,
    /// Flujo completado (sub-flujo de cierre ejecutado o ya ejecutado).
    Completed,
    /// Guard tomado: transición duplicada descartada.
    Busy,
}

pub struct DialogEngine<S, A, P>
    where S: SessionStore,
          A: AnswerStore,
          P: ProcessRepository
{
    pub(crate) sessions: S,
    pub(crate) answers: A,
    pub(crate) processes: P,
    pub(crate) router: CaptureRouter,
    pub(crate) channel: Box<dyn ChatChannel>,
    pub(crate) files: Box<dyn FileRetrieval>,
    pub(crate) generator: Box<dyn StepGenerator>,
    pub(crate) idle_ttl: chrono::Duration,
}

impl<S, A, P> DialogEngine<S, A, P>
    where S: SessionStore,
          A: AnswerStore,
          P: ProcessRepository
{
    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    pub fn answers(&self) -> &A {
        &self.answers
    }

    pub fn processes(&self) -> &P {
        &self.processes
    }

    pub fn router(&self) -> &CaptureRouter {
        &self.router
    }

    /// Editor estructural sobre los mismos stores (opera fuera de banda
    /// respecto de las sesiones vivas).
    pub fn editor(&self) -> ProcessEditor<'_, A, P> {
        ProcessEditor::new(&self.answers, &self.processes, self.generator.as_ref())
    }

    /// Frontera de entrada: un evento del stream multiplexado.
    ///
    /// Contrato de errores: las condiciones recuperables (validación,
    /// guard tomado, colaborador caído) se convierten acá o más adentro en
    /// mensajes al usuario y devuelven `Ok(outcome)`. Un `Err` indica una
    /// falla dura (store inconsistente, colaborador de IA caído a mitad de
    /// avance); el mensaje al usuario ya fue enviado y el paso vigente
    /// re-presentado best-effort para que pueda reintentar.
    pub async fn handle_event(&self, event: ChatEvent) -> Result<EventOutcome, EngineError> {
        let capture = match self.router.take_matching(&event) {
            Some(c) => c,
            None => {
                if let Some(pending) = self.router.peek(event.user_id) {
                    let lang = self.lang(event.user_id);
                    let hint = match pending.kind {
                        CaptureKind::Text => messages::text_hint(&lang),
                        CaptureKind::File => messages::file_hint(&lang),
                        _ => messages::button_hint(&lang),
                    };
                    self.send_text(event.user_id, hint).await?;
                    return Ok(EventOutcome::Rejected);
                }
                log::debug!("event without armed capture for user {}", event.user_id);
                return Ok(EventOutcome::Ignored);
            }
        };

        match self.process_capture(&event, &capture).await {
            Ok(outcome) => Ok(outcome),
            Err(EngineError::StateConflict) => {
                let lang = self.lang(event.user_id);
                self.send_text(event.user_id, messages::busy(&lang)).await?;
                Ok(EventOutcome::Busy)
            }
            Err(err) => {
                let lang = self.lang(event.user_id);
                let _ = self.send_text(event.user_id, err.user_message(&lang)).await;
                // la captura consumida no se re-arma tal cual: el cursor
                // pudo haber quedado en un paso distinto (p.ej. un paso
                // automático que falló); re-presentar el vigente re-arma
                // lo que corresponda
                let _ = self.present_current(event.user_id).await;
                Err(err)
            }
        }
    }

    async fn process_capture(&self, event: &ChatEvent, cap: &PendingCapture) -> Result<EventOutcome, EngineError> {
        let user_id = event.user_id;
        let process = self.processes
                          .get(cap.process_id)
                          .ok_or_else(|| EngineError::NotFound(format!("process {}", cap.process_id)))?;

        let mut session = self.sessions.get_or_create(user_id);
        if let Some(h) = session.definition_hash.as_deref() {
            if h != hashing::definition_hash(&process) {
                // edición del autor a mitad de sesión: inconsistencia
                // conocida, se continúa contra la definición nueva
                log::warn!("process {} edited mid-session (user {user_id})", process.id);
            }
        }
        session.touch();
        self.sessions.save(session.clone());

        let step = process.get_step(cap.step_index)
                          .map_err(|_| EngineError::NotFound(format!("step {} of process {}", cap.step_index, process.id)))?
                          .clone();
        let lang = session.system_language.clone();

        match (cap.kind, &event.kind) {
            (CaptureKind::Text, ChatEventKind::Text(text)) => {
                self.capture_text(user_id, text, cap, &step, &lang).await
            }
            (CaptureKind::YesNo, ChatEventKind::Button(data)) => self.capture_yes_no(user_id, data, cap).await,
            (CaptureKind::Choice, ChatEventKind::Button(data)) => {
                self.capture_choice(user_id, data, cap, &step, &lang).await
            }
            (CaptureKind::File, ChatEventKind::File(file)) => {
                self.capture_file(user_id, file, cap, &step, &lang).await
            }
            (CaptureKind::Confirm, ChatEventKind::Button(data)) if data == CB_CONFIRM => self.advance(user_id).await,
            (CaptureKind::InfoNav, ChatEventKind::Button(data)) => match data.as_str() {
                CB_NEXT => self.advance(user_id).await,
                CB_PREV => self.retreat(user_id).await,
                other => Err(EngineError::Internal(format!("unexpected info payload: {other}"))),
            },
            _ => Err(EngineError::Internal("capture/event kind mismatch".to_string())),
        }
    }

    async fn capture_text(&self,
                          user_id: i64,
                          text: &str,
                          cap: &PendingCapture,
                          step: &Step,
                          lang: &str)
                          -> Result<EventOutcome, EngineError> {
        let trimmed = text.trim();
        if step.validation.required && trimmed.is_empty() {
            self.send_text(user_id, messages::text_required(lang)).await?;
            self.router.arm(user_id, cap.clone());
            return Ok(EventOutcome::RetrySameStep);
        }
        if let Some(pattern) = step.validation.regex.as_deref() {
            match Regex::new(pattern) {
                Ok(re) => {
                    if !re.is_match(trimmed) {
                        self.send_text(user_id, messages::text_rejected(lang)).await?;
                        self.router.arm(user_id, cap.clone());
                        return Ok(EventOutcome::RetrySameStep);
                    }
                }
                // regex inválida es un bug del autor del proceso, no del
                // usuario: se acepta la respuesta y queda rastro en el log
                Err(e) => log::warn!("step {} carries an invalid validation regex: {e}", step.step_id),
            }
        }
        self.save_answer(user_id, cap.process_id, cap.step_index, trimmed.to_string())?;
        self.advance(user_id).await
    }

    async fn capture_yes_no(&self, user_id: i64, data: &str, cap: &PendingCapture) -> Result<EventOutcome, EngineError> {
        let value = match data {
            CB_YES => ANSWER_YES,
            CB_NO => ANSWER_NO,
            other => return Err(EngineError::Internal(format!("unexpected yes/no payload: {other}"))),
        };
        self.save_answer(user_id, cap.process_id, cap.step_index, value.to_string())?;
        self.advance(user_id).await
    }

    /// Selección múltiple corregida: los clicks de opción togglean la
    /// membresía (re-guardando el valor conjunto en cada toggle) y recién
    /// el botón Listo avanza.
    async fn capture_choice(&self,
                            user_id: i64,
                            data: &str,
                            cap: &PendingCapture,
                            step: &Step,
                            lang: &str)
                            -> Result<EventOutcome, EngineError> {
        if data == CB_DONE {
            let session = self.sessions.get_or_create(user_id);
            let empty = session.cached_answer(cap.step_index).map_or(true, str::is_empty);
            if step.validation.required && empty {
                self.send_text(user_id, messages::choice_empty(lang)).await?;
                self.router.arm(user_id, cap.clone());
                return Ok(EventOutcome::RetrySameStep);
            }
            return self.advance(user_id).await;
        }

        let idx: usize = data.strip_prefix(CB_OPT_PREFIX)
                             .and_then(|s| s.parse().ok())
                             .ok_or_else(|| EngineError::Internal(format!("malformed choice payload: {data}")))?;
        let option = step.options
                         .get(idx)
                         .ok_or_else(|| EngineError::NotFound(format!("option {idx}")))?
                         .clone();

        let session = self.sessions.get_or_create(user_id);
        let mut selected: IndexSet<String> =
            session.cached_answer(cap.step_index)
                   .map(|v| v.split(CHOICE_JOIN).filter(|s| !s.is_empty()).map(str::to_string).collect())
                   .unwrap_or_default();
        if !selected.shift_remove(&option) {
            selected.insert(option);
        }
        let joined = selected.iter().cloned().collect::<Vec<_>>().join(CHOICE_JOIN);
        self.save_answer(user_id, cap.process_id, cap.step_index, joined)?;

        // refrescar marcas de selección y dejar la captura armada
        let session = self.sessions.get_or_create(user_id);
        self.render_step(&session, step).await?;
        self.router.arm(user_id, cap.clone());
        Ok(EventOutcome::SelectionToggled)
    }

    async fn capture_file(&self,
                          user_id: i64,
                          file: &FileRef,
                          cap: &PendingCapture,
                          step: &Step,
                          lang: &str)
                          -> Result<EventOutcome, EngineError> {
        let allowed = &step.validation.file_types;
        let ext = std::path::Path::new(&file.file_name).extension()
                                                       .map(|e| e.to_string_lossy().to_ascii_lowercase())
                                                       .unwrap_or_default();
        if !allowed.is_empty() && !allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)) {
            // mismo paso, sin avance, reintentos ilimitados
            self.send_text(user_id, messages::file_type_rejected(lang, allowed)).await?;
            self.router.arm(user_id, cap.clone());
            return Ok(EventOutcome::RetrySameStep);
        }

        match self.files.retrieve(file).await {
            Ok(retrieved) => {
                self.save_answer(user_id, cap.process_id, cap.step_index, retrieved.file_name)?;
                self.advance(user_id).await
            }
            Err(err @ EngineError::ExternalService(_)) => {
                // sin reintento automático: el usuario reenvía el archivo
                self.send_text(user_id, err.user_message(lang)).await?;
                self.router.arm(user_id, cap.clone());
                Ok(EventOutcome::RetrySameStep)
            }
            Err(other) => Err(other),
        }
    }

    /// Persiste una respuesta en cache de sesión + registro durable.
    ///
    /// - No-op de persistencia para pasos `Info`.
    /// - Reemplaza la entrada existente con el mismo `step_index` (nunca
    ///   duplica).
    /// - Backfillea snapshots faltantes de entradas anteriores del mismo
    ///   registro (auto-sanado perezoso, comportamiento deliberado).
    pub fn save_answer(&self,
                       user_id: i64,
                       process_id: Uuid,
                       step_index: usize,
                       value: String)
                       -> Result<SessionState, EngineError> {
        let process = self.processes
                          .get(process_id)
                          .ok_or_else(|| EngineError::NotFound(format!("process {process_id}")))?;
        let step = process.get_step(step_index)
                          .map_err(|_| EngineError::NotFound(format!("step {step_index} of process {process_id}")))?;

        let mut session = self.sessions.get_or_create(user_id);
        if step.step_type.carries_answer() {
            session.cache_answer(step_index, value.clone());

            let mut record = self.answers
                                 .load(user_id, process_id)
                                 .unwrap_or_else(|| AnswerRecord::new(user_id, process_id));
            record.upsert(AnswerEntry { step_index,
                                        step_id: Some(step.step_id),
                                        step_prompt: Some(step.prompt.clone()),
                                        step_description: Some(step.description.clone()),
                                        answer: value });
            record.backfill_snapshots(&process);
            self.answers.save(record);
        }
        session.touch();
        self.sessions.save(session.clone());
        Ok(session)
    }

    /// Arranca (o re-arranca) el flujo de respuesta de un proceso para un
    /// usuario: resetea la sesión, estampa el hash de definición y presenta
    /// el primer paso. Cualquier captura previa queda desarmada.
    pub async fn begin_process(&self, user_id: i64, process_id: Uuid) -> Result<EventOutcome, EngineError> {
        let process = self.processes
                          .get(process_id)
                          .ok_or_else(|| EngineError::NotFound(format!("process {process_id}")))?;
        self.router.disarm(user_id);
        let mut session = self.sessions.reset(user_id, ResetMode::Answer(process_id));
        session.definition_hash = Some(hashing::definition_hash(&process));
        self.sessions.save(session);

        if !self.sessions.set_guard(user_id) {
            return Err(EngineError::StateConflict);
        }
        let mut session = self.sessions.get_or_create(user_id);
        let result = self.present_from(&process, &mut session).await;
        self.sessions.release_guard(user_id);
        result
    }

    /// Re-presenta el paso vigente (hook de "reintentar" para hosts, p.ej.
    /// tras la caída de un colaborador externo).
    pub async fn present_current(&self, user_id: i64) -> Result<EventOutcome, EngineError> {
        if !self.sessions.set_guard(user_id) {
            return Err(EngineError::StateConflict);
        }
        let result = self.present_current_inner(user_id).await;
        self.sessions.release_guard(user_id);
        result
    }

    async fn present_current_inner(&self, user_id: i64) -> Result<EventOutcome, EngineError> {
        let mut session = self.sessions.get_or_create(user_id);
        let Some(pid) = session.process_id else {
            self.send_text(user_id, messages::no_active_process(&session.system_language)).await?;
            return Ok(EventOutcome::Ignored);
        };
        let process = self.processes
                          .get(pid)
                          .ok_or_else(|| EngineError::NotFound(format!("process {pid}")))?;
        self.present_from(&process, &mut session).await
    }

    /// Abandono explícito: desarma la captura y resetea la sesión. Las
    /// respuestas durables se conservan.
    pub async fn abandon(&self, user_id: i64) -> Result<(), EngineError> {
        self.router.disarm(user_id);
        let lang = self.lang(user_id);
        self.sessions.reset(user_id, ResetMode::Abandon);
        self.send_text(user_id, messages::abandoned(&lang)).await
    }

    /// Render del paso + armado de su captura (cuando corresponde) lo hace
    /// el navigator vía `present_from`; acá sólo el render por variante.
    pub(crate) async fn render_step(&self, session: &SessionState, step: &Step) -> Result<(), EngineError> {
        let lang = session.system_language.as_str();
        let mut text = step.prompt.clone();
        if !step.description.is_empty() {
            text.push('\n');
            text.push_str(&step.description);
        }

        let msg = match step.step_type {
            StepType::TextInput | StepType::GenerateQuestions => OutboundMessage::text(text),
            StepType::YesNo => {
                OutboundMessage::text(text).with_button_row(vec![Button::new(messages::btn_yes(lang), CB_YES),
                                                                 Button::new(messages::btn_no(lang), CB_NO)])
            }
            StepType::Choice => {
                let selected: Vec<&str> = session.cached_answer(session.current_step_index)
                                                 .map(|v| v.split(CHOICE_JOIN).collect())
                                                 .unwrap_or_default();
                let mut msg = OutboundMessage::text(text);
                for (i, option) in step.options.iter().enumerate() {
                    let label = if selected.contains(&option.as_str()) {
                        format!("✓ {option}")
                    } else {
                        option.clone()
                    };
                    msg = msg.with_button_row(vec![Button::new(label, format!("{CB_OPT_PREFIX}{i}"))]);
                }
                msg.with_button_row(vec![Button::new(messages::btn_done(lang), CB_DONE)])
            }
            StepType::FileUpload => {
                if !step.validation.file_types.is_empty() {
                    text.push('\n');
                    text.push_str(&format!("({})", step.validation.file_types.join(", ")));
                }
                OutboundMessage::text(text)
            }
            StepType::Final => {
                OutboundMessage::text(text).with_button_row(vec![Button::new(messages::btn_confirm(lang), CB_CONFIRM)])
            }
            StepType::Info => {
                OutboundMessage::text(text).with_button_row(vec![Button::new(messages::btn_prev(lang), CB_PREV),
                                                                 Button::new(messages::btn_next(lang), CB_NEXT)])
            }
        };
        self.channel.send_prompt(session.user_id, msg).await.map(|_| ())
    }

    pub(crate) fn capture_kind_for(step: &Step) -> Option<CaptureKind> {
        match step.step_type {
            StepType::TextInput => Some(CaptureKind::Text),
            StepType::YesNo => Some(CaptureKind::YesNo),
            StepType::Choice => Some(CaptureKind::Choice),
            StepType::FileUpload => Some(CaptureKind::File),
            StepType::Final => Some(CaptureKind::Confirm),
            StepType::Info => Some(CaptureKind::InfoNav),
            // paso automático: no arma captura
            StepType::GenerateQuestions => None,
        }
    }

    pub(crate) async fn send_text(&self, user_id: i64, text: impl Into<String>) -> Result<(), EngineError> {
        self.channel
            .send_prompt(user_id, OutboundMessage::text(text))
            .await
            .map(|_| ())
    }

    pub(crate) fn lang(&self, user_id: i64) -> String {
        self.sessions.get_or_create(user_id).system_language
    }
}
