//! Barrido por TTL de inactividad.
//!
//! El sistema de referencia no tenía política de expiración: una captura
//! podía quedar armada para siempre. Acá la vida de una sesión en
//! `AwaitingInput` está acotada: pasado el TTL sin actividad se desarma el
//! listener, se resetea la sesión (las respuestas durables se conservan) y
//! se avisa al usuario. El host lo invoca periódicamente (p.ej. con
//! `tokio::time::interval`; ver la demo del binario raíz).

use chrono::{DateTime, Duration, Utc};
use convo_domain::ResetMode;

use crate::constants::{DEFAULT_IDLE_TTL_SECS, IDLE_TTL_ENV};
use crate::errors::EngineError;
use crate::messages;
use crate::store::{AnswerStore, ProcessRepository, SessionStore};

use super::core::DialogEngine;

/// TTL configurado por entorno (`CONVO_IDLE_TTL_SECS`), con default de 24h.
pub fn idle_ttl_from_env() -> Duration {
    std::env::var(IDLE_TTL_ENV).ok()
                               .and_then(|v| v.parse::<i64>().ok())
                               .map(Duration::seconds)
                               .unwrap_or_else(|| Duration::seconds(DEFAULT_IDLE_TTL_SECS))
}

impl<S, A, P> DialogEngine<S, A, P>
    where S: SessionStore,
          A: AnswerStore,
          P: ProcessRepository
{
    /// Abandona toda sesión con captura armada cuya última actividad sea
    /// anterior a `now - idle_ttl`. Devuelve los usuarios barridos.
    pub async fn sweep_idle(&self, now: DateTime<Utc>) -> Result<Vec<i64>, EngineError> {
        let cutoff = now - self.idle_ttl;
        let mut expired = Vec::new();
        for user_id in self.sessions.user_ids() {
            if !self.router.has_pending(user_id) {
                continue;
            }
            let session = self.sessions.get_or_create(user_id);
            if session.last_activity >= cutoff {
                continue;
            }
            self.router.disarm(user_id);
            self.sessions.reset(user_id, ResetMode::Abandon);
            // el aviso es best-effort: un canal caído no frena el barrido
            let _ = self.send_text(user_id, messages::session_expired(&session.system_language)).await;
            expired.push(user_id);
        }
        if !expired.is_empty() {
            log::info!("idle sweep abandoned {} session(s)", expired.len());
        }
        Ok(expired)
    }
}
