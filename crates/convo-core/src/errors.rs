//! Errores del motor y su conversión a mensajes visibles para el usuario.
//!
//! Política de propagación: todo error se atrapa en la frontera del
//! dispatcher (`DialogEngine::handle_event`) y se convierte en un mensaje de
//! chat; ninguno debe tumbar la tarea por usuario ni afectar sesiones ajenas.

use convo_domain::DomainError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messages;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum EngineError {
    /// Proceso, step o sesión inexistente. Recuperable: se informa y el
    /// estado queda intacto.
    #[error("not found: {0}")] NotFound(String),
    /// Entrada rechazada (tipo de archivo, regex, requerido vacío). Se
    /// re-presenta el mismo paso.
    #[error("validation failed: {0}")] Validation(String),
    /// Guard de reentrancia tomado, o navegación sin proceso activo.
    #[error("another transition is in flight")] StateConflict,
    /// Move-up en el primer paso / move-down en el último.
    #[error("step already at boundary")] Boundary,
    /// Falla de colaborador externo (IA, archivos). Sin reintento
    /// automático: el usuario debe reenviar la acción.
    #[error("external service failure: {0}")] ExternalService(String),
    #[error(transparent)] Domain(#[from] DomainError),
    #[error("internal: {0}")] Internal(String),
}

impl EngineError {
    /// Texto corto apto para enviarse por el canal de chat.
    pub fn user_message(&self, lang: &str) -> String {
        match self {
            EngineError::NotFound(what) => messages::not_found(lang, what),
            EngineError::Validation(why) => why.clone(),
            EngineError::StateConflict => messages::busy(lang).to_string(),
            EngineError::Boundary => messages::at_boundary(lang).to_string(),
            EngineError::ExternalService(_) => messages::external_failure(lang).to_string(),
            EngineError::Domain(e) => e.to_string(),
            EngineError::Internal(_) => messages::internal(lang).to_string(),
        }
    }
}
