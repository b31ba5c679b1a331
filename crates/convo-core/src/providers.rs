//! Colaboradores externos del motor (traits async).
//!
//! El detalle de implementación queda fuera del core: el transporte de chat,
//! el almacenamiento binario y la generación por IA se consumen sólo a
//! través de estos contratos. `convo-adapters` trae implementaciones
//! deterministas para tests y demos.

use async_trait::async_trait;
use convo_domain::{ConversationTurn, Step};

use crate::errors::EngineError;
use crate::event::{FileRef, MessageRef, OutboundMessage};

/// Canal de chat saliente. El stream entrante llega por
/// `DialogEngine::handle_event`, no por este trait.
#[async_trait]
pub trait ChatChannel: Send + Sync {
    async fn send_prompt(&self, user_id: i64, message: OutboundMessage) -> Result<MessageRef, EngineError>;
}

/// Resultado de resolver una `FileRef` contra el transporte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedFile {
    pub local_path: String,
    pub file_name: String,
}

#[async_trait]
pub trait FileRetrieval: Send + Sync {
    /// Puede fallar con `EngineError::ExternalService`; el motor no
    /// reintenta solo.
    async fn retrieve(&self, file: &FileRef) -> Result<RetrievedFile, EngineError>;
}

/// Generación de contenido asistida por IA.
#[async_trait]
pub trait StepGenerator: Send + Sync {
    /// Produce una secuencia completa de steps para `regenerate_with_ai`.
    async fn generate_steps(&self, title: &str, description: &str) -> Result<Vec<Step>, EngineError>;

    /// Produce `n` preguntas de seguimiento a partir del historial.
    async fn generate_questions(&self, context: &[ConversationTurn], n: u32) -> Result<Vec<String>, EngineError>;
}

// Impls puente para compartir un colaborador entre el motor y el caller
// (p.ej. inspeccionar el canal en tests mientras el engine lo usa).

#[async_trait]
impl<T: ChatChannel + ?Sized> ChatChannel for std::sync::Arc<T> {
    async fn send_prompt(&self, user_id: i64, message: OutboundMessage) -> Result<MessageRef, EngineError> {
        (**self).send_prompt(user_id, message).await
    }
}

#[async_trait]
impl<T: FileRetrieval + ?Sized> FileRetrieval for std::sync::Arc<T> {
    async fn retrieve(&self, file: &FileRef) -> Result<RetrievedFile, EngineError> {
        (**self).retrieve(file).await
    }
}

#[async_trait]
impl<T: StepGenerator + ?Sized> StepGenerator for std::sync::Arc<T> {
    async fn generate_steps(&self, title: &str, description: &str) -> Result<Vec<Step>, EngineError> {
        (**self).generate_steps(title, description).await
    }

    async fn generate_questions(&self, context: &[ConversationTurn], n: u32) -> Result<Vec<String>, EngineError> {
        (**self).generate_questions(context, n).await
    }
}
