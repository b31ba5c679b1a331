//! convo-domain: modelo de datos puro del workflow conversacional.
//!
//! Este crate no conoce canales de chat ni persistencia; define únicamente
//! los tipos de dominio y sus invariantes:
//! - `ProcessDefinition` / `Step`: definición ordenada e inmutable-por-versión
//!   de un proceso, con operaciones estructurales que re-derivan
//!   `sequence_number` antes de exponerse.
//! - `SessionState`: progreso vivo de un usuario (cursor, cache de respuestas,
//!   guard de reentrancia).
//! - `AnswerRecord`: respuestas durables por `(user_id, process_id)`.

pub mod answer;
pub mod errors;
pub mod process;
pub mod session;
pub mod step;

pub use answer::{AnswerEntry, AnswerRecord};
pub use errors::DomainError;
pub use process::ProcessDefinition;
pub use session::{CachedAnswer, ConversationTurn, ResetMode, SessionState};
pub use step::{Step, StepMetadata, StepType, StepValidation};
