//! Traits de almacenamiento y backends en memoria.
//!
//! Mismo patrón que la persistencia del resto del workspace: el core define
//! el contrato + una implementación en memoria de paridad exacta;
//! `convo-persistence` provee la variante Postgres (documentos JSONB,
//! upsert por clave, sin joins).

pub mod answers;
pub mod process;
pub mod session;

pub use answers::{AnswerStore, InMemoryAnswerStore};
pub use process::{InMemoryProcessRepository, ProcessRepository};
pub use session::{InMemorySessionStore, SessionStore};
