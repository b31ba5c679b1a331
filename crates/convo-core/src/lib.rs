//! convo-core: motor de workflows conversacionales guiados.
//!
//! Un proceso autoría una secuencia ordenada de pasos tipados; el motor la
//! recorre usuario por usuario sobre un canal de chat asíncrono:
//! - `CaptureRouter` entrega cada evento entrante a la única captura
//!   one-shot armada para ese usuario (desarme atómico antes de procesar).
//! - `DialogEngine` presenta cada paso según su variante, valida y
//!   persiste respuestas, y navega con un guard de reentrancia
//!   compare-and-set por usuario.
//! - `ProcessEditor` muta la definición fuera de banda (rol de autor).
//!
//! Los stores son traits con backend en memoria acá y Postgres en
//! `convo-persistence`; el canal, los archivos y la IA entran por los
//! traits de `providers`.

pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod messages;
pub mod providers;
pub mod router;
pub mod store;

pub use engine::{DialogEngine, EngineBuilder, EventOutcome, HeaderPatch, ProcessEditor};
pub use engine::ttl::idle_ttl_from_env;
pub use errors::EngineError;
pub use event::{Button, ChatEvent, ChatEventKind, FileRef, MessageRef, OutboundMessage};
pub use providers::{ChatChannel, FileRetrieval, RetrievedFile, StepGenerator};
pub use router::{CaptureKind, CaptureRouter, PendingCapture};
pub use store::{AnswerStore, InMemoryAnswerStore, InMemoryProcessRepository, InMemorySessionStore, ProcessRepository,
                SessionStore};
