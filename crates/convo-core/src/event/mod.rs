//! Eventos de chat entrantes y mensajes salientes.

pub mod types;

pub use types::{Button, ChatEvent, ChatEventKind, FileRef, MessageRef, OutboundMessage};
