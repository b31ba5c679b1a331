//! ConvoFlow Rust Library
//!
//! Este crate actúa como la fachada central de ConvoFlow:
//! - `domain`: tipos del modelo (procesos, steps, sesiones, respuestas).
//! - `engine`: el motor conversacional (`DialogEngine`, router, editor).
//! - `adapters`: colaboradores deterministas para tests y demos.
//! - `persistence` (feature `pg_demo`): stores Postgres.
//!
//! Puede usarse desde `main.rs` o por otros crates/clientes.

pub use convo_adapters as adapters;
pub use convo_core as engine;
pub use convo_domain as domain;
#[cfg(feature = "pg_demo")]
pub use convo_persistence as persistence;
