//! Motor de diálogo: dispatcher, navigator, editor y barrido por TTL.

pub mod builder;
pub mod core;
pub mod editor;
pub mod navigator;
pub mod ttl;

pub use builder::EngineBuilder;
pub use core::{DialogEngine, EventOutcome};
pub use editor::{HeaderPatch, ProcessEditor};
pub use ttl::idle_ttl_from_env;
