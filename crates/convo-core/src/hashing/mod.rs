//! Módulo de hashing y canonicalización JSON.
//!
//! Uso en el motor: `definition_hash` estampa la versión de una
//! `ProcessDefinition` al iniciar una sesión; si el autor edita la
//! definición a mitad de sesión, el mismatch queda detectable (y logueado)
//! en la siguiente captura.

pub mod canonical_json;
pub mod hash;

pub use canonical_json::to_canonical_json;
pub use hash::{hash_str, hash_value};

use convo_domain::ProcessDefinition;

/// Hash estable de una definición (versión del motor incluida, para que un
/// cambio de formato invalide hashes viejos).
pub fn definition_hash(process: &ProcessDefinition) -> String {
    let value = serde_json::json!({
        "engine_version": crate::constants::ENGINE_VERSION,
        "process": process,
    });
    hash_value(&value)
}
