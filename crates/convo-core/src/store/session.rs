//! `SessionStore`: sesiones por usuario con guard de reentrancia atómico.
//!
//! `set_guard` es un compare-and-set real: devuelve `true` y marca
//! `is_processing_step` sólo si estaba en `false`. El backend en memoria lo
//! resuelve bajo el lock de shard de `DashMap`; el backend Postgres usa un
//! UPDATE condicional de una sola sentencia. Un read-then-write en dos pasos
//! no alcanza: dos eventos duplicados lo pasarían a la vez.

use convo_domain::{ResetMode, SessionState};
use dashmap::DashMap;

pub trait SessionStore: Send + Sync {
    /// Crea perezosamente en la primera interacción; devuelve un snapshot.
    fn get_or_create(&self, user_id: i64) -> SessionState;

    /// Escritura completa del documento de sesión.
    fn save(&self, session: SessionState);

    /// Limpia progreso y aplica la inicialización del modo; la sesión se
    /// conserva (no se borra). Devuelve el estado resultante.
    fn reset(&self, user_id: i64, mode: ResetMode) -> SessionState;

    /// Compare-and-set del guard de reentrancia.
    fn set_guard(&self, user_id: i64) -> bool;

    fn release_guard(&self, user_id: i64);

    /// Soporte del barrido por TTL.
    fn user_ids(&self) -> Vec<i64>;
}

#[derive(Default)]
pub struct InMemorySessionStore {
    inner: DashMap<i64, SessionState>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_or_create(&self, user_id: i64) -> SessionState {
        self.inner
            .entry(user_id)
            .or_insert_with(|| SessionState::new(user_id))
            .value()
            .clone()
    }

    fn save(&self, session: SessionState) {
        self.inner.insert(session.user_id, session);
    }

    fn reset(&self, user_id: i64, mode: ResetMode) -> SessionState {
        let mut entry = self.inner
                            .entry(user_id)
                            .or_insert_with(|| SessionState::new(user_id));
        entry.reset(mode);
        entry.value().clone()
    }

    fn set_guard(&self, user_id: i64) -> bool {
        // entry() retiene el lock del shard durante todo el bloque: el
        // check y la escritura son una sola operación observable.
        let mut entry = self.inner
                            .entry(user_id)
                            .or_insert_with(|| SessionState::new(user_id));
        if entry.is_processing_step {
            false
        } else {
            entry.is_processing_step = true;
            true
        }
    }

    fn release_guard(&self, user_id: i64) {
        if let Some(mut entry) = self.inner.get_mut(&user_id) {
            entry.is_processing_step = false;
        }
    }

    fn user_ids(&self) -> Vec<i64> {
        self.inner.iter().map(|e| *e.key()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_is_compare_and_set() {
        let store = InMemorySessionStore::new();
        assert!(store.set_guard(1), "first acquisition wins");
        assert!(!store.set_guard(1), "second acquisition must fail");
        store.release_guard(1);
        assert!(store.set_guard(1), "reacquire after release");
    }

    #[test]
    fn guard_is_per_user() {
        let store = InMemorySessionStore::new();
        assert!(store.set_guard(1));
        assert!(store.set_guard(2), "users do not share the guard");
    }

    #[test]
    fn reset_keeps_session_row() {
        let store = InMemorySessionStore::new();
        let mut s = store.get_or_create(9);
        s.current_step_index = 4;
        store.save(s);
        let after = store.reset(9, ResetMode::Abandon);
        assert_eq!(after.current_step_index, 0);
        assert_eq!(store.user_ids(), vec![9]);
    }
}
