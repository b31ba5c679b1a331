//! Implementaciones Postgres (Diesel) de los traits de almacenamiento.
//!
//! Objetivo general del módulo:
//! - Paridad 1:1 con los backends en memoria del core: mismo contrato, mismo
//!   comportamiento observable.
//! - Cada entidad es un documento JSONB autocontenido con upsert por clave
//!   (`process_definitions` por id, `session_states` por user_id,
//!   `answer_records` por (user_id, process_id)); sin joins.
//! - El guard de reentrancia vive en una columna propia y `set_guard` es un
//!   UPDATE condicional de una sola sentencia: el compare-and-set lo arbitra
//!   Postgres, no un read-then-write del cliente.
//! - Errores transitorios (pool, deadlock, serialización) se reintentan con
//!   backoff corto; los traits del core son infalibles, así que una falla
//!   permanente se loguea y degrada (lectura → valor nuevo, escritura →
//!   no-op) en lugar de tumbar la tarea del usuario.

use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use log::{error, warn};
use serde_json::Value;
use uuid::Uuid;

use convo_core::store::{AnswerStore, ProcessRepository, SessionStore};
use convo_domain::{AnswerRecord, ProcessDefinition, ResetMode, SessionState};

use crate::config::DbConfig;
use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::schema::{answer_records, process_definitions, session_states};

/// Alias del pool r2d2 de conexiones Postgres.
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones (inyectable en tests).
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError>;
}

/// Provider respaldado por un `PgPool`.
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Pool de desarrollo desde `.env`; corre las migraciones pendientes una vez.
pub fn build_dev_pool_from_env() -> Result<PgPool, PersistenceError> {
    let cfg = DbConfig::from_env()?;
    let manager = ConnectionManager::<PgConnection>::new(cfg.url);
    let pool = r2d2::Pool::builder().min_idle(Some(cfg.min_connections))
                                    .max_size(cfg.max_connections)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    let mut conn = pool.get()
                       .map_err(|e| PersistenceError::TransientIo(format!("pool get: {e}")))?;
    run_pending_migrations(&mut conn)?;
    Ok(pool)
}

fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::SerializationConflict => true,
        PersistenceError::TransientIo(_) => true,
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("deadlock detected") || m.contains("connection closed") || m.contains("connection refused")
            || m.contains("timeout")
        }
        _ => false,
    }
}

/// Retry con backoff pequeño (hasta 3 intentos: 15ms, 30ms, 45ms).
fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms", attempts + 1, e, delay_ms);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

#[derive(Queryable, Debug)]
pub struct SessionRow {
    pub user_id: i64,
    pub is_processing_step: bool,
    pub doc: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = session_states)]
pub struct NewSessionRow<'a> {
    pub user_id: i64,
    pub is_processing_step: bool,
    pub doc: &'a Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Debug)]
pub struct ProcessRow {
    pub id: Uuid,
    pub title: String,
    pub published: bool,
    pub doc: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = process_definitions)]
pub struct NewProcessRow<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub published: bool,
    pub doc: &'a Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Debug)]
pub struct AnswerRow {
    pub user_id: i64,
    pub process_id: Uuid,
    pub doc: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = answer_records)]
pub struct NewAnswerRow<'a> {
    pub user_id: i64,
    pub process_id: Uuid,
    pub doc: &'a Value,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Sesiones
// ---------------------------------------------------------------------------

pub struct PgSessionStore<C: ConnectionProvider> {
    provider: C,
}

impl<C: ConnectionProvider> PgSessionStore<C> {
    pub fn new(provider: C) -> Self {
        Self { provider }
    }

    /// Inserta la fila default si no existe (creación perezosa).
    fn ensure_row(conn: &mut PgConnection, user_id: i64) -> Result<(), PersistenceError> {
        let fresh = SessionState::new(user_id);
        let doc = serde_json::to_value(&fresh)?;
        diesel::insert_into(session_states::table).values(NewSessionRow { user_id,
                                                                          is_processing_step: false,
                                                                          doc: &doc,
                                                                          updated_at: Utc::now() })
                                                  .on_conflict(session_states::user_id)
                                                  .do_nothing()
                                                  .execute(conn)?;
        Ok(())
    }

    fn row_to_state(row: SessionRow) -> Result<SessionState, PersistenceError> {
        let mut state: SessionState = serde_json::from_value(row.doc)?;
        // la columna es la verdad para el guard (la escribe el CAS)
        state.is_processing_step = row.is_processing_step;
        Ok(state)
    }

    pub fn try_get_or_create(&self, user_id: i64) -> Result<SessionState, PersistenceError> {
        let mut conn = self.provider.connection()?;
        conn.build_transaction().read_write().run(|conn| {
            Self::ensure_row(conn, user_id)?;
            let row: SessionRow = session_states::table.filter(session_states::user_id.eq(user_id))
                                                       .first(conn)?;
            Self::row_to_state(row)
        })
    }

    pub fn try_save(&self, session: &SessionState) -> Result<(), PersistenceError> {
        let doc = serde_json::to_value(session)?;
        let mut conn = self.provider.connection()?;
        diesel::insert_into(session_states::table).values(NewSessionRow { user_id: session.user_id,
                                                                          is_processing_step: session.is_processing_step,
                                                                          doc: &doc,
                                                                          updated_at: Utc::now() })
                                                  .on_conflict(session_states::user_id)
                                                  .do_update()
                                                  .set((session_states::is_processing_step.eq(session.is_processing_step),
                                                        session_states::doc.eq(&doc),
                                                        session_states::updated_at.eq(Utc::now())))
                                                  .execute(&mut conn)?;
        Ok(())
    }

    pub fn try_reset(&self, user_id: i64, mode: ResetMode) -> Result<SessionState, PersistenceError> {
        let mut conn = self.provider.connection()?;
        conn.build_transaction().read_write().run(|conn| {
            Self::ensure_row(conn, user_id)?;
            let row: SessionRow = session_states::table.filter(session_states::user_id.eq(user_id))
                                                       .first(conn)?;
            let mut state = Self::row_to_state(row)?;
            state.reset(mode);
            let doc = serde_json::to_value(&state)?;
            diesel::update(session_states::table.filter(session_states::user_id.eq(user_id)))
                .set((session_states::is_processing_step.eq(false),
                      session_states::doc.eq(&doc),
                      session_states::updated_at.eq(Utc::now())))
                .execute(conn)?;
            Ok(state)
        })
    }

    pub fn try_set_guard(&self, user_id: i64) -> Result<bool, PersistenceError> {
        let mut conn = self.provider.connection()?;
        conn.build_transaction().read_write().run(|conn| {
            Self::ensure_row(conn, user_id)?;
            // CAS: sólo gana si el flag estaba en false
            let n = diesel::update(session_states::table.filter(session_states::user_id.eq(user_id))
                                                        .filter(session_states::is_processing_step.eq(false)))
                .set((session_states::is_processing_step.eq(true),
                      session_states::updated_at.eq(Utc::now())))
                .execute(conn)?;
            Ok(n == 1)
        })
    }

    pub fn try_release_guard(&self, user_id: i64) -> Result<(), PersistenceError> {
        let mut conn = self.provider.connection()?;
        diesel::update(session_states::table.filter(session_states::user_id.eq(user_id)))
            .set((session_states::is_processing_step.eq(false),
                  session_states::updated_at.eq(Utc::now())))
            .execute(&mut conn)?;
        Ok(())
    }

    pub fn try_user_ids(&self) -> Result<Vec<i64>, PersistenceError> {
        let mut conn = self.provider.connection()?;
        let ids = session_states::table.select(session_states::user_id)
                                       .load::<i64>(&mut conn)?;
        Ok(ids)
    }
}

impl<C: ConnectionProvider> SessionStore for PgSessionStore<C> {
    fn get_or_create(&self, user_id: i64) -> SessionState {
        match with_retry(|| self.try_get_or_create(user_id)) {
            Ok(s) => s,
            Err(e) => {
                error!("session load failed for user {user_id}: {e}");
                SessionState::new(user_id)
            }
        }
    }

    fn save(&self, session: SessionState) {
        if let Err(e) = with_retry(|| self.try_save(&session)) {
            error!("session save failed for user {}: {e}", session.user_id);
        }
    }

    fn reset(&self, user_id: i64, mode: ResetMode) -> SessionState {
        match with_retry(|| self.try_reset(user_id, mode)) {
            Ok(s) => s,
            Err(e) => {
                error!("session reset failed for user {user_id}: {e}");
                let mut s = SessionState::new(user_id);
                s.reset(mode);
                s
            }
        }
    }

    fn set_guard(&self, user_id: i64) -> bool {
        match with_retry(|| self.try_set_guard(user_id)) {
            Ok(won) => won,
            Err(e) => {
                // ante la duda se niega la transición: preferible un retry
                // del usuario a un doble avance
                error!("guard CAS failed for user {user_id}: {e}");
                false
            }
        }
    }

    fn release_guard(&self, user_id: i64) {
        if let Err(e) = with_retry(|| self.try_release_guard(user_id)) {
            error!("guard release failed for user {user_id}: {e}");
        }
    }

    fn user_ids(&self) -> Vec<i64> {
        match with_retry(|| self.try_user_ids()) {
            Ok(ids) => ids,
            Err(e) => {
                error!("session listing failed: {e}");
                Vec::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Respuestas
// ---------------------------------------------------------------------------

pub struct PgAnswerStore<C: ConnectionProvider> {
    provider: C,
}

impl<C: ConnectionProvider> PgAnswerStore<C> {
    pub fn new(provider: C) -> Self {
        Self { provider }
    }

    pub fn try_load(&self, user_id: i64, process_id: Uuid) -> Result<Option<AnswerRecord>, PersistenceError> {
        let mut conn = self.provider.connection()?;
        let row: Option<AnswerRow> = answer_records::table.filter(answer_records::user_id.eq(user_id))
                                                          .filter(answer_records::process_id.eq(process_id))
                                                          .first(&mut conn)
                                                          .optional()?;
        match row {
            Some(r) => Ok(Some(serde_json::from_value(r.doc)?)),
            None => Ok(None),
        }
    }

    pub fn try_save(&self, record: &AnswerRecord) -> Result<(), PersistenceError> {
        let doc = serde_json::to_value(record)?;
        let mut conn = self.provider.connection()?;
        diesel::insert_into(answer_records::table).values(NewAnswerRow { user_id: record.user_id,
                                                                         process_id: record.process_id,
                                                                         doc: &doc,
                                                                         updated_at: Utc::now() })
                                                  .on_conflict((answer_records::user_id, answer_records::process_id))
                                                  .do_update()
                                                  .set((answer_records::doc.eq(&doc),
                                                        answer_records::updated_at.eq(Utc::now())))
                                                  .execute(&mut conn)?;
        Ok(())
    }

    pub fn try_discard(&self, user_id: i64, process_id: Uuid) -> Result<(), PersistenceError> {
        let mut conn = self.provider.connection()?;
        diesel::delete(answer_records::table.filter(answer_records::user_id.eq(user_id))
                                            .filter(answer_records::process_id.eq(process_id)))
            .execute(&mut conn)?;
        Ok(())
    }

    pub fn try_discard_for_process(&self, process_id: Uuid) -> Result<usize, PersistenceError> {
        let mut conn = self.provider.connection()?;
        let n = diesel::delete(answer_records::table.filter(answer_records::process_id.eq(process_id)))
            .execute(&mut conn)?;
        Ok(n)
    }
}

impl<C: ConnectionProvider> AnswerStore for PgAnswerStore<C> {
    fn load(&self, user_id: i64, process_id: Uuid) -> Option<AnswerRecord> {
        match with_retry(|| self.try_load(user_id, process_id)) {
            Ok(r) => r,
            Err(e) => {
                error!("answer load failed for ({user_id}, {process_id}): {e}");
                None
            }
        }
    }

    fn save(&self, record: AnswerRecord) {
        if let Err(e) = with_retry(|| self.try_save(&record)) {
            error!("answer save failed for ({}, {}): {e}", record.user_id, record.process_id);
        }
    }

    fn discard(&self, user_id: i64, process_id: Uuid) {
        if let Err(e) = with_retry(|| self.try_discard(user_id, process_id)) {
            error!("answer discard failed for ({user_id}, {process_id}): {e}");
        }
    }

    fn discard_for_process(&self, process_id: Uuid) -> usize {
        match with_retry(|| self.try_discard_for_process(process_id)) {
            Ok(n) => n,
            Err(e) => {
                error!("answer discard failed for process {process_id}: {e}");
                0
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Definiciones de proceso
// ---------------------------------------------------------------------------

pub struct PgProcessRepository<C: ConnectionProvider> {
    provider: C,
}

impl<C: ConnectionProvider> PgProcessRepository<C> {
    pub fn new(provider: C) -> Self {
        Self { provider }
    }

    pub fn try_get(&self, id: Uuid) -> Result<Option<ProcessDefinition>, PersistenceError> {
        let mut conn = self.provider.connection()?;
        let row: Option<ProcessRow> = process_definitions::table.filter(process_definitions::id.eq(id))
                                                                .first(&mut conn)
                                                                .optional()?;
        match row {
            Some(r) => Ok(Some(serde_json::from_value(r.doc)?)),
            None => Ok(None),
        }
    }

    pub fn try_save(&self, process: &ProcessDefinition) -> Result<(), PersistenceError> {
        let doc = serde_json::to_value(process)?;
        let mut conn = self.provider.connection()?;
        diesel::insert_into(process_definitions::table)
            .values(NewProcessRow { id: process.id,
                                    title: &process.title,
                                    published: process.published,
                                    doc: &doc,
                                    updated_at: Utc::now() })
            .on_conflict(process_definitions::id)
            .do_update()
            .set((process_definitions::title.eq(&process.title),
                  process_definitions::published.eq(process.published),
                  process_definitions::doc.eq(&doc),
                  process_definitions::updated_at.eq(Utc::now())))
            .execute(&mut conn)?;
        Ok(())
    }

    pub fn try_list_published(&self) -> Result<Vec<ProcessDefinition>, PersistenceError> {
        let mut conn = self.provider.connection()?;
        let rows: Vec<ProcessRow> = process_definitions::table.filter(process_definitions::published.eq(true))
                                                              .order(process_definitions::title.asc())
                                                              .load(&mut conn)?;
        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            match serde_json::from_value(r.doc) {
                Ok(p) => out.push(p),
                Err(e) => warn!("skipping corrupt process document {}: {e}", r.id),
            }
        }
        Ok(out)
    }
}

impl<C: ConnectionProvider> ProcessRepository for PgProcessRepository<C> {
    fn get(&self, id: Uuid) -> Option<ProcessDefinition> {
        match with_retry(|| self.try_get(id)) {
            Ok(p) => p,
            Err(e) => {
                error!("process load failed for {id}: {e}");
                None
            }
        }
    }

    fn save(&self, process: ProcessDefinition) {
        if let Err(e) = with_retry(|| self.try_save(&process)) {
            error!("process save failed for {}: {e}", process.id);
        }
    }

    fn list_published(&self) -> Vec<ProcessDefinition> {
        match with_retry(|| self.try_list_published()) {
            Ok(list) => list,
            Err(e) => {
                error!("process listing failed: {e}");
                Vec::new()
            }
        }
    }
}
