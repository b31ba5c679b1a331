//! convo-persistence
//!
//! Implementaciones Postgres (Diesel + r2d2) de los tres stores del core,
//! con paridad de comportamiento respecto de los backends en memoria:
//! - Documentos JSONB autocontenidos, upsert por clave, sin joins.
//! - `set_guard` como UPDATE condicional de una sola sentencia (el
//!   compare-and-set que exige el Navigator).
//! - Reintento con backoff corto ante errores transitorios.
//!
//! Módulos:
//! - `pg`: stores sobre Postgres.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel declaradas para compilar queries.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_dev_pool_from_env, ConnectionProvider, PgAnswerStore, PgPool, PgProcessRepository,
             PgSessionStore, PoolProvider};
