//! Carga de configuración de conexión desde variables de entorno.
//! Usa convención `DATABASE_URL` y parámetros opcionales de pool.

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl DbConfig {
    /// Lee `DATABASE_URL` (requerido) y los límites de pool opcionales.
    pub fn from_env() -> Result<Self, crate::error::PersistenceError> {
        Lazy::force(&DOTENV_LOADED);
        let url = env::var("DATABASE_URL")
            .map_err(|_| crate::error::PersistenceError::Config("DATABASE_URL not set".to_string()))?;
        let min_connections = env::var("DATABASE_MIN_CONNECTIONS").ok()
                                                                  .and_then(|v| v.parse().ok())
                                                                  .unwrap_or(2);
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS").ok()
                                                                  .and_then(|v| v.parse().ok())
                                                                  .unwrap_or(16);
        Ok(Self { url,
                  min_connections,
                  max_connections })
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
