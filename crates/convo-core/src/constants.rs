//! Constantes del motor: versión, callbacks de botones y defaults.

/// Versión lógica del motor (entra en el hash de definición).
pub const ENGINE_VERSION: &str = "convoflow-core/0.1";

// Datos de callback de los botones estándar. El transporte los devuelve
// tal cual en `ChatEventKind::Button`.
pub const CB_YES: &str = "yes";
pub const CB_NO: &str = "no";
pub const CB_CONFIRM: &str = "confirm";
pub const CB_NEXT: &str = "next";
pub const CB_PREV: &str = "prev";
pub const CB_DONE: &str = "done";
pub const CB_FINISH: &str = "finish";
/// Prefijo de toggles de `Choice`: `opt:<índice de opción>`.
pub const CB_OPT_PREFIX: &str = "opt:";

/// Valores persistidos por pasos `YesNo`.
pub const ANSWER_YES: &str = "Yes";
pub const ANSWER_NO: &str = "No";

/// Separador del valor conjunto de una selección múltiple.
pub const CHOICE_JOIN: &str = "; ";

/// Preguntas a generar cuando `metadata.num_questions` no viene.
pub const DEFAULT_NUM_QUESTIONS: u32 = 3;

/// TTL de inactividad para sesiones con captura armada (sin política en el
/// sistema de referencia; aquí es explícito y configurable).
pub const DEFAULT_IDLE_TTL_SECS: i64 = 86_400;
pub const IDLE_TTL_ENV: &str = "CONVO_IDLE_TTL_SECS";
