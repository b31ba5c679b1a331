//! Errores del dominio (estructurales, no de orquestación).

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum DomainError {
    #[error("step index {0} out of range")] StepIndexOutOfRange(usize),
    #[error("insert position {0} out of range")] InsertPositionOutOfRange(usize),
    #[error("step {0} not found in process")] StepNotFound(uuid::Uuid),
    #[error("process title must not be empty")] EmptyTitle,
    #[error("step prompt must not be empty")] EmptyPrompt,
}
