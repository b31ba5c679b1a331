//! `Step`: una unidad tipada de interacción dentro de un proceso.
//!
//! Rol en el flujo:
//! - El `step_type` decide qué listener de captura arma el dispatcher
//!   (texto libre, botones, archivo, paso automático).
//! - `sequence_number` es 1-based y contiguo; lo re-deriva
//!   `ProcessDefinition` tras cada mutación estructural, nunca el caller.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// Variantes de captura soportadas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepType {
    TextInput,
    YesNo,
    FileUpload,
    Choice,
    GenerateQuestions,
    Final,
    Info,
}

impl StepType {
    /// Los pasos informativos no llevan respuesta asociada.
    pub fn carries_answer(&self) -> bool {
        !matches!(self, StepType::Info)
    }
}

/// Reglas de validación de la respuesta capturada.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepValidation {
    pub required: bool,
    /// Regex aplicada a respuestas de texto (se ignora en otros tipos).
    pub regex: Option<String>,
    /// Extensiones admitidas para `FileUpload`, en minúsculas y sin punto.
    #[serde(default)]
    pub file_types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepMetadata {
    /// Cantidad de preguntas a generar en pasos `GenerateQuestions`.
    pub num_questions: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Identificador estable, único dentro del proceso. Sobrevive a
    /// reordenamientos (a diferencia del índice posicional).
    pub step_id: Uuid,
    /// Posición 1-based. Invariante: `sequence_number == posición + 1`.
    pub sequence_number: u32,
    pub step_type: StepType,
    pub prompt: String,
    #[serde(default)]
    pub description: String,
    /// Opciones de `Choice`; vacío para el resto de tipos.
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub validation: StepValidation,
    #[serde(default)]
    pub metadata: StepMetadata,
}

impl Step {
    /// Crea un step sin posición asignada (`sequence_number = 0`);
    /// `ProcessDefinition` la fija al insertarlo.
    pub fn new(step_type: StepType, prompt: impl Into<String>) -> Result<Self, DomainError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(DomainError::EmptyPrompt);
        }
        Ok(Self { step_id: Uuid::new_v4(),
                  sequence_number: 0,
                  step_type,
                  prompt,
                  description: String::new(),
                  options: Vec::new(),
                  validation: StepValidation::default(),
                  metadata: StepMetadata::default() })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_validation(mut self, validation: StepValidation) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_metadata(mut self, metadata: StepMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_step_rejects_empty_prompt() {
        let r = Step::new(StepType::TextInput, "   ");
        assert_eq!(r.unwrap_err(), DomainError::EmptyPrompt);
    }

    #[test]
    fn info_steps_carry_no_answer() {
        assert!(!StepType::Info.carries_answer());
        assert!(StepType::TextInput.carries_answer());
        assert!(StepType::Final.carries_answer());
    }

    #[test]
    fn builder_helpers_fill_fields() {
        let s = Step::new(StepType::Choice, "Pick some").unwrap()
                                                       .with_options(vec!["a".into(), "b".into()])
                                                       .with_description("desc");
        assert_eq!(s.options.len(), 2);
        assert_eq!(s.description, "desc");
        assert_eq!(s.sequence_number, 0, "position is assigned on insert");
    }
}
