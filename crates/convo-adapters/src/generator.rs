//! Generación de pasos/preguntas por plantilla determinista.
//!
//! Stand-in del colaborador de IA: misma entrada → misma salida, sin red.
//! La secuencia generada cubre las variantes que un proceso autoría
//! normalmente usa (intro, texto, sí/no, cierre), de modo que
//! `regenerate_with_ai` produce definiciones navegables de verdad.

use async_trait::async_trait;
use convo_core::errors::EngineError;
use convo_core::providers::StepGenerator;
use convo_domain::{ConversationTurn, Step, StepType};

#[derive(Default)]
pub struct TemplateStepGenerator;

impl TemplateStepGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StepGenerator for TemplateStepGenerator {
    async fn generate_steps(&self, title: &str, description: &str) -> Result<Vec<Step>, EngineError> {
        let intro = Step::new(StepType::Info, format!("Welcome to \"{title}\""))?.with_description(description.to_string());
        let opening = Step::new(StepType::TextInput, format!("Tell us what you expect from \"{title}\""))?;
        let commitment = Step::new(StepType::YesNo, "Would you like a follow-up when this is reviewed?")?;
        let closing = Step::new(StepType::Final, "That is everything. Confirm to submit your answers.")?;
        Ok(vec![intro, opening, commitment, closing])
    }

    async fn generate_questions(&self, context: &[ConversationTurn], n: u32) -> Result<Vec<String>, EngineError> {
        // ancla el tema en el último turno del historial
        let topic = context.last()
                           .map(|t| t.content.clone())
                           .unwrap_or_else(|| "this process".to_string());
        let out = (1..=n).map(|i| format!("Follow-up {i}: could you expand on \"{topic}\"?"))
                         .collect();
        Ok(out)
    }
}

/// Siempre falla con `ExternalService` (tests de la política de errores).
#[derive(Default)]
pub struct FailingStepGenerator;

#[async_trait]
impl StepGenerator for FailingStepGenerator {
    async fn generate_steps(&self, _title: &str, _description: &str) -> Result<Vec<Step>, EngineError> {
        Err(EngineError::ExternalService("generation service unavailable".to_string()))
    }

    async fn generate_questions(&self, _context: &[ConversationTurn], _n: u32) -> Result<Vec<String>, EngineError> {
        Err(EngineError::ExternalService("generation service unavailable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generated_sequence_is_navigable() {
        let g = TemplateStepGenerator::new();
        let steps = g.generate_steps("Onboarding", "New hires").await.unwrap();
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0].step_type, StepType::Info);
        assert_eq!(steps[3].step_type, StepType::Final);
    }

    #[tokio::test]
    async fn questions_are_deterministic() {
        let g = TemplateStepGenerator::new();
        let ctx = vec![ConversationTurn { role: "user".into(),
                                          content: "budget".into() }];
        let a = g.generate_questions(&ctx, 2).await.unwrap();
        let b = g.generate_questions(&ctx, 2).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert!(a[0].contains("budget"));
    }
}
