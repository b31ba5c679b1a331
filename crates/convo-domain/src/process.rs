//! `ProcessDefinition`: secuencia ordenada y nombrada de steps.
//!
//! Invariante de numeración: tras cualquier operación estructural,
//! `steps[i].sequence_number == i + 1` para todo `i`. Toda mutación pasa por
//! los métodos de este tipo, que re-derivan la numeración antes de devolver
//! el control; el documento completo se persiste luego vía
//! `ProcessRepository` (los steps no son direccionables por separado en la
//! capa de almacenamiento).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;
use crate::step::Step;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDefinition {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub created_by: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl ProcessDefinition {
    pub fn new(title: impl Into<String>,
               description: impl Into<String>,
               created_by: impl Into<String>)
               -> Result<Self, DomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::EmptyTitle);
        }
        Ok(Self { id: Uuid::new_v4(),
                  title,
                  description: description.into(),
                  image_url: None,
                  category: None,
                  created_by: created_by.into(),
                  published: false,
                  steps: Vec::new() })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Acceso posicional con error de dominio (no panic).
    pub fn get_step(&self, index: usize) -> Result<&Step, DomainError> {
        self.steps.get(index).ok_or(DomainError::StepIndexOutOfRange(index))
    }

    /// Busca un step por su identificador estable; devuelve posición y step.
    pub fn step_by_id(&self, step_id: Uuid) -> Result<(usize, &Step), DomainError> {
        self.steps
            .iter()
            .position(|s| s.step_id == step_id)
            .map(|i| (i, &self.steps[i]))
            .ok_or(DomainError::StepNotFound(step_id))
    }

    /// Inserta en `position` (0..=len) desplazando el resto.
    pub fn insert_step(&mut self, position: usize, step: Step) -> Result<(), DomainError> {
        if position > self.steps.len() {
            return Err(DomainError::InsertPositionOutOfRange(position));
        }
        self.steps.insert(position, step);
        self.resequence();
        Ok(())
    }

    /// Agrega al final.
    pub fn push_step(&mut self, step: Step) {
        self.steps.push(step);
        self.resequence();
    }

    /// Mueve el step en `from` a la posición `to` (ambas dentro de rango).
    pub fn move_step(&mut self, from: usize, to: usize) -> Result<(), DomainError> {
        if from >= self.steps.len() {
            return Err(DomainError::StepIndexOutOfRange(from));
        }
        if to >= self.steps.len() {
            return Err(DomainError::StepIndexOutOfRange(to));
        }
        let step = self.steps.remove(from);
        self.steps.insert(to, step);
        self.resequence();
        Ok(())
    }

    /// Intercambia dos steps adyacentes (soporte de move-up/move-down).
    pub fn swap_steps(&mut self, a: usize, b: usize) -> Result<(), DomainError> {
        if a >= self.steps.len() {
            return Err(DomainError::StepIndexOutOfRange(a));
        }
        if b >= self.steps.len() {
            return Err(DomainError::StepIndexOutOfRange(b));
        }
        self.steps.swap(a, b);
        self.resequence();
        Ok(())
    }

    pub fn delete_step(&mut self, index: usize) -> Result<Step, DomainError> {
        if index >= self.steps.len() {
            return Err(DomainError::StepIndexOutOfRange(index));
        }
        let removed = self.steps.remove(index);
        self.resequence();
        Ok(removed)
    }

    /// Reemplazo completo de la secuencia (regeneración).
    pub fn replace_steps(&mut self, steps: Vec<Step>) {
        self.steps = steps;
        self.resequence();
    }

    /// Re-deriva `sequence_number = posición + 1` para toda la secuencia.
    fn resequence(&mut self) {
        for (i, step) in self.steps.iter_mut().enumerate() {
            step.sequence_number = (i + 1) as u32;
        }
    }

    /// Verificación del invariante de numeración (útil en asserts de tests).
    pub fn sequence_is_contiguous(&self) -> bool {
        self.steps
            .iter()
            .enumerate()
            .all(|(i, s)| s.sequence_number == (i + 1) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepType;

    fn process_with(n: usize) -> ProcessDefinition {
        let mut p = ProcessDefinition::new("T", "", "author").unwrap();
        for i in 0..n {
            p.push_step(Step::new(StepType::TextInput, format!("q{i}")).unwrap());
        }
        p
    }

    #[test]
    fn push_assigns_contiguous_sequence() {
        let p = process_with(4);
        assert!(p.sequence_is_contiguous());
        assert_eq!(p.steps[3].sequence_number, 4);
    }

    #[test]
    fn insert_resequences_whole_array() {
        let mut p = process_with(3);
        let s = Step::new(StepType::YesNo, "mid").unwrap();
        p.insert_step(1, s).unwrap();
        assert_eq!(p.len(), 4);
        assert!(p.sequence_is_contiguous());
        assert_eq!(p.steps[1].prompt, "mid");
    }

    #[test]
    fn insert_past_end_is_rejected() {
        let mut p = process_with(2);
        let s = Step::new(StepType::YesNo, "x").unwrap();
        let err = p.insert_step(5, s).unwrap_err();
        assert_eq!(err, DomainError::InsertPositionOutOfRange(5));
        assert_eq!(p.len(), 2, "failed insert must not mutate");
    }

    #[test]
    fn move_step_keeps_invariant() {
        let mut p = process_with(4);
        let moved_id = p.steps[2].step_id;
        p.move_step(2, 0).unwrap();
        assert_eq!(p.steps[0].step_id, moved_id);
        assert!(p.sequence_is_contiguous());
    }

    #[test]
    fn swap_adjacent_keeps_invariant() {
        let mut p = process_with(4);
        let (a, b) = (p.steps[1].step_id, p.steps[2].step_id);
        p.swap_steps(1, 2).unwrap();
        assert_eq!(p.steps[1].step_id, b);
        assert_eq!(p.steps[2].step_id, a);
        assert!(p.sequence_is_contiguous());
    }

    #[test]
    fn delete_resequences() {
        let mut p = process_with(3);
        p.delete_step(0).unwrap();
        assert_eq!(p.len(), 2);
        assert!(p.sequence_is_contiguous());
        assert_eq!(p.steps[0].sequence_number, 1);
    }

    #[test]
    fn replace_steps_resequences() {
        let mut p = process_with(5);
        p.replace_steps(vec![Step::new(StepType::Final, "end").unwrap()]);
        assert_eq!(p.len(), 1);
        assert_eq!(p.steps[0].sequence_number, 1);
    }

    #[test]
    fn get_step_out_of_range() {
        let p = process_with(1);
        assert_eq!(p.get_step(1).unwrap_err(), DomainError::StepIndexOutOfRange(1));
    }

    #[test]
    fn step_by_id_finds_position() {
        let p = process_with(3);
        let id = p.steps[2].step_id;
        let (i, s) = p.step_by_id(id).unwrap();
        assert_eq!(i, 2);
        assert_eq!(s.step_id, id);
    }
}
