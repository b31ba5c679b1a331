//! Editor estructural de procesos (rol de autor).
//!
//! Opera fuera de banda respecto de las sesiones vivas: cada operación es
//! una transacción de documento único sobre la `ProcessDefinition` (se
//! muta una copia cargada y se guarda sólo si todo salió bien, sin
//! escrituras parciales). No toca `SessionState`; una sesión a mitad de un
//! proceso editado ve el mismatch vía `definition_hash` (ver core).
//! Política: los autores editan procesos no publicados.

use convo_domain::{ProcessDefinition, Step};
use uuid::Uuid;

use crate::errors::EngineError;
use crate::providers::StepGenerator;
use crate::store::{AnswerStore, ProcessRepository};

/// Actualización parcial de cabecera: sólo los campos presentes cambian.
#[derive(Debug, Clone, Default)]
pub struct HeaderPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

pub struct ProcessEditor<'a, A, P>
    where A: AnswerStore,
          P: ProcessRepository
{
    answers: &'a A,
    processes: &'a P,
    generator: &'a dyn StepGenerator,
}

impl<'a, A, P> ProcessEditor<'a, A, P>
    where A: AnswerStore,
          P: ProcessRepository
{
    pub fn new(answers: &'a A, processes: &'a P, generator: &'a dyn StepGenerator) -> Self {
        Self { answers,
               processes,
               generator }
    }

    fn load(&self, process_id: Uuid) -> Result<ProcessDefinition, EngineError> {
        self.processes
            .get(process_id)
            .ok_or_else(|| EngineError::NotFound(format!("process {process_id}")))
    }

    pub fn edit_header(&self, process_id: Uuid, patch: HeaderPatch) -> Result<ProcessDefinition, EngineError> {
        let mut process = self.load(process_id)?;
        if let Some(title) = patch.title {
            process.title = title;
        }
        if let Some(description) = patch.description {
            process.description = description;
        }
        if let Some(image_url) = patch.image_url {
            process.image_url = Some(image_url);
        }
        self.processes.save(process.clone());
        Ok(process)
    }

    /// Swap adyacente hacia arriba; `Boundary` si ya es el primero.
    pub fn move_step_up(&self, process_id: Uuid, step_id: Uuid) -> Result<ProcessDefinition, EngineError> {
        let mut process = self.load(process_id)?;
        let (index, _) = process.step_by_id(step_id)?;
        if index == 0 {
            return Err(EngineError::Boundary);
        }
        process.swap_steps(index - 1, index)?;
        self.processes.save(process.clone());
        Ok(process)
    }

    /// Swap adyacente hacia abajo; `Boundary` si ya es el último.
    pub fn move_step_down(&self, process_id: Uuid, step_id: Uuid) -> Result<ProcessDefinition, EngineError> {
        let mut process = self.load(process_id)?;
        let (index, _) = process.step_by_id(step_id)?;
        if index + 1 >= process.len() {
            return Err(EngineError::Boundary);
        }
        process.swap_steps(index, index + 1)?;
        self.processes.save(process.clone());
        Ok(process)
    }

    /// Splice antes del ancla. `insert_step` re-deriva la numeración del
    /// arreglo completo; un splice sin resecuenciar dejaría
    /// `sequence_number` desalineado de la posición real.
    pub fn insert_step_before(&self,
                              process_id: Uuid,
                              anchor_index: usize,
                              step: Step)
                              -> Result<ProcessDefinition, EngineError> {
        let mut process = self.load(process_id)?;
        process.get_step(anchor_index)?;
        process.insert_step(anchor_index, step)?;
        self.processes.save(process.clone());
        Ok(process)
    }

    pub fn insert_step_after(&self,
                             process_id: Uuid,
                             anchor_index: usize,
                             step: Step)
                             -> Result<ProcessDefinition, EngineError> {
        let mut process = self.load(process_id)?;
        process.get_step(anchor_index)?;
        process.insert_step(anchor_index + 1, step)?;
        self.processes.save(process.clone());
        Ok(process)
    }

    pub fn delete_step(&self, process_id: Uuid, index: usize) -> Result<ProcessDefinition, EngineError> {
        let mut process = self.load(process_id)?;
        process.delete_step(index)?;
        self.processes.save(process.clone());
        Ok(process)
    }

    /// Reemplazo destructivo de toda la secuencia vía el colaborador de
    /// IA. Sin undo. Los registros de respuesta del proceso quedan
    /// inválidos (índices contra la secuencia vieja) y se descartan
    /// explícitamente, nunca en silencio.
    pub async fn regenerate_with_ai(&self,
                                    process_id: Uuid,
                                    title: &str,
                                    description: &str)
                                    -> Result<ProcessDefinition, EngineError> {
        let mut process = self.load(process_id)?;
        let steps = self.generator.generate_steps(title, description).await?;
        if steps.is_empty() {
            return Err(EngineError::ExternalService("step generator returned an empty sequence".to_string()));
        }
        process.title = title.to_string();
        process.description = description.to_string();
        process.replace_steps(steps);
        self.processes.save(process.clone());

        let discarded = self.answers.discard_for_process(process_id);
        if discarded > 0 {
            log::info!("regeneration of process {process_id} discarded {discarded} answer record(s)");
        }
        Ok(process)
    }
}
