//! convo-adapters: implementaciones deterministas de los colaboradores.
//!
//! Ningún adapter de este crate toca IO externo: el canal acumula los
//! mensajes en memoria, los archivos se "recuperan" armando rutas locales y
//! la generación de pasos/preguntas es una plantilla estable. Sirven para
//! tests, la CLI y las corridas de validación del binario raíz; el
//! transporte real y el proveedor de IA viven en la aplicación anfitriona.

pub mod channel;
pub mod files;
pub mod generator;

pub use channel::MemoryChatChannel;
pub use files::{FailingFileRetrieval, LocalFileRetrieval};
pub use generator::{FailingStepGenerator, TemplateStepGenerator};
