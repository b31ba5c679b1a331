//! Recuperación de archivos determinista (sin IO real).

use async_trait::async_trait;
use convo_core::errors::EngineError;
use convo_core::event::FileRef;
use convo_core::providers::{FileRetrieval, RetrievedFile};

/// Resuelve cada `FileRef` a una ruta bajo un directorio base, sin tocar
/// disco. La validación de extensión es del motor, no de este adapter.
pub struct LocalFileRetrieval {
    base_dir: String,
}

impl LocalFileRetrieval {
    pub fn new(base_dir: impl Into<String>) -> Self {
        Self { base_dir: base_dir.into() }
    }
}

#[async_trait]
impl FileRetrieval for LocalFileRetrieval {
    async fn retrieve(&self, file: &FileRef) -> Result<RetrievedFile, EngineError> {
        Ok(RetrievedFile { local_path: format!("{}/{}", self.base_dir, file.file_id),
                           file_name: file.file_name.clone() })
    }
}

/// Siempre falla con `ExternalService`; para probar la política de
/// "sin reintento automático, el usuario reenvía".
#[derive(Default)]
pub struct FailingFileRetrieval;

#[async_trait]
impl FileRetrieval for FailingFileRetrieval {
    async fn retrieve(&self, _file: &FileRef) -> Result<RetrievedFile, EngineError> {
        Err(EngineError::ExternalService("file storage unavailable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn retrieval_builds_local_path() {
        let files = LocalFileRetrieval::new("/tmp/convo");
        let got = files.retrieve(&FileRef { file_id: "abc123".into(),
                                            file_name: "cv.pdf".into() })
                       .await
                       .unwrap();
        assert_eq!(got.local_path, "/tmp/convo/abc123");
        assert_eq!(got.file_name, "cv.pdf");
    }
}
