//! Tipos de evento del canal y estructura `ChatEvent`.
//!
//! Rol en el flujo:
//! - El transporte multiplexa muchos usuarios sobre una sola conexión; cada
//!   evento trae su `user_id` y el router lo entrega sólo a la captura
//!   armada de ese usuario.
//! - `OutboundMessage` es el contrato de render: texto plano, imagen
//!   opcional y filas de botones con datos de callback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Referencia opaca a un archivo en el transporte (se resuelve vía
/// `FileRetrieval`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub file_id: String,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatEventKind {
    /// Mensaje de texto libre.
    Text(String),
    /// Click de botón; el payload es el dato de callback.
    Button(String),
    /// Adjunto de archivo.
    File(FileRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    pub user_id: i64,
    pub kind: ChatEventKind,
    pub ts: DateTime<Utc>,
}

impl ChatEvent {
    pub fn text(user_id: i64, text: impl Into<String>) -> Self {
        Self { user_id,
               kind: ChatEventKind::Text(text.into()),
               ts: Utc::now() }
    }

    pub fn button(user_id: i64, data: impl Into<String>) -> Self {
        Self { user_id,
               kind: ChatEventKind::Button(data.into()),
               ts: Utc::now() }
    }

    pub fn file(user_id: i64, file_id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self { user_id,
               kind: ChatEventKind::File(FileRef { file_id: file_id.into(),
                                                   file_name: file_name.into() }),
               ts: Utc::now() }
    }
}

/// Botón inline: etiqueta visible + dato de callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self { label: label.into(),
               data: data.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub text: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Filas de botones (cada fila es un Vec).
    #[serde(default)]
    pub buttons: Vec<Vec<Button>>,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(),
               image_url: None,
               buttons: Vec::new() }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_button_row(mut self, row: Vec<Button>) -> Self {
        self.buttons.push(row);
        self
    }
}

/// Referencia al mensaje entregado por el canal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub message_id: i64,
}
