//! Router de capturas: una suscripción one-shot por usuario.
//!
//! Reemplaza el patrón de listeners globales con filtro interno: acá cada
//! usuario tiene a lo sumo una `PendingCapture`, y un evento entrante sólo
//! se consume si su `user_id` coincide y su tipo es aceptable para esa
//! captura. El desarme ocurre ANTES de procesar (remove atómico de
//! `DashMap`), así una entrega duplicada no puede disparar dos veces.
//!
//! Ciclo de vida explícito: armar una captura nueva reemplaza (desarma) la
//! anterior del usuario; reset/abandono desarma. No quedan listeners
//! huérfanos apuntando a pasos viejos.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::constants::{CB_CONFIRM, CB_DONE, CB_NEXT, CB_NO, CB_OPT_PREFIX, CB_PREV, CB_YES};
use crate::event::{ChatEvent, ChatEventKind};

/// Forma del listener armado; decide qué clase de evento lo consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    /// Próximo texto libre del usuario.
    Text,
    /// Botones Sí/No.
    YesNo,
    /// Toggles de opción + botón Listo.
    Choice,
    /// Próximo adjunto de archivo.
    File,
    /// Botón Confirmar del paso Final.
    Confirm,
    /// Botones Siguiente/Anterior de un paso Info.
    InfoNav,
}

impl CaptureKind {
    /// ¿Este evento puede consumir la captura? El payload cuenta: un botón
    /// viejo de otro paso no debe desarmar la captura vigente.
    pub fn accepts(&self, kind: &ChatEventKind) -> bool {
        match (self, kind) {
            (CaptureKind::Text, ChatEventKind::Text(_)) => true,
            (CaptureKind::File, ChatEventKind::File(_)) => true,
            (CaptureKind::YesNo, ChatEventKind::Button(d)) => d == CB_YES || d == CB_NO,
            (CaptureKind::Choice, ChatEventKind::Button(d)) => d == CB_DONE || d.starts_with(CB_OPT_PREFIX),
            (CaptureKind::Confirm, ChatEventKind::Button(d)) => d == CB_CONFIRM,
            (CaptureKind::InfoNav, ChatEventKind::Button(d)) => d == CB_NEXT || d == CB_PREV,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PendingCapture {
    pub process_id: Uuid,
    pub step_index: usize,
    pub kind: CaptureKind,
    pub armed_at: DateTime<Utc>,
}

impl PendingCapture {
    pub fn new(process_id: Uuid, step_index: usize, kind: CaptureKind) -> Self {
        Self { process_id,
               step_index,
               kind,
               armed_at: Utc::now() }
    }
}

#[derive(Default)]
pub struct CaptureRouter {
    pending: DashMap<i64, PendingCapture>,
}

impl CaptureRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arma la captura del usuario, reemplazando cualquier anterior.
    pub fn arm(&self, user_id: i64, capture: PendingCapture) {
        self.pending.insert(user_id, capture);
    }

    /// Desarme explícito (navegar a otra acción, abandono, TTL).
    pub fn disarm(&self, user_id: i64) -> Option<PendingCapture> {
        self.pending.remove(&user_id).map(|(_, c)| c)
    }

    pub fn has_pending(&self, user_id: i64) -> bool {
        self.pending.contains_key(&user_id)
    }

    pub fn peek(&self, user_id: i64) -> Option<PendingCapture> {
        self.pending.get(&user_id).map(|c| c.value().clone())
    }

    /// Consume la captura si el evento la satisface. El remove condicional
    /// es atómico: de dos eventos duplicados, exactamente uno la obtiene.
    pub fn take_matching(&self, event: &ChatEvent) -> Option<PendingCapture> {
        self.pending
            .remove_if(&event.user_id, |_, cap| cap.kind.accepts(&event.kind))
            .map(|(_, c)| c)
    }
}
