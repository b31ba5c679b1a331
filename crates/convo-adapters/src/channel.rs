//! Canal de chat en memoria: registra todo lo enviado, por usuario.

use std::sync::Mutex;

use async_trait::async_trait;
use convo_core::errors::EngineError;
use convo_core::event::{MessageRef, OutboundMessage};
use convo_core::providers::ChatChannel;

#[derive(Default)]
pub struct MemoryChatChannel {
    sent: Mutex<Vec<(i64, OutboundMessage)>>,
}

impl MemoryChatChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Todo lo enviado, en orden de emisión.
    pub fn outbox(&self) -> Vec<(i64, OutboundMessage)> {
        self.sent.lock().expect("outbox lock").clone()
    }

    /// Mensajes destinados a un usuario puntual.
    pub fn sent_to(&self, user_id: i64) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .expect("outbox lock")
            .iter()
            .filter(|(uid, _)| *uid == user_id)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn last_to(&self, user_id: i64) -> Option<OutboundMessage> {
        self.sent_to(user_id).pop()
    }

    pub fn clear(&self) {
        self.sent.lock().expect("outbox lock").clear();
    }
}

#[async_trait]
impl ChatChannel for MemoryChatChannel {
    async fn send_prompt(&self, user_id: i64, message: OutboundMessage) -> Result<MessageRef, EngineError> {
        let mut sent = self.sent.lock().expect("outbox lock");
        sent.push((user_id, message));
        Ok(MessageRef { message_id: sent.len() as i64 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn outbox_keeps_per_user_order() {
        let ch = MemoryChatChannel::new();
        ch.send_prompt(1, OutboundMessage::text("a")).await.unwrap();
        ch.send_prompt(2, OutboundMessage::text("b")).await.unwrap();
        ch.send_prompt(1, OutboundMessage::text("c")).await.unwrap();
        let to_one = ch.sent_to(1);
        assert_eq!(to_one.len(), 2);
        assert_eq!(to_one[1].text, "c");
        assert_eq!(ch.last_to(2).unwrap().text, "b");
    }
}
