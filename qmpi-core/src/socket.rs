//! Canal clássico ponto-a-ponto — ordenado, confiável, bloqueante
//!
//! Mensagens estruturadas `{tag, payload}` viajam serializadas em JSON;
//! o GHZ usa `send`/`recv` de texto puro para os bits de correção da
//! cadeia.

use std::sync::mpsc::{Receiver, Sender};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Mensagem etiquetada com payload de inteiros pequenos
///
/// Tags usadas pelo protocolo: `"Corrections"` (2 bits), `"Expose"` e
/// `"Unexpose"` (1 bit cada).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredMessage {
    /// Etiqueta da mensagem
    pub tag: String,
    /// Bits/inteiros pequenos transportados
    pub payload: Vec<u8>,
}

impl StructuredMessage {
    /// Cria mensagem com a tag e payload dados
    pub fn new(tag: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            tag: tag.into(),
            payload,
        }
    }
}

/// Canal clássico entre dois ranks
///
/// Criado pela fábrica de rede; cada rank detém exatamente um endpoint
/// por par ordenado, em cache no registro do comunicador.
#[derive(Debug)]
pub struct Socket {
    tx: Sender<String>,
    rx: Receiver<String>,
    peer: usize,
}

impl Socket {
    pub(crate) fn new(tx: Sender<String>, rx: Receiver<String>, peer: usize) -> Self {
        Self { tx, rx, peer }
    }

    /// Rank do outro lado do canal
    pub fn peer(&self) -> usize {
        self.peer
    }

    /// Envia texto puro
    pub fn send(&self, text: &str) -> CoreResult<()> {
        self.tx
            .send(text.to_string())
            .map_err(|_| CoreError::ChannelClosed(format!("classical channel to rank {}", self.peer)))
    }

    /// Recebe texto puro (bloqueante)
    pub fn recv(&self) -> CoreResult<String> {
        self.rx
            .recv()
            .map_err(|_| CoreError::ChannelClosed(format!("classical channel from rank {}", self.peer)))
    }

    /// Envia mensagem estruturada
    pub fn send_structured(&self, msg: &StructuredMessage) -> CoreResult<()> {
        let wire = serde_json::to_string(msg)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        self.send(&wire)
    }

    /// Recebe mensagem estruturada (bloqueante)
    pub fn recv_structured(&self) -> CoreResult<StructuredMessage> {
        let wire = self.recv()?;
        serde_json::from_str(&wire).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    fn linked_pair() -> (Socket, Socket) {
        let (tx_ab, rx_ab) = channel();
        let (tx_ba, rx_ba) = channel();
        (Socket::new(tx_ab, rx_ba, 1), Socket::new(tx_ba, rx_ab, 0))
    }

    #[test]
    fn test_structured_roundtrip() {
        let (a, b) = linked_pair();
        a.send_structured(&StructuredMessage::new("Corrections", vec![1, 0]))
            .unwrap();
        let msg = b.recv_structured().unwrap();
        assert_eq!(msg.tag, "Corrections");
        assert_eq!(msg.payload, vec![1, 0]);
    }

    #[test]
    fn test_messages_keep_order() {
        let (a, b) = linked_pair();
        for bit in [0u8, 1, 1, 0] {
            a.send_structured(&StructuredMessage::new("Expose", vec![bit]))
                .unwrap();
        }
        let received: Vec<u8> = (0..4)
            .map(|_| b.recv_structured().unwrap().payload[0])
            .collect();
        assert_eq!(received, vec![0, 1, 1, 0]);
    }

    #[test]
    fn test_closed_channel_is_fatal() {
        let (a, b) = linked_pair();
        drop(a);
        assert!(matches!(b.recv(), Err(CoreError::ChannelClosed(_))));
    }
}
