//! Canal de pares emaranhados entre dois ranks
//!
//! `create_keep` fabrica um par |Φ+⟩ novo no simulador compartilhado,
//! fica com uma metade e despacha o id da outra para o peer;
//! `recv_keep` bloqueia até a metade correspondente chegar. Cada metade
//! serve a exatamente uma transmissão — sem replay.

use std::sync::mpsc::{Receiver, Sender};

use crate::connection::{QuantumConnection, Qubit};
use crate::error::{CoreError, CoreResult};

/// Canal EPR de um rank para um peer fixo
#[derive(Debug)]
pub struct EprSocket {
    conn: QuantumConnection,
    tx: Sender<u64>,
    rx: Receiver<u64>,
    peer: usize,
}

impl EprSocket {
    pub(crate) fn new(
        conn: QuantumConnection,
        tx: Sender<u64>,
        rx: Receiver<u64>,
        peer: usize,
    ) -> Self {
        Self { conn, tx, rx, peer }
    }

    /// Rank do outro lado do canal
    pub fn peer(&self) -> usize {
        self.peer
    }

    /// Gera um par emaranhado novo e retorna a metade local
    ///
    /// A preparação do par acontece direto no simulador: o par nasce
    /// pronto, independente da fila de operações do rank, exatamente
    /// como um gerador de emaranhamento externo.
    pub fn create_keep(&self) -> CoreResult<Qubit> {
        let (kept, sent) = {
            let mut sim = self.conn.lock_sim()?;
            let a = sim.alloc();
            let b = sim.alloc();
            sim.h(a)?;
            sim.cnot(a, b)?;
            (a, b)
        };
        self.tx
            .send(sent)
            .map_err(|_| CoreError::ChannelClosed(format!("epr channel to rank {}", self.peer)))?;
        Ok(Qubit::from_id(kept, &self.conn))
    }

    /// Recebe a metade de um par criado pelo peer (bloqueante)
    pub fn recv_keep(&self) -> CoreResult<Qubit> {
        let id = self
            .rx
            .recv()
            .map_err(|_| CoreError::ChannelClosed(format!("epr channel from rank {}", self.peer)))?;
        Ok(Qubit::from_id(id, &self.conn))
    }
}
