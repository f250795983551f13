//! Registro de canais por rank
//!
//! Cada rank mantém dois mapas chaveados pelo rank do peer: canal EPR e
//! canal clássico. A primeira chamada para um peer aloca os dois de uma
//! vez; chamadas seguintes devolvem as mesmas instâncias. Não há
//! remoção — os canais vivem enquanto o comunicador viver, e nenhum
//! estado é compartilhado entre registros de ranks diferentes.

use std::collections::HashMap;
use std::sync::Arc;

use qmpi_core::{EprSocket, QuantumConnection, QuantumNetwork, Socket};

use crate::error::{CommError, CommResult};

/// Registro de canais EPR e clássicos de um rank
#[derive(Debug)]
pub struct ChannelRegistry {
    rank: usize,
    network: Arc<QuantumNetwork>,
    conn: QuantumConnection,
    epr: HashMap<usize, EprSocket>,
    classical: HashMap<usize, Socket>,
}

impl ChannelRegistry {
    /// Cria registro vazio para o rank dado
    pub fn new(rank: usize, network: Arc<QuantumNetwork>, conn: QuantumConnection) -> Self {
        Self {
            rank,
            network,
            conn,
            epr: HashMap::new(),
            classical: HashMap::new(),
        }
    }

    /// Garante que ambos os canais para `other_rank` existem
    pub fn ensure_open(&mut self, other_rank: usize) -> CommResult<()> {
        if self.epr.contains_key(&other_rank) {
            return Ok(());
        }
        let (epr, socket) = self.network.open_pair(self.rank, other_rank, &self.conn)?;
        self.epr.insert(other_rank, epr);
        self.classical.insert(other_rank, socket);
        Ok(())
    }

    /// Par (EPR, clássico) para o peer, criando na primeira chamada
    pub fn channels(&mut self, other_rank: usize) -> CommResult<(&EprSocket, &Socket)> {
        self.ensure_open(other_rank)?;
        match (self.epr.get(&other_rank), self.classical.get(&other_rank)) {
            (Some(epr), Some(socket)) => Ok((epr, socket)),
            _ => Err(CommError::ChannelNotOpen(other_rank)),
        }
    }

    /// Canal EPR já aberto para o peer
    pub fn epr(&self, other_rank: usize) -> CommResult<&EprSocket> {
        self.epr
            .get(&other_rank)
            .ok_or(CommError::ChannelNotOpen(other_rank))
    }

    /// Canal clássico já aberto para o peer
    pub fn classical(&self, other_rank: usize) -> CommResult<&Socket> {
        self.classical
            .get(&other_rank)
            .ok_or(CommError::ChannelNotOpen(other_rank))
    }

    /// Número de peers com canais abertos
    pub fn open_count(&self) -> usize {
        self.epr.len()
    }
}
