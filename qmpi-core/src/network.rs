//! Fábrica de rede — malha completa de canais entre ranks
//!
//! Uma instância por grupo SPMD, compartilhada entre as threads de
//! rank. Pré-aloca, para cada par ordenado, o canal clássico e o canal
//! de ids de metades EPR; cada rank reivindica seus endpoints uma única
//! vez via `open_pair` (o registro do comunicador faz cache a partir
//! daí).

use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::connection::{AppConfig, QuantumConnection};
use crate::epr::EprSocket;
use crate::error::{CoreError, CoreResult};
use crate::sim::StateVector;
use crate::socket::Socket;

/// Malha de canais e simulador compartilhado de um grupo de ranks
pub struct QuantumNetwork {
    size: usize,
    sim: Arc<Mutex<StateVector>>,
    epr_tx: HashMap<(usize, usize), Sender<u64>>,
    epr_rx: HashMap<(usize, usize), Mutex<Option<Receiver<u64>>>>,
    msg_tx: HashMap<(usize, usize), Sender<String>>,
    msg_rx: HashMap<(usize, usize), Mutex<Option<Receiver<String>>>>,
}

impl QuantumNetwork {
    /// Cria a malha para `size` ranks com semente de entropia
    pub fn new(size: usize) -> Self {
        Self::from_sim(size, StateVector::new())
    }

    /// Cria a malha com simulador determinístico (testes)
    pub fn with_seed(size: usize, seed: u64) -> Self {
        Self::from_sim(size, StateVector::with_seed(seed))
    }

    fn from_sim(size: usize, sim: StateVector) -> Self {
        let mut epr_tx = HashMap::new();
        let mut epr_rx = HashMap::new();
        let mut msg_tx = HashMap::new();
        let mut msg_rx = HashMap::new();

        for a in 0..size {
            for b in 0..size {
                if a == b {
                    continue;
                }
                let (etx, erx) = channel();
                epr_tx.insert((a, b), etx);
                epr_rx.insert((a, b), Mutex::new(Some(erx)));

                let (mtx, mrx) = channel();
                msg_tx.insert((a, b), mtx);
                msg_rx.insert((a, b), Mutex::new(Some(mrx)));
            }
        }

        Self {
            size,
            sim: Arc::new(Mutex::new(sim)),
            epr_tx,
            epr_rx,
            msg_tx,
            msg_rx,
        }
    }

    /// Número de ranks da malha
    pub fn size(&self) -> usize {
        self.size
    }

    /// Cria a conexão quântica de um rank
    pub fn connection(&self, config: &AppConfig) -> QuantumConnection {
        QuantumConnection::new(self.sim.clone(), config)
    }

    fn take_rx<T>(
        map: &HashMap<(usize, usize), Mutex<Option<Receiver<T>>>>,
        from: usize,
        to: usize,
    ) -> CoreResult<Receiver<T>> {
        map.get(&(from, to))
            .ok_or(CoreError::UnknownPair(from, to))?
            .lock()
            .map_err(|_| CoreError::Backend("network lock poisoned".to_string()))?
            .take()
            .ok_or(CoreError::EndpointClaimed(from, to))
    }

    /// Entrega a um rank seus endpoints (EPR + clássico) para um peer
    ///
    /// Cada par ordenado só pode ser reivindicado uma vez; chamadas
    /// subsequentes devem usar os sockets em cache no registro.
    pub fn open_pair(
        &self,
        my_rank: usize,
        other_rank: usize,
        conn: &QuantumConnection,
    ) -> CoreResult<(EprSocket, Socket)> {
        if my_rank == other_rank || my_rank >= self.size || other_rank >= self.size {
            return Err(CoreError::UnknownPair(my_rank, other_rank));
        }

        let epr_tx = self
            .epr_tx
            .get(&(my_rank, other_rank))
            .ok_or(CoreError::UnknownPair(my_rank, other_rank))?
            .clone();
        let epr_rx = Self::take_rx(&self.epr_rx, other_rank, my_rank)?;

        let msg_tx = self
            .msg_tx
            .get(&(my_rank, other_rank))
            .ok_or(CoreError::UnknownPair(my_rank, other_rank))?
            .clone();
        let msg_rx = Self::take_rx(&self.msg_rx, other_rank, my_rank)?;

        Ok((
            EprSocket::new(conn.clone(), epr_tx, epr_rx, other_rank),
            Socket::new(msg_tx, msg_rx, other_rank),
        ))
    }
}

impl std::fmt::Debug for QuantumNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuantumNetwork")
            .field("size", &self.size)
            .finish()
    }
}
