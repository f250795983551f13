//! Comunicador QMPI — fachada SPMD das primitivas
//!
//! Um comunicador por processo de rank, construído com a estratégia de
//! comunicação fixa: `Teledata` (teleportação pura) ou `Telegate`
//! (teleportação + gather + expose/unexpose). Cada rank executa o mesmo
//! programa com as mesmas chamadas coletivas; chamadas assimétricas
//! entre ranks são responsabilidade do chamador e podem deadlockar.

use std::fmt;
use std::sync::Arc;

use qmpi_core::{AppConfig, QuantumConnection, QuantumNetwork, Qubit};
use serde::{Deserialize, Serialize};

use crate::collective::CollectiveComm;
use crate::collective::CollectiveTeledata;
use crate::error::{CommError, CommResult};
use crate::ghz;
use crate::p2p::{P2PComm, P2PTeledata};
use crate::registry::ChannelRegistry;
use crate::telegate::{CollectiveTelegate, ExposureSession};

/// Estratégia de comunicação, fixada na construção do comunicador
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CommStrategy {
    /// Só teleportação: qsend/qrecv/qscatter
    #[default]
    Teledata,
    /// Teleportação + qgather + expose/unexpose sobre GHZ
    Telegate,
}

impl CommStrategy {
    /// Nome descritivo
    pub fn name(&self) -> &'static str {
        match self {
            Self::Teledata => "Teledata",
            Self::Telegate => "Telegate",
        }
    }
}

impl fmt::Display for CommStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Comunicador de um rank dentro de um grupo de tamanho fixo
pub struct QmpiCommunicator {
    rank: usize,
    size: usize,
    strategy: CommStrategy,
    pub(crate) connection: QuantumConnection,
    pub(crate) registry: ChannelRegistry,
    pub(crate) session: Option<ExposureSession>,
}

impl QmpiCommunicator {
    /// Cria o comunicador do rank dado sobre a malha compartilhada
    pub fn new(
        rank: usize,
        size: usize,
        config: AppConfig,
        strategy: CommStrategy,
        network: Arc<QuantumNetwork>,
    ) -> CommResult<Self> {
        if size == 0 || rank >= size {
            return Err(CommError::InvalidRank { rank, size });
        }
        if network.size() != size {
            return Err(CommError::SizeMismatch {
                comm: size,
                net: network.size(),
            });
        }

        let connection = network.connection(&config);
        let registry = ChannelRegistry::new(rank, network, connection.clone());
        Ok(Self {
            rank,
            size,
            strategy,
            connection,
            registry,
            session: None,
        })
    }

    /// Rank deste processo
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Tamanho do grupo
    pub fn size(&self) -> usize {
        self.size
    }

    /// Estratégia escolhida na construção
    pub fn strategy(&self) -> CommStrategy {
        self.strategy
    }

    /// Conexão quântica deste rank
    pub fn connection(&self) -> &QuantumConnection {
        &self.connection
    }

    /// Rank seguinte na ordem circular
    pub fn next_rank(&self, rank: usize) -> usize {
        (rank + 1) % self.size
    }

    /// Rank anterior na ordem circular
    pub fn prev_rank(&self, rank: usize) -> usize {
        (rank + self.size - 1) % self.size
    }

    /// Há sessão de exposição aberta?
    pub fn session_active(&self) -> bool {
        self.session.is_some()
    }

    /// Lista exposta da sessão ativa (vazia fora de sessão)
    ///
    /// Nos ranks não expositores o índice 0 é a share GHZ correlacionada
    /// com a unidade exposta.
    pub fn exposed(&self) -> &[Qubit] {
        self.session
            .as_ref()
            .map(|s| s.qubits.as_slice())
            .unwrap_or(&[])
    }

    fn check_rank(&self, rank: usize) -> CommResult<()> {
        if rank >= self.size {
            return Err(CommError::InvalidRank {
                rank,
                size: self.size,
            });
        }
        Ok(())
    }

    fn ensure_idle(&self) -> CommResult<()> {
        if self.session.is_some() {
            return Err(CommError::SessionActive);
        }
        Ok(())
    }

    /// Envia unidades para `dest_rank` por teleportação, consumindo-as
    pub fn qsend(&mut self, qubits: Vec<Qubit>, dest_rank: usize) -> CommResult<()> {
        self.ensure_idle()?;
        self.check_rank(dest_rank)?;
        if dest_rank == self.rank {
            return Err(CommError::SelfTarget(self.rank));
        }
        P2PTeledata::qsend(self, qubits, dest_rank)
    }

    /// Recebe `expected_qubits` unidades de `src_rank`, na ordem enviada
    pub fn qrecv(&mut self, src_rank: usize, expected_qubits: usize) -> CommResult<Vec<Qubit>> {
        self.ensure_idle()?;
        self.check_rank(src_rank)?;
        if src_rank == self.rank {
            return Err(CommError::SelfTarget(self.rank));
        }
        P2PTeledata::qrecv(self, src_rank, expected_qubits)
    }

    /// Espalha `total_units` unidades do emissor entre todos os ranks
    ///
    /// Chamada idêntica em todos os ranks; não emissores passam uma
    /// lista vazia e recebem seu chunk da partição balanceada.
    pub fn qscatter(
        &mut self,
        qubits: Vec<Qubit>,
        rank_sender: usize,
        total_units: usize,
    ) -> CommResult<Vec<Qubit>> {
        self.ensure_idle()?;
        self.check_rank(rank_sender)?;
        match self.strategy {
            CommStrategy::Teledata => {
                CollectiveTeledata::qscatter(self, qubits, rank_sender, total_units)
            }
            CommStrategy::Telegate => {
                CollectiveTelegate::qscatter(self, qubits, rank_sender, total_units)
            }
        }
    }

    /// Reúne as contribuições de todos os ranks no receptor
    ///
    /// Só a estratégia telegate implementa gather; resultado não vazio
    /// apenas no receptor.
    pub fn qgather(
        &mut self,
        qubits: Vec<Qubit>,
        rank_recv: usize,
        total_units: usize,
    ) -> CommResult<Vec<Qubit>> {
        self.ensure_idle()?;
        self.check_rank(rank_recv)?;
        match self.strategy {
            CommStrategy::Teledata => {
                CollectiveTeledata::qgather(self, qubits, rank_recv, total_units)
            }
            CommStrategy::Telegate => {
                CollectiveTelegate::qgather(self, qubits, rank_recv, total_units)
            }
        }
    }

    /// Abre uma sessão de exposição do estado do rank expositor
    pub fn expose(&mut self, qubits: Vec<Qubit>, exposer_rank: usize) -> CommResult<()> {
        self.check_rank(exposer_rank)?;
        if self.strategy != CommStrategy::Telegate {
            return Err(CommError::Unsupported {
                op: "expose",
                strategy: self.strategy,
            });
        }
        CollectiveTelegate::expose(self, qubits, exposer_rank)
    }

    /// Fecha a sessão de exposição, devolvendo as unidades locais
    pub fn unexpose(&mut self, exposer_rank: usize) -> CommResult<Vec<Qubit>> {
        self.check_rank(exposer_rank)?;
        if self.strategy != CommStrategy::Telegate {
            return Err(CommError::Unsupported {
                op: "unexpose",
                strategy: self.strategy,
            });
        }
        CollectiveTelegate::unexpose(self, exposer_rank)
    }

    /// Constrói a share local de um GHZ sobre a cadeia 0..size
    pub fn create_ghz(&mut self) -> CommResult<Qubit> {
        if self.size < 2 {
            return Err(CommError::InvalidTopology);
        }

        let prev = (self.rank != 0).then(|| self.prev_rank(self.rank));
        let next = (self.rank != self.size - 1).then(|| self.next_rank(self.rank));
        if let Some(p) = prev {
            self.registry.ensure_open(p)?;
        }
        if let Some(n) = next {
            self.registry.ensure_open(n)?;
        }

        let down_epr = prev.map(|p| self.registry.epr(p)).transpose()?;
        let down_socket = prev.map(|p| self.registry.classical(p)).transpose()?;
        let up_epr = next.map(|n| self.registry.epr(n)).transpose()?;
        let up_socket = next.map(|n| self.registry.classical(n)).transpose()?;

        let (share, _merge_bit) =
            ghz::create_ghz(&self.connection, down_epr, up_epr, down_socket, up_socket)?;
        Ok(share)
    }
}

impl fmt::Debug for QmpiCommunicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QmpiCommunicator")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .field("strategy", &self.strategy)
            .field("session_active", &self.session_active())
            .finish()
    }
}
