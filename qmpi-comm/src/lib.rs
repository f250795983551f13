//! # 🛰️ qmpi-comm — Primitivas MPI para Estado Quântico
//!
//! Comunicador SPMD em que o payload é estado quântico: como estado não
//! pode ser copiado, todo envio é uma teleportação — consome um par EPR
//! pré-compartilhado, mede, e só dois bits clássicos de correção
//! viajam. Sobre essa primitiva ficam as coletivas (scatter/gather) e a
//! sessão de exposição multi-rank sobre GHZ.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │         QmpiCommunicator                        │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  ChannelRegistry (EPR + clássico por peer)│  │
//! │  └───────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  P2PTeledata (qsend/qrecv)                │  │
//! │  └───────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  CollectiveTeledata / CollectiveTelegate  │  │
//! │  │  (qscatter, qgather, expose/unexpose)     │  │
//! │  └───────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  GHZ chain helper                         │  │
//! │  └───────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Exemplo
//!
//! ```no_run
//! use std::sync::Arc;
//! use qmpi_core::{AppConfig, QuantumNetwork, Qubit};
//! use qmpi_comm::{CommStrategy, QmpiCommunicator};
//!
//! // Dentro da thread do rank 0 de um grupo de 2:
//! let network = Arc::new(QuantumNetwork::new(2));
//! let mut comm = QmpiCommunicator::new(
//!     0, 2, AppConfig::named("rank_0"), CommStrategy::Teledata, network,
//! ).unwrap();
//!
//! let q = Qubit::new(comm.connection()).unwrap();
//! q.x();
//! comm.qsend(vec![q], 1).unwrap();
//! ```

pub mod collective;
pub mod communicator;
pub mod error;
pub mod ghz;
pub mod p2p;
pub mod registry;
pub mod telegate;

pub use collective::{chunk_len, list_split, CollectiveComm, CollectiveTeledata};
pub use communicator::{CommStrategy, QmpiCommunicator};
pub use error::{CommError, CommResult};
pub use ghz::create_ghz;
pub use p2p::{P2PComm, P2PTeledata, CORRECTIONS_TAG};
pub use registry::ChannelRegistry;
pub use telegate::{CollectiveTelegate, ExposureSession, EXPOSE_TAG, UNEXPOSE_TAG};

#[cfg(test)]
mod tests;
