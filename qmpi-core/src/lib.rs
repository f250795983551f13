//! # ⚛️ qmpi-core — Backplane Quântico Simulado
//!
//! Infraestrutura que o comunicador QMPI trata como subsistema externo:
//! simulador de vetor de estado compartilhado, fila de operações por
//! rank com flush explícito, canais EPR e canais clássicos ordenados.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │         QuantumNetwork                          │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  StateVector (Arc<Mutex>, compartilhado)  │  │
//! │  └───────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  QuantumConnection por rank (fila+flush)  │  │
//! │  └───────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  EprSocket + Socket por par de ranks      │  │
//! │  └───────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Exemplo
//!
//! ```
//! use qmpi_core::{AppConfig, QuantumNetwork, Qubit};
//!
//! let net = QuantumNetwork::with_seed(2, 42);
//! let conn = net.connection(&AppConfig::named("rank_0"));
//!
//! let q = Qubit::new(&conn).unwrap();
//! q.x();
//! let m = q.measure();
//! conn.flush().unwrap();
//! assert_eq!(m.value().unwrap(), 1);
//! ```

pub mod connection;
pub mod epr;
pub mod error;
pub mod network;
pub mod sim;
pub mod socket;

pub use connection::{AppConfig, Measurement, QuantumConnection, Qubit};
pub use epr::EprSocket;
pub use error::{CoreError, CoreResult};
pub use network::QuantumNetwork;
pub use sim::StateVector;
pub use socket::{Socket, StructuredMessage};
