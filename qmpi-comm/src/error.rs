//! Tipos de erro para qmpi-comm
//!
//! Toda violação aqui é um erro de programação do algoritmo distribuído
//! chamador (sequenciamento, contagem, configuração) — fatal, nunca
//! re-tentada. Falhas de canal são assumidas fora de escopo e chegam
//! embrulhadas como `CoreError`.

use qmpi_core::CoreError;
use thiserror::Error;

use crate::communicator::CommStrategy;

/// Resultado customizado para operações do comunicador
pub type CommResult<T> = Result<T, CommError>;

/// Erros que podem ocorrer nas primitivas de comunicação
#[derive(Debug, Clone, Error)]
pub enum CommError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Rank {rank} out of range for group of size {size}")]
    InvalidRank { rank: usize, size: usize },

    #[error("Communicator size {comm} does not match network size {net}")]
    SizeMismatch { comm: usize, net: usize },

    #[error("Rank {0} cannot teleport to itself")]
    SelfTarget(usize),

    #[error("Operation {op} not supported by strategy {strategy}")]
    Unsupported {
        op: &'static str,
        strategy: CommStrategy,
    },

    #[error("Expected {expected} units, got {got}")]
    CountMismatch { expected: usize, got: usize },

    #[error("Non-sender rank passed {0} units that would be silently dropped")]
    UnexpectedUnits(usize),

    #[error("Unexpected message tag: expected {expected}, got {got}")]
    UnexpectedTag {
        expected: &'static str,
        got: String,
    },

    #[error("Malformed {tag} payload: expected {expected} bits, got {got}")]
    MalformedMessage {
        tag: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("An exposure session is already active")]
    SessionActive,

    #[error("No exposure session is active")]
    NoSession,

    #[error("Active session belongs to exposer {active}, not {requested}")]
    WrongExposer { active: usize, requested: usize },

    #[error("Exposer called expose with no units")]
    NothingToExpose,

    #[error("Exposure session holds no GHZ share to release")]
    MissingShare,

    #[error("GHZ chain node has no neighbors to entangle with")]
    InvalidTopology,

    #[error("No channel open to rank {0}")]
    ChannelNotOpen(usize),
}
