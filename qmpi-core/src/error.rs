//! Tipos de erro para qmpi-core

use thiserror::Error;

/// Resultado customizado para operações do backplane
pub type CoreResult<T> = Result<T, CoreError>;

/// Erros que podem ocorrer no backplane quântico
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("Unknown or already measured qubit: {0}")]
    InvalidQubit(u64),

    #[error("Measurement result not yet available (flush pending)")]
    PendingMeasurement,

    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    #[error("Channel endpoints already claimed for pair ({0}, {1})")]
    EndpointClaimed(usize, usize),

    #[error("Unknown rank pair ({0}, {1})")]
    UnknownPair(usize, usize),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Backend error: {0}")]
    Backend(String),
}
