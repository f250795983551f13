//! Primitivas coletivas — particionamento balanceado e scatter
//!
//! Todas as chamadas coletivas são SPMD: cada rank executa a mesma
//! chamada com os mesmos argumentos de controle (`rank_sender`,
//! `total_units`), e a contagem por rank sai da fórmula de partição
//! balanceada — nenhuma contagem viaja pelo canal.

use qmpi_core::Qubit;

use crate::communicator::{CommStrategy, QmpiCommunicator};
use crate::error::{CommError, CommResult};
use crate::p2p::{P2PComm, P2PTeledata};

/// Comprimento do chunk `idx` ao dividir `len` itens em `parts` partes
///
/// Os primeiros `len % parts` chunks absorvem o resto: cada par de
/// chunks difere em no máximo 1.
pub fn chunk_len(len: usize, parts: usize, idx: usize) -> usize {
    len / parts + usize::from(idx < len % parts)
}

/// Divide uma lista em `parts` chunks contíguos balanceados
pub fn list_split<T>(items: Vec<T>, parts: usize) -> Vec<Vec<T>> {
    let len = items.len();
    let mut chunks = Vec::with_capacity(parts);
    let mut rest = items;
    for idx in 0..parts {
        let tail = rest.split_off(chunk_len(len, parts, idx).min(rest.len()));
        chunks.push(rest);
        rest = tail;
    }
    chunks
}

/// Primitivas coletivas sobre o grupo inteiro de ranks
pub trait CollectiveComm {
    /// Espalha os chunks do emissor para todos os ranks
    fn qscatter(
        comm: &mut QmpiCommunicator,
        qubits: Vec<Qubit>,
        rank_sender: usize,
        total_units: usize,
    ) -> CommResult<Vec<Qubit>>;

    /// Reúne as contribuições de todos os ranks no receptor
    fn qgather(
        comm: &mut QmpiCommunicator,
        qubits: Vec<Qubit>,
        rank_recv: usize,
        total_units: usize,
    ) -> CommResult<Vec<Qubit>>;
}

/// Estratégia teledata: coletivas compostas só de teleportação
pub struct CollectiveTeledata;

impl CollectiveComm for CollectiveTeledata {
    fn qscatter(
        comm: &mut QmpiCommunicator,
        qubits: Vec<Qubit>,
        rank_sender: usize,
        total_units: usize,
    ) -> CommResult<Vec<Qubit>> {
        let rank = comm.rank();
        let size = comm.size();

        if rank == rank_sender {
            if qubits.len() != total_units {
                return Err(CommError::CountMismatch {
                    expected: total_units,
                    got: qubits.len(),
                });
            }

            // Chunk próprio fica local — nada de auto-teleportação
            let mut own = Vec::new();
            for (i, chunk) in list_split(qubits, size).into_iter().enumerate() {
                if i == rank_sender {
                    own = chunk;
                } else {
                    P2PTeledata::qsend(comm, chunk, i)?;
                }
            }
            Ok(own)
        } else {
            if !qubits.is_empty() {
                return Err(CommError::UnexpectedUnits(qubits.len()));
            }
            P2PTeledata::qrecv(comm, rank_sender, chunk_len(total_units, size, rank))
        }
    }

    fn qgather(
        _comm: &mut QmpiCommunicator,
        _qubits: Vec<Qubit>,
        _rank_recv: usize,
        _total_units: usize,
    ) -> CommResult<Vec<Qubit>> {
        // Sem stub silencioso: teledata puro não implementa gather
        Err(CommError::Unsupported {
            op: "qgather",
            strategy: CommStrategy::Teledata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_len_example() {
        // 10 itens em 3 partes: [4, 3, 3]
        assert_eq!(chunk_len(10, 3, 0), 4);
        assert_eq!(chunk_len(10, 3, 1), 3);
        assert_eq!(chunk_len(10, 3, 2), 3);
    }

    #[test]
    fn test_chunk_len_uneven() {
        // 5 itens em 3 partes: [2, 2, 1]
        assert_eq!(chunk_len(5, 3, 0), 2);
        assert_eq!(chunk_len(5, 3, 1), 2);
        assert_eq!(chunk_len(5, 3, 2), 1);
    }

    #[test]
    fn test_chunk_len_properties() {
        for len in 0..40 {
            for parts in 1..8 {
                let lens: Vec<usize> = (0..parts).map(|i| chunk_len(len, parts, i)).collect();
                assert_eq!(lens.iter().sum::<usize>(), len);
                assert_eq!(lens.len(), parts);
                let avg = len / parts;
                for (i, &l) in lens.iter().enumerate() {
                    assert!(l == avg || l == avg + 1);
                    assert_eq!(l == avg + 1, i < len % parts);
                }
            }
        }
    }

    #[test]
    fn test_list_split_preserves_order() {
        let chunks = list_split((0..10).collect::<Vec<_>>(), 3);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], vec![0, 1, 2, 3]);
        assert_eq!(chunks[1], vec![4, 5, 6]);
        assert_eq!(chunks[2], vec![7, 8, 9]);
    }

    #[test]
    fn test_list_split_more_parts_than_items() {
        let chunks = list_split(vec![1, 2], 4);
        assert_eq!(chunks, vec![vec![1], vec![2], vec![], vec![]]);
    }

    #[test]
    fn test_list_split_empty() {
        let chunks = list_split(Vec::<u8>::new(), 3);
        assert_eq!(chunks, vec![Vec::<u8>::new(), vec![], vec![]]);
    }
}
