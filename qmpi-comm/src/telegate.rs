//! Estratégia telegate — gather e sessão de exposição sobre GHZ
//!
//! Além das coletivas por teleportação, o telegate dá a todos os ranks
//! acesso emaranhado ao estado de um rank expositor: `expose` constrói
//! um GHZ por chamada e correlaciona a primeira unidade exposta com as
//! shares de todos; `unexpose` colapsa o recurso e devolve o
//! comunicador ao estado ocioso.

use qmpi_core::{Qubit, StructuredMessage};

use crate::collective::{chunk_len, CollectiveComm, CollectiveTeledata};
use crate::communicator::QmpiCommunicator;
use crate::error::{CommError, CommResult};
use crate::p2p::{P2PComm, P2PTeledata};

/// Tag das mensagens de abertura de exposição
pub const EXPOSE_TAG: &str = "Expose";
/// Tag das mensagens de fechamento de exposição
pub const UNEXPOSE_TAG: &str = "Unexpose";

/// Sessão de exposição ativa — no máximo uma por comunicador
///
/// Entre expose e unexpose a lista guarda, no expositor, as unidades
/// expostas; nos demais ranks, a share GHZ correlacionada no índice 0
/// seguida das unidades locais passadas ao expose.
#[derive(Debug)]
pub struct ExposureSession {
    pub(crate) exposer: usize,
    pub(crate) qubits: Vec<Qubit>,
}

/// Estratégia telegate: teledata + gather + expose/unexpose
pub struct CollectiveTelegate;

impl CollectiveComm for CollectiveTelegate {
    fn qscatter(
        comm: &mut QmpiCommunicator,
        qubits: Vec<Qubit>,
        rank_sender: usize,
        total_units: usize,
    ) -> CommResult<Vec<Qubit>> {
        CollectiveTeledata::qscatter(comm, qubits, rank_sender, total_units)
    }

    fn qgather(
        comm: &mut QmpiCommunicator,
        qubits: Vec<Qubit>,
        rank_recv: usize,
        total_units: usize,
    ) -> CommResult<Vec<Qubit>> {
        let rank = comm.rank();
        let size = comm.size();

        let expected = chunk_len(total_units, size, rank);
        if qubits.len() != expected {
            return Err(CommError::CountMismatch {
                expected,
                got: qubits.len(),
            });
        }

        if rank == rank_recv {
            // Montagem estritamente em ordem crescente de rank: o
            // receptor bloqueia no peer esperado antes de avançar, o
            // que fixa a ordem do resultado
            let mut own = Some(qubits);
            let mut gathered = Vec::with_capacity(total_units);
            for i in 0..size {
                if i == rank_recv {
                    gathered.append(&mut own.take().unwrap_or_default());
                } else {
                    gathered.extend(P2PTeledata::qrecv(
                        comm,
                        i,
                        chunk_len(total_units, size, i),
                    )?);
                }
            }
            Ok(gathered)
        } else {
            // Teleportar consome as unidades de origem: não há handle
            // válido a devolver para quem enviou
            P2PTeledata::qsend(comm, qubits, rank_recv)?;
            Ok(Vec::new())
        }
    }
}

impl CollectiveTelegate {
    /// Abre uma sessão de exposição sobre um GHZ novo
    ///
    /// Apenas a primeira unidade da lista do expositor é emaranhada —
    /// limitação documentada do protocolo, não generalizar.
    pub(crate) fn expose(
        comm: &mut QmpiCommunicator,
        qubits: Vec<Qubit>,
        exposer_rank: usize,
    ) -> CommResult<()> {
        if comm.session.is_some() {
            return Err(CommError::SessionActive);
        }
        let rank = comm.rank();
        let size = comm.size();
        if rank == exposer_rank && qubits.is_empty() {
            return Err(CommError::NothingToExpose);
        }

        comm.session = Some(ExposureSession {
            exposer: exposer_rank,
            qubits,
        });

        let ghz = comm.create_ghz()?;

        if rank == exposer_rank {
            {
                let session = comm.session.as_ref().ok_or(CommError::NoSession)?;
                let unit = session.qubits.first().ok_or(CommError::NothingToExpose)?;
                unit.cnot(&ghz);
            }
            let measured = ghz.measure();
            comm.connection.flush()?;
            let bit = measured.value()?;

            for r in 0..size {
                if r == rank {
                    continue;
                }
                let socket = comm.registry.channels(r)?.1;
                socket.send_structured(&StructuredMessage::new(EXPOSE_TAG, vec![bit]))?;
                comm.connection.flush()?;
            }
        } else {
            let socket = comm.registry.channels(exposer_rank)?.1;
            let msg = socket.recv_structured()?;
            if msg.tag != EXPOSE_TAG {
                return Err(CommError::UnexpectedTag {
                    expected: EXPOSE_TAG,
                    got: msg.tag,
                });
            }
            let &[bit] = msg.payload.as_slice() else {
                return Err(CommError::MalformedMessage {
                    tag: EXPOSE_TAG,
                    expected: 1,
                    got: msg.payload.len(),
                });
            };

            if bit == 1 {
                ghz.x();
            }
            // Share correlacionada fica visível como índice 0
            if let Some(session) = comm.session.as_mut() {
                session.qubits.insert(0, ghz);
            }
        }

        Ok(())
    }

    /// Fecha a sessão, colapsando o GHZ e devolvendo as unidades locais
    pub(crate) fn unexpose(
        comm: &mut QmpiCommunicator,
        exposer_rank: usize,
    ) -> CommResult<Vec<Qubit>> {
        // A lista exposta é limpa primeiro: a posse da sessão termina
        // independente do resultado dos passos seguintes
        let session = comm.session.take().ok_or(CommError::NoSession)?;
        if session.exposer != exposer_rank {
            return Err(CommError::WrongExposer {
                active: session.exposer,
                requested: exposer_rank,
            });
        }

        let rank = comm.rank();
        let size = comm.size();
        let mut qubits = session.qubits;

        if rank == exposer_rank {
            let mut all_ones = 1u8;
            for r in 0..size {
                if r == rank {
                    continue;
                }
                let socket = comm.registry.channels(r)?.1;
                let msg = socket.recv_structured()?;
                if msg.tag != UNEXPOSE_TAG {
                    return Err(CommError::UnexpectedTag {
                        expected: UNEXPOSE_TAG,
                        got: msg.tag,
                    });
                }
                let &[bit] = msg.payload.as_slice() else {
                    return Err(CommError::MalformedMessage {
                        tag: UNEXPOSE_TAG,
                        expected: 1,
                        got: msg.payload.len(),
                    });
                };
                all_ones &= bit;
                comm.connection.flush()?;
            }

            if all_ones == 1 {
                if let Some(unit) = qubits.first() {
                    unit.z();
                }
            }
        } else {
            if qubits.is_empty() {
                return Err(CommError::MissingShare);
            }
            let share = qubits.remove(0);
            share.h();
            let measured = share.measure();
            comm.connection.flush()?;

            let socket = comm.registry.channels(exposer_rank)?.1;
            socket.send_structured(&StructuredMessage::new(
                UNEXPOSE_TAG,
                vec![measured.value()?],
            ))?;
        }

        comm.connection.flush()?;
        Ok(qubits)
    }
}
