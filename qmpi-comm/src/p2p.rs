//! Primitiva ponto-a-ponto por teleportação
//!
//! `qsend` consome cada unidade: a medição de Bell destrói o estado de
//! origem e só as duas correções clássicas viajam. O receptor
//! reconstrói a unidade sobre a metade EPR correspondente — ordem das
//! correções importa: bit-flip (m2) antes de phase-flip (m1).

use qmpi_core::{Qubit, StructuredMessage};

use crate::communicator::QmpiCommunicator;
use crate::error::{CommError, CommResult};

/// Tag das mensagens de correção de teleportação
pub const CORRECTIONS_TAG: &str = "Corrections";

/// Primitiva de envio/recepção entre dois ranks fixos
pub trait P2PComm {
    /// Envia unidades para `dest_rank` por teleportação, consumindo-as
    fn qsend(comm: &mut QmpiCommunicator, qubits: Vec<Qubit>, dest_rank: usize) -> CommResult<()>;

    /// Recebe `expected_qubits` unidades de `src_rank`
    ///
    /// O resultado preserva a ordem em que o emissor as enviou.
    fn qrecv(
        comm: &mut QmpiCommunicator,
        src_rank: usize,
        expected_qubits: usize,
    ) -> CommResult<Vec<Qubit>>;
}

/// Estratégia teledata: estado viaja via par EPR + 2 bits clássicos
pub struct P2PTeledata;

impl P2PComm for P2PTeledata {
    fn qsend(comm: &mut QmpiCommunicator, qubits: Vec<Qubit>, dest_rank: usize) -> CommResult<()> {
        for qubit in qubits {
            let (epr_socket, socket) = comm.registry.channels(dest_rank)?;
            let epr = epr_socket.create_keep()?;

            // Medição de Bell da unidade com a metade local do par
            qubit.cnot(&epr);
            qubit.h();
            let m1 = qubit.measure();
            let m2 = epr.measure();

            // As correções só existem depois do flush
            comm.connection.flush()?;
            socket.send_structured(&StructuredMessage::new(
                CORRECTIONS_TAG,
                vec![m1.value()?, m2.value()?],
            ))?;
        }
        Ok(())
    }

    fn qrecv(
        comm: &mut QmpiCommunicator,
        src_rank: usize,
        expected_qubits: usize,
    ) -> CommResult<Vec<Qubit>> {
        let mut qubits = Vec::with_capacity(expected_qubits);

        for _ in 0..expected_qubits {
            let (epr_socket, socket) = comm.registry.channels(src_rank)?;
            let epr = epr_socket.recv_keep()?;
            comm.connection.flush()?;

            let msg = socket.recv_structured()?;
            if msg.tag != CORRECTIONS_TAG {
                return Err(CommError::UnexpectedTag {
                    expected: CORRECTIONS_TAG,
                    got: msg.tag,
                });
            }
            let &[m1, m2] = msg.payload.as_slice() else {
                return Err(CommError::MalformedMessage {
                    tag: CORRECTIONS_TAG,
                    expected: 2,
                    got: msg.payload.len(),
                });
            };

            // Bit-flip primeiro, phase-flip depois
            if m2 == 1 {
                epr.x();
            }
            if m1 == 1 {
                epr.z();
            }
            comm.connection.flush()?;

            // Troca o estado corrigido para uma unidade nova do rank
            let qubit = Qubit::new(&comm.connection)?;
            epr.cnot(&qubit);
            qubit.cnot(&epr);
            epr.cnot(&qubit);
            qubits.push(qubit);
        }

        Ok(qubits)
    }
}
