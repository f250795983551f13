//! Construção de GHZ por cadeia linear
//!
//! Os ranks formam uma cadeia na ordem 0..size: as pontas têm um único
//! vizinho, os interiores emendam o par do vizinho anterior com um par
//! novo para o próximo, medindo o qubit de emenda. O bit medido segue
//! cadeia acima pelo canal clássico e o vizinho seguinte aplica X antes
//! de continuar — com isso as shares finais formam exatamente
//! (|0…0⟩ + |1…1⟩)/√2, a invariante de paridade que expose/unexpose
//! consome.

use qmpi_core::{EprSocket, QuantumConnection, Qubit, Socket};

use crate::error::{CommError, CommResult};

/// Constrói a share local do recurso GHZ
///
/// `down_*` apontam para o vizinho anterior na cadeia (rank - 1),
/// `up_*` para o seguinte (rank + 1); pontas passam `None` no lado que
/// não têm. Retorna a share local e o bit de emenda medido (0 nas
/// pontas).
pub fn create_ghz(
    conn: &QuantumConnection,
    down_epr_socket: Option<&EprSocket>,
    up_epr_socket: Option<&EprSocket>,
    down_socket: Option<&Socket>,
    up_socket: Option<&Socket>,
) -> CommResult<(Qubit, u8)> {
    let share;
    let merge_bit;

    match (down_epr_socket, up_epr_socket) {
        (None, None) => return Err(CommError::InvalidTopology),

        // Início da cadeia: cria o primeiro elo
        (None, Some(up)) => {
            share = up.create_keep()?;
            merge_bit = 0;
        }

        (Some(down), maybe_up) => {
            share = down.recv_keep()?;

            // Correção vinda do vizinho anterior
            let socket = down_socket.ok_or(CommError::InvalidTopology)?;
            if socket.recv()?.trim() == "1" {
                share.x();
            }

            match maybe_up {
                // Ponta final: só corrige
                None => merge_bit = 0,
                // Interior: emenda a cadeia com o próximo elo
                Some(up) => {
                    let splice = up.create_keep()?;
                    share.cnot(&splice);
                    let measured = splice.measure();
                    conn.flush()?;
                    merge_bit = measured.value()?;
                }
            }
        }
    }

    if let Some(socket) = up_socket {
        socket.send(if merge_bit == 1 { "1" } else { "0" })?;
    }

    Ok((share, merge_bit))
}
