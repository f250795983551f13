//! Testes integrados para qmpi-comm
//!
//! Harness SPMD: uma thread de SO por rank sobre uma malha semeada
//! compartilhada. Cada teste devolve um valor por rank, coletado em
//! ordem de rank.

use std::sync::Arc;
use std::thread;

use qmpi_core::{AppConfig, QuantumNetwork, Qubit};

use crate::*;

fn run_ranks<R, F>(size: usize, seed: u64, strategy: CommStrategy, f: F) -> Vec<R>
where
    R: Send + 'static,
    F: Fn(&mut QmpiCommunicator) -> R + Send + Sync + 'static,
{
    let network = Arc::new(QuantumNetwork::with_seed(size, seed));
    let f = Arc::new(f);

    let handles: Vec<_> = (0..size)
        .map(|rank| {
            let network = network.clone();
            let f = f.clone();
            thread::spawn(move || {
                let config = AppConfig::named(format!("rank_{rank}"));
                let mut comm =
                    QmpiCommunicator::new(rank, size, config, strategy, network).unwrap();
                f(&mut comm)
            })
        })
        .collect();

    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

fn prepare_bits(comm: &QmpiCommunicator, bits: &[u8]) -> Vec<Qubit> {
    bits.iter()
        .map(|&b| {
            let q = Qubit::new(comm.connection()).unwrap();
            if b == 1 {
                q.x();
            }
            q
        })
        .collect()
}

fn measure_all(comm: &QmpiCommunicator, qubits: Vec<Qubit>) -> Vec<u8> {
    let pending: Vec<_> = qubits.into_iter().map(|q| q.measure()).collect();
    comm.connection().flush().unwrap();
    pending.iter().map(|m| m.value().unwrap()).collect()
}

// ---------------------------------------------------------------------
// Ponto-a-ponto
// ---------------------------------------------------------------------

#[test]
fn test_teleport_identity_bit() {
    // |1⟩ enviado de 0 para 1 chega como |1⟩, para qualquer combinação
    // de bits de correção sorteada
    for seed in 0..8 {
        let results = run_ranks(2, seed, CommStrategy::Teledata, |comm| {
            if comm.rank() == 0 {
                let qubits = prepare_bits(comm, &[1]);
                comm.qsend(qubits, 1).unwrap();
                Vec::new()
            } else {
                let qubits = comm.qrecv(0, 1).unwrap();
                measure_all(comm, qubits)
            }
        });
        assert_eq!(results[1], vec![1], "seed {seed}");
    }
}

#[test]
fn test_teleport_identity_phase() {
    // |+⟩ enviado e medido na base X no destino: sempre 0 — detecta
    // qualquer troca na ordem/condição das correções
    for seed in 0..8 {
        let results = run_ranks(2, seed, CommStrategy::Teledata, |comm| {
            if comm.rank() == 0 {
                let q = Qubit::new(comm.connection()).unwrap();
                q.h();
                comm.qsend(vec![q], 1).unwrap();
                Vec::new()
            } else {
                let mut qubits = comm.qrecv(0, 1).unwrap();
                let q = qubits.pop().unwrap();
                q.h();
                measure_all(comm, vec![q])
            }
        });
        assert_eq!(results[1], vec![0], "seed {seed}");
    }
}

#[test]
fn test_teleport_preserves_batch_order() {
    let pattern: &[u8] = &[0, 1, 1, 0];
    for seed in 0..4 {
        let results = run_ranks(2, seed, CommStrategy::Teledata, move |comm| {
            if comm.rank() == 0 {
                let qubits = prepare_bits(comm, pattern);
                comm.qsend(qubits, 1).unwrap();
                Vec::new()
            } else {
                let qubits = comm.qrecv(0, pattern.len()).unwrap();
                measure_all(comm, qubits)
            }
        });
        assert_eq!(results[1], pattern.to_vec(), "seed {seed}");
    }
}

#[test]
fn test_qsend_to_self_rejected() {
    let results = run_ranks(2, 1, CommStrategy::Teledata, |comm| {
        if comm.rank() == 0 {
            let qubits = prepare_bits(comm, &[1]);
            matches!(comm.qsend(qubits, 0), Err(CommError::SelfTarget(0)))
        } else {
            matches!(comm.qrecv(1, 1), Err(CommError::SelfTarget(1)))
        }
    });
    assert!(results.iter().all(|&ok| ok));
}

// ---------------------------------------------------------------------
// Scatter
// ---------------------------------------------------------------------

#[test]
fn test_scatter_four_ranks_one_each() {
    // 4 unidades entre 4 ranks: exatamente 1 por rank, em ordem
    let pattern: &[u8] = &[0, 1, 0, 1];
    for seed in 0..4 {
        let results = run_ranks(4, seed, CommStrategy::Teledata, move |comm| {
            let qubits = if comm.rank() == 0 {
                prepare_bits(comm, pattern)
            } else {
                Vec::new()
            };
            let chunk = comm.qscatter(qubits, 0, pattern.len()).unwrap();
            measure_all(comm, chunk)
        });
        for (rank, bits) in results.iter().enumerate() {
            assert_eq!(bits.len(), 1, "seed {seed}");
            assert_eq!(bits[0], pattern[rank], "seed {seed}");
        }
    }
}

#[test]
fn test_scatter_uneven_chunks() {
    // 5 unidades em 3 ranks: chunks [2, 2, 1]; a concatenação em ordem
    // de rank reproduz a sequência original
    let pattern: &[u8] = &[1, 0, 1, 1, 0];
    for seed in 0..4 {
        let results = run_ranks(3, seed, CommStrategy::Teledata, move |comm| {
            let qubits = if comm.rank() == 1 {
                prepare_bits(comm, pattern)
            } else {
                Vec::new()
            };
            let chunk = comm.qscatter(qubits, 1, pattern.len()).unwrap();
            measure_all(comm, chunk)
        });
        assert_eq!(results[0].len(), 2);
        assert_eq!(results[1].len(), 2);
        assert_eq!(results[2].len(), 1);
        let concat: Vec<u8> = results.concat();
        assert_eq!(concat, pattern.to_vec(), "seed {seed}");
    }
}

#[test]
fn test_scatter_nonsender_units_rejected() {
    let results = run_ranks(2, 7, CommStrategy::Teledata, |comm| {
        if comm.rank() == 0 {
            let qubits = prepare_bits(comm, &[0, 1]);
            comm.qscatter(qubits, 0, 2).unwrap().len()
        } else {
            let stray = prepare_bits(comm, &[0]);
            match comm.qscatter(stray, 0, 2) {
                Err(CommError::UnexpectedUnits(1)) => usize::MAX,
                other => panic!("expected UnexpectedUnits, got {other:?}"),
            }
        }
    });
    assert_eq!(results[0], 1);
    assert_eq!(results[1], usize::MAX);
}

#[test]
fn test_scatter_sender_count_mismatch() {
    // Só o emissor participa: o erro dispara antes de qualquer envio
    let results = run_ranks(2, 7, CommStrategy::Teledata, |comm| {
        if comm.rank() == 0 {
            let qubits = prepare_bits(comm, &[1]);
            matches!(
                comm.qscatter(qubits, 0, 2),
                Err(CommError::CountMismatch {
                    expected: 2,
                    got: 1
                })
            )
        } else {
            true
        }
    });
    assert!(results.iter().all(|&ok| ok));
}

// ---------------------------------------------------------------------
// Gather
// ---------------------------------------------------------------------

#[test]
fn test_gather_unsupported_on_teledata() {
    let results = run_ranks(2, 1, CommStrategy::Teledata, |comm| {
        let gather = matches!(
            comm.qgather(Vec::new(), 0, 0),
            Err(CommError::Unsupported {
                op: "qgather",
                strategy: CommStrategy::Teledata,
            })
        );
        let expose = matches!(
            comm.expose(Vec::new(), 0),
            Err(CommError::Unsupported {
                op: "expose",
                strategy: CommStrategy::Teledata,
            })
        );
        gather && expose
    });
    assert!(results.iter().all(|&ok| ok));
}

#[test]
fn test_scatter_gather_inverse() {
    // Scatter seguido de gather reproduz a sequência no receptor; não
    // receptores ficam sem handles (teleportar consome a origem)
    let pattern: &[u8] = &[1, 0, 1, 1, 0];
    for seed in 0..4 {
        let results = run_ranks(3, seed, CommStrategy::Telegate, move |comm| {
            let qubits = if comm.rank() == 0 {
                prepare_bits(comm, pattern)
            } else {
                Vec::new()
            };
            let chunk = comm.qscatter(qubits, 0, pattern.len()).unwrap();
            let gathered = comm.qgather(chunk, 0, pattern.len()).unwrap();
            measure_all(comm, gathered)
        });
        assert_eq!(results[0], pattern.to_vec(), "seed {seed}");
        assert!(results[1].is_empty());
        assert!(results[2].is_empty());
    }
}

#[test]
fn test_gather_orders_by_rank_not_arrival() {
    // Cada rank contribui 1 unidade com o próprio rank como bit de
    // paridade (rank ímpar = |1⟩); o resultado sai em ordem de rank
    for seed in 0..4 {
        let results = run_ranks(4, seed, CommStrategy::Telegate, |comm| {
            let bit = (comm.rank() % 2) as u8;
            let qubits = prepare_bits(comm, &[bit]);
            let gathered = comm.qgather(qubits, 2, 4).unwrap();
            measure_all(comm, gathered)
        });
        assert_eq!(results[2], vec![0, 1, 0, 1], "seed {seed}");
        for rank in [0usize, 1, 3] {
            assert!(results[rank].is_empty());
        }
    }
}

#[test]
fn test_gather_contribution_count_checked() {
    let results = run_ranks(2, 3, CommStrategy::Telegate, |comm| {
        if comm.rank() == 0 {
            // chunk_len(4, 2, 0) = 2, mas só 1 unidade foi passada
            let qubits = prepare_bits(comm, &[1]);
            matches!(
                comm.qgather(qubits, 0, 4),
                Err(CommError::CountMismatch {
                    expected: 2,
                    got: 1
                })
            )
        } else {
            true
        }
    });
    assert!(results.iter().all(|&ok| ok));
}

// ---------------------------------------------------------------------
// GHZ
// ---------------------------------------------------------------------

#[test]
fn test_ghz_shares_all_agree() {
    // Invariante de paridade da cadeia: com as correções aplicadas,
    // todas as shares medem o mesmo valor
    for size in [2usize, 3, 4] {
        for seed in 0..6 {
            let results = run_ranks(size, seed, CommStrategy::Telegate, |comm| {
                let share = comm.create_ghz().unwrap();
                let measured = share.measure();
                comm.connection().flush().unwrap();
                measured.value().unwrap()
            });
            assert!(
                results.iter().all(|&m| m == results[0]),
                "size {size} seed {seed}: {results:?}"
            );
        }
    }
}

#[test]
fn test_ghz_requires_two_ranks() {
    let results = run_ranks(1, 0, CommStrategy::Telegate, |comm| {
        matches!(comm.create_ghz(), Err(CommError::InvalidTopology))
    });
    assert!(results[0]);
}

// ---------------------------------------------------------------------
// Expose / Unexpose
// ---------------------------------------------------------------------

#[test]
fn test_expose_unexpose_restores_bit() {
    // |1⟩ exposto e desexposto volta intacto ao expositor, e as listas
    // de sessão de todos os ranks voltam a vazio
    for seed in 0..8 {
        let results = run_ranks(2, seed, CommStrategy::Telegate, |comm| {
            let qubits = if comm.rank() == 0 {
                prepare_bits(comm, &[1])
            } else {
                Vec::new()
            };
            comm.expose(qubits, 0).unwrap();
            assert_eq!(comm.exposed().len(), 1);
            assert!(comm.session_active());

            let returned = comm.unexpose(0).unwrap();
            assert!(comm.exposed().is_empty());
            assert!(!comm.session_active());

            measure_all(comm, returned)
        });
        assert_eq!(results[0], vec![1], "seed {seed}");
        assert!(results[1].is_empty());
    }
}

#[test]
fn test_expose_unexpose_restores_phase() {
    // |+⟩ exposto e desexposto medido na base X: sempre 0 — exercita o
    // phase-flip condicional do unexpose
    for seed in 0..8 {
        let results = run_ranks(2, seed, CommStrategy::Telegate, |comm| {
            if comm.rank() == 0 {
                let q = Qubit::new(comm.connection()).unwrap();
                q.h();
                comm.expose(vec![q], 0).unwrap();
                let mut returned = comm.unexpose(0).unwrap();
                let q = returned.pop().unwrap();
                q.h();
                measure_all(comm, vec![q])
            } else {
                comm.expose(Vec::new(), 0).unwrap();
                comm.unexpose(0).unwrap();
                Vec::new()
            }
        });
        assert_eq!(results[0], vec![0], "seed {seed}");
    }
}

#[test]
fn test_exposure_session_blocks_other_primitives() {
    let results = run_ranks(2, 5, CommStrategy::Telegate, |comm| {
        let qubits = if comm.rank() == 0 {
            prepare_bits(comm, &[1])
        } else {
            Vec::new()
        };
        comm.expose(qubits, 0).unwrap();

        // Qualquer outra primitiva durante a sessão é violação fatal
        let scatter_blocked = matches!(
            comm.qscatter(Vec::new(), 0, 0),
            Err(CommError::SessionActive)
        );
        let expose_blocked = matches!(
            comm.expose(Vec::new(), 0),
            Err(CommError::SessionActive)
        );
        let send_blocked = matches!(
            comm.qsend(Vec::new(), comm.next_rank(comm.rank())),
            Err(CommError::SessionActive)
        );

        let returned = comm.unexpose(0).unwrap();
        let bits = measure_all(comm, returned);
        (scatter_blocked && expose_blocked && send_blocked, bits)
    });
    assert!(results[0].0);
    assert!(results[1].0);
    assert_eq!(results[0].1, vec![1]);
}

#[test]
fn test_unexpose_without_session_rejected() {
    let results = run_ranks(2, 0, CommStrategy::Telegate, |comm| {
        matches!(comm.unexpose(0), Err(CommError::NoSession))
    });
    assert!(results.iter().all(|&ok| ok));
}

#[test]
fn test_unexpose_wrong_exposer_rejected() {
    let results = run_ranks(2, 2, CommStrategy::Telegate, |comm| {
        let qubits = if comm.rank() == 0 {
            prepare_bits(comm, &[0])
        } else {
            Vec::new()
        };
        comm.expose(qubits, 0).unwrap();
        let wrong = matches!(
            comm.unexpose(1),
            Err(CommError::WrongExposer {
                active: 0,
                requested: 1
            })
        );
        // A sessão acabou junto com a chamada, mesmo errada
        wrong && !comm.session_active()
    });
    assert!(results.iter().all(|&ok| ok));
}

#[test]
fn test_expose_with_no_units_rejected() {
    // Só o expositor participa: o erro dispara antes de tocar a rede
    let results = run_ranks(2, 0, CommStrategy::Telegate, |comm| {
        if comm.rank() == 0 {
            matches!(comm.expose(Vec::new(), 0), Err(CommError::NothingToExpose))
        } else {
            true
        }
    });
    assert!(results.iter().all(|&ok| ok));
}

#[test]
fn test_expose_three_ranks_session_shape() {
    // Grupos maiores: shares prependadas nos não expositores e
    // simetria expose/unexpose das listas de sessão
    for seed in 0..4 {
        let results = run_ranks(3, seed, CommStrategy::Telegate, |comm| {
            let qubits = if comm.rank() == 1 {
                prepare_bits(comm, &[1, 0])
            } else {
                prepare_bits(comm, &[0])
            };
            comm.expose(qubits, 1).unwrap();

            // Expositor: as 2 unidades passadas; demais: share + 1 local
            let during = comm.exposed().len();
            let returned = comm.unexpose(1).unwrap();
            let after = comm.exposed().len();
            (during, returned.len(), after)
        });
        assert_eq!(results[0], (2, 1, 0), "seed {seed}");
        assert_eq!(results[1], (2, 2, 0), "seed {seed}");
        assert_eq!(results[2], (2, 1, 0), "seed {seed}");
    }
}

// ---------------------------------------------------------------------
// Registro e construção
// ---------------------------------------------------------------------

#[test]
fn test_registry_caches_channels() {
    let network = Arc::new(QuantumNetwork::with_seed(2, 0));
    let mut comm = QmpiCommunicator::new(
        0,
        2,
        AppConfig::named("rank_0"),
        CommStrategy::Teledata,
        network,
    )
    .unwrap();

    assert_eq!(comm.registry.open_count(), 0);
    let peer = comm.registry.channels(1).unwrap().1.peer();
    assert_eq!(peer, 1);
    assert_eq!(comm.registry.open_count(), 1);

    // Segunda chamada devolve as mesmas instâncias, sem realocar
    let peer = comm.registry.channels(1).unwrap().1.peer();
    assert_eq!(peer, 1);
    assert_eq!(comm.registry.open_count(), 1);
}

#[test]
fn test_communicator_rejects_bad_construction() {
    let network = Arc::new(QuantumNetwork::with_seed(2, 0));
    assert!(matches!(
        QmpiCommunicator::new(
            2,
            2,
            AppConfig::default(),
            CommStrategy::Teledata,
            network.clone()
        ),
        Err(CommError::InvalidRank { rank: 2, size: 2 })
    ));
    assert!(matches!(
        QmpiCommunicator::new(
            0,
            3,
            AppConfig::default(),
            CommStrategy::Teledata,
            network
        ),
        Err(CommError::SizeMismatch { comm: 3, net: 2 })
    ));
}

#[test]
fn test_rank_neighbors_wrap_around() {
    let network = Arc::new(QuantumNetwork::with_seed(4, 0));
    let comm = QmpiCommunicator::new(
        0,
        4,
        AppConfig::named("rank_0"),
        CommStrategy::Teledata,
        network,
    )
    .unwrap();
    assert_eq!(comm.next_rank(3), 0);
    assert_eq!(comm.prev_rank(0), 3);
    assert_eq!(comm.next_rank(1), 2);
    assert_eq!(comm.prev_rank(2), 1);
}
