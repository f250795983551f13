//! Conexão quântica por rank — fila de operações com flush explícito
//!
//! Toda porta e medição é enfileirada; nada executa até `flush()`.
//! Depois do flush as operações terão sido aplicadas ao simulador na
//! ordem de submissão e os resultados de medição ficam disponíveis.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::sim::StateVector;

/// Configuração de aplicação, opaca para a camada de protocolo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Nome da aplicação (identifica o rank na conexão)
    pub app_name: String,
}

impl AppConfig {
    /// Configuração com o nome dado
    pub fn named(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "qmpi".to_string(),
        }
    }
}

/// Operação enfileirada
enum Op {
    H(u64),
    X(u64),
    Z(u64),
    Cnot(u64, u64),
    Measure(u64, Arc<OnceLock<u8>>),
}

struct ConnInner {
    app_name: String,
    sim: Arc<Mutex<StateVector>>,
    queue: RefCell<VecDeque<Op>>,
}

/// Conexão de um rank com o backplane quântico
///
/// Handle barato de clonar (Rc interno). Não é `Send`: qubits e a fila
/// de operações pertencem à thread do rank; só o estado simulado é
/// compartilhado entre processos.
#[derive(Clone)]
pub struct QuantumConnection {
    inner: Rc<ConnInner>,
}

impl QuantumConnection {
    pub(crate) fn new(sim: Arc<Mutex<StateVector>>, config: &AppConfig) -> Self {
        Self {
            inner: Rc::new(ConnInner {
                app_name: config.app_name.clone(),
                sim,
                queue: RefCell::new(VecDeque::new()),
            }),
        }
    }

    /// Nome da aplicação dona da conexão
    pub fn app_name(&self) -> &str {
        &self.inner.app_name
    }

    /// Operações ainda não executadas
    pub fn pending_ops(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    fn enqueue(&self, op: Op) {
        self.inner.queue.borrow_mut().push_back(op);
    }

    pub(crate) fn lock_sim(&self) -> CoreResult<MutexGuard<'_, StateVector>> {
        self.inner
            .sim
            .lock()
            .map_err(|_| CoreError::Backend("simulator lock poisoned".to_string()))
    }

    /// Força a execução de todas as operações enfileiradas
    ///
    /// Erros de execução (qubit inválido, por exemplo) abortam o flush
    /// na operação ofensora; as anteriores já terão sido aplicadas.
    pub fn flush(&self) -> CoreResult<()> {
        let ops: Vec<Op> = self.inner.queue.borrow_mut().drain(..).collect();
        if ops.is_empty() {
            return Ok(());
        }
        let mut sim = self.lock_sim()?;
        for op in ops {
            match op {
                Op::H(q) => sim.h(q)?,
                Op::X(q) => sim.x(q)?,
                Op::Z(q) => sim.z(q)?,
                Op::Cnot(c, t) => sim.cnot(c, t)?,
                Op::Measure(q, slot) => {
                    let outcome = sim.measure(q)?;
                    let _ = slot.set(outcome);
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for QuantumConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuantumConnection")
            .field("app_name", &self.inner.app_name)
            .field("pending_ops", &self.pending_ops())
            .finish()
    }
}

/// Unidade de estado quântico
///
/// Handle opaco e intransferível entre threads; não implementa `Clone`,
/// então cada qubit tem exatamente um dono. Medir consome o handle —
/// teleportar destrói a origem por construção.
#[derive(Debug)]
pub struct Qubit {
    id: u64,
    conn: QuantumConnection,
}

impl Qubit {
    /// Aloca um qubit novo em |0⟩
    pub fn new(conn: &QuantumConnection) -> CoreResult<Self> {
        let id = conn.lock_sim()?.alloc();
        Ok(Self {
            id,
            conn: conn.clone(),
        })
    }

    pub(crate) fn from_id(id: u64, conn: &QuantumConnection) -> Self {
        Self {
            id,
            conn: conn.clone(),
        }
    }

    /// Id global do qubit no simulador
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Enfileira uma porta Hadamard
    pub fn h(&self) {
        self.conn.enqueue(Op::H(self.id));
    }

    /// Enfileira uma porta X
    pub fn x(&self) {
        self.conn.enqueue(Op::X(self.id));
    }

    /// Enfileira uma porta Z
    pub fn z(&self) {
        self.conn.enqueue(Op::Z(self.id));
    }

    /// Enfileira um CNOT deste qubit (controle) sobre `target`
    pub fn cnot(&self, target: &Qubit) {
        self.conn.enqueue(Op::Cnot(self.id, target.id));
    }

    /// Enfileira a medição na base computacional, consumindo o handle
    ///
    /// O resultado só fica disponível depois do próximo `flush()`.
    pub fn measure(self) -> Measurement {
        let slot = Arc::new(OnceLock::new());
        self.conn.enqueue(Op::Measure(self.id, slot.clone()));
        Measurement { slot }
    }
}

/// Resultado pendente de uma medição
#[derive(Debug, Clone)]
pub struct Measurement {
    slot: Arc<OnceLock<u8>>,
}

impl Measurement {
    /// Valor medido (0 ou 1); erro se a conexão ainda não fez flush
    pub fn value(&self) -> CoreResult<u8> {
        self.slot
            .get()
            .copied()
            .ok_or(CoreError::PendingMeasurement)
    }
}
