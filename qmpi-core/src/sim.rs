//! Simulador de vetor de estado compartilhado
//!
//! Um único vetor de amplitudes cobre todos os qubits vivos de todos os
//! ranks, pois pares EPR e cadeias GHZ emaranham qubits de processos
//! diferentes. Cada qubit recebe um id global; a posição do id na lista
//! `ids` define o bit correspondente no índice de amplitude.
//!
//! A medição colapsa o estado e fatora o qubit medido para fora do
//! vetor, mantendo a dimensão proporcional apenas aos qubits vivos.

use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{CoreError, CoreResult};

const FRAC_1_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Vetor de estado com alocação dinâmica de qubits
#[derive(Debug)]
pub struct StateVector {
    /// Ids globais dos qubits vivos; a posição define o bit do índice
    ids: Vec<u64>,
    /// Amplitudes (comprimento 2^ids.len())
    amps: Vec<Complex64>,
    /// Próximo id global
    next_id: u64,
    /// Amostragem de medições
    rng: StdRng,
}

impl StateVector {
    /// Cria simulador com semente de entropia do sistema
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Cria simulador determinístico a partir de uma semente
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            ids: Vec::new(),
            amps: vec![Complex64::new(1.0, 0.0)],
            next_id: 0,
            rng,
        }
    }

    /// Número de qubits vivos
    pub fn qubit_count(&self) -> usize {
        self.ids.len()
    }

    /// Aloca um qubit novo em |0⟩ e retorna seu id global
    pub fn alloc(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.ids.push(id);
        // Produto tensorial com |0⟩: amplitudes existentes ficam na
        // metade em que o novo bit é 0
        self.amps.resize(self.amps.len() * 2, Complex64::new(0.0, 0.0));
        id
    }

    fn slot(&self, id: u64) -> CoreResult<usize> {
        self.ids
            .iter()
            .position(|&q| q == id)
            .ok_or(CoreError::InvalidQubit(id))
    }

    /// Porta Hadamard
    pub fn h(&mut self, id: u64) -> CoreResult<()> {
        let mask = 1usize << self.slot(id)?;
        for i in 0..self.amps.len() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amps[i];
                let b = self.amps[j];
                self.amps[i] = (a + b) * FRAC_1_SQRT_2;
                self.amps[j] = (a - b) * FRAC_1_SQRT_2;
            }
        }
        Ok(())
    }

    /// Porta X (bit-flip)
    pub fn x(&mut self, id: u64) -> CoreResult<()> {
        let mask = 1usize << self.slot(id)?;
        for i in 0..self.amps.len() {
            if i & mask == 0 {
                self.amps.swap(i, i | mask);
            }
        }
        Ok(())
    }

    /// Porta Z (phase-flip)
    pub fn z(&mut self, id: u64) -> CoreResult<()> {
        let mask = 1usize << self.slot(id)?;
        for i in 0..self.amps.len() {
            if i & mask != 0 {
                self.amps[i] = -self.amps[i];
            }
        }
        Ok(())
    }

    /// CNOT com `control` controlando `target`
    pub fn cnot(&mut self, control: u64, target: u64) -> CoreResult<()> {
        let cmask = 1usize << self.slot(control)?;
        let tmask = 1usize << self.slot(target)?;
        if cmask == tmask {
            return Err(CoreError::Backend(format!(
                "cnot with identical control and target qubit {control}"
            )));
        }
        for i in 0..self.amps.len() {
            if i & cmask != 0 && i & tmask == 0 {
                self.amps.swap(i, i | tmask);
            }
        }
        Ok(())
    }

    /// Probabilidade de medir |1⟩ no qubit dado
    pub fn prob_one(&self, id: u64) -> CoreResult<f64> {
        let mask = 1usize << self.slot(id)?;
        Ok(self
            .amps
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum())
    }

    /// Mede o qubit na base computacional, colapsa o estado e remove o
    /// qubit do vetor
    pub fn measure(&mut self, id: u64) -> CoreResult<u8> {
        let k = self.slot(id)?;
        let mask = 1usize << k;
        let p_one = self.prob_one(id)?;
        let outcome = self.rng.gen_bool(p_one.clamp(0.0, 1.0));

        let kept = if outcome { p_one } else { 1.0 - p_one };
        if kept <= f64::EPSILON {
            return Err(CoreError::Backend(format!(
                "measurement of qubit {id} collapsed onto a zero-probability branch"
            )));
        }
        let norm = kept.sqrt();

        // Projeta no resultado e fatora o bit k para fora do índice
        let low = mask - 1;
        let mut next = vec![Complex64::new(0.0, 0.0); self.amps.len() / 2];
        for (i, a) in self.amps.iter().enumerate() {
            if (i & mask != 0) == outcome {
                let j = (i & low) | ((i >> 1) & !low);
                next[j] = a / norm;
            }
        }
        self.amps = next;
        self.ids.remove(k);

        Ok(u8::from(outcome))
    }
}

impl Default for StateVector {
    fn default() -> Self {
        Self::new()
    }
}
