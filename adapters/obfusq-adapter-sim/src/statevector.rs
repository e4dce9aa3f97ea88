//! Statevector simulation engine.
//!
//! Amplitude index bit `q` holds the value of qubit `q`. Every standard gate
//! reduces to one of two kernels: a (multi-)controlled 2x2 matrix on a
//! target, or a (controlled) swap of two qubits.

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, FRAC_PI_4};

use num_complex::Complex64;
use rand::Rng;

use obfusq_ir::{GateKind, Instruction, InstructionKind, QubitId, StandardGate};

type Matrix2 = [[Complex64; 2]; 2];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

/// A pure quantum state over `num_qubits` qubits.
#[derive(Debug, Clone, PartialEq)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let mut amplitudes = vec![ZERO; 1 << num_qubits];
        amplitudes[0] = ONE;
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Draw a normalized state with uniformly random real and imaginary
    /// parts before normalization.
    pub fn random<R: Rng + ?Sized>(num_qubits: usize, rng: &mut R) -> Self {
        let mut amplitudes: Vec<Complex64> = (0..1 << num_qubits)
            .map(|_| Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect();
        let norm = amplitudes.iter().map(Complex64::norm_sqr).sum::<f64>().sqrt();
        if norm > 0.0 {
            for amp in &mut amplitudes {
                *amp /= norm;
            }
        } else {
            amplitudes[0] = ONE;
        }
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The raw amplitudes.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Probability of every computational basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(Complex64::norm_sqr).collect()
    }

    /// Magnitude of the inner product `|⟨self|other⟩|`.
    ///
    /// Returns 0 for states of different size.
    pub fn overlap(&self, other: &Statevector) -> f64 {
        if self.amplitudes.len() != other.amplitudes.len() {
            return 0.0;
        }
        self.amplitudes
            .iter()
            .zip(&other.amplitudes)
            .map(|(a, b)| a.conj() * b)
            .sum::<Complex64>()
            .norm()
    }

    /// Check if two states differ at most by a global phase.
    pub fn equal_up_to_phase(&self, other: &Statevector, tolerance: f64) -> bool {
        (1.0 - self.overlap(other)).abs() < tolerance
    }

    /// Apply every unitary instruction of a run in order.
    ///
    /// Measurement and reset are skipped; use [`Statevector::measure`] and
    /// [`Statevector::reset`] for those.
    pub fn apply_unitary(&mut self, instructions: &[Instruction]) {
        for inst in instructions {
            if let InstructionKind::Gate(gate) = &inst.kind {
                let qubits: Vec<usize> = inst.qubits.iter().map(|q| q.index()).collect();
                self.apply_gate(&gate.kind, &qubits);
            }
        }
    }

    /// Apply a gate to specific qubits.
    pub fn apply_gate(&mut self, gate: &GateKind, qubits: &[usize]) {
        match gate {
            GateKind::Standard(std_gate) => self.apply_standard_gate(std_gate, qubits),
            GateKind::Composite(unit) => {
                let operands: Vec<QubitId> = qubits.iter().map(|&q| QubitId(q as u32)).collect();
                self.apply_unitary(&unit.expand(&operands));
            }
        }
    }

    /// Apply a standard gate.
    ///
    /// Rotations with unbound symbolic angles have no numeric value and are
    /// left unapplied; backends reject them before simulation.
    fn apply_standard_gate(&mut self, gate: &StandardGate, qubits: &[usize]) {
        let bit = |i: usize| 1usize << qubits[i];

        match gate {
            StandardGate::I => {}
            StandardGate::Swap => self.apply_swap(0, qubits[0], qubits[1]),
            StandardGate::CSwap => self.apply_swap(bit(0), qubits[1], qubits[2]),
            StandardGate::CCX => self.apply_matrix(bit(0) | bit(1), qubits[2], &pauli_x()),
            g if g.num_qubits() == 2 => {
                if let Some(m) = controlled_target(g) {
                    self.apply_matrix(bit(0), qubits[1], &m);
                }
            }
            g => {
                if let Some(m) = single_qubit_matrix(g) {
                    self.apply_matrix(0, qubits[0], &m);
                }
            }
        }
    }

    /// Apply `m` to `target` on every basis state whose `controls` bits are
    /// all set.
    fn apply_matrix(&mut self, controls: usize, target: usize, m: &Matrix2) {
        let tmask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if i & tmask != 0 || i & controls != controls {
                continue;
            }
            let j = i | tmask;
            let (a, b) = (self.amplitudes[i], self.amplitudes[j]);
            self.amplitudes[i] = m[0][0] * a + m[0][1] * b;
            self.amplitudes[j] = m[1][0] * a + m[1][1] * b;
        }
    }

    /// Exchange qubits `q1` and `q2` on every basis state whose `controls`
    /// bits are all set.
    fn apply_swap(&mut self, controls: usize, q1: usize, q2: usize) {
        let (m1, m2) = (1 << q1, 1 << q2);
        for i in 0..self.amplitudes.len() {
            if i & controls == controls && i & m1 != 0 && i & m2 == 0 {
                let j = (i & !m1) | m2;
                self.amplitudes.swap(i, j);
            }
        }
    }

    /// Projectively measure a qubit, collapsing the state.
    pub fn measure<R: Rng + ?Sized>(&mut self, qubit: usize, rng: &mut R) -> bool {
        let mask = 1 << qubit;
        let p_one: f64 = self
            .amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum();

        let outcome = rng.r#gen::<f64>() < p_one;
        let kept = if outcome { p_one } else { 1.0 - p_one };
        let scale = if kept > 0.0 { 1.0 / kept.sqrt() } else { 0.0 };

        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if (i & mask != 0) == outcome {
                *amp *= scale;
            } else {
                *amp = ZERO;
            }
        }
        outcome
    }

    /// Reset a qubit to |0⟩ by measuring it and flipping a one.
    pub fn reset<R: Rng + ?Sized>(&mut self, qubit: usize, rng: &mut R) {
        if self.measure(qubit, rng) {
            self.apply_matrix(0, qubit, &pauli_x());
        }
    }
}

fn pauli_x() -> Matrix2 {
    [[ZERO, ONE], [ONE, ZERO]]
}

fn diagonal(phase: f64) -> Matrix2 {
    [[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, phase)]]
}

/// Matrix of a single-qubit gate, `None` for unbound angles.
fn single_qubit_matrix(gate: &StandardGate) -> Option<Matrix2> {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    let m = match gate {
        StandardGate::I => [[ONE, ZERO], [ZERO, ONE]],
        StandardGate::X => pauli_x(),
        StandardGate::Y => [[ZERO, -I], [I, ZERO]],
        StandardGate::Z => [[ONE, ZERO], [ZERO, -ONE]],
        StandardGate::H => [[h, h], [h, -h]],
        StandardGate::S => diagonal(FRAC_PI_2),
        StandardGate::Sdg => diagonal(-FRAC_PI_2),
        StandardGate::T => diagonal(FRAC_PI_4),
        StandardGate::Tdg => diagonal(-FRAC_PI_4),
        StandardGate::SX => {
            let (p, q) = (Complex64::new(0.5, 0.5), Complex64::new(0.5, -0.5));
            [[p, q], [q, p]]
        }
        StandardGate::SXdg => {
            let (p, q) = (Complex64::new(0.5, -0.5), Complex64::new(0.5, 0.5));
            [[p, q], [q, p]]
        }
        StandardGate::Rx(theta) => {
            let t = theta.as_f64()?;
            let (c, s) = (Complex64::from((t / 2.0).cos()), (t / 2.0).sin());
            let mis = Complex64::new(0.0, -s);
            [[c, mis], [mis, c]]
        }
        StandardGate::Ry(theta) => {
            let t = theta.as_f64()?;
            let (c, s) = ((t / 2.0).cos(), (t / 2.0).sin());
            [
                [Complex64::from(c), Complex64::from(-s)],
                [Complex64::from(s), Complex64::from(c)],
            ]
        }
        StandardGate::Rz(theta) => {
            let t = theta.as_f64()?;
            [
                [Complex64::from_polar(1.0, -t / 2.0), ZERO],
                [ZERO, Complex64::from_polar(1.0, t / 2.0)],
            ]
        }
        StandardGate::P(theta) => diagonal(theta.as_f64()?),
        StandardGate::U(theta, phi, lambda) => {
            let (t, p, l) = (theta.as_f64()?, phi.as_f64()?, lambda.as_f64()?);
            let (c, s) = ((t / 2.0).cos(), (t / 2.0).sin());
            [
                [Complex64::from(c), -Complex64::from_polar(s, l)],
                [Complex64::from_polar(s, p), Complex64::from_polar(c, p + l)],
            ]
        }
        _ => return None,
    };
    Some(m)
}

/// Target matrix of a singly-controlled two-qubit gate.
fn controlled_target(gate: &StandardGate) -> Option<Matrix2> {
    match gate {
        StandardGate::CX => Some(pauli_x()),
        StandardGate::CY => single_qubit_matrix(&StandardGate::Y),
        StandardGate::CZ => single_qubit_matrix(&StandardGate::Z),
        StandardGate::CH => single_qubit_matrix(&StandardGate::H),
        StandardGate::CRz(theta) => single_qubit_matrix(&StandardGate::Rz(theta.clone())),
        StandardGate::CP(theta) => Some(diagonal(theta.as_f64()?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obfusq_ir::ParameterExpression;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::f64::consts::PI;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    fn apply(sv: &mut Statevector, gate: StandardGate, qubits: &[usize]) {
        sv.apply_gate(&GateKind::Standard(gate), qubits);
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2);
        assert!(approx_eq(sv.amplitudes()[0], ONE));
        assert!(sv.amplitudes()[1..].iter().all(|a| approx_eq(*a, ZERO)));
    }

    #[test]
    fn test_bell_state() {
        let mut sv = Statevector::new(2);
        apply(&mut sv, StandardGate::H, &[0]);
        apply(&mut sv, StandardGate::CX, &[0, 1]);

        let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
        assert!(approx_eq(sv.amplitudes()[0], h));
        assert!(approx_eq(sv.amplitudes()[1], ZERO));
        assert!(approx_eq(sv.amplitudes()[2], ZERO));
        assert!(approx_eq(sv.amplitudes()[3], h));
    }

    #[test]
    fn test_cx_respects_control_and_target() {
        // |q1 q0⟩ = |01⟩: control q0 set, so target q1 flips.
        let mut sv = Statevector::new(2);
        apply(&mut sv, StandardGate::X, &[0]);
        apply(&mut sv, StandardGate::CX, &[0, 1]);
        assert!(approx_eq(sv.amplitudes()[3], ONE));

        // Control q1 clear: nothing happens.
        let mut sv = Statevector::new(2);
        apply(&mut sv, StandardGate::X, &[0]);
        apply(&mut sv, StandardGate::CX, &[1, 0]);
        assert!(approx_eq(sv.amplitudes()[1], ONE));
    }

    #[test]
    fn test_toffoli_and_fredkin() {
        let mut sv = Statevector::new(3);
        apply(&mut sv, StandardGate::X, &[0]);
        apply(&mut sv, StandardGate::X, &[1]);
        apply(&mut sv, StandardGate::CCX, &[0, 1, 2]);
        assert!(approx_eq(sv.amplitudes()[0b111], ONE));

        apply(&mut sv, StandardGate::X, &[1]);
        apply(&mut sv, StandardGate::CSwap, &[0, 1, 2]);
        assert!(approx_eq(sv.amplitudes()[0b011], ONE));
    }

    #[test]
    fn test_sx_squares_to_x() {
        let mut a = Statevector::new(1);
        apply(&mut a, StandardGate::SX, &[0]);
        apply(&mut a, StandardGate::SX, &[0]);
        assert!(approx_eq(a.amplitudes()[1], ONE));

        apply(&mut a, StandardGate::SXdg, &[0]);
        apply(&mut a, StandardGate::SXdg, &[0]);
        assert!(approx_eq(a.amplitudes()[0], ONE));
    }

    #[test]
    fn test_u_matches_named_gates() {
        let mut rng = StdRng::seed_from_u64(3);
        let start = Statevector::random(1, &mut rng);

        let mut via_u = start.clone();
        apply(
            &mut via_u,
            StandardGate::U(
                ParameterExpression::constant(PI / 2.0),
                ParameterExpression::constant(0.0),
                ParameterExpression::constant(PI),
            ),
            &[0],
        );
        let mut via_h = start;
        apply(&mut via_h, StandardGate::H, &[0]);

        assert!(via_u.equal_up_to_phase(&via_h, 1e-9));
    }

    #[test]
    fn test_global_phase_is_ignored() {
        let mut rng = StdRng::seed_from_u64(11);
        let start = Statevector::random(2, &mut rng);

        // Z·X·Z·X = -I
        let mut phased = start.clone();
        for g in [StandardGate::X, StandardGate::Z, StandardGate::X, StandardGate::Z] {
            apply(&mut phased, g, &[1]);
        }
        assert!(phased.equal_up_to_phase(&start, 1e-9));

        let mut flipped = start.clone();
        apply(&mut flipped, StandardGate::H, &[0]);
        assert!(!flipped.equal_up_to_phase(&start, 1e-6));
    }

    #[test]
    fn test_symbolic_rotation_is_skipped() {
        let mut sv = Statevector::new(1);
        apply(&mut sv, StandardGate::Rx(ParameterExpression::symbol("theta")), &[0]);
        assert!(approx_eq(sv.amplitudes()[0], ONE));
    }

    #[test]
    fn test_measure_collapses() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            let mut sv = Statevector::new(2);
            apply(&mut sv, StandardGate::H, &[0]);
            apply(&mut sv, StandardGate::CX, &[0, 1]);

            let first = sv.measure(0, &mut rng);
            let second = sv.measure(1, &mut rng);
            assert_eq!(first, second);
            let total: f64 = sv.probabilities().iter().sum();
            assert!((total - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_measure_is_deterministic_on_basis_states() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut sv = Statevector::new(1);
        apply(&mut sv, StandardGate::X, &[0]);
        for _ in 0..50 {
            assert!(sv.measure(0, &mut rng));
        }
    }

    #[test]
    fn test_reset_returns_to_zero() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..10 {
            let mut sv = Statevector::new(2);
            apply(&mut sv, StandardGate::H, &[1]);
            sv.reset(1, &mut rng);
            assert!((sv.probabilities()[0] - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_random_state_is_normalized() {
        let mut rng = StdRng::seed_from_u64(42);
        let sv = Statevector::random(3, &mut rng);
        let total: f64 = sv.probabilities().iter().sum();
        assert!((total - 1.0).abs() < 1e-10);
        assert!((sv.overlap(&sv) - 1.0).abs() < 1e-10);
    }
}
