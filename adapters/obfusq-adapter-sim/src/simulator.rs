//! Simulator backend implementation.

use async_trait::async_trait;
use rand::SeedableRng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, instrument};
use uuid::Uuid;

use obfusq_hal::{
    Backend, Capabilities, Counts, ExecutionResult, HalError, HalResult, Job, JobId, JobStatus,
};
use obfusq_ir::{Circuit, ClbitId, GateKind, Instruction, InstructionKind};

use crate::statevector::Statevector;

/// Job data for the simulator.
struct SimJob {
    job: Job,
    result: Option<ExecutionResult>,
}

/// Local simulator backend.
///
/// Programs whose measurements are all terminal are simulated once and the
/// final distribution is sampled per shot. Programs with mid-circuit
/// measurement or reset are re-simulated shot by shot with state collapse.
pub struct SimulatorBackend {
    /// Cached capabilities.
    capabilities: Capabilities,
    /// Submitted jobs.
    jobs: Arc<Mutex<FxHashMap<String, SimJob>>>,
    /// Fixed seed; every execution restarts from it when set.
    seed: Option<u64>,
}

impl SimulatorBackend {
    /// Create a new simulator backend with default settings.
    pub fn new() -> Self {
        Self::with_max_qubits(20)
    }

    /// Create a simulator with custom max qubits.
    pub fn with_max_qubits(max_qubits: u32) -> Self {
        Self {
            capabilities: Capabilities::simulator(max_qubits),
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            seed: None,
        }
    }

    /// Create a simulator whose every execution is reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::new()
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Run simulation synchronously.
    #[instrument(skip(self, circuit), fields(circuit = circuit.name()))]
    fn run_simulation(&self, circuit: &Circuit, shots: u32) -> HalResult<ExecutionResult> {
        let start = Instant::now();
        let mut rng = self.rng();

        let counts = if has_terminal_measurements(circuit) {
            debug!(
                "Sampling final distribution: {} qubits, {} shots",
                circuit.num_qubits(),
                shots
            );
            sample_final_state(circuit, shots, &mut rng)?
        } else {
            debug!(
                "Collapsing per shot: {} qubits, {} shots",
                circuit.num_qubits(),
                shots
            );
            (0..shots)
                .map(|_| (run_shot(circuit, &mut rng), 1))
                .collect()
        };

        let elapsed = start.elapsed();
        debug!("Simulation completed in {:?}", elapsed);

        Ok(ExecutionResult::new(counts, shots).with_execution_time(elapsed.as_millis() as u64))
    }

    /// Jobs whose outcome has not been collected yet.
    pub fn tracked_jobs(&self) -> usize {
        self.lock_jobs().len()
    }

    fn lock_jobs(&self) -> std::sync::MutexGuard<'_, FxHashMap<String, SimJob>> {
        self.jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// True when no gate or reset follows any measurement.
fn has_terminal_measurements(circuit: &Circuit) -> bool {
    let mut measured = false;
    for inst in circuit.instructions() {
        match inst.kind {
            InstructionKind::Measure => measured = true,
            InstructionKind::Reset => return false,
            InstructionKind::Gate(_) if measured => return false,
            InstructionKind::Gate(_) | InstructionKind::Barrier => {}
        }
    }
    true
}

/// Render a classical register with bit 0 as the leftmost character.
fn bitstring(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}

fn record(bits: &mut [bool], clbit: ClbitId, value: bool) {
    bits[clbit.index()] = value;
}

fn sample_final_state(circuit: &Circuit, shots: u32, rng: &mut StdRng) -> HalResult<Counts> {
    let mut sv = Statevector::new(circuit.num_qubits());
    sv.apply_unitary(circuit.instructions());

    let wiring: Vec<(usize, ClbitId)> = circuit
        .measurements()
        .flat_map(|m| m.qubits.iter().map(|q| q.index()).zip(m.clbits.iter().copied()))
        .collect();

    let dist = WeightedIndex::new(sv.probabilities())
        .map_err(|e| HalError::Backend(format!("degenerate statevector: {e}")))?;

    let mut tally: FxHashMap<usize, u64> = FxHashMap::default();
    for _ in 0..shots {
        *tally.entry(dist.sample(rng)).or_insert(0) += 1;
    }

    let mut counts = Counts::new();
    for (outcome, n) in tally {
        let mut bits = vec![false; circuit.num_clbits()];
        for &(qubit, clbit) in &wiring {
            record(&mut bits, clbit, (outcome >> qubit) & 1 == 1);
        }
        counts.insert(bitstring(&bits), n);
    }
    Ok(counts)
}

fn run_shot(circuit: &Circuit, rng: &mut StdRng) -> String {
    let mut sv = Statevector::new(circuit.num_qubits());
    let mut bits = vec![false; circuit.num_clbits()];

    for inst in circuit.instructions() {
        match &inst.kind {
            InstructionKind::Gate(gate) => apply(&mut sv, &gate.kind, inst),
            InstructionKind::Measure => {
                for (q, c) in inst.qubits.iter().zip(&inst.clbits) {
                    let value = sv.measure(q.index(), rng);
                    record(&mut bits, *c, value);
                }
            }
            InstructionKind::Reset => {
                for q in &inst.qubits {
                    sv.reset(q.index(), rng);
                }
            }
            InstructionKind::Barrier => {}
        }
    }

    bitstring(&bits)
}

fn apply(sv: &mut Statevector, gate: &GateKind, inst: &Instruction) {
    let qubits: Vec<usize> = inst.qubits.iter().map(|q| q.index()).collect();
    sv.apply_gate(gate, &qubits);
}

/// Name of the first gate with an unbound symbolic angle, if any.
fn find_symbolic(instructions: &[Instruction]) -> Option<String> {
    instructions.iter().find_map(|inst| match &inst.as_gate()?.kind {
        GateKind::Standard(g) => g
            .parameters()
            .iter()
            .any(|p| p.as_f64().is_none())
            .then(|| g.name().to_string()),
        GateKind::Composite(unit) => find_symbolic(&unit.body),
    })
}

#[async_trait]
impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.capabilities.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn validate(&self, circuit: &Circuit, shots: u32) -> HalResult<()> {
        self.capabilities.check(circuit, shots)?;
        if let Some(gate) = find_symbolic(circuit.instructions()) {
            return Err(HalError::Unsupported(format!(
                "gate '{gate}' has an unbound symbolic parameter"
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, circuit))]
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId> {
        let job_id = JobId::new(Uuid::new_v4().to_string());
        let job = Job::new(job_id.clone(), shots, self.name());

        self.lock_jobs().insert(
            job_id.0.clone(),
            SimJob { job, result: None },
        );

        debug!("Submitted job: {}", job_id);

        let outcome = self.run_simulation(circuit, shots);

        let mut jobs = self.lock_jobs();
        if let Some(sim_job) = jobs.get_mut(&job_id.0) {
            match outcome {
                Ok(result) => {
                    sim_job.result = Some(result);
                    sim_job.job.transition(JobStatus::Completed);
                }
                Err(e) => sim_job.job.transition(JobStatus::Failed(e.to_string())),
            }
        }

        Ok(job_id)
    }

    /// A failed job is forgotten once its status has been reported.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let mut jobs = self.lock_jobs();
        let status = jobs
            .get(&job_id.0)
            .map(|j| j.job.status.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        if matches!(status, JobStatus::Failed(_)) {
            jobs.remove(&job_id.0);
        }
        Ok(status)
    }

    /// A completed job is forgotten once its result has been read.
    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let mut jobs = self.lock_jobs();
        match jobs.get(&job_id.0).map(|j| j.result.is_some()) {
            Some(true) => jobs
                .remove(&job_id.0)
                .and_then(|j| j.result)
                .ok_or_else(|| HalError::JobNotFound(job_id.0.clone())),
            Some(false) => Err(HalError::Backend(format!("job {job_id} has no result"))),
            None => Err(HalError::JobNotFound(job_id.0.clone())),
        }
    }
}
