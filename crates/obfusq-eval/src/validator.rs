//! Validator: run both programs on a backend and compare their histograms.

use std::time::Instant;

use obfusq_hal::{Backend, Counts};
use obfusq_ir::Circuit;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::accuracy::semantic_accuracy;
use crate::error::EvalResult;

/// Default shots per run.
pub const DEFAULT_SHOTS: u32 = 1024;

/// Default number of trials per program.
pub const DEFAULT_TRIALS: u32 = 10;

/// Outcome of comparing a program with its obfuscated form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Backend the trials ran on.
    pub backend: String,
    /// Shots per run.
    pub shots: u32,
    /// Runs per program.
    pub trials: u32,
    /// Histogram of the original program from the final trial.
    pub original_counts: Counts,
    /// Histogram of the obfuscated program from the final trial.
    pub obfuscated_counts: Counts,
    /// Semantic accuracy in percent, scored on the final trial.
    pub accuracy: f64,
    /// Mean wall-clock time per original run, in milliseconds.
    pub original_latency_ms: f64,
    /// Mean wall-clock time per obfuscated run, in milliseconds.
    pub obfuscated_latency_ms: f64,
}

impl ValidationReport {
    /// Whether the accuracy reaches `threshold` percent.
    pub fn passes(&self, threshold: f64) -> bool {
        self.accuracy >= threshold
    }

    /// Extra latency of the obfuscated program, as a ratio of the original.
    pub fn latency_overhead(&self) -> Option<f64> {
        (self.original_latency_ms > 0.0)
            .then(|| self.obfuscated_latency_ms / self.original_latency_ms)
    }
}

/// Compares programs by executing them on a backend.
///
/// # Example
///
/// ```ignore
/// use obfusq_adapter_sim::SimulatorBackend;
/// use obfusq_eval::Validator;
///
/// let validator = Validator::new(SimulatorBackend::with_seed(1)).with_trials(3);
/// let report = validator.compare(&original, &obfuscated).await?;
/// assert!(report.passes(95.0));
/// ```
pub struct Validator<B: Backend> {
    backend: B,
    shots: u32,
    trials: u32,
}

impl<B: Backend> Validator<B> {
    /// A validator with 1024 shots and 10 trials.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            shots: DEFAULT_SHOTS,
            trials: DEFAULT_TRIALS,
        }
    }

    /// Set the shots per run.
    #[must_use]
    pub fn with_shots(mut self, shots: u32) -> Self {
        self.shots = shots;
        self
    }

    /// Set the runs per program. At least one trial is always made.
    #[must_use]
    pub fn with_trials(mut self, trials: u32) -> Self {
        self.trials = trials.max(1);
        self
    }

    /// The backend in use.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Shots per run.
    pub fn shots(&self) -> u32 {
        self.shots
    }

    /// Runs per program.
    pub fn trials(&self) -> u32 {
        self.trials
    }

    /// Run both programs `trials` times, one after the other, and score the
    /// final pair of histograms.
    #[instrument(skip_all, fields(backend = self.backend.name(), shots = self.shots, trials = self.trials))]
    pub async fn compare(
        &self,
        original: &Circuit,
        obfuscated: &Circuit,
    ) -> EvalResult<ValidationReport> {
        let mut original_total = 0.0;
        let mut obfuscated_total = 0.0;
        let mut original_counts = Counts::new();
        let mut obfuscated_counts = Counts::new();

        for trial in 1..=self.trials {
            let (counts, ms) = self.timed_run(original).await?;
            original_total += ms;
            original_counts = counts;

            let (counts, ms) = self.timed_run(obfuscated).await?;
            obfuscated_total += ms;
            obfuscated_counts = counts;

            debug!(trial, "trial complete");
        }

        let accuracy = semantic_accuracy(&original_counts, &obfuscated_counts);
        let report = ValidationReport {
            backend: self.backend.name().to_string(),
            shots: self.shots,
            trials: self.trials,
            original_counts,
            obfuscated_counts,
            accuracy,
            original_latency_ms: original_total / f64::from(self.trials),
            obfuscated_latency_ms: obfuscated_total / f64::from(self.trials),
        };

        info!(
            accuracy = report.accuracy,
            original_ms = report.original_latency_ms,
            obfuscated_ms = report.obfuscated_latency_ms,
            "validation complete"
        );
        Ok(report)
    }

    async fn timed_run(&self, circuit: &Circuit) -> EvalResult<(Counts, f64)> {
        let start = Instant::now();
        let result = self.backend.execute(circuit, self.shots).await?;
        let elapsed = start.elapsed().as_secs_f64() * 1000.0;
        Ok((result.counts, elapsed))
    }
}
