//! The obfuscation driver.

use std::sync::Arc;

use obfusq_ir::Circuit;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::boundary::verify_boundary;
use crate::config::ObfuscatorConfig;
use crate::error::ObfResult;
use crate::library::EquivalenceLibrary;
use crate::strategy::{Strategy, StrategyOptions};

/// Runs one strategy over programs, owning the random source.
///
/// # Example
///
/// ```rust
/// use obfusq_core::{Obfuscator, Strategy};
/// use obfusq_ir::Circuit;
///
/// let circuit = Circuit::bell().unwrap();
/// let mut obfuscator = Obfuscator::new(Strategy::Padding).with_seed(7);
///
/// let result = obfuscator.obfuscate(&circuit).unwrap();
/// assert_eq!(result.circuit.num_qubits(), 2);
/// assert!(result.stats.growth_factor > 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Obfuscator {
    strategy: Strategy,
    library: Arc<EquivalenceLibrary>,
    options: StrategyOptions,
    rng: StdRng,
}

impl Obfuscator {
    /// An obfuscator over the built-in library, seeded from entropy.
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            library: EquivalenceLibrary::builtin(),
            options: StrategyOptions::default(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Build from a config, loading its custom library if one is named.
    pub fn from_config(config: &ObfuscatorConfig) -> ObfResult<Self> {
        let mut obfuscator = Self::new(config.strategy).with_options(config.options())?;
        if let Some(path) = &config.library {
            obfuscator = obfuscator.with_library(Arc::new(EquivalenceLibrary::from_file(path)?))?;
        }
        if let Some(seed) = config.seed {
            obfuscator = obfuscator.with_seed(seed);
        }
        Ok(obfuscator)
    }

    /// Use a different library. It is validated before it is accepted.
    pub fn with_library(mut self, library: Arc<EquivalenceLibrary>) -> ObfResult<Self> {
        library.validate()?;
        self.library = library;
        Ok(self)
    }

    /// Replace the strategy knobs.
    pub fn with_options(mut self, options: StrategyOptions) -> ObfResult<Self> {
        options.validate()?;
        self.options = options;
        Ok(self)
    }

    /// Make output reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// The configured strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// The library in use.
    pub fn library(&self) -> &EquivalenceLibrary {
        &self.library
    }

    /// The strategy knobs in use.
    pub fn options(&self) -> &StrategyOptions {
        &self.options
    }

    /// Rewrite `circuit` with the configured strategy.
    #[instrument(skip_all, fields(strategy = %self.strategy, circuit = circuit.name()))]
    pub fn obfuscate(&mut self, circuit: &Circuit) -> ObfResult<Obfuscation> {
        let obfuscated = self
            .strategy
            .apply(circuit, &self.library, &self.options, &mut self.rng)?;
        verify_boundary(circuit, &obfuscated)?;

        let stats = ObfuscationStats::compute(self.strategy, circuit, &obfuscated);
        info!(
            original_ops = stats.original_ops,
            obfuscated_ops = stats.obfuscated_ops,
            growth = stats.growth_factor,
            "obfuscated program"
        );

        Ok(Obfuscation {
            circuit: obfuscated,
            stats,
        })
    }
}

/// A rewritten program and its statistics.
#[derive(Debug, Clone)]
pub struct Obfuscation {
    /// The rewritten program.
    pub circuit: Circuit,
    /// Size and depth before and after.
    pub stats: ObfuscationStats,
}

/// Size and depth of a program before and after rewriting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObfuscationStats {
    pub strategy: Strategy,
    pub original_ops: usize,
    pub obfuscated_ops: usize,
    pub original_depth: usize,
    pub obfuscated_depth: usize,
    /// `obfuscated_ops / original_ops`, or 1 for an empty program.
    pub growth_factor: f64,
    pub measurements: usize,
}

impl ObfuscationStats {
    /// Compare a program with its rewrite.
    pub fn compute(strategy: Strategy, original: &Circuit, obfuscated: &Circuit) -> Self {
        let original_ops = original.num_ops();
        let obfuscated_ops = obfuscated.num_ops();
        let growth_factor = if original_ops == 0 {
            1.0
        } else {
            obfuscated_ops as f64 / original_ops as f64
        };

        Self {
            strategy,
            original_ops,
            obfuscated_ops,
            original_depth: original.depth(),
            obfuscated_depth: obfuscated.depth(),
            growth_factor,
            measurements: original.measurements().count(),
        }
    }
}
