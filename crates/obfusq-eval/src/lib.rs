//! Obfusq Evaluator: Semantic-Accuracy Validation
//!
//! This crate checks that an obfuscated program still computes what the
//! original did. Both programs are executed on the same [`Backend`] and
//! their outcome histograms are compared.
//!
//! # Overview
//!
//! ```text
//! original ──┐                     ┌── counts ──┐
//!            ├──→ Backend × trials ┤            ├──→ semantic_accuracy
//! obfuscated ┘                     └── counts ──┘
//!                                                        │
//!                                                        ▼
//!                                  ValidationReport ──→ ObfuscationReport ──→ JSON
//! ```
//!
//! Accuracy is `100 × Σ min(o, b) / Σ o` over all outcomes, scored on the
//! final trial. Latency is averaged over all trials.
//!
//! # Example
//!
//! ```ignore
//! use obfusq_adapter_sim::SimulatorBackend;
//! use obfusq_core::{Obfuscator, Strategy};
//! use obfusq_eval::{ObfuscationReport, Validator, export};
//!
//! let original = Circuit::bell()?;
//! let obfuscation = Obfuscator::new(Strategy::Composite).obfuscate(&original)?;
//!
//! let validator = Validator::new(SimulatorBackend::new());
//! let validation = validator.compare(&original, &obfuscation.circuit).await?;
//!
//! let report = ObfuscationReport::new(obfuscation.stats).with_validation(validation);
//! println!("{}", export::to_json(&report, &Default::default())?);
//! ```
//!
//! [`Backend`]: obfusq_hal::Backend

pub mod accuracy;
pub mod error;
pub mod export;
pub mod report;
pub mod validator;

pub use accuracy::semantic_accuracy;
pub use error::{EvalError, EvalResult};
pub use export::ExportConfig;
pub use report::ObfuscationReport;
pub use validator::{DEFAULT_SHOTS, DEFAULT_TRIALS, ValidationReport, Validator};
