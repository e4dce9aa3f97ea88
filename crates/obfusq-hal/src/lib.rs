//! Obfusq Execution Backend Abstraction
//!
//! Obfusq never needs more from hardware than "run this program N times and
//! report the measurement histogram". This crate names that capability so
//! the validator can be written once against any backend.
//!
//! - A common [`Backend`] trait for validation, submission and retrieval
//! - [`Capabilities`] to describe register size, shot limits and gate set
//! - Unified result handling via [`ExecutionResult`] and [`Counts`]
//!
//! # Example: Running a Circuit
//!
//! ```ignore
//! use obfusq_adapter_sim::SimulatorBackend;
//! use obfusq_hal::Backend;
//! use obfusq_ir::Circuit;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SimulatorBackend::with_seed(7);
//!     let circuit = Circuit::bell()?;
//!
//!     let result = backend.execute(&circuit, 1024).await?;
//!     if let Some((bitstring, count)) = result.counts.most_frequent() {
//!         println!("Most frequent: {bitstring} ({count} times)");
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod capability;
pub mod error;
pub mod job;
pub mod result;

pub use backend::Backend;
pub use capability::{Capabilities, GateSet};
pub use error::{HalError, HalResult};
pub use job::{Job, JobId, JobStatus};
pub use result::{Counts, ExecutionResult};
