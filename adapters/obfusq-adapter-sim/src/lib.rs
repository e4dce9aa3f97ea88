//! Obfusq Local Statevector Simulator
//!
//! The reference execution backend. It runs a program exactly on a
//! statevector and samples measurement outcomes, which makes it the
//! yardstick for checking that an obfuscated program still produces the
//! original distribution.
//!
//! # Features
//!
//! - **Exact Simulation**: full statevector, every gate from `obfusq-ir`
//!   including composite units
//! - **Terminal-measurement fast path**: simulate once, sample per shot
//! - **Mid-circuit measurement and reset**: per-shot collapse
//! - **Reproducible runs**: [`SimulatorBackend::with_seed`]
//!
//! | Qubits | Memory |
//! |--------|--------|
//! | 10 | ~16 KB |
//! | 15 | ~512 KB |
//! | 20 | ~16 MB |
//!
//! # Example
//!
//! ```ignore
//! use obfusq_adapter_sim::SimulatorBackend;
//! use obfusq_hal::Backend;
//! use obfusq_ir::Circuit;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SimulatorBackend::with_seed(42);
//!     let result = backend.execute(&Circuit::bell()?, 1000).await?;
//!
//!     // Expect ~50% "00" and ~50% "11"
//!     println!("Results: {:?}", result.counts.sorted());
//!     Ok(())
//! }
//! ```

mod simulator;
mod statevector;

pub use simulator::SimulatorBackend;
pub use statevector::Statevector;
