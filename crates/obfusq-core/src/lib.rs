//! Obfusq Gate-Rewrite Obfuscation Engine
//!
//! This crate rewrites quantum programs into functionally equivalent ones
//! that hide their structure. Every rewrite keeps the register shape and the
//! measurement sequence, so a backend produces the same outcome distribution
//! for the original and the obfuscated program.
//!
//! # Overview
//!
//! ```text
//! Input Circuit
//!       │
//!       ▼
//! ┌────────────────────┐
//! │ preserve_boundary  │ ◄── split off measurements
//! └────────────────────┘
//!       │
//!       ├── Substitution  (equivalence rules)
//!       ├── Composite     (camouflage block + labelled units)
//!       ├── Padding       (identity catalog)
//!       └── Segmented     (inverse pairs between segments)
//!       │
//!       ▼
//! Output Circuit (measurements re-appended, shape verified)
//! ```
//!
//! All four strategies are driven by an [`EquivalenceLibrary`]. The built-in
//! tables are shared process-wide; a custom library may be loaded from YAML.
//!
//! # Example: Obfuscating a Bell Program
//!
//! ```rust
//! use obfusq_core::{Obfuscator, Strategy};
//! use obfusq_ir::Circuit;
//!
//! let circuit = Circuit::bell().unwrap();
//!
//! let mut obfuscator = Obfuscator::new(Strategy::Substitution).with_seed(42);
//! let result = obfuscator.obfuscate(&circuit).unwrap();
//!
//! // Measurements stay last and in order.
//! let measured: Vec<_> = result.circuit.measurements().collect();
//! assert_eq!(measured.len(), 2);
//! println!("growth: {:.2}x", result.stats.growth_factor);
//! ```
//!
//! # Strategies
//!
//! | Strategy       | Alias     | Rewrite                                        |
//! |----------------|-----------|------------------------------------------------|
//! | `substitution` | `cloaked` | each gate → random equivalent sequence         |
//! | `composite`    |           | gates wrapped in misleadingly named units      |
//! | `padding`      | `delayed` | shuffled identity sequences around the program |
//! | `segmented`    | `inverse` | gate/inverse pairs at segment boundaries       |

pub mod boundary;
pub mod config;
pub mod error;
pub mod library;
pub mod obfuscator;
pub mod strategy;

pub use boundary::{RewriteContext, preserve_boundary, split, verify_boundary};
pub use config::ObfuscatorConfig;
pub use error::{ObfResult, ObfuscationError};
pub use library::{
    EquivalenceLibrary, EquivalenceRule, GateStep, IdentitySequence, IdentityStep, InjectionPair,
};
pub use obfuscator::{Obfuscation, ObfuscationStats, Obfuscator};
pub use strategy::{DecoyMode, Strategy, StrategyOptions, injection_passes};
