//! Obfuscation report structure.
//!
//! The top-level report combining rewrite statistics and, when the programs
//! were executed, the validation outcome.

use chrono::{DateTime, Utc};
use obfusq_core::ObfuscationStats;
use serde::{Deserialize, Serialize};

use crate::validator::ValidationReport;

/// Schema version of the JSON report.
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Complete obfuscation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObfuscationReport {
    /// Schema version for forward compatibility.
    pub schema_version: String,
    /// Obfusq version that produced the report.
    pub tool_version: String,
    /// When the report was created.
    pub timestamp: DateTime<Utc>,
    /// Where the input program came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Seed used for the rewrite, if fixed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Rewrite statistics.
    pub stats: ObfuscationStats,
    /// Execution comparison, when validation ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
}

impl ObfuscationReport {
    /// A report stamped with the current time.
    pub fn new(stats: ObfuscationStats) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.into(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            source: None,
            seed: None,
            stats,
            validation: None,
        }
    }

    /// Record the input location.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Record the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Attach a validation outcome.
    #[must_use]
    pub fn with_validation(mut self, validation: ValidationReport) -> Self {
        self.validation = Some(validation);
        self
    }
}
