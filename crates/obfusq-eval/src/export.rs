//! Export: JSON output of obfuscation reports.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{EvalError, EvalResult};
use crate::report::ObfuscationReport;

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Export a report to a JSON string.
pub fn to_json(report: &ObfuscationReport, config: &ExportConfig) -> EvalResult<String> {
    if config.pretty {
        serde_json::to_string_pretty(report).map_err(EvalError::from)
    } else {
        serde_json::to_string(report).map_err(EvalError::from)
    }
}

/// Export a report to a JSON file.
pub fn to_file(report: &ObfuscationReport, path: &Path, config: &ExportConfig) -> EvalResult<()> {
    let json = to_json(report, config)?;
    std::fs::write(path, json)
        .map_err(|e| EvalError::Io(format!("Failed to write {}: {}", path.display(), e)))
}

/// Read a report back from a JSON file.
pub fn from_file(path: &Path) -> EvalResult<ObfuscationReport> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| EvalError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&text)?)
}
